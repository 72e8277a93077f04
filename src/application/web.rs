#[cfg(test)]
#[path = "web_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::extract::Multipart;
use axum::extract::State;
use axum::http::header;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Form;
use axum::Router;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::SameSite;
use axum_extra::extract::CookieJar;
use serde_derive::Deserialize;
use strum::IntoEnumIterator;

use super::pages::render_activity;
use super::pages::render_home;
use super::pages::ActivityView;
use super::pages::Banner;
use super::pages::BannerLevel;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ActivityError;
use crate::domain::models::ActivityKind;
use crate::domain::models::DescriptorSelection;
use crate::domain::models::SessionState;
use crate::domain::models::UploadedImage;
use crate::domain::services::Activities;
use crate::domain::services::Completed;
use crate::domain::services::Sessions;
use crate::infrastructure::ServiceManager;

pub const SESSION_COOKIE: &str = "session";
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub activities: Activities,
    pub sessions: Sessions,
    /// Config keys each page lacks. Pages with missing keys are disabled.
    pub missing: HashMap<ActivityKind, Vec<String>>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(activities: Activities, missing: HashMap<ActivityKind, Vec<String>>) -> AppState {
        return AppState {
            activities,
            sessions: Sessions::default(),
            missing,
        };
    }

    pub fn from_config() -> AppState {
        let missing = ActivityKind::iter()
            .map(|kind| {
                let keys = Config::missing_for(kind)
                    .iter()
                    .map(|key| return key.to_string())
                    .collect::<Vec<String>>();
                return (kind, keys);
            })
            .collect();

        return AppState::new(ServiceManager::activities(), missing);
    }

    fn not_configured(&self, kind: ActivityKind) -> Option<ActivityError> {
        return self
            .missing
            .get(&kind)
            .filter(|keys| return !keys.is_empty())
            .map(|keys| return ActivityError::NotConfigured(keys.clone()));
    }

    pub fn unavailable(&self) -> Vec<ActivityKind> {
        return ActivityKind::iter()
            .filter(|kind| return self.not_configured(*kind).is_some())
            .collect();
    }
}

/// A request's view of the browser session. Handlers mutate `state` and hand
/// the visit back to `respond`, which persists it.
struct Visit {
    jar: CookieJar,
    id: String,
    state: SessionState,
}

fn session_cookie(id: &str) -> Cookie<'static> {
    return Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .build();
}

fn open_visit(app: &AppState, jar: CookieJar) -> Visit {
    let cookie = jar.get(SESSION_COOKIE);
    let (id, state) = app
        .sessions
        .load(cookie.as_ref().map(|cookie| return cookie.value()));
    if cookie.as_ref().map(|cookie| return cookie.value()) != Some(id.as_str()) {
        tracing::debug!(sessions = app.sessions.len() + 1, "session started");
    }
    let jar = jar.add(session_cookie(&id));

    return Visit { jar, id, state };
}

fn respond(
    app: &AppState,
    visit: Visit,
    kind: ActivityKind,
    status: StatusCode,
    banners: Vec<Banner>,
) -> Response {
    let html = render_activity(&ActivityView {
        kind,
        session: &visit.state,
        banners,
    });
    app.sessions.save(&visit.id, visit.state);

    return (status, visit.jar, Html(html)).into_response();
}

fn respond_unconfigured(
    app: &AppState,
    visit: Visit,
    kind: ActivityKind,
    err: &ActivityError,
) -> Response {
    return respond(
        app,
        visit,
        kind,
        StatusCode::SERVICE_UNAVAILABLE,
        vec![Banner::from(err)],
    );
}

fn name_banner(state: &SessionState) -> Option<Banner> {
    if state.student_name.is_empty() {
        return Some(Banner::new(
            BannerLevel::Warning,
            "⚠️ Please enter your name.",
        ));
    }

    return None;
}

/// Renders the outcome of one student action. Failures become a banner; the
/// session survives either way.
fn respond_outcome(
    app: &AppState,
    visit: Visit,
    kind: ActivityKind,
    outcome: Result<Vec<Banner>, ActivityError>,
) -> Response {
    let mut banners = match outcome {
        Ok(banners) => banners,
        Err(err) => {
            tracing::warn!(kind = %kind, error = %err, "activity step failed");
            vec![Banner::from(&err)]
        }
    };
    if let Some(banner) = name_banner(&visit.state) {
        banners.push(banner);
    }

    return respond(app, visit, kind, StatusCode::OK, banners);
}

fn completed_banners(
    kind: ActivityKind,
    done: &str,
    completed: &Completed,
) -> Vec<Banner> {
    tracing::info!(
        kind = %kind,
        delivered = completed.delivery.is_delivered(),
        "activity completed"
    );

    return vec![
        Banner::new(BannerLevel::Success, done),
        Banner::from(&completed.delivery),
    ];
}

fn prompt_required() -> ActivityError {
    return ActivityError::Validation(
        "Please fetch your activity prompt first.".to_string(),
    );
}

async fn home(State(app): State<SharedState>) -> Html<String> {
    return Html(render_home(&app.unavailable()));
}

async fn show_page(
    State(app): State<SharedState>,
    jar: CookieJar,
    kind: ActivityKind,
) -> Response {
    let visit = open_visit(&app, jar);
    if let Some(err) = app.not_configured(kind) {
        return respond_unconfigured(&app, visit, kind, &err);
    }

    let banners = name_banner(&visit.state).into_iter().collect();
    return respond(&app, visit, kind, StatusCode::OK, banners);
}

#[derive(Debug, Deserialize)]
pub struct PromptForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    code: String,
}

async fn load_prompt(
    app: &AppState,
    state: &mut SessionState,
    kind: ActivityKind,
    form: &PromptForm,
) -> Result<Vec<Banner>, ActivityError> {
    state.student_name = Activities::check_student_name(&form.name)?;

    let activity = app.activities.resolver.resolve(&form.code, kind).await?;
    tracing::info!(kind = %kind, code = %activity.code, "activity prompt loaded");
    state.set_activity(activity);

    return Ok(vec![Banner::new(BannerLevel::Success, "✅ Prompt loaded.")]);
}

async fn fetch_prompt(
    State(app): State<SharedState>,
    jar: CookieJar,
    kind: ActivityKind,
    form: PromptForm,
) -> Response {
    let mut visit = open_visit(&app, jar);
    if let Some(err) = app.not_configured(kind) {
        return respond_unconfigured(&app, visit, kind, &err);
    }

    let outcome = load_prompt(&app, &mut visit.state, kind, &form).await;
    return respond_outcome(&app, visit, kind, outcome);
}

struct VisionUpload {
    name: String,
    image: Option<Vec<u8>>,
}

async fn read_vision_upload(
    multipart: &mut Multipart,
) -> Result<VisionUpload, ActivityError> {
    let upload_failed = |err: axum::extract::multipart::MultipartError| {
        return ActivityError::Validation(format!("The upload could not be read: {err}"));
    };

    let mut upload = VisionUpload {
        name: "".to_string(),
        image: None,
    };
    while let Some(field) = multipart.next_field().await.map_err(upload_failed)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => upload.name = field.text().await.map_err(upload_failed)?,
            "image" => {
                let bytes = field.bytes().await.map_err(upload_failed)?;
                if !bytes.is_empty() {
                    upload.image = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    return Ok(upload);
}

async fn run_vision(
    app: &AppState,
    state: &mut SessionState,
    multipart: &mut Multipart,
) -> Result<Vec<Banner>, ActivityError> {
    let upload = read_vision_upload(multipart).await?;
    state.student_name = Activities::check_student_name(&upload.name)?;

    let activity = state
        .activity_for(ActivityKind::Vision)
        .cloned()
        .ok_or_else(prompt_required)?;
    let bytes = upload.image.ok_or_else(|| {
        return ActivityError::Validation("Please choose an image to upload.".to_string());
    })?;

    state.uploaded_image = None;
    state.ai_answer = None;
    let image = UploadedImage::decode(bytes)?;
    state.uploaded_image = Some(image.clone());

    let completed = app
        .activities
        .run_vision(&state.student_name, &activity, &image)
        .await?;
    state.ai_answer = Some(completed.output.to_string());

    return Ok(completed_banners(
        ActivityKind::Vision,
        "✅ Analysis complete.",
        &completed,
    ));
}

async fn analyze_image(
    State(app): State<SharedState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let kind = ActivityKind::Vision;
    let mut visit = open_visit(&app, jar);
    if let Some(err) = app.not_configured(kind) {
        return respond_unconfigured(&app, visit, kind, &err);
    }

    let outcome = run_vision(&app, &mut visit.state, &mut multipart).await;
    return respond_outcome(&app, visit, kind, outcome);
}

#[derive(Debug, Deserialize)]
pub struct DialogueForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    answer: String,
}

async fn run_dialogue(
    app: &AppState,
    state: &mut SessionState,
    form: DialogueForm,
) -> Result<Vec<Banner>, ActivityError> {
    state.student_answer = form.answer;
    state.student_name = Activities::check_student_name(&form.name)?;

    let activity = state
        .activity_for(ActivityKind::Dialogue)
        .cloned()
        .ok_or_else(prompt_required)?;

    let completed = app
        .activities
        .run_dialogue(&state.student_name, &activity, &state.student_answer)
        .await?;
    state.ai_answer = Some(completed.output.to_string());

    return Ok(completed_banners(
        ActivityKind::Dialogue,
        "✅ Dialogue generated.",
        &completed,
    ));
}

async fn generate_dialogue(
    State(app): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<DialogueForm>,
) -> Response {
    let kind = ActivityKind::Dialogue;
    let mut visit = open_visit(&app, jar);
    if let Some(err) = app.not_configured(kind) {
        return respond_unconfigured(&app, visit, kind, &err);
    }

    let outcome = run_dialogue(&app, &mut visit.state, form).await;
    return respond_outcome(&app, visit, kind, outcome);
}

async fn run_image(
    app: &AppState,
    state: &mut SessionState,
    form: &BTreeMap<String, String>,
) -> Result<Vec<Banner>, ActivityError> {
    let name = form.get("name").map(String::as_str).unwrap_or_default();
    state.student_name = Activities::check_student_name(name)?;

    let activity = state
        .activity_for(ActivityKind::ImageGeneration)
        .cloned()
        .ok_or_else(prompt_required)?;
    let selection = DescriptorSelection::from_form(form)?;
    state.descriptors = selection.clone();

    let completed = app
        .activities
        .run_image(&state.student_name, &activity, &selection)
        .await?;
    state.image_url = Some(completed.output.to_string());

    return Ok(completed_banners(
        ActivityKind::ImageGeneration,
        "✅ Image generated.",
        &completed,
    ));
}

async fn generate_image(
    State(app): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<BTreeMap<String, String>>,
) -> Response {
    let kind = ActivityKind::ImageGeneration;
    let mut visit = open_visit(&app, jar);
    if let Some(err) = app.not_configured(kind) {
        return respond_unconfigured(&app, visit, kind, &err);
    }

    let outcome = run_image(&app, &mut visit.state, &form).await;
    return respond_outcome(&app, visit, kind, outcome);
}

/// Hands the generated image's URL back as a file. The body is the URL text,
/// not the image bytes.
async fn download_image(State(app): State<SharedState>, jar: CookieJar) -> Response {
    let kind = ActivityKind::ImageGeneration;
    let visit = open_visit(&app, jar);
    if let Some(err) = app.not_configured(kind) {
        return respond_unconfigured(&app, visit, kind, &err);
    }

    if let Some(url) = visit.state.image_url.clone() {
        return (
            visit.jar,
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"generated_image.png\"",
                ),
            ],
            url,
        )
            .into_response();
    }

    return respond(
        &app,
        visit,
        kind,
        StatusCode::NOT_FOUND,
        vec![Banner::new(
            BannerLevel::Warning,
            "⚠️ There is no generated image to download yet.",
        )],
    );
}

pub fn router(state: SharedState) -> Router {
    let mut router = Router::new().route("/", get(home));

    for kind in ActivityKind::iter() {
        router = router
            .route(
                &kind.path(),
                get(move |app: State<SharedState>, jar: CookieJar| {
                    return show_page(app, jar, kind);
                }),
            )
            .route(
                &format!("{}/prompt", kind.path()),
                post(
                    move |app: State<SharedState>, jar: CookieJar, Form(form): Form<PromptForm>| {
                        return fetch_prompt(app, jar, kind, form);
                    },
                ),
            );
    }

    return router
        .route("/vision/analyze", post(analyze_image))
        .route("/dialogue/generate", post(generate_dialogue))
        .route("/image/generate", post(generate_image))
        .route("/image/download", get(download_image))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
        .with_state(state);
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?err, "failed to listen for shutdown signal");
    }
}

/// Refuses to start when every tool is disabled for missing credentials.
pub fn check_startup(state: &AppState) -> Result<()> {
    let unavailable = state.unavailable();
    for kind in &unavailable {
        tracing::warn!(
            kind = %kind,
            missing = %state.missing.get(kind).cloned().unwrap_or_default().join(", "),
            "tool disabled, credentials missing"
        );
    }

    if unavailable.len() == ActivityKind::iter().count() {
        let missing = ActivityKind::iter()
            .filter_map(|kind| return state.not_configured(kind))
            .map(|err| return format!("- {err}"))
            .collect::<Vec<String>>()
            .join("\n");
        bail!(format!(
            "No tool can run until credentials are configured.\n{missing}"
        ));
    }

    return Ok(());
}

pub async fn serve() -> Result<()> {
    let state = AppState::from_config();
    check_startup(&state)?;

    let addr = format!(
        "{}:{}",
        Config::get(ConfigKey::Host),
        Config::get(ConfigKey::Port)
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "server listening");
    println!("Classroom AI tools are running at http://{addr}");

    axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    return Ok(());
}
