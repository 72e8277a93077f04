use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use http_body_util::BodyExt;
use test_utils::jpeg_fixture;
use tower::ServiceExt;

use super::check_startup;
use super::router;
use super::AppState;
use crate::domain::models::ActivityKind;
use crate::domain::models::MailError;
use crate::infrastructure::fakes::record;
use crate::infrastructure::fakes::FakeMailer;
use crate::infrastructure::fakes::FakeServices;

const BOUNDARY: &str = "classroom-boundary";

struct Reply {
    status: StatusCode,
    cookie: Option<String>,
    headers: axum::http::HeaderMap,
    body: String,
}

fn app(services: &FakeServices) -> Router {
    return router(Arc::new(AppState::new(
        services.activities(),
        HashMap::new(),
    )));
}

fn services() -> FakeServices {
    return FakeServices::new(vec![
        record(
            "DEMO1",
            "vision",
            "Describe this picture for a 5th grader",
            "teacher@example.com",
        ),
        record(
            "TALK1",
            "dialogue",
            "You are a friendly pen pal",
            "teacher@example.com",
        ),
        record("ART1", "image", "A castle on a hill", "teacher@example.com"),
    ]);
}

async fn send(app: &Router, req: Request<Body>) -> Reply {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let cookie = headers
        .get(header::SET_COOKIE)
        .and_then(|value| return value.to_str().ok())
        .and_then(|value| return value.split(';').next())
        .map(|value| return value.to_string());
    let bytes = res.into_body().collect().await.unwrap().to_bytes();

    return Reply {
        status,
        cookie,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    };
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    return builder.body(Body::empty()).unwrap();
}

fn post_form(uri: &str, cookie: Option<&str>, form: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    return builder.body(Body::from(form.to_string())).unwrap();
}

fn post_upload(cookie: &str, name: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    return Request::builder()
        .method("POST")
        .uri("/vision/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::COOKIE, cookie)
        .body(Body::from(body))
        .unwrap();
}

/// Fetches `code` on the tool at `path` and returns the session cookie.
async fn fetch_prompt(app: &Router, path: &str, code: &str) -> String {
    let res = send(
        app,
        post_form(&format!("{path}/prompt"), None, &format!("name=Ada&code={code}")),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body.contains("Prompt loaded."), "{}", res.body);

    return res.cookie.unwrap();
}

mod pages {
    use super::*;

    #[tokio::test]
    async fn it_renders_the_home_page() {
        let services = services();
        let res = send(&app(&services), get("/", None)).await;

        assert_eq!(res.status, StatusCode::OK);
        for path in ["/vision", "/dialogue", "/image"] {
            assert!(res.body.contains(&format!("href=\"{path}\"")));
        }
        assert!(!res.body.contains("card unavailable"));
    }

    #[tokio::test]
    async fn it_sets_a_strict_session_cookie() {
        let services = services();
        let res = send(&app(&services), get("/dialogue", None)).await;

        let set_cookie = res
            .headers
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Strict"));
        assert!(res.body.contains("Please enter your name."));
        assert!(res.body.contains("Fetch your activity prompt to begin."));
    }

    #[tokio::test]
    async fn it_disables_pages_missing_credentials() {
        let services = services();
        let mut missing = HashMap::new();
        missing.insert(ActivityKind::Vision, vec!["gemini-token".to_string()]);
        let app = router(Arc::new(AppState::new(services.activities(), missing)));

        let res = send(&app, get("/vision", None)).await;
        assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(res
            .body
            .contains("This tool is not configured. Missing settings: gemini-token"));

        let res = send(
            &app,
            post_form("/vision/prompt", None, "name=Ada&code=DEMO1"),
        )
        .await;
        assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(services.store_calls(), 0);

        let res = send(&app, get("/dialogue", None)).await;
        assert_eq!(res.status, StatusCode::OK);

        let res = send(&app, get("/", None)).await;
        assert!(res.body.contains("card unavailable"));
    }

    #[tokio::test]
    async fn it_keeps_prompts_separate_per_tool() {
        let services = services();
        let app = app(&services);
        let cookie = fetch_prompt(&app, "/vision", "DEMO1").await;

        let res = send(&app, get("/dialogue", Some(&cookie))).await;
        assert!(res.body.contains("Fetch your activity prompt to begin."));
        assert!(!res.body.contains("Describe this picture"));

        let res = send(
            &app,
            post_form("/dialogue/prompt", Some(&cookie), "name=Ada&code=DEMO1"),
        )
        .await;
        assert!(res
            .body
            .contains("Activity code not found. Please check the code and try again."));

        let res = send(&app, get("/vision", Some(&cookie))).await;
        assert!(res
            .body
            .contains("Describe this picture for a 5th grader"));
    }

    #[tokio::test]
    async fn it_rejects_long_names_before_lookup() {
        let services = services();
        let form = format!("name={}&code=DEMO1", "a".repeat(51));
        let res = send(&app(&services), post_form("/vision/prompt", None, &form)).await;

        assert!(res
            .body
            .contains("Student name must be at most 50 characters."));
        assert_eq!(services.store_calls(), 0);
    }

    #[tokio::test]
    async fn it_does_not_keep_sessions_for_plain_visits() {
        let services = services();
        let state = Arc::new(AppState::new(services.activities(), HashMap::new()));
        let app = router(state.clone());

        for _ in 0..500 {
            let res = send(&app, get("/vision", None)).await;
            assert_eq!(res.status, StatusCode::OK);
        }
        assert_eq!(state.sessions.len(), 0);

        fetch_prompt(&app, "/vision", "DEMO1").await;
        assert_eq!(state.sessions.len(), 1);
    }
}

mod vision {
    use super::*;

    #[tokio::test]
    async fn it_analyses_an_upload_and_mails_the_teacher() {
        let services = services();
        let app = app(&services);
        let cookie = fetch_prompt(&app, "/vision", "DEMO1").await;

        let res = send(
            &app,
            post_upload(&cookie, "Ada", "photo.jpg", &jpeg_fixture()),
        )
        .await;

        assert_eq!(res.status, StatusCode::OK);
        assert!(res
            .body
            .contains("Describe this picture for a 5th grader: a image/jpeg picture"));
        assert!(res.body.contains("Selected image"));
        assert!(res
            .body
            .contains("Your result was emailed to your teacher."));
        assert_eq!(services.vision_calls(), 1);

        let sent = services.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "teacher@example.com");
        assert_eq!(sent[0].attachment.as_ref().unwrap().filename, "image.jpg");
    }

    #[tokio::test]
    async fn it_rejects_files_that_are_not_images() {
        let services = services();
        let app = app(&services);
        let cookie = fetch_prompt(&app, "/vision", "DEMO1").await;

        let res = send(
            &app,
            post_upload(&cookie, "Ada", "notes.jpg", b"these are my notes"),
        )
        .await;

        assert!(res
            .body
            .contains("The uploaded file is not a valid image."));
        assert_eq!(services.vision_calls(), 0);
        assert!(services.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn it_requires_a_prompt_before_analysis() {
        let services = services();
        let app = app(&services);
        let cookie = send(&app, get("/vision", None)).await.cookie.unwrap();

        let res = send(
            &app,
            post_upload(&cookie, "Ada", "photo.jpg", &jpeg_fixture()),
        )
        .await;

        assert!(res.body.contains("Please fetch your activity prompt first."));
        assert_eq!(services.vision_calls(), 0);
    }

    #[tokio::test]
    async fn it_keeps_the_result_when_the_relay_fails() {
        let services = FakeServices {
            mailer: Arc::new(FakeMailer::failing(MailError::Network(
                "connection refused".to_string(),
            ))),
            ..services()
        };
        let app = app(&services);
        let cookie = fetch_prompt(&app, "/vision", "DEMO1").await;

        let res = send(
            &app,
            post_upload(&cookie, "Ada", "photo.jpg", &jpeg_fixture()),
        )
        .await;

        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains("a image/jpeg picture"));
        assert!(res
            .body
            .contains("Sending the email failed: the mail server could not be reached."));

        let res = send(&app, get("/vision", Some(&cookie))).await;
        assert!(res.body.contains("a image/jpeg picture"));
    }

    #[tokio::test]
    async fn it_clears_the_previous_result_on_an_invalid_upload() {
        let services = services();
        let app = app(&services);
        let cookie = fetch_prompt(&app, "/vision", "DEMO1").await;

        let res = send(
            &app,
            post_upload(&cookie, "Ada", "photo.jpg", &jpeg_fixture()),
        )
        .await;
        assert!(res.body.contains("Selected image"));

        let res = send(
            &app,
            post_upload(&cookie, "Ada", "notes.jpg", b"these are my notes"),
        )
        .await;
        assert!(res
            .body
            .contains("The uploaded file is not a valid image."));
        assert!(!res.body.contains("Selected image"));
        assert!(!res.body.contains("a image/jpeg picture"));

        let res = send(&app, get("/vision", Some(&cookie))).await;
        assert!(!res.body.contains("Selected image"));
        assert_eq!(services.vision_calls(), 1);
    }
}

mod dialogue {
    use super::*;

    #[tokio::test]
    async fn it_generates_a_reply() {
        let services = services();
        let app = app(&services);
        let cookie = fetch_prompt(&app, "/dialogue", "TALK1").await;

        let res = send(
            &app,
            post_form(
                "/dialogue/generate",
                Some(&cookie),
                "name=Ada&answer=I+like+cats",
            ),
        )
        .await;

        assert!(res
            .body
            .contains("[You are a friendly pen pal] You said: I like cats"));
        assert!(res.body.contains(">I like cats</textarea>"));
        assert_eq!(services.chat_calls(), 1);
        assert_eq!(services.mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn it_requires_an_answer() {
        let services = services();
        let app = app(&services);
        let cookie = fetch_prompt(&app, "/dialogue", "TALK1").await;

        let res = send(
            &app,
            post_form("/dialogue/generate", Some(&cookie), "name=Ada&answer=++"),
        )
        .await;

        assert!(res.body.contains("Please write your answer first."));
        assert_eq!(services.chat_calls(), 0);
    }
}

mod image {
    use super::*;

    #[tokio::test]
    async fn it_generates_and_downloads_an_image() {
        let services = services();
        let app = app(&services);
        let cookie = fetch_prompt(&app, "/image", "ART1").await;

        let res = send(
            &app,
            post_form(
                "/image/generate",
                Some(&cookie),
                "name=Ada&color=pastel&mood=none&style=none&texture=none&emotion=none",
            ),
        )
        .await;

        assert!(res
            .body
            .contains("src=\"https://images.example.com/1.png\""));
        assert_eq!(
            *services.images.prompts.lock().unwrap(),
            vec!["A castle on a hill pastel".to_string()]
        );

        let res = send(&app, get("/image/download", Some(&cookie))).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(
            res.headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"generated_image.png\""
        );
        assert_eq!(res.body, "https://images.example.com/1.png");
    }

    #[tokio::test]
    async fn it_requires_a_describing_word() {
        let services = services();
        let app = app(&services);
        let cookie = fetch_prompt(&app, "/image", "ART1").await;

        let res = send(
            &app,
            post_form(
                "/image/generate",
                Some(&cookie),
                "name=Ada&color=none&mood=none&style=none&texture=none&emotion=none",
            ),
        )
        .await;

        assert!(res.body.contains("Select at least one describing word."));
        assert_eq!(services.images.calls(), 0);
    }

    #[tokio::test]
    async fn it_remembers_the_chosen_descriptors() {
        let services = services();
        let app = app(&services);
        let cookie = fetch_prompt(&app, "/image", "ART1").await;

        let res = send(
            &app,
            post_form(
                "/image/generate",
                Some(&cookie),
                "name=Ada&color=pastel&mood=dreamy&style=none&texture=none&emotion=none",
            ),
        )
        .await;
        assert!(res.body.contains("name=\"color\" value=\"pastel\" checked"));
        assert!(res.body.contains("name=\"mood\" value=\"dreamy\" checked"));
        assert!(res.body.contains("name=\"style\" value=\"none\" checked"));

        let res = send(&app, get("/image", Some(&cookie))).await;
        assert!(res.body.contains("name=\"color\" value=\"pastel\" checked"));
    }

    #[tokio::test]
    async fn it_has_nothing_to_download_before_generating() {
        let services = services();
        let res = send(&app(&services), get("/image/download", None)).await;

        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert!(res
            .body
            .contains("There is no generated image to download yet."));
    }
}

mod startup {
    use super::*;

    fn missing(kinds: &[ActivityKind]) -> HashMap<ActivityKind, Vec<String>> {
        return kinds
            .iter()
            .map(|kind| return (*kind, vec!["openai-token".to_string()]))
            .collect();
    }

    #[test]
    fn it_refuses_to_start_without_any_usable_tool() {
        let services = services();
        let state = AppState::new(
            services.activities(),
            missing(&[
                ActivityKind::Vision,
                ActivityKind::Dialogue,
                ActivityKind::ImageGeneration,
            ]),
        );

        let err = check_startup(&state).unwrap_err().to_string();
        assert!(err.starts_with("No tool can run until credentials are configured."));
        assert_eq!(err.matches("- ").count(), 3);
        assert!(err.contains("openai-token"));
    }

    #[test]
    fn it_starts_with_some_tools_disabled() {
        let services = services();
        let state = AppState::new(services.activities(), missing(&[ActivityKind::Vision]));
        assert!(check_startup(&state).is_ok());

        let state = AppState::new(services.activities(), HashMap::new());
        assert!(check_startup(&state).is_ok());
    }
}
