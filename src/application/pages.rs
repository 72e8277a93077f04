#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;

use strum::IntoEnumIterator;

use crate::domain::models::ActivityError;
use crate::domain::models::ActivityKind;
use crate::domain::models::Delivery;
use crate::domain::models::DescriptorCategory;
use crate::domain::models::DescriptorSelection;
use crate::domain::models::SessionState;
use crate::domain::models::NOT_SELECTED;
use crate::domain::services::STUDENT_NAME_MAX_CHARS;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; padding: 2rem; }
main { max-width: 760px; margin: 0 auto; }
label { display: block; margin-top: 1rem; font-weight: 600; }
input[type=text], textarea { width: 100%; padding: .5rem; box-sizing: border-box; }
textarea { min-height: 8rem; }
button { margin-top: 1rem; padding: .5rem 1rem; }
.banner { padding: .75rem 1rem; margin: .75rem 0; border-radius: 6px; }
.success { background: #e6f4ea; } .info { background: #e8f0fe; }
.warning { background: #fff4e5; } .error { background: #fde8e8; }
.answer { white-space: pre-wrap; background: #fff; padding: 1rem; border-radius: 6px; }
.cards { display: grid; grid-template-columns: 1fr 1fr; gap: 1.5rem; }
.card a { text-decoration: none; } .card .icon { font-size: 100px; }
.unavailable { opacity: .5; }
fieldset { margin-top: 1rem; } figure img { max-width: 100%; }
"#;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BannerLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Banner {
    pub level: BannerLevel,
    pub text: String,
}

impl Banner {
    pub fn new(level: BannerLevel, text: &str) -> Banner {
        return Banner {
            level,
            text: text.to_string(),
        };
    }
}

impl From<&ActivityError> for Banner {
    fn from(err: &ActivityError) -> Banner {
        let level = match err {
            ActivityError::Validation(_) => BannerLevel::Warning,
            _ => BannerLevel::Error,
        };
        let icon = match level {
            BannerLevel::Warning => "⚠️",
            _ => "❌",
        };

        return Banner::new(level, &format!("{icon} {err}"));
    }
}

impl From<&Delivery> for Banner {
    fn from(delivery: &Delivery) -> Banner {
        match delivery {
            Delivery::Delivered => {
                return Banner::new(
                    BannerLevel::Success,
                    "📧 Your result was emailed to your teacher.",
                )
            }
            Delivery::NoRecipient => {
                return Banner::new(
                    BannerLevel::Warning,
                    "Your teacher's email address is not set, so the result was not sent.",
                )
            }
            Delivery::AuthFailed(_) => {
                return Banner::new(
                    BannerLevel::Error,
                    "Sending the email failed: the mail server rejected the login.",
                )
            }
            Delivery::NetworkFailed(_) => {
                return Banner::new(
                    BannerLevel::Error,
                    "Sending the email failed: the mail server could not be reached.",
                )
            }
            Delivery::Rejected(msg) => {
                return Banner::new(
                    BannerLevel::Error,
                    &format!("Sending the email failed: {msg}"),
                )
            }
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut res = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => res.push_str("&amp;"),
            '<' => res.push_str("&lt;"),
            '>' => res.push_str("&gt;"),
            '"' => res.push_str("&quot;"),
            '\'' => res.push_str("&#39;"),
            _ => res.push(c),
        }
    }

    return res;
}

fn layout(title: &str, background: &str, body: &str) -> String {
    return format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>{title}</title>\n<link rel=\"icon\" href=\"data:image/svg+xml,<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 100 100'><text y='.9em' font-size='90'>🤖</text></svg>\">\n<style>{STYLE}body {{ background: {background}; }}</style>\n</head>\n<body>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape(title),
    );
}

fn render_banners(banners: &[Banner]) -> String {
    return banners
        .iter()
        .map(|banner| {
            return format!(
                "<div class=\"banner {}\" role=\"alert\">{}</div>",
                banner.level,
                escape(&banner.text)
            );
        })
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn render_home(unavailable: &[ActivityKind]) -> String {
    let cards = ActivityKind::iter()
        .enumerate()
        .map(|(idx, kind)| {
            let class = if unavailable.contains(&kind) {
                "card unavailable"
            } else {
                "card"
            };
            return format!(
                "<section class=\"{class}\">\n<h4>{num}. {title} tool</h4>\n<a href=\"{path}\"><span class=\"icon\">{icon}</span><div>Click here</div></a>\n<p>{summary}</p>\n</section>",
                num = idx + 1,
                title = kind.title(),
                path = kind.path(),
                icon = kind.icon(),
                summary = kind.summary(),
            );
        })
        .collect::<Vec<String>>()
        .join("\n");

    let body = format!(
        "<h1>📚 AI Classroom Tools</h1>\n<h2>🎓 Tools for students</h2>\n<p>Each tool supports a classroom activity your teacher has prepared. Enter your name and the activity code from your teacher to begin.</p>\n<div class=\"cards\">\n{cards}\n</div>"
    );

    return layout("Classroom AI Tools", "#ffffff", &body);
}

/// Everything an activity page needs to render.
pub struct ActivityView<'a> {
    pub kind: ActivityKind,
    pub session: &'a SessionState,
    pub banners: Vec<Banner>,
}

fn instructions(kind: ActivityKind) -> &'static [&'static str] {
    match kind {
        ActivityKind::Vision => {
            return &[
                "<b>Enter your name</b>: type your own name.",
                "<b>Enter the activity code</b>: type the code your teacher gave you.",
                "<b>Fetch the prompt</b>: load the prompt that belongs to the code.",
                "<b>Upload an image</b>: choose a picture or take one with your camera.",
                "<b>Run the activity</b>: the AI works through the prompt using your image.",
            ]
        }
        ActivityKind::Dialogue => {
            return &[
                "<b>Enter your name</b>: type your own name.",
                "<b>Enter the activity code</b>: type the code for your lesson.",
                "<b>Fetch the prompt</b>: click 'Fetch prompt' to load the prompt for the code.",
                "<b>Write your answer</b>: respond to the prompt in your own words.",
                "<b>Generate the dialogue</b>: the AI continues the conversation from your answer.",
                "<b>Check the result</b>: read the AI's reply and save it if you need to.",
            ]
        }
        ActivityKind::ImageGeneration => {
            return &[
                "<b>Enter your name</b>: type your own name.",
                "<b>Enter the activity code</b>: type the code for your lesson.",
                "<b>Fetch the prompt</b>: load the topic your teacher set for the code.",
                "<b>Pick describing words</b>: choose words for the style and feeling of the image.",
                "<b>Generate the image</b>: the AI draws from the topic and your words.",
                "<b>Check the result</b>: look at the image and download it if you like.",
            ]
        }
    }
}

fn heading(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::Vision => return "🎓 For students: AI activity tool",
        ActivityKind::Dialogue => return "🎓 For students: AI dialogue tool",
        ActivityKind::ImageGeneration => return "🎨 For students: image generation tool",
    }
}

fn background(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::Vision => return "#E0FFFF",
        ActivityKind::Dialogue => return "#FFFACD",
        ActivityKind::ImageGeneration => return "#ffffff",
    }
}

fn name_input(session: &SessionState) -> String {
    return format!(
        "<label for=\"name\">🔑 Student name</label>\n<input type=\"text\" id=\"name\" name=\"name\" maxlength=\"{STUDENT_NAME_MAX_CHARS}\" value=\"{}\">",
        escape(&session.student_name)
    );
}

fn vision_controls(kind: ActivityKind, session: &SessionState) -> String {
    let mut res = format!(
        "<p>📸 Upload an image or take a photo to work on the prompt.</p>\n<form method=\"post\" action=\"{path}/analyze\" enctype=\"multipart/form-data\">\n{name}\n<label for=\"image\">Upload image</label>\n<input type=\"file\" id=\"image\" name=\"image\" accept=\"image/jpeg,image/png\" capture=\"environment\">\n<button type=\"submit\">🧠 Analyse image</button>\n</form>",
        path = kind.path(),
        name = name_input(session),
    );

    if let Some(image) = &session.uploaded_image {
        res += &format!(
            "\n<figure><img src=\"{}\" alt=\"Selected image\"><figcaption>Selected image</figcaption></figure>",
            image.data_uri()
        );
    }
    if let Some(answer) = &session.ai_answer {
        res += &format!("\n<div class=\"answer\">{}</div>", escape(answer));
    }

    return res;
}

fn dialogue_controls(kind: ActivityKind, session: &SessionState) -> String {
    let mut res = format!(
        "<form method=\"post\" action=\"{path}/generate\">\n{name}\n<label for=\"answer\">📝 Your answer</label>\n<textarea id=\"answer\" name=\"answer\">{answer}</textarea>\n<button type=\"submit\">🤖 Generate AI dialogue</button>\n</form>",
        path = kind.path(),
        name = name_input(session),
        answer = escape(&session.student_answer),
    );

    if let Some(answer) = &session.ai_answer {
        res += &format!(
            "\n<p>💡 <b>AI generated dialogue:</b></p>\n<div class=\"answer\">{}</div>",
            escape(answer)
        );
    }

    return res;
}

fn descriptor_fieldset(category: DescriptorCategory, selection: &DescriptorSelection) -> String {
    let selected = selection.get(category).unwrap_or(NOT_SELECTED);

    let options = std::iter::once((NOT_SELECTED, "Not selected"))
        .chain(
            category
                .options()
                .iter()
                .map(|option| return (*option, *option)),
        )
        .map(|(value, label)| {
            let checked = if value == selected { " checked" } else { "" };
            return format!(
                "<label><input type=\"radio\" name=\"{category}\" value=\"{value}\"{checked}> {label}</label>"
            );
        })
        .collect::<Vec<String>>()
        .join("\n");

    return format!(
        "<fieldset>\n<legend>{}</legend>\n{options}\n</fieldset>",
        category.label()
    );
}

fn image_controls(kind: ActivityKind, session: &SessionState) -> String {
    let fieldsets = DescriptorCategory::iter()
        .map(|category| return descriptor_fieldset(category, &session.descriptors))
        .collect::<Vec<String>>()
        .join("\n");

    let mut res = format!(
        "<form method=\"post\" action=\"{path}/generate\">\n{name}\n<details open>\n<summary>Choose describing words</summary>\n{fieldsets}\n</details>\n<button type=\"submit\">🖼️ Generate image</button>\n</form>",
        path = kind.path(),
        name = name_input(session),
    );

    if let Some(url) = &session.image_url {
        res += &format!(
            "\n<figure><img src=\"{url}\" alt=\"Generated Image\"><figcaption>Generated Image</figcaption></figure>\n<p><a href=\"{path}/download\">💾 Download image</a></p>",
            url = escape(url),
            path = kind.path(),
        );
    }

    return res;
}

pub fn render_activity(view: &ActivityView) -> String {
    let kind = view.kind;
    let session = view.session;

    let steps = instructions(kind)
        .iter()
        .map(|step| return format!("<li>{step}</li>"))
        .collect::<Vec<String>>()
        .join("\n");

    let mut body = format!(
        "<p><a href=\"/\">← Home</a></p>\n<h2>{heading}</h2>\n<p><b>How it works:</b> follow the steps your teacher has prepared.</p>\n<ol>\n{steps}\n</ol>\n{banners}\n<form method=\"post\" action=\"{path}/prompt\">\n{name}\n<label for=\"code\">🔑 Activity code</label>\n<input type=\"text\" id=\"code\" name=\"code\" value=\"{code}\">\n<button type=\"submit\">📄 Fetch prompt</button>\n</form>",
        heading = heading(kind),
        banners = render_banners(&view.banners),
        path = kind.path(),
        name = name_input(session),
        code = escape(
            &session
                .activity_for(kind)
                .map(|activity| return activity.code.to_string())
                .unwrap_or_default()
        ),
    );

    match session.activity_for(kind) {
        Some(activity) => {
            body += &format!(
                "\n<p><b>Prompt:</b> {}</p>\n",
                escape(&activity.prompt)
            );
            body += &match kind {
                ActivityKind::Vision => vision_controls(kind, session),
                ActivityKind::Dialogue => dialogue_controls(kind, session),
                ActivityKind::ImageGeneration => image_controls(kind, session),
            };
        }
        None => {
            body += &format!(
                "\n{}",
                render_banners(&[Banner::new(
                    BannerLevel::Info,
                    "Fetch your activity prompt to begin."
                )])
            );
        }
    }

    return layout(
        &format!("{} | Classroom AI Tools", kind.title()),
        background(kind),
        &body,
    );
}
