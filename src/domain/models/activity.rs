#[cfg(test)]
#[path = "activity_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::IntoEnumIterator;

/// The three classroom tools. Every activity record in the prompt store is
/// tagged for exactly one of them.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum ActivityKind {
    Vision,
    Dialogue,
    #[strum(serialize = "image")]
    ImageGeneration,
}

impl ActivityKind {
    /// Words in a record's `page` tag that select this kind.
    fn tag_words(&self) -> &'static [&'static str] {
        match self {
            ActivityKind::Vision => return &["vision"],
            ActivityKind::Dialogue => return &["text", "dialogue", "chat"],
            ActivityKind::ImageGeneration => return &["image"],
        }
    }

    /// Classifies a record's `page` tag. The tag is split into lowercase
    /// alphanumeric words; it belongs to a kind when it names that kind and
    /// no other.
    pub fn from_page_tag(tag: &str) -> Option<ActivityKind> {
        let lowered = tag.to_lowercase();
        let words = lowered
            .split(|c: char| return !c.is_alphanumeric())
            .filter(|word| return !word.is_empty())
            .collect::<Vec<&str>>();

        let mut matched = ActivityKind::iter().filter(|kind| {
            return kind
                .tag_words()
                .iter()
                .any(|tag_word| return words.contains(tag_word));
        });

        let first = matched.next()?;
        if matched.next().is_some() {
            return None;
        }

        return Some(first);
    }

    pub fn path(&self) -> String {
        return format!("/{self}");
    }

    pub fn title(&self) -> &'static str {
        match self {
            ActivityKind::Vision => return "Image Analysis",
            ActivityKind::Dialogue => return "Dialogue Generation",
            ActivityKind::ImageGeneration => return "Image Generation",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ActivityKind::Vision => return "🖼️",
            ActivityKind::Dialogue => return "📝",
            ActivityKind::ImageGeneration => return "🖌️",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            ActivityKind::Vision => {
                return "Upload or take a picture and let the AI analyse it using your teacher's instructions."
            }
            ActivityKind::Dialogue => {
                return "Write your answer to the activity and the AI continues the conversation with you."
            }
            ActivityKind::ImageGeneration => {
                return "Pick a few describing words and the AI draws a picture from your teacher's topic."
            }
        }
    }
}

/// A row of the teacher-maintained prompt store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub setting_name: String,
    pub page: String,
    pub prompt: String,
    pub email: String,
}

impl ActivityRecord {
    pub fn kind(&self) -> Option<ActivityKind> {
        return ActivityKind::from_page_tag(&self.page);
    }
}

/// The result of looking up an activity code for one kind of tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedActivity {
    pub kind: ActivityKind,
    pub code: String,
    pub prompt: String,
    pub teacher_email: String,
}
