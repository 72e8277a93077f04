#[cfg(test)]
#[path = "descriptor_test.rs"]
mod tests;

use std::collections::BTreeMap;

use strum::EnumIter;
use strum::IntoEnumIterator;

use super::ActivityError;

/// Form value used by every category when the student picks nothing.
pub const NOT_SELECTED: &str = "none";

/// The adjective groups a student may pick from when generating an image.
/// Each category is single-select, and "not selected" is always allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DescriptorCategory {
    Color,
    Mood,
    Style,
    Texture,
    Emotion,
}

impl DescriptorCategory {
    pub fn label(&self) -> &'static str {
        match self {
            DescriptorCategory::Color => return "🎨 Color",
            DescriptorCategory::Mood => return "🌅 Mood",
            DescriptorCategory::Style => return "🖌️ Style",
            DescriptorCategory::Texture => return "🧶 Texture",
            DescriptorCategory::Emotion => return "😊 Emotion",
        }
    }

    pub fn options(&self) -> &'static [&'static str] {
        match self {
            DescriptorCategory::Color => {
                return &[
                    "bright",
                    "dark",
                    "vivid",
                    "soft",
                    "warm",
                    "cool",
                    "colorful",
                    "black-and-white",
                    "pastel",
                    "muted",
                ]
            }
            DescriptorCategory::Mood => {
                return &[
                    "dreamy",
                    "realistic",
                    "elegant",
                    "calm",
                    "lively",
                    "tense",
                    "romantic",
                    "spooky",
                    "mysterious",
                    "peaceful",
                ]
            }
            DescriptorCategory::Style => {
                return &[
                    "minimal",
                    "intricate",
                    "vintage",
                    "modern",
                    "classical",
                    "futuristic",
                    "naturalistic",
                    "geometric",
                    "abstract",
                    "bold",
                ]
            }
            DescriptorCategory::Texture => {
                return &[
                    "smooth",
                    "rough",
                    "fluffy",
                    "spiky",
                    "textured",
                    "glossy",
                    "matte",
                    "unpolished",
                    "plush",
                ]
            }
            DescriptorCategory::Emotion => {
                return &[
                    "joyful",
                    "sad",
                    "angry",
                    "serene",
                    "touching",
                    "heartwarming",
                    "lonely",
                    "intriguing",
                    "thrilling",
                    "thoughtful",
                ]
            }
        }
    }
}

/// One choice per category. Categories left at "not selected" are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DescriptorSelection {
    choices: BTreeMap<DescriptorCategory, String>,
}

impl DescriptorSelection {
    /// Builds a selection from raw form values keyed by category name. Missing
    /// categories and the "not selected" value are skipped; values outside a
    /// category's option list are rejected.
    pub fn from_form(form: &BTreeMap<String, String>) -> Result<DescriptorSelection, ActivityError> {
        let mut selection = DescriptorSelection::default();
        for category in DescriptorCategory::iter() {
            let value = match form.get(&category.to_string()) {
                Some(value) => value.trim(),
                None => continue,
            };
            if value.is_empty() || value == NOT_SELECTED {
                continue;
            }

            selection.select(category, value)?;
        }

        return Ok(selection);
    }

    pub fn select(&mut self, category: DescriptorCategory, value: &str) -> Result<(), ActivityError> {
        if !category.options().contains(&value) {
            return Err(ActivityError::Validation(format!(
                "'{value}' is not a {category} option."
            )));
        }

        self.choices.insert(category, value.to_string());
        return Ok(());
    }

    pub fn get(&self, category: DescriptorCategory) -> Option<&str> {
        return self.choices.get(&category).map(|value| return value.as_str());
    }

    pub fn is_empty(&self) -> bool {
        return self.choices.is_empty();
    }

    /// Space-joined descriptors in category order.
    pub fn concept(&self) -> String {
        return self
            .choices
            .values()
            .map(|value| return value.as_str())
            .collect::<Vec<&str>>()
            .join(" ");
    }

    /// The teacher prompt followed by the chosen descriptors.
    pub fn combine_with(&self, prompt: &str) -> String {
        return format!("{prompt} {}", self.concept());
    }
}
