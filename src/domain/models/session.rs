use super::ActivityKind;
use super::DescriptorSelection;
use super::ResolvedActivity;
use super::UploadedImage;

/// Per-browser-session values. Lives in the session store for the lifetime
/// of the process and is handed to each request handler explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub student_name: String,
    pub activity: Option<ResolvedActivity>,
    pub student_answer: String,
    pub ai_answer: Option<String>,
    pub uploaded_image: Option<UploadedImage>,
    pub descriptors: DescriptorSelection,
    pub image_url: Option<String>,
}

impl SessionState {
    /// The resolved activity, only when it was resolved for `kind`. A prompt
    /// fetched on one tool never leaks into another.
    pub fn activity_for(&self, kind: ActivityKind) -> Option<&ResolvedActivity> {
        return self
            .activity
            .as_ref()
            .filter(|activity| return activity.kind == kind);
    }

    /// Stores a freshly resolved activity and drops results that belonged to
    /// the previous one.
    pub fn set_activity(&mut self, activity: ResolvedActivity) {
        self.activity = Some(activity);
        self.ai_answer = None;
        self.uploaded_image = None;
        self.descriptors = DescriptorSelection::default();
        self.image_url = None;
    }
}
