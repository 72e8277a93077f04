mod activities;
mod notifier;
mod prompt_resolver;
mod sessions;

pub use activities::*;
pub use notifier::*;
pub use prompt_resolver::*;
pub use sessions::*;
