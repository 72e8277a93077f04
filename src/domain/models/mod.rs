mod activity;
mod backend;
mod descriptor;
mod email;
mod error;
mod session;
mod upload;

pub use activity::*;
pub use backend::*;
pub use descriptor::*;
pub use email::*;
pub use error::*;
pub use session::*;
pub use upload::*;
