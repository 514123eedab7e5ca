// Chat view module
// Author: kelexine (https://github.com/kelexine)

pub mod models;
mod sessions;
mod view;

pub use models::{
    PhaseKind, ViewPhase, ViewSnapshot, INIT_ERROR_MESSAGE, NOT_READY_MESSAGE, QUERY_ERROR_MESSAGE,
};
pub use sessions::SessionRegistry;
pub use view::ChatView;
