pub mod error;
pub mod event;
pub mod machine;
pub mod model;

pub use error::{StateError, StateResult};
pub use event::{AppEvent, AppEventKind};
pub use machine::SessionMachine;
pub use model::{AppPhase, Session, GENERATION_FAILED_MESSAGE};
