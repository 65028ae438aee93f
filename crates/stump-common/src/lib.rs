pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ConfigError, StumpError};
pub use events::{Event, EventBus};
pub use id::{new_id, CallId};
pub use types::{Role, SessionState};

pub type Result<T> = std::result::Result<T, StumpError>;
