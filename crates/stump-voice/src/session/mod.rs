//! The session actor: owns all mutable session state and serializes
//! restarts, tool dispatch, and sends through one event queue.

mod actor;
mod handle;
mod restart;


pub use actor::{SessionOptions, VoiceSession};
pub use handle::SessionHandle;

pub(crate) use handle::Command;
