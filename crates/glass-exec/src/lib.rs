//! Command execution and output streaming.
//!
//! [`Launcher::execute`] turns a template name plus a user target into a running child
//! process and hands back an [`Execution`]: the command id and a bounded stream of
//! [`OutputEvent`](glass_model::OutputEvent)s that always ends with exactly one terminal
//! event.
mod error;
pub use error::{ExecError, ExecResult};

pub mod target;
pub use target::Target;

pub mod proc;
pub use proc::Invocation;

mod launcher;
pub use launcher::{EVENT_BUFFER, Execution, Launcher, PreparedCommand};

mod util;

pub mod prelude {
    pub use crate::error::{ExecError, ExecResult};
    pub use crate::{Execution, Launcher};
}
