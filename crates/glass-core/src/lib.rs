pub mod error;
pub use error::CoreError;

pub mod registry;
pub use registry::{CommandEntry, CommandRegistry, StopHandle, StopSignal, stop_pair};

pub mod limit;
pub use limit::RateLimiter;
