//! Logging bootstrap shared by the glass binaries.
mod logger;
pub use logger::*;
