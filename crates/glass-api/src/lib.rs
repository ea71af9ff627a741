mod error;
pub use error::ApiError;

mod request;
pub use request::{ConfigView, ExecuteRequest};

mod frame;
pub use frame::Frame;

mod handler;
pub use handler::ApiHandler;

mod adapter;
pub use adapter::GlassAdapter;

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpApi;

#[cfg(feature = "http")]
pub use axum;
