pub mod auth;
pub mod coaches;
pub mod config;
pub mod context;
pub mod downloads;
pub mod error;
pub mod http;
pub mod listing;
pub mod model;
pub mod nav;
pub mod profile;
pub mod sequence;

pub use config::ClientConfig;
pub use context::Context;
pub use error::{ClientError, Result, ValidationError};
