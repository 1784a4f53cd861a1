mod backend;
pub mod cheatsheet_client_test;
mod client_utils;
mod errors;
pub mod http;
mod opentelemetry;
mod types;

pub use backend::CheatSheetBackend;
pub use errors::*;
pub use http::{HttpBackend, HttpBackendOptions};
pub use types::*;
