//! Common utilities shared between the library and the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Render a possibly-absent value for a failure message
pub fn describe<T: std::fmt::Debug>(value: Option<&T>) -> String {
    match value {
        Some(v) => format!("{:?}", v),
        None => "<absent>".to_string(),
    }
}
