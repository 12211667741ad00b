//! qfind-core: shared configuration, error types, and logging for qfind.

pub mod build_info;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod paths;

pub use config::Config;
pub use error::{Error, Result};
