//! HTTP server and daemon configuration.
//!
//! This module provides:
//! - Configuration types and file resolution (`config`)
//! - The axum router and error mapping (`http`)

pub mod config;
pub mod http;

pub use config::Config;
pub use http::{ApiError, router, serve};
