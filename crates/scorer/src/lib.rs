//! Edge scorer service
//!
//! Serves forecast-driven node scores to the host scheduler over HTTP.

pub mod api;
pub mod config;
