//! Participant manager service.
//!
//! Lists a site administrator's studies, exposes a study's registered
//! participants, and manages site enrollment targets. Access is governed by
//! per-study VIEW/EDIT permissions; enrollment changes are further gated by the
//! study type and the site status.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, ErrorCode, Result};
