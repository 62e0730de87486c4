//! Data-access layer for a news and discussion site: topics, users,
//! articles and comments behind validated, guarded async queries.

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod seed;

pub use error::{ErrorBody, ModelError, ModelResult};
