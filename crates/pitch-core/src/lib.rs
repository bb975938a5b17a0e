//! Pitch Core — domain models, error taxonomy, campaign lifecycle
//! rules and repository traits shared by every Pitch Like This crate.

pub mod batch;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod sanitize;
