//! Domain models for Pitch Like This.
//!
//! These are the core types shared across all crates.

pub mod campaign;
pub mod case_study;
pub mod client_service;
pub mod identity;
pub mod lead;
pub mod project;
pub mod session;
