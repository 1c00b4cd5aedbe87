//! # Nursery Back Check Common Library
//!
//! Shared code for the nursery back check service:
//! - Species constants and the derived-field calculator
//! - Record models
//! - Database initialization, versioned migrations and the persistence gateway
//! - CSV and photo archive export
//! - Credential hashing and login sessions
//! - Attachment decoding and object-storage upload
//! - Configuration loading

pub mod attachments;
pub mod auth;
pub mod calc;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;

pub use calc::Species;
pub use error::{Error, Result};
