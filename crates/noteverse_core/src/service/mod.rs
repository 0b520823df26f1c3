//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate access checks and repository calls into use-case APIs.
//! - Keep boundary layers (CLI, HTTP) decoupled from storage details.

pub mod error;
pub mod note_service;
pub mod user_service;
