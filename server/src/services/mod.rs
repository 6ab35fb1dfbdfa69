//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on request parsing, auth plumbing and mapping
//! errors to status codes.

pub mod auth;
pub mod comment;
pub mod group;
pub mod post;
pub mod session;
