//! Webhook gateway for the tutor decision layer.
//!
//! The host dialogue runtime calls this service once per turn: it names
//! an action (or submits the login form), we run it through the
//! dispatcher, apply the resulting directives to the sender's session,
//! and return them for the presentation layer to render.

#![warn(clippy::all)]

pub mod routes;

pub use routes::{build_router, AppState, ErrorResponse, LoginRequest, WebhookRequest};
