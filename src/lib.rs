//! authbridge — serialized authentication bridge.
//!
//! Accepts opaque bearer tokens from a hosting endpoint, runs them through an
//! injected [`Authenticator`](auth::Authenticator) one at a time in submission
//! order, and hands back session info or a structured [`AuthError`](auth::AuthError).
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use authbridge::prelude::*;
//!
//! # async fn example() -> authbridge::error::Result<()> {
//! authbridge::runtime::init();
//! let service = SerializedAuthenticationService::new(Arc::new(authenticator_fn(|token| {
//!     if token == "secret_token" { "session".to_string() } else { String::new() }
//! })))?;
//!
//! match service.authenticate_async("secret_token".into(), None).await {
//!     Ok(session) => println!("authenticated: {session}"),
//!     Err(err) => eprintln!("rejected: {err}"),
//! }
//! service.shutdown()?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod prelude;
pub mod runtime;

#[cfg(feature = "cli")]
pub mod cli;
