//! Router Module Index
//!
//! `public` holds unauthenticated endpoints. The resource routers are merged under
//! `/v1` in `create_router`, behind the bearer-token `auth_middleware`; routes that
//! need the admin role additionally take the `AdminUser` extractor in their handler.

/// Unauthenticated routes (health probe).
pub mod public;

/// `/v1/locations` routes.
pub mod locations;

/// `/v1/questions` routes.
pub mod questions;
