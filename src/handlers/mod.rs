//! HTTP handlers, one module per resource.
//!
//! Every handler runs the same sequence: role check (extractor), validation
//! (`Validated*` extractors), `controller::load` for `:id` routes, then the controller
//! operation. Errors come back as `ApiError` and are rendered in one place.

/// `/v1/locations` handlers.
pub mod locations;
/// `/v1/questions` handlers.
pub mod questions;
