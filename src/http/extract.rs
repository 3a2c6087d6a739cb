//! Request extractors
//!
//! Wrappers around the axum extractors whose rejections are reported as
//! [`StudioError`], so malformed input gets the same JSON error body as any
//! other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::StudioError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(StudioError))]
pub struct JsonBody<T>(pub T);

/// Path parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(StudioError))]
pub struct PathParam<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(StudioError))]
pub struct QueryParams<T>(pub T);
