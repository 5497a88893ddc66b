//! Body and path extractors whose rejections render as `{"error": ...}`.

use axum::extract::{FromRequest, FromRequestParts};

use super::ApiError;

/// `Json` body extractor rejecting through [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Form` body extractor rejecting through [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(ApiError))]
pub struct ApiForm<T>(pub T);

/// `Path` extractor rejecting through [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
