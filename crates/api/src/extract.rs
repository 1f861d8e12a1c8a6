//! Request body extractors.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejection goes through [`AppError`].
///
/// Any body that cannot be decoded, whether it is not JSON at all or does
/// not match the expected shape, becomes a `422` with the JSON error
/// envelope instead of axum's mix of `400` and `422` plain-text answers.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
