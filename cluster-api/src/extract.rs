/// Request extractors
///
/// [`ApiJson`] behaves like `axum::Json` but rejects with [`ApiError`], so a
/// malformed body or an unknown key in a patch answers with the usual
/// `{"message": ...}` shape.

use axum::extract::FromRequest;

use crate::error::ApiError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
