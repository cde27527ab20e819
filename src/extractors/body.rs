//! JSON object body whose rejections use the standard error envelope.

use crate::error::AppError;
use crate::store::Record;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct JsonBody(pub Record);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| match e.status() {
                StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(e.body_text()),
                _ => AppError::BadRequest(e.body_text()),
            })?;
        match value {
            Value::Object(m) => Ok(JsonBody(m)),
            _ => Err(AppError::BadRequest("body must be a JSON object".into())),
        }
    }
}
