// src/utils/json.rs

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};

use crate::error::AppError;

/// `Json` extractor whose rejection is an `AppError`.
///
/// Bodies that fail to parse or carry fields of the wrong type answer with
/// `400 invalid_value` like any other validation failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        routing::post,
    };
    use tower::ServiceExt;

    use super::AppJson;
    use crate::models::mark::MarkRequest;

    async fn accept(AppJson(payload): AppJson<MarkRequest>) -> String {
        payload.mark.to_string()
    }

    async fn send(body: &'static str) -> (StatusCode, serde_json::Value) {
        let app = Router::new().route("/", post(accept));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn wrong_types_are_invalid_values() {
        for body in [r#"{"mark": 4.5}"#, r#"{"mark": "4"}"#, "{}", "{not json"] {
            let (status, json) = send(body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
            assert_eq!(json["code"], "invalid_value", "body {body}");
        }
    }

    #[tokio::test]
    async fn well_formed_body_passes_through() {
        let (status, _) = send(r#"{"mark": 4}"#).await;
        assert_eq!(status, StatusCode::OK);
    }
}
