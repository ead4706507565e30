//! Request extractors that reject with [`AppError`].
//!
//! axum's own `Json`, `Query` and `Path` answer bad input with a plain-text
//! 4xx. These wrappers route the same failures through `AppError::Validation`
//! so every client error carries the `{"error": ...}` body.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
        routing::{get, post},
    };
    use booklist_core::StockEntryId;
    use tower::ServiceExt;

    use crate::routes::stock::{CurrentQuery, StockRequest};

    fn router() -> Router {
        Router::new()
            .route(
                "/stock",
                post(|ApiJson(body): ApiJson<StockRequest>| async move { body.grade }),
            )
            .route(
                "/stock/current",
                get(|ApiQuery(query): ApiQuery<CurrentQuery>| async move { query.grade }),
            )
            .route(
                "/stock/{id}",
                get(|ApiPath(id): ApiPath<StockEntryId>| async move { id.to_string() }),
            )
    }

    async fn error_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(body: &'static str) -> Request<Body> {
        Request::post("/stock")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_body_field_is_bad_request() {
        let response = router()
            .oneshot(post_json(r#"{"grade":"1","location":"A","openingStock":5}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = error_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("date"));
    }

    #[tokio::test]
    async fn test_unparsable_date_is_bad_request() {
        let response = router()
            .oneshot(post_json(
                r#"{"grade":"1","location":"A","date":"01/02/2024","received":0,"redeemed":0}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = router().oneshot(post_json("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_bad_request() {
        let request = Request::post("/stock")
            .body(Body::from(r#"{"grade":"1"}"#))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_query_is_bad_request() {
        let request = Request::get("/stock/current?grade=1&location=A&asOf=yesterday")
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_bad_path_id_is_bad_request() {
        let request = Request::get("/stock/not-a-uuid").body(Body::empty()).unwrap();
        let response = router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_body(response).await["error"].is_string());
    }
}
