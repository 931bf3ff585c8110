use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::{error, info};

use super::{ApiError, ApiResult, AppState};
use crate::analytics::{AnalyticsRequest, ToolKind};

pub async fn health(State(backend): State<AppState>) -> ApiResult<Json<Value>> {
    backend
        .health()
        .await
        .map(Json)
        .map_err(|e| ApiError::Unavailable(e.to_string()))
}

pub async fn api_info(State(backend): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(Json(backend.service_info().await?))
}

/// `POST /analytics/{endpoint}` with the tool parameters as the JSON body.
pub async fn analytics(
    State(backend): State<AppState>,
    Path(endpoint): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let tool = ToolKind::from_endpoint(&format!("analytics/{}", endpoint))
        .filter(ToolKind::is_analytics)
        .ok_or(ApiError::NotFound)?;

    let args: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Unprocessable(format!("invalid JSON body: {}", e)))?
    };

    let request = AnalyticsRequest::from_tool(tool, &args)?;
    info!(tool = %tool, "analytics request");
    match backend.run(&request).await {
        Ok(result) => Ok(Json(Value::Object(result))),
        Err(e) => {
            error!(tool = %tool, error = %e, "analytics request failed");
            Err(e.into())
        }
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::super::router;
    use crate::analytics::Analytics;
    use crate::error::AnalyticsError;
    use crate::frame::Frame;
    use crate::warehouse::testing::FakeWarehouse;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with(fake: FakeWarehouse) -> axum::Router {
        router(Arc::new(Analytics::new(Arc::new(fake), "proj.")))
    }

    fn app() -> axum::Router {
        app_with(FakeWarehouse::new(|_| {
            Ok(Frame::new(
                vec!["total_patients".to_string()],
                vec![vec![json!(7)]],
            ))
        }))
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_routes() {
        for uri in ["/", "/health"] {
            let (status, body) = send(app(), get(uri)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "healthy");
            assert_eq!(body["total_patients"], 7);
        }
    }

    #[tokio::test]
    async fn test_unhealthy_is_503() {
        let app = app_with(FakeWarehouse::new(|_| {
            Err(AnalyticsError::Auth("no credentials".to_string()))
        }));
        let (status, body) = send(app, get("/health")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body["detail"],
            "Service unhealthy: authentication failed: no credentials"
        );
    }

    #[tokio::test]
    async fn test_api_info() {
        let (status, body) = send(app(), get("/api/info")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["endpoints"]["pmpm"], "POST /analytics/pmpm - PMPM financial analysis");
    }

    #[tokio::test]
    async fn test_analytics_with_and_without_body() {
        let (status, body) =
            send(app(), post("/analytics/demographics", r#"{"age_groups": false}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_patients"], 7);
        assert!(body.get("age_groups").is_none());

        let (status, _) = send(app(), post("/analytics/readmissions", "")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analytics_client_errors() {
        let (status, body) = send(app(), post("/analytics/pmpm", "{not json")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().starts_with("invalid JSON body"));

        let (status, _) = send(
            app(),
            post("/analytics/high-cost-patients", r#"{"cost_threshold": -5}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_routes_are_404() {
        let (status, body) = send(app(), post("/analytics/everything", "{}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Not Found"}));

        let (status, _) = send(app(), get("/metrics")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_is_405_with_detail() {
        let (status, body) = send(app(), get("/analytics/pmpm")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"detail": "Method Not Allowed"}));

        let (status, body) = send(app(), post("/health", "{}")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["detail"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_query_failure_is_500() {
        let app = app_with(FakeWarehouse::new(|_| {
            Err(AnalyticsError::Query("Query execution failed: table not found".to_string()))
        }));
        let (status, body) = send(app, post("/analytics/hcc-risk-scores", "{}")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Query execution failed: table not found");
    }
}
