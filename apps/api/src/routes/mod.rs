pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::normalize::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Pipeline API
        .route("/api/v1/extract", post(handlers::handle_extract))
        .route("/api/v1/sanitize", post(handlers::handle_sanitize))
        .route("/api/v1/normalize", post(handlers::handle_normalize))
        .route("/api/v1/diff", post(handlers::handle_diff))
        // File intake
        .route("/api/v1/upload", post(handlers::handle_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::normalize::{HeuristicTables, Normalizer};

    const CV: &str = "Jane Doe\njane.doe@x.com\n\nExperience\nEngineer | Acme\n03/2019 - 12/2021\n- Built things\n\nEducation\nUniversity of Lyon\n2015 - 2018";
    const BOUNDARY: &str = "cvnormalizerboundary";

    fn app_with(config: Config) -> Router {
        let normalizer = Normalizer::new(HeuristicTables::default()).unwrap();
        build_router(AppState {
            config,
            normalizer: Arc::new(normalizer),
        })
    }

    fn app() -> Router {
        app_with(Config::default())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload(filename: &str, contents: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n{contents}\r\n--{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/v1/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "cv-normalizer");
    }

    #[tokio::test]
    async fn test_extract() {
        let response = app()
            .oneshot(post_json("/api/v1/extract", json!({ "source_text": CV })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["header"]["fullName"], "Jane Doe");
        assert_eq!(body["header"]["email"], "jane.doe@x.com");
        assert_eq!(body["experience"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sanitize_hostile_candidate() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/sanitize",
                json!({ "candidate": [1, "two", null] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["metadata"]["sourceOrderPreserved"], true);
        assert_eq!(body["experience"].as_array().unwrap().len(), 1);
        assert!(body["education"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_normalize_salvages_generated_output() {
        let ai_output = "Sure! Here it is:\n```json\n{\"summary\": \"Engineer with a taste for reliable systems.\",}\n```";
        let response = app()
            .oneshot(post_json(
                "/api/v1/normalize",
                json!({ "source_text": CV, "ai_output": ai_output }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["draft_source"], "merged");
        assert_eq!(
            body["document"]["summary"],
            "Engineer with a taste for reliable systems."
        );
        assert_eq!(body["document"]["header"]["fullName"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_normalize_falls_back_to_extractor() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/normalize",
                json!({ "source_text": CV, "ai_output": "no json here" }),
            ))
            .await
            .unwrap();
        let body = read_json(response).await;
        assert_eq!(body["draft_source"], "extractor");
        assert_eq!(body["document"]["experience"][0]["company"], "Acme");
    }

    #[tokio::test]
    async fn test_diff() {
        let before = json!({"experience": [{"company": "Acme", "title": "Engineer", "bullets": ["a"]}]});
        let after = json!({"experience": [{"company": "Beta", "title": "Engineer", "bullets": ["a"]}]});
        let response = app()
            .oneshot(post_json(
                "/api/v1/diff",
                json!({ "before": before, "after": after }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["diff"]["decisions"]["removed"], json!([0]));
        assert_eq!(body["diff"]["decisions"]["added"], json!([0]));
        assert!(body["narrative"]
            .as_str()
            .unwrap()
            .contains("Experiences: 0 kept, 1 removed, 1 added."));
    }

    #[tokio::test]
    async fn test_upload_text_file() {
        let response = app().oneshot(upload("cv.txt", CV)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["filename"], "cv.txt");
        assert_eq!(body["document"]["header"]["fullName"], "Jane Doe");
        assert_eq!(body["document"]["experience"][0]["startDate"], "2019-03");
    }

    #[tokio::test]
    async fn test_upload_rejects_unknown_extension() {
        let response = app().oneshot(upload("cv.docx", CV)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = read_json(response).await;
        assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn test_upload_rejects_blank_text() {
        let response = app().oneshot(upload("cv.txt", "   ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_oversized_source_text() {
        let config = Config {
            max_source_text_bytes: 16,
            ..Config::default()
        };
        let response = app_with(config)
            .oneshot(post_json("/api/v1/extract", json!({ "source_text": CV })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = read_json(response).await;
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    }
}
