pub mod health;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::auth;
use crate::generation::handlers as generation;
use crate::history::handlers as history;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        // Generation API
        .route("/api/generate", post(generation::handle_generate))
        .route("/api/networks", get(generation::handle_list_networks))
        // History API
        .route(
            "/api/history",
            get(history::handle_list).post(history::handle_create),
        )
        .route(
            "/api/history/:id",
            get(history::handle_get).delete(history::handle_delete),
        )
        .route("/api/history/:id/schedule", put(history::handle_schedule))
        .route(
            "/api/history/:id/networks/:network",
            get(history::handle_copy_text).patch(history::handle_update_text),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/login", post(auth::handle_login))
        .merge(protected)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::{test_state, MemoryPostStore, StubBackend, TEST_PASSWORD};

    fn basic_auth() -> String {
        format!("Basic {}", STANDARD.encode(format!("user:{TEST_PASSWORD}")))
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, basic_auth())
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth())
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn router(backend: StubBackend) -> (Router, Arc<StubBackend>) {
        let backend = Arc::new(backend);
        let state = test_state(backend.clone(), Arc::new(MemoryPostStore::default()));
        (build_router(state), backend)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _) = router(StubBackend::default());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_generate_requires_credentials() {
        let (app, backend) = router(StubBackend::default());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"topic": "x", "networks": ["twitter"]}).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_end_to_end() {
        let (app, _) = router(
            StubBackend::default()
                .reply(
                    "INSTAGRAM",
                    r#"{"text":"Remote work is reshaping...","hashtags":["remotework","productivity"]}"#,
                )
                .reply("LINKEDIN", "Not valid JSON at all"),
        );

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/generate",
                json!({
                    "topic": "remote work",
                    "tone": "Profesional",
                    "networks": ["instagram", "linkedin", "tiktok"],
                    "includeHashtags": true,
                    "includeCTA": false
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let results = body["results"].as_object().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results["instagram"],
            json!({
                "text": "Remote work is reshaping...",
                "hashtags": ["remotework", "productivity"],
                "charCount": 27
            })
        );
        assert_eq!(
            results["linkedin"],
            json!({"text": "Not valid JSON at all", "hashtags": [], "charCount": 21})
        );
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_topic_with_400() {
        let (app, backend) = router(StubBackend::default());
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/generate",
                json!({"topic": "", "tone": "Directo", "networks": ["twitter"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_null_networks_is_validation_error() {
        let (app, backend) = router(StubBackend::default());
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/generate",
                json!({"topic": "x", "tone": null, "networks": null}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_null_tone_still_generates() {
        let (app, backend) = router(StubBackend::default());
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/generate",
                json!({"topic": "x", "tone": null, "networks": ["twitter"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_bodies_get_json_validation_errors() {
        let bodies = [
            r#"{"topic": "x", "networks": ["twitter"]"#,
            r#"{"topic": "x", "networks": "twitter"}"#,
            r#"[1, 2, 3]"#,
        ];
        for raw in bodies {
            let (app, backend) = router(StubBackend::default());
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/generate")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, basic_auth())
                .body(Body::from(raw))
                .unwrap();

            let response = app.oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {raw}");
            assert_eq!(
                response.headers()[header::CONTENT_TYPE],
                "application/json",
                "body: {raw}"
            );
            assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
            assert_eq!(backend.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_missing_content_type_is_validation_error() {
        let (app, _) = router(StubBackend::default());
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/login")
            .body(Body::from(json!({"password": TEST_PASSWORD}).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_backend_failure_returns_generic_error() {
        let (app, _) = router(StubBackend::default().fail("TWITTER"));
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/generate",
                json!({"topic": "x", "tone": "Directo", "networks": ["instagram", "twitter"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "LLM_ERROR");
        assert!(body.get("results").is_none());
    }

    #[tokio::test]
    async fn test_login_sets_cookie_that_unlocks_api() {
        let (app, _) = router(StubBackend::default());
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"password": TEST_PASSWORD}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(set_cookie.contains("HttpOnly"));
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/networks")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let (app, _) = router(StubBackend::default());
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"password": "nope"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["ok"], false);
    }

    #[tokio::test]
    async fn test_history_lifecycle() {
        let (app, _) = router(StubBackend::default());

        let created = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/history",
                json!({
                    "topic": "remote work",
                    "tone": "Profesional",
                    "networks": ["twitter"],
                    "results": {"twitter": {"text": "Hola", "hashtags": ["a"], "charCount": 4}}
                }),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let id = body_json(created).await["id"].as_str().unwrap().to_string();

        let edited = app
            .clone()
            .oneshot(json_request(
                Method::PATCH,
                &format!("/api/history/{id}/networks/twitter"),
                json!({"text": "Hola de nuevo"}),
            ))
            .await
            .unwrap();
        assert_eq!(edited.status(), StatusCode::OK);
        assert_eq!(body_json(edited).await["results"]["twitter"]["charCount"], 13);

        let copied = app
            .clone()
            .oneshot(get_request(&format!("/api/history/{id}/networks/twitter")))
            .await
            .unwrap();
        let bytes = to_bytes(copied.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Hola de nuevo\n\n#a");

        let missing_network = app
            .clone()
            .oneshot(json_request(
                Method::PATCH,
                &format!("/api/history/{id}/networks/linkedin"),
                json!({"text": "x"}),
            ))
            .await
            .unwrap();
        assert_eq!(missing_network.status(), StatusCode::NOT_FOUND);

        let unscheduled = app
            .clone()
            .oneshot(get_request("/api/history?unscheduled=true"))
            .await
            .unwrap();
        assert_eq!(body_json(unscheduled).await.as_array().unwrap().len(), 1);

        let scheduled = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/history/{id}/schedule"),
                json!({"scheduledFor": "2026-11-02T09:00:00Z"}),
            ))
            .await
            .unwrap();
        assert_eq!(scheduled.status(), StatusCode::OK);

        let on_day = app
            .clone()
            .oneshot(get_request("/api/history?scheduledOn=2026-11-02"))
            .await
            .unwrap();
        assert_eq!(body_json(on_day).await.as_array().unwrap().len(), 1);

        let other_day = app
            .clone()
            .oneshot(get_request("/api/history?scheduledOn=2026-11-03"))
            .await
            .unwrap();
        assert!(body_json(other_day).await.as_array().unwrap().is_empty());

        let deleted = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(format!("/api/history/{id}"))
                    .header(header::AUTHORIZATION, basic_auth())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let gone = app
            .clone()
            .oneshot(get_request(&format!("/api/history/{id}")))
            .await
            .unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);

        let reschedule = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/history/{id}/schedule"),
                json!({"scheduledFor": null}),
            ))
            .await
            .unwrap();
        assert_eq!(reschedule.status(), StatusCode::NOT_FOUND);

        let listed = app.oneshot(get_request("/api/history")).await.unwrap();
        assert!(body_json(listed).await.as_array().unwrap().is_empty());
    }
}
