use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{protected, public};
use crate::middleware::session_middleware;
use crate::state::AppState;

/// The full HTTP surface
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security.cors_origins);
    let body_limit = state.config.api.max_request_size_bytes;

    Router::new()
        .route("/", get(public::status::root))
        .route("/health", get(public::status::health))
        .merge(auth_routes())
        .merge(trip_routes())
        .layer(middleware::from_fn_with_state(state.clone(), session_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(public::auth::register_post))
        .route("/api/auth/login", post(public::auth::login_post))
        .route("/api/auth/me", get(protected::auth::me_get))
}

fn trip_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/trips",
            get(public::trips::trips_get).post(protected::trips::trip_post),
        )
        .route("/api/trips/mine", get(protected::trips::mine_get))
        .route("/api/trips/upload", post(protected::uploads::upload_post))
        .route(
            "/api/trips/:id",
            get(public::trips::trip_get)
                .put(protected::trips::trip_put)
                .delete(protected::trips::trip_delete),
        )
        .route("/api/trips/:id/upload", put(protected::uploads::upload_put))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS];
    let base = CorsLayer::new().allow_methods(methods).allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::in_memory(&AppConfig::development()).unwrap())
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_memory_backend() {
        let response = app().oneshot(get_request("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["database"], "memory");
    }

    #[tokio::test]
    async fn health_reports_unreachable_database() {
        let mut state = AppState::in_memory(&AppConfig::development()).unwrap();
        state.database = Some(crate::database::DatabaseManager::unreachable());

        let response = router(state).oneshot(get_request("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn create_requires_a_token() {
        let response = app()
            .oneshot(json_request(Method::POST, "/api/trips", None, json!({"title": "Pai"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn garbage_token_is_anonymous() {
        let response = app()
            .oneshot(get_request("/api/trips/mine", Some("garbage")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_read_update_delete_round() {
        let app = app();
        let owner = "jwt-token-5-1700000000000";
        let stranger = "jwt-token-6-1700000000000";

        let created = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/trips",
                Some(owner),
                json!({"title": "Koh Lipe", "photos": ["a.jpg", "b.jpg"], "tags": ["สตูล"]}),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::OK);
        let created = body_json(created).await;
        let id = created["data"]["id"].as_i64().unwrap();
        assert_eq!(created["data"]["authorId"], 5);

        let fetched = app
            .clone()
            .oneshot(get_request(&format!("/api/trips/{}", id), None))
            .await
            .unwrap();
        let fetched = body_json(fetched).await;
        assert_eq!(fetched["data"]["photos"], json!(["a.jpg", "b.jpg"]));
        assert_eq!(fetched["data"]["coverImage"], "a.jpg");

        let forbidden = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/trips/{}", id),
                Some(stranger),
                json!({"title": "Mine now"}),
            ))
            .await
            .unwrap();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let updated = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                &format!("/api/trips/{}", id),
                Some(owner),
                json!({"title": "Koh Lipe again"}),
            ))
            .await
            .unwrap();
        assert_eq!(updated.status(), StatusCode::OK);
        let updated = body_json(updated).await;
        assert_eq!(updated["data"]["title"], "Koh Lipe again");
        assert_eq!(updated["data"]["tags"], json!(["สตูล"]));

        let deleted = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri(format!("/api/trips/{}", id))
                    .header(header::AUTHORIZATION, format!("Bearer {}", owner))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);
        assert_eq!(body_json(deleted).await["data"], json!({"id": id, "deleted": true}));

        let gone = app
            .oneshot(get_request(&format!("/api/trips/{}", id), None))
            .await
            .unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/trips")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::AUTHORIZATION, "Bearer jwt-token-5-1")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_JSON");
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_bad_request() {
        let response = app().oneshot(get_request("/api/trips/abc", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mine_lists_own_trips_with_user_id() {
        let app = app();
        for (token, title) in [("jwt-token-5-1", "Mine"), ("jwt-token-6-1", "Theirs")] {
            let response = app
                .clone()
                .oneshot(json_request(Method::POST, "/api/trips", Some(token), json!({"title": title})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(get_request("/api/trips/mine", Some("jwt-token-5-1")))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["data"]["userId"], 5);
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["trips"][0]["title"], "Mine");
    }

    #[tokio::test]
    async fn multipart_create_uploads_photos() {
        let boundary = "travel-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nDoi Inthanon\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"tags\"\r\n\r\nmountain, เชียงใหม่\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"latitude\"\r\n\r\n18.58\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"photos\"; filename=\"peak.jpg\"\r\n\
             Content-Type: image/jpeg\r\n\r\nJPEGDATA\r\n\
             --{b}--\r\n",
            b = boundary
        );

        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/trips/upload")
                    .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
                    .header(header::AUTHORIZATION, "Bearer jwt-token-5-1")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["data"]["title"], "Doi Inthanon");
        assert_eq!(body["data"]["tags"], json!(["mountain", "เชียงใหม่"]));
        assert_eq!(body["data"]["latitude"], 18.58);
        let photo = body["data"]["photos"][0].as_str().unwrap();
        assert!(photo.ends_with("_peak.jpg"), "{}", photo);
    }

    #[tokio::test]
    async fn demo_login_then_me() {
        let app = app();
        let login = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/auth/login",
                None,
                json!({"email": "demo@example.com", "password": "password"}),
            ))
            .await
            .unwrap();
        assert_eq!(login.status(), StatusCode::OK);
        let token = body_json(login).await["data"]["token"].as_str().unwrap().to_string();

        let me = app.oneshot(get_request("/api/auth/me", Some(&token))).await.unwrap();
        let me = body_json(me).await;
        assert_eq!(me["data"]["id"], 1);
        assert_eq!(me["data"]["displayName"], "Demo User");
    }
}
