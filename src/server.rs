use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::config;
use crate::handlers::{protected, public, web};
use crate::middleware::basic_auth_middleware;
use crate::state::AppState;

/// The full application: website, public API and the session-protected API
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(account_routes())
        .merge(admin_routes())
        .merge(admin_group_routes())
        .merge(auth_attempt_routes())
        .merge(session_routes())
        .merge(status_routes())
        .merge(user_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), basic_auth_middleware));

    Router::new()
        // Web
        .route("/", get(web::home))
        .route("/health", get(public::health))
        // Public API
        .merge(public_routes())
        // Protected API
        .merge(protected)
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    let origins = &config().server.cors_origins;
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api", get(public::api_index))
        .route("/api/contact", post(public::contact))
        .route("/api/signup", post(public::signup))
        .route("/api/login", post(public::login))
        .route("/api/login/forgot", post(public::login_forgot))
        .route("/api/login/reset", post(public::login_reset))
        .route("/api/logout", delete(public::logout))
}

fn account_routes() -> Router<AppState> {
    use protected::accounts::*;

    Router::new()
        .route("/api/accounts", get(accounts_list).post(account_create))
        .route("/api/accounts/my", get(account_my).put(account_my_update))
        .route(
            "/api/accounts/:id",
            get(account_get).put(account_update).delete(account_delete),
        )
        .route("/api/accounts/:id/user", put(account_link_user).delete(account_unlink_user))
        .route("/api/accounts/:id/notes", post(account_add_note))
        .route("/api/accounts/:id/status", post(account_set_status))
}

fn admin_routes() -> Router<AppState> {
    use protected::admins::*;

    Router::new()
        .route("/api/admins", get(admins_list).post(admin_create))
        .route("/api/admins/:id", get(admin_get).put(admin_update).delete(admin_delete))
        .route("/api/admins/:id/permissions", put(admin_set_permissions))
        .route("/api/admins/:id/groups", put(admin_set_groups))
        .route("/api/admins/:id/user", put(admin_link_user).delete(admin_unlink_user))
}

fn admin_group_routes() -> Router<AppState> {
    use protected::admin_groups::*;

    Router::new()
        .route("/api/admin-groups", get(admin_groups_list).post(admin_group_create))
        .route(
            "/api/admin-groups/:id",
            get(admin_group_get).put(admin_group_update).delete(admin_group_delete),
        )
        .route("/api/admin-groups/:id/permissions", put(admin_group_set_permissions))
}

fn auth_attempt_routes() -> Router<AppState> {
    use protected::auth_attempts::*;

    Router::new()
        .route("/api/auth-attempts", get(auth_attempts_list))
        .route("/api/auth-attempts/:id", get(auth_attempt_get).delete(auth_attempt_delete))
}

fn session_routes() -> Router<AppState> {
    use protected::sessions::*;

    Router::new()
        .route("/api/sessions", get(sessions_list))
        .route("/api/sessions/my", get(sessions_my))
        .route("/api/sessions/my/:id", delete(session_my_delete))
        .route("/api/sessions/:id", get(session_get).delete(session_delete))
}

fn status_routes() -> Router<AppState> {
    use protected::statuses::*;

    Router::new()
        .route("/api/statuses", get(statuses_list).post(status_create))
        .route("/api/statuses/:id", get(status_get).put(status_update).delete(status_delete))
}

fn user_routes() -> Router<AppState> {
    use protected::users::*;

    Router::new()
        .route("/api/users", get(users_list).post(user_create))
        .route("/api/users/my", get(user_my).put(user_my_update))
        .route("/api/users/my/password", put(user_my_set_password))
        .route("/api/users/:id", get(user_get).put(user_update).delete(user_delete))
        .route("/api/users/:id/password", put(user_set_password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseManager;
    use crate::testing::RecordingMailer;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    // The pool is lazy, so routes that never reach the database work without one
    fn test_app() -> Router {
        let pool = DatabaseManager::connect(&config().database).unwrap();
        app(AppState::new(pool, Arc::new(RecordingMailer::default())))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn api_index_welcomes() {
        let response = test_app()
            .oneshot(Request::get("/api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["message"], "Welcome to the plot device.");
    }

    #[tokio::test]
    async fn protected_routes_challenge_for_credentials() {
        let response = test_app()
            .oneshot(Request::get("/api/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn malformed_basic_header_is_unauthorized() {
        let request = Request::get("/api/accounts/my")
            .header(header::AUTHORIZATION, "Bearer abc")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn contact_validates_before_sending() {
        let request = Request::post("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Ren","email":"not-an-email","message":"Hi"}"#))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert!(body["field_errors"]["email"].is_string());
    }

    #[tokio::test]
    async fn contact_sends_mail() {
        let mailer = Arc::new(RecordingMailer::default());
        let pool = DatabaseManager::connect(&config().database).unwrap();
        let app = app(AppState::new(pool, mailer.clone()));

        let request = Request::post("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Ren","email":"ren@stimpy.show","message":"You eediot!"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, format!("{} contact form", config().project_name));
        assert_eq!(sent[0].reply_to.as_ref().map(|r| r.address.as_str()), Some("ren@stimpy.show"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let request = Request::post("/api/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn home_page_is_html() {
        let response = test_app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok());
        assert!(content_type.is_some_and(|c| c.starts_with("text/html")));
    }
}
