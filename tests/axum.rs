mod common;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        extract::Request,
        http::{self, StatusCode},
        response::Response,
        routing::get,
    };
    use common::*;
    use cookie::Cookie;
    use http::header::{COOKIE, SET_COOKIE};
    use sessio::store::MemoryStore;
    use sessio::{Environment, Flash, Session, SessionConfig, SessionLayer};
    use std::sync::Arc;
    use tower::ServiceExt;
    use tower_cookies::CookieManagerLayer;

    async fn id_handler(session: Session<MemoryStore>) -> String {
        session.id().to_string()
    }

    async fn insert_handler(session: Session<MemoryStore>) -> Result<String, StatusCode> {
        let user = TestUser {
            id: 1,
            name: "Test".to_string(),
        };
        session
            .set("user", &user)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok("Success".to_string())
    }

    async fn get_handler(session: Session<MemoryStore>) -> Result<String, StatusCode> {
        let user: Option<TestUser> = session
            .get("user")
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(user
            .map(|u| u.name)
            .unwrap_or_else(|| "Not found".to_string()))
    }

    async fn set_flash_handler(session: Session<MemoryStore>) -> Result<String, StatusCode> {
        session
            .set_flash("hello")
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(session.flash())
    }

    async fn read_flash_handler(flash: Flash) -> String {
        flash.get()
    }

    fn create_app_with(store: Arc<MemoryStore>, config: Arc<SessionConfig>) -> Router {
        let session_layer = SessionLayer::new(store).with_config(config);

        Router::new()
            .route("/id", get(id_handler))
            .route("/set", get(insert_handler))
            .route("/get", get(get_handler))
            .route("/flash/set", get(set_flash_handler))
            .route("/flash/read", get(read_flash_handler))
            .layer(session_layer)
            .layer(CookieManagerLayer::new())
    }

    fn create_test_app() -> Router {
        create_app_with(Arc::new(MemoryStore::new()), build_config())
    }

    fn session_cookie(response: &Response) -> Cookie<'static> {
        let header = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("test_sess="))
            .expect("Set-Cookie header should be present")
            .to_string();
        Cookie::parse(header).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    async fn send(app: &Router, uri: &str, cookie: Option<&Cookie<'static>>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie.stripped().to_string());
        }
        app.clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_new_session_sets_cookie() {
        let app = create_test_app();
        let response = send(&app, "/id", None).await;

        assert_eq!(response.status(), StatusCode::OK);

        let cookie_str = response
            .headers()
            .get(SET_COOKIE)
            .expect("Set-Cookie header should be present")
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie_str.contains("test_sess="));
        assert!(cookie_str.contains("HttpOnly"));
        assert!(cookie_str.contains("Secure"));
        assert!(cookie_str.contains("SameSite=Lax"));
        assert!(cookie_str.contains("Path=/"));

        let cookie = session_cookie(&response);
        let id = body_string(response).await;
        assert_eq!(cookie.value(), id);
    }

    #[tokio::test]
    async fn test_existing_cookie_is_reused() {
        let app = create_test_app();

        let response = send(&app, "/id", None).await;
        let cookie = session_cookie(&response);
        let first_id = body_string(response).await;

        let response = send(&app, "/id", Some(&cookie)).await;
        assert_eq!(session_cookie(&response).value(), first_id);
        assert_eq!(body_string(response).await, first_id);
    }

    #[tokio::test]
    async fn test_session_data_survives_requests() {
        let app = create_test_app();

        let response = send(&app, "/set", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);

        let response = send(&app, "/get", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "Test");

        // A client without the cookie gets a different session
        let response = send(&app, "/get", None).await;
        assert_eq!(body_string(response).await, "Not found");
    }

    #[tokio::test]
    async fn test_flash_round_trip() {
        let app = create_test_app();

        let response = send(&app, "/flash/set", None).await;
        let cookie = session_cookie(&response);
        assert_eq!(body_string(response).await, "hello");

        let response = send(&app, "/flash/read", Some(&cookie)).await;
        assert_eq!(body_string(response).await, "hello");

        let response = send(&app, "/flash/read", Some(&cookie)).await;
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_unknown_cookie_value_is_adopted() {
        let app = create_test_app();
        let cookie = Cookie::new("test_sess", "client-chosen");

        let response = send(&app, "/get", Some(&cookie)).await;
        assert_eq!(session_cookie(&response).value(), "client-chosen");
        assert_eq!(body_string(response).await, "Not found");
    }

    #[tokio::test]
    async fn test_missing_cookie_middleware() {
        // Create app without CookieManagerLayer
        let app = Router::new()
            .route("/set", get(insert_handler))
            .layer(SessionLayer::new(Arc::new(MemoryStore::new())).with_config(build_config()));

        let response = app
            .oneshot(Request::builder().uri("/set").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_production_without_secret_token() {
        let config = Arc::new(SessionConfig::build().environment(Environment::Production));
        let app = create_app_with(Arc::new(MemoryStore::new()), config);

        let response = send(&app, "/id", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_development_without_secret_token() {
        let config = Arc::new(SessionConfig::build().environment(Environment::Development));
        let app = create_app_with(Arc::new(MemoryStore::new()), config);

        let response = send(&app, "/id", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let header = response
            .headers()
            .get(SET_COOKIE)
            .expect("Set-Cookie header should be present")
            .to_str()
            .unwrap()
            .to_string();
        assert!(header.starts_with("__geniesid="));
        assert!(!header.contains("Secure"));
    }
}
