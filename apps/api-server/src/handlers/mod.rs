//! HTTP handlers and route configuration.

mod auth;
mod health;
mod users;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/code", web::post().to(auth::send_code))
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/password/reset", web::post().to(auth::reset_password))
                    .route("/me", web::get().to(auth::me)),
            )
            // Profile routes
            .service(
                web::scope("/users")
                    .route("/me/email", web::put().to(users::update_email))
                    .route("/me/verify", web::post().to(users::verify_email))
                    .route("/{id}", web::get().to(users::get_user)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::{App, http::StatusCode, http::header, test};
    use learnshare_core::ephemeral::{EphemeralConfig, VerificationCode};
    use learnshare_core::ports::TtlStore;
    use learnshare_infra::{InMemoryStore, JwtConfig, RedisConfig};
    use serde_json::{Value, json};

    use crate::config::AppConfig;
    use crate::state::AppState;

    const CLIENT: &str = "203.0.113.7:51000";

    fn state() -> AppState {
        state_with_proxy_trust(false)
    }

    fn state_with_proxy_trust(trust_proxy_headers: bool) -> AppState {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            redis: RedisConfig::default(),
            jwt: JwtConfig::default(),
            ephemeral: EphemeralConfig::default(),
            sweep_interval: Duration::from_secs(60),
            trust_proxy_headers,
        };
        AppState::from_store(Arc::new(InMemoryStore::new()), &config).unwrap()
    }

    #[actix_web::test]
    async fn test_health_reports_store() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "ok");
    }

    #[actix_web::test]
    async fn test_code_register_logout_flow() {
        let state = state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let send = || {
            test::TestRequest::post()
                .uri("/api/auth/code")
                .peer_addr(CLIENT.parse().unwrap())
                .set_json(json!({ "email": "learner@example.com" }))
                .to_request()
        };
        assert_eq!(test::call_service(&app, send()).await.status(), StatusCode::OK);

        let resp = test::call_service(&app, send()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(resp.headers().contains_key(header::RETRY_AFTER));

        let raw = state
            .store
            .get("verify_code:learner@example.com")
            .await
            .unwrap()
            .unwrap();
        let code = VerificationCode::decode(&raw).unwrap().code;

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": "learner",
                "email": "learner@example.com",
                "password": "password123",
                "code": "not-it",
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": "learner",
                "email": "learner@example.com",
                "password": "password123",
                "code": code,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let token = body["access_token"].as_str().unwrap().to_string();
        let bearer = format!("Bearer {token}");

        let me = || {
            test::TestRequest::get()
                .uri("/api/auth/me")
                .insert_header((header::AUTHORIZATION, bearer.clone()))
                .to_request()
        };
        let body: Value = test::call_and_read_body_json(&app, me()).await;
        assert_eq!(body["data"]["email"], "learner@example.com");
        assert_eq!(body["data"]["status"], "active");

        let req = test::TestRequest::post()
            .uri("/api/auth/logout")
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        assert_eq!(test::call_service(&app, me()).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_protected_route_requires_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/auth/me").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    async fn code_statuses(state: AppState, forwarded_for: &[&str]) -> Vec<StatusCode> {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let mut statuses = Vec::new();
        for (i, spoofed) in forwarded_for.iter().enumerate() {
            let req = test::TestRequest::post()
                .uri("/api/auth/code")
                .peer_addr(CLIENT.parse().unwrap())
                .insert_header(("X-Forwarded-For", *spoofed))
                .set_json(json!({ "email": format!("learner{i}@example.com") }))
                .to_request();
            statuses.push(test::call_service(&app, req).await.status());
        }
        statuses
    }

    #[actix_web::test]
    async fn test_forwarded_for_ignored_by_default() {
        let statuses = code_statuses(state(), &["10.0.0.1", "10.0.0.2", "10.0.0.3"]).await;
        assert_eq!(
            statuses,
            vec![StatusCode::OK, StatusCode::TOO_MANY_REQUESTS, StatusCode::TOO_MANY_REQUESTS]
        );
    }

    #[actix_web::test]
    async fn test_forwarded_for_used_when_proxy_trusted() {
        let statuses = code_statuses(
            state_with_proxy_trust(true),
            &["10.0.0.1", "10.0.0.2", "10.0.0.1"],
        )
        .await;
        assert_eq!(
            statuses,
            vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );
    }

    #[actix_web::test]
    async fn test_register_without_code_then_verify_email() {
        let state = state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": "learner",
                "email": "learner@example.com",
                "password": "password123",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let bearer = format!("Bearer {}", body["access_token"].as_str().unwrap());

        let me = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, me).await;
        assert_eq!(body["data"]["status"], "inactive");

        let req = test::TestRequest::post()
            .uri("/api/auth/code")
            .peer_addr(CLIENT.parse().unwrap())
            .set_json(json!({ "email": "learner@example.com" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let raw = state
            .store
            .get("verify_code:learner@example.com")
            .await
            .unwrap()
            .unwrap();
        let code = VerificationCode::decode(&raw).unwrap().code;

        let req = test::TestRequest::post()
            .uri("/api/users/me/verify")
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .set_json(json!({ "email": "learner@example.com", "code": code }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "active");
    }
}
