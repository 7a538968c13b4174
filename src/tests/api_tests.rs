#[cfg(test)]
mod tests {
    use crate::api::create_router;
    use crate::config::Config;
    use crate::state::AppState;
    use crate::tests::support::{seed_course, seed_student, setup_pool, MockTokenClient, WALLET};
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app() -> (Router, SqlitePool, Arc<MockTokenClient>) {
        let pool = setup_pool().await;
        let chain = Arc::new(MockTokenClient::new());
        let state = Arc::new(AppState::new(Config::from_env(), pool.clone(), chain.clone()));
        (create_router(state), pool, chain)
    }

    fn request(method: Method, uri: &str, student_id: Option<i64>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = student_id {
            builder = builder.header("X-Student-Id", id.to_string());
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_uses_envelope() {
        let (app, _, _) = app().await;
        let response = app.oneshot(request(Method::GET, "/health", None, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn student_routes_require_identity() {
        let (app, _, _) = app().await;
        let response = app
            .oneshot(request(Method::POST, "/api/courses/1/enroll", None, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn malformed_identity_is_unauthorized() {
        let (app, _, _) = app().await;
        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/students/me/courses")
            .header("X-Student-Id", "abc")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn enroll_then_duplicate_is_bad_request() {
        let (app, pool, chain) = app().await;
        let student_id = seed_student(&pool, "S-500", Some(WALLET)).await;
        let course = seed_course(&pool, "Rust 101", 2, true).await;
        let uri = format!("/api/courses/{}/enroll", course.course_id);

        let response = app
            .clone()
            .oneshot(request(Method::POST, &uri, Some(student_id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["data"]["progress_rows"], 2);
        assert_eq!(body["data"]["reward"]["status"], "issued");
        assert_eq!(chain.awards().len(), 1);

        let response = app
            .oneshot(request(Method::POST, &uri, Some(student_id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Student is already enrolled in this course");
    }

    #[tokio::test]
    async fn enrolling_in_missing_course_is_not_found() {
        let (app, pool, _) = app().await;
        let student_id = seed_student(&pool, "S-501", None).await;

        let response = app
            .oneshot(request(Method::POST, "/api/courses/999/enroll", Some(student_id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn completion_report_is_camel_case() {
        let (app, pool, _) = app().await;
        let student_id = seed_student(&pool, "S-502", Some(WALLET)).await;
        let course = seed_course(&pool, "Rust 101", 4, true).await;

        app.clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/courses/{}/enroll", course.course_id),
                Some(student_id),
                None,
            ))
            .await
            .unwrap();

        let uri = format!("/api/materials/{}/complete", course.material_ids[0]);
        let response = app
            .clone()
            .oneshot(request(Method::PUT, &uri, Some(student_id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["completionPercentage"], 25);
        assert_eq!(body["data"]["hitMilestone"], 25);
        assert_eq!(body["data"]["reward"]["points"], 5);

        // POST is accepted too, and a repeat reports no milestone
        let response = app
            .oneshot(request(Method::POST, &uri, Some(student_id), None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert!(body["data"]["hitMilestone"].is_null());
    }

    #[tokio::test]
    async fn completing_unknown_material_is_not_found() {
        let (app, pool, _) = app().await;
        let student_id = seed_student(&pool, "S-503", None).await;

        let response = app
            .oneshot(request(Method::PUT, "/api/materials/31/complete", Some(student_id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ledger_page_sets_total_count_header() {
        let (app, pool, _) = app().await;
        let student_id = seed_student(&pool, "S-504", Some(WALLET)).await;
        for title in ["A", "B", "C"] {
            let course = seed_course(&pool, title, 1, true).await;
            app.clone()
                .oneshot(request(
                    Method::POST,
                    &format!("/api/courses/{}/enroll", course.course_id),
                    Some(student_id),
                    None,
                ))
                .await
                .unwrap();
        }

        let response = app
            .oneshot(request(
                Method::GET,
                &format!("/api/wallets/{}/transactions?offset=1&limit=1", WALLET),
                None,
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("X-Total-Count").unwrap(), "3");
        let body = json_body(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["transaction_type"], "enrollment_reward");
    }

    #[tokio::test]
    async fn invalid_wallet_and_paging_are_bad_requests() {
        let (app, _, _) = app().await;

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/wallets/0xnothex/balance", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(request(
                Method::GET,
                &format!("/api/wallets/{}/transactions?limit=0", WALLET),
                None,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn balance_is_cached_until_next_reward() {
        let (app, pool, chain) = app().await;
        let uri = format!("/api/wallets/{}/balance", WALLET);

        let first = json_body(app.clone().oneshot(request(Method::GET, &uri, None, None)).await.unwrap()).await;
        let second = json_body(app.clone().oneshot(request(Method::GET, &uri, None, None)).await.unwrap()).await;
        assert_eq!(first["data"]["cached"], false);
        assert_eq!(second["data"]["cached"], true);
        assert_eq!(chain.balance_lookups(), 1);

        let student_id = seed_student(&pool, "S-505", Some(WALLET)).await;
        let course = seed_course(&pool, "Rust 101", 1, true).await;
        app.clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/courses/{}/enroll", course.course_id),
                Some(student_id),
                None,
            ))
            .await
            .unwrap();

        let third = json_body(app.oneshot(request(Method::GET, &uri, None, None)).await.unwrap()).await;
        assert_eq!(third["data"]["cached"], false);
        assert_eq!(third["data"]["balance"], "5.0");
        assert_eq!(chain.balance_lookups(), 2);
    }

    #[tokio::test]
    async fn register_and_connect_wallet_over_http() {
        let (app, _, _) = app().await;

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/students",
                None,
                Some(json!({"name": "Alan", "email": "alan@uni.edu", "student_code": "S-506"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let student_id = json_body(response).await["data"]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/students/me/wallet",
                Some(student_id),
                Some(json!({"wallet_address": WALLET})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(
                Method::POST,
                "/api/students",
                None,
                Some(json!({
                    "name": "Imposter",
                    "email": "other@uni.edu",
                    "student_code": "S-507",
                    "wallet_address": WALLET
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_course_and_add_material() {
        let (app, _, _) = app().await;

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/courses",
                None,
                Some(json!({
                    "title": "Operating Systems",
                    "sections": [{"title": "Processes", "materials": [{"title": "Scheduling"}]}]
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        let section_id = body["data"]["sections"][0]["id"].as_i64().unwrap();

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/sections/{}/materials", section_id),
                None,
                Some(json!({"title": "Threads", "content_type": "video"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(request(Method::GET, "/api/courses", None, None))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["data"][0]["material_count"], 2);
    }

    #[tokio::test]
    async fn malformed_json_uses_error_envelope() {
        let (app, _, _) = app().await;
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/courses")
            .header("content-type", "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().starts_with("Invalid request"));
    }

    #[tokio::test]
    async fn missing_json_field_uses_error_envelope() {
        let (app, _, _) = app().await;
        let response = app
            .oneshot(request(
                Method::POST,
                "/api/students",
                None,
                Some(json!({"name": "No Email"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn non_numeric_path_id_uses_error_envelope() {
        let (app, pool, _) = app().await;
        let student_id = seed_student(&pool, "S-510", None).await;

        let response = app
            .oneshot(request(Method::POST, "/api/courses/abc/enroll", Some(student_id), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().starts_with("Invalid parameter"));
    }

    #[tokio::test]
    async fn update_and_delete_course_over_http() {
        let (app, pool, _) = app().await;
        let student_id = seed_student(&pool, "S-511", None).await;
        let enrolled = seed_course(&pool, "Taken", 1, true).await;
        let spare = seed_course(&pool, "Spare", 1, true).await;

        let response = app
            .clone()
            .oneshot(request(
                Method::PATCH,
                &format!("/api/courses/{}", spare.course_id),
                None,
                Some(json!({"is_active": false})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["is_active"], false);
        assert_eq!(body["data"]["title"], "Spare");

        let response = app
            .clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/courses/{}/enroll", enrolled.course_id),
                Some(student_id),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(request(
                Method::DELETE,
                &format!("/api/courses/{}", enrolled.course_id),
                None,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(request(
                Method::DELETE,
                &format!("/api/courses/{}", spare.course_id),
                None,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(request(
                Method::DELETE,
                &format!("/api/courses/{}", spare.course_id),
                None,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn profile_requires_identity_and_returns_stats() {
        let (app, pool, _) = app().await;
        let student_id = seed_student(&pool, "S-512", Some(WALLET)).await;
        let course = seed_course(&pool, "Rust 101", 2, true).await;

        let response = app
            .clone()
            .oneshot(request(Method::GET, "/api/students/me", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        app.clone()
            .oneshot(request(
                Method::POST,
                &format!("/api/courses/{}/enroll", course.course_id),
                Some(student_id),
                None,
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(request(Method::GET, "/api/students/me", Some(student_id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["student_code"], "S-512");
        assert_eq!(body["data"]["wallets"][0]["wallet_address"], WALLET);
        assert_eq!(body["data"]["enrollments"]["active"], 1);
        assert_eq!(body["data"]["rewards"]["total_points"], 5);
    }
}
