use crate::{
    api::{
        error::ApiError,
        extract::{ApiJson, ApiPath, ApiQuery, StudentId},
        response::{created, with_total_count, ApiResponse},
    },
    db::transaction,
    models::{
        ConnectWalletRequest, CreateCourseRequest, LedgerQuery, NewMaterial, RegisterStudentRequest,
        UpdateCourseRequest,
    },
    service::{catalog, enrollment, progress, rewards::RewardStatus, students},
    state::AppState,
    validation::{validate_limit, validate_offset, validate_wallet_address},
};
use axum::{
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config.cors_origin);

    Router::new()
        .route("/health", get(health))
        .route("/api/students", post(register_student))
        .route("/api/students/me", get(my_profile))
        .route("/api/students/me/wallet", post(connect_wallet))
        .route("/api/students/me/chain-registration", post(register_on_chain))
        .route("/api/students/me/courses", get(my_courses))
        .route("/api/courses", get(list_courses).post(create_course))
        .route(
            "/api/courses/{course_id}",
            get(course_detail)
                .patch(update_course)
                .put(update_course)
                .delete(delete_course),
        )
        .route("/api/courses/{course_id}/enroll", post(enroll).delete(unenroll))
        .route("/api/courses/{course_id}/progress", get(course_progress))
        .route("/api/sections/{section_id}/materials", post(add_material))
        .route(
            "/api/materials/{material_id}/complete",
            put(complete_material).post(complete_material),
        )
        .route("/api/wallets/{address}/balance", get(wallet_balance))
        .route("/api/wallets/{address}/summary", get(wallet_summary))
        .route("/api/wallets/{address}/transactions", get(wallet_transactions))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }

    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS_ORIGIN '{}', allowing any origin", origin);
            layer.allow_origin(Any)
        }
    }
}

async fn health() -> Response {
    ApiResponse::success("EduPoints service is running", json!({"status": "ok"})).into_response()
}

// Students and wallets

async fn register_student(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterStudentRequest>,
) -> Result<Response, ApiError> {
    info!("Processing registration for student code {}", request.student_code);
    let registered = students::register_student(&state.db_pool, &request).await?;
    Ok(created("Student registered successfully", registered))
}

async fn my_profile(
    State(state): State<Arc<AppState>>,
    StudentId(student_id): StudentId,
) -> Result<Response, ApiError> {
    let profile = students::student_profile(&state.db_pool, student_id).await?;
    Ok(ApiResponse::success("Student profile retrieved successfully", profile).into_response())
}

async fn connect_wallet(
    State(state): State<Arc<AppState>>,
    StudentId(student_id): StudentId,
    ApiJson(request): ApiJson<ConnectWalletRequest>,
) -> Result<Response, ApiError> {
    let wallet = students::connect_wallet(&state.db_pool, student_id, &request.wallet_address).await?;
    Ok(ApiResponse::success("Wallet connected successfully", wallet).into_response())
}

async fn register_on_chain(
    State(state): State<Arc<AppState>>,
    StudentId(student_id): StudentId,
) -> Result<Response, ApiError> {
    let receipt =
        students::register_on_chain(&state.db_pool, state.token_client.as_ref(), student_id).await?;
    Ok(ApiResponse::success("Student registered on chain", receipt).into_response())
}

async fn my_courses(
    State(state): State<Arc<AppState>>,
    StudentId(student_id): StudentId,
) -> Result<Response, ApiError> {
    let courses = enrollment::list_enrolled(&state.db_pool, student_id).await?;
    Ok(ApiResponse::success("Enrolled courses retrieved successfully", courses).into_response())
}

// Catalog

async fn list_courses(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let courses = catalog::list_active_courses(&state.db_pool).await?;
    Ok(ApiResponse::success("Courses retrieved successfully", courses).into_response())
}

async fn create_course(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<CreateCourseRequest>,
) -> Result<Response, ApiError> {
    let course = catalog::create_course(&state.db_pool, &request).await?;
    Ok(created("Course created successfully", course))
}

async fn course_detail(
    State(state): State<Arc<AppState>>,
    ApiPath(course_id): ApiPath<i64>,
) -> Result<Response, ApiError> {
    let course = catalog::course_detail(&state.db_pool, course_id).await?;
    Ok(ApiResponse::success("Course retrieved successfully", course).into_response())
}

async fn update_course(
    State(state): State<Arc<AppState>>,
    ApiPath(course_id): ApiPath<i64>,
    ApiJson(request): ApiJson<UpdateCourseRequest>,
) -> Result<Response, ApiError> {
    let course = catalog::update_course(&state.db_pool, course_id, &request).await?;
    Ok(ApiResponse::success("Course updated successfully", course).into_response())
}

async fn delete_course(
    State(state): State<Arc<AppState>>,
    ApiPath(course_id): ApiPath<i64>,
) -> Result<Response, ApiError> {
    catalog::delete_course(&state.db_pool, course_id).await?;
    Ok(ApiResponse::<()>::message("Course deleted successfully").into_response())
}

async fn add_material(
    State(state): State<Arc<AppState>>,
    ApiPath(section_id): ApiPath<i64>,
    ApiJson(material): ApiJson<NewMaterial>,
) -> Result<Response, ApiError> {
    let added = catalog::add_material(&state.db_pool, section_id, &material).await?;
    Ok(created("Material added successfully", added))
}

// Enrollment and progress

async fn enroll(
    State(state): State<Arc<AppState>>,
    StudentId(student_id): StudentId,
    ApiPath(course_id): ApiPath<i64>,
) -> Result<Response, ApiError> {
    info!("Processing enrollment of student {} in course {}", student_id, course_id);
    let receipt =
        enrollment::enroll(&state.db_pool, state.token_client.as_ref(), student_id, course_id).await?;
    refresh_balance(&state, &receipt.reward).await;
    Ok(created("Enrolled in course successfully", receipt))
}

async fn unenroll(
    State(state): State<Arc<AppState>>,
    StudentId(student_id): StudentId,
    ApiPath(course_id): ApiPath<i64>,
) -> Result<Response, ApiError> {
    enrollment::unenroll(&state.db_pool, student_id, course_id).await?;
    Ok(ApiResponse::<()>::message("Unenrolled from course successfully").into_response())
}

async fn course_progress(
    State(state): State<Arc<AppState>>,
    StudentId(student_id): StudentId,
    ApiPath(course_id): ApiPath<i64>,
) -> Result<Response, ApiError> {
    let view = progress::course_progress(&state.db_pool, student_id, course_id).await?;
    Ok(ApiResponse::success("Course progress retrieved successfully", view).into_response())
}

async fn complete_material(
    State(state): State<Arc<AppState>>,
    StudentId(student_id): StudentId,
    ApiPath(material_id): ApiPath<i64>,
) -> Result<Response, ApiError> {
    let report =
        progress::complete_material(&state.db_pool, state.token_client.as_ref(), student_id, material_id)
            .await?;
    if let Some(reward) = &report.reward {
        refresh_balance(&state, reward).await;
    }
    Ok(ApiResponse::success("Material marked as completed", report).into_response())
}

async fn refresh_balance(state: &AppState, reward: &RewardStatus) {
    if let RewardStatus::Issued { wallet_address, .. } = reward {
        state.balances.invalidate(wallet_address).await;
    }
}

// Wallet reads

fn wallet_path(address: &str) -> Result<String, ApiError> {
    validate_wallet_address(address)?;
    Ok(address.to_lowercase())
}

async fn wallet_balance(
    State(state): State<Arc<AppState>>,
    ApiPath(address): ApiPath<String>,
) -> Result<Response, ApiError> {
    let address = wallet_path(&address)?;

    if let Some(balance) = state.balances.get(&address).await {
        return Ok(ApiResponse::success(
            "Balance retrieved successfully",
            json!({"walletAddress": address, "balance": balance, "cached": true}),
        )
        .into_response());
    }

    let balance = state.token_client.balance_of(&address).await?;
    state.balances.insert(&address, balance.clone()).await;

    Ok(ApiResponse::success(
        "Balance retrieved successfully",
        json!({"walletAddress": address, "balance": balance, "cached": false}),
    )
    .into_response())
}

async fn wallet_summary(
    State(state): State<Arc<AppState>>,
    ApiPath(address): ApiPath<String>,
) -> Result<Response, ApiError> {
    let address = wallet_path(&address)?;
    let summary = state.token_client.get_student_summary(&address).await?;
    Ok(ApiResponse::success("Student summary retrieved successfully", summary).into_response())
}

async fn wallet_transactions(
    State(state): State<Arc<AppState>>,
    ApiPath(address): ApiPath<String>,
    ApiQuery(params): ApiQuery<LedgerQuery>,
) -> Result<Response, ApiError> {
    let address = wallet_path(&address)?;
    let offset = validate_offset(params.offset.as_deref())?;
    let limit = validate_limit(params.limit.as_deref())?;

    info!(
        "Fetching ledger for {}, offset: {}, limit: {}",
        address, offset, limit
    );

    let (entries, total_count) = transaction::get_entries(&state.db_pool, &address, offset, limit).await?;
    Ok(with_total_count("Transactions retrieved successfully", entries, total_count))
}
