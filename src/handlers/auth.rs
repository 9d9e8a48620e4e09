use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::{
    config::AppConfig,
    middleware::{error_handling::Result, Claims},
    models::user::{LoginRequest, LoginResponse, StaffResponse},
    services::{auth_service::sign_in_error_for_validation, AuthService},
};

pub async fn login(
    State(config): State<AppConfig>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if let Err(errors) = request.validate() {
        return Err(sign_in_error_for_validation(&errors).into());
    }

    let auth_service = AuthService::new(
        crate::repositories::StaffRepository::new(config.database_pool.clone()),
        &config.jwt_secret,
    );

    let (staff, token) = auth_service.sign_in(&request).await?;
    Ok(Json(LoginResponse { staff, token }))
}

/// The session profile behind the admin gate; unauthenticated requests are
/// already rejected by the auth middleware.
pub async fn session(
    State(config): State<AppConfig>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<StaffResponse>> {
    let auth_service = AuthService::new(
        crate::repositories::StaffRepository::new(config.database_pool.clone()),
        &config.jwt_secret,
    );

    let staff = auth_service.current_staff(claims.staff_id).await?;
    Ok(Json(staff))
}
