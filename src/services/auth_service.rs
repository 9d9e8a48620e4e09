use thiserror::Error;
use uuid::Uuid;

use crate::middleware::error_handling::{AppError, Result};
use crate::middleware::JwtService;
use crate::models::user::{LoginRequest, StaffResponse};
use crate::repositories::StaffRepository;

/// The fixed sign-in error vocabulary. Every failure a client can see is one
/// of these; anything unexpected collapses to `Other` and the detail stays in
/// the server log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignInError {
    #[error("Invalid email address format.")]
    InvalidEmail,
    #[error("This account has been disabled.")]
    UserDisabled,
    #[error("No account found with this email address.")]
    UserNotFound,
    #[error("Incorrect password. Please try again.")]
    WrongPassword,
    #[error("Invalid email or password. Please try again.")]
    InvalidCredential,
    #[error("Too many failed login attempts. Please try again later.")]
    TooManyRequests,
    #[error("Login failed. Please check your credentials and try again.")]
    Other,
}

pub struct AuthService {
    staff_repo: StaffRepository,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(staff_repo: StaffRepository, jwt_secret: &str) -> Self {
        Self {
            staff_repo,
            jwt_service: JwtService::new(jwt_secret),
        }
    }

    pub async fn sign_in(
        &self,
        request: &LoginRequest,
    ) -> std::result::Result<(StaffResponse, String), SignInError> {
        let staff = self
            .staff_repo
            .find_by_email(request.email.trim())
            .await
            .map_err(|err| {
                tracing::error!("Staff lookup failed: {:?}", err);
                SignInError::Other
            })?
            .ok_or(SignInError::UserNotFound)?;

        if staff.disabled {
            return Err(SignInError::UserDisabled);
        }

        let password_ok =
            bcrypt::verify(&request.password, &staff.password_hash).map_err(|err| {
                tracing::error!("Password verification failed: {:?}", err);
                SignInError::Other
            })?;
        if !password_ok {
            return Err(SignInError::WrongPassword);
        }

        let token = self
            .jwt_service
            .generate_token(staff.id, &staff.email)
            .map_err(|err| {
                tracing::error!("Token generation failed: {:?}", err);
                SignInError::Other
            })?;

        tracing::info!("Staff signed in: {}", staff.id);
        Ok((staff.into(), token))
    }

    /// The current-session profile consulted by admin views.
    pub async fn current_staff(&self, staff_id: Uuid) -> Result<StaffResponse> {
        let staff = self
            .staff_repo
            .find_by_id(staff_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if staff.disabled {
            return Err(AppError::Unauthorized);
        }

        Ok(staff.into())
    }
}

/// Maps a failed credential validation onto the vocabulary: a malformed email
/// reads as `InvalidEmail`, anything else as the generic `InvalidCredential`.
pub fn sign_in_error_for_validation(errors: &validator::ValidationErrors) -> SignInError {
    if errors.field_errors().contains_key("email") {
        SignInError::InvalidEmail
    } else {
        SignInError::InvalidCredential
    }
}
