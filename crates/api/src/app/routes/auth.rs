use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use matricula_auth::{CodeStore, VerificationCode, VerificationError};

use crate::app::dto::{SendVerificationRequest, SuccessResponse, VerifyCodeRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::mail::VerificationEmail;

/// `POST /api/send-verification` — issue a login code and hand it to the
/// mail collaborator. A fresh request replaces any previous code for the
/// same address.
pub async fn send_verification(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<SendVerificationRequest>,
) -> axum::response::Response {
    let email = match body.email {
        Some(ref email) if email.contains('@') => email.trim().to_string(),
        _ => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "a valid e-mail is required",
            );
        }
    };

    let code = VerificationCode::issue(email.clone(), Utc::now());
    let outbound = VerificationEmail {
        to: email,
        code: code.code.clone(),
    };
    services.codes().upsert(code);

    if let Err(e) = services.mailer().send_verification(&outbound) {
        tracing::error!("failed to send verification code: {e}");
        return errors::json_error(StatusCode::BAD_GATEWAY, "mail_error", e.to_string());
    }

    Json(SuccessResponse { success: true }).into_response()
}

/// `POST /api/verify-code` — check a submitted login code (single use, 10
/// minute expiry).
pub async fn verify_code(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<VerifyCodeRequest>,
) -> axum::response::Response {
    let (email, code) = match (body.email.as_deref(), body.code.as_deref()) {
        (Some(email), Some(code)) if !email.is_empty() && !code.is_empty() => (email, code),
        _ => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                "e-mail and code are required",
            );
        }
    };

    match matricula_auth::verify_code(services.codes(), email, code, Utc::now()) {
        Ok(()) => Json(SuccessResponse { success: true }).into_response(),
        Err(VerificationError::Expired) => {
            errors::json_error(StatusCode::BAD_REQUEST, "code_expired", "code expired")
        }
        Err(VerificationError::InvalidCode) => errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_code",
            "code not found or invalid",
        ),
    }
}
