use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::app::dto::{CheckCpfRequest, CheckCpfResponse};
use crate::app::errors;
use crate::app::services::AppServices;

/// `POST /api/check-cpf` — does an enrollment with this CPF already exist in
/// the active edition? Accepts masked or raw input.
pub async fn check_cpf(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CheckCpfRequest>,
) -> axum::response::Response {
    let cpf = match body.cpf {
        Some(ref cpf) if !cpf.trim().is_empty() => cpf,
        _ => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "CPF is required");
        }
    };

    let exists = services
        .directory()
        .cpf_exists(services.active_edition(), cpf);

    Json(CheckCpfResponse { exists }).into_response()
}
