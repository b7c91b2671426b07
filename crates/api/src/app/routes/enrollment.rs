use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use matricula_core::AggregateId;
use matricula_enrollment::{
    ApproveEnrollment, Enrollment, EnrollmentApplication, EnrollmentCommand, EnrollmentId,
    RejectEnrollment, SubmitEnrollment, WaitlistEnrollment,
};

use crate::app::dto::{EnrollmentRow, RejectEnrollmentRequest, SubmitEnrollmentResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::MonitorContext;

/// `POST /api/inscricao` — submit a completed wizard's field bag.
///
/// The bag is parsed into a typed application (re-running format and checksum
/// validation server-side), checked against the directory for a duplicate
/// CPF, then dispatched. Failures come back as non-fatal `4xx {error}` so the
/// wizard can surface them and let the user retry.
pub async fn submit_enrollment(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    let application: EnrollmentApplication = match serde_json::from_value(body) {
        Ok(app) => app,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string());
        }
    };

    // Server-side duplicate check; the client's debounced probe is advisory.
    if services
        .directory()
        .cpf_exists(services.active_edition(), application.cpf.digits())
    {
        return errors::json_error(
            StatusCode::CONFLICT,
            "duplicate_cpf",
            "an enrollment with this CPF already exists",
        );
    }

    let agg = AggregateId::new();
    let course = application.course.clone();

    let cmd = EnrollmentCommand::SubmitEnrollment(SubmitEnrollment {
        edition_id: services.active_edition(),
        enrollment_id: EnrollmentId::new(agg),
        application,
        occurred_at: Utc::now(),
    });

    if let Err(e) = services.dispatch::<Enrollment>(agg, "enrollment", cmd, |_edition, id| {
        Enrollment::empty(EnrollmentId::new(id))
    }) {
        return errors::dispatch_error_to_response(e);
    }

    (
        StatusCode::CREATED,
        Json(SubmitEnrollmentResponse { curso: course }),
    )
        .into_response()
}

/// `GET /api/inscricoes` — panel list of enrollments in the active edition.
pub async fn list_enrollments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(_monitor): Extension<MonitorContext>,
) -> axum::response::Response {
    let mut rows: Vec<EnrollmentRow> = services
        .directory()
        .list(services.active_edition())
        .into_iter()
        .map(EnrollmentRow::from)
        .collect();
    rows.sort_by(|a, b| a.nome.cmp(&b.nome));

    Json(rows).into_response()
}

/// `POST /api/inscricoes/{id}/aprovar`
pub async fn approve_enrollment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(monitor): Extension<MonitorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Some(agg) = parse_id(&id) else {
        return invalid_id();
    };

    let cmd = EnrollmentCommand::ApproveEnrollment(ApproveEnrollment {
        edition_id: services.active_edition(),
        enrollment_id: EnrollmentId::new(agg),
        decided_by: monitor.monitor_id(),
        occurred_at: Utc::now(),
    });

    decide(&services, agg, cmd)
}

/// `POST /api/inscricoes/{id}/reprovar`
pub async fn reject_enrollment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(monitor): Extension<MonitorContext>,
    Path(id): Path<String>,
    body: Option<Json<RejectEnrollmentRequest>>,
) -> axum::response::Response {
    let Some(agg) = parse_id(&id) else {
        return invalid_id();
    };

    let cmd = EnrollmentCommand::RejectEnrollment(RejectEnrollment {
        edition_id: services.active_edition(),
        enrollment_id: EnrollmentId::new(agg),
        decided_by: monitor.monitor_id(),
        reason: body.and_then(|Json(b)| b.motivo),
        occurred_at: Utc::now(),
    });

    decide(&services, agg, cmd)
}

/// `POST /api/inscricoes/{id}/excedente`
pub async fn waitlist_enrollment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(monitor): Extension<MonitorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Some(agg) = parse_id(&id) else {
        return invalid_id();
    };

    let cmd = EnrollmentCommand::WaitlistEnrollment(WaitlistEnrollment {
        edition_id: services.active_edition(),
        enrollment_id: EnrollmentId::new(agg),
        decided_by: monitor.monitor_id(),
        occurred_at: Utc::now(),
    });

    decide(&services, agg, cmd)
}

fn decide(
    services: &AppServices,
    agg: AggregateId,
    cmd: EnrollmentCommand,
) -> axum::response::Response {
    match services.dispatch::<Enrollment>(agg, "enrollment", cmd, |_edition, id| {
        Enrollment::empty(EnrollmentId::new(id))
    }) {
        Ok(committed) => Json(serde_json::json!({
            "id": agg.to_string(),
            "events_committed": committed.len(),
        }))
        .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

fn parse_id(id: &str) -> Option<AggregateId> {
    id.parse().ok()
}

fn invalid_id() -> axum::response::Response {
    errors::json_error(
        StatusCode::BAD_REQUEST,
        "invalid_id",
        "invalid enrollment id",
    )
}
