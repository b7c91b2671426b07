//! Request/response DTOs.

use serde::{Deserialize, Serialize};

use matricula_enrollment::EnrollmentStatus;
use matricula_infra::EnrollmentReadModel;

#[derive(Debug, Deserialize)]
pub struct CheckCpfRequest {
    pub cpf: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckCpfResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitEnrollmentResponse {
    /// Name of the course the applicant was enrolled into.
    pub curso: String,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentRow {
    pub id: String,
    pub nome: String,
    pub cpf: String,
    pub email: String,
    pub curso: String,
    pub status: EnrollmentStatus,
}

impl From<EnrollmentReadModel> for EnrollmentRow {
    fn from(row: EnrollmentReadModel) -> Self {
        Self {
            id: row.enrollment_id.to_string(),
            nome: row.name,
            cpf: row.cpf,
            email: row.email,
            curso: row.course,
            status: row.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RejectEnrollmentRequest {
    /// Optional reason shown to the applicant.
    pub motivo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendVerificationRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}
