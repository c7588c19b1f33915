use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use validator::Validate;

use crate::dto::admin_dto::{
    ReuploadRequestPayload, ReviewDocumentRequest, TransitionStatusRequest, VerifyPaymentRequest,
};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::application::{ApplicationRecord, DocumentKind};
use crate::services::export_service::ExportService;
use crate::AppState;

fn actor(claims: &Option<Extension<Claims>>) -> String {
    claims
        .as_ref()
        .map(|c| c.sub.clone())
        .unwrap_or_else(|| "staff".to_string())
}

#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationRecord>>> {
    Ok(Json(state.applications.list().await?))
}

#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ApplicationRecord>> {
    Ok(Json(state.applications.get(&email).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/applications/{email}/documents/{kind}/review",
    params(
        ("email" = String, Path, description = "Applicant email"),
        ("kind" = String, Path, description = "Document kind")
    ),
    responses(
        (status = 200, description = "Review recorded, overall status recomputed"),
        (status = 400, description = "Unknown document kind"),
        (status = 404, description = "No application for the email")
    )
)]
#[axum::debug_handler]
pub async fn review_document(
    State(state): State<AppState>,
    Path((email, kind)): Path<(String, String)>,
    claims: Option<Extension<Claims>>,
    Json(payload): Json<ReviewDocumentRequest>,
) -> Result<Json<ApplicationRecord>> {
    payload.validate()?;
    let kind: DocumentKind = kind.parse()?;
    let record = state
        .applications
        .review_document(
            &email,
            kind,
            payload.decision,
            payload.comments,
            &actor(&claims),
        )
        .await?;
    Ok(Json(record))
}

#[axum::debug_handler]
pub async fn create_reupload_request(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<ReuploadRequestPayload>,
) -> Result<Json<ApplicationRecord>> {
    payload.validate()?;
    let mut kinds = Vec::with_capacity(payload.documents.len());
    for raw in &payload.documents {
        kinds.push(raw.parse::<DocumentKind>()?);
    }
    let record = state
        .applications
        .request_reupload(&email, kinds, payload.message)
        .await?;
    Ok(Json(record))
}

#[utoipa::path(
    post,
    path = "/api/admin/applications/{email}/status",
    params(("email" = String, Path, description = "Applicant email")),
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Required documents not approved")
    )
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Path(email): Path<String>,
    claims: Option<Extension<Claims>>,
    Json(payload): Json<TransitionStatusRequest>,
) -> Result<Json<ApplicationRecord>> {
    payload.validate()?;
    let record = state
        .applications
        .transition_status(&email, &payload.status, payload.notes, &actor(&claims))
        .await?;
    Ok(Json(record))
}

#[axum::debug_handler]
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(email): Path<String>,
    claims: Option<Extension<Claims>>,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<ApplicationRecord>> {
    payload.validate()?;
    let record = state
        .applications
        .verify_payment(&email, payload.amount, payload.reference, &actor(&claims))
        .await?;
    Ok(Json(record))
}

/// Staff upload of a job offer or contract for the applicant.
#[axum::debug_handler]
pub async fn upload_attachment(
    State(state): State<AppState>,
    Path((email, kind)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<Json<ApplicationRecord>> {
    let kind: DocumentKind = kind.parse()?;
    if !matches!(kind, DocumentKind::JobOffer | DocumentKind::Contract) {
        return Err(Error::Validation(format!(
            "{} is not an attachment kind",
            kind
        )));
    }

    while let Some(field) = multipart.next_field().await.map_err(Error::Multipart)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("attachment").to_string();
        let data = field.bytes().await.map_err(Error::Multipart)?;
        let record = state
            .applications
            .attach_file(&email, kind, &filename, data)
            .await?;
        return Ok(Json(record));
    }
    Err(Error::Validation("A file field is required".to_string()))
}

#[axum::debug_handler]
pub async fn delete_application(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse> {
    state.applications.delete(&email).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn export_applications(State(state): State<AppState>) -> Result<Response> {
    let applications = state.applications.list().await?;
    let buffer = ExportService::generate_applications_xlsx(&applications)?;
    let headers = [
        (
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"applications.xlsx\"",
        ),
    ];
    Ok((headers, buffer).into_response())
}
