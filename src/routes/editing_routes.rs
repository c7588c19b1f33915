use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    Extension,
};
use validator::Validate;

use crate::dto::editing_dto::{
    DownloadTokenRequest, DownloadTokenResponse, EditingView, RecordPaymentRequest,
};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::application::DocumentKind;
use crate::models::editing::ServiceType;
use crate::services::file_service::IncomingFile;
use crate::AppState;

async fn collect_files(
    multipart: &mut Multipart,
    allowed: fn(DocumentKind) -> bool,
    service_type: &mut Option<ServiceType>,
) -> Result<Vec<IncomingFile>> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(Error::Multipart)? {
        let name = field.name().unwrap_or("").to_string();
        if name == "service_type" {
            let raw = field.text().await.map_err(Error::Multipart)?;
            *service_type = Some(raw.trim().parse::<ServiceType>()?);
            continue;
        }
        let kind: DocumentKind = name.parse()?;
        if !allowed(kind) {
            return Err(Error::Validation(format!(
                "{} is not accepted by this endpoint",
                kind
            )));
        }
        let filename = field.file_name().unwrap_or("document").to_string();
        let data = field.bytes().await.map_err(Error::Multipart)?;
        if !data.is_empty() {
            files.push(IncomingFile {
                kind,
                original_name: filename,
                data,
            });
        }
    }
    Ok(files)
}

/// Applicant orders the editing service, uploading source documents.
#[axum::debug_handler]
pub async fn create_editing_request(
    State(state): State<AppState>,
    Path(email): Path<String>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut service_type: Option<ServiceType> = None;
    let files = collect_files(
        &mut multipart,
        |kind| {
            matches!(
                kind,
                DocumentKind::Cv | DocumentKind::CoverLetter | DocumentKind::Documents
            )
        },
        &mut service_type,
    )
    .await?;
    let service_type =
        service_type.ok_or_else(|| Error::Validation("service_type is required".to_string()))?;

    let record = state
        .editing
        .create_request(&email, service_type, files)
        .await?;
    Ok((StatusCode::CREATED, Json(EditingView::from(record))).into_response())
}

#[axum::debug_handler]
pub async fn get_editing_request(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<EditingView>> {
    let record = state.editing.get(&email).await?;
    Ok(Json(EditingView::from(record)))
}

/// Applicant declares a payment; staff verify it separately.
#[axum::debug_handler]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<RecordPaymentRequest>,
) -> Result<Json<EditingView>> {
    payload.validate()?;
    let record = state
        .editing
        .record_payment(&email, payload.amount, payload.reference)
        .await?;
    Ok(Json(EditingView::from(record)))
}

#[axum::debug_handler]
pub async fn create_download_token(
    State(state): State<AppState>,
    Path(email): Path<String>,
    payload: Option<Json<DownloadTokenRequest>>,
) -> Result<Json<DownloadTokenResponse>> {
    let kind = match payload.and_then(|p| p.document.clone()) {
        Some(raw) => Some(raw.parse::<DocumentKind>()?),
        None => None,
    };
    let token = state.editing.create_download_token(&email, kind).await?;
    Ok(Json(DownloadTokenResponse {
        token,
        expires_in_minutes: state.download_tokens.ttl_minutes(),
    }))
}

/// Single-use, token-gated download of a finished deliverable.
#[axum::debug_handler]
pub async fn download_deliverable(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response> {
    let (grant, file) = state.editing.download(&token).await?;
    let disposition = format!("attachment; filename=\"{}\"", grant.original_name);
    let body = axum::body::Body::from_stream(tokio_util::io::ReaderStream::new(file));
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Staff deliver the edited documents.
#[axum::debug_handler]
pub async fn upload_edited_files(
    State(state): State<AppState>,
    Path(email): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<EditingView>> {
    let mut service_type = None;
    let files = collect_files(
        &mut multipart,
        |kind| matches!(kind, DocumentKind::EditedCv | DocumentKind::EditedCover),
        &mut service_type,
    )
    .await?;
    if files.is_empty() {
        return Err(Error::Validation("At least one file is required".to_string()));
    }
    let record = state.editing.upload_edited_files(&email, files).await?;
    Ok(Json(EditingView::from(record)))
}

#[axum::debug_handler]
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(email): Path<String>,
    claims: Option<Extension<Claims>>,
) -> Result<Json<EditingView>> {
    let verifier = claims
        .as_ref()
        .map(|c| c.sub.clone())
        .unwrap_or_else(|| "staff".to_string());
    let record = state.editing.verify_payment(&email, &verifier).await?;
    Ok(Json(EditingView::from(record)))
}
