use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::NaiveDate;

use crate::dto::application_dto::{
    ApplicationStatusView, ClientApplicationView, SubmitUploadResponse,
};
use crate::error::{Error, Result};
use crate::models::application::{DocumentKind, JobPreferences, PersonalInfo};
use crate::services::file_service::IncomingFile;
use crate::AppState;

fn is_application_kind(kind: DocumentKind) -> bool {
    matches!(
        kind,
        DocumentKind::Passport
            | DocumentKind::Photo
            | DocumentKind::Cv
            | DocumentKind::CoverLetter
            | DocumentKind::Qualifications
            | DocumentKind::Experience
            | DocumentKind::Documents
    )
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Multipart submission: text fields carry personal info and job
/// preferences, file fields are named by document kind. Creates the
/// application on first contact, re-submits afterwards.
#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut email: Option<String> = None;
    let mut full_name: Option<String> = None;
    let mut phone: Option<String> = None;
    let mut date_of_birth: Option<NaiveDate> = None;
    let mut nationality: Option<String> = None;
    let mut address: Option<String> = None;
    let mut position: Option<String> = None;
    let mut country: Option<String> = None;
    let mut note: Option<String> = None;
    let mut files: Vec<IncomingFile> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(Error::Multipart)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "email" => email = non_empty(field.text().await.map_err(Error::Multipart)?),
            "full_name" => full_name = non_empty(field.text().await.map_err(Error::Multipart)?),
            "phone" => phone = non_empty(field.text().await.map_err(Error::Multipart)?),
            "date_of_birth" => {
                if let Some(raw) = non_empty(field.text().await.map_err(Error::Multipart)?) {
                    let parsed = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                        Error::Validation(format!("Invalid date_of_birth: {}", raw))
                    })?;
                    date_of_birth = Some(parsed);
                }
            }
            "nationality" => nationality = non_empty(field.text().await.map_err(Error::Multipart)?),
            "address" => address = non_empty(field.text().await.map_err(Error::Multipart)?),
            "position" => position = non_empty(field.text().await.map_err(Error::Multipart)?),
            "country" => country = non_empty(field.text().await.map_err(Error::Multipart)?),
            "note" => note = non_empty(field.text().await.map_err(Error::Multipart)?),
            other => {
                let kind: DocumentKind = other.parse()?;
                if !is_application_kind(kind) {
                    return Err(Error::Validation(format!(
                        "{} cannot be uploaded with an application",
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
        }
    }

    let email = email.ok_or_else(|| Error::Validation("Email is required".to_string()))?;

    let personal_info = if full_name.is_some() || phone.is_some() {
        Some(PersonalInfo {
            full_name: full_name.unwrap_or_default(),
            email: email.clone(),
            phone: phone.unwrap_or_default(),
            date_of_birth,
            nationality,
            address,
        })
    } else {
        None
    };
    let job_preferences = position.map(|position| JobPreferences {
        position,
        country,
        note,
    });

    let (record, created) = state
        .applications
        .submit_upload(&email, personal_info, job_preferences, files)
        .await?;

    let status_code = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let body = SubmitUploadResponse {
        email: record.email.clone(),
        status: record.status,
        upload_count: record.upload_count,
        max_uploads_reached: record.max_uploads_reached(),
        message: if created {
            "Application received".to_string()
        } else {
            "Documents re-submitted, review restarts".to_string()
        },
    };
    Ok((status_code, Json(body)).into_response())
}

#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ClientApplicationView>> {
    let record = state.applications.get(&email).await?;
    Ok(Json(ClientApplicationView::from(record)))
}

#[axum::debug_handler]
pub async fn get_application_status(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ApplicationStatusView>> {
    let record = state.applications.get(&email).await?;
    Ok(Json(ApplicationStatusView::from(record)))
}

/// Applicant confirms receipt of a delivered job offer or contract.
#[axum::debug_handler]
pub async fn acknowledge_attachment(
    State(state): State<AppState>,
    Path((email, kind)): Path<(String, String)>,
) -> Result<Json<ClientApplicationView>> {
    let kind: DocumentKind = kind.parse()?;
    let record = state
        .applications
        .acknowledge_attachment(&email, kind)
        .await?;
    Ok(Json(ClientApplicationView::from(record)))
}
