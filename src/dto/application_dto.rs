use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::application::{
    ApplicationRecord, ApplicationStatus, AttachmentStatus, CommentAuthor, DocumentKind,
    DocumentReview, PaymentStatus, ReuploadRequest,
};

/// File metadata exposed to the applicant. Storage paths stay private.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileView {
    pub original_name: String,
    pub size_bytes: u64,
    pub upload_number: i32,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Client-facing projection of an application record. Comments are filtered
/// to admin-authored entries; system transition notes are suppressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientApplicationView {
    pub email: String,
    pub status: ApplicationStatus,
    pub upload_count: i32,
    pub max_uploads_reached: bool,
    pub documents: BTreeMap<DocumentKind, Vec<FileView>>,
    pub document_reviews: BTreeMap<DocumentKind, DocumentReview>,
    pub reupload_requests: Vec<ReuploadRequest>,
    pub comments: Vec<CommentView>,
    pub job_offer_status: AttachmentStatus,
    pub contract_status: AttachmentStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ApplicationRecord> for ClientApplicationView {
    fn from(record: ApplicationRecord) -> Self {
        let documents = record
            .document_slots
            .iter()
            .map(|(kind, files)| {
                (
                    *kind,
                    files
                        .iter()
                        .map(|f| FileView {
                            original_name: f.original_name.clone(),
                            size_bytes: f.size_bytes,
                            upload_number: f.upload_number,
                            uploaded_at: f.uploaded_at,
                        })
                        .collect(),
                )
            })
            .collect();
        let comments = record
            .comments
            .iter()
            .filter(|c| c.author_role == CommentAuthor::Admin)
            .map(|c| CommentView {
                text: c.text.clone(),
                timestamp: c.timestamp,
            })
            .collect();

        Self {
            max_uploads_reached: record.max_uploads_reached(),
            email: record.email,
            status: record.status,
            upload_count: record.upload_count,
            documents,
            document_reviews: record.document_reviews,
            reupload_requests: record.reupload_requests,
            comments,
            job_offer_status: record.job_offer.status,
            contract_status: record.contract.status,
            payment_status: record.payment_status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationStatusView {
    pub email: String,
    pub status: ApplicationStatus,
    pub upload_count: i32,
    pub max_uploads_reached: bool,
    pub pending_reuploads: Vec<ReuploadRequest>,
    pub updated_at: DateTime<Utc>,
}

impl From<ApplicationRecord> for ApplicationStatusView {
    fn from(record: ApplicationRecord) -> Self {
        Self {
            max_uploads_reached: record.max_uploads_reached(),
            pending_reuploads: record
                .reupload_requests
                .iter()
                .filter(|r| r.is_pending())
                .cloned()
                .collect(),
            email: record.email,
            status: record.status,
            upload_count: record.upload_count,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitUploadResponse {
    pub email: String,
    pub status: ApplicationStatus,
    pub upload_count: i32,
    pub max_uploads_reached: bool,
    pub message: String,
}
