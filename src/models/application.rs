use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Fixed vocabulary of document kinds accepted by the portal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    Passport,
    Photo,
    Cv,
    CoverLetter,
    Qualifications,
    Experience,
    Documents,
    JobOffer,
    Contract,
    #[serde(rename = "edited_cv")]
    EditedCv,
    #[serde(rename = "edited_cover")]
    EditedCover,
}

impl DocumentKind {
    /// Documents that must all be approved before the application can reach
    /// `documents-approved`.
    pub const REQUIRED: [DocumentKind; 4] = [
        DocumentKind::Passport,
        DocumentKind::Photo,
        DocumentKind::Cv,
        DocumentKind::Qualifications,
    ];

    /// Optional kinds that count towards approval only when uploaded.
    pub const OPTIONAL: [DocumentKind; 2] = [DocumentKind::CoverLetter, DocumentKind::Experience];

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    pub fn is_optional(&self) -> bool {
        Self::OPTIONAL.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Passport => "passport",
            DocumentKind::Photo => "photo",
            DocumentKind::Cv => "cv",
            DocumentKind::CoverLetter => "coverLetter",
            DocumentKind::Qualifications => "qualifications",
            DocumentKind::Experience => "experience",
            DocumentKind::Documents => "documents",
            DocumentKind::JobOffer => "jobOffer",
            DocumentKind::Contract => "contract",
            DocumentKind::EditedCv => "edited_cv",
            DocumentKind::EditedCover => "edited_cover",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "passport" => DocumentKind::Passport,
            "photo" => DocumentKind::Photo,
            "cv" => DocumentKind::Cv,
            "coverLetter" => DocumentKind::CoverLetter,
            "qualifications" => DocumentKind::Qualifications,
            "experience" => DocumentKind::Experience,
            "documents" => DocumentKind::Documents,
            "jobOffer" => DocumentKind::JobOffer,
            "contract" => DocumentKind::Contract,
            "edited_cv" => DocumentKind::EditedCv,
            "edited_cover" => DocumentKind::EditedCover,
            other => {
                return Err(crate::error::Error::Validation(format!(
                    "Unknown document kind: {}",
                    other
                )))
            }
        };
        Ok(kind)
    }
}

/// Overall status of an application. Exactly one value at a time; derived
/// from document review state after every review event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ApplicationStatus {
    #[serde(rename = "received")]
    Received,
    #[serde(rename = "review")]
    Review,
    #[serde(rename = "documents-approved")]
    DocumentsApproved,
    #[serde(rename = "changes-required")]
    ChangesRequired,
    #[serde(rename = "reupload-requested")]
    ReuploadRequested,
    #[serde(rename = "processed")]
    Processed,
    #[serde(rename = "editing_in_progress")]
    EditingInProgress,
    #[serde(rename = "editing_completed")]
    EditingCompleted,
    #[serde(rename = "editing_paid")]
    EditingPaid,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Received => "received",
            ApplicationStatus::Review => "review",
            ApplicationStatus::DocumentsApproved => "documents-approved",
            ApplicationStatus::ChangesRequired => "changes-required",
            ApplicationStatus::ReuploadRequested => "reupload-requested",
            ApplicationStatus::Processed => "processed",
            ApplicationStatus::EditingInProgress => "editing_in_progress",
            ApplicationStatus::EditingCompleted => "editing_completed",
            ApplicationStatus::EditingPaid => "editing_paid",
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "received" => ApplicationStatus::Received,
            "review" => ApplicationStatus::Review,
            "documents-approved" => ApplicationStatus::DocumentsApproved,
            "changes-required" => ApplicationStatus::ChangesRequired,
            "reupload-requested" => ApplicationStatus::ReuploadRequested,
            "processed" => ApplicationStatus::Processed,
            "editing_in_progress" => ApplicationStatus::EditingInProgress,
            "editing_completed" => ApplicationStatus::EditingCompleted,
            "editing_paid" => ApplicationStatus::EditingPaid,
            other => {
                return Err(crate::error::Error::Validation(format!(
                    "Unknown application status: {}",
                    other
                )))
            }
        };
        Ok(status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

/// A staff decision on a single document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for ReviewStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => ReviewStatus::Approved,
            ReviewDecision::Rejected => ReviewStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPreferences {
    pub position: String,
    pub country: Option<String>,
    pub note: Option<String>,
}

/// Metadata for one stored file. The engine records metadata only; bytes
/// live in the uploads directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub original_name: String,
    pub stored_path: String,
    pub size_bytes: u64,
    pub upload_number: i32,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReview {
    pub status: ReviewStatus,
    pub comments: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub rejection_count: i32,
}

impl Default for DocumentReview {
    fn default() -> Self {
        Self {
            status: ReviewStatus::Pending,
            comments: None,
            reviewed_at: None,
            reviewed_by: None,
            rejection_count: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReuploadStatus {
    Pending,
    Completed,
}

/// A staff prompt asking the applicant to resubmit specific rejected kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReuploadRequest {
    pub id: Uuid,
    pub documents: Vec<DocumentKind>,
    pub message: String,
    pub requested_at: DateTime<Utc>,
    pub status: ReuploadStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReuploadRequest {
    pub fn is_pending(&self) -> bool {
        self.status == ReuploadStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommentAuthor {
    System,
    Admin,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommentVisibility {
    System,
    Admin,
    Client,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub author_role: CommentAuthor,
    pub visibility: CommentVisibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentStatus {
    Pending,
    Uploaded,
    Reviewed,
}

/// Single-file staff attachment (job offer or contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub file: Option<FileRecord>,
    pub status: AttachmentStatus,
}

impl Default for Attachment {
    fn default() -> Self {
        Self {
            file: None,
            status: AttachmentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// A verified payment. Only verified payments are appended here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub amount: Decimal,
    pub reference: Option<String>,
    pub verified_at: DateTime<Utc>,
    pub verified_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadHistoryEntry {
    pub upload_number: i32,
    pub documents: Vec<DocumentKind>,
    pub uploaded_at: DateTime<Utc>,
}

/// The per-email aggregate holding personal info, uploaded documents,
/// reviews and status. One record per applicant email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub email: String,
    pub personal_info: PersonalInfo,
    pub job_preferences: JobPreferences,
    pub status: ApplicationStatus,
    pub upload_count: i32,
    pub document_slots: BTreeMap<DocumentKind, Vec<FileRecord>>,
    pub document_reviews: BTreeMap<DocumentKind, DocumentReview>,
    pub reupload_requests: Vec<ReuploadRequest>,
    pub comments: Vec<Comment>,
    pub upload_history: Vec<UploadHistoryEntry>,
    #[serde(default)]
    pub job_offer: Attachment,
    #[serde(default)]
    pub contract: Attachment,
    pub payments: Vec<PaymentRecord>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub const MAX_UPLOADS: i32 = 3;

    pub fn max_uploads_reached(&self) -> bool {
        self.upload_count >= Self::MAX_UPLOADS
    }

    /// Kinds whose latest review decision is `rejected`.
    pub fn rejected_kinds(&self) -> Vec<DocumentKind> {
        self.document_reviews
            .iter()
            .filter(|(_, review)| review.status == ReviewStatus::Rejected)
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn review_for(&self, kind: DocumentKind) -> Option<&DocumentReview> {
        self.document_reviews.get(&kind)
    }

    pub fn has_uploaded(&self, kind: DocumentKind) -> bool {
        self.document_slots
            .get(&kind)
            .map(|files| !files.is_empty())
            .unwrap_or(false)
    }
}
