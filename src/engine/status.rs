use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::{
    ApplicationRecord, ApplicationStatus, Attachment, AttachmentStatus, Comment, CommentAuthor,
    CommentVisibility, DocumentKind, DocumentReview, FileRecord, JobPreferences, PaymentRecord,
    PaymentStatus, PersonalInfo, ReuploadRequest, ReuploadStatus, ReviewDecision, ReviewStatus,
    UploadHistoryEntry,
};

/// File metadata handed over by the upload-handling layer. The engine never
/// reads file bytes.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub original_name: String,
    pub stored_path: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct UploadSubmission {
    pub personal_info: Option<PersonalInfo>,
    pub job_preferences: Option<JobPreferences>,
    pub files: Vec<(DocumentKind, StoredFile)>,
}

/// Creates a record on first upload or applies a re-submission to an
/// existing one. Re-uploads always restart review: status goes back to
/// `received` unconditionally.
pub fn submit_upload(
    existing: Option<ApplicationRecord>,
    email: &str,
    submission: UploadSubmission,
    now: DateTime<Utc>,
) -> Result<ApplicationRecord> {
    match existing {
        None => create_application(email, submission, now),
        Some(mut record) => {
            if record.max_uploads_reached() {
                return Err(Error::LimitExceeded(format!(
                    "Maximum of {} uploads reached for {}",
                    ApplicationRecord::MAX_UPLOADS,
                    email
                )));
            }

            record.upload_count += 1;
            let upload_number = record.upload_count;
            let kinds = append_files(&mut record, submission.files, upload_number, now);

            if let Some(preferences) = submission.job_preferences {
                record.job_preferences = preferences;
            }

            record.status = ApplicationStatus::Received;
            record.upload_history.push(UploadHistoryEntry {
                upload_number,
                documents: kinds,
                uploaded_at: now,
            });
            push_system_comment(
                &mut record,
                format!("Documents re-uploaded (upload #{})", upload_number),
                now,
            );
            record.updated_at = now;
            Ok(record)
        }
    }
}

fn create_application(
    email: &str,
    submission: UploadSubmission,
    now: DateTime<Utc>,
) -> Result<ApplicationRecord> {
    let personal_info = submission
        .personal_info
        .ok_or_else(|| Error::Validation("Personal information is required".to_string()))?;
    if personal_info.full_name.trim().is_empty()
        || personal_info.email.trim().is_empty()
        || personal_info.phone.trim().is_empty()
    {
        return Err(Error::Validation(
            "Full name, email and phone are required".to_string(),
        ));
    }
    let job_preferences = submission
        .job_preferences
        .ok_or_else(|| Error::Validation("Job preferences are required".to_string()))?;
    if job_preferences.position.trim().is_empty() {
        return Err(Error::Validation("Desired position is required".to_string()));
    }

    let mut record = ApplicationRecord {
        email: email.to_string(),
        personal_info,
        job_preferences,
        status: ApplicationStatus::Received,
        upload_count: 1,
        document_slots: Default::default(),
        document_reviews: Default::default(),
        reupload_requests: Vec::new(),
        comments: Vec::new(),
        upload_history: Vec::new(),
        job_offer: Attachment::default(),
        contract: Attachment::default(),
        payments: Vec::new(),
        payment_status: PaymentStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    let kinds = append_files(&mut record, submission.files, 1, now);
    record.upload_history.push(UploadHistoryEntry {
        upload_number: 1,
        documents: kinds,
        uploaded_at: now,
    });
    push_system_comment(&mut record, "Application received".to_string(), now);
    Ok(record)
}

fn append_files(
    record: &mut ApplicationRecord,
    files: Vec<(DocumentKind, StoredFile)>,
    upload_number: i32,
    now: DateTime<Utc>,
) -> Vec<DocumentKind> {
    let mut kinds: Vec<DocumentKind> = Vec::new();
    for (kind, file) in files {
        record
            .document_slots
            .entry(kind)
            .or_default()
            .push(FileRecord {
                id: Uuid::new_v4(),
                original_name: file.original_name,
                stored_path: file.stored_path,
                size_bytes: file.size_bytes,
                upload_number,
                uploaded_at: now,
            });
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds.sort();
    kinds
}

/// Records a staff decision on one document kind and recomputes the overall
/// status. Rejections bump the per-kind rejection counter, which never
/// resets.
pub fn review_document(
    record: &mut ApplicationRecord,
    kind: DocumentKind,
    decision: ReviewDecision,
    comments: Option<String>,
    reviewer: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let previous = record
        .document_reviews
        .get(&kind)
        .cloned()
        .unwrap_or_default();
    let rejection_count = previous.rejection_count
        + if decision == ReviewDecision::Rejected {
            1
        } else {
            0
        };

    record.document_reviews.insert(
        kind,
        DocumentReview {
            status: decision.into(),
            comments: comments.clone(),
            reviewed_at: Some(now),
            reviewed_by: Some(reviewer.to_string()),
            rejection_count,
        },
    );

    match decision {
        ReviewDecision::Rejected => {
            push_system_comment(
                record,
                format!("{} rejected by {} (rejection #{})", kind, reviewer, rejection_count),
                now,
            );
            ensure_reupload_request(record, comments, now);
        }
        ReviewDecision::Approved => {
            push_system_comment(record, format!("{} approved by {}", kind, reviewer), now);
        }
    }

    prune_reupload_requests(record, now);
    derive_overall_status(record, now);
    record.updated_at = now;
    Ok(())
}

/// Creates a pending re-upload request targeting the exact current set of
/// rejected kinds, unless one already pends for that set.
fn ensure_reupload_request(
    record: &mut ApplicationRecord,
    message: Option<String>,
    now: DateTime<Utc>,
) {
    let rejected = record.rejected_kinds();
    if rejected.is_empty() {
        return;
    }
    if pending_request_for(record, &rejected).is_some() {
        return;
    }
    record.reupload_requests.push(ReuploadRequest {
        id: Uuid::new_v4(),
        documents: rejected,
        message: message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Please re-upload the rejected documents".to_string()),
        requested_at: now,
        status: ReuploadStatus::Pending,
        completed_at: None,
    });
}

fn pending_request_for<'a>(
    record: &'a ApplicationRecord,
    kinds: &[DocumentKind],
) -> Option<&'a ReuploadRequest> {
    record
        .reupload_requests
        .iter()
        .find(|req| req.is_pending() && req.documents == kinds)
}

/// Pending requests whose document set no longer intersects the current
/// rejected set are marked completed, never deleted.
fn prune_reupload_requests(record: &mut ApplicationRecord, now: DateTime<Utc>) {
    let rejected = record.rejected_kinds();
    for request in record.reupload_requests.iter_mut() {
        if request.is_pending() && !request.documents.iter().any(|k| rejected.contains(k)) {
            request.status = ReuploadStatus::Completed;
            request.completed_at = Some(now);
        }
    }
}

fn complete_pending_requests(record: &mut ApplicationRecord, now: DateTime<Utc>) {
    for request in record.reupload_requests.iter_mut() {
        if request.is_pending() {
            request.status = ReuploadStatus::Completed;
            request.completed_at = Some(now);
        }
    }
}

fn is_approved(record: &ApplicationRecord, kind: DocumentKind) -> bool {
    record
        .review_for(kind)
        .map(|review| review.status == ReviewStatus::Approved)
        .unwrap_or(false)
}

/// Overall-status derivation, applied after every review event.
pub fn derive_overall_status(record: &mut ApplicationRecord, now: DateTime<Utc>) {
    if !record.rejected_kinds().is_empty() {
        record.status = ApplicationStatus::ChangesRequired;
        return;
    }

    let required_approved = DocumentKind::REQUIRED
        .iter()
        .all(|kind| is_approved(record, *kind));
    let optional_approved = DocumentKind::OPTIONAL
        .iter()
        .all(|kind| !record.has_uploaded(*kind) || is_approved(record, *kind));

    if required_approved && optional_approved {
        record.status = ApplicationStatus::DocumentsApproved;
        complete_pending_requests(record, now);
    } else if record.status != ApplicationStatus::ChangesRequired {
        // Never silently clear a tracked changes-required state.
        record.status = ApplicationStatus::Review;
    }
}

/// Staff ask the applicant to resubmit specific rejected kinds. Returns
/// whether a new request was appended (duplicates of a pending set are
/// not re-added).
pub fn request_reupload(
    record: &mut ApplicationRecord,
    kinds: Vec<DocumentKind>,
    message: Option<String>,
    now: DateTime<Utc>,
) -> Result<bool> {
    let rejected = record.rejected_kinds();
    if !kinds.iter().any(|kind| rejected.contains(kind)) {
        return Err(Error::InvalidRequest(
            "None of the requested documents are currently rejected".to_string(),
        ));
    }

    let mut documents = kinds;
    documents.sort();
    documents.dedup();

    let created = if pending_request_for(record, &documents).is_none() {
        record.reupload_requests.push(ReuploadRequest {
            id: Uuid::new_v4(),
            documents,
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Please re-upload the rejected documents".to_string()),
            requested_at: now,
            status: ReuploadStatus::Pending,
            completed_at: None,
        });
        true
    } else {
        false
    };

    record.status = ApplicationStatus::ReuploadRequested;
    record.updated_at = now;
    Ok(created)
}

/// Explicit staff status transition. `documents-approved` is guarded by the
/// required-document approvals.
pub fn transition_status(
    record: &mut ApplicationRecord,
    new_status: &str,
    notes: Option<String>,
    author: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let status: ApplicationStatus = new_status.parse()?;

    if status == ApplicationStatus::DocumentsApproved {
        let required_approved = DocumentKind::REQUIRED
            .iter()
            .all(|kind| is_approved(record, *kind));
        if !required_approved {
            return Err(Error::Precondition(
                "All required documents must be approved first".to_string(),
            ));
        }
        complete_pending_requests(record, now);
    }

    record.status = status;
    if let Some(text) = notes.filter(|n| !n.trim().is_empty()) {
        record.comments.push(Comment {
            text,
            timestamp: now,
            author_role: CommentAuthor::Admin,
            visibility: CommentVisibility::Client,
        });
    }
    push_system_comment(
        record,
        format!("Status changed to {} by {}", status.as_str(), author),
        now,
    );
    record.updated_at = now;
    Ok(())
}

/// Appends a verified payment. Only verified payments are recorded.
pub fn verify_payment(
    record: &mut ApplicationRecord,
    amount: rust_decimal::Decimal,
    reference: Option<String>,
    verifier: &str,
    now: DateTime<Utc>,
) {
    record.payments.push(PaymentRecord {
        id: Uuid::new_v4(),
        amount,
        reference,
        verified_at: now,
        verified_by: verifier.to_string(),
    });
    record.payment_status = PaymentStatus::Paid;
    record.updated_at = now;
}

/// Staff upload of a job offer or contract.
pub fn attach_file(
    record: &mut ApplicationRecord,
    kind: DocumentKind,
    file: FileRecord,
    now: DateTime<Utc>,
) -> Result<()> {
    let attachment = attachment_mut(record, kind)?;
    attachment.file = Some(file);
    attachment.status = AttachmentStatus::Uploaded;
    record.updated_at = now;
    Ok(())
}

/// Applicant confirms having reviewed a delivered job offer or contract.
pub fn acknowledge_attachment(
    record: &mut ApplicationRecord,
    kind: DocumentKind,
    now: DateTime<Utc>,
) -> Result<()> {
    let attachment = attachment_mut(record, kind)?;
    if attachment.file.is_none() {
        return Err(Error::InvalidRequest(format!(
            "No {} has been uploaded yet",
            kind
        )));
    }
    attachment.status = AttachmentStatus::Reviewed;
    record.updated_at = now;
    Ok(())
}

fn attachment_mut(
    record: &mut ApplicationRecord,
    kind: DocumentKind,
) -> Result<&mut Attachment> {
    match kind {
        DocumentKind::JobOffer => Ok(&mut record.job_offer),
        DocumentKind::Contract => Ok(&mut record.contract),
        other => Err(Error::Validation(format!(
            "{} is not an attachment kind",
            other
        ))),
    }
}

fn push_system_comment(record: &mut ApplicationRecord, text: String, now: DateTime<Utc>) {
    record.comments.push(Comment {
        text,
        timestamp: now,
        author_role: CommentAuthor::System,
        visibility: CommentVisibility::System,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn stored(name: &str) -> StoredFile {
        StoredFile {
            original_name: name.to_string(),
            stored_path: format!("uploads/test/{}", name),
            size_bytes: 1024,
        }
    }

    fn personal() -> PersonalInfo {
        PersonalInfo {
            full_name: "Alice Doe".to_string(),
            email: "alice@example.com".to_string(),
            phone: "+10000000".to_string(),
            date_of_birth: None,
            nationality: None,
            address: None,
        }
    }

    fn preferences() -> JobPreferences {
        JobPreferences {
            position: "Nurse".to_string(),
            country: Some("DE".to_string()),
            note: None,
        }
    }

    fn new_application_with_required_docs() -> ApplicationRecord {
        submit_upload(
            None,
            "alice@example.com",
            UploadSubmission {
                personal_info: Some(personal()),
                job_preferences: Some(preferences()),
                files: vec![
                    (DocumentKind::Passport, stored("passport.pdf")),
                    (DocumentKind::Photo, stored("photo.jpg")),
                    (DocumentKind::Cv, stored("cv.pdf")),
                    (DocumentKind::Qualifications, stored("diploma.pdf")),
                ],
            },
            ts(0),
        )
        .unwrap()
    }

    fn approve_all_required(record: &mut ApplicationRecord, at: DateTime<Utc>) {
        for kind in DocumentKind::REQUIRED {
            review_document(record, kind, ReviewDecision::Approved, None, "staff", at).unwrap();
        }
    }

    #[test]
    fn creates_record_on_first_upload() {
        let record = new_application_with_required_docs();
        assert_eq!(record.status, ApplicationStatus::Received);
        assert_eq!(record.upload_count, 1);
        assert!(!record.max_uploads_reached());
        assert_eq!(record.document_slots[&DocumentKind::Passport].len(), 1);
        assert_eq!(record.upload_history.len(), 1);
        assert_eq!(record.upload_history[0].upload_number, 1);
    }

    #[test]
    fn creation_requires_personal_info_and_job_preferences() {
        let missing_personal = submit_upload(
            None,
            "bob@example.com",
            UploadSubmission {
                personal_info: None,
                job_preferences: Some(preferences()),
                files: vec![],
            },
            ts(0),
        );
        assert!(matches!(missing_personal, Err(Error::Validation(_))));

        let missing_position = submit_upload(
            None,
            "bob@example.com",
            UploadSubmission {
                personal_info: Some(personal()),
                job_preferences: Some(JobPreferences {
                    position: "  ".to_string(),
                    country: None,
                    note: None,
                }),
                files: vec![],
            },
            ts(0),
        );
        assert!(matches!(missing_position, Err(Error::Validation(_))));
    }

    #[test]
    fn rejecting_one_required_document_opens_exactly_one_request() {
        let mut record = new_application_with_required_docs();
        review_document(
            &mut record,
            DocumentKind::Cv,
            ReviewDecision::Rejected,
            Some("blurry".to_string()),
            "staff",
            ts(10),
        )
        .unwrap();

        assert_eq!(record.status, ApplicationStatus::ChangesRequired);
        let pending: Vec<_> = record
            .reupload_requests
            .iter()
            .filter(|r| r.is_pending())
            .collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].documents, vec![DocumentKind::Cv]);
        assert_eq!(pending[0].message, "blurry");
        assert_eq!(
            record.document_reviews[&DocumentKind::Cv].rejection_count,
            1
        );
    }

    #[test]
    fn repeated_rejection_does_not_duplicate_pending_request() {
        let mut record = new_application_with_required_docs();
        for i in 0..2 {
            review_document(
                &mut record,
                DocumentKind::Cv,
                ReviewDecision::Rejected,
                None,
                "staff",
                ts(10 + i),
            )
            .unwrap();
        }
        let pending = record
            .reupload_requests
            .iter()
            .filter(|r| r.is_pending())
            .count();
        assert_eq!(pending, 1);
        assert_eq!(
            record.document_reviews[&DocumentKind::Cv].rejection_count,
            2
        );
    }

    #[test]
    fn approving_everything_yields_documents_approved_and_completes_requests() {
        let mut record = new_application_with_required_docs();
        review_document(
            &mut record,
            DocumentKind::Cv,
            ReviewDecision::Rejected,
            None,
            "staff",
            ts(10),
        )
        .unwrap();
        approve_all_required(&mut record, ts(20));

        assert_eq!(record.status, ApplicationStatus::DocumentsApproved);
        assert!(record.reupload_requests.iter().all(|r| !r.is_pending()));
        assert!(record
            .reupload_requests
            .iter()
            .all(|r| r.completed_at.is_some()));
    }

    #[test]
    fn uploaded_optional_document_gates_approval() {
        let mut record = submit_upload(
            None,
            "alice@example.com",
            UploadSubmission {
                personal_info: Some(personal()),
                job_preferences: Some(preferences()),
                files: vec![
                    (DocumentKind::Passport, stored("passport.pdf")),
                    (DocumentKind::Photo, stored("photo.jpg")),
                    (DocumentKind::Cv, stored("cv.pdf")),
                    (DocumentKind::Qualifications, stored("diploma.pdf")),
                    (DocumentKind::CoverLetter, stored("letter.pdf")),
                ],
            },
            ts(0),
        )
        .unwrap();

        approve_all_required(&mut record, ts(10));
        // Cover letter uploaded but not yet approved: still in review.
        assert_eq!(record.status, ApplicationStatus::Review);

        review_document(
            &mut record,
            DocumentKind::CoverLetter,
            ReviewDecision::Approved,
            None,
            "staff",
            ts(20),
        )
        .unwrap();
        assert_eq!(record.status, ApplicationStatus::DocumentsApproved);
    }

    #[test]
    fn upload_cap_rejects_fourth_submission_unmodified() {
        let mut record = new_application_with_required_docs();
        for i in 0..2 {
            record = submit_upload(
                Some(record),
                "alice@example.com",
                UploadSubmission {
                    files: vec![(DocumentKind::Cv, stored("cv2.pdf"))],
                    ..Default::default()
                },
                ts(100 + i),
            )
            .unwrap();
        }
        assert_eq!(record.upload_count, 3);
        assert!(record.max_uploads_reached());

        let before = serde_json::to_value(&record).unwrap();
        let err = submit_upload(
            Some(record.clone()),
            "alice@example.com",
            UploadSubmission {
                files: vec![(DocumentKind::Cv, stored("cv3.pdf"))],
                ..Default::default()
            },
            ts(200),
        )
        .unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
        assert_eq!(serde_json::to_value(&record).unwrap(), before);
    }

    #[test]
    fn reupload_always_resets_status_to_received() {
        let mut record = new_application_with_required_docs();
        review_document(
            &mut record,
            DocumentKind::Cv,
            ReviewDecision::Rejected,
            None,
            "staff",
            ts(10),
        )
        .unwrap();
        assert_eq!(record.status, ApplicationStatus::ChangesRequired);

        let record = submit_upload(
            Some(record),
            "alice@example.com",
            UploadSubmission {
                files: vec![(DocumentKind::Cv, stored("cv2.pdf"))],
                ..Default::default()
            },
            ts(20),
        )
        .unwrap();
        assert_eq!(record.status, ApplicationStatus::Received);
        assert_eq!(record.upload_count, 2);
        // Files are additive: both CV files are kept.
        assert_eq!(record.document_slots[&DocumentKind::Cv].len(), 2);
    }

    #[test]
    fn reupload_request_for_non_rejected_document_fails() {
        let mut record = new_application_with_required_docs();
        review_document(
            &mut record,
            DocumentKind::Photo,
            ReviewDecision::Approved,
            None,
            "staff",
            ts(10),
        )
        .unwrap();

        let err = request_reupload(
            &mut record,
            vec![DocumentKind::Photo],
            None,
            ts(20),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn explicit_reupload_request_sets_status_and_dedups() {
        let mut record = new_application_with_required_docs();
        review_document(
            &mut record,
            DocumentKind::Passport,
            ReviewDecision::Rejected,
            None,
            "staff",
            ts(10),
        )
        .unwrap();

        // The rejection already opened a request for {passport}; an explicit
        // request for the same set must not duplicate it.
        let created = request_reupload(
            &mut record,
            vec![DocumentKind::Passport],
            Some("send a readable scan".to_string()),
            ts(20),
        )
        .unwrap();
        assert!(!created);
        assert_eq!(record.status, ApplicationStatus::ReuploadRequested);
        assert_eq!(
            record
                .reupload_requests
                .iter()
                .filter(|r| r.is_pending())
                .count(),
            1
        );
    }

    #[test]
    fn rejection_count_is_monotone_across_review_sequences() {
        let mut record = new_application_with_required_docs();
        let events = [
            ReviewDecision::Rejected,
            ReviewDecision::Approved,
            ReviewDecision::Rejected,
            ReviewDecision::Approved,
        ];
        let mut last = 0;
        for (i, decision) in events.iter().enumerate() {
            review_document(
                &mut record,
                DocumentKind::Passport,
                *decision,
                None,
                "staff",
                ts(10 + i as i64),
            )
            .unwrap();
            let count = record.document_reviews[&DocumentKind::Passport].rejection_count;
            assert!(count >= last);
            last = count;
        }
        assert_eq!(last, 2);
    }

    #[test]
    fn stale_requests_are_completed_when_rejected_set_moves_on() {
        let mut record = new_application_with_required_docs();
        review_document(
            &mut record,
            DocumentKind::Passport,
            ReviewDecision::Rejected,
            None,
            "staff",
            ts(10),
        )
        .unwrap();
        review_document(
            &mut record,
            DocumentKind::Passport,
            ReviewDecision::Approved,
            None,
            "staff",
            ts(20),
        )
        .unwrap();
        review_document(
            &mut record,
            DocumentKind::Photo,
            ReviewDecision::Rejected,
            None,
            "staff",
            ts(30),
        )
        .unwrap();

        let passport_request = record
            .reupload_requests
            .iter()
            .find(|r| r.documents == vec![DocumentKind::Passport])
            .unwrap();
        assert_eq!(passport_request.status, ReuploadStatus::Completed);

        let photo_request = record
            .reupload_requests
            .iter()
            .find(|r| r.documents == vec![DocumentKind::Photo])
            .unwrap();
        assert!(photo_request.is_pending());
        assert_eq!(record.status, ApplicationStatus::ChangesRequired);
    }

    #[test]
    fn transition_to_documents_approved_requires_approvals() {
        let mut record = new_application_with_required_docs();
        let err = transition_status(&mut record, "documents-approved", None, "staff", ts(10))
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));

        approve_all_required(&mut record, ts(20));
        transition_status(&mut record, "processed", Some("forwarded".to_string()), "staff", ts(30))
            .unwrap();
        assert_eq!(record.status, ApplicationStatus::Processed);
    }

    #[test]
    fn transition_rejects_unknown_status() {
        let mut record = new_application_with_required_docs();
        let err =
            transition_status(&mut record, "archived", None, "staff", ts(10)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn full_alice_scenario() {
        // New application with required docs.
        let mut record = new_application_with_required_docs();
        assert_eq!(record.status, ApplicationStatus::Received);
        assert_eq!(record.upload_count, 1);

        // Reject the CV with a comment.
        review_document(
            &mut record,
            DocumentKind::Cv,
            ReviewDecision::Rejected,
            Some("blurry".to_string()),
            "staff",
            ts(10),
        )
        .unwrap();
        assert_eq!(record.status, ApplicationStatus::ChangesRequired);
        assert_eq!(record.reupload_requests.len(), 1);
        assert!(record.reupload_requests[0].is_pending());
        assert_eq!(record.reupload_requests[0].documents, vec![DocumentKind::Cv]);
        assert_eq!(record.document_reviews[&DocumentKind::Cv].rejection_count, 1);

        // Re-upload the CV.
        let mut record = submit_upload(
            Some(record),
            "alice@example.com",
            UploadSubmission {
                files: vec![(DocumentKind::Cv, stored("cv-fixed.pdf"))],
                ..Default::default()
            },
            ts(20),
        )
        .unwrap();
        assert_eq!(record.status, ApplicationStatus::Received);
        assert_eq!(record.upload_count, 2);
        assert_eq!(record.document_reviews[&DocumentKind::Cv].rejection_count, 1);

        // Approve all four required documents.
        approve_all_required(&mut record, ts(30));
        assert_eq!(record.status, ApplicationStatus::DocumentsApproved);
        assert!(record.reupload_requests.iter().all(|r| !r.is_pending()));
    }

    #[test]
    fn verified_payment_flips_payment_status() {
        let mut record = new_application_with_required_docs();
        assert_eq!(record.payment_status, PaymentStatus::Pending);
        verify_payment(
            &mut record,
            rust_decimal::Decimal::new(15000, 2),
            Some("TX-1".to_string()),
            "staff",
            ts(10),
        );
        assert_eq!(record.payment_status, PaymentStatus::Paid);
        assert_eq!(record.payments.len(), 1);
    }

    #[test]
    fn attachments_move_through_their_own_statuses() {
        let mut record = new_application_with_required_docs();
        assert_eq!(record.job_offer.status, AttachmentStatus::Pending);

        let err = acknowledge_attachment(&mut record, DocumentKind::JobOffer, ts(5)).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));

        attach_file(
            &mut record,
            DocumentKind::JobOffer,
            FileRecord {
                id: Uuid::new_v4(),
                original_name: "offer.pdf".to_string(),
                stored_path: "uploads/test/offer.pdf".to_string(),
                size_bytes: 2048,
                upload_number: 1,
                uploaded_at: ts(10),
            },
            ts(10),
        )
        .unwrap();
        assert_eq!(record.job_offer.status, AttachmentStatus::Uploaded);

        acknowledge_attachment(&mut record, DocumentKind::JobOffer, ts(20)).unwrap();
        assert_eq!(record.job_offer.status, AttachmentStatus::Reviewed);

        let err = attach_file(
            &mut record,
            DocumentKind::Cv,
            FileRecord {
                id: Uuid::new_v4(),
                original_name: "x.pdf".to_string(),
                stored_path: "uploads/test/x.pdf".to_string(),
                size_bytes: 1,
                upload_number: 1,
                uploaded_at: ts(30),
            },
            ts(30),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
