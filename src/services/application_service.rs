use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use crate::engine::status as engine;
use crate::engine::status::UploadSubmission;
use crate::error::{Error, Result};
use crate::models::application::{
    ApplicationRecord, ApplicationStatus, DocumentKind, FileRecord, JobPreferences, PersonalInfo,
    ReviewDecision,
};
use crate::services::file_service::{FileService, IncomingFile};
use crate::services::notification_service::NotificationService;
use crate::storage::RecordStore;
use crate::utils::locks::KeyedLocks;
use crate::utils::time::now;

/// Load → engine → save orchestration for application records. All
/// mutations of one email are serialized through a per-key lock; storage is
/// last-write-wins and the engine itself carries no concurrency guard.
#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn RecordStore<ApplicationRecord>>,
    files: FileService,
    notifications: NotificationService,
    locks: Arc<KeyedLocks>,
}

impl ApplicationService {
    pub fn new(
        store: Arc<dyn RecordStore<ApplicationRecord>>,
        files: FileService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            files,
            notifications,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    pub async fn get(&self, email: &str) -> Result<ApplicationRecord> {
        self.store
            .load(email)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No application for {}", email)))
    }

    pub async fn list(&self) -> Result<Vec<ApplicationRecord>> {
        let mut records = self.store.list().await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Creates the record on first upload or applies a re-submission.
    /// Returns the saved record and whether it was newly created.
    pub async fn submit_upload(
        &self,
        email: &str,
        personal_info: Option<PersonalInfo>,
        job_preferences: Option<JobPreferences>,
        files: Vec<IncomingFile>,
    ) -> Result<(ApplicationRecord, bool)> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        let existing = self.store.load(email).await?;
        let created = existing.is_none();

        // The upload cap is checked before any bytes land on disk so a
        // rejected submission leaves no stray files.
        if let Some(record) = &existing {
            if record.max_uploads_reached() {
                return Err(Error::LimitExceeded(format!(
                    "Maximum of {} uploads reached for {}",
                    ApplicationRecord::MAX_UPLOADS,
                    email
                )));
            }
        }

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            let meta = self
                .files
                .store_document(email, file.kind, &file.original_name, file.data)
                .await?;
            stored.push((file.kind, meta));
        }

        let record = engine::submit_upload(
            existing,
            email,
            UploadSubmission {
                personal_info,
                job_preferences,
                files: stored,
            },
            now(),
        )?;
        self.store.save(email, &record).await?;

        let event = if created {
            "application_received"
        } else {
            "documents_reuploaded"
        };
        self.notifications.enqueue(
            event,
            json!({
                "email": record.email,
                "upload_count": record.upload_count,
                "status": record.status.as_str(),
            }),
        );
        Ok((record, created))
    }

    pub async fn review_document(
        &self,
        email: &str,
        kind: DocumentKind,
        decision: ReviewDecision,
        comments: Option<String>,
        reviewer: &str,
    ) -> Result<ApplicationRecord> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        let mut record = self.get(email).await?;
        engine::review_document(&mut record, kind, decision, comments, reviewer, now())?;
        self.store.save(email, &record).await?;

        match record.status {
            ApplicationStatus::DocumentsApproved => self.notifications.enqueue(
                "documents_approved",
                json!({ "email": record.email }),
            ),
            ApplicationStatus::ChangesRequired => self.notifications.enqueue(
                "changes_requested",
                json!({
                    "email": record.email,
                    "rejected": record.rejected_kinds(),
                }),
            ),
            _ => {}
        }
        Ok(record)
    }

    pub async fn request_reupload(
        &self,
        email: &str,
        kinds: Vec<DocumentKind>,
        message: Option<String>,
    ) -> Result<ApplicationRecord> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        let mut record = self.get(email).await?;
        engine::request_reupload(&mut record, kinds.clone(), message, now())?;
        self.store.save(email, &record).await?;

        self.notifications.enqueue(
            "reupload_requested",
            json!({ "email": record.email, "documents": kinds }),
        );
        Ok(record)
    }

    pub async fn transition_status(
        &self,
        email: &str,
        new_status: &str,
        notes: Option<String>,
        author: &str,
    ) -> Result<ApplicationRecord> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        let mut record = self.get(email).await?;
        engine::transition_status(&mut record, new_status, notes, author, now())?;
        self.store.save(email, &record).await?;
        Ok(record)
    }

    pub async fn verify_payment(
        &self,
        email: &str,
        amount: Decimal,
        reference: Option<String>,
        verifier: &str,
    ) -> Result<ApplicationRecord> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        let mut record = self.get(email).await?;
        engine::verify_payment(&mut record, amount, reference, verifier, now());
        self.store.save(email, &record).await?;

        self.notifications.enqueue(
            "payment_verified",
            json!({ "email": record.email }),
        );
        Ok(record)
    }

    pub async fn attach_file(
        &self,
        email: &str,
        kind: DocumentKind,
        original_name: &str,
        data: bytes::Bytes,
    ) -> Result<ApplicationRecord> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        let mut record = self.get(email).await?;
        let meta = self
            .files
            .store_document(email, kind, original_name, data)
            .await?;
        let at = now();
        let upload_number = record.upload_count;
        engine::attach_file(
            &mut record,
            kind,
            FileRecord {
                id: uuid::Uuid::new_v4(),
                original_name: meta.original_name,
                stored_path: meta.stored_path,
                size_bytes: meta.size_bytes,
                upload_number,
                uploaded_at: at,
            },
            at,
        )?;
        self.store.save(email, &record).await?;
        Ok(record)
    }

    pub async fn acknowledge_attachment(
        &self,
        email: &str,
        kind: DocumentKind,
    ) -> Result<ApplicationRecord> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        let mut record = self.get(email).await?;
        engine::acknowledge_attachment(&mut record, kind, now())?;
        self.store.save(email, &record).await?;
        Ok(record)
    }

    /// Explicit admin delete: removes the record and the applicant's stored
    /// files. Never triggered by a status transition.
    pub async fn delete(&self, email: &str) -> Result<()> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        if !self.store.remove(email).await? {
            return Err(Error::NotFound(format!("No application for {}", email)));
        }
        self.files.remove_all_for(email).await?;
        Ok(())
    }
}
