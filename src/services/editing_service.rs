use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::engine::editing as engine;
use crate::error::{Error, Result};
use crate::models::application::{DocumentKind, FileRecord};
use crate::models::editing::{EditingRecord, EditingStatus, ServiceType};
use crate::services::download_service::{DownloadGrant, DownloadTokenStore};
use crate::services::file_service::{FileService, IncomingFile};
use crate::services::notification_service::NotificationService;
use crate::storage::RecordStore;
use crate::utils::locks::KeyedLocks;
use crate::utils::time::now;

/// Orchestrates the CV/cover-letter editing sub-flow: request, delivery,
/// payment verification and token-gated download.
#[derive(Clone)]
pub struct EditingService {
    store: Arc<dyn RecordStore<EditingRecord>>,
    files: FileService,
    tokens: Arc<DownloadTokenStore>,
    notifications: NotificationService,
    locks: Arc<KeyedLocks>,
}

impl EditingService {
    pub fn new(
        store: Arc<dyn RecordStore<EditingRecord>>,
        files: FileService,
        tokens: Arc<DownloadTokenStore>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            files,
            tokens,
            notifications,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    pub async fn get(&self, email: &str) -> Result<EditingRecord> {
        self.store
            .load(email)
            .await?
            .ok_or_else(|| Error::NotFound(format!("No editing request for {}", email)))
    }

    pub async fn create_request(
        &self,
        email: &str,
        service_type: ServiceType,
        source_files: Vec<IncomingFile>,
    ) -> Result<EditingRecord> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        if self.store.load(email).await?.is_some() {
            return Err(Error::Conflict(format!(
                "An editing request already exists for {}",
                email
            )));
        }

        let at = now();
        let mut stored = Vec::with_capacity(source_files.len());
        for file in source_files {
            let meta = self
                .files
                .store_document(email, file.kind, &file.original_name, file.data)
                .await?;
            stored.push(FileRecord {
                id: Uuid::new_v4(),
                original_name: meta.original_name,
                stored_path: meta.stored_path,
                size_bytes: meta.size_bytes,
                upload_number: 1,
                uploaded_at: at,
            });
        }

        let record = engine::new_editing_record(email, service_type, stored, at);
        self.store.save(email, &record).await?;
        Ok(record)
    }

    pub async fn upload_edited_files(
        &self,
        email: &str,
        files: Vec<IncomingFile>,
    ) -> Result<EditingRecord> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        let mut record = self.get(email).await?;
        let at = now();
        let mut delivered = Vec::with_capacity(files.len());
        for file in files {
            let meta = self
                .files
                .store_document(email, file.kind, &file.original_name, file.data)
                .await?;
            delivered.push((
                file.kind,
                FileRecord {
                    id: Uuid::new_v4(),
                    original_name: meta.original_name,
                    stored_path: meta.stored_path,
                    size_bytes: meta.size_bytes,
                    upload_number: 1,
                    uploaded_at: at,
                },
            ));
        }
        engine::upload_edited_files(&mut record, delivered, at)?;
        self.store.save(email, &record).await?;

        if record.status == EditingStatus::Completed {
            self.notifications
                .enqueue("editing_completed", json!({ "email": record.email }));
        }
        Ok(record)
    }

    pub async fn record_payment(
        &self,
        email: &str,
        amount: Decimal,
        reference: Option<String>,
    ) -> Result<EditingRecord> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        let mut record = self.get(email).await?;
        engine::record_payment(&mut record, amount, reference, now())?;
        self.store.save(email, &record).await?;
        Ok(record)
    }

    pub async fn verify_payment(&self, email: &str, verifier: &str) -> Result<EditingRecord> {
        let lock = self.locks.acquire(email);
        let _guard = lock.lock().await;

        let mut record = self.get(email).await?;
        engine::verify_payment(&mut record, verifier, now())?;
        self.store.save(email, &record).await?;

        self.notifications
            .enqueue("payment_verified", json!({ "email": record.email }));
        Ok(record)
    }

    /// Mints a one-time download token for a delivered file. Only possible
    /// after payment verification.
    pub async fn create_download_token(
        &self,
        email: &str,
        kind: Option<DocumentKind>,
    ) -> Result<String> {
        let record = self.get(email).await?;
        if record.status != EditingStatus::Paid {
            return Err(Error::Precondition(
                "Downloads are available after payment verification".to_string(),
            ));
        }

        let (kind, file) = match kind {
            Some(kind) => {
                let file = record.delivered_files.get(&kind).ok_or_else(|| {
                    Error::NotFound(format!("No delivered {} for {}", kind, email))
                })?;
                (kind, file)
            }
            None => {
                let mut iter = record.delivered_files.iter();
                match (iter.next(), iter.next()) {
                    (Some((kind, file)), None) => (*kind, file),
                    _ => {
                        return Err(Error::Validation(
                            "Specify which document to download".to_string(),
                        ))
                    }
                }
            }
        };

        Ok(self
            .tokens
            .issue(email, kind, &file.stored_path, &file.original_name))
    }

    /// Redeems a token and opens the deliverable for streaming. The token
    /// is consumed even when opening the file subsequently fails.
    pub async fn download(&self, token: &str) -> Result<(DownloadGrant, tokio::fs::File)> {
        let grant = self.tokens.redeem(token)?;
        let file = tokio::fs::File::open(&grant.stored_path).await?;
        Ok((grant, file))
    }
}
