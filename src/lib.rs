pub mod config;
pub mod dto;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use crate::models::application::ApplicationRecord;
use crate::models::editing::EditingRecord;
use crate::services::application_service::ApplicationService;
use crate::services::download_service::DownloadTokenStore;
use crate::services::editing_service::EditingService;
use crate::services::file_service::FileService;
use crate::services::notification_service::NotificationService;
use crate::storage::json_store::JsonDirStore;
use crate::storage::RecordStore;
use crate::utils::time::{Clock, SystemClock};

#[derive(Clone)]
pub struct AppState {
    pub applications: ApplicationService,
    pub editing: EditingService,
    pub notifications: NotificationService,
    pub download_tokens: Arc<DownloadTokenStore>,
}

/// Explicit wiring knobs so tests can run against temp directories and a
/// manual clock without touching process configuration.
pub struct AppOptions {
    pub data_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub webhook_url: Option<String>,
    pub webhook_secret: String,
    pub download_token_ttl_minutes: i64,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new() -> Self {
        let config = crate::config::get_config();
        Self::with_options(AppOptions {
            data_dir: config.data_dir.clone().into(),
            uploads_dir: config.uploads_dir.clone().into(),
            webhook_url: config.webhook_url.clone(),
            webhook_secret: config.webhook_secret.clone(),
            download_token_ttl_minutes: config.download_token_ttl_minutes,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_options(options: AppOptions) -> Self {
        let application_store: Arc<dyn RecordStore<ApplicationRecord>> =
            Arc::new(JsonDirStore::new(options.data_dir.join("applications")));
        let editing_store: Arc<dyn RecordStore<EditingRecord>> =
            Arc::new(JsonDirStore::new(options.data_dir.join("editing")));

        let files = FileService::new(options.uploads_dir);
        let notifications =
            NotificationService::new(options.webhook_url, options.webhook_secret);
        let download_tokens = Arc::new(DownloadTokenStore::new(
            options.download_token_ttl_minutes,
            options.clock,
        ));

        let applications = ApplicationService::new(
            application_store,
            files.clone(),
            notifications.clone(),
        );
        let editing = EditingService::new(
            editing_store,
            files,
            download_tokens.clone(),
            notifications.clone(),
        );

        Self {
            applications,
            editing,
            notifications,
            download_tokens,
        }
    }
}
