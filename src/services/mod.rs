pub mod application_service;
pub mod download_service;
pub mod editing_service;
pub mod export_service;
pub mod file_service;
pub mod notification_service;
