use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::application::{DocumentKind, PaymentStatus};
use crate::models::editing::{EditingRecord, EditingStatus, ServiceType, TransactionStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionView {
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub submitted_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditingView {
    pub email: String,
    pub service_type: ServiceType,
    pub status: EditingStatus,
    pub payment_status: PaymentStatus,
    pub delivered_documents: Vec<DocumentKind>,
    pub transactions: Vec<TransactionView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EditingRecord> for EditingView {
    fn from(record: EditingRecord) -> Self {
        Self {
            delivered_documents: record.delivered_files.keys().copied().collect(),
            transactions: record
                .transactions
                .iter()
                .map(|tx| TransactionView {
                    amount: tx.amount,
                    status: tx.status,
                    submitted_at: tx.submitted_at,
                    verified_at: tx.verified_at,
                })
                .collect(),
            email: record.email,
            service_type: record.service_type,
            status: record.status,
            payment_status: record.payment_status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadTokenRequest {
    pub document: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadTokenResponse {
    pub token: String,
    pub expires_in_minutes: i64,
}
