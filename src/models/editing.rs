use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use super::application::{DocumentKind, FileRecord, PaymentStatus};

/// Which deliverables the applicant ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Cv,
    Cover,
    Both,
}

impl ServiceType {
    pub fn required_deliverables(&self) -> &'static [DocumentKind] {
        match self {
            ServiceType::Cv => &[DocumentKind::EditedCv],
            ServiceType::Cover => &[DocumentKind::EditedCover],
            ServiceType::Both => &[DocumentKind::EditedCv, DocumentKind::EditedCover],
        }
    }
}

impl std::str::FromStr for ServiceType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cv" => Ok(ServiceType::Cv),
            "cover" => Ok(ServiceType::Cover),
            "both" => Ok(ServiceType::Both),
            other => Err(crate::error::Error::Validation(format!(
                "Unknown service type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EditingStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "editing_in_progress")]
    InProgress,
    #[serde(rename = "editing_completed")]
    Completed,
    #[serde(rename = "editing_paid")]
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Verified,
}

/// A payment declared by the applicant; becomes `verified` only through the
/// staff verification step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub amount: Decimal,
    pub reference: Option<String>,
    pub status: TransactionStatus,
    pub submitted_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<String>,
}

impl PaymentTransaction {
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}

/// Per-email aggregate for the document-editing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditingRecord {
    pub email: String,
    pub service_type: ServiceType,
    pub status: EditingStatus,
    pub source_files: Vec<FileRecord>,
    pub delivered_files: BTreeMap<DocumentKind, FileRecord>,
    pub transactions: Vec<PaymentTransaction>,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EditingRecord {
    pub fn has_pending_transaction(&self) -> bool {
        self.transactions.iter().any(|tx| tx.is_pending())
    }

    pub fn deliverables_complete(&self) -> bool {
        self.service_type
            .required_deliverables()
            .iter()
            .all(|kind| self.delivered_files.contains_key(kind))
    }
}
