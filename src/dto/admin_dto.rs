use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::application::ReviewDecision;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewDocumentRequest {
    pub decision: ReviewDecision,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReuploadRequestPayload {
    #[validate(length(min = 1, message = "At least one document kind is required"))]
    pub documents: Vec<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransitionStatusRequest {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    pub amount: Decimal,
    pub reference: Option<String>,
}
