use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::{DocumentKind, FileRecord, PaymentStatus};
use crate::models::editing::{
    EditingRecord, EditingStatus, PaymentTransaction, ServiceType, TransactionStatus,
};

pub fn new_editing_record(
    email: &str,
    service_type: ServiceType,
    source_files: Vec<FileRecord>,
    now: DateTime<Utc>,
) -> EditingRecord {
    EditingRecord {
        email: email.to_string(),
        service_type,
        status: EditingStatus::Pending,
        source_files,
        delivered_files: Default::default(),
        transactions: Vec::new(),
        payment_status: PaymentStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}

/// Staff deliver edited files. The record reaches `editing_completed` only
/// once every deliverable for the ordered service type is present.
pub fn upload_edited_files(
    record: &mut EditingRecord,
    files: Vec<(DocumentKind, FileRecord)>,
    now: DateTime<Utc>,
) -> Result<()> {
    for (kind, file) in files {
        if !matches!(kind, DocumentKind::EditedCv | DocumentKind::EditedCover) {
            return Err(Error::Validation(format!(
                "{} is not an editing deliverable",
                kind
            )));
        }
        record.delivered_files.insert(kind, file);
    }

    record.status = if record.deliverables_complete() {
        EditingStatus::Completed
    } else {
        EditingStatus::InProgress
    };
    record.updated_at = now;
    Ok(())
}

/// Applicant declares a payment; it stays pending until staff verify it.
pub fn record_payment(
    record: &mut EditingRecord,
    amount: Decimal,
    reference: Option<String>,
    now: DateTime<Utc>,
) -> Result<Uuid> {
    if record.has_pending_transaction() {
        return Err(Error::Conflict(
            "A payment is already awaiting verification".to_string(),
        ));
    }
    let id = Uuid::new_v4();
    record.transactions.push(PaymentTransaction {
        id,
        amount,
        reference,
        status: TransactionStatus::Pending,
        submitted_at: now,
        verified_at: None,
        verified_by: None,
    });
    record.updated_at = now;
    Ok(id)
}

/// The only transition into `editing_paid`. Fails when there is nothing to
/// verify, which also guards against double verification.
pub fn verify_payment(record: &mut EditingRecord, verifier: &str, now: DateTime<Utc>) -> Result<()> {
    let transaction = record
        .transactions
        .iter_mut()
        .find(|tx| tx.is_pending())
        .ok_or_else(|| Error::Conflict("No pending payment to verify".to_string()))?;

    transaction.status = TransactionStatus::Verified;
    transaction.verified_at = Some(now);
    transaction.verified_by = Some(verifier.to_string());
    record.payment_status = PaymentStatus::Paid;
    record.status = EditingStatus::Paid;
    record.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn file(name: &str) -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            original_name: name.to_string(),
            stored_path: format!("uploads/editing/{}", name),
            size_bytes: 512,
            upload_number: 1,
            uploaded_at: ts(0),
        }
    }

    #[test]
    fn completion_waits_for_every_deliverable() {
        let mut record = new_editing_record("a@b.c", ServiceType::Both, vec![], ts(0));

        upload_edited_files(
            &mut record,
            vec![(DocumentKind::EditedCv, file("cv.pdf"))],
            ts(10),
        )
        .unwrap();
        assert_eq!(record.status, EditingStatus::InProgress);

        upload_edited_files(
            &mut record,
            vec![(DocumentKind::EditedCover, file("cover.pdf"))],
            ts(20),
        )
        .unwrap();
        assert_eq!(record.status, EditingStatus::Completed);
    }

    #[test]
    fn single_service_completes_with_its_one_deliverable() {
        let mut record = new_editing_record("a@b.c", ServiceType::Cv, vec![], ts(0));
        upload_edited_files(
            &mut record,
            vec![(DocumentKind::EditedCv, file("cv.pdf"))],
            ts(10),
        )
        .unwrap();
        assert_eq!(record.status, EditingStatus::Completed);
    }

    #[test]
    fn non_deliverable_kind_is_rejected() {
        let mut record = new_editing_record("a@b.c", ServiceType::Cv, vec![], ts(0));
        let err = upload_edited_files(
            &mut record,
            vec![(DocumentKind::Passport, file("passport.pdf"))],
            ts(10),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn verification_is_the_only_way_into_paid() {
        let mut record = new_editing_record("a@b.c", ServiceType::Cv, vec![], ts(0));

        // Nothing pending yet.
        let err = verify_payment(&mut record, "staff", ts(5)).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        record_payment(&mut record, Decimal::new(4999, 2), None, ts(10)).unwrap();
        assert_eq!(record.payment_status, PaymentStatus::Pending);

        verify_payment(&mut record, "staff", ts(20)).unwrap();
        assert_eq!(record.status, EditingStatus::Paid);
        assert_eq!(record.payment_status, PaymentStatus::Paid);

        // Idempotence guard: nothing left to verify.
        let err = verify_payment(&mut record, "staff", ts(30)).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn duplicate_pending_payment_is_a_conflict() {
        let mut record = new_editing_record("a@b.c", ServiceType::Cv, vec![], ts(0));
        record_payment(&mut record, Decimal::new(4999, 2), None, ts(10)).unwrap();
        let err = record_payment(&mut record, Decimal::new(4999, 2), None, ts(20)).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }
}
