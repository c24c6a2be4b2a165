use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::domain::Identifiable;
use crate::core::library::{LoanStatus, Role};
use crate::utils::date;
use crate::utils::date::serializer;

// LoanEntity abstracts one borrow request and its lifecycle: pending until a
// librarian approves or rejects it, then borrowing until the copy comes back.
// The stored loan_status never flips to overdue on its own; overdue is derived
// from the due date at read time, see effective_status.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LoanEntity {
    pub loan_id: String,
    pub version: i64,
    pub reader_id: String,
    pub book_id: String,
    pub loan_status: LoanStatus,
    // who opened the loan: a reader request or a librarian at the desk
    pub requested_by: Role,
    #[serde(with = "serializer")]
    pub borrow_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub due_at: NaiveDateTime,
    pub returned_at: Option<NaiveDateTime>,
    pub approved_at: Option<NaiveDateTime>,
    pub overdue_note: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl LoanEntity {
    pub fn pending(reader_id: &str, book_id: &str, due_at: NaiveDateTime) -> Self {
        Self {
            loan_id: Uuid::new_v4().to_string(),
            version: 0,
            reader_id: reader_id.to_string(),
            book_id: book_id.to_string(),
            loan_status: LoanStatus::Pending,
            requested_by: Role::Reader,
            borrow_at: Utc::now().naive_utc(),
            due_at,
            returned_at: None,
            approved_at: None,
            overdue_note: "".to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    pub fn borrowing(reader_id: &str, book_id: &str, due_at: NaiveDateTime) -> Self {
        Self {
            loan_id: Uuid::new_v4().to_string(),
            version: 0,
            reader_id: reader_id.to_string(),
            book_id: book_id.to_string(),
            loan_status: LoanStatus::Borrowing,
            requested_by: Role::Admin,
            borrow_at: Utc::now().naive_utc(),
            due_at,
            returned_at: None,
            approved_at: Some(Utc::now().naive_utc()),
            overdue_note: "".to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    // Read-time status projection. A returned loan stays returned, a pending
    // request is never reclassified, and an open loan is overdue once the
    // calendar day after its due date begins.
    pub fn effective_status(&self, today: NaiveDate) -> LoanStatus {
        if self.returned_at.is_some() {
            return LoanStatus::Returned;
        }
        match self.loan_status {
            LoanStatus::Pending => LoanStatus::Pending,
            _ => {
                if self.due_at.date() < today {
                    LoanStatus::Overdue
                } else {
                    LoanStatus::Borrowing
                }
            }
        }
    }

    pub fn overdue_days(&self, today: NaiveDate) -> i64 {
        match self.effective_status(today) {
            LoanStatus::Overdue => date::overdue_days(self.due_at, today),
            _ => 0,
        }
    }

    pub fn is_open(&self, today: NaiveDate) -> bool {
        matches!(self.effective_status(today), LoanStatus::Borrowing | LoanStatus::Overdue)
    }
}

impl Identifiable for LoanEntity {
    fn id(&self) -> String {
        self.loan_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, Utc};
    use crate::core::library::{LoanStatus, Role};
    use crate::ledger::domain::model::LoanEntity;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_should_build_pending_loan() {
        let loan = LoanEntity::pending("reader1", "book1", Utc::now().naive_utc() + Duration::days(14));
        assert_eq!(LoanStatus::Pending, loan.loan_status);
        assert_eq!(Role::Reader, loan.requested_by);
        assert_eq!(None, loan.returned_at);
        assert_eq!(None, loan.approved_at);
    }

    #[tokio::test]
    async fn test_should_build_direct_borrowing_loan() {
        let loan = LoanEntity::borrowing("reader1", "book1", Utc::now().naive_utc() + Duration::days(14));
        assert_eq!(LoanStatus::Borrowing, loan.loan_status);
        assert_eq!(Role::Admin, loan.requested_by);
        assert!(loan.approved_at.is_some());
    }

    #[tokio::test]
    async fn test_should_not_reclassify_pending_past_due() {
        let mut loan = LoanEntity::pending("reader1", "book1",
                                           day(2023, 5, 1).and_hms_opt(9, 0, 0).unwrap());
        loan.borrow_at = day(2023, 4, 17).and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(LoanStatus::Pending, loan.effective_status(day(2023, 6, 1)));
        assert_eq!(0, loan.overdue_days(day(2023, 6, 1)));
    }

    #[tokio::test]
    async fn test_should_derive_overdue_after_due_date() {
        let mut loan = LoanEntity::borrowing("reader1", "book1",
                                             day(2023, 5, 9).and_hms_opt(23, 59, 0).unwrap());
        loan.loan_status = LoanStatus::Borrowing;
        assert_eq!(LoanStatus::Borrowing, loan.effective_status(day(2023, 5, 9)));
        assert_eq!(LoanStatus::Overdue, loan.effective_status(day(2023, 5, 10)));
        assert_eq!(1, loan.overdue_days(day(2023, 5, 10)));
        assert_eq!(7, loan.overdue_days(day(2023, 5, 16)));
    }

    #[tokio::test]
    async fn test_should_report_returned_even_past_due() {
        let mut loan = LoanEntity::borrowing("reader1", "book1",
                                             day(2023, 5, 1).and_hms_opt(9, 0, 0).unwrap());
        loan.returned_at = Some(day(2023, 5, 8).and_hms_opt(10, 0, 0).unwrap());
        assert_eq!(LoanStatus::Returned, loan.effective_status(day(2023, 6, 1)));
        assert_eq!(0, loan.overdue_days(day(2023, 6, 1)));
        assert!(!loan.is_open(day(2023, 6, 1)));
    }

    #[tokio::test]
    async fn test_should_stay_overdue_even_when_stored_status_is_stale() {
        let mut loan = LoanEntity::borrowing("reader1", "book1",
                                             day(2023, 5, 1).and_hms_opt(9, 0, 0).unwrap());
        loan.loan_status = LoanStatus::Overdue;
        assert_eq!(LoanStatus::Overdue, loan.effective_status(day(2023, 5, 10)));
        assert!(loan.is_open(day(2023, 5, 10)));
    }
}
