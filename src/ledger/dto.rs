use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::domain::Identifiable;
use crate::core::library::{LoanStatus, Role};
use crate::utils::date::serializer;

// LoanDto is the ledger view handed to callers. effective_status and
// overdue_days carry the read-time projection so every surface that lists
// loans reports the same answer without a write-back sweep.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LoanDto {
    pub loan_id: String,
    pub version: i64,
    pub reader_id: String,
    pub book_id: String,
    pub loan_status: LoanStatus,
    pub effective_status: LoanStatus,
    pub overdue_days: i64,
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

impl Identifiable for LoanDto {
    fn id(&self) -> String {
        self.loan_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}
