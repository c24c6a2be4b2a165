pub mod ddb_loan_repository;
pub mod memory_loan_repository;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::core::library::LibraryResult;
use crate::core::repository::Repository;
use crate::ledger::domain::model::LoanEntity;

#[async_trait]
pub trait LoanRepository: Repository<LoanEntity> {
    // Conditional status flip: the write applies only while the loan is still
    // pending, so two concurrent approvals cannot both succeed.
    async fn approve(&self, id: &str, approved_at: NaiveDateTime) -> LibraryResult<LoanEntity>;
    // Conditional close: applies only while the loan is open, so a second
    // return fails instead of running the stock compensation twice.
    async fn close(&self, id: &str, returned_at: NaiveDateTime,
                   overdue_note: Option<&str>) -> LibraryResult<LoanEntity>;
    // Removes a loan only while it is still pending.
    async fn delete_pending(&self, id: &str) -> LibraryResult<usize>;
    // Idempotent stored-status refresh for filter queries; a loan that is no
    // longer borrowing is left alone and 0 is returned.
    async fn mark_overdue(&self, id: &str) -> LibraryResult<usize>;
}
