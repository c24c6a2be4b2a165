pub mod model;
pub mod service;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::core::library::{LibraryResult, PaginatedResult, PenaltyKind};
use crate::ledger::dto::LoanDto;
use crate::readers::dto::ReaderDto;

// LoanService owns the loan ledger: borrow requests, the approval workflow,
// returns and the penalty hook. Stock and reader records are touched only
// through their owning services.
#[async_trait]
pub trait LoanService: Sync + Send {
    // reader-initiated request; checks eligibility and leaves the loan pending
    // with no stock effect until a librarian approves it
    async fn request_loan(&self, reader_id: &str, book_id: &str,
                          due_at: Option<NaiveDateTime>) -> LibraryResult<LoanDto>;
    // librarian-initiated borrow; decrements stock and opens the loan in a
    // single command, skipping the pending stage
    async fn borrow_direct(&self, reader_id: &str, book_id: &str,
                           due_at: Option<NaiveDateTime>) -> LibraryResult<LoanDto>;
    async fn approve_loan(&self, id: &str) -> LibraryResult<LoanDto>;
    async fn reject_loan(&self, id: &str) -> LibraryResult<()>;
    async fn return_loan(&self, id: &str, overdue_note: Option<&str>) -> LibraryResult<LoanDto>;

    async fn assign_penalty(&self, reader_id: &str, kind: PenaltyKind,
                            magnitude: i64) -> LibraryResult<ReaderDto>;
    // Ok when the reader may submit another borrow request, otherwise a
    // QuotaExceeded error naming which rule failed
    async fn check_eligibility(&self, reader_id: &str) -> LibraryResult<()>;

    async fn find_loan_by_id(&self, id: &str) -> LibraryResult<LoanDto>;
    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>>;
    async fn query_pending(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>>;
    async fn query_by_reader(&self, reader_id: &str,
                             page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>>;
    async fn query_overdue(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>>;
}
