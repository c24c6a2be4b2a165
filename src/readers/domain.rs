pub mod model;
pub mod service;

use async_trait::async_trait;
use crate::core::domain::Identifiable;
use crate::core::library::{LibraryResult, Role};
use crate::readers::dto::ReaderDto;

// ReaderService owns reader records; the loan ledger reads them for
// eligibility and commands penalty/counter updates through it.
#[async_trait]
pub trait ReaderService: Sync + Send {
    async fn add_reader(&self, reader: &ReaderDto) -> LibraryResult<()>;
    async fn update_reader(&self, reader: &ReaderDto) -> LibraryResult<()>;
    async fn remove_reader(&self, id: &str) -> LibraryResult<()>;
    async fn find_reader_by_id(&self, id: &str) -> LibraryResult<ReaderDto>;
    async fn find_reader_by_email(&self, email: &str) -> LibraryResult<Vec<ReaderDto>>;
    // overwrites the penalty annotation; empty text clears it
    async fn set_penalty_status(&self, id: &str, text: &str) -> LibraryResult<ReaderDto>;
    async fn set_current_borrowing(&self, id: &str, count: i64) -> LibraryResult<ReaderDto>;
}

pub trait Reader: Identifiable {
    fn is_admin(&self) -> bool;
    fn is_role(&self, match_role: Role) -> bool;
    fn quota(&self) -> i64;
    fn is_penalized(&self) -> bool;
}
