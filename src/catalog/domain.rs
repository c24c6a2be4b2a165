pub mod model;
pub mod service;

use async_trait::async_trait;
use crate::catalog::dto::{BookDto, CategoryDto};
use crate::core::domain::Identifiable;
use crate::core::library::{LibraryResult, PaginatedResult};

pub trait Book: Identifiable {
    fn is_hidden(&self) -> bool;
    fn available(&self) -> i64;
}

// CatalogService owns book and category records; the loan ledger consumes it
// read-only except for stock adjustments.
#[async_trait]
pub trait CatalogService: Sync + Send {
    async fn add_book(&self, book: &BookDto) -> LibraryResult<BookDto>;
    async fn update_book(&self, book: &BookDto) -> LibraryResult<BookDto>;
    async fn remove_book(&self, id: &str) -> LibraryResult<()>;
    async fn find_book_by_id(&self, id: &str) -> LibraryResult<BookDto>;
    async fn find_book_by_code(&self, code: &str) -> LibraryResult<Vec<BookDto>>;
    // conditional stock adjustment: 0 <= available + delta <= total holds or
    // the command fails without applying
    async fn adjust_available(&self, id: &str, delta: i64) -> LibraryResult<BookDto>;

    async fn add_category(&self, category: &CategoryDto) -> LibraryResult<CategoryDto>;
    async fn remove_category(&self, id: &str) -> LibraryResult<()>;
    async fn find_category_by_id(&self, id: &str) -> LibraryResult<CategoryDto>;
    async fn query_categories(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<CategoryDto>>;
}
