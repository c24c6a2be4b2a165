pub mod ddb_book_repository;
pub mod ddb_category_repository;
pub mod memory_book_repository;
pub mod memory_category_repository;

use async_trait::async_trait;
use crate::catalog::domain::model::{BookEntity, CategoryEntity};
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;

#[async_trait]
pub trait BookRepository: Repository<BookEntity> {
    // Stock adjustment as a compare-and-swap: the write applies only while
    // 0 <= available_quantity + delta <= total_quantity still holds, so two
    // concurrent decrements of the last copy cannot both succeed.
    async fn adjust_available(&self, id: &str, delta: i64) -> LibraryResult<BookEntity>;
}

pub trait CategoryRepository: Repository<CategoryEntity> {}
