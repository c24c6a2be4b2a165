use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;

use crate::catalog::domain::model::BookEntity;
use crate::catalog::repository::BookRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::mem::{matches_predicate, paginate};

lazy_static! {
    // process-wide table shared by every repository instance, mirroring how
    // the ddb repositories all point at the same remote table
    static ref BOOKS: Mutex<HashMap<String, BookEntity>> = Mutex::new(HashMap::new());
}

#[derive(Debug, Default)]
pub struct MemoryBookRepository {}

impl MemoryBookRepository {
    pub fn new() -> Self {
        Self {}
    }

    fn table(&self) -> LibraryResult<MutexGuard<'static, HashMap<String, BookEntity>>> {
        BOOKS.lock().map_err(|err| LibraryError::runtime(
            format!("books table lock poisoned {:?}", err).as_str(), None))
    }
}

#[async_trait]
impl Repository<BookEntity> for MemoryBookRepository {
    async fn create(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let mut table = self.table()?;
        if table.contains_key(entity.book_id.as_str()) {
            return Err(LibraryError::validation(
                format!("book {} already exists", entity.book_id).as_str(), Some("409".to_string())));
        }
        table.insert(entity.book_id.clone(), entity.clone());
        Ok(1)
    }

    async fn update(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let mut table = self.table()?;
        match table.get(entity.book_id.as_str()) {
            Some(existing) if existing.version == entity.version => {
                let mut updated = entity.clone();
                updated.version = entity.version + 1;
                updated.updated_at = Utc::now().naive_utc();
                table.insert(entity.book_id.clone(), updated);
                Ok(1)
            }
            Some(_) => Err(LibraryError::not_found(
                format!("stale version for book {}", entity.book_id).as_str())),
            None => Err(LibraryError::not_found(
                format!("book not found for {}", entity.book_id).as_str())),
        }
    }

    async fn get(&self, id: &str) -> LibraryResult<BookEntity> {
        let table = self.table()?;
        table.get(id).cloned().ok_or_else(|| LibraryError::not_found(
            format!("book not found for {}", id).as_str()))
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let mut table = self.table()?;
        match table.remove(id) {
            Some(_) => Ok(1),
            None => Err(LibraryError::not_found(format!("book not found for {}", id).as_str())),
        }
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let table = self.table()?;
        let mut records: Vec<BookEntity> = Vec::new();
        for entity in table.values() {
            let val = serde_json::to_value(entity)?;
            if matches_predicate(&val, predicate) {
                records.push(entity.clone());
            }
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(page, page_size, records))
    }
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn adjust_available(&self, id: &str, delta: i64) -> LibraryResult<BookEntity> {
        // single lock makes check-and-adjust atomic
        let mut table = self.table()?;
        let book = table.get(id).ok_or_else(|| LibraryError::not_found(
            format!("book not found for {}", id).as_str()))?;
        let next = book.available_quantity + delta;
        if next < 0 {
            return Err(LibraryError::stock_unavailable(
                format!("no available copy of book {}", id).as_str()));
        }
        if next > book.total_quantity {
            return Err(LibraryError::invalid_state(
                format!("available quantity would exceed total for book {}", id).as_str()));
        }
        let mut updated = book.clone();
        updated.available_quantity = next;
        updated.version = book.version + 1;
        updated.updated_at = Utc::now().naive_utc();
        table.insert(id.to_string(), updated.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use crate::catalog::domain::model::BookEntity;
    use crate::catalog::repository::BookRepository;
    use crate::catalog::repository::memory_book_repository::MemoryBookRepository;
    use crate::core::library::LibraryError;
    use crate::core::repository::Repository;

    #[tokio::test]
    async fn test_should_create_get_book() {
        let repo = MemoryBookRepository::new();
        let book = BookEntity::new("BK-100", "title", "author", "cat1", 4);
        let size = repo.create(&book).await.expect("should create book");
        assert_eq!(1, size);

        let loaded = repo.get(book.book_id.as_str()).await.expect("should return book");
        assert_eq!(book.book_id, loaded.book_id);
        assert_eq!(4, loaded.available_quantity);
    }

    #[tokio::test]
    async fn test_should_create_update_book() {
        let repo = MemoryBookRepository::new();
        let mut book = BookEntity::new("BK-101", "title", "author", "cat1", 4);
        let _ = repo.create(&book).await.expect("should create book");

        book.title = "new title".to_string();
        book.hidden = true;
        let size = repo.update(&book).await.expect("should update book");
        assert_eq!(1, size);

        let loaded = repo.get(book.book_id.as_str()).await.expect("should return book");
        assert_eq!("new title", loaded.title.as_str());
        assert!(loaded.hidden);
        assert_eq!(book.version + 1, loaded.version);
    }

    #[tokio::test]
    async fn test_should_fail_update_with_stale_version() {
        let repo = MemoryBookRepository::new();
        let mut book = BookEntity::new("BK-102", "title", "author", "cat1", 4);
        let _ = repo.create(&book).await.expect("should create book");
        let _ = repo.update(&book).await.expect("should update book");

        // version is stale after the first update
        book.title = "again".to_string();
        let res = repo.update(&book).await;
        assert!(matches!(res, Err(LibraryError::NotFound { message: _ })));
    }

    #[tokio::test]
    async fn test_should_adjust_available_within_bounds() {
        let repo = MemoryBookRepository::new();
        let book = BookEntity::new("BK-103", "title", "author", "cat1", 2);
        let _ = repo.create(&book).await.expect("should create book");

        let updated = repo.adjust_available(book.book_id.as_str(), -1).await.expect("should decrement");
        assert_eq!(1, updated.available_quantity);
        let updated = repo.adjust_available(book.book_id.as_str(), -1).await.expect("should decrement");
        assert_eq!(0, updated.available_quantity);

        let res = repo.adjust_available(book.book_id.as_str(), -1).await;
        assert!(matches!(res, Err(LibraryError::StockUnavailable { message: _ })));

        let updated = repo.adjust_available(book.book_id.as_str(), 1).await.expect("should increment");
        assert_eq!(1, updated.available_quantity);
    }

    #[tokio::test]
    async fn test_should_fail_increment_beyond_total() {
        let repo = MemoryBookRepository::new();
        let book = BookEntity::new("BK-104", "title", "author", "cat1", 1);
        let _ = repo.create(&book).await.expect("should create book");

        let res = repo.adjust_available(book.book_id.as_str(), 1).await;
        assert!(matches!(res, Err(LibraryError::InvalidState { message: _ })));
    }

    #[tokio::test]
    async fn test_should_query_book_by_code() {
        let repo = MemoryBookRepository::new();
        let book = BookEntity::new("BK-105", "title", "author", "cat1", 4);
        let _ = repo.create(&book).await.expect("should create book");

        let predicate = HashMap::from([("code".to_string(), "BK-105".to_string())]);
        let res = repo.query(&predicate, None, 10).await.expect("should query books");
        assert_eq!(1, res.records.len());
        assert_eq!(book.book_id, res.records[0].book_id);
    }
}
