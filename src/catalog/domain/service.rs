use std::collections::HashMap;
use async_trait::async_trait;
use crate::catalog::domain::CatalogService;
use crate::catalog::domain::model::{BookEntity, CategoryEntity};
use crate::catalog::dto::{BookDto, CategoryDto};
use crate::catalog::repository::{BookRepository, CategoryRepository};
use crate::core::events::DomainEvent;
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::gateway::events::EventPublisher;

pub struct CatalogServiceImpl {
    book_repository: Box<dyn BookRepository>,
    category_repository: Box<dyn CategoryRepository>,
    events_publisher: Box<dyn EventPublisher>,
}

impl CatalogServiceImpl {
    pub fn new(book_repository: Box<dyn BookRepository>,
               category_repository: Box<dyn CategoryRepository>,
               events_publisher: Box<dyn EventPublisher>) -> Self {
        Self {
            book_repository,
            category_repository,
            events_publisher,
        }
    }
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn add_book(&self, book: &BookDto) -> LibraryResult<BookDto> {
        self.book_repository.create(&BookEntity::from(book)).await?;
        let _ = self.events_publisher.publish(&DomainEvent::added(
            "book_added", "catalog", book.book_id.as_str(), &HashMap::new(), &book.clone())?).await?;
        Ok(book.clone())
    }

    async fn update_book(&self, book: &BookDto) -> LibraryResult<BookDto> {
        self.book_repository.update(&BookEntity::from(book)).await?;
        let updated = self.find_book_by_id(book.book_id.as_str()).await?;
        let _ = self.events_publisher.publish(&DomainEvent::updated(
            "book_updated", "catalog", updated.book_id.as_str(), &HashMap::new(), &updated.clone())?).await?;
        Ok(updated)
    }

    async fn remove_book(&self, id: &str) -> LibraryResult<()> {
        self.book_repository.delete(id).await?;
        let _ = self.events_publisher.publish(&DomainEvent::deleted(
            "book_removed", "catalog", id, &HashMap::new(), &id.to_string())?).await?;
        Ok(())
    }

    async fn find_book_by_id(&self, id: &str) -> LibraryResult<BookDto> {
        self.book_repository.get(id).await.map(|b| BookDto::from(&b))
    }

    async fn find_book_by_code(&self, code: &str) -> LibraryResult<Vec<BookDto>> {
        let res = self.book_repository.query(
            &HashMap::from([("code".to_string(), code.to_string())]), None, 100).await?;
        Ok(res.records.iter().map(BookDto::from).collect())
    }

    async fn adjust_available(&self, id: &str, delta: i64) -> LibraryResult<BookDto> {
        let updated = self.book_repository.adjust_available(id, delta).await?;
        let book = BookDto::from(&updated);
        let _ = self.events_publisher.publish(&DomainEvent::updated(
            "book_stock_adjusted", "catalog", book.book_id.as_str(), &HashMap::new(), &book.clone())?).await?;
        Ok(book)
    }

    async fn add_category(&self, category: &CategoryDto) -> LibraryResult<CategoryDto> {
        self.category_repository.create(&CategoryEntity::from(category)).await?;
        let _ = self.events_publisher.publish(&DomainEvent::added(
            "category_added", "catalog", category.category_id.as_str(), &HashMap::new(), &category.clone())?).await?;
        Ok(category.clone())
    }

    async fn remove_category(&self, id: &str) -> LibraryResult<()> {
        self.category_repository.delete(id).await?;
        let _ = self.events_publisher.publish(&DomainEvent::deleted(
            "category_removed", "catalog", id, &HashMap::new(), &id.to_string())?).await?;
        Ok(())
    }

    async fn find_category_by_id(&self, id: &str) -> LibraryResult<CategoryDto> {
        self.category_repository.get(id).await.map(|c| CategoryDto::from(&c))
    }

    async fn query_categories(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<CategoryDto>> {
        let res = self.category_repository.query(&HashMap::new(), page, page_size).await?;
        let records = res.records.iter().map(CategoryDto::from).collect();
        Ok(PaginatedResult::new(page, page_size, res.next_page, records))
    }
}

impl From<&BookEntity> for BookDto {
    fn from(other: &BookEntity) -> BookDto {
        BookDto {
            book_id: other.book_id.to_string(),
            version: other.version,
            code: other.code.to_string(),
            title: other.title.to_string(),
            author: other.author.to_string(),
            category_id: other.category_id.to_string(),
            total_quantity: other.total_quantity,
            available_quantity: other.available_quantity,
            hidden: other.hidden,
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

impl From<&BookDto> for BookEntity {
    fn from(other: &BookDto) -> BookEntity {
        BookEntity {
            book_id: other.book_id.to_string(),
            version: other.version,
            code: other.code.to_string(),
            title: other.title.to_string(),
            author: other.author.to_string(),
            category_id: other.category_id.to_string(),
            total_quantity: other.total_quantity,
            available_quantity: other.available_quantity,
            hidden: other.hidden,
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

impl From<&CategoryEntity> for CategoryDto {
    fn from(other: &CategoryEntity) -> CategoryDto {
        CategoryDto {
            category_id: other.category_id.to_string(),
            version: other.version,
            name: other.name.to_string(),
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

impl From<&CategoryDto> for CategoryEntity {
    fn from(other: &CategoryDto) -> CategoryEntity {
        CategoryEntity {
            category_id: other.category_id.to_string(),
            version: other.version,
            name: other.name.to_string(),
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use lazy_static::lazy_static;
    use crate::catalog::domain::CatalogService;
    use crate::catalog::dto::{BookDto, CategoryDto};
    use crate::catalog::factory;
    use crate::core::library::LibraryError;
    use crate::core::repository::RepositoryStore;

    lazy_static! {
        static ref SUT_SVC: AsyncOnce<Box<dyn CatalogService>> = AsyncOnce::new(async {
                factory::create_catalog_service(RepositoryStore::InMemory).await
            });
    }

    #[tokio::test]
    async fn test_should_add_and_find_book() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let book = BookDto::new("BK-200", "title", "author", "cat1", 5);
        let _ = catalog_svc.add_book(&book).await.expect("should add book");

        let loaded = catalog_svc.find_book_by_id(book.book_id.as_str()).await.expect("should return book");
        assert_eq!(book.book_id, loaded.book_id);

        let by_code = catalog_svc.find_book_by_code("BK-200").await.expect("should find by code");
        assert_eq!(1, by_code.len());
    }

    #[tokio::test]
    async fn test_should_update_book() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let mut book = BookDto::new("BK-201", "title", "author", "cat1", 5);
        let _ = catalog_svc.add_book(&book).await.expect("should add book");

        book.hidden = true;
        book.title = "revised".to_string();
        let updated = catalog_svc.update_book(&book).await.expect("should update book");
        assert!(updated.hidden);
        assert_eq!("revised", updated.title.as_str());
    }

    #[tokio::test]
    async fn test_should_adjust_stock_and_reject_underflow() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let book = BookDto::new("BK-202", "title", "author", "cat1", 1);
        let _ = catalog_svc.add_book(&book).await.expect("should add book");

        let updated = catalog_svc.adjust_available(book.book_id.as_str(), -1).await.expect("should decrement");
        assert_eq!(0, updated.available_quantity);

        let res = catalog_svc.adjust_available(book.book_id.as_str(), -1).await;
        assert!(matches!(res, Err(LibraryError::StockUnavailable { message: _ })));
    }

    #[tokio::test]
    async fn test_should_add_find_remove_category() {
        let catalog_svc = SUT_SVC.get().await.clone();

        let category = CategoryDto::new("novel");
        let _ = catalog_svc.add_category(&category).await.expect("should add category");

        let loaded = catalog_svc.find_category_by_id(category.category_id.as_str()).await.expect("should return category");
        assert_eq!(category.name, loaded.name);

        let _ = catalog_svc.remove_category(category.category_id.as_str()).await.expect("should remove category");
        assert!(catalog_svc.find_category_by_id(category.category_id.as_str()).await.is_err());
    }
}
