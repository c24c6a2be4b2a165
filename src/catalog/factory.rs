use crate::catalog::domain::CatalogService;
use crate::catalog::domain::service::CatalogServiceImpl;
use crate::catalog::repository::{BookRepository, CategoryRepository};
use crate::catalog::repository::ddb_book_repository::DDBBookRepository;
use crate::catalog::repository::ddb_category_repository::DDBCategoryRepository;
use crate::catalog::repository::memory_book_repository::MemoryBookRepository;
use crate::catalog::repository::memory_category_repository::MemoryCategoryRepository;
use crate::core::repository::RepositoryStore;
use crate::gateway::factory::create_publisher;
use crate::utils::ddb::{build_db_client, create_table};

pub async fn create_book_repository(store: RepositoryStore) -> Box<dyn BookRepository> {
    match store {
        RepositoryStore::DynamoDB => {
            let client = build_db_client(store).await;
            Box::new(DDBBookRepository::new(client, "books", "books_ndx"))
        }
        RepositoryStore::LocalDynamoDB => {
            let client = build_db_client(store).await;
            let _ = create_table(&client, "books", "book_id", "code", "title").await;
            Box::new(DDBBookRepository::new(client, "books", "books_ndx"))
        }
        RepositoryStore::InMemory => {
            Box::new(MemoryBookRepository::new())
        }
    }
}

pub async fn create_category_repository(store: RepositoryStore) -> Box<dyn CategoryRepository> {
    match store {
        RepositoryStore::DynamoDB => {
            let client = build_db_client(store).await;
            Box::new(DDBCategoryRepository::new(client, "categories"))
        }
        RepositoryStore::LocalDynamoDB => {
            let client = build_db_client(store).await;
            let _ = create_table(&client, "categories", "category_id", "name", "category_id").await;
            Box::new(DDBCategoryRepository::new(client, "categories"))
        }
        RepositoryStore::InMemory => {
            Box::new(MemoryCategoryRepository::new())
        }
    }
}

pub async fn create_catalog_service(store: RepositoryStore) -> Box<dyn CatalogService> {
    let book_repo = create_book_repository(store).await;
    let category_repo = create_category_repository(store).await;
    let publisher = create_publisher(store.gateway_publisher()).await;
    Box::new(CatalogServiceImpl::new(book_repo, category_repo, publisher))
}
