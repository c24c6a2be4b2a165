use crate::core::repository::RepositoryStore;
use crate::gateway::factory::create_publisher;
use crate::readers::domain::ReaderService;
use crate::readers::domain::service::ReaderServiceImpl;
use crate::readers::repository::ReaderRepository;
use crate::readers::repository::ddb_reader_repository::DDBReaderRepository;
use crate::readers::repository::memory_reader_repository::MemoryReaderRepository;
use crate::utils::ddb::{build_db_client, create_table};

pub async fn create_reader_repository(store: RepositoryStore) -> Box<dyn ReaderRepository> {
    match store {
        RepositoryStore::DynamoDB => {
            let client = build_db_client(store).await;
            Box::new(DDBReaderRepository::new(client, "readers", "readers_ndx"))
        }
        RepositoryStore::LocalDynamoDB => {
            let client = build_db_client(store).await;
            let _ = create_table(&client, "readers", "reader_id", "email", "full_name").await;
            Box::new(DDBReaderRepository::new(client, "readers", "readers_ndx"))
        }
        RepositoryStore::InMemory => {
            Box::new(MemoryReaderRepository::new())
        }
    }
}

pub async fn create_reader_service(store: RepositoryStore) -> Box<dyn ReaderService> {
    let reader_repo = create_reader_repository(store).await;
    let publisher = create_publisher(store.gateway_publisher()).await;
    Box::new(ReaderServiceImpl::new(reader_repo, publisher))
}
