use crate::catalog::factory::create_catalog_service;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;
use crate::gateway::factory::create_publisher;
use crate::ledger::domain::LoanService;
use crate::ledger::domain::service::LoanServiceImpl;
use crate::ledger::repository::LoanRepository;
use crate::ledger::repository::ddb_loan_repository::DDBLoanRepository;
use crate::ledger::repository::memory_loan_repository::MemoryLoanRepository;
use crate::readers::factory::create_reader_service;
use crate::utils::ddb::{build_db_client, create_table};

pub async fn create_loan_repository(store: RepositoryStore) -> Box<dyn LoanRepository> {
    match store {
        RepositoryStore::DynamoDB => {
            let client = build_db_client(store).await;
            Box::new(DDBLoanRepository::new(client, "loans", "loans_ndx"))
        }
        RepositoryStore::LocalDynamoDB => {
            let client = build_db_client(store).await;
            let _ = create_table(&client, "loans", "loan_id", "reader_id", "book_id").await;
            Box::new(DDBLoanRepository::new(client, "loans", "loans_ndx"))
        }
        RepositoryStore::InMemory => {
            Box::new(MemoryLoanRepository::new())
        }
    }
}

pub async fn create_loan_service(config: &Configuration, store: RepositoryStore) -> Box<dyn LoanService> {
    let loan_repo = create_loan_repository(store).await;
    let reader_service = create_reader_service(store).await;
    let catalog_service = create_catalog_service(store).await;
    let publisher = create_publisher(store.gateway_publisher()).await;
    Box::new(LoanServiceImpl::new(config, loan_repo, reader_service, catalog_service, publisher))
}
