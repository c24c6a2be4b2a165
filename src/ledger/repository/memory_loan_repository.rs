use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use lazy_static::lazy_static;

use crate::core::library::{LibraryError, LibraryResult, LoanStatus, PaginatedResult};
use crate::core::repository::Repository;
use crate::ledger::domain::model::LoanEntity;
use crate::ledger::repository::LoanRepository;
use crate::utils::mem::{matches_predicate, paginate};

lazy_static! {
    // process-wide table shared by every repository instance, mirroring how
    // the ddb repositories all point at the same remote table
    static ref LOANS: Mutex<HashMap<String, LoanEntity>> = Mutex::new(HashMap::new());
}

#[derive(Debug, Default)]
pub struct MemoryLoanRepository {}

impl MemoryLoanRepository {
    pub fn new() -> Self {
        Self {}
    }

    fn table(&self) -> LibraryResult<MutexGuard<'static, HashMap<String, LoanEntity>>> {
        LOANS.lock().map_err(|err| LibraryError::runtime(
            format!("loans table lock poisoned {:?}", err).as_str(), None))
    }
}

#[async_trait]
impl Repository<LoanEntity> for MemoryLoanRepository {
    async fn create(&self, entity: &LoanEntity) -> LibraryResult<usize> {
        let mut table = self.table()?;
        if table.contains_key(entity.loan_id.as_str()) {
            return Err(LibraryError::validation(
                format!("loan {} already exists", entity.loan_id).as_str(), Some("409".to_string())));
        }
        table.insert(entity.loan_id.clone(), entity.clone());
        Ok(1)
    }

    async fn update(&self, entity: &LoanEntity) -> LibraryResult<usize> {
        let mut table = self.table()?;
        match table.get(entity.loan_id.as_str()) {
            Some(existing) if existing.version == entity.version => {
                let mut updated = entity.clone();
                updated.version = entity.version + 1;
                updated.updated_at = Utc::now().naive_utc();
                table.insert(entity.loan_id.clone(), updated);
                Ok(1)
            }
            Some(_) => Err(LibraryError::not_found(
                format!("stale version for loan {}", entity.loan_id).as_str())),
            None => Err(LibraryError::not_found(
                format!("loan not found for {}", entity.loan_id).as_str())),
        }
    }

    async fn get(&self, id: &str) -> LibraryResult<LoanEntity> {
        let table = self.table()?;
        table.get(id).cloned().ok_or_else(|| LibraryError::not_found(
            format!("loan not found for {}", id).as_str()))
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let mut table = self.table()?;
        match table.remove(id) {
            Some(_) => Ok(1),
            None => Err(LibraryError::not_found(format!("loan not found for {}", id).as_str())),
        }
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>> {
        let table = self.table()?;
        let mut records: Vec<LoanEntity> = Vec::new();
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
impl LoanRepository for MemoryLoanRepository {
    async fn approve(&self, id: &str, approved_at: NaiveDateTime) -> LibraryResult<LoanEntity> {
        // single lock makes check-and-flip atomic
        let mut table = self.table()?;
        let loan = table.get(id).ok_or_else(|| LibraryError::not_found(
            format!("loan not found for {}", id).as_str()))?;
        if loan.loan_status != LoanStatus::Pending {
            return Err(LibraryError::invalid_state(
                format!("loan {} is not pending", id).as_str()));
        }
        let mut updated = loan.clone();
        updated.loan_status = LoanStatus::Borrowing;
        updated.approved_at = Some(approved_at);
        updated.version = loan.version + 1;
        updated.updated_at = Utc::now().naive_utc();
        table.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn close(&self, id: &str, returned_at: NaiveDateTime,
                   overdue_note: Option<&str>) -> LibraryResult<LoanEntity> {
        let mut table = self.table()?;
        let loan = table.get(id).ok_or_else(|| LibraryError::not_found(
            format!("loan not found for {}", id).as_str()))?;
        if loan.returned_at.is_some() {
            return Err(LibraryError::invalid_state(
                format!("loan {} is already returned", id).as_str()));
        }
        if loan.loan_status == LoanStatus::Pending {
            return Err(LibraryError::invalid_state(
                format!("loan {} has not been approved", id).as_str()));
        }
        let mut updated = loan.clone();
        updated.loan_status = LoanStatus::Returned;
        updated.returned_at = Some(returned_at);
        if let Some(note) = overdue_note {
            updated.overdue_note = note.to_string();
        }
        updated.version = loan.version + 1;
        updated.updated_at = Utc::now().naive_utc();
        table.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn delete_pending(&self, id: &str) -> LibraryResult<usize> {
        let mut table = self.table()?;
        let loan = table.get(id).ok_or_else(|| LibraryError::not_found(
            format!("loan not found for {}", id).as_str()))?;
        if loan.loan_status != LoanStatus::Pending {
            return Err(LibraryError::invalid_state(
                format!("loan {} is not pending", id).as_str()));
        }
        table.remove(id);
        Ok(1)
    }

    async fn mark_overdue(&self, id: &str) -> LibraryResult<usize> {
        let mut table = self.table()?;
        let loan = table.get(id).ok_or_else(|| LibraryError::not_found(
            format!("loan not found for {}", id).as_str()))?;
        if loan.loan_status != LoanStatus::Borrowing {
            return Ok(0);
        }
        let mut updated = loan.clone();
        updated.loan_status = LoanStatus::Overdue;
        updated.version = loan.version + 1;
        updated.updated_at = Utc::now().naive_utc();
        table.insert(id.to_string(), updated);
        Ok(1)
    }
}
