use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;

use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::readers::domain::model::ReaderEntity;
use crate::readers::repository::ReaderRepository;
use crate::utils::mem::{matches_predicate, paginate};

lazy_static! {
    static ref READERS: Mutex<HashMap<String, ReaderEntity>> = Mutex::new(HashMap::new());
}

#[derive(Debug, Default)]
pub struct MemoryReaderRepository {}

impl MemoryReaderRepository {
    pub fn new() -> Self {
        Self {}
    }

    fn table(&self) -> LibraryResult<MutexGuard<'static, HashMap<String, ReaderEntity>>> {
        READERS.lock().map_err(|err| LibraryError::runtime(
            format!("readers table lock poisoned {:?}", err).as_str(), None))
    }
}

#[async_trait]
impl Repository<ReaderEntity> for MemoryReaderRepository {
    async fn create(&self, entity: &ReaderEntity) -> LibraryResult<usize> {
        let mut table = self.table()?;
        if table.contains_key(entity.reader_id.as_str()) {
            return Err(LibraryError::validation(
                format!("reader {} already exists", entity.reader_id).as_str(), Some("409".to_string())));
        }
        table.insert(entity.reader_id.clone(), entity.clone());
        Ok(1)
    }

    async fn update(&self, entity: &ReaderEntity) -> LibraryResult<usize> {
        let mut table = self.table()?;
        match table.get(entity.reader_id.as_str()) {
            Some(existing) if existing.version == entity.version => {
                let mut updated = entity.clone();
                updated.version = entity.version + 1;
                updated.updated_at = Utc::now().naive_utc();
                table.insert(entity.reader_id.clone(), updated);
                Ok(1)
            }
            Some(_) => Err(LibraryError::not_found(
                format!("stale version for reader {}", entity.reader_id).as_str())),
            None => Err(LibraryError::not_found(
                format!("reader not found for {}", entity.reader_id).as_str())),
        }
    }

    async fn get(&self, id: &str) -> LibraryResult<ReaderEntity> {
        let table = self.table()?;
        table.get(id).cloned().ok_or_else(|| LibraryError::not_found(
            format!("reader not found for {}", id).as_str()))
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let mut table = self.table()?;
        match table.remove(id) {
            Some(_) => Ok(1),
            None => Err(LibraryError::not_found(format!("reader not found for {}", id).as_str())),
        }
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<ReaderEntity>> {
        let table = self.table()?;
        let mut records: Vec<ReaderEntity> = Vec::new();
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

impl ReaderRepository for MemoryReaderRepository {}
