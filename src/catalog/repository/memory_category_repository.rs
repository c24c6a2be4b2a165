use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;

use crate::catalog::domain::model::CategoryEntity;
use crate::catalog::repository::CategoryRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::mem::{matches_predicate, paginate};

lazy_static! {
    static ref CATEGORIES: Mutex<HashMap<String, CategoryEntity>> = Mutex::new(HashMap::new());
}

#[derive(Debug, Default)]
pub struct MemoryCategoryRepository {}

impl MemoryCategoryRepository {
    pub fn new() -> Self {
        Self {}
    }

    fn table(&self) -> LibraryResult<MutexGuard<'static, HashMap<String, CategoryEntity>>> {
        CATEGORIES.lock().map_err(|err| LibraryError::runtime(
            format!("categories table lock poisoned {:?}", err).as_str(), None))
    }
}

#[async_trait]
impl Repository<CategoryEntity> for MemoryCategoryRepository {
    async fn create(&self, entity: &CategoryEntity) -> LibraryResult<usize> {
        let mut table = self.table()?;
        if table.contains_key(entity.category_id.as_str()) {
            return Err(LibraryError::validation(
                format!("category {} already exists", entity.category_id).as_str(), Some("409".to_string())));
        }
        table.insert(entity.category_id.clone(), entity.clone());
        Ok(1)
    }

    async fn update(&self, entity: &CategoryEntity) -> LibraryResult<usize> {
        let mut table = self.table()?;
        match table.get(entity.category_id.as_str()) {
            Some(existing) if existing.version == entity.version => {
                let mut updated = entity.clone();
                updated.version = entity.version + 1;
                updated.updated_at = Utc::now().naive_utc();
                table.insert(entity.category_id.clone(), updated);
                Ok(1)
            }
            Some(_) => Err(LibraryError::not_found(
                format!("stale version for category {}", entity.category_id).as_str())),
            None => Err(LibraryError::not_found(
                format!("category not found for {}", entity.category_id).as_str())),
        }
    }

    async fn get(&self, id: &str) -> LibraryResult<CategoryEntity> {
        let table = self.table()?;
        table.get(id).cloned().ok_or_else(|| LibraryError::not_found(
            format!("category not found for {}", id).as_str()))
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let mut table = self.table()?;
        match table.remove(id) {
            Some(_) => Ok(1),
            None => Err(LibraryError::not_found(format!("category not found for {}", id).as_str())),
        }
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<CategoryEntity>> {
        let table = self.table()?;
        let mut records: Vec<CategoryEntity> = Vec::new();
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

impl CategoryRepository for MemoryCategoryRepository {}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use crate::catalog::domain::model::CategoryEntity;
    use crate::catalog::repository::memory_category_repository::MemoryCategoryRepository;
    use crate::core::repository::Repository;

    #[tokio::test]
    async fn test_should_create_get_delete_category() {
        let repo = MemoryCategoryRepository::new();
        let category = CategoryEntity::new("history");
        let _ = repo.create(&category).await.expect("should create category");

        let loaded = repo.get(category.category_id.as_str()).await.expect("should return category");
        assert_eq!(category.name, loaded.name);

        let _ = repo.delete(category.category_id.as_str()).await.expect("should delete category");
        assert!(repo.get(category.category_id.as_str()).await.is_err());
    }

    #[tokio::test]
    async fn test_should_query_category_by_name() {
        let repo = MemoryCategoryRepository::new();
        let category = CategoryEntity::new("poetry");
        let _ = repo.create(&category).await.expect("should create category");

        let predicate = HashMap::from([("name".to_string(), "poetry".to_string())]);
        let res = repo.query(&predicate, None, 10).await.expect("should query categories");
        assert!(res.records.iter().any(|c| c.category_id == category.category_id));
    }
}
