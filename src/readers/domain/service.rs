use std::collections::HashMap;
use async_trait::async_trait;
use crate::core::events::DomainEvent;
use crate::core::library::{LibraryError, LibraryResult};
use crate::gateway::events::EventPublisher;
use crate::readers::domain::ReaderService;
use crate::readers::domain::model::ReaderEntity;
use crate::readers::dto::ReaderDto;
use crate::readers::repository::ReaderRepository;

pub struct ReaderServiceImpl {
    reader_repository: Box<dyn ReaderRepository>,
    events_publisher: Box<dyn EventPublisher>,
}

impl ReaderServiceImpl {
    pub fn new(reader_repository: Box<dyn ReaderRepository>,
               events_publisher: Box<dyn EventPublisher>) -> Self {
        Self {
            reader_repository,
            events_publisher,
        }
    }

    // read-modify-write with a bounded retry; the version condition on update
    // rejects writes that raced with another mutation
    async fn apply<F>(&self, id: &str, mutate: F) -> LibraryResult<ReaderDto>
        where F: Fn(&mut ReaderEntity) + Sync + Send {
        for _attempt in 0..3 {
            let mut reader = self.reader_repository.get(id).await?;
            mutate(&mut reader);
            match self.reader_repository.update(&reader).await {
                Ok(_) => { return self.find_reader_by_id(id).await; }
                Err(LibraryError::NotFound { .. }) => { continue; }
                Err(err) => { return Err(err); }
            }
        }
        Err(LibraryError::database(
            format!("update contention for reader {}", id).as_str(), None, true))
    }
}

#[async_trait]
impl ReaderService for ReaderServiceImpl {
    async fn add_reader(&self, reader: &ReaderDto) -> LibraryResult<()> {
        self.reader_repository.create(&ReaderEntity::from(reader)).await?;
        let _ = self.events_publisher.publish(&DomainEvent::added(
            "reader_added", "readers", reader.reader_id.as_str(), &HashMap::new(), &reader.clone())?).await?;
        Ok(())
    }

    async fn update_reader(&self, reader: &ReaderDto) -> LibraryResult<()> {
        self.reader_repository.update(&ReaderEntity::from(reader)).await?;
        let _ = self.events_publisher.publish(&DomainEvent::updated(
            "reader_updated", "readers", reader.reader_id.as_str(), &HashMap::new(), &reader.clone())?).await?;
        Ok(())
    }

    async fn remove_reader(&self, id: &str) -> LibraryResult<()> {
        self.reader_repository.delete(id).await?;
        let _ = self.events_publisher.publish(&DomainEvent::deleted(
            "reader_removed", "readers", id, &HashMap::new(), &id.to_string())?).await?;
        Ok(())
    }

    async fn find_reader_by_id(&self, id: &str) -> LibraryResult<ReaderDto> {
        self.reader_repository.get(id).await.map(|r| ReaderDto::from(&r))
    }

    async fn find_reader_by_email(&self, email: &str) -> LibraryResult<Vec<ReaderDto>> {
        let res = self.reader_repository.query(
            &HashMap::from([("email".to_string(), email.to_string())]), None, 100).await?;
        Ok(res.records.iter().map(ReaderDto::from).collect())
    }

    async fn set_penalty_status(&self, id: &str, text: &str) -> LibraryResult<ReaderDto> {
        let text = text.to_string();
        let updated = self.apply(id, move |reader| {
            reader.penalty_status = text.clone();
        }).await?;
        let _ = self.events_publisher.publish(&DomainEvent::updated(
            "reader_penalized", "readers", id, &HashMap::new(), &updated.clone())?).await?;
        Ok(updated)
    }

    async fn set_current_borrowing(&self, id: &str, count: i64) -> LibraryResult<ReaderDto> {
        let updated = self.apply(id, move |reader| {
            reader.current_borrowing = count;
        }).await?;
        let _ = self.events_publisher.publish(&DomainEvent::updated(
            "reader_borrowing_synced", "readers", id, &HashMap::new(), &updated.clone())?).await?;
        Ok(updated)
    }
}

impl From<&ReaderEntity> for ReaderDto {
    fn from(other: &ReaderEntity) -> Self {
        Self {
            reader_id: other.reader_id.to_string(),
            version: other.version,
            email: other.email.to_string(),
            full_name: other.full_name.to_string(),
            phone: other.phone.to_string(),
            role: other.role,
            quota: other.quota,
            current_borrowing: other.current_borrowing,
            penalty_status: other.penalty_status.to_string(),
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

impl From<&ReaderDto> for ReaderEntity {
    fn from(other: &ReaderDto) -> Self {
        Self {
            reader_id: other.reader_id.to_string(),
            version: other.version,
            email: other.email.to_string(),
            full_name: other.full_name.to_string(),
            phone: other.phone.to_string(),
            role: other.role,
            quota: other.quota,
            current_borrowing: other.current_borrowing,
            penalty_status: other.penalty_status.to_string(),
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}
