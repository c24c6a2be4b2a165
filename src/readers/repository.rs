pub mod ddb_reader_repository;
pub mod memory_reader_repository;

use crate::core::repository::Repository;
use crate::readers::domain::model::ReaderEntity;

pub trait ReaderRepository: Repository<ReaderEntity> {}
