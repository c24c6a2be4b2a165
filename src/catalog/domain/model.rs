use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

// BookEntity abstracts a catalog title; available_quantity tracks copies on
// the shelf and is mutated only through conditional stock adjustments.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BookEntity {
    pub book_id: String,
    pub version: i64,
    pub code: String,
    pub title: String,
    pub author: String,
    pub category_id: String,
    pub total_quantity: i64,
    pub available_quantity: i64,
    pub hidden: bool,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl BookEntity {
    pub fn new(code: &str, title: &str, author: &str, category_id: &str, total_quantity: i64) -> Self {
        Self {
            book_id: Uuid::new_v4().to_string(),
            version: 0,
            code: code.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            category_id: category_id.to_string(),
            total_quantity,
            available_quantity: total_quantity,
            hidden: false,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl Identifiable for BookEntity {
    fn id(&self) -> String {
        self.book_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// CategoryEntity groups catalog titles for browsing.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CategoryEntity {
    pub category_id: String,
    pub version: i64,
    pub name: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl CategoryEntity {
    pub fn new(name: &str) -> Self {
        Self {
            category_id: Uuid::new_v4().to_string(),
            version: 0,
            name: name.to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl Identifiable for CategoryEntity {
    fn id(&self) -> String {
        self.category_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}
