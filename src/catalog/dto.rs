use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::catalog::domain::Book;
use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

// BookDto is the catalog view handed to callers and to the loan ledger.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BookDto {
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

impl BookDto {
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

impl Identifiable for BookDto {
    fn id(&self) -> String {
        self.book_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Book for BookDto {
    fn is_hidden(&self) -> bool {
        self.hidden
    }

    fn available(&self) -> i64 {
        self.available_quantity
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CategoryDto {
    pub category_id: String,
    pub version: i64,
    pub name: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl CategoryDto {
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
