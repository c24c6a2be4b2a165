use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::core::library::Role;
use crate::readers::domain::Reader;
use crate::utils::date::serializer;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ReaderDto {
    pub reader_id: String,
    pub version: i64,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub role: Role,
    pub quota: i64,
    pub current_borrowing: i64,
    pub penalty_status: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl ReaderDto {
    pub fn new(email: &str, full_name: &str, quota: i64) -> Self {
        Self {
            reader_id: Uuid::new_v4().to_string(),
            version: 0,
            email: email.to_string(),
            full_name: full_name.to_string(),
            phone: "".to_string(),
            role: Role::Reader,
            quota,
            current_borrowing: 0,
            penalty_status: "".to_string(),
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl Identifiable for ReaderDto {
    fn id(&self) -> String {
        self.reader_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

impl Reader for ReaderDto {
    fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    fn is_role(&self, match_role: Role) -> bool {
        self.role == match_role
    }

    fn quota(&self) -> i64 {
        self.quota
    }

    fn is_penalized(&self) -> bool {
        !self.penalty_status.is_empty()
    }
}
