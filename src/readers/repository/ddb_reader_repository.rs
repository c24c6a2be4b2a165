use std::cmp;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;

use crate::core::library::{LibraryError, LibraryResult, PaginatedResult, Role};
use crate::core::repository::Repository;
use crate::readers::domain::model::ReaderEntity;
use crate::readers::repository::ReaderRepository;
use crate::utils::ddb::{add_filter_expr, from_ddb, parse_date_attribute, parse_item, parse_number_attribute, parse_string_attribute, string_date, to_ddb_page};

#[derive(Debug)]
pub struct DDBReaderRepository {
    client: Client,
    table_name: String,
    index_name: String,
}

impl DDBReaderRepository {
    pub fn new(client: Client, table_name: &str, index_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
        }
    }
}

#[async_trait]
impl Repository<ReaderEntity> for DDBReaderRepository {
    async fn create(&self, entity: &ReaderEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let val = serde_json::to_value(entity)?;
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(reader_id)")
            .set_item(Some(parse_item(val)?))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn update(&self, entity: &ReaderEntity) -> LibraryResult<usize> {
        let now = Utc::now().naive_utc();
        let table_name: &str = self.table_name.as_ref();

        self.client
            .update_item()
            .table_name(table_name)
            .key("reader_id", AttributeValue::S(entity.reader_id.clone()))
            .update_expression("SET version = :version, email = :email, full_name = :full_name, phone = :phone, #role = :role, quota = :quota, current_borrowing = :current_borrowing, penalty_status = :penalty_status, updated_at = :updated_at")
            .expression_attribute_names("#role", "role")
            .expression_attribute_values(":old_version", AttributeValue::N(entity.version.to_string()))
            .expression_attribute_values(":version", AttributeValue::N((entity.version + 1).to_string()))
            .expression_attribute_values(":email", AttributeValue::S(entity.email.clone()))
            .expression_attribute_values(":full_name", AttributeValue::S(entity.full_name.clone()))
            .expression_attribute_values(":phone", AttributeValue::S(entity.phone.clone()))
            .expression_attribute_values(":role", AttributeValue::S(entity.role.to_string()))
            .expression_attribute_values(":quota", AttributeValue::N(entity.quota.to_string()))
            .expression_attribute_values(":current_borrowing", AttributeValue::N(entity.current_borrowing.to_string()))
            .expression_attribute_values(":penalty_status", AttributeValue::S(entity.penalty_status.clone()))
            .expression_attribute_values(":updated_at", string_date(now))
            .condition_expression("attribute_exists(version) AND version = :old_version")
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn get(&self, id: &str) -> LibraryResult<ReaderEntity> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .get_item()
            .table_name(table_name)
            .consistent_read(true)
            .key("reader_id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|err| LibraryError::database(format!("{:?}", err).as_str(), None, false))
            .and_then(|out| {
                if let Some(map) = out.item() {
                    Ok(ReaderEntity::from(map))
                } else {
                    Err(LibraryError::not_found(format!("reader not found for {}", id).as_str()))
                }
            })
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client.delete_item()
            .table_name(table_name)
            .key("reader_id", AttributeValue::S(id.to_string()))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<ReaderEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let index_name: &str = self.index_name.as_ref();
        let exclusive_start_key = to_ddb_page(page, predicate);
        if let Some(email) = predicate.get("email") {
            let mut request = self.client
                .query()
                .table_name(table_name)
                .index_name(index_name)
                .limit(cmp::min(page_size, 500) as i32)
                .consistent_read(false)
                .set_exclusive_start_key(exclusive_start_key)
                .key_condition_expression("email = :email")
                .expression_attribute_values(":email", AttributeValue::S(email.to_string()));
            let mut filter_expr = String::new();
            for (k, v) in predicate {
                if k != "email" {
                    let ks = add_filter_expr(k.as_str(), &mut filter_expr);
                    request = request.expression_attribute_values(format!(":{}", ks).as_str(), AttributeValue::S(v.to_string()));
                }
            }
            if !filter_expr.is_empty() {
                request = request.filter_expression(filter_expr);
            }
            request
                .send()
                .await.map_err(LibraryError::from).map(|req| {
                let records = req.items.as_ref().unwrap_or(&vec![]).iter()
                    .map(ReaderEntity::from).collect();
                from_ddb(page, page_size, req.last_evaluated_key(), records)
            })
        } else {
            let mut request = self.client
                .scan()
                .table_name(table_name)
                .limit(cmp::min(page_size, 500) as i32)
                .set_exclusive_start_key(exclusive_start_key);
            let mut filter_expr = String::new();
            for (k, v) in predicate {
                let ks = add_filter_expr(k.as_str(), &mut filter_expr);
                request = request.expression_attribute_values(format!(":{}", ks).as_str(), AttributeValue::S(v.to_string()));
            }
            if !filter_expr.is_empty() {
                request = request.filter_expression(filter_expr);
            }
            request
                .send()
                .await.map_err(LibraryError::from).map(|req| {
                let records = req.items.as_ref().unwrap_or(&vec![]).iter()
                    .map(ReaderEntity::from).collect();
                from_ddb(page, page_size, req.last_evaluated_key(), records)
            })
        }
    }
}

impl ReaderRepository for DDBReaderRepository {}

impl From<&HashMap<String, AttributeValue>> for ReaderEntity {
    fn from(map: &HashMap<String, AttributeValue>) -> Self {
        ReaderEntity {
            reader_id: parse_string_attribute("reader_id", map).unwrap_or_else(|| String::from("")),
            version: parse_number_attribute("version", map),
            email: parse_string_attribute("email", map).unwrap_or_else(|| String::from("")),
            full_name: parse_string_attribute("full_name", map).unwrap_or_else(|| String::from("")),
            phone: parse_string_attribute("phone", map).unwrap_or_else(|| String::from("")),
            role: Role::from(parse_string_attribute("role", map).unwrap_or_else(|| Role::Reader.to_string())),
            quota: parse_number_attribute("quota", map),
            current_borrowing: parse_number_attribute("current_borrowing", map),
            penalty_status: parse_string_attribute("penalty_status", map).unwrap_or_else(|| String::from("")),
            created_at: parse_date_attribute("created_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
            updated_at: parse_date_attribute("updated_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
        }
    }
}
