use std::cmp;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;

use crate::catalog::domain::model::BookEntity;
use crate::catalog::repository::BookRepository;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::ddb::{add_filter_expr, from_ddb, parse_bool_attribute, parse_date_attribute, parse_item, parse_number_attribute, parse_string_attribute, string_date, to_ddb_page, update_conditional_check_failed};

#[derive(Debug)]
pub struct DDBBookRepository {
    client: Client,
    table_name: String,
    index_name: String,
}

impl DDBBookRepository {
    pub fn new(client: Client, table_name: &str, index_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
        }
    }
}

#[async_trait]
impl Repository<BookEntity> for DDBBookRepository {
    async fn create(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let val = serde_json::to_value(entity)?;
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(book_id)")
            .set_item(Some(parse_item(val)?))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn update(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let now = Utc::now().naive_utc();
        let table_name: &str = self.table_name.as_ref();

        self.client
            .update_item()
            .table_name(table_name)
            .key("book_id", AttributeValue::S(entity.book_id.clone()))
            .update_expression("SET version = :version, code = :code, title = :title, author = :author, category_id = :category_id, total_quantity = :total_quantity, available_quantity = :available_quantity, hidden = :hidden, updated_at = :updated_at")
            .expression_attribute_values(":old_version", AttributeValue::N(entity.version.to_string()))
            .expression_attribute_values(":version", AttributeValue::N((entity.version + 1).to_string()))
            .expression_attribute_values(":code", AttributeValue::S(entity.code.clone()))
            .expression_attribute_values(":title", AttributeValue::S(entity.title.clone()))
            .expression_attribute_values(":author", AttributeValue::S(entity.author.clone()))
            .expression_attribute_values(":category_id", AttributeValue::S(entity.category_id.clone()))
            .expression_attribute_values(":total_quantity", AttributeValue::N(entity.total_quantity.to_string()))
            .expression_attribute_values(":available_quantity", AttributeValue::N(entity.available_quantity.to_string()))
            .expression_attribute_values(":hidden", AttributeValue::Bool(entity.hidden))
            .expression_attribute_values(":updated_at", string_date(now))
            .condition_expression("attribute_exists(version) AND version = :old_version")
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn get(&self, id: &str) -> LibraryResult<BookEntity> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .get_item()
            .table_name(table_name)
            .consistent_read(true)
            .key("book_id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|err| LibraryError::database(format!("{:?}", err).as_str(), None, false))
            .and_then(|out| {
                if let Some(map) = out.item() {
                    Ok(BookEntity::from(map))
                } else {
                    Err(LibraryError::not_found(format!("book not found for {}", id).as_str()))
                }
            })
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client.delete_item()
            .table_name(table_name)
            .key("book_id", AttributeValue::S(id.to_string()))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let index_name: &str = self.index_name.as_ref();
        let exclusive_start_key = to_ddb_page(page, predicate);
        if let Some(code) = predicate.get("code") {
            let mut request = self.client
                .query()
                .table_name(table_name)
                .index_name(index_name)
                .limit(cmp::min(page_size, 500) as i32)
                .consistent_read(false)
                .set_exclusive_start_key(exclusive_start_key)
                .key_condition_expression("code = :code")
                .expression_attribute_values(":code", AttributeValue::S(code.to_string()));
            let mut filter_expr = String::new();
            for (k, v) in predicate {
                if k != "code" {
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
                    .map(BookEntity::from).collect();
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
                    .map(BookEntity::from).collect();
                from_ddb(page, page_size, req.last_evaluated_key(), records)
            })
        }
    }
}

#[async_trait]
impl BookRepository for DDBBookRepository {
    async fn adjust_available(&self, id: &str, delta: i64) -> LibraryResult<BookEntity> {
        let table_name: &str = self.table_name.as_ref();
        // optimistic read-modify-write; version condition guards against a
        // concurrent writer between the read and the update
        for _attempt in 0..3 {
            let book = self.get(id).await?;
            let next = book.available_quantity + delta;
            if next < 0 {
                return Err(LibraryError::stock_unavailable(
                    format!("no available copy of book {}", id).as_str()));
            }
            if next > book.total_quantity {
                return Err(LibraryError::invalid_state(
                    format!("available quantity would exceed total for book {}", id).as_str()));
            }
            let res = self.client
                .update_item()
                .table_name(table_name)
                .key("book_id", AttributeValue::S(book.book_id.clone()))
                .update_expression("SET version = :version, available_quantity = :available_quantity, updated_at = :updated_at")
                .expression_attribute_values(":old_version", AttributeValue::N(book.version.to_string()))
                .expression_attribute_values(":version", AttributeValue::N((book.version + 1).to_string()))
                .expression_attribute_values(":available_quantity", AttributeValue::N(next.to_string()))
                .expression_attribute_values(":updated_at", string_date(Utc::now().naive_utc()))
                .condition_expression("attribute_exists(version) AND version = :old_version")
                .send()
                .await;
            match res {
                Ok(_) => { return self.get(id).await; }
                Err(err) => {
                    if update_conditional_check_failed(&err) {
                        continue;
                    }
                    return Err(LibraryError::from(err));
                }
            }
        }
        Err(LibraryError::database(
            format!("stock adjustment contention for book {}", id).as_str(), None, true))
    }
}

impl From<&HashMap<String, AttributeValue>> for BookEntity {
    fn from(map: &HashMap<String, AttributeValue>) -> Self {
        BookEntity {
            book_id: parse_string_attribute("book_id", map).unwrap_or_else(|| String::from("")),
            version: parse_number_attribute("version", map),
            code: parse_string_attribute("code", map).unwrap_or_else(|| String::from("")),
            title: parse_string_attribute("title", map).unwrap_or_else(|| String::from("")),
            author: parse_string_attribute("author", map).unwrap_or_else(|| String::from("")),
            category_id: parse_string_attribute("category_id", map).unwrap_or_else(|| String::from("")),
            total_quantity: parse_number_attribute("total_quantity", map),
            available_quantity: parse_number_attribute("available_quantity", map),
            hidden: parse_bool_attribute("hidden", map),
            created_at: parse_date_attribute("created_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
            updated_at: parse_date_attribute("updated_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
        }
    }
}
