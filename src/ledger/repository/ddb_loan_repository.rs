use std::cmp;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{NaiveDateTime, Utc};

use crate::core::library::{LibraryError, LibraryResult, LoanStatus, PaginatedResult, Role};
use crate::core::repository::Repository;
use crate::ledger::domain::model::LoanEntity;
use crate::ledger::repository::LoanRepository;
use crate::utils::ddb::{add_filter_expr, delete_conditional_check_failed, from_ddb, opt_string_date, parse_date_attribute, parse_item, parse_number_attribute, parse_string_attribute, string_date, to_ddb_page, update_conditional_check_failed};

#[derive(Debug)]
pub struct DDBLoanRepository {
    client: Client,
    table_name: String,
    index_name: String,
}

impl DDBLoanRepository {
    pub fn new(client: Client, table_name: &str, index_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
        }
    }
}

#[async_trait]
impl Repository<LoanEntity> for DDBLoanRepository {
    async fn create(&self, entity: &LoanEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let val = serde_json::to_value(entity)?;
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(loan_id)")
            .set_item(Some(parse_item(val)?))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn update(&self, entity: &LoanEntity) -> LibraryResult<usize> {
        let now = Utc::now().naive_utc();
        let table_name: &str = self.table_name.as_ref();

        self.client
            .update_item()
            .table_name(table_name)
            .key("loan_id", AttributeValue::S(entity.loan_id.clone()))
            .update_expression("SET version = :version, reader_id = :reader_id, book_id = :book_id, loan_status = :loan_status, requested_by = :requested_by, borrow_at = :borrow_at, due_at = :due_at, returned_at = :returned_at, approved_at = :approved_at, overdue_note = :overdue_note, updated_at = :updated_at")
            .expression_attribute_values(":old_version", AttributeValue::N(entity.version.to_string()))
            .expression_attribute_values(":version", AttributeValue::N((entity.version + 1).to_string()))
            .expression_attribute_values(":reader_id", AttributeValue::S(entity.reader_id.clone()))
            .expression_attribute_values(":book_id", AttributeValue::S(entity.book_id.clone()))
            .expression_attribute_values(":loan_status", AttributeValue::S(entity.loan_status.to_string()))
            .expression_attribute_values(":requested_by", AttributeValue::S(entity.requested_by.to_string()))
            .expression_attribute_values(":borrow_at", string_date(entity.borrow_at))
            .expression_attribute_values(":due_at", string_date(entity.due_at))
            .expression_attribute_values(":returned_at", opt_string_date(entity.returned_at))
            .expression_attribute_values(":approved_at", opt_string_date(entity.approved_at))
            .expression_attribute_values(":overdue_note", AttributeValue::S(entity.overdue_note.clone()))
            .expression_attribute_values(":updated_at", string_date(now))
            .condition_expression("attribute_exists(version) AND version = :old_version")
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn get(&self, id: &str) -> LibraryResult<LoanEntity> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .get_item()
            .table_name(table_name)
            .consistent_read(true)
            .key("loan_id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|err| LibraryError::database(format!("{:?}", err).as_str(), None, false))
            .and_then(|out| {
                if let Some(map) = out.item() {
                    Ok(LoanEntity::from(map))
                } else {
                    Err(LibraryError::not_found(format!("loan not found for {}", id).as_str()))
                }
            })
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client.delete_item()
            .table_name(table_name)
            .key("loan_id", AttributeValue::S(id.to_string()))
            .send()
            .await.map(|_| 1).map_err(LibraryError::from)
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let index_name: &str = self.index_name.as_ref();
        let exclusive_start_key = to_ddb_page(page, predicate);
        if let Some(reader_id) = predicate.get("reader_id") {
            let mut request = self.client
                .query()
                .table_name(table_name)
                .index_name(index_name)
                .limit(cmp::min(page_size, 500) as i32)
                .consistent_read(false)
                .set_exclusive_start_key(exclusive_start_key)
                .key_condition_expression("reader_id = :reader_id")
                .expression_attribute_values(":reader_id", AttributeValue::S(reader_id.to_string()));
            let mut filter_expr = String::new();
            for (k, v) in predicate {
                if k != "reader_id" {
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
                    .map(LoanEntity::from).collect();
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
                    .map(LoanEntity::from).collect();
                from_ddb(page, page_size, req.last_evaluated_key(), records)
            })
        }
    }
}

#[async_trait]
impl LoanRepository for DDBLoanRepository {
    async fn approve(&self, id: &str, approved_at: NaiveDateTime) -> LibraryResult<LoanEntity> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client
            .update_item()
            .table_name(table_name)
            .key("loan_id", AttributeValue::S(id.to_string()))
            .update_expression("SET version = version + :one, loan_status = :borrowing, approved_at = :approved_at, updated_at = :updated_at")
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .expression_attribute_values(":pending", AttributeValue::S(LoanStatus::Pending.to_string()))
            .expression_attribute_values(":borrowing", AttributeValue::S(LoanStatus::Borrowing.to_string()))
            .expression_attribute_values(":approved_at", string_date(approved_at))
            .expression_attribute_values(":updated_at", string_date(Utc::now().naive_utc()))
            .condition_expression("attribute_exists(version) AND loan_status = :pending")
            .send()
            .await;
        match res {
            Ok(_) => self.get(id).await,
            Err(err) => {
                if update_conditional_check_failed(&err) {
                    // distinguish a missing loan from one already acted on
                    let _ = self.get(id).await?;
                    return Err(LibraryError::invalid_state(
                        format!("loan {} is not pending", id).as_str()));
                }
                Err(LibraryError::from(err))
            }
        }
    }

    async fn close(&self, id: &str, returned_at: NaiveDateTime,
                   overdue_note: Option<&str>) -> LibraryResult<LoanEntity> {
        let table_name: &str = self.table_name.as_ref();
        let mut update_expr = String::from(
            "SET version = version + :one, loan_status = :returned, returned_at = :returned_at, updated_at = :updated_at");
        let mut request = self.client
            .update_item()
            .table_name(table_name)
            .key("loan_id", AttributeValue::S(id.to_string()))
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .expression_attribute_values(":borrowing", AttributeValue::S(LoanStatus::Borrowing.to_string()))
            .expression_attribute_values(":overdue", AttributeValue::S(LoanStatus::Overdue.to_string()))
            .expression_attribute_values(":returned", AttributeValue::S(LoanStatus::Returned.to_string()))
            .expression_attribute_values(":returned_at", string_date(returned_at))
            .expression_attribute_values(":updated_at", string_date(Utc::now().naive_utc()))
            .condition_expression("attribute_exists(version) AND (loan_status = :borrowing OR loan_status = :overdue)");
        if let Some(note) = overdue_note {
            update_expr.push_str(", overdue_note = :overdue_note");
            request = request.expression_attribute_values(":overdue_note", AttributeValue::S(note.to_string()));
        }
        let res = request.update_expression(update_expr).send().await;
        match res {
            Ok(_) => self.get(id).await,
            Err(err) => {
                if update_conditional_check_failed(&err) {
                    let loan = self.get(id).await?;
                    if loan.returned_at.is_some() {
                        return Err(LibraryError::invalid_state(
                            format!("loan {} is already returned", id).as_str()));
                    }
                    return Err(LibraryError::invalid_state(
                        format!("loan {} has not been approved", id).as_str()));
                }
                Err(LibraryError::from(err))
            }
        }
    }

    async fn delete_pending(&self, id: &str) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client.delete_item()
            .table_name(table_name)
            .key("loan_id", AttributeValue::S(id.to_string()))
            .expression_attribute_values(":pending", AttributeValue::S(LoanStatus::Pending.to_string()))
            .condition_expression("attribute_exists(loan_id) AND loan_status = :pending")
            .send()
            .await;
        match res {
            Ok(_) => Ok(1),
            Err(err) => {
                if delete_conditional_check_failed(&err) {
                    let _ = self.get(id).await?;
                    return Err(LibraryError::invalid_state(
                        format!("loan {} is not pending", id).as_str()));
                }
                Err(LibraryError::from(err))
            }
        }
    }

    async fn mark_overdue(&self, id: &str) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let res = self.client
            .update_item()
            .table_name(table_name)
            .key("loan_id", AttributeValue::S(id.to_string()))
            .update_expression("SET version = version + :one, loan_status = :overdue, updated_at = :updated_at")
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .expression_attribute_values(":borrowing", AttributeValue::S(LoanStatus::Borrowing.to_string()))
            .expression_attribute_values(":overdue", AttributeValue::S(LoanStatus::Overdue.to_string()))
            .expression_attribute_values(":updated_at", string_date(Utc::now().naive_utc()))
            .condition_expression("attribute_exists(version) AND loan_status = :borrowing")
            .send()
            .await;
        match res {
            Ok(_) => Ok(1),
            Err(err) => {
                if update_conditional_check_failed(&err) {
                    let _ = self.get(id).await?;
                    return Ok(0);
                }
                Err(LibraryError::from(err))
            }
        }
    }
}

impl From<&HashMap<String, AttributeValue>> for LoanEntity {
    fn from(map: &HashMap<String, AttributeValue>) -> Self {
        LoanEntity {
            loan_id: parse_string_attribute("loan_id", map).unwrap_or_else(|| String::from("")),
            version: parse_number_attribute("version", map),
            reader_id: parse_string_attribute("reader_id", map).unwrap_or_else(|| String::from("")),
            book_id: parse_string_attribute("book_id", map).unwrap_or_else(|| String::from("")),
            loan_status: LoanStatus::from(parse_string_attribute("loan_status", map)
                .unwrap_or_else(|| LoanStatus::Pending.to_string())),
            requested_by: Role::from(parse_string_attribute("requested_by", map)
                .unwrap_or_else(|| Role::Reader.to_string())),
            borrow_at: parse_date_attribute("borrow_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
            due_at: parse_date_attribute("due_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
            returned_at: parse_date_attribute("returned_at", map),
            approved_at: parse_date_attribute("approved_at", map),
            overdue_note: parse_string_attribute("overdue_note", map).unwrap_or_else(|| String::from("")),
            created_at: parse_date_attribute("created_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
            updated_at: parse_date_attribute("updated_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
        }
    }
}
