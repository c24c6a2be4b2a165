use std::cmp;
use std::collections::HashMap;
use serde_json::Value;
use crate::core::library::PaginatedResult;

// Equality match of predicate attributes against the serialized form of an
// entity. The in-memory store supports plain attribute equality; ranged date
// scans are expressed directly by the repositories that need them.
pub(crate) fn matches_predicate(value: &Value, predicate: &HashMap<String, String>) -> bool {
    predicate.iter().all(|(k, want)| {
        match value.get(k) {
            Some(Value::String(s)) => s == want,
            Some(Value::Number(n)) => n.to_string() == *want,
            Some(Value::Bool(b)) => b.to_string() == *want,
            _ => false,
        }
    })
}

// Offset-based pagination; the page token is the numeric offset of the next
// record, mirroring the shape of the ddb last-evaluated-key token.
pub(crate) fn paginate<T>(page: Option<&str>, page_size: usize, records: Vec<T>) -> PaginatedResult<T> {
    let offset = page.and_then(|p| p.parse::<usize>().ok()).unwrap_or(0);
    let page_size = cmp::min(page_size, 500);
    let total = records.len();
    let start = cmp::min(offset, total);
    let end = cmp::min(start + page_size, total);
    let next_page = if end < total { Some(end.to_string()) } else { None };
    let window = records.into_iter().skip(start).take(end - start).collect();
    PaginatedResult::new(page, page_size, next_page, window)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use serde_json::json;
    use crate::utils::mem::{matches_predicate, paginate};

    #[tokio::test]
    async fn test_should_match_string_and_number_attributes() {
        let value = json!({"loan_status": "pending", "quota": 2, "hidden": false});
        assert!(matches_predicate(&value, &HashMap::from([
            ("loan_status".to_string(), "pending".to_string()),
            ("quota".to_string(), "2".to_string()),
        ])));
        assert!(!matches_predicate(&value, &HashMap::from([
            ("loan_status".to_string(), "returned".to_string()),
        ])));
        assert!(!matches_predicate(&value, &HashMap::from([
            ("missing".to_string(), "x".to_string()),
        ])));
    }

    #[tokio::test]
    async fn test_should_paginate_with_offset_tokens() {
        let records: Vec<i32> = (0..25).collect();
        let first = paginate(None, 10, records.clone());
        assert_eq!(10, first.records.len());
        assert_eq!(Some("10".to_string()), first.next_page);

        let second = paginate(first.next_page.as_deref(), 10, records.clone());
        assert_eq!(10, second.records.len());
        assert_eq!(Some("20".to_string()), second.next_page);

        let last = paginate(second.next_page.as_deref(), 10, records);
        assert_eq!(5, last.records.len());
        assert_eq!(None, last.next_page);
    }
}
