use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

// Sub-kind for quota failures: a reader may be over quota on active loans
// alone, or only once queued pending requests are counted in.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum QuotaExceededKind {
    ActiveOverQuota,
    ActivePlusPendingOverQuota,
}

impl Display for QuotaExceededKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            QuotaExceededKind::ActiveOverQuota => write!(f, "ActiveOverQuota"),
            QuotaExceededKind::ActivePlusPendingOverQuota => write!(f, "ActivePlusPendingOverQuota"),
        }
    }
}

#[derive(Debug)]
pub enum LibraryError {
    Database {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    NotFound {
        message: String,
    },
    // Approval or direct borrow attempted while the book has no available copy.
    StockUnavailable {
        message: String,
    },
    // Eligibility check failure; kind distinguishes the two counting rules.
    QuotaExceeded {
        message: String,
        kind: QuotaExceededKind,
    },
    // Command applied to a loan in the wrong lifecycle state, e.g. returning
    // an already-returned loan or approving a non-pending one.
    InvalidState {
        message: String,
    },
    Validation {
        message: String,
        reason_code: Option<String>,
    },
    Serialization {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
    },
}

impl LibraryError {
    pub fn database(message: &str, reason_code: Option<String>, retryable: bool) -> LibraryError {
        LibraryError::Database { message: message.to_string(), reason_code, retryable }
    }

    pub fn not_found(message: &str) -> LibraryError {
        LibraryError::NotFound { message: message.to_string() }
    }

    pub fn stock_unavailable(message: &str) -> LibraryError {
        LibraryError::StockUnavailable { message: message.to_string() }
    }

    pub fn quota_exceeded(message: &str, kind: QuotaExceededKind) -> LibraryError {
        LibraryError::QuotaExceeded { message: message.to_string(), kind }
    }

    pub fn invalid_state(message: &str) -> LibraryError {
        LibraryError::InvalidState { message: message.to_string() }
    }

    pub fn validation(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Validation { message: message.to_string(), reason_code }
    }

    pub fn serialization(message: &str) -> LibraryError {
        LibraryError::Serialization { message: message.to_string() }
    }

    pub fn runtime(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Runtime { message: message.to_string(), reason_code }
    }

    pub fn database_or_not_found(message: &str, reason: Option<String>, retryable: bool) -> LibraryError {
        if let Some(ref reason_val) = reason {
            if reason_val.as_str().contains("404") || reason_val.as_str().contains("ConditionalCheckFailed") {
                return LibraryError::not_found(
                    format!("not found error {:?} {:?}", message, reason).as_str());
            }
        }
        LibraryError::database(
            format!("database error {:?} {:?}", message, reason).as_str(), reason, retryable)
    }

    pub fn retryable(&self) -> bool {
        match self {
            LibraryError::Database { retryable, .. } => { *retryable }
            LibraryError::NotFound { .. } => { false }
            LibraryError::StockUnavailable { .. } => { false }
            LibraryError::QuotaExceeded { .. } => { false }
            LibraryError::InvalidState { .. } => { false }
            LibraryError::Validation { .. } => { false }
            LibraryError::Serialization { .. } => { false }
            LibraryError::Runtime { .. } => { false }
        }
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::runtime(
            format!("serde io {:?}", err).as_str(), None)
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::serialization(
            format!("serde json parsing {:?}", err).as_str())
    }
}

impl From<String> for LibraryError {
    fn from(err: String) -> Self {
        LibraryError::serialization(
            format!("serde parsing {:?}", err).as_str())
    }
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Database { message, reason_code, retryable } => {
                write!(f, "{} {:?} {}", message, reason_code, retryable)
            }
            LibraryError::NotFound { message } => {
                write!(f, "{}", message)
            }
            LibraryError::StockUnavailable { message } => {
                write!(f, "{}", message)
            }
            LibraryError::QuotaExceeded { message, kind } => {
                write!(f, "{} {}", message, kind)
            }
            LibraryError::InvalidState { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Validation { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
            LibraryError::Serialization { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Runtime { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
        }
    }
}

/// A specialized Result type for ledger and store operations.
pub type LibraryResult<T> = Result<T, LibraryError>;

// It defines abstraction for paginated result
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    // The page number or token
    pub page: Option<String>,
    // page size
    pub page_size: usize,
    // Next page if available
    pub next_page: Option<String>,
    // list of records
    pub records: Vec<T>,
}

impl<T> PaginatedResult<T> {
    pub fn new(page: Option<&str>, page_size: usize,
               next_page: Option<String>, records: Vec<T>) -> Self {
        PaginatedResult {
            page: page.map(str::to_string),
            page_size,
            next_page,
            records,
        }
    }
}

// Stored lifecycle status of a loan. Overdue is also derivable at read time
// from the due date; see LoanEntity::effective_status.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Borrowing,
    Overdue,
    Returned,
}

impl From<String> for LoanStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => LoanStatus::Pending,
            "borrowing" => LoanStatus::Borrowing,
            "overdue" => LoanStatus::Overdue,
            "returned" => LoanStatus::Returned,
            _ => LoanStatus::Pending,
        }
    }
}

impl Display for LoanStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LoanStatus::Pending => write!(f, "pending"),
            LoanStatus::Borrowing => write!(f, "borrowing"),
            LoanStatus::Overdue => write!(f, "overdue"),
            LoanStatus::Returned => write!(f, "returned"),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Reader,
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "admin" => Role::Admin,
            "reader" => Role::Reader,
            _ => Role::Reader,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Reader => write!(f, "reader"),
        }
    }
}

// Penalty annotations are free text on the reader; the kind only drives the
// formatted description.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum PenaltyKind {
    Monetary,
    Suspension,
}

impl Display for PenaltyKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            PenaltyKind::Monetary => write!(f, "Monetary"),
            PenaltyKind::Suspension => write!(f, "Suspension"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::library::{LibraryError, LoanStatus, QuotaExceededKind, Role};

    #[tokio::test]
    async fn test_should_create_database_error() {
        assert!(matches!(LibraryError::database("test", None, false), LibraryError::Database{ message: _, reason_code: _, retryable: _ }));
    }

    #[tokio::test]
    async fn test_should_create_not_found_error() {
        assert!(matches!(LibraryError::not_found("test"), LibraryError::NotFound{ message: _ }));
    }

    #[tokio::test]
    async fn test_should_create_stock_unavailable_error() {
        assert!(matches!(LibraryError::stock_unavailable("test"), LibraryError::StockUnavailable{ message: _ }));
    }

    #[tokio::test]
    async fn test_should_create_quota_exceeded_error() {
        assert!(matches!(LibraryError::quota_exceeded("test", QuotaExceededKind::ActiveOverQuota),
            LibraryError::QuotaExceeded{ message: _, kind: QuotaExceededKind::ActiveOverQuota }));
        assert!(matches!(LibraryError::quota_exceeded("test", QuotaExceededKind::ActivePlusPendingOverQuota),
            LibraryError::QuotaExceeded{ message: _, kind: QuotaExceededKind::ActivePlusPendingOverQuota }));
    }

    #[tokio::test]
    async fn test_should_create_invalid_state_error() {
        assert!(matches!(LibraryError::invalid_state("test"), LibraryError::InvalidState{ message: _ }));
    }

    #[tokio::test]
    async fn test_should_create_validation_error() {
        assert!(matches!(LibraryError::validation("test", None), LibraryError::Validation{ message: _, reason_code: _ }));
    }

    #[tokio::test]
    async fn test_should_create_serialization_error() {
        assert!(matches!(LibraryError::serialization("test"), LibraryError::Serialization{ message: _ }));
    }

    #[tokio::test]
    async fn test_should_create_runtime_error() {
        assert!(matches!(LibraryError::runtime("test", None), LibraryError::Runtime{ message: _, reason_code: _ }));
    }

    #[tokio::test]
    async fn test_should_create_database_or_not_found_error() {
        assert!(matches!(LibraryError::database_or_not_found("test", Some("404".to_string()), false), LibraryError::NotFound{ message: _ }));
        assert!(matches!(LibraryError::database_or_not_found("test", Some("500".to_string()), false), LibraryError::Database{ message: _, reason_code: _, retryable: _ }));
        assert!(matches!(LibraryError::database_or_not_found("test", None, true), LibraryError::Database{ message: _, reason_code: _, retryable: _ }));
    }

    #[tokio::test]
    async fn test_should_create_retryable_error() {
        assert_eq!(false, LibraryError::database("test", None, false).retryable());
        assert_eq!(true, LibraryError::database("test", None, true).retryable());
        assert_eq!(false, LibraryError::not_found("test").retryable());
        assert_eq!(false, LibraryError::stock_unavailable("test").retryable());
        assert_eq!(false, LibraryError::quota_exceeded("test", QuotaExceededKind::ActiveOverQuota).retryable());
        assert_eq!(false, LibraryError::invalid_state("test").retryable());
        assert_eq!(false, LibraryError::validation("test", None).retryable());
        assert_eq!(false, LibraryError::serialization("test").retryable());
        assert_eq!(false, LibraryError::runtime("test", None).retryable());
    }

    #[tokio::test]
    async fn test_should_format_loan_status() {
        let statuses = vec![
            LoanStatus::Pending,
            LoanStatus::Borrowing,
            LoanStatus::Overdue,
            LoanStatus::Returned,
        ];
        for status in statuses {
            let str = status.to_string();
            let str_status = LoanStatus::from(str);
            assert_eq!(status, str_status);
        }
    }

    #[tokio::test]
    async fn test_should_format_role() {
        for role in [Role::Admin, Role::Reader] {
            assert_eq!(role, Role::from(role.to_string()));
        }
    }
}
