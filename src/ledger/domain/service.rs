use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};

use crate::catalog::domain::{Book, CatalogService};
use crate::core::domain::Configuration;
use crate::core::events::DomainEvent;
use crate::core::library::{LibraryError, LibraryResult, LoanStatus, PaginatedResult, PenaltyKind, QuotaExceededKind};
use crate::gateway::events::EventPublisher;
use crate::ledger::domain::LoanService;
use crate::ledger::domain::model::LoanEntity;
use crate::ledger::dto::LoanDto;
use crate::ledger::repository::LoanRepository;
use crate::readers::domain::ReaderService;
use crate::readers::dto::ReaderDto;
use crate::utils::date;

pub struct LoanServiceImpl {
    loan_days: i64,
    loan_repository: Box<dyn LoanRepository>,
    reader_service: Box<dyn ReaderService>,
    catalog_service: Box<dyn CatalogService>,
    events_publisher: Box<dyn EventPublisher>,
}

impl LoanServiceImpl {
    pub fn new(config: &Configuration, loan_repository: Box<dyn LoanRepository>,
               reader_service: Box<dyn ReaderService>, catalog_service: Box<dyn CatalogService>,
               events_publisher: Box<dyn EventPublisher>) -> Self {
        Self {
            loan_days: config.loan_days,
            loan_repository,
            reader_service,
            catalog_service,
            events_publisher,
        }
    }

    fn due_or_default(&self, due_at: Option<NaiveDateTime>) -> NaiveDateTime {
        due_at.unwrap_or_else(|| Utc::now().naive_utc() + Duration::days(self.loan_days))
    }

    async fn find_borrowable_book(&self, book_id: &str) -> LibraryResult<()> {
        let book = self.catalog_service.find_book_by_id(book_id).await?;
        if book.is_hidden() {
            return Err(LibraryError::validation(
                format!("book {} is not open for borrowing", book_id).as_str(), Some("400".to_string())));
        }
        Ok(())
    }

    // active = loans a reader currently holds (borrowing or overdue by the
    // read-time projection), pending = requests awaiting a librarian
    async fn loan_counts(&self, reader_id: &str) -> LibraryResult<(i64, i64)> {
        let today = date::today();
        let res = self.loan_repository.query(
            &HashMap::from([("reader_id".to_string(), reader_id.to_string())]), None, 500).await?;
        let mut active = 0;
        let mut pending = 0;
        for loan in res.records.iter() {
            match loan.effective_status(today) {
                LoanStatus::Borrowing | LoanStatus::Overdue => active += 1,
                LoanStatus::Pending => pending += 1,
                LoanStatus::Returned => {}
            }
        }
        Ok((active, pending))
    }

    // current_borrowing on the reader is a materialized count; recount after
    // every command that opens or closes a loan
    async fn sync_current_borrowing(&self, reader_id: &str) -> LibraryResult<()> {
        let (active, _) = self.loan_counts(reader_id).await?;
        let _ = self.reader_service.set_current_borrowing(reader_id, active).await?;
        Ok(())
    }

    fn to_page(&self, res: PaginatedResult<LoanEntity>,
               page: Option<&str>, page_size: usize) -> PaginatedResult<LoanDto> {
        let records = res.records.iter().map(LoanDto::from).collect();
        PaginatedResult::new(page, page_size, res.next_page, records)
    }
}

#[async_trait]
impl LoanService for LoanServiceImpl {
    async fn request_loan(&self, reader_id: &str, book_id: &str,
                          due_at: Option<NaiveDateTime>) -> LibraryResult<LoanDto> {
        let _ = self.reader_service.find_reader_by_id(reader_id).await?;
        self.find_borrowable_book(book_id).await?;
        self.check_eligibility(reader_id).await?;

        let loan = LoanEntity::pending(reader_id, book_id, self.due_or_default(due_at));
        self.loan_repository.create(&loan).await?;
        let dto = LoanDto::from(&loan);
        let _ = self.events_publisher.publish(&DomainEvent::added(
            "loan_requested", "loans", dto.loan_id.as_str(), &HashMap::new(), &dto.clone())?).await?;
        Ok(dto)
    }

    async fn borrow_direct(&self, reader_id: &str, book_id: &str,
                           due_at: Option<NaiveDateTime>) -> LibraryResult<LoanDto> {
        let _ = self.reader_service.find_reader_by_id(reader_id).await?;
        self.find_borrowable_book(book_id).await?;
        self.check_eligibility(reader_id).await?;

        // take the copy first; a failed decrement aborts before any loan exists
        let _ = self.catalog_service.adjust_available(book_id, -1).await?;
        let loan = LoanEntity::borrowing(reader_id, book_id, self.due_or_default(due_at));
        if let Err(err) = self.loan_repository.create(&loan).await {
            let _ = self.catalog_service.adjust_available(book_id, 1).await;
            return Err(err);
        }
        self.sync_current_borrowing(reader_id).await?;
        let dto = LoanDto::from(&loan);
        let _ = self.events_publisher.publish(&DomainEvent::added(
            "loan_opened", "loans", dto.loan_id.as_str(), &HashMap::new(), &dto.clone())?).await?;
        Ok(dto)
    }

    async fn approve_loan(&self, id: &str) -> LibraryResult<LoanDto> {
        let loan = self.loan_repository.get(id).await?;
        if loan.loan_status != LoanStatus::Pending {
            return Err(LibraryError::invalid_state(
                format!("loan {} is not pending", id).as_str()));
        }
        // decrement first so a failed CAS leaves the pending request intact;
        // the status flip below compensates the stock if it loses a race
        let _ = self.catalog_service.adjust_available(loan.book_id.as_str(), -1).await?;
        let approved = match self.loan_repository.approve(id, Utc::now().naive_utc()).await {
            Ok(approved) => approved,
            Err(err) => {
                let _ = self.catalog_service.adjust_available(loan.book_id.as_str(), 1).await;
                return Err(err);
            }
        };
        self.sync_current_borrowing(approved.reader_id.as_str()).await?;
        let dto = LoanDto::from(&approved);
        let _ = self.events_publisher.publish(&DomainEvent::updated(
            "loan_approved", "loans", dto.loan_id.as_str(), &HashMap::new(), &dto.clone())?).await?;
        Ok(dto)
    }

    async fn reject_loan(&self, id: &str) -> LibraryResult<()> {
        let _ = self.loan_repository.delete_pending(id).await?;
        let _ = self.events_publisher.publish(&DomainEvent::deleted(
            "loan_rejected", "loans", id, &HashMap::new(), &id.to_string())?).await?;
        Ok(())
    }

    async fn return_loan(&self, id: &str, overdue_note: Option<&str>) -> LibraryResult<LoanDto> {
        let closed = self.loan_repository.close(id, Utc::now().naive_utc(), overdue_note).await?;
        let _ = self.catalog_service.adjust_available(closed.book_id.as_str(), 1).await?;
        self.sync_current_borrowing(closed.reader_id.as_str()).await?;
        let dto = LoanDto::from(&closed);
        let _ = self.events_publisher.publish(&DomainEvent::updated(
            "loan_returned", "loans", dto.loan_id.as_str(), &HashMap::new(), &dto.clone())?).await?;
        Ok(dto)
    }

    async fn assign_penalty(&self, reader_id: &str, kind: PenaltyKind,
                            magnitude: i64) -> LibraryResult<ReaderDto> {
        let description = match kind {
            PenaltyKind::Monetary => format!("Monetary penalty: {} VND", magnitude),
            PenaltyKind::Suspension => format!("Suspended from borrowing for {} days", magnitude),
        };
        self.reader_service.set_penalty_status(reader_id, description.as_str()).await
    }

    async fn check_eligibility(&self, reader_id: &str) -> LibraryResult<()> {
        let reader = self.reader_service.find_reader_by_id(reader_id).await?;
        let (active, pending) = self.loan_counts(reader_id).await?;
        if active >= reader.quota {
            return Err(LibraryError::quota_exceeded(
                format!("reader {} holds {} of {} allowed loans", reader_id, active, reader.quota).as_str(),
                QuotaExceededKind::ActiveOverQuota));
        }
        if active + pending >= reader.quota {
            return Err(LibraryError::quota_exceeded(
                format!("reader {} has {} loans and {} pending requests against a quota of {}",
                        reader_id, active, pending, reader.quota).as_str(),
                QuotaExceededKind::ActivePlusPendingOverQuota));
        }
        Ok(())
    }

    async fn find_loan_by_id(&self, id: &str) -> LibraryResult<LoanDto> {
        self.loan_repository.get(id).await.map(|loan| LoanDto::from(&loan))
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>> {
        let res = self.loan_repository.query(predicate, page, page_size).await?;
        Ok(self.to_page(res, page, page_size))
    }

    async fn query_pending(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>> {
        self.query(&HashMap::from([
            ("loan_status".to_string(), LoanStatus::Pending.to_string())]), page, page_size).await
    }

    async fn query_by_reader(&self, reader_id: &str,
                             page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>> {
        self.query(&HashMap::from([
            ("reader_id".to_string(), reader_id.to_string())]), page, page_size).await
    }

    async fn query_overdue(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanDto>> {
        // effective-status filter over the page; the stored status may lag
        // behind the due date so a plain predicate would miss loans
        let today = date::today();
        let res = self.loan_repository.query(&HashMap::new(), page, page_size).await?;
        let records = res.records.iter()
            .filter(|loan| loan.effective_status(today) == LoanStatus::Overdue)
            .map(LoanDto::from)
            .collect();
        Ok(PaginatedResult::new(page, page_size, res.next_page, records))
    }
}

impl From<&LoanEntity> for LoanDto {
    fn from(other: &LoanEntity) -> Self {
        let today = date::today();
        Self {
            loan_id: other.loan_id.to_string(),
            version: other.version,
            reader_id: other.reader_id.to_string(),
            book_id: other.book_id.to_string(),
            loan_status: other.loan_status,
            effective_status: other.effective_status(today),
            overdue_days: other.overdue_days(today),
            requested_by: other.requested_by,
            borrow_at: other.borrow_at,
            due_at: other.due_at,
            returned_at: other.returned_at,
            approved_at: other.approved_at,
            overdue_note: other.overdue_note.to_string(),
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use async_once::AsyncOnce;
    use chrono::{Duration, Utc};
    use lazy_static::lazy_static;
    use uuid::Uuid;

    use crate::catalog::domain::CatalogService;
    use crate::catalog::dto::BookDto;
    use crate::catalog::factory as catalog_factory;
    use crate::core::domain::Configuration;
    use crate::core::library::{LibraryError, LoanStatus, PenaltyKind, QuotaExceededKind};
    use crate::core::repository::RepositoryStore;
    use crate::ledger::domain::LoanService;
    use crate::ledger::factory;
    use crate::readers::domain::ReaderService;
    use crate::readers::dto::ReaderDto;
    use crate::readers::factory as readers_factory;

    lazy_static! {
        static ref SUT_SVC: AsyncOnce<Box<dyn LoanService>> = AsyncOnce::new(async {
            factory::create_loan_service(&Configuration::new("test"), RepositoryStore::InMemory).await
        });
        static ref CATALOG_SVC: AsyncOnce<Box<dyn CatalogService>> = AsyncOnce::new(async {
            catalog_factory::create_catalog_service(RepositoryStore::InMemory).await
        });
        static ref READER_SVC: AsyncOnce<Box<dyn ReaderService>> = AsyncOnce::new(async {
            readers_factory::create_reader_service(RepositoryStore::InMemory).await
        });
    }

    async fn add_test_book(copies: i64) -> BookDto {
        let svc = CATALOG_SVC.get().await;
        let code = format!("BK-{}", Uuid::new_v4());
        svc.add_book(&BookDto::new(code.as_str(), "test book", "test author", "cat1", copies))
            .await.expect("should add book")
    }

    async fn add_test_reader(quota: i64) -> ReaderDto {
        let svc = READER_SVC.get().await;
        let email = format!("{}@example.com", Uuid::new_v4());
        let reader = ReaderDto::new(email.as_str(), "Test Reader", quota);
        svc.add_reader(&reader).await.expect("should add reader");
        reader
    }

    #[tokio::test]
    async fn test_should_request_without_touching_stock() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(2).await;
        let reader = add_test_reader(3).await;

        let loan = svc.request_loan(reader.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should request loan");
        assert_eq!(LoanStatus::Pending, loan.loan_status);
        assert_eq!(LoanStatus::Pending, loan.effective_status);
        assert!(loan.approved_at.is_none());

        let loaded = CATALOG_SVC.get().await.find_book_by_id(book.book_id.as_str())
            .await.expect("should find book");
        assert_eq!(2, loaded.available_quantity);
    }

    #[tokio::test]
    async fn test_should_approve_request_and_decrement_stock() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(1).await;
        let reader = add_test_reader(3).await;

        let loan = svc.request_loan(reader.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should request loan");
        let approved = svc.approve_loan(loan.loan_id.as_str()).await.expect("should approve loan");
        assert_eq!(LoanStatus::Borrowing, approved.loan_status);
        assert!(approved.approved_at.is_some());

        let loaded = CATALOG_SVC.get().await.find_book_by_id(book.book_id.as_str())
            .await.expect("should find book");
        assert_eq!(0, loaded.available_quantity);

        let holder = READER_SVC.get().await.find_reader_by_id(reader.reader_id.as_str())
            .await.expect("should find reader");
        assert_eq!(1, holder.current_borrowing);
    }

    #[tokio::test]
    async fn test_should_fail_approval_when_no_copy_left() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(1).await;
        let first = add_test_reader(3).await;
        let second = add_test_reader(3).await;

        let taken = svc.request_loan(first.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should request loan");
        let _ = svc.approve_loan(taken.loan_id.as_str()).await.expect("should approve loan");

        let waiting = svc.request_loan(second.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should request loan");
        let res = svc.approve_loan(waiting.loan_id.as_str()).await;
        assert!(matches!(res, Err(LibraryError::StockUnavailable { message: _ })));

        // the request survives a failed approval
        let loaded = svc.find_loan_by_id(waiting.loan_id.as_str()).await.expect("should find loan");
        assert_eq!(LoanStatus::Pending, loaded.loan_status);
    }

    #[tokio::test]
    async fn test_should_approve_exactly_one_of_concurrent_approvals() {
        let book = add_test_book(1).await;
        let first = add_test_reader(3).await;
        let second = add_test_reader(3).await;

        let svc = SUT_SVC.get().await;
        let one = svc.request_loan(first.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should request loan");
        let two = svc.request_loan(second.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should request loan");

        let one_id = one.loan_id.clone();
        let two_id = two.loan_id.clone();
        let first_task = tokio::spawn(async move {
            svc.approve_loan(one_id.as_str()).await
        });
        let second_task = tokio::spawn(async move {
            svc.approve_loan(two_id.as_str()).await
        });
        let first_res = first_task.await.expect("task should not panic");
        let second_res = second_task.await.expect("task should not panic");

        let wins = [&first_res, &second_res].iter().filter(|res| res.is_ok()).count();
        assert_eq!(1, wins);
        let loser = if first_res.is_ok() { second_res } else { first_res };
        assert!(matches!(loser, Err(LibraryError::StockUnavailable { message: _ })));

        let loaded = CATALOG_SVC.get().await.find_book_by_id(book.book_id.as_str())
            .await.expect("should find book");
        assert_eq!(0, loaded.available_quantity);
    }

    #[tokio::test]
    async fn test_should_fail_approving_unknown_loan() {
        let svc = SUT_SVC.get().await;
        let res = svc.approve_loan("no-such-loan").await;
        assert!(matches!(res, Err(LibraryError::NotFound { message: _ })));
    }

    #[tokio::test]
    async fn test_should_deny_request_when_active_loans_reach_quota() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(5).await;
        let reader = add_test_reader(2).await;

        let _ = svc.borrow_direct(reader.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should borrow");
        let _ = svc.borrow_direct(reader.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should borrow");

        let res = svc.request_loan(reader.reader_id.as_str(), book.book_id.as_str(), None).await;
        assert!(matches!(res, Err(LibraryError::QuotaExceeded {
            message: _, kind: QuotaExceededKind::ActiveOverQuota })));
    }

    #[tokio::test]
    async fn test_should_deny_request_when_active_plus_pending_reach_quota() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(5).await;
        let reader = add_test_reader(2).await;

        let _ = svc.borrow_direct(reader.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should borrow");
        let _ = svc.request_loan(reader.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should request loan");

        let res = svc.request_loan(reader.reader_id.as_str(), book.book_id.as_str(), None).await;
        assert!(matches!(res, Err(LibraryError::QuotaExceeded {
            message: _, kind: QuotaExceededKind::ActivePlusPendingOverQuota })));
    }

    #[tokio::test]
    async fn test_should_allow_request_under_quota() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(5).await;
        let reader = add_test_reader(2).await;

        let _ = svc.borrow_direct(reader.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should borrow");
        svc.check_eligibility(reader.reader_id.as_str()).await.expect("should be eligible");
    }

    #[tokio::test]
    async fn test_should_reject_only_pending_loans() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(2).await;
        let reader = add_test_reader(3).await;

        let loan = svc.request_loan(reader.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should request loan");
        svc.reject_loan(loan.loan_id.as_str()).await.expect("should reject loan");
        let res = svc.find_loan_by_id(loan.loan_id.as_str()).await;
        assert!(matches!(res, Err(LibraryError::NotFound { message: _ })));

        let opened = svc.borrow_direct(reader.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should borrow");
        let res = svc.reject_loan(opened.loan_id.as_str()).await;
        assert!(matches!(res, Err(LibraryError::InvalidState { message: _ })));

        let res = svc.reject_loan("no-such-loan").await;
        assert!(matches!(res, Err(LibraryError::NotFound { message: _ })));

        // rejecting never touches the stock
        let loaded = CATALOG_SVC.get().await.find_book_by_id(book.book_id.as_str())
            .await.expect("should find book");
        assert_eq!(1, loaded.available_quantity);
    }

    #[tokio::test]
    async fn test_should_return_loan_and_restore_stock_once() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(1).await;
        let reader = add_test_reader(3).await;

        let loan = svc.borrow_direct(reader.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should borrow");
        let returned = svc.return_loan(loan.loan_id.as_str(), None).await.expect("should return loan");
        assert_eq!(LoanStatus::Returned, returned.loan_status);
        assert!(returned.returned_at.is_some());

        let res = svc.return_loan(loan.loan_id.as_str(), None).await;
        assert!(matches!(res, Err(LibraryError::InvalidState { message: _ })));

        let loaded = CATALOG_SVC.get().await.find_book_by_id(book.book_id.as_str())
            .await.expect("should find book");
        assert_eq!(1, loaded.available_quantity);

        let holder = READER_SVC.get().await.find_reader_by_id(reader.reader_id.as_str())
            .await.expect("should find reader");
        assert_eq!(0, holder.current_borrowing);
    }

    #[tokio::test]
    async fn test_should_abort_direct_borrow_without_stock() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(1).await;
        let first = add_test_reader(3).await;
        let second = add_test_reader(3).await;

        let _ = svc.borrow_direct(first.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should borrow");
        let res = svc.borrow_direct(second.reader_id.as_str(), book.book_id.as_str(), None).await;
        assert!(matches!(res, Err(LibraryError::StockUnavailable { message: _ })));

        let loans = svc.query_by_reader(second.reader_id.as_str(), None, 50)
            .await.expect("should query loans");
        assert!(loans.records.is_empty());
    }

    #[tokio::test]
    async fn test_should_deny_request_for_hidden_book() {
        let svc = SUT_SVC.get().await;
        let mut book = add_test_book(2).await;
        let reader = add_test_reader(3).await;

        book.hidden = true;
        let _ = CATALOG_SVC.get().await.update_book(&book).await.expect("should update book");

        let res = svc.request_loan(reader.reader_id.as_str(), book.book_id.as_str(), None).await;
        assert!(matches!(res, Err(LibraryError::Validation { message: _, reason_code: _ })));
    }

    #[tokio::test]
    async fn test_should_report_overdue_loan_with_days() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(2).await;
        let reader = add_test_reader(3).await;

        let due = Utc::now().naive_utc() - Duration::days(3);
        let loan = svc.borrow_direct(reader.reader_id.as_str(), book.book_id.as_str(), Some(due))
            .await.expect("should borrow");

        let loaded = svc.find_loan_by_id(loan.loan_id.as_str()).await.expect("should find loan");
        assert_eq!(LoanStatus::Borrowing, loaded.loan_status);
        assert_eq!(LoanStatus::Overdue, loaded.effective_status);
        assert_eq!(3, loaded.overdue_days);

        let overdue = svc.query_overdue(None, 500).await.expect("should query overdue");
        assert!(overdue.records.iter().any(|rec| rec.loan_id == loan.loan_id));

        let _ = svc.return_loan(loan.loan_id.as_str(), Some("returned three days late"))
            .await.expect("should return loan");
        let overdue = svc.query_overdue(None, 500).await.expect("should query overdue");
        assert!(!overdue.records.iter().any(|rec| rec.loan_id == loan.loan_id));
    }

    #[tokio::test]
    async fn test_should_format_penalty_descriptions() {
        let svc = SUT_SVC.get().await;
        let reader = add_test_reader(3).await;

        let penalized = svc.assign_penalty(reader.reader_id.as_str(), PenaltyKind::Monetary, 20000)
            .await.expect("should assign penalty");
        assert_eq!("Monetary penalty: 20000 VND", penalized.penalty_status.as_str());

        let penalized = svc.assign_penalty(reader.reader_id.as_str(), PenaltyKind::Suspension, 7)
            .await.expect("should assign penalty");
        assert_eq!("Suspended from borrowing for 7 days", penalized.penalty_status.as_str());
    }

    #[tokio::test]
    async fn test_should_list_pending_requests() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(2).await;
        let reader = add_test_reader(3).await;

        let loan = svc.request_loan(reader.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should request loan");
        let pending = svc.query_pending(None, 500).await.expect("should query pending");
        assert!(pending.records.iter().any(|rec| rec.loan_id == loan.loan_id));
        assert!(pending.records.iter().all(|rec| rec.loan_status == LoanStatus::Pending));
    }

    #[tokio::test]
    async fn test_should_run_full_borrow_cycle() {
        let svc = SUT_SVC.get().await;
        let book = add_test_book(1).await;
        let first = add_test_reader(2).await;
        let second = add_test_reader(2).await;

        let loan = svc.request_loan(first.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should request loan");
        let approved = svc.approve_loan(loan.loan_id.as_str()).await.expect("should approve loan");
        assert_eq!(LoanStatus::Borrowing, approved.loan_status);

        let waiting = svc.request_loan(second.reader_id.as_str(), book.book_id.as_str(), None)
            .await.expect("should request loan");
        let res = svc.approve_loan(waiting.loan_id.as_str()).await;
        assert!(matches!(res, Err(LibraryError::StockUnavailable { message: _ })));

        let _ = svc.return_loan(approved.loan_id.as_str(), None).await.expect("should return loan");
        let approved = svc.approve_loan(waiting.loan_id.as_str()).await.expect("should approve loan");
        assert_eq!(LoanStatus::Borrowing, approved.loan_status);

        let predicate = HashMap::from([("book_id".to_string(), book.book_id.to_string())]);
        let loans = svc.query(&predicate, None, 50).await.expect("should query loans");
        assert_eq!(2, loans.records.len());
    }
}
