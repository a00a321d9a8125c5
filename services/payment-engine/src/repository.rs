//! Entity repositories. The HTTP layer and the aggregator depend on these
//! traits, never on a concrete store.

use crate::errors::Result;
use crate::models::{DailyStat, Payment, PaymentStatus, StatusTransition};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Which slice of the ledger a requester may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentScope {
    /// Only payments owned by this user.
    Owner(Uuid),
    /// The whole ledger (elevated requesters).
    All,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepo: Send + Sync {
    async fn create(&self, payment: Payment) -> Result<Payment>;

    async fn get(&self, id: Uuid) -> Result<Option<Payment>>;

    async fn list(
        &self,
        scope: PaymentScope,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Payment>>;

    /// Update the status of one payment under a row lock, enforcing the
    /// legal transition graph. Re-submitting the current status is a
    /// no-op and succeeds. Returns the stored payment together with the
    /// status it held before the update.
    async fn transition_status(
        &self,
        id: Uuid,
        next: PaymentStatus,
    ) -> Result<StatusTransition>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DailyStatRepo: Send + Sync {
    /// Fold one completed payment into the totals for `date`: get-or-create
    /// the row and add (amount, 1) in a single atomic statement, safe under
    /// concurrent completions for the same date.
    async fn record_completed(&self, date: NaiveDate, amount: Decimal) -> Result<DailyStat>;

    async fn list(&self) -> Result<Vec<DailyStat>>;

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<DailyStat>>;
}
