//! In-memory repository implementations, used by the test suites in place
//! of PostgreSQL. Semantics mirror `database.rs`: same transition rules,
//! same atomic get-or-create-and-add behaviour for the daily totals.

use crate::errors::{PaymentEngineError, Result};
use crate::models::{DailyStat, Payment, PaymentStatus, StatusTransition};
use crate::repository::{DailyStatRepo, PaymentRepo, PaymentScope};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryPaymentRepo {
    payments: Arc<RwLock<HashMap<Uuid, Payment>>>,
}

impl InMemoryPaymentRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentRepo for InMemoryPaymentRepo {
    async fn create(&self, payment: Payment) -> Result<Payment> {
        let mut payments = self.payments.write().await;
        payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).cloned())
    }

    async fn list(
        &self,
        scope: PaymentScope,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        let mut rows: Vec<Payment> = payments
            .values()
            .filter(|p| match scope {
                PaymentScope::All => true,
                PaymentScope::Owner(owner_id) => p.owner_id == owner_id,
            })
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        next: PaymentStatus,
    ) -> Result<StatusTransition> {
        // The write lock spans the read-modify-write, matching the
        // row-lock semantics of the PostgreSQL implementation.
        let mut payments = self.payments.write().await;
        let payment = payments
            .get_mut(&id)
            .ok_or(PaymentEngineError::PaymentNotFound(id))?;

        let previous = payment.status;
        if previous == next {
            return Ok(StatusTransition {
                payment: payment.clone(),
                previous,
            });
        }
        if !previous.can_transition_to(next) {
            return Err(PaymentEngineError::IllegalTransition {
                from: previous,
                to: next,
            });
        }

        payment.status = next;
        Ok(StatusTransition {
            payment: payment.clone(),
            previous,
        })
    }
}

#[derive(Default)]
pub struct InMemoryDailyStatRepo {
    stats: Arc<RwLock<HashMap<NaiveDate, DailyStat>>>,
}

impl InMemoryDailyStatRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DailyStatRepo for InMemoryDailyStatRepo {
    async fn record_completed(&self, date: NaiveDate, amount: Decimal) -> Result<DailyStat> {
        let mut stats = self.stats.write().await;
        let stat = stats.entry(date).or_insert_with(|| DailyStat {
            id: Uuid::new_v4(),
            date,
            total_revenue: Decimal::ZERO,
            total_transactions: 0,
        });
        stat.total_revenue += amount;
        stat.total_transactions += 1;
        Ok(stat.clone())
    }

    async fn list(&self) -> Result<Vec<DailyStat>> {
        let stats = self.stats.read().await;
        let mut rows: Vec<DailyStat> = stats.values().cloned().collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<DailyStat>> {
        let stats = self.stats.read().await;
        Ok(stats.get(&date).cloned())
    }
}
