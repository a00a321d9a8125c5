//! Daily statistics aggregation.
//!
//! Invoked synchronously by the ledger after a payment transitions into
//! `completed`. The aggregation key is the calendar date of the payment's
//! creation timestamp, not of the status change.

use crate::errors::Result;
use crate::models::{DailyStat, Payment};
use crate::repository::DailyStatRepo;
use std::sync::Arc;
use tracing::info;

pub struct StatsAggregator {
    stats: Arc<dyn DailyStatRepo>,
}

impl StatsAggregator {
    pub fn new(stats: Arc<dyn DailyStatRepo>) -> Self {
        StatsAggregator { stats }
    }

    /// Fold one completed payment into the running totals for its creation
    /// date. Callers gate this on the transition edge into `completed`;
    /// the repository applies the increment atomically.
    pub async fn record_completed(&self, payment: &Payment) -> Result<DailyStat> {
        let date = payment.created_at.date_naive();
        let stat = self.stats.record_completed(date, payment.amount).await?;

        info!(
            "Aggregated payment {} into {}: revenue {}, transactions {}",
            payment.id, stat.date, stat.total_revenue, stat.total_transactions
        );

        Ok(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDailyStatRepo;
    use crate::models::PaymentStatus;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn payment(amount: rust_decimal::Decimal, day: u32) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            owner_name: "Fatou".to_string(),
            amount,
            status: PaymentStatus::Completed,
            method: Some("stripe".to_string()),
            transaction_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 8, day, 14, 30, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_single_completion_creates_stat() {
        let repo = Arc::new(InMemoryDailyStatRepo::new());
        let aggregator = StatsAggregator::new(repo.clone());

        let stat = aggregator
            .record_completed(&payment(dec!(15000.00), 29))
            .await
            .unwrap();

        assert_eq!(stat.total_revenue, dec!(15000.00));
        assert_eq!(stat.total_transactions, 1);
    }

    #[tokio::test]
    async fn test_completions_accumulate_per_date() {
        let repo = Arc::new(InMemoryDailyStatRepo::new());
        let aggregator = StatsAggregator::new(repo.clone());

        aggregator
            .record_completed(&payment(dec!(15000.00), 29))
            .await
            .unwrap();
        aggregator
            .record_completed(&payment(dec!(12000.00), 29))
            .await
            .unwrap();
        // Different creation date lands in a different row
        aggregator
            .record_completed(&payment(dec!(20000.00), 30))
            .await
            .unwrap();

        let day_29 = repo
            .get_by_date(chrono::NaiveDate::from_ymd_opt(2025, 8, 29).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(day_29.total_revenue, dec!(27000.00));
        assert_eq!(day_29.total_transactions, 2);

        let day_30 = repo
            .get_by_date(chrono::NaiveDate::from_ymd_opt(2025, 8, 30).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(day_30.total_revenue, dec!(20000.00));
        assert_eq!(day_30.total_transactions, 1);
    }

    #[tokio::test]
    async fn test_key_is_creation_date_not_today() {
        let repo = Arc::new(InMemoryDailyStatRepo::new());
        let aggregator = StatsAggregator::new(repo.clone());

        // Payment created on the 29th, completed "now" - the stat row is
        // still the 29th.
        aggregator
            .record_completed(&payment(dec!(100.00), 29))
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let key = chrono::NaiveDate::from_ymd_opt(2025, 8, 29).unwrap();
        if today != key {
            assert!(repo.get_by_date(today).await.unwrap().is_none());
        }
        assert!(repo.get_by_date(key).await.unwrap().is_some());
    }
}
