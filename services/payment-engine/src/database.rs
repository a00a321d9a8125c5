use crate::errors::{PaymentEngineError, Result};
use crate::models::{DailyStat, Payment, PaymentStatus, StatusTransition};
use crate::repository::{DailyStatRepo, PaymentRepo, PaymentScope};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::time::Duration;
use uuid::Uuid;

pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PaymentRepo for Database {
    async fn create(&self, payment: Payment) -> Result<Payment> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                id, owner_id, owner_name, amount, status,
                method, transaction_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(payment.id)
        .bind(payment.owner_id)
        .bind(&payment.owner_name)
        .bind(payment.amount)
        .bind(payment.status)
        .bind(&payment.method)
        .bind(&payment.transaction_id)
        .bind(payment.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn list(
        &self,
        scope: PaymentScope,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Payment>> {
        let status = status.map(|s| s.as_str().to_string());

        let payments = match scope {
            PaymentScope::All => {
                sqlx::query_as::<_, Payment>(
                    r#"
                    SELECT * FROM payments
                    WHERE ($1::text IS NULL OR status = $1)
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            PaymentScope::Owner(owner_id) => {
                sqlx::query_as::<_, Payment>(
                    r#"
                    SELECT * FROM payments
                    WHERE owner_id = $1 AND ($2::text IS NULL OR status = $2)
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(owner_id)
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(payments)
    }

    /// Row lock for the duration of the read-modify-write, so two
    /// concurrent callbacks cannot both observe `pending`.
    async fn transition_status(
        &self,
        id: Uuid,
        next: PaymentStatus,
    ) -> Result<StatusTransition> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(PaymentEngineError::PaymentNotFound(id))?;

        let previous = payment.status;

        // Re-submitting the current status (repeated callback, field edit)
        // succeeds without touching the row.
        if previous == next {
            tx.commit().await?;
            return Ok(StatusTransition { payment, previous });
        }

        if !previous.can_transition_to(next) {
            return Err(PaymentEngineError::IllegalTransition {
                from: previous,
                to: next,
            });
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments SET status = $2 WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(StatusTransition { payment, previous })
    }
}

#[async_trait]
impl DailyStatRepo for Database {
    /// Single-statement upsert-and-increment. The conflict target is the
    /// UNIQUE(date) constraint, so N concurrent completions for one date
    /// serialize inside PostgreSQL and none of the increments is lost.
    async fn record_completed(&self, date: NaiveDate, amount: Decimal) -> Result<DailyStat> {
        let stat = sqlx::query_as::<_, DailyStat>(
            r#"
            INSERT INTO daily_stats (id, date, total_revenue, total_transactions)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (date)
            DO UPDATE SET
                total_revenue = daily_stats.total_revenue + EXCLUDED.total_revenue,
                total_transactions = daily_stats.total_transactions + 1
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(date)
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(stat)
    }

    async fn list(&self) -> Result<Vec<DailyStat>> {
        let stats = sqlx::query_as::<_, DailyStat>(
            r#"
            SELECT * FROM daily_stats ORDER BY date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stats)
    }

    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<DailyStat>> {
        let stat = sqlx::query_as::<_, DailyStat>(
            r#"
            SELECT * FROM daily_stats WHERE date = $1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stat)
    }
}
