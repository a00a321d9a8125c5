use crate::aggregator::StatsAggregator;
use crate::errors::{PaymentEngineError, Result};
use crate::metrics;
use crate::models::{
    CreatePaymentRequest, DailyStat, Payment, PaymentStatus, UpdateStatusRequest,
};
use crate::repository::{DailyStatRepo, PaymentRepo, PaymentScope};
use crate::security::{AuthenticatedUser, Requester};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Which slice of the ledger this requester may read. Non-elevated users
/// see their own payments only; elevated identities see the whole ledger.
fn payment_scope(user: &AuthenticatedUser) -> PaymentScope {
    if user.elevated {
        PaymentScope::All
    } else {
        PaymentScope::Owner(user.id)
    }
}

pub struct PaymentService {
    payments: Arc<dyn PaymentRepo>,
    stats: Arc<dyn DailyStatRepo>,
    aggregator: StatsAggregator,
}

impl PaymentService {
    pub fn new(payments: Arc<dyn PaymentRepo>, stats: Arc<dyn DailyStatRepo>) -> Self {
        let aggregator = StatsAggregator::new(stats.clone());
        PaymentService {
            payments,
            stats,
            aggregator,
        }
    }

    /// Record a payment attempt. The owner is always the requester; the
    /// status defaults to `pending`. A payment created directly in the
    /// `completed` state is a transition into it and feeds the aggregator.
    pub async fn create_payment(
        &self,
        user: &AuthenticatedUser,
        request: CreatePaymentRequest,
    ) -> Result<Payment> {
        validator::Validate::validate(&request)?;

        let status = request.status.unwrap_or(PaymentStatus::Pending);
        let payment = Payment {
            id: Uuid::new_v4(),
            owner_id: user.id,
            owner_name: user.name.clone(),
            amount: request.amount,
            status,
            method: request.method,
            transaction_id: request.transaction_id,
            created_at: Utc::now(),
        };

        let payment = self.payments.create(payment).await?;
        metrics::PAYMENTS_CREATED.inc();

        info!(
            "Payment {} recorded for {} ({} {})",
            payment.id, payment.owner_name, payment.amount, payment.status
        );

        if payment.status == PaymentStatus::Completed {
            self.aggregator.record_completed(&payment).await?;
            metrics::PAYMENTS_COMPLETED.inc();
        }

        Ok(payment)
    }

    pub async fn list_payments(
        &self,
        user: &AuthenticatedUser,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Payment>> {
        self.payments.list(payment_scope(user), status).await
    }

    /// Owner or elevated; everyone else gets 404 so existence is not
    /// leaked to unauthorized callers.
    pub async fn get_payment(&self, user: &AuthenticatedUser, id: Uuid) -> Result<Payment> {
        let payment = self
            .payments
            .get(id)
            .await?
            .ok_or(PaymentEngineError::PaymentNotFound(id))?;

        if !user.elevated && payment.owner_id != user.id {
            return Err(PaymentEngineError::PaymentNotFound(id));
        }

        Ok(payment)
    }

    /// Apply a status update from a payment-method callback or an admin
    /// action, then run the post-commit aggregation hook when - and only
    /// when - this update was the transition into `completed`.
    pub async fn update_status(
        &self,
        user: &AuthenticatedUser,
        id: Uuid,
        request: UpdateStatusRequest,
    ) -> Result<Payment> {
        if !user.elevated {
            return Err(PaymentEngineError::Forbidden);
        }

        let transition = self.payments.transition_status(id, request.status).await?;

        if transition.is_completion() {
            self.aggregator.record_completed(&transition.payment).await?;
            metrics::PAYMENTS_COMPLETED.inc();
        } else if transition.previous != transition.payment.status
            && transition.payment.status == PaymentStatus::Failed
        {
            metrics::PAYMENTS_FAILED.inc();
        }

        Ok(transition.payment)
    }

    pub async fn list_stats(&self) -> Result<Vec<DailyStat>> {
        self.stats.list().await
    }

    pub async fn get_stat(&self, date: NaiveDate) -> Result<DailyStat> {
        self.stats
            .get_by_date(date)
            .await?
            .ok_or(PaymentEngineError::StatNotFound(date))
    }

    /// Visibility gate used by read handlers that take a plain requester.
    pub fn require_user<'a>(&self, requester: &'a Requester) -> Result<&'a AuthenticatedUser> {
        requester.user().ok_or(PaymentEngineError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryDailyStatRepo, InMemoryPaymentRepo};
    use crate::models::StatusTransition;
    use crate::repository::{MockDailyStatRepo, MockPaymentRepo};
    use rust_decimal_macros::dec;

    fn staff() -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            name: "admin".to_string(),
            elevated: true,
        }
    }

    fn member(name: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            name: name.to_string(),
            elevated: false,
        }
    }

    fn in_memory_service() -> (PaymentService, Arc<InMemoryDailyStatRepo>) {
        let stats = Arc::new(InMemoryDailyStatRepo::new());
        let service = PaymentService::new(
            Arc::new(InMemoryPaymentRepo::new()),
            stats.clone(),
        );
        (service, stats)
    }

    fn create_request(amount: rust_decimal::Decimal) -> CreatePaymentRequest {
        CreatePaymentRequest {
            amount,
            status: None,
            method: Some("stripe".to_string()),
            transaction_id: Some("txn_001".to_string()),
        }
    }

    #[tokio::test]
    async fn test_completing_a_payment_updates_the_daily_stat_once() {
        let (service, stats) = in_memory_service();
        let user = member("Fatou");
        let admin = staff();

        let payment = service
            .create_payment(&user, create_request(dec!(15000.00)))
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);

        let completed = service
            .update_status(
                &admin,
                payment.id,
                UpdateStatusRequest {
                    status: PaymentStatus::Completed,
                },
            )
            .await
            .unwrap();
        assert_eq!(completed.status, PaymentStatus::Completed);

        let stat = stats
            .get_by_date(payment.created_at.date_naive())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stat.total_revenue, dec!(15000.00));
        assert_eq!(stat.total_transactions, 1);
    }

    #[tokio::test]
    async fn test_resaving_a_completed_payment_does_not_double_count() {
        let (service, stats) = in_memory_service();
        let user = member("Fatou");
        let admin = staff();

        let payment = service
            .create_payment(&user, create_request(dec!(100.00)))
            .await
            .unwrap();
        service
            .update_status(
                &admin,
                payment.id,
                UpdateStatusRequest {
                    status: PaymentStatus::Completed,
                },
            )
            .await
            .unwrap();

        // Repeated callback for the same payment: allowed, but a no-op.
        service
            .update_status(
                &admin,
                payment.id,
                UpdateStatusRequest {
                    status: PaymentStatus::Completed,
                },
            )
            .await
            .unwrap();

        let stat = stats
            .get_by_date(payment.created_at.date_naive())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stat.total_revenue, dec!(100.00));
        assert_eq!(stat.total_transactions, 1);
    }

    #[tokio::test]
    async fn test_failed_payments_never_reach_the_stats() {
        let (service, stats) = in_memory_service();
        let user = member("Ousmane");
        let admin = staff();

        let payment = service
            .create_payment(&user, create_request(dec!(20000.00)))
            .await
            .unwrap();
        service
            .update_status(
                &admin,
                payment.id,
                UpdateStatusRequest {
                    status: PaymentStatus::Failed,
                },
            )
            .await
            .unwrap();

        assert!(stats
            .get_by_date(payment.created_at.date_naive())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_terminal_states_are_immutable() {
        let (service, _) = in_memory_service();
        let user = member("Aicha");
        let admin = staff();

        let payment = service
            .create_payment(&user, create_request(dec!(12000.00)))
            .await
            .unwrap();
        service
            .update_status(
                &admin,
                payment.id,
                UpdateStatusRequest {
                    status: PaymentStatus::Failed,
                },
            )
            .await
            .unwrap();

        let err = service
            .update_status(
                &admin,
                payment.id,
                UpdateStatusRequest {
                    status: PaymentStatus::Completed,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PaymentEngineError::IllegalTransition { .. }
        ));
    }

    #[tokio::test]
    async fn test_creating_directly_as_completed_feeds_the_aggregator() {
        let (service, stats) = in_memory_service();
        let user = member("Fatou");

        let mut request = create_request(dec!(5000.00));
        request.status = Some(PaymentStatus::Completed);
        let payment = service.create_payment(&user, request).await.unwrap();

        let stat = stats
            .get_by_date(payment.created_at.date_naive())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stat.total_transactions, 1);
        assert_eq!(stat.total_revenue, dec!(5000.00));
    }

    #[tokio::test]
    async fn test_status_update_requires_elevation() {
        let (service, _) = in_memory_service();
        let user = member("Fatou");

        let payment = service
            .create_payment(&user, create_request(dec!(100.00)))
            .await
            .unwrap();
        let err = service
            .update_status(
                &user,
                payment.id,
                UpdateStatusRequest {
                    status: PaymentStatus::Completed,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentEngineError::Forbidden));
    }

    #[tokio::test]
    async fn test_owners_see_only_their_own_payments() {
        let (service, _) = in_memory_service();
        let fatou = member("Fatou");
        let ousmane = member("Ousmane");

        let theirs = service
            .create_payment(&fatou, create_request(dec!(100.00)))
            .await
            .unwrap();
        service
            .create_payment(&ousmane, create_request(dec!(200.00)))
            .await
            .unwrap();

        let visible = service.list_payments(&fatou, None).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, theirs.id);

        // Cross-owner retrieval answers not-found, not forbidden
        let other = service.list_payments(&ousmane, None).await.unwrap();
        let err = service.get_payment(&fatou, other[0].id).await.unwrap_err();
        assert!(matches!(err, PaymentEngineError::PaymentNotFound(_)));

        let all = service.list_payments(&staff(), None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_aggregator_is_called_exactly_once_per_transition() {
        // Mock-level check of the transition gate: the stats repository
        // must see exactly one record_completed for the completing update.
        let mut payments = MockPaymentRepo::new();
        let mut stats = MockDailyStatRepo::new();

        let paid = Payment {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            owner_name: "Fatou".to_string(),
            amount: dec!(100.00),
            status: PaymentStatus::Completed,
            method: None,
            transaction_id: None,
            created_at: Utc::now(),
        };
        let date = paid.created_at.date_naive();
        let transitioned = paid.clone();

        payments
            .expect_transition_status()
            .times(1)
            .returning(move |_, _| {
                Ok(StatusTransition {
                    payment: transitioned.clone(),
                    previous: PaymentStatus::Pending,
                })
            });
        stats
            .expect_record_completed()
            .times(1)
            .returning(move |d, amount| {
                Ok(DailyStat {
                    id: Uuid::new_v4(),
                    date: d,
                    total_revenue: amount,
                    total_transactions: 1,
                })
            });

        let service = PaymentService::new(Arc::new(payments), Arc::new(stats));
        let updated = service
            .update_status(
                &staff(),
                paid.id,
                UpdateStatusRequest {
                    status: PaymentStatus::Completed,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.created_at.date_naive(), date);
    }
}
