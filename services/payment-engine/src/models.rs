use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::ValidationError;

/// Payment status enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,    // Created on checkout, awaiting the payment method callback
    Completed,  // Confirmed by the payment method
    Failed,     // Rejected by the payment method
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Terminal states cannot be left once entered.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }

    /// Legal transition graph: pending -> completed, pending -> failed.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Completed)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the payment ledger. Never deleted in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub method: Option<String>,              // e.g. 'stripe', 'paypal' - opaque
    pub transaction_id: Option<String>,      // gateway reference - opaque
    pub created_at: DateTime<Utc>,
}

/// Running per-date totals, folded from completed payments.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyStat {
    pub id: Uuid,
    pub date: NaiveDate,
    pub total_revenue: Decimal,
    pub total_transactions: i64,
}

/// Outcome of a ledger status update: the stored payment plus the status
/// it held before the update, so callers can detect the transition edge.
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub payment: Payment,
    pub previous: PaymentStatus,
}

impl StatusTransition {
    /// True exactly when this update moved the payment into `completed`
    /// from some other state. Re-saving an already-completed payment is
    /// not a completion.
    pub fn is_completion(&self) -> bool {
        self.previous != PaymentStatus::Completed
            && self.payment.status == PaymentStatus::Completed
    }
}

/// Create payment request
#[derive(Debug, Deserialize, Serialize, validator::Validate)]
pub struct CreatePaymentRequest {
    #[validate(custom = "validate_amount")]
    pub amount: Decimal,
    pub status: Option<PaymentStatus>,
    #[validate(length(max = 50))]
    pub method: Option<String>,
    #[validate(length(max = 255))]
    pub transaction_id: Option<String>,
}

/// Status update request (payment-method callback / admin action)
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateStatusRequest {
    pub status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
pub struct PaymentListQuery {
    pub status: Option<PaymentStatus>,
}

/// Amounts are fixed-point with two places; negative amounts are never
/// accepted into the ledger.
fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() {
        return Err(ValidationError::new("amount_negative"));
    }
    if amount.scale() > 2 {
        return Err(ValidationError::new("amount_precision"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use validator::Validate;

    fn request(amount: Decimal) -> CreatePaymentRequest {
        CreatePaymentRequest {
            amount,
            status: None,
            method: Some("stripe".to_string()),
            transaction_id: None,
        }
    }

    #[test]
    fn test_amount_accepts_two_decimal_places() {
        assert!(request(dec!(15000.50)).validate().is_ok());
        assert!(request(dec!(0.00)).validate().is_ok());
    }

    #[test]
    fn test_amount_rejects_negative() {
        assert!(request(dec!(-1.00)).validate().is_err());
    }

    #[test]
    fn test_amount_rejects_excess_precision() {
        assert!(request(dec!(10.005)).validate().is_err());
    }

    #[test]
    fn test_transition_graph() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Completed.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }
}
