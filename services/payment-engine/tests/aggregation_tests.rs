//! Integration tests for the ledger -> daily-statistics pipeline, run
//! against the in-memory repositories.

use payment_engine::memory::{InMemoryDailyStatRepo, InMemoryPaymentRepo};
use payment_engine::models::{CreatePaymentRequest, PaymentStatus, UpdateStatusRequest};
use payment_engine::repository::DailyStatRepo;
use payment_engine::security::AuthenticatedUser;
use payment_engine::services::PaymentService;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

fn staff() -> AuthenticatedUser {
    AuthenticatedUser {
        id: Uuid::new_v4(),
        name: "admin".to_string(),
        elevated: true,
    }
}

fn member() -> AuthenticatedUser {
    AuthenticatedUser {
        id: Uuid::new_v4(),
        name: "Fatou".to_string(),
        elevated: false,
    }
}

fn request(amount: rust_decimal::Decimal) -> CreatePaymentRequest {
    CreatePaymentRequest {
        amount,
        status: None,
        method: Some("stripe".to_string()),
        transaction_id: None,
    }
}

/// N payments completed concurrently on the same date must yield exactly
/// N transactions in that date's stat row - no lost updates.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_completions_lose_no_updates() {
    const N: usize = 64;

    let stats = Arc::new(InMemoryDailyStatRepo::new());
    let service = Arc::new(PaymentService::new(
        Arc::new(InMemoryPaymentRepo::new()),
        stats.clone(),
    ));
    let admin = staff();

    // Create N pending payments up front
    let mut ids = Vec::with_capacity(N);
    for _ in 0..N {
        let payment = service
            .create_payment(&member(), request(dec!(10.00)))
            .await
            .unwrap();
        ids.push((payment.id, payment.created_at.date_naive()));
    }
    let date = ids[0].1;

    // Complete them all at once
    let mut handles = Vec::with_capacity(N);
    for (id, _) in ids {
        let service = service.clone();
        let admin = admin.clone();
        handles.push(tokio::spawn(async move {
            service
                .update_status(
                    &admin,
                    id,
                    UpdateStatusRequest {
                        status: PaymentStatus::Completed,
                    },
                )
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stat = stats.get_by_date(date).await.unwrap().unwrap();
    assert_eq!(stat.total_transactions, N as i64);
    assert_eq!(stat.total_revenue, dec!(10.00) * rust_decimal::Decimal::from(N as i64));
}

/// Concurrent duplicate callbacks for the same payment count once.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_duplicate_callbacks_count_once() {
    let stats = Arc::new(InMemoryDailyStatRepo::new());
    let service = Arc::new(PaymentService::new(
        Arc::new(InMemoryPaymentRepo::new()),
        stats.clone(),
    ));
    let admin = staff();

    let payment = service
        .create_payment(&member(), request(dec!(15000.00)))
        .await
        .unwrap();
    let date = payment.created_at.date_naive();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = service.clone();
        let admin = admin.clone();
        let id = payment.id;
        handles.push(tokio::spawn(async move {
            // Duplicate callbacks race; the no-op path must absorb all
            // but the first.
            let _ = service
                .update_status(
                    &admin,
                    id,
                    UpdateStatusRequest {
                        status: PaymentStatus::Completed,
                    },
                )
                .await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stat = stats.get_by_date(date).await.unwrap().unwrap();
    assert_eq!(stat.total_transactions, 1);
    assert_eq!(stat.total_revenue, dec!(15000.00));
}

/// The stats only ever see the completed slice of the ledger.
#[tokio::test]
async fn test_mixed_outcomes_aggregate_only_completions() {
    let stats = Arc::new(InMemoryDailyStatRepo::new());
    let service = Arc::new(PaymentService::new(
        Arc::new(InMemoryPaymentRepo::new()),
        stats.clone(),
    ));
    let admin = staff();

    let amounts = [dec!(100.00), dec!(250.50), dec!(75.25)];
    let mut date = None;
    for (i, amount) in amounts.iter().enumerate() {
        let payment = service
            .create_payment(&member(), request(*amount))
            .await
            .unwrap();
        date = Some(payment.created_at.date_naive());
        let target = if i == 1 {
            PaymentStatus::Failed
        } else {
            PaymentStatus::Completed
        };
        service
            .update_status(&admin, payment.id, UpdateStatusRequest { status: target })
            .await
            .unwrap();
    }

    let stat = stats.get_by_date(date.unwrap()).await.unwrap().unwrap();
    assert_eq!(stat.total_transactions, 2);
    assert_eq!(stat.total_revenue, dec!(175.25));
}
