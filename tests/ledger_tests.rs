mod common;

use paylinkr_be::database::models::PaymentStatus;
use paylinkr_be::error::AppError;
use sqlx::SqlitePool;
use uuid::Uuid;

use common::{
    approved_session, build_state, payments_repo, seed_default, seed_employee, seed_org,
    sessions_repo, ts, MockProvider,
};

#[sqlx::test]
async fn payroll_converts_approved_sessions_into_a_pending_payment(pool: SqlitePool) {
    let org = seed_default(&pool).await;
    let state = build_state(&pool, MockProvider::always_ack());

    let session = approved_session(
        &pool,
        &org.employee,
        ts("2026-03-02 08:00:00"),
        ts("2026-03-02 18:00:00"),
    )
    .await;

    let payments = state
        .ledger
        .run_payroll(
            org.company.id,
            ts("2026-03-01 00:00:00"),
            ts("2026-03-31 23:59:59"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(payments.len(), 1);
    let payment = &payments[0];
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.regular_hours, 8.0);
    assert_eq!(payment.overtime_hours, 2.0);
    assert_eq!(payment.amount.to_string(), "550.00");
    assert_eq!(payment.attempt_count, 0);

    let claims = payments_repo(&pool)
        .claims_for_payment(payment.id)
        .await
        .unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].session_id, session.id);

    let claim = payments_repo(&pool)
        .claim_for_session(session.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(claim.payment_id, payment.id);
}

#[sqlx::test]
async fn a_second_run_over_the_same_period_pays_nothing(pool: SqlitePool) {
    let org = seed_default(&pool).await;
    let state = build_state(&pool, MockProvider::always_ack());

    approved_session(
        &pool,
        &org.employee,
        ts("2026-03-02 09:00:00"),
        ts("2026-03-02 17:00:00"),
    )
    .await;

    let start = ts("2026-03-01 00:00:00");
    let end = ts("2026-03-31 23:59:59");

    let first = state
        .ledger
        .run_payroll(org.company.id, start, end, None)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    let second = state
        .ledger
        .run_payroll(org.company.id, start, end, None)
        .await
        .unwrap();
    assert!(second.is_empty());
}

#[sqlx::test]
async fn concurrent_runs_compensate_each_session_exactly_once(pool: SqlitePool) {
    let org = seed_default(&pool).await;
    let state = build_state(&pool, MockProvider::always_ack());

    for day in 2..=4 {
        approved_session(
            &pool,
            &org.employee,
            ts(&format!("2026-03-0{day} 09:00:00")),
            ts(&format!("2026-03-0{day} 17:00:00")),
        )
        .await;
    }

    let start = ts("2026-03-01 00:00:00");
    let end = ts("2026-03-31 23:59:59");
    let ledger_a = state.ledger.clone();
    let ledger_b = state.ledger.clone();

    let (a, b) = tokio::join!(
        ledger_a.run_payroll(org.company.id, start, end, None),
        ledger_b.run_payroll(org.company.id, start, end, None),
    );

    let created = a.unwrap().len() + b.unwrap().len();
    assert_eq!(created, 1);

    let all = payments_repo(&pool)
        .find_by_company(org.company.id)
        .await
        .unwrap();
    assert_eq!(all.len(), 1);

    let claims = payments_repo(&pool)
        .claims_for_payment(all[0].id)
        .await
        .unwrap();
    assert_eq!(claims.len(), 3);
}

#[sqlx::test]
async fn cancelled_payments_do_not_release_their_sessions(pool: SqlitePool) {
    let org = seed_default(&pool).await;
    let state = build_state(&pool, MockProvider::always_ack());

    approved_session(
        &pool,
        &org.employee,
        ts("2026-03-02 09:00:00"),
        ts("2026-03-02 17:00:00"),
    )
    .await;

    let start = ts("2026-03-01 00:00:00");
    let end = ts("2026-03-31 23:59:59");

    let payments = state
        .ledger
        .run_payroll(org.company.id, start, end, None)
        .await
        .unwrap();
    let cancelled = state.disbursement.cancel(payments[0].id).await.unwrap();
    assert_eq!(cancelled.status, PaymentStatus::Cancelled);

    let rerun = state
        .ledger
        .run_payroll(org.company.id, start, end, None)
        .await
        .unwrap();
    assert!(rerun.is_empty());
}

#[sqlx::test]
async fn only_approved_sessions_in_the_period_are_paid(pool: SqlitePool) {
    let org = seed_default(&pool).await;
    let state = build_state(&pool, MockProvider::always_ack());
    let sessions = sessions_repo(&pool);

    // Approved but outside the period.
    approved_session(
        &pool,
        &org.employee,
        ts("2026-02-10 09:00:00"),
        ts("2026-02-10 17:00:00"),
    )
    .await;

    // In the period but rejected.
    let rejected = sessions
        .clock_in(&org.employee, ts("2026-03-02 09:00:00"))
        .await
        .unwrap();
    sessions
        .clock_out(rejected.id, ts("2026-03-02 17:00:00"))
        .await
        .unwrap();
    sessions.reject(rejected.id, None).await.unwrap();

    let payments = state
        .ledger
        .run_payroll(
            org.company.id,
            ts("2026-03-01 00:00:00"),
            ts("2026-03-31 23:59:59"),
            None,
        )
        .await
        .unwrap();
    assert!(payments.is_empty());
}

#[sqlx::test]
async fn payroll_can_target_a_single_employee(pool: SqlitePool) {
    let org = seed_default(&pool).await;
    let other = seed_employee(&pool, &org.company, &org.role).await;
    let state = build_state(&pool, MockProvider::always_ack());

    approved_session(
        &pool,
        &org.employee,
        ts("2026-03-02 09:00:00"),
        ts("2026-03-02 17:00:00"),
    )
    .await;
    approved_session(
        &pool,
        &other,
        ts("2026-03-02 09:00:00"),
        ts("2026-03-02 17:00:00"),
    )
    .await;

    let payments = state
        .ledger
        .run_payroll(
            org.company.id,
            ts("2026-03-01 00:00:00"),
            ts("2026-03-31 23:59:59"),
            Some(other.id),
        )
        .await
        .unwrap();

    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].employee_id, other.id);
}

#[sqlx::test]
async fn payroll_covers_every_active_employee(pool: SqlitePool) {
    let org = seed_default(&pool).await;
    let other = seed_employee(&pool, &org.company, &org.role).await;
    let state = build_state(&pool, MockProvider::always_ack());

    approved_session(
        &pool,
        &org.employee,
        ts("2026-03-02 09:00:00"),
        ts("2026-03-02 17:00:00"),
    )
    .await;
    approved_session(
        &pool,
        &other,
        ts("2026-03-03 09:00:00"),
        ts("2026-03-03 17:00:00"),
    )
    .await;

    let payments = state
        .ledger
        .run_payroll(
            org.company.id,
            ts("2026-03-01 00:00:00"),
            ts("2026-03-31 23:59:59"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(payments.len(), 2);
}

#[sqlx::test]
async fn payroll_validates_its_inputs(pool: SqlitePool) {
    let org = seed_default(&pool).await;
    let state = build_state(&pool, MockProvider::always_ack());

    let err = state
        .ledger
        .run_payroll(
            org.company.id,
            ts("2026-03-31 00:00:00"),
            ts("2026-03-01 00:00:00"),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = state
        .ledger
        .run_payroll(
            Uuid::new_v4(),
            ts("2026-03-01 00:00:00"),
            ts("2026-03-31 00:00:00"),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Employee from a different company.
    let stranger = seed_org(&pool, "UTC", 8.0, 1.0, "50", "75", "0", 0.0).await;
    let err = state
        .ledger
        .run_payroll(
            org.company.id,
            ts("2026-03-01 00:00:00"),
            ts("2026-03-31 00:00:00"),
            Some(stranger.employee.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[sqlx::test]
async fn bonus_configuration_flows_into_the_payment(pool: SqlitePool) {
    let org = seed_org(&pool, "UTC", 8.0, 1.5, "50", "75", "100", 2.0).await;
    let state = build_state(&pool, MockProvider::always_ack());

    approved_session(
        &pool,
        &org.employee,
        ts("2026-03-02 09:00:00"),
        ts("2026-03-02 13:00:00"),
    )
    .await;

    let payments = state
        .ledger
        .run_payroll(
            org.company.id,
            ts("2026-03-01 00:00:00"),
            ts("2026-03-31 23:59:59"),
            None,
        )
        .await
        .unwrap();

    // 4h * 50 plus the 100 flat bonus scaled by 1.5.
    assert_eq!(payments[0].amount.to_string(), "350.00");
    assert_eq!(payments[0].bonus_hours, 3.0);
}
