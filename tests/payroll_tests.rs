mod common;

use chrono_tz::Tz;
use paylinkr_be::database::models::{SessionStatus, WorkSession};
use paylinkr_be::services::payroll::{self, RateCard};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use common::ts;

fn session(clock_in: &str, clock_out: &str, worked_minutes: i64) -> WorkSession {
    WorkSession {
        id: Uuid::new_v4(),
        employee_id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        clock_in: ts(clock_in),
        clock_out: Some(ts(clock_out)),
        worked_minutes: Some(worked_minutes),
        status: SessionStatus::Approved,
        rejection_reason: None,
        created_at: ts(clock_in),
        updated_at: ts(clock_in),
    }
}

fn rates(base: &str, overtime: &str, bonus: &str) -> RateCard {
    RateCard {
        base_rate: base.parse().unwrap(),
        overtime_rate: overtime.parse().unwrap(),
        bonus_rate: bonus.parse().unwrap(),
    }
}

fn utc() -> Tz {
    "UTC".parse().unwrap()
}

#[test]
fn ten_hour_day_splits_at_the_daily_threshold() {
    let sessions = vec![session("2026-03-02 08:00:00", "2026-03-02 18:00:00", 600)];
    let breakdown = payroll::compute(&sessions, &rates("50", "75", "0"), 8.0, 0.0, 1.0, utc());

    assert_eq!(breakdown.regular_hours, 8.0);
    assert_eq!(breakdown.overtime_hours, 2.0);
    // 8h * 50 + 2h * 75
    assert_eq!(breakdown.amount.to_string(), "550.00");
}

#[test]
fn exactly_threshold_hours_earn_no_overtime() {
    let sessions = vec![session("2026-03-02 09:00:00", "2026-03-02 17:00:00", 480)];
    let breakdown = payroll::compute(&sessions, &rates("50", "75", "0"), 8.0, 0.0, 1.0, utc());

    assert_eq!(breakdown.regular_hours, 8.0);
    assert_eq!(breakdown.overtime_hours, 0.0);
    assert_eq!(breakdown.amount.to_string(), "400.00");
}

#[test]
fn sessions_on_the_same_day_share_the_threshold() {
    let sessions = vec![
        session("2026-03-02 06:00:00", "2026-03-02 12:00:00", 360),
        session("2026-03-02 13:00:00", "2026-03-02 18:00:00", 300),
    ];
    let breakdown = payroll::compute(&sessions, &rates("50", "75", "0"), 8.0, 0.0, 1.0, utc());

    // 11h on one calendar day: 8 regular, 3 overtime.
    assert_eq!(breakdown.regular_hours, 8.0);
    assert_eq!(breakdown.overtime_hours, 3.0);
}

#[test]
fn sessions_on_different_days_get_separate_thresholds() {
    let sessions = vec![
        session("2026-03-02 09:00:00", "2026-03-02 16:00:00", 420),
        session("2026-03-03 09:00:00", "2026-03-03 16:00:00", 420),
    ];
    let breakdown = payroll::compute(&sessions, &rates("50", "75", "0"), 8.0, 0.0, 1.0, utc());

    assert_eq!(breakdown.regular_hours, 14.0);
    assert_eq!(breakdown.overtime_hours, 0.0);
}

#[test]
fn days_are_grouped_in_the_company_timezone() {
    // 20:00 and 02:00 UTC are both the same calendar day in Tokyo (+9).
    let tokyo: Tz = "Asia/Tokyo".parse().unwrap();
    let sessions = vec![
        session("2026-03-02 15:00:00", "2026-03-02 20:00:00", 300),
        session("2026-03-02 21:00:00", "2026-03-03 02:00:00", 300),
    ];

    let in_tokyo = payroll::compute(&sessions, &rates("50", "75", "0"), 8.0, 0.0, 1.0, tokyo);
    assert_eq!(in_tokyo.overtime_hours, 2.0);

    // Under UTC the second session lands on the next day: no overtime.
    let in_utc = payroll::compute(&sessions, &rates("50", "75", "0"), 8.0, 0.0, 1.0, utc());
    assert_eq!(in_utc.overtime_hours, 0.0);
}

#[test]
fn flat_bonus_is_scaled_by_the_company_multiplier() {
    let sessions = vec![session("2026-03-02 09:00:00", "2026-03-02 13:00:00", 240)];
    let breakdown = payroll::compute(&sessions, &rates("50", "75", "100"), 8.0, 2.0, 1.5, utc());

    // 4h * 50 + 100 * 1.5
    assert_eq!(breakdown.amount.to_string(), "350.00");
    assert_eq!(breakdown.bonus_hours, 3.0);
}

#[test]
fn amounts_round_half_up_to_two_decimals() {
    // 30 minutes at 0.05/h is 0.025, which rounds up.
    let sessions = vec![session("2026-03-02 09:00:00", "2026-03-02 09:30:00", 30)];
    let breakdown = payroll::compute(&sessions, &rates("0.05", "0.10", "0"), 8.0, 0.0, 1.0, utc());

    assert_eq!(breakdown.amount.to_string(), "0.03");
}

#[test]
fn open_sessions_contribute_nothing() {
    let mut open = session("2026-03-02 09:00:00", "2026-03-02 17:00:00", 480);
    open.clock_out = None;
    open.worked_minutes = None;

    let breakdown = payroll::compute(&[open], &rates("50", "75", "0"), 8.0, 0.0, 1.0, utc());
    assert_eq!(breakdown.amount.to_string(), "0.00");
    assert_eq!(breakdown.regular_hours, 0.0);
}

#[test]
fn no_sessions_means_a_zero_breakdown() {
    let breakdown = payroll::compute(&[], &rates("50", "75", "0"), 8.0, 0.0, 1.0, utc());
    assert_eq!(breakdown.amount.to_string(), "0.00");
}

#[test]
fn identical_inputs_always_produce_identical_output() {
    let a = session("2026-03-02 06:00:00", "2026-03-02 12:00:00", 360);
    let b = session("2026-03-02 13:00:00", "2026-03-02 19:00:00", 330);
    let c = session("2026-03-03 09:00:00", "2026-03-03 17:15:00", 495);
    let cards = rates("41.75", "62.63", "12.50");

    let forward = payroll::compute(
        &[a.clone(), b.clone(), c.clone()],
        &cards,
        8.0,
        1.0,
        1.25,
        utc(),
    );
    let reversed = payroll::compute(&[c, b, a], &cards, 8.0, 1.0, 1.25, utc());

    assert_eq!(forward, reversed);
    assert_eq!(forward.amount, reversed.amount);
}
