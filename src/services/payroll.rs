use std::collections::BTreeMap;

use bigdecimal::{BigDecimal, FromPrimitive};
use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;

use crate::database::models::{JobRole, Money, WorkSession};

/// Immutable rate snapshot taken at calculation time, so later edits to a
/// job role never change an already-created payment.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCard {
    pub base_rate: Money,
    pub overtime_rate: Money,
    pub bonus_rate: Money,
}

impl From<&JobRole> for RateCard {
    fn from(role: &JobRole) -> Self {
        RateCard {
            base_rate: role.base_rate.clone(),
            overtime_rate: role.overtime_rate.clone(),
            bonus_rate: role.bonus_rate.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayrollBreakdown {
    pub regular_hours: f64,
    pub overtime_hours: f64,
    pub bonus_hours: f64,
    pub amount: Money,
}

/// Turn a set of approved sessions into a monetary breakdown.
///
/// Pure and deterministic: no clocks, no I/O, BTreeMap day grouping, so
/// identical inputs always produce identical output. A retried payroll run
/// may recompute a payment before commit and must get the same answer.
///
/// Sessions are grouped by the calendar day of their clock-out in the
/// company's reference timezone. Hours above `max_daily_hours` within one
/// day are paid at the overtime rate. The flat role bonus and the
/// bonus-hours add-on are both scaled by the company multiplier; the bonus
/// policy itself lives outside this function.
pub fn compute(
    sessions: &[WorkSession],
    rates: &RateCard,
    max_daily_hours: f64,
    bonus_hours: f64,
    bonus_multiplier: f64,
    timezone: Tz,
) -> PayrollBreakdown {
    let max_daily_minutes = (max_daily_hours * 60.0).round() as i64;

    let mut minutes_per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for session in sessions {
        let (Some(clock_out), Some(worked)) = (session.clock_out, session.worked_minutes) else {
            continue;
        };
        let day = timezone.from_utc_datetime(&clock_out).date_naive();
        *minutes_per_day.entry(day).or_insert(0) += worked;
    }

    let mut regular_minutes: i64 = 0;
    let mut overtime_minutes: i64 = 0;
    for day_minutes in minutes_per_day.values() {
        regular_minutes += day_minutes.min(&max_daily_minutes);
        overtime_minutes += (day_minutes - max_daily_minutes).max(0);
    }

    let sixty = BigDecimal::from(60);
    let regular_amount = BigDecimal::from(regular_minutes) * rates.base_rate.as_decimal() / &sixty;
    let overtime_amount =
        BigDecimal::from(overtime_minutes) * rates.overtime_rate.as_decimal() / &sixty;
    let multiplier = BigDecimal::from_f64(bonus_multiplier).unwrap_or_default();
    let bonus_amount = rates.bonus_rate.as_decimal() * &multiplier;

    PayrollBreakdown {
        regular_hours: regular_minutes as f64 / 60.0,
        overtime_hours: overtime_minutes as f64 / 60.0,
        bonus_hours: bonus_hours * bonus_multiplier,
        amount: Money::new(regular_amount + overtime_amount + bonus_amount),
    }
}
