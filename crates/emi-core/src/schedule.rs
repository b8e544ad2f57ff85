use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::trace;

use crate::amortization::{
    compute_amortization, form_bound_warnings, AmortizationResult, LoanQuote, MONTHS_PER_YEAR,
};
use crate::error::{EmiError, Violation};
use crate::types::*;
use crate::EmiResult;

/// Most monthly rows a schedule will materialize (100 years).
pub const MAX_SCHEDULE_PERIODS: u32 = 1_200;

/// One monthly payment in the schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    /// 1-based payment number
    pub period: u32,
    /// 1-based loan year the payment falls in
    pub year: u32,
    pub opening_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

/// Twelve payments rolled up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: u32,
    pub opening_balance: Money,
    pub payments: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub summary: AmortizationResult,
    pub periods: Vec<SchedulePeriod>,
    pub years: Vec<YearSummary>,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
}

/// First, middle and last year of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationPreview {
    pub first_year: YearSummary,
    pub middle_year: YearSummary,
    pub last_year: YearSummary,
}

/// Build a month-by-month schedule by reducing the remaining balance.
///
/// Each period charges `balance * r` interest and applies the rest of the
/// level payment to principal. The final period repays whatever balance is
/// left so the loan closes at exactly zero; its payment can differ from the
/// level payment by accumulated rounding error.
///
/// The engine accepts tenures far longer than a schedule can hold; anything
/// over [`MAX_SCHEDULE_PERIODS`] payments is rejected on `tenure_years`
/// before any rows are allocated.
pub fn build_schedule(quote: &LoanQuote) -> EmiResult<AmortizationSchedule> {
    let summary = compute_amortization(quote)?;
    let r = summary.periodic_rate;
    let n = summary.number_of_payments;
    if n > MAX_SCHEDULE_PERIODS {
        return Err(EmiError::invalid(
            "tenure_years",
            Violation::OutOfRange,
            format!(
                "Schedule of {n} payments exceeds the {MAX_SCHEDULE_PERIODS}-payment limit"
            ),
        ));
    }

    let mut periods = Vec::with_capacity(n as usize);
    let mut years = Vec::with_capacity(quote.tenure_years as usize);
    let mut balance = summary.financed_principal;
    let mut total_interest_paid = 0.0;
    let mut total_principal_paid = 0.0;

    for year in 1..=quote.tenure_years {
        let year_opening = balance;
        let mut year_payments = 0.0;
        let mut year_interest = 0.0;
        let mut year_principal = 0.0;

        for month in 1..=MONTHS_PER_YEAR {
            let period = (year - 1) * MONTHS_PER_YEAR + month;
            let opening = balance;
            let interest = opening * r;
            let (payment, principal) = if period == n {
                (interest + opening, opening)
            } else {
                (summary.monthly_payment, summary.monthly_payment - interest)
            };
            balance = if period == n { 0.0 } else { opening - principal };

            year_payments += payment;
            year_interest += interest;
            year_principal += principal;

            periods.push(SchedulePeriod {
                period,
                year,
                opening_balance: opening,
                payment,
                interest,
                principal,
                closing_balance: balance,
            });
        }

        total_interest_paid += year_interest;
        total_principal_paid += year_principal;
        trace!(
            year,
            interest = year_interest,
            principal = year_principal,
            closing = balance,
            "schedule year"
        );

        years.push(YearSummary {
            year,
            opening_balance: year_opening,
            payments: year_payments,
            interest: year_interest,
            principal: year_principal,
            closing_balance: balance,
        });
    }

    Ok(AmortizationSchedule {
        summary,
        periods,
        years,
        total_interest_paid,
        total_principal_paid,
    })
}

/// Middle year is `(tenure + 1) / 2`, so a 30-year loan previews year 15.
pub fn preview(schedule: &AmortizationSchedule) -> Option<AmortizationPreview> {
    let first_year = *schedule.years.first()?;
    let last_year = *schedule.years.last()?;
    let middle_idx = (schedule.years.len() + 1) / 2 - 1;
    let middle_year = *schedule.years.get(middle_idx)?;
    Some(AmortizationPreview {
        first_year,
        middle_year,
        last_year,
    })
}

/// Full schedule wrapped in the output envelope.
pub fn calculate_schedule(
    quote: &LoanQuote,
) -> EmiResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let schedule = build_schedule(quote)?;

    let mut warnings = form_bound_warnings(quote);
    let drift = schedule.periods.last().map(|p| p.payment - schedule.summary.monthly_payment);
    if let Some(d) = drift {
        if d.abs() >= 0.005 {
            warnings.push(format!("Final payment differs from the level payment by {d:.4}"));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Declining-balance amortization schedule",
        &serde_json::json!({
            "financed_principal": schedule.summary.financed_principal,
            "periodic_rate": schedule.summary.periodic_rate,
            "number_of_payments": schedule.summary.number_of_payments,
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::MAX_TENURE_YEARS;

    fn car_loan() -> LoanQuote {
        LoanQuote::new(20_000.0, 6.0, 5)
    }

    #[test]
    fn test_schedule_shape() {
        let s = build_schedule(&car_loan()).unwrap();
        assert_eq!(s.periods.len(), 60);
        assert_eq!(s.years.len(), 5);
        assert_eq!(s.periods[0].period, 1);
        assert_eq!(s.periods[59].period, 60);
        assert_eq!(s.periods[12].year, 2);
    }

    #[test]
    fn test_first_period_split() {
        let s = build_schedule(&car_loan()).unwrap();
        let p = &s.periods[0];
        // 20,000 * 0.5% = 100 interest in the first month
        assert!((p.interest - 100.0).abs() < 1e-9);
        assert!((p.principal - (s.summary.monthly_payment - 100.0)).abs() < 1e-9);
        assert_eq!(p.opening_balance, 20_000.0);
    }

    #[test]
    fn test_schedule_closes_at_zero() {
        let s = build_schedule(&car_loan()).unwrap();
        let last = s.periods.last().unwrap();
        assert_eq!(last.closing_balance, 0.0);
        assert_eq!(s.years.last().unwrap().closing_balance, 0.0);
        assert!((s.total_principal_paid - 20_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_interest_matches_engine_total() {
        let s = build_schedule(&car_loan()).unwrap();
        assert!((s.total_interest_paid - s.summary.total_interest).abs() < 1e-6);
    }

    #[test]
    fn test_interest_share_declines() {
        let s = build_schedule(&car_loan()).unwrap();
        for pair in s.years.windows(2) {
            assert!(pair[1].interest < pair[0].interest);
            assert!(pair[1].principal > pair[0].principal);
        }
    }

    #[test]
    fn test_year_rows_chain() {
        let s = build_schedule(&car_loan()).unwrap();
        for pair in s.years.windows(2) {
            assert_eq!(pair[1].opening_balance, pair[0].closing_balance);
        }
    }

    #[test]
    fn test_preview_picks_distinct_years() {
        let quote = LoanQuote::new(500_000.0, 4.5, 30).with_down_payment(50_000.0);
        let s = build_schedule(&quote).unwrap();
        let p = preview(&s).unwrap();
        assert_eq!(p.first_year.year, 1);
        assert_eq!(p.middle_year.year, 15);
        assert_eq!(p.last_year.year, 30);
        assert!(p.first_year.interest > p.middle_year.interest);
        assert!(p.middle_year.interest > p.last_year.interest);
    }

    #[test]
    fn test_preview_single_year_loan() {
        let s = build_schedule(&LoanQuote::new(12_000.0, 10.0, 1)).unwrap();
        let p = preview(&s).unwrap();
        assert_eq!(p.first_year, p.middle_year);
        assert_eq!(p.middle_year, p.last_year);
    }

    #[test]
    fn test_invalid_quote_builds_nothing() {
        assert!(build_schedule(&LoanQuote::new(10_000.0, 0.0, 5)).is_err());
    }

    #[test]
    fn test_schedule_at_period_limit() {
        let years = MAX_SCHEDULE_PERIODS / MONTHS_PER_YEAR;
        let s = build_schedule(&LoanQuote::new(100_000.0, 5.0, years)).unwrap();
        assert_eq!(s.periods.len(), MAX_SCHEDULE_PERIODS as usize);
        assert_eq!(s.periods.last().unwrap().closing_balance, 0.0);
    }

    #[test]
    fn test_schedule_beyond_period_limit_rejected() {
        let years = MAX_SCHEDULE_PERIODS / MONTHS_PER_YEAR + 1;
        let err = build_schedule(&LoanQuote::new(100_000.0, 5.0, years)).unwrap_err();
        assert_eq!(err.field(), Some("tenure_years"));
        assert_eq!(err.violation(), Some(Violation::OutOfRange));
    }

    #[test]
    fn test_engine_max_tenure_not_materialized() {
        // the engine prices this quote; the schedule must refuse it
        let quote = LoanQuote::new(100_000.0, 0.0001, MAX_TENURE_YEARS);
        assert!(compute_amortization(&quote).is_ok());
        let err = calculate_schedule(&quote).unwrap_err();
        assert_eq!(err.field(), Some("tenure_years"));
        assert_eq!(err.violation(), Some(Violation::OutOfRange));
    }

    #[test]
    fn test_calculate_schedule_carries_form_bound_warnings() {
        let out = calculate_schedule(&LoanQuote::new(5_000.0, 6.0, 5)).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("5000"));
    }

    #[test]
    fn test_calculate_schedule_envelope() {
        let out = calculate_schedule(&car_loan()).unwrap();
        assert!(out.warnings.is_empty());
        assert_eq!(out.assumptions["number_of_payments"], 60);
        assert_eq!(out.result.periods.len(), 60);
    }
}
