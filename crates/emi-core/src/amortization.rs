//! Fixed-rate amortising loan engine.
//!
//! A [`LoanQuote`] is turned into an [`AmortizationResult`] with the standard
//! annuity formula:
//!
//! ```text
//! EMI = P * r * (1 + r)^n / ((1 + r)^n - 1)
//! ```
//!
//! where `P` is the financed principal (requested amount less down payment),
//! `r` the monthly rate and `n` the number of monthly payments. Every input
//! must be strictly inside its domain before any arithmetic happens; there is
//! no zero-rate fallback. All values stay unrounded `f64`.

use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::{EmiError, Violation};
use crate::types::*;
use crate::EmiResult;

pub const MONTHS_PER_YEAR: u32 = 12;

/// Largest tenure whose payment count still fits the `powi` exponent.
pub const MAX_TENURE_YEARS: u32 = i32::MAX as u32 / MONTHS_PER_YEAR;

// Bounds of the calculator form. Quotes outside them are still computed,
// they only produce warnings in the envelope.
const FORM_MIN_LOAN_AMOUNT: Money = 10_000.0;
const FORM_MIN_RATE_PERCENT: Rate = 0.1;
const FORM_MAX_RATE_PERCENT: Rate = 30.0;
const FORM_MAX_TENURE_YEARS: u32 = 30;

/// Loan parameters for a single calculation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanQuote {
    /// Amount asked for before any down payment.
    pub principal_requested: Money,
    /// Paid up front; reduces the financed principal.
    #[serde(default)]
    pub down_payment: Money,
    /// Nominal annual rate as a percentage (4.5 means 4.5%).
    pub annual_interest_rate_percent: Rate,
    /// Loan term in whole years.
    pub tenure_years: u32,
}

impl LoanQuote {
    /// A quote with no down payment.
    pub fn new(
        principal_requested: Money,
        annual_interest_rate_percent: Rate,
        tenure_years: u32,
    ) -> Self {
        LoanQuote {
            principal_requested,
            down_payment: 0.0,
            annual_interest_rate_percent,
            tenure_years,
        }
    }

    pub fn with_down_payment(mut self, down_payment: Money) -> Self {
        self.down_payment = down_payment;
        self
    }

    pub fn financed_principal(&self) -> Money {
        self.principal_requested - self.down_payment
    }

    /// Monthly rate as a fraction.
    pub fn periodic_rate(&self) -> Rate {
        self.annual_interest_rate_percent / 100.0 / 12.0
    }

    pub fn number_of_payments(&self) -> u32 {
        self.tenure_years.saturating_mul(MONTHS_PER_YEAR)
    }

    /// Check every precondition, reporting the first one that fails.
    pub fn validate(&self) -> EmiResult<()> {
        let principal = self.principal_requested;
        if !principal.is_finite() {
            return Err(EmiError::invalid(
                "principal_requested",
                Violation::NotFinite,
                "Loan amount must be a finite number",
            ));
        }
        if principal <= 0.0 {
            return Err(EmiError::invalid(
                "principal_requested",
                Violation::NotPositive,
                "Loan amount must be positive",
            ));
        }

        let down = self.down_payment;
        if !down.is_finite() {
            return Err(EmiError::invalid(
                "down_payment",
                Violation::NotFinite,
                "Down payment must be a finite number",
            ));
        }
        if down < 0.0 {
            return Err(EmiError::invalid(
                "down_payment",
                Violation::Negative,
                "Down payment cannot be negative",
            ));
        }
        if down >= principal {
            return Err(EmiError::invalid(
                "down_payment",
                Violation::NotBelowPrincipal,
                format!("Down payment {down} leaves nothing to finance on a loan of {principal}"),
            ));
        }

        let rate = self.annual_interest_rate_percent;
        if !rate.is_finite() {
            return Err(EmiError::invalid(
                "annual_interest_rate_percent",
                Violation::NotFinite,
                "Interest rate must be a finite number",
            ));
        }
        if rate <= 0.0 {
            return Err(EmiError::invalid(
                "annual_interest_rate_percent",
                Violation::NotPositive,
                "Interest rate must be positive",
            ));
        }

        if self.tenure_years == 0 {
            return Err(EmiError::invalid(
                "tenure_years",
                Violation::NotPositive,
                "Tenure must be at least 1 year",
            ));
        }
        if self.tenure_years > MAX_TENURE_YEARS {
            return Err(EmiError::invalid(
                "tenure_years",
                Violation::OutOfRange,
                format!("Tenure must not exceed {MAX_TENURE_YEARS} years"),
            ));
        }

        Ok(())
    }
}

/// Engine output. Nothing in here is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationResult {
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub financed_principal: Money,
    pub down_payment: Money,
    pub number_of_payments: u32,
    pub periodic_rate: Rate,
}

/// Result shape handed to form handlers and other callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub monthly_payment: Money,
    pub total_amount: Money,
    pub total_interest: Money,
    pub principal: Money,
    pub down_payment: Money,
}

impl From<&AmortizationResult> for LoanSummary {
    fn from(r: &AmortizationResult) -> Self {
        LoanSummary {
            monthly_payment: r.monthly_payment,
            total_amount: r.total_paid,
            total_interest: r.total_interest,
            principal: r.financed_principal,
            down_payment: r.down_payment,
        }
    }
}

/// Compute the level monthly payment and the loan totals.
///
/// Fails with [`EmiError::InvalidInput`] without computing anything when a
/// precondition is broken. A rate so large that `(1 + r)^n` overflows, or so
/// small that it rounds to exactly one, is rejected as
/// [`Violation::OutOfRange`] instead of yielding an infinite or NaN payment.
pub fn compute_amortization(quote: &LoanQuote) -> EmiResult<AmortizationResult> {
    quote.validate()?;

    let principal = quote.financed_principal();
    let r = quote.periodic_rate();
    let n = quote.number_of_payments();

    // validate() bounds tenure so n fits in i32
    let growth = (1.0 + r).powi(n as i32);
    let denominator = growth - 1.0;
    if !growth.is_finite() || denominator == 0.0 {
        return Err(EmiError::invalid(
            "annual_interest_rate_percent",
            Violation::OutOfRange,
            format!(
                "Rate {}% over {n} payments cannot be amortised in double precision",
                quote.annual_interest_rate_percent
            ),
        ));
    }

    let monthly_payment = principal * r * growth / denominator;
    if !monthly_payment.is_finite() {
        return Err(EmiError::invalid(
            "principal_requested",
            Violation::OutOfRange,
            "Monthly payment overflows double precision",
        ));
    }

    let result = aggregate(monthly_payment, n, principal, quote.down_payment, r);
    if !result.total_paid.is_finite() {
        return Err(EmiError::invalid(
            "principal_requested",
            Violation::OutOfRange,
            format!("Total repayment over {n} payments overflows double precision"),
        ));
    }

    debug!(principal, periodic_rate = r, payments = n, monthly_payment, "computed EMI");
    Ok(result)
}

/// Derive loan totals from an already computed payment.
///
/// `total_interest` is taken from `total_paid` so that
/// `financed_principal + total_interest == total_paid` uses the same operands.
pub fn aggregate(
    monthly_payment: Money,
    number_of_payments: u32,
    financed_principal: Money,
    down_payment: Money,
    periodic_rate: Rate,
) -> AmortizationResult {
    let total_paid = monthly_payment * f64::from(number_of_payments);
    let total_interest = total_paid - financed_principal;
    AmortizationResult {
        monthly_payment,
        total_paid,
        total_interest,
        financed_principal,
        down_payment,
        number_of_payments,
        periodic_rate,
    }
}

/// Notes for quotes the calculator form would not have accepted.
pub(crate) fn form_bound_warnings(quote: &LoanQuote) -> Vec<String> {
    let mut warnings = Vec::new();
    if quote.principal_requested < FORM_MIN_LOAN_AMOUNT {
        warnings.push(format!(
            "Loan amount {} is below the usual minimum of {FORM_MIN_LOAN_AMOUNT}",
            quote.principal_requested
        ));
    }
    let rate = quote.annual_interest_rate_percent;
    if !(FORM_MIN_RATE_PERCENT..=FORM_MAX_RATE_PERCENT).contains(&rate) {
        warnings.push(format!(
            "Interest rate {rate}% is outside the usual \
             {FORM_MIN_RATE_PERCENT}%-{FORM_MAX_RATE_PERCENT}% range"
        ));
    }
    if quote.tenure_years > FORM_MAX_TENURE_YEARS {
        warnings.push(format!(
            "Tenure of {} years exceeds the usual maximum of {FORM_MAX_TENURE_YEARS}",
            quote.tenure_years
        ));
    }
    for w in &warnings {
        warn!(warning = %w, "quote outside calculator bounds");
    }
    warnings
}

/// Run the engine and wrap the caller-facing summary in the output envelope.
pub fn calculate_loan(quote: &LoanQuote) -> EmiResult<ComputationOutput<LoanSummary>> {
    let start = Instant::now();
    let result = compute_amortization(quote)?;
    Ok(loan_output(quote, &result, start))
}

/// Envelope for an already computed result, for callers that also need the
/// unsummarised [`AmortizationResult`].
pub fn loan_output(
    quote: &LoanQuote,
    result: &AmortizationResult,
    start: Instant,
) -> ComputationOutput<LoanSummary> {
    let warnings = form_bound_warnings(quote);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Level-payment annuity (EMI)",
        &serde_json::json!({
            "principal_requested": quote.principal_requested,
            "down_payment": quote.down_payment,
            "annual_interest_rate_percent": quote.annual_interest_rate_percent,
            "tenure_years": quote.tenure_years,
            "periodic_rate": result.periodic_rate,
            "number_of_payments": result.number_of_payments,
        }),
        warnings,
        elapsed,
        LoanSummary::from(result),
    )
}
