//! Currency display for engine output.
//!
//! This is the only place amounts are rounded. Values are converted to
//! `rust_decimal::Decimal` and rounded half away from zero at the configured
//! number of fraction digits, then grouped per locale:
//!
//! - `en-IN`: last three digits, then pairs (`₹12,34,567`)
//! - `en-US`: thousands (`$1,234,567`)
//!
//! Compact notation mirrors dashboard figures (`$1.2M`, `₹4.5L`) with at most
//! one fraction digit.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amortization::AmortizationResult;
use crate::error::{EmiError, Violation};
use crate::types::*;
use crate::EmiResult;

const COMPACT_FRACTION_DIGITS: u32 = 1;

/// Upper bound on `fraction_digits`, the same limit `Intl.NumberFormat` uses.
pub const MAX_FRACTION_DIGITS: u32 = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en-IN")]
    EnIn,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    // ascending
    fn compact_units(self) -> &'static [(Decimal, &'static str)] {
        const EN_IN: &[(Decimal, &str)] = &[
            (dec!(1000), "T"),
            (dec!(100000), "L"),
            (dec!(10000000), "Cr"),
        ];
        const EN_US: &[(Decimal, &str)] = &[
            (dec!(1000), "K"),
            (dec!(1000000), "M"),
            (dec!(1000000000), "B"),
            (dec!(1000000000000), "T"),
        ];
        match self {
            Locale::EnIn => EN_IN,
            Locale::EnUs => EN_US,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::EnIn => f.write_str("en-IN"),
            Locale::EnUs => f.write_str("en-US"),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('_', "-").to_ascii_lowercase().as_str() {
            "en-in" => Ok(Locale::EnIn),
            "en-us" => Ok(Locale::EnUs),
            _ => Err(format!("unsupported locale '{s}' (expected en-IN or en-US)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notation {
    #[default]
    Standard,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyFormat {
    pub currency: Currency,
    pub locale: Locale,
    pub fraction_digits: u32,
    pub notation: Notation,
}

impl Default for CurrencyFormat {
    /// Whole rupees, Indian grouping.
    fn default() -> Self {
        CurrencyFormat {
            currency: Currency::INR,
            locale: Locale::EnIn,
            fraction_digits: 0,
            notation: Notation::Standard,
        }
    }
}

impl CurrencyFormat {
    /// Whole dollars, thousands grouping.
    pub fn us_dollars() -> Self {
        CurrencyFormat {
            currency: Currency::USD,
            locale: Locale::EnUs,
            ..Default::default()
        }
    }

    pub fn compact(mut self) -> Self {
        self.notation = Notation::Compact;
        self
    }
}

/// Formatted strings for a computed loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDisplay {
    pub monthly_payment: String,
    pub total_amount: String,
    pub total_interest: String,
    pub principal: String,
    /// Absent when nothing was paid up front.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<String>,
    pub tenure: String,
}

/// Format a single amount.
pub fn format_amount(amount: Money, format: &CurrencyFormat) -> EmiResult<String> {
    if format.fraction_digits > MAX_FRACTION_DIGITS {
        return Err(EmiError::invalid(
            "fraction_digits",
            Violation::OutOfRange,
            format!(
                "{} fraction digits requested, at most {MAX_FRACTION_DIGITS} allowed",
                format.fraction_digits
            ),
        ));
    }
    if !amount.is_finite() {
        return Err(EmiError::invalid(
            "amount",
            Violation::NotFinite,
            format!("cannot format {amount} as currency"),
        ));
    }
    let value = Decimal::from_f64(amount).ok_or_else(|| {
        EmiError::invalid(
            "amount",
            Violation::OutOfRange,
            format!("{amount} exceeds decimal range"),
        )
    })?;

    let (digits, suffix) = match format.notation {
        Notation::Standard => (round_half_away(value.abs(), format.fraction_digits), ""),
        Notation::Compact => compact_parts(value.abs(), format.locale.compact_units()),
    };

    let mut out = String::new();
    if value.is_sign_negative() && !digits.is_zero() {
        out.push('-');
    }
    out.push_str(format.currency.symbol());
    let min_fraction = match format.notation {
        Notation::Standard => format.fraction_digits,
        Notation::Compact => 0,
    };
    out.push_str(&render_number(digits, min_fraction, format.locale));
    out.push_str(suffix);
    Ok(out)
}

/// Format every figure of an engine result.
pub fn present(
    result: &AmortizationResult,
    tenure_years: u32,
    format: &CurrencyFormat,
) -> EmiResult<LoanDisplay> {
    let down_payment = if result.down_payment > 0.0 {
        Some(format_amount(result.down_payment, format)?)
    } else {
        None
    };
    Ok(LoanDisplay {
        monthly_payment: format_amount(result.monthly_payment, format)?,
        total_amount: format_amount(result.total_paid, format)?,
        total_interest: format_amount(result.total_interest, format)?,
        principal: format_amount(result.financed_principal, format)?,
        down_payment,
        tenure: match tenure_years {
            1 => "1 year".to_string(),
            n => format!("{n} years"),
        },
    })
}

fn round_half_away(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Scale into the largest unit not above the value, moving up a unit when
/// rounding reaches the next threshold (999,960 is "1M", not "1000K").
fn compact_parts(
    abs: Decimal,
    units: &'static [(Decimal, &'static str)],
) -> (Decimal, &'static str) {
    let mut idx = units.iter().rposition(|(size, _)| abs >= *size);
    loop {
        let scaled = idx.map_or(abs, |i| abs / units[i].0);
        let rounded = round_half_away(scaled, COMPACT_FRACTION_DIGITS);
        let next = idx.map_or(0, |i| i + 1);
        if let Some((next_size, _)) = units.get(next) {
            let restored = idx.map_or(rounded, |i| rounded * units[i].0);
            if restored >= *next_size {
                idx = Some(next);
                continue;
            }
        }
        return (rounded.normalize(), idx.map_or("", |i| units[i].1));
    }
}

fn render_number(value: Decimal, min_fraction: u32, locale: Locale) -> String {
    let text = value.to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, f.to_string()),
        None => (text.as_str(), String::new()),
    };

    let mut out = group_integer(int_part, locale);
    let mut frac = frac_part;
    while (frac.len() as u32) < min_fraction {
        frac.push('0');
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

fn group_integer(digits: &str, locale: Locale) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let group = match locale {
        Locale::EnIn => 2,
        Locale::EnUs => 3,
    };

    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(group);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    groups.push(tail);
    groups.join(",")
}
