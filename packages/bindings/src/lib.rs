use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use emi_core::amortization::{self, LoanQuote};
use emi_core::presentation::{self, CurrencyFormat};
use emi_core::schedule;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_quote(input_json: &str) -> NapiResult<LoanQuote> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// EMI, totals and financed principal for a quote, in the output envelope.
#[napi]
pub fn calculate_loan(input_json: String) -> NapiResult<String> {
    let quote = parse_quote(&input_json)?;
    let output = amortization::calculate_loan(&quote).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn amortization_schedule(input_json: String) -> NapiResult<String> {
    let quote = parse_quote(&input_json)?;
    let output = schedule::calculate_schedule(&quote).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn amortization_preview(input_json: String) -> NapiResult<String> {
    let quote = parse_quote(&input_json)?;
    let sched = schedule::build_schedule(&quote).map_err(to_napi_error)?;
    let preview = schedule::preview(&sched)
        .ok_or_else(|| napi::Error::from_reason("schedule has no years to preview"))?;
    serde_json::to_string(&preview).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct DisplayRequest {
    quote: LoanQuote,
    #[serde(default)]
    format: CurrencyFormat,
}

/// Formatted strings for a quote; `format` defaults to whole rupees.
#[napi]
pub fn display_loan(input_json: String) -> NapiResult<String> {
    let req: DisplayRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let result = amortization::compute_amortization(&req.quote).map_err(to_napi_error)?;
    let display =
        presentation::present(&result, req.quote.tenure_years, &req.format).map_err(to_napi_error)?;
    serde_json::to_string(&display).map_err(to_napi_error)
}

#[napi]
pub fn format_currency(amount: f64, format_json: Option<String>) -> NapiResult<String> {
    let format: CurrencyFormat = match format_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => CurrencyFormat::default(),
    };
    presentation::format_amount(amount, &format).map_err(to_napi_error)
}
