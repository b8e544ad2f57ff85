use clap::Args;
use serde_json::{json, Value};
use std::time::Instant;

use emi_core::amortization::{self, LoanQuote, LoanSummary};
use emi_core::presentation::{self, CurrencyFormat};
use emi_core::schedule::{self, YearSummary};

use crate::input;

/// Where the loan quote comes from
#[derive(Args)]
pub struct QuoteInputArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount requested
    #[arg(long, allow_hyphen_values = true)]
    pub loan_amount: Option<f64>,

    /// Annual interest rate in percent (e.g. 8.5)
    #[arg(long, allow_hyphen_values = true)]
    pub rate: Option<f64>,

    /// Loan tenure in years
    #[arg(long)]
    pub tenure: Option<u32>,

    /// Amount paid up front
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub down_payment: f64,
}

impl QuoteInputArgs {
    /// `--input` file, then piped stdin, then individual flags.
    fn resolve(&self) -> Result<LoanQuote, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.input {
            return input::file::read_structured(path);
        }
        self.resolve_piped(input::stdin::read_stdin()?)
    }

    fn resolve_piped(
        &self,
        piped: Option<Value>,
    ) -> Result<LoanQuote, Box<dyn std::error::Error>> {
        if let Some(data) = piped {
            return Ok(serde_json::from_value(data)?);
        }

        let amount = self
            .loan_amount
            .ok_or("--loan-amount is required (or provide --input)")?;
        let rate = self.rate.ok_or("--rate is required (or provide --input)")?;
        let tenure = self.tenure.ok_or("--tenure is required (or provide --input)")?;

        Ok(LoanQuote::new(amount, rate, tenure).with_down_payment(self.down_payment))
    }
}

/// Arguments for a single EMI quote
#[derive(Args)]
pub struct QuoteArgs {
    #[command(flatten)]
    pub quote: QuoteInputArgs,
}

pub fn run_quote(
    args: QuoteArgs,
    format: &CurrencyFormat,
) -> Result<Value, Box<dyn std::error::Error>> {
    let quote = args.quote.resolve()?;
    let start = Instant::now();
    let result = amortization::compute_amortization(&quote)?;
    let output = amortization::loan_output(&quote, &result, start);
    let display = presentation::present(&result, quote.tenure_years, format)?;

    let mut value = serde_json::to_value(output)?;
    value["display"] = serde_json::to_value(display)?;
    Ok(value)
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub quote: QuoteInputArgs,

    /// One row per year instead of per month
    #[arg(long)]
    pub yearly: bool,

    /// Render money columns with the display currency instead of raw numbers
    #[arg(long)]
    pub formatted: bool,
}

pub fn run_schedule(
    args: ScheduleArgs,
    format: &CurrencyFormat,
) -> Result<Value, Box<dyn std::error::Error>> {
    let quote = args.quote.resolve()?;
    let output = schedule::calculate_schedule(&quote)?;
    let sched = &output.result;

    let rows = if args.yearly {
        serde_json::to_value(&sched.years)?
    } else {
        serde_json::to_value(&sched.periods)?
    };
    let rows = if args.formatted {
        format_rows(rows, format)?
    } else {
        rows
    };

    Ok(json!({
        "results": rows,
        "summary": LoanSummary::from(&sched.summary),
        "total_interest_paid": sched.total_interest_paid,
        "total_principal_paid": sched.total_principal_paid,
        "methodology": output.methodology,
        "warnings": output.warnings,
        "metadata": output.metadata,
    }))
}

/// Arguments for the first/middle/last year preview
#[derive(Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub quote: QuoteInputArgs,
}

pub fn run_preview(
    args: PreviewArgs,
    format: &CurrencyFormat,
) -> Result<Value, Box<dyn std::error::Error>> {
    let quote = args.quote.resolve()?;
    let output = schedule::calculate_schedule(&quote)?;
    let sched = &output.result;
    let preview = schedule::preview(sched).ok_or("schedule has no years to preview")?;

    let labelled = |label: &str, year: &YearSummary| -> Result<Value, Box<dyn std::error::Error>> {
        let mut row = json!({ "label": label });
        if let (Value::Object(dst), Value::Object(src)) = (&mut row, serde_json::to_value(year)?) {
            dst.extend(src);
        }
        Ok(row)
    };
    let rows = Value::Array(vec![
        labelled("first", &preview.first_year)?,
        labelled("middle", &preview.middle_year)?,
        labelled("last", &preview.last_year)?,
    ]);

    Ok(json!({
        "results": format_rows(rows, format)?,
        "summary": LoanSummary::from(&sched.summary),
        "methodology": output.methodology,
        "warnings": output.warnings,
        "metadata": output.metadata,
    }))
}

const MONEY_COLUMNS: &[&str] = &[
    "opening_balance",
    "payment",
    "payments",
    "interest",
    "principal",
    "closing_balance",
];

fn format_rows(
    rows: Value,
    format: &CurrencyFormat,
) -> Result<Value, Box<dyn std::error::Error>> {
    let items = match rows {
        Value::Array(items) => items,
        other => return Ok(other),
    };
    let mut out = Vec::with_capacity(items.len());
    for mut item in items {
        if let Value::Object(ref mut map) = item {
            for key in MONEY_COLUMNS {
                if let Some(amount) = map.get(*key).and_then(Value::as_f64) {
                    let text = presentation::format_amount(amount, format)?;
                    map.insert((*key).to_string(), Value::String(text));
                }
            }
        }
        out.push(item);
    }
    Ok(Value::Array(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn flags(amount: Option<f64>, rate: Option<f64>, tenure: Option<u32>) -> QuoteInputArgs {
        QuoteInputArgs {
            input: None,
            loan_amount: amount,
            rate,
            tenure,
            down_payment: 0.0,
        }
    }

    fn write_temp(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("emi-loan-{}-{}", std::process::id(), name));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_input_file_overrides_flags() {
        let path = write_temp(
            "override.json",
            r#"{"principal_requested": 500000, "down_payment": 50000,
                "annual_interest_rate_percent": 4.5, "tenure_years": 30}"#,
        );
        let mut args = flags(Some(1_000.0), Some(12.0), Some(2));
        args.down_payment = 100.0;
        args.input = Some(path.to_string_lossy().into_owned());

        let quote = args.resolve().unwrap();
        assert_eq!(quote, LoanQuote::new(500_000.0, 4.5, 30).with_down_payment(50_000.0));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_piped_json_overrides_flags() {
        let args = flags(Some(1_000.0), Some(12.0), Some(2));
        let piped = json!({
            "principal_requested": 20000,
            "annual_interest_rate_percent": 6,
            "tenure_years": 5,
        });
        let quote = args.resolve_piped(Some(piped)).unwrap();
        assert_eq!(quote, LoanQuote::new(20_000.0, 6.0, 5));
    }

    #[test]
    fn test_flags_default_to_no_down_payment() {
        let args = flags(Some(20_000.0), Some(6.0), Some(5));
        let quote = args.resolve_piped(None).unwrap();
        assert_eq!(quote.down_payment, 0.0);
        assert_eq!(quote.financed_principal(), 20_000.0);
        assert_eq!(quote.tenure_years, 5);
    }

    #[test]
    fn test_missing_rate_flag_reported() {
        let args = flags(Some(20_000.0), None, Some(5));
        let err = args.resolve_piped(None).unwrap_err();
        assert_eq!(err.to_string(), "--rate is required (or provide --input)");
    }

    #[test]
    fn test_missing_amount_reported_first() {
        let err = flags(None, None, None).resolve_piped(None).unwrap_err();
        assert_eq!(err.to_string(), "--loan-amount is required (or provide --input)");
    }

    #[test]
    fn test_quote_runs_engine_once_into_envelope() {
        let path = write_temp(
            "quote.json",
            r#"{"principal_requested": 20000,
                "annual_interest_rate_percent": 6, "tenure_years": 5}"#,
        );
        let mut quote = flags(None, None, None);
        quote.input = Some(path.to_string_lossy().into_owned());

        let value = run_quote(QuoteArgs { quote }, &CurrencyFormat::default()).unwrap();
        let direct = amortization::calculate_loan(&LoanQuote::new(20_000.0, 6.0, 5)).unwrap();
        assert_eq!(value["result"]["monthly_payment"], direct.result.monthly_payment);
        assert_eq!(value["methodology"], direct.methodology.as_str());
        assert_eq!(value["display"]["monthly_payment"], "₹387");
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_preview_forwards_schedule_envelope() {
        // below the calculator's minimum amount, so a warning is expected
        let path = write_temp(
            "preview.json",
            r#"{"principal_requested": 5000,
                "annual_interest_rate_percent": 6, "tenure_years": 5}"#,
        );
        let mut quote = flags(None, None, None);
        quote.input = Some(path.to_string_lossy().into_owned());

        let value = run_preview(PreviewArgs { quote }, &CurrencyFormat::default()).unwrap();
        assert_eq!(value["warnings"].as_array().unwrap().len(), 1);
        assert_eq!(value["methodology"], "Declining-balance amortization schedule");
        assert!(value["metadata"].is_object());
        assert_eq!(value["results"][0]["label"], "first");
        assert_eq!(value["results"][2]["year"], 5);
        fs::remove_file(path).unwrap();
    }
}
