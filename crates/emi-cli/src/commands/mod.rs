pub mod loan;

use clap::Args;
use emi_core::presentation::{CurrencyFormat, Locale, Notation, MAX_FRACTION_DIGITS};
use emi_core::Currency;

/// How amounts are rendered in the `display` section and formatted rows
#[derive(Args)]
pub struct DisplayArgs {
    /// Currency code for displayed amounts
    #[arg(long, default_value = "INR", global = true, env = "EMI_CURRENCY")]
    pub currency: Currency,

    /// Digit grouping locale (en-IN or en-US)
    #[arg(long, default_value = "en-IN", global = true, env = "EMI_LOCALE")]
    pub locale: Locale,

    /// Fraction digits kept when rounding displayed amounts
    #[arg(
        long,
        default_value_t = 0,
        global = true,
        env = "EMI_FRACTION_DIGITS",
        value_parser = clap::value_parser!(u32).range(0..=MAX_FRACTION_DIGITS as i64)
    )]
    pub fraction_digits: u32,

    /// Abbreviate large amounts (1.5L, 2.3M)
    #[arg(long, global = true)]
    pub compact: bool,
}

impl DisplayArgs {
    pub fn currency_format(&self) -> CurrencyFormat {
        CurrencyFormat {
            currency: self.currency.clone(),
            locale: self.locale,
            fraction_digits: self.fraction_digits,
            notation: if self.compact {
                Notation::Compact
            } else {
                Notation::Standard
            },
        }
    }
}
