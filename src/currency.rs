//! Formats amounts of money in the user's currency.

use numfmt::{Formatter, Precision};

/// Formats numbers as amounts of one currency, e.g. "$1,234.50".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormatter {
    code: String,
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::new("USD")
    }
}

impl CurrencyFormatter {
    /// Create a formatter for the ISO 4217 currency `code`, e.g. "NZD".
    pub fn new(code: &str) -> Self {
        Self {
            code: code.trim().to_uppercase(),
        }
    }

    /// The ISO 4217 code of the currency, e.g. "USD".
    pub fn currency_code(&self) -> &str {
        &self.code
    }

    /// The prefix used for amounts, e.g. "$" or "CHF ".
    pub fn symbol(&self) -> String {
        match self.code.as_str() {
            "USD" => "$".to_owned(),
            "EUR" => "€".to_owned(),
            "GBP" => "£".to_owned(),
            "JPY" => "¥".to_owned(),
            "NZD" => "NZ$".to_owned(),
            "AUD" => "A$".to_owned(),
            "CAD" => "CA$".to_owned(),
            "INR" => "₹".to_owned(),
            code => format!("{code} "),
        }
    }

    /// Format `amount` with two decimal places and thousands separators.
    ///
    /// Amounts that are not a number, such as the preview of an amount that
    /// does not parse, are shown as the symbol followed by "NaN".
    pub fn format(&self, amount: f64) -> String {
        let symbol = self.symbol();

        if amount.is_nan() {
            return format!("{symbol}NaN");
        }

        let sign = if amount < 0.0 { "-" } else { "" };

        if amount.is_infinite() {
            return format!("{sign}{symbol}∞");
        }

        let magnitude = (amount.abs() * 100.0).round() / 100.0;

        // numfmt renders zero as "0" without the prefix
        if magnitude == 0.0 {
            return format!("{symbol}0.00");
        }

        let mut formatted = match Formatter::currency(&format!("{sign}{symbol}")) {
            Ok(formatter) => formatter
                .precision(Precision::Decimals(2))
                .fmt_string(magnitude),
            Err(error) => {
                tracing::warn!("Could not create a currency formatter for {symbol:?}: {error}");
                return format!("{sign}{symbol}{magnitude:.2}");
            }
        };

        // numfmt drops trailing zeros, e.g. "12.30" is rendered as "12.3"
        match formatted.rsplit_once('.') {
            None => formatted.push_str(".00"),
            Some((_, decimals)) if decimals.len() == 1 => formatted.push('0'),
            Some(_) => {}
        }

        formatted
    }
}
