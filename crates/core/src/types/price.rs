//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., pesos, dollars).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price from a whole-unit integer amount.
    ///
    /// Shipping costs are computed in whole currency units.
    #[must_use]
    pub fn from_whole_units(amount: i64, currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::from(amount), currency_code)
    }

    /// Format for display, e.g. `"$6.100"` for CLP, `"$19.99"` for USD or
    /// `"€1.999,50"` for EUR.
    #[must_use]
    pub fn display(&self) -> String {
        let scale = self.currency_code.minor_units();
        let rounded = self.amount.round_dp(scale);
        let sign = if rounded.is_sign_negative() { "-" } else { "" };
        let abs = rounded.abs();
        let whole = abs.trunc();
        let grouped = group_thousands(&whole.to_string(), self.currency_code.group_separator());

        if scale == 0 {
            format!("{sign}{}{grouped}", self.currency_code.symbol())
        } else {
            let fraction = format!("{:.*}", scale as usize, abs - whole);
            let digits = fraction.split_once('.').map_or("", |(_, digits)| digits);
            format!(
                "{sign}{}{grouped}{}{digits}",
                self.currency_code.symbol(),
                self.currency_code.decimal_separator()
            )
        }
    }
}

/// Insert a separator every three digits from the right.
fn group_thousands(digits: &str, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    CLP,
    USD,
    EUR,
    ARS,
    MXN,
}

impl CurrencyCode {
    /// ISO 4217 code, as stored in the settings table.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CLP => "CLP",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::ARS => "ARS",
            Self::MXN => "MXN",
        }
    }

    /// Parse an ISO 4217 code (case-insensitive).
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        [Self::CLP, Self::USD, Self::EUR, Self::ARS, Self::MXN]
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code.trim()))
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::CLP | Self::USD | Self::ARS | Self::MXN => "$",
            Self::EUR => "€",
        }
    }

    /// Number of decimal places used when displaying amounts.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::CLP => 0,
            Self::USD | Self::EUR | Self::ARS | Self::MXN => 2,
        }
    }

    /// Thousands separator used by the currency's home locale.
    #[must_use]
    pub const fn group_separator(self) -> char {
        match self {
            Self::CLP | Self::EUR | Self::ARS => '.',
            Self::USD | Self::MXN => ',',
        }
    }

    /// Decimal separator used by the currency's home locale.
    #[must_use]
    pub const fn decimal_separator(self) -> char {
        match self {
            Self::CLP | Self::EUR | Self::ARS => ',',
            Self::USD | Self::MXN => '.',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clp_has_no_decimals_and_dot_grouping() {
        let price = Price::from_whole_units(6100, CurrencyCode::CLP);
        assert_eq!(price.display(), "$6.100");

        let price = Price::from_whole_units(1_234_567, CurrencyCode::CLP);
        assert_eq!(price.display(), "$1.234.567");
    }

    #[test]
    fn usd_keeps_two_decimals() {
        let price = Price::new(Decimal::new(199_950, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$1,999.50");
    }

    #[test]
    fn eur_and_ars_use_comma_decimals() {
        let price = Price::new(Decimal::new(199_950, 2), CurrencyCode::EUR);
        assert_eq!(price.display(), "€1.999,50");

        let price = Price::new(Decimal::new(1_234_505, 2), CurrencyCode::ARS);
        assert_eq!(price.display(), "$12.345,05");

        let price = Price::new(Decimal::new(-750, 2), CurrencyCode::EUR);
        assert_eq!(price.display(), "-€7,50");
    }

    #[test]
    fn small_amounts_are_not_grouped() {
        assert_eq!(Price::from_whole_units(0, CurrencyCode::CLP).display(), "$0");
        assert_eq!(Price::from_whole_units(999, CurrencyCode::CLP).display(), "$999");
    }

    #[test]
    fn currency_codes_round_trip_through_text() {
        assert_eq!(CurrencyCode::from_code("clp"), Some(CurrencyCode::CLP));
        assert_eq!(CurrencyCode::from_code(" USD "), Some(CurrencyCode::USD));
        assert_eq!(CurrencyCode::from_code("JPY"), None);
        assert_eq!(CurrencyCode::EUR.code(), "EUR");
    }

    #[test]
    fn default_currency_is_clp() {
        assert_eq!(CurrencyCode::default(), CurrencyCode::CLP);
    }
}
