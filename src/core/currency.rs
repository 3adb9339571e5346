//! Currency registry and the selected currency pair

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
}

pub const CURRENCIES: &[Currency] = &[
    Currency { code: "USD", name: "US Dollar", flag: "🇺🇸" },
    Currency { code: "EUR", name: "Euro", flag: "🇪🇺" },
    Currency { code: "GBP", name: "British Pound", flag: "🇬🇧" },
    Currency { code: "JPY", name: "Japanese Yen", flag: "🇯🇵" },
    Currency { code: "AUD", name: "Australian Dollar", flag: "🇦🇺" },
    Currency { code: "CAD", name: "Canadian Dollar", flag: "🇨🇦" },
    Currency { code: "CHF", name: "Swiss Franc", flag: "🇨🇭" },
    Currency { code: "CNY", name: "Chinese Yuan", flag: "🇨🇳" },
    Currency { code: "INR", name: "Indian Rupee", flag: "🇮🇳" },
    Currency { code: "HKD", name: "Hong Kong Dollar", flag: "🇭🇰" },
    Currency { code: "SGD", name: "Singapore Dollar", flag: "🇸🇬" },
    Currency { code: "NZD", name: "New Zealand Dollar", flag: "🇳🇿" },
    Currency { code: "MXN", name: "Mexican Peso", flag: "🇲🇽" },
    Currency { code: "BRL", name: "Brazilian Real", flag: "🇧🇷" },
    Currency { code: "ZAR", name: "South African Rand", flag: "🇿🇦" },
    Currency { code: "SEK", name: "Swedish Krona", flag: "🇸🇪" },
    Currency { code: "NOK", name: "Norwegian Krone", flag: "🇳🇴" },
    Currency { code: "DKK", name: "Danish Krone", flag: "🇩🇰" },
    Currency { code: "PLN", name: "Polish Złoty", flag: "🇵🇱" },
    Currency { code: "THB", name: "Thai Baht", flag: "🇹🇭" },
    Currency { code: "RUB", name: "Russian Ruble", flag: "🇷🇺" },
    Currency { code: "TRY", name: "Turkish Lira", flag: "🇹🇷" },
    Currency { code: "KRW", name: "South Korean Won", flag: "🇰🇷" },
    Currency { code: "IDR", name: "Indonesian Rupiah", flag: "🇮🇩" },
    Currency { code: "MYR", name: "Malaysian Ringgit", flag: "🇲🇾" },
    Currency { code: "PHP", name: "Philippine Peso", flag: "🇵🇭" },
    Currency { code: "TWD", name: "Taiwan Dollar", flag: "🇹🇼" },
    Currency { code: "AED", name: "UAE Dirham", flag: "🇦🇪" },
    Currency { code: "SAR", name: "Saudi Riyal", flag: "🇸🇦" },
    Currency { code: "ILS", name: "Israeli Shekel", flag: "🇮🇱" },
];

/// Looks up a registry entry by its code, ignoring case.
pub fn find(code: &str) -> Option<&'static Currency> {
    CURRENCIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

/// Filters the registry by a case-insensitive match on code or name.
///
/// A blank query returns the whole registry.
pub fn search(query: &str) -> Vec<&'static Currency> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return CURRENCIES.iter().collect();
    }
    CURRENCIES
        .iter()
        .filter(|c| {
            c.code.to_lowercase().contains(&query) || c.name.to_lowercase().contains(&query)
        })
        .collect()
}

/// An ISO-4217 style three letter code, always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Wraps a literal already known to be a valid upper case code.
    pub(crate) fn from_static(code: &'static str) -> Self {
        CurrencyCode(code.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn name(&self) -> Option<&'static str> {
        find(&self.0).map(|c| c.name)
    }
}

impl FromStr for CurrencyCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(CurrencyCode(code.to_ascii_uppercase()))
        } else {
            Err(anyhow!("Invalid currency code: {}", s))
        }
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The (base, target) tuple every screen converts and analyzes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(base: CurrencyCode, target: CurrencyCode) -> Self {
        Self { base, target }
    }

    /// True when both sides are the same currency. Selection never produces
    /// such a pair, but one can still be constructed from configuration.
    pub fn is_identity(&self) -> bool {
        self.base == self.target
    }

    /// Selects a new base. Picking the current target swaps the previous base
    /// into the target slot.
    pub fn select_base(&mut self, code: CurrencyCode) {
        if code == self.target {
            self.target = self.base.clone();
        }
        if code == self.target {
            self.target = first_other_than(&code);
        }
        self.base = code;
    }

    /// Selects a new target. Picking the current base swaps the previous
    /// target into the base slot.
    pub fn select_target(&mut self, code: CurrencyCode) {
        if code == self.base {
            self.base = self.target.clone();
        }
        if code == self.base {
            self.base = first_other_than(&code);
        }
        self.target = code;
    }
}

/// Swap partner when the previous value equals the selection, which only
/// happens when reselecting a side of an identity pair.
fn first_other_than(code: &CurrencyCode) -> CurrencyCode {
    CURRENCIES
        .iter()
        .find(|c| c.code != code.as_str())
        .map_or_else(|| code.clone(), |c| CurrencyCode::from_static(c.code))
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base, self.target)
    }
}
