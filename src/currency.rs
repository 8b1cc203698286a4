//! Static currency conversion table.
//!
//! Rates are approximate point-in-time values to USD and should be
//! refreshed periodically. Pure lookups, no I/O.

use crate::error::{PipelineError, Result};

/// Conversion rate to USD for a currency code, if the code is known.
pub fn usd_rate(code: &str) -> Option<f64> {
    let rate = match code {
        "USD" => 1.0,

        // Major European currencies
        "EUR" => 1.09,
        "GBP" => 1.27,
        "CHF" => 1.11,

        // Nordic currencies
        "SEK" => 0.095,
        "DKK" => 0.146,
        "NOK" => 0.094,

        // Eastern European currencies
        "HUF" => 0.0026,
        "CZK" => 0.043,
        "PLN" => 0.25,

        // North American currencies
        "CAD" => 0.73,

        // Asia-Pacific currencies
        "JPY" => 0.0067,
        "AUD" => 0.65,
        "NZD" => 0.59,
        "HKD" => 0.128,
        "SGD" => 0.74,
        "THB" => 0.029,

        // South American currencies
        "ARS" => 0.001,
        "BRL" => 0.167,
        "MXN" => 0.049,

        // Other currencies
        "TRY" => 0.029,
        "ZAR" => 0.055,
        "ILS" => 0.274,

        _ => return None,
    };
    Some(rate)
}

/// Convert an amount from the given currency to USD.
///
/// Identity for USD; fails with `UnknownCurrency` for codes absent from
/// the table.
pub fn convert_to_usd(amount: f64, from_currency: &str) -> Result<f64> {
    if from_currency == "USD" {
        return Ok(amount);
    }

    let rate = usd_rate(from_currency)
        .ok_or_else(|| PipelineError::UnknownCurrency(from_currency.to_string()))?;

    Ok(amount * rate)
}

/// Fallback mapping from country name to currency code. Unmapped
/// countries default to USD.
pub fn currency_for_country(country: &str) -> &'static str {
    match country {
        "United States" => "USD",
        "Canada" => "CAD",
        "United Kingdom" => "GBP",
        "Germany" | "France" | "Italy" | "Spain" | "Austria" | "Netherlands" | "Belgium"
        | "Portugal" | "Greece" | "Malta" | "Ireland" => "EUR",
        "Switzerland" => "CHF",
        "Sweden" => "SEK",
        "Denmark" => "DKK",
        "Norway" => "NOK",
        "Hungary" => "HUF",
        "Czech Republic" => "CZK",
        "Poland" => "PLN",
        "Japan" => "JPY",
        "Australia" => "AUD",
        "New Zealand" => "NZD",
        "Hong Kong" => "HKD",
        "Singapore" => "SGD",
        "Thailand" => "THB",
        "Argentina" => "ARS",
        "Brazil" => "BRL",
        "Mexico" => "MXN",
        "Turkey" => "TRY",
        "South Africa" => "ZAR",
        "Israel" => "ILS",
        _ => "USD",
    }
}
