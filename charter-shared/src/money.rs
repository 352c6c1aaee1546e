//! Currency helpers. Amounts travel as integer minor units; strings are for display only.

const ZERO_DECIMAL: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "JPY", "KMF", "KRW", "MGA", "PYG", "RWF", "UGX", "VND", "VUV", "XAF",
    "XOF", "XPF",
];

/// Number of decimal places in the currency's minor unit.
pub fn currency_exponent(currency: &str) -> u32 {
    let code = currency.to_ascii_uppercase();
    if ZERO_DECIMAL.contains(&code.as_str()) {
        0
    } else {
        2
    }
}

/// Converts a major-unit amount (as the provider's native API reports it) to minor units.
pub fn to_minor(amount: f64, currency: &str) -> i64 {
    let factor = 10f64.powi(currency_exponent(currency) as i32);
    (amount * factor).round() as i64
}

/// Rescales an amount from one decimal precision to another, rounding half away from zero.
pub fn rescale(amount: i64, from_precision: u32, to_precision: u32) -> i64 {
    if from_precision == to_precision {
        return amount;
    }
    if to_precision > from_precision {
        amount * 10i64.pow(to_precision - from_precision)
    } else {
        let divisor = 10i64.pow(from_precision - to_precision);
        let half = divisor / 2;
        if amount >= 0 {
            (amount + half) / divisor
        } else {
            (amount - half) / divisor
        }
    }
}

fn symbol(currency: &str) -> Option<&'static str> {
    match currency.to_ascii_uppercase().as_str() {
        "EUR" => Some("€"),
        "USD" => Some("$"),
        "GBP" => Some("£"),
        _ => None,
    }
}

/// Formats minor units for display, e.g. `15050, "EUR"` → `€150.50`.
pub fn format_minor(amount_minor: i64, currency: &str) -> String {
    let exponent = currency_exponent(currency);
    let sign = if amount_minor < 0 { "-" } else { "" };
    let abs = amount_minor.unsigned_abs();
    let body = if exponent == 0 {
        abs.to_string()
    } else {
        let factor = 10u64.pow(exponent);
        format!("{}.{:0width$}", abs / factor, abs % factor, width = exponent as usize)
    };
    match symbol(currency) {
        Some(s) => format!("{}{}{}", sign, s, body),
        None => format!("{}{} {}", sign, currency.to_ascii_uppercase(), body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_common_currencies() {
        assert_eq!(format_minor(15050, "EUR"), "€150.50");
        assert_eq!(format_minor(5, "usd"), "$0.05");
        assert_eq!(format_minor(1200, "JPY"), "JPY 1200");
        assert_eq!(format_minor(-250, "NOK"), "-NOK 2.50");
    }

    #[test]
    fn converts_major_to_minor() {
        assert_eq!(to_minor(150.5, "EUR"), 15050);
        assert_eq!(to_minor(19.99, "EUR"), 1999);
        assert_eq!(to_minor(1200.0, "JPY"), 1200);
    }

    #[test]
    fn rescales_precision() {
        assert_eq!(rescale(15000, 2, 2), 15000);
        assert_eq!(rescale(150, 0, 2), 15000);
        assert_eq!(rescale(15055, 3, 2), 1506);
    }
}
