//! Display-price parsing and formatting.
//!
//! Product cards and cart entries carry prices as display strings such as
//! `"Rs. 1,200"`. Arithmetic happens on [`Decimal`] values parsed from those
//! strings, and totals are formatted back into the same display form.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

/// Prefix used when rendering amounts.
pub const CURRENCY_PREFIX: &str = "Rs. ";

/// Flat delivery fee added to every order subtotal.
pub const FLAT_FEE: Decimal = Decimal::from_parts(150, 0, 0, false, 0);

/// Fraction digits kept when formatting (matches `en-US` locale output).
const MAX_FRACTION_DIGITS: u32 = 3;

/// Currency markers (`rs`, `rs.`) and thousands separators.
static PRICE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rs\.?|,").expect("price noise pattern is valid"));

/// Parse a display price into a decimal amount.
///
/// Matching is case-insensitive: the text is lower-cased, every `rs`/`rs.`
/// marker and `,` separator is removed, and the remainder is trimmed and
/// parsed. Anything that does not parse yields zero.
///
/// ```
/// use moon_bling_core::parse_price;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_price("Rs. 1,200"), Decimal::from(1200));
/// assert_eq!(parse_price("RS 99.50"), Decimal::new(9950, 2));
/// assert_eq!(parse_price("call for price"), Decimal::ZERO);
/// ```
#[must_use]
pub fn parse_price(text: &str) -> Decimal {
    let lowered = text.to_lowercase();
    let cleaned = PRICE_NOISE.replace_all(&lowered, "");
    Decimal::from_str(cleaned.trim()).unwrap_or(Decimal::ZERO)
}

/// Format an amount as a display price with grouped thousands.
///
/// Up to three fraction digits are kept and trailing zeros dropped, so whole
/// amounts render without a decimal point.
///
/// ```
/// use moon_bling_core::format_price;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_price(Decimal::from(2550)), "Rs. 2,550");
/// assert_eq!(format_price(Decimal::new(12345678, 3)), "Rs. 12,345.678");
/// ```
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(MAX_FRACTION_DIGITS, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (whole, fraction) = text
        .split_once('.')
        .map_or((text.as_str(), None), |(whole, fraction)| (whole, Some(fraction)));

    let mut out = String::from(CURRENCY_PREFIX);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&group_thousands(whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Insert `,` between every group of three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
