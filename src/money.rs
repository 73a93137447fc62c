//! Money and volume helpers.
//!
//! Amounts are Kenyan shillings held as `Decimal`. Display values are
//! rounded to two places, half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to two decimal places, half away from zero
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Litres dispensed for an amount at a given price per litre.
///
/// Returns 0.00 unless both the amount and the price are positive.
pub fn litres_for(amount: Decimal, price_per_litre: Decimal) -> Decimal {
    if amount <= Decimal::ZERO || price_per_litre <= Decimal::ZERO {
        return Decimal::new(0, 2);
    }
    round2(amount / price_per_litre)
}

/// Amount payable for a volume at a given price per litre
pub fn amount_for(litres: Decimal, price_per_litre: Decimal) -> Decimal {
    if litres <= Decimal::ZERO || price_per_litre <= Decimal::ZERO {
        return Decimal::new(0, 2);
    }
    round2(litres * price_per_litre)
}

/// Format with thousands separators and two decimals, e.g. `15,000.50`
pub fn format_amount(value: Decimal) -> String {
    let rounded = round2(value);
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, fraction)
}

/// `KES 15,000.50`
pub fn format_kes(value: Decimal) -> String {
    format!("KES {}", format_amount(value))
}

/// Litres with two decimals, e.g. `8.50 L`
pub fn format_litres(value: Decimal) -> String {
    format!("{:.2} L", round2(value))
}
