/// Proportional sale tax.
pub const TAX_RATE: f64 = 0.02;

/// Maximum tax charged on a single item, in coins.
pub const MAX_TAX: f64 = 5_000_000.0;

/// Price a seller actually receives for one unit.
///
/// `price - min(price * TAX_RATE, MAX_TAX)`, rounded half-up. `None` in,
/// or a non-finite price, gives `None` out.
pub fn price_after_tax(price: Option<f64>) -> Option<i64> {
    let price = price.filter(|p| p.is_finite())?;
    let tax = (price * TAX_RATE).min(MAX_TAX);
    Some(round_half_up(price - tax))
}

pub(crate) fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
