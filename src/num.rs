use alloy_primitives::U256;

/// Basis-points denominator used for fee calculations.
const BPS_DENOMINATOR: u64 = 10_000;

/// Decimal scale of cross prices (10^18, the wei scale).
const PRICE_SCALE: u8 = 18;

/// Parse a decimal-string amount into a 256-bit unsigned integer.
///
/// Amounts arrive from the API as decimal strings since they routinely
/// exceed 64 bits. Returns None for anything that is not a plain
/// non-negative decimal number.
pub fn parse_amount(raw: &str) -> Option<U256> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<U256>().ok()
}

/// floor(value * numerator / denominator) without intermediate overflow
/// concerns beyond 256 bits. Returns None when the denominator is zero or
/// the product overflows.
pub fn mul_div(value: U256, numerator: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    value.checked_mul(numerator)?.checked_div(denominator)
}

/// 10^decimals as a 256-bit integer. None past 10^77, which no real token
/// decimals value reaches.
pub fn pow10(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// Cross price of `amount` against `base`, scaled by 10^18.
///
/// floor(amount * 10^18 / base), matching on-chain fixed-point conventions.
pub fn cross_price(amount: U256, base: U256) -> Option<U256> {
    mul_div(amount, pow10(PRICE_SCALE)?, base)
}

/// Direct price of `amount` against `base`, scaled by the counter token's
/// decimals: floor(amount * 10^decimals / base).
pub fn direct_price(amount: U256, decimals: u8, base: U256) -> Option<U256> {
    mul_div(amount, pow10(decimals)?, base)
}

/// Fee taken from `amount` at the given basis points, rounded down.
pub fn bps_fee(amount: U256, bips: u32) -> Option<U256> {
    mul_div(amount, U256::from(bips), U256::from(BPS_DENOMINATOR))
}
