//! 32-bit arithmetic helpers used by instruction semantics. Results wrap in
//! two's complement and carry a signed-overflow flag so the caller decides
//! whether overflow faults.

/// Result of a host arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostArithResult {
    /// Wrapped 32-bit result.
    pub value: i32,
    /// Unsigned carry out of bit 31 (borrow for subtraction).
    pub carry: bool,
    /// Signed overflow of the 32-bit operation.
    pub overflow: bool,
}

impl HostArithResult {
    pub fn new(value: i32, carry: bool, overflow: bool) -> Self {
        Self {
            value,
            carry,
            overflow,
        }
    }
}

pub fn add(lhs: i32, rhs: i32) -> HostArithResult {
    let (sum, carry) = (lhs as u32).overflowing_add(rhs as u32);
    let value = sum as i32;
    let lhs_sign = lhs < 0;
    let rhs_sign = rhs < 0;
    let res_sign = value < 0;
    let overflow = (lhs_sign == rhs_sign) && (lhs_sign != res_sign);
    HostArithResult::new(value, carry, overflow)
}

pub fn sub(lhs: i32, rhs: i32) -> HostArithResult {
    let (diff, borrow) = (lhs as u32).overflowing_sub(rhs as u32);
    let value = diff as i32;
    let lhs_sign = lhs < 0;
    let rhs_sign = rhs < 0;
    let res_sign = value < 0;
    let overflow = (lhs_sign != rhs_sign) && (lhs_sign != res_sign);
    HostArithResult::new(value, borrow, overflow)
}
