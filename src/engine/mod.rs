// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod allocation;
pub mod enrichment;
pub mod insights;
pub mod projection;
pub mod recurring;
pub mod retirement;

use rust_decimal::{Decimal, MathematicalOps};

/// Equivalent monthly rate for an effective annual rate: `(1 + r)^(1/12) - 1`.
pub fn monthly_rate(annual_rate: Decimal) -> Decimal {
    if annual_rate.is_zero() {
        return Decimal::ZERO;
    }
    let twelfth = Decimal::ONE / Decimal::from(12);
    (Decimal::ONE + annual_rate).powd(twelfth) - Decimal::ONE
}

/// `principal × (1 + rate)^years`, with fractional years allowed.
pub fn compound(principal: Decimal, annual_rate: Decimal, years: Decimal) -> Decimal {
    if years <= Decimal::ZERO || annual_rate.is_zero() {
        return principal;
    }
    principal * (Decimal::ONE + annual_rate).powd(years)
}

/// Percentage of `used` against `limit`; a zero limit reports 0 rather than dividing.
pub fn percent_of(used: Decimal, limit: Decimal) -> Decimal {
    if limit.is_zero() {
        return Decimal::ZERO;
    }
    used / limit * Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_rate_compounds_back_to_annual() {
        let annual = Decimal::new(95, 3);
        let m = monthly_rate(annual);
        let back = (Decimal::ONE + m).powi(12) - Decimal::ONE;
        assert!((back - annual).abs() < Decimal::new(1, 6), "got {}", back);
        assert!(m > Decimal::new(75, 4) && m < Decimal::new(77, 4));
    }

    #[test]
    fn compound_with_non_positive_horizon_is_identity() {
        let p = Decimal::from(1000);
        assert_eq!(compound(p, Decimal::new(1, 1), Decimal::ZERO), p);
        assert_eq!(compound(p, Decimal::new(1, 1), Decimal::from(-2)), p);
    }

    #[test]
    fn percent_of_zero_limit_is_zero() {
        assert_eq!(percent_of(Decimal::from(50), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(
            percent_of(Decimal::from(700), Decimal::from(1000)),
            Decimal::from(70)
        );
    }
}
