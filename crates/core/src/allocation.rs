//! Proportional allocation of pooled amounts with exact-remainder closure.
//!
//! Every key except the last receives its weight share of the total, truncated
//! toward zero. The last key absorbs whatever is left, so:
//! - the sum of allocations EXACTLY equals the total (no cents lost)
//! - rounding error always lands on one designated key
//! - no allocation has a larger magnitude than the total, or the opposite sign
//!
//! The same routine splits pooled PO costs across SKUs, removes a proportional
//! slice of inventory value on a computed sale, and spreads SKU-less settlement
//! fees across brands.

use thiserror::Error;

use cogsbook_shared::types::Cents;

/// Errors that can occur while allocating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// No keys to allocate to.
    #[error("Cannot allocate across an empty weight list")]
    EmptyWeights,

    /// A weight was negative.
    #[error("Allocation weight cannot be negative: {0}")]
    NegativeWeight(i64),

    /// All weights were zero, so shares are undefined.
    #[error("Total allocation weight is zero")]
    ZeroTotalWeight,

    /// The weights do not fit in an `i64` sum.
    #[error("Allocation weights overflow")]
    Overflow,
}

impl AllocationError {
    /// Returns the error code for reporting.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyWeights => "EMPTY_WEIGHTS",
            Self::NegativeWeight(_) => "NEGATIVE_WEIGHT",
            Self::ZeroTotalWeight => "ZERO_TOTAL_WEIGHT",
            Self::Overflow => "ALLOCATION_OVERFLOW",
        }
    }
}

/// Splits `total` across `weights` in the supplied order.
///
/// The output has one entry per input key, in input order. The last key
/// absorbs the rounding remainder.
///
/// # Example
///
/// ```
/// use cogsbook_core::allocation::allocate;
///
/// let shares = allocate(100, &[("A", 1), ("B", 1), ("C", 1)]).unwrap();
/// assert_eq!(shares, vec![("A", 33), ("B", 33), ("C", 34)]);
/// ```
pub fn allocate<K: Clone>(
    total: Cents,
    weights: &[(K, i64)],
) -> Result<Vec<(K, Cents)>, AllocationError> {
    let Some(((last_key, _), rest)) = weights.split_last() else {
        return Err(AllocationError::EmptyWeights);
    };

    let mut total_weight: i64 = 0;
    for (_, weight) in weights {
        if *weight < 0 {
            return Err(AllocationError::NegativeWeight(*weight));
        }
        total_weight = total_weight
            .checked_add(*weight)
            .ok_or(AllocationError::Overflow)?;
    }
    if total_weight == 0 {
        return Err(AllocationError::ZeroTotalWeight);
    }

    let mut allocated: Cents = 0;
    let mut shares = Vec::with_capacity(weights.len());
    for (key, weight) in rest {
        let share = share_of(total, *weight, total_weight);
        allocated += share;
        shares.push((key.clone(), share));
    }
    shares.push((last_key.clone(), total - allocated));

    Ok(shares)
}

/// Share of `total` for one weight, truncated toward zero.
///
/// `|share| <= |total|` because `weight <= total_weight`, so the narrowing back
/// to `i64` cannot fail.
fn share_of(total: Cents, weight: i64, total_weight: i64) -> Cents {
    let exact = i128::from(total) * i128::from(weight) / i128::from(total_weight);
    Cents::try_from(exact).unwrap_or(total)
}
