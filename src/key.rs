//! Key and value bounds for [`BPlusTree`](crate::BPlusTree).
//!
//! Keys and values are small, fixed-size and `Copy`. Nodes store them inline
//! in fixed arrays, so a node's footprint is known at compile time and can be
//! sized to whole cache lines.

use std::fmt as StdFmt;

/// Bound for tree keys: totally ordered, `Copy`, and shareable across query workers.
///
/// `Default` is only used to fill unoccupied node slots; the default key is
/// never observable through the tree's API.
pub trait TreeKey: Copy + Ord + Default + Send + Sync + 'static {}

impl<T> TreeKey for T where T: Copy + Ord + Default + Send + Sync + 'static {}

/// Bound for tree values.
pub trait TreeValue: Copy + Default + Send + Sync + 'static {}

impl<T> TreeValue for T where T: Copy + Default + Send + Sync + 'static {}

// ============================================================================
//  Accumulate
// ============================================================================

/// Widening additive reduction used by `sum` and `psum`.
///
/// Every element is widened into [`Accumulate::Acc`] before being added.
/// Addition wraps on overflow. Wrapping addition is associative and
/// commutative, so a serial sum and any parallel reduction order produce the
/// identical result; choosing an element type whose totals fit in `Acc` is the
/// caller's responsibility.
///
/// | Element | `Acc` |
/// |---------|-------|
/// | `u8`, `u16`, `u32`, `u64` | `u64` |
/// | `i8`, `i16`, `i32`, `i64` | `i64` |
/// | `u128` | `u128` |
/// | `i128` | `i128` |
pub trait Accumulate: Copy {
    /// Accumulator type.
    type Acc: Copy + Default + Eq + Send + Sync + StdFmt::Debug;

    /// Widen one element into the accumulator type.
    fn widen(self) -> Self::Acc;

    /// Combine two partial results.
    fn combine(a: Self::Acc, b: Self::Acc) -> Self::Acc;

    /// Fold a run of elements onto `acc`.
    #[inline]
    fn fold_slice(acc: Self::Acc, items: &[Self]) -> Self::Acc {
        items
            .iter()
            .fold(acc, |acc, &item| Self::combine(acc, item.widen()))
    }
}

macro_rules! impl_accumulate {
    ($($elem:ty => $acc:ty),* $(,)?) => {
        $(
            impl Accumulate for $elem {
                type Acc = $acc;

                #[inline(always)]
                fn widen(self) -> $acc {
                    <$acc>::from(self)
                }

                #[inline(always)]
                fn combine(a: $acc, b: $acc) -> $acc {
                    a.wrapping_add(b)
                }
            }
        )*
    };
}

impl_accumulate! {
    u8 => u64,
    u16 => u64,
    u32 => u64,
    u64 => u64,
    i8 => i64,
    i16 => i64,
    i32 => i64,
    i64 => i64,
    u128 => u128,
    i128 => i128,
}
