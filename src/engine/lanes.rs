//! Priority lanes.
//!
//! Every update carries a lane. Only [`Lanes::SYNC`] exists today, but the
//! bitset shape, merge, and highest-priority selection are the ones a
//! multi-lane scheduler needs, so adding lanes does not touch the update,
//! hook, or commit contracts.

bitflags::bitflags! {
    /// A set of lanes. A single-bit set is a lane.
    ///
    /// Lower bits are higher priority.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Lanes: u32 {
        /// Synchronous work, rendered before the dispatching call returns.
        const SYNC = 0b0001;
    }
}

/// A single lane.
pub type Lane = Lanes;

/// The empty lane set.
pub const NO_LANES: Lanes = Lanes::empty();

/// Union of two lane sets.
#[inline]
pub fn merge_lanes(a: Lanes, b: Lanes) -> Lanes {
    a | b
}

/// The lane a new update should be tagged with.
#[inline]
pub fn request_update_lane() -> Lane {
    Lanes::SYNC
}

/// The highest-priority lane in `lanes` (its lowest set bit).
#[inline]
pub fn get_highest_priority_lane(lanes: Lanes) -> Lane {
    let bits = lanes.bits();
    Lanes::from_bits_retain(bits & bits.wrapping_neg())
}
