//! Rank-addressed rendezvous bit masks.
use std::fmt;
use std::ops::{BitOr, BitOrAssign, Not};

use crate::Rank;

/// Bit set in which bit `i` stands for worker rank `i`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RendezvousMask(u64);

impl RendezvousMask {
    pub const EMPTY: RendezvousMask = RendezvousMask(0);
    pub const FULL: RendezvousMask = RendezvousMask(u64::MAX);

    /// Size of a mask on the wire.
    pub const WIRE_SIZE: usize = 8;

    pub const fn from_bits(bits: u64) -> RendezvousMask {
        RendezvousMask(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Mask with only the bit of `rank` set.
    pub fn rank(rank: Rank) -> RendezvousMask {
        debug_assert!(rank < 64);
        RendezvousMask(1 << rank)
    }

    /// Mask with the low `count` bits set.
    pub fn low(count: usize) -> RendezvousMask {
        if count >= 64 {
            RendezvousMask::FULL
        } else {
            RendezvousMask((1 << count) - 1)
        }
    }

    /// Match mask for a fleet of `count` workers: every bit but the
    /// participating ranks is already set.
    pub fn match_all(count: usize) -> RendezvousMask {
        !RendezvousMask::low(count)
    }

    pub fn contains(self, rank: Rank) -> bool {
        rank < 64 && self.0 & (1 << rank) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_full(self) -> bool {
        self.0 == u64::MAX
    }

    /// Lowest rank in the mask.
    pub fn first(self) -> Option<Rank> {
        if self.is_empty() {
            None
        } else {
            Some(self.0.trailing_zeros() as Rank)
        }
    }

    /// Ranks in the mask, in increasing order.
    pub fn ranks(self) -> impl Iterator<Item = Rank> {
        (0..64).filter(move |rank| self.contains(*rank))
    }

    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 8]) -> RendezvousMask {
        RendezvousMask(u64::from_le_bytes(bytes))
    }
}

impl fmt::Debug for RendezvousMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RendezvousMask({:#018x})", self.0)
    }
}

impl BitOr for RendezvousMask {
    type Output = RendezvousMask;

    fn bitor(self, rhs: RendezvousMask) -> RendezvousMask {
        RendezvousMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for RendezvousMask {
    fn bitor_assign(&mut self, rhs: RendezvousMask) {
        self.0 |= rhs.0;
    }
}

impl Not for RendezvousMask {
    type Output = RendezvousMask;

    fn not(self) -> RendezvousMask {
        RendezvousMask(!self.0)
    }
}

/// Receiving side of a rendezvous endpoint.
///
/// The value starts at the configured match mask and every report is OR-ed
/// into it. Ranks whose bit is still clear are outstanding; a blocking read
/// completes once none are left, returns the accumulated value and re-arms
/// the endpoint for the next round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchState {
    match_mask: RendezvousMask,
    value: RendezvousMask,
}

impl MatchState {
    pub fn new(match_mask: RendezvousMask) -> MatchState {
        MatchState {
            match_mask,
            value: match_mask,
        }
    }

    pub fn match_mask(&self) -> RendezvousMask {
        self.match_mask
    }

    /// Ranks that have not reported yet.
    pub fn outstanding(&self) -> RendezvousMask {
        !self.value
    }

    pub fn report(&mut self, mask: RendezvousMask) {
        self.value |= mask;
    }

    pub fn is_satisfied(&self) -> bool {
        self.value.is_full()
    }

    /// Return the accumulated value and re-arm with the match mask.
    pub fn take(&mut self) -> RendezvousMask {
        let value = self.value;
        self.value = self.match_mask;
        value
    }
}
