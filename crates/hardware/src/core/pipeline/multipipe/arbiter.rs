//! Fixed-priority input arbiter.
//!
//! Picks the lowest-indexed lane whose request is high. The winner's index is the mux ID
//! the fan-in stamps into the record, so `id_width` is `num_bits(lanes)`.

use crate::common::{BuildError, mask, num_bits};

/// Outcome of one arbitration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Arbitration {
    /// Some lane requested.
    pub active: bool,
    /// Winning lane; 0 when inactive.
    pub selected: usize,
}

/// Selects the lowest-indexed requesting lane.
///
/// The priority is fixed: a lane that requests every tick starves all lanes above it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputPriorityArbiter {
    lanes: usize,
}

impl InputPriorityArbiter {
    /// Creates an arbiter over `lanes` lanes.
    ///
    /// # Errors
    ///
    /// [`BuildError::NoLanes`] when `lanes` is zero.
    pub fn new(lanes: usize) -> Result<Self, BuildError> {
        if lanes == 0 {
            return Err(BuildError::NoLanes);
        }
        Ok(Self { lanes })
    }

    /// Number of lanes.
    pub const fn lanes(&self) -> usize {
        self.lanes
    }

    /// Width of the lane ID in bits.
    pub const fn id_width(&self) -> u32 {
        num_bits(self.lanes)
    }

    /// Arbitrates between per-lane request flags.
    ///
    /// # Panics
    ///
    /// When `requests` does not have one flag per lane.
    pub fn select(&self, requests: &[bool]) -> Arbitration {
        assert_eq!(
            requests.len(),
            self.lanes,
            "protocol violation: arbiter over {} lanes given {} requests",
            self.lanes,
            requests.len()
        );
        requests
            .iter()
            .position(|&r| r)
            .map_or_else(Arbitration::default, |selected| Arbitration {
                active: true,
                selected,
            })
    }

    /// Arbitrates between lanes packed as bits of `requests`, lane 0 in bit 0.
    pub const fn select_bits(&self, requests: u64) -> Arbitration {
        let live = requests & mask(self.lanes as u32);
        if live == 0 {
            Arbitration {
                active: false,
                selected: 0,
            }
        } else {
            Arbitration {
                active: true,
                selected: live.trailing_zeros() as usize,
            }
        }
    }
}
