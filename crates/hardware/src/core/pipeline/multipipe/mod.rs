//! Multi-lane fan-in and fan-out.
//!
//! Several producers share one pipeline by taking turns at a fan-in, and the results are
//! routed back by a fan-out. This module provides:
//! 1. **Arbiter:** Fixed-priority selection of the lowest-indexed valid lane.
//! 2. **Fan-in:** [`CombMultiInPipeline`] stamps the winning lane's ID into the record.
//! 3. **Fan-out:** [`CombMuxOutPipe`] offers each record only on the lane its ID names.
//! 4. **Reservation stations:** Fan-in, a shared pipe, and fan-out, bundled.
//!
//! Neither mux holds registers; latching is left to the pipe they surround. With per-lane
//! masks enabled, the fan-in places each lane's mask at bit offset `lane * maskwid` and
//! the fan-out slices the stop vector back the same way.

/// Fixed-priority input arbiter.
pub mod arbiter;

/// Combinational fan-in.
pub mod mux_in;

/// Combinational fan-out.
pub mod mux_out;

/// Fan-in, shared pipe, fan-out.
pub mod rstations;

pub use arbiter::{Arbitration, InputPriorityArbiter};
pub use mux_in::{CombMultiInPipeline, PriorityCombMuxInPipe};
pub use mux_out::CombMuxOutPipe;
pub use rstations::ReservationStations;

use crate::common::BuildError;

/// Checks that `lanes` masks of `width` bits fit the mask bus.
fn check_mask_width(lanes: usize, width: u32) -> Result<(), BuildError> {
    if lanes as u64 * u64::from(width) > u64::from(u64::BITS) {
        return Err(BuildError::MaskTooWide { lanes, width });
    }
    Ok(())
}
