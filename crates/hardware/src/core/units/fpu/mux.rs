//! Reservation stations around the pipelined adder.

use tracing::debug;

use super::format::FpFormat;
use super::pipeline::FpAddPipe;
use crate::common::BuildError;
use crate::config::Config;
use crate::core::pipeline::multipipe::ReservationStations;

/// Several operand lanes sharing one [`FpAddPipe`].
pub type FpAddMuxInOut = ReservationStations<FpAddPipe>;

/// Builds the shared adder and its lanes from `config`.
///
/// Lanes carry cancellation masks when the controller discipline supports them.
///
/// # Errors
///
/// Whatever [`Config::validate`], [`FpAddPipe::new`] or the reservation stations report.
pub fn fpadd_mux_in_out(config: &Config) -> Result<FpAddMuxInOut, BuildError> {
    config.validate()?;
    let fmt = FpFormat::standard(config.fpu.width)?;
    let kind = config.fpu.controller;
    let alu = FpAddPipe::new(fmt, kind, &config.queue)?;
    let rows = config.fpu.num_rows;
    debug!(rows, masked = kind.is_cancellable(), "fpadd reservation stations");
    if kind.is_cancellable() {
        ReservationStations::with_masks(rows, alu)
    } else {
        ReservationStations::new(rows, alu)
    }
}
