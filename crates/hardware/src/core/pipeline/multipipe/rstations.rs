//! Reservation stations.
//!
//! A fan-in, a shared pipe and a fan-out bundled into one multi-lane component. Results
//! leave on the lane that submitted them.

use tracing::debug;

use super::mux_in::PriorityCombMuxInPipe;
use super::mux_out::CombMuxOutPipe;
use crate::common::BuildError;
use crate::core::pipeline::builder::Node;
use crate::core::pipeline::record::{MuxId, Record};
use crate::core::pipeline::signals::{NextControl, PrevControl};
use crate::core::pipeline::stage::PassThroughStage;
use crate::core::pipeline::traits::{Clocked, CombPaths, Pipe};

/// A shared pipe behind a priority fan-in, with results routed home by a fan-out.
///
/// Lane `i` submits on `p(i)` and receives its results on `n(i)`; the mux ID stamped at
/// the fan-in is what brings them back.
#[derive(Debug)]
pub struct ReservationStations<A: Pipe> {
    mux_in: PriorityCombMuxInPipe<A::Input>,
    alu: A,
    mux_out: CombMuxOutPipe<PassThroughStage<A::Output>>,
}

impl<A> ReservationStations<A>
where
    A: Pipe,
    A::Input: MuxId,
    A::Output: MuxId,
{
    /// Puts `alu` behind `num_rows` lanes.
    ///
    /// # Errors
    ///
    /// [`BuildError::NoLanes`] when `num_rows` is zero.
    pub fn new(num_rows: usize, alu: A) -> Result<Self, BuildError> {
        let mux_in = PriorityCombMuxInPipe::new(PassThroughStage::new(alu.ispec()), num_rows)?;
        let mux_out = CombMuxOutPipe::new(PassThroughStage::new(alu.ospec()), num_rows)?;
        Self::from_parts(mux_in, alu, mux_out)
    }

    /// Like [`new`](Self::new), with one mask bit per lane so in-flight work can be
    /// cancelled lane by lane. `alu` must forward masks (see
    /// [`MaskCancellable`](crate::core::pipeline::controllers::MaskCancellable)).
    ///
    /// # Errors
    ///
    /// [`BuildError::NoLanes`] or [`BuildError::MaskTooWide`].
    pub fn with_masks(num_rows: usize, alu: A) -> Result<Self, BuildError> {
        let mux_in =
            PriorityCombMuxInPipe::with_masks(PassThroughStage::new(alu.ispec()), num_rows, 1)?;
        let mux_out =
            CombMuxOutPipe::new(PassThroughStage::new(alu.ospec()), num_rows)?.masked(1)?;
        Self::from_parts(mux_in, alu, mux_out)
    }

    /// Assembles prebuilt muxes around `alu`.
    ///
    /// # Errors
    ///
    /// [`BuildError::LaneCountMismatch`] when the two muxes disagree on the lane count.
    pub fn from_parts(
        mux_in: PriorityCombMuxInPipe<A::Input>,
        alu: A,
        mux_out: CombMuxOutPipe<PassThroughStage<A::Output>>,
    ) -> Result<Self, BuildError> {
        if mux_in.lanes() != mux_out.lanes() {
            return Err(BuildError::LaneCountMismatch {
                expected: mux_in.lanes(),
                found: mux_out.lanes(),
            });
        }
        debug!(rows = mux_in.lanes(), "reservation stations built");
        Ok(Self {
            mux_in,
            alu,
            mux_out,
        })
    }
}

impl<A: Pipe> ReservationStations<A> {
    /// Number of lanes.
    pub fn num_rows(&self) -> usize {
        self.mux_out.lanes()
    }

    /// The shared pipe.
    pub const fn alu(&self) -> &A {
        &self.alu
    }

    /// The fan-in.
    pub const fn mux_in(&self) -> &PriorityCombMuxInPipe<A::Input> {
        &self.mux_in
    }

    /// The fan-out.
    pub const fn mux_out(&self) -> &CombMuxOutPipe<PassThroughStage<A::Output>> {
        &self.mux_out
    }

    /// Downstream port of `lane`.
    pub fn n(&self, lane: usize) -> &NextControl<A::Output> {
        self.mux_out.n(lane)
    }

    /// Mutable downstream port of `lane`.
    pub fn n_mut(&mut self, lane: usize) -> &mut NextControl<A::Output> {
        self.mux_out.n_mut(lane)
    }
}

impl<A> ReservationStations<A>
where
    A: Pipe,
    A::Input: MuxId,
{
    /// Upstream port of `lane`.
    pub fn p(&self, lane: usize) -> &PrevControl<A::Input> {
        self.mux_in.p(lane)
    }

    /// Mutable upstream port of `lane`.
    pub fn p_mut(&mut self, lane: usize) -> &mut PrevControl<A::Input> {
        self.mux_in.p_mut(lane)
    }
}

impl<A> Clocked for ReservationStations<A>
where
    A: Pipe,
    A::Input: MuxId,
{
    fn settle_forward(&mut self) {
        self.mux_in.settle_forward();
        self.mux_in.n().forward_to(self.alu.p_mut());
        self.alu.settle_forward();
        self.alu.n().forward_to(self.mux_out.p_mut());
        self.mux_out.settle_forward();
    }

    fn settle_backward(&mut self) {
        self.mux_out.settle_backward();
        self.alu.n_mut().ready_from(self.mux_out.p());
        self.alu.settle_backward();
        self.mux_in.n_mut().ready_from(self.alu.p());
        self.mux_in.settle_backward();
    }

    fn clock(&mut self) {
        self.mux_in.clock();
        self.alu.clock();
        self.mux_out.clock();
    }

    fn reset(&mut self) {
        self.mux_in.reset();
        self.alu.reset();
        self.mux_out.reset();
    }

    fn comb_paths(&self) -> CombPaths {
        self.alu.comb_paths()
    }
}

impl<T, A> Node<T> for ReservationStations<A>
where
    T: Record + MuxId,
    A: Pipe<Input = T, Output = T>,
{
    fn num_inputs(&self) -> usize {
        self.mux_in.lanes()
    }

    fn num_outputs(&self) -> usize {
        self.mux_out.lanes()
    }

    fn input(&self, port: usize) -> &PrevControl<T> {
        self.mux_in.p(port)
    }

    fn input_mut(&mut self, port: usize) -> &mut PrevControl<T> {
        self.mux_in.p_mut(port)
    }

    fn output(&self, port: usize) -> &NextControl<T> {
        self.mux_out.n(port)
    }

    fn output_mut(&mut self, port: usize) -> &mut NextControl<T> {
        self.mux_out.n_mut(port)
    }
}
