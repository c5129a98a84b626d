//! Combinational fan-in.
//!
//! This module merges several upstream lanes into one downstream link. It provides:
//! 1. **Selection:** The arbiter's winner drives `valid`, `data` and the mux ID.
//! 2. **Back-pressure:** Only the winning lane sees downstream `ready`.
//! 3. **Masks:** With per-lane masks, each lane's mask is placed at `lane * maskwid` and
//!    the stop vector is built the same way.

use tracing::trace;

use super::arbiter::{Arbitration, InputPriorityArbiter};
use super::check_mask_width;
use crate::common::{BuildError, mask};
use crate::core::pipeline::builder::Node;
use crate::core::pipeline::record::{MuxId, Shape};
use crate::core::pipeline::signals::{NextControl, PrevControl};
use crate::core::pipeline::stage::PassThroughStage;
use crate::core::pipeline::traits::{Clocked, CombPaths, Stage};

/// Many upstream lanes, one downstream link, arbitrated by lane priority.
///
/// The winning lane's record passes through the stage with its mux ID set to the lane
/// number. Losing lanes see `ready_o` low.
#[derive(Debug)]
pub struct CombMultiInPipeline<S: Stage> {
    stage: S,
    arbiter: InputPriorityArbiter,
    p: Vec<PrevControl<S::Input>>,
    n: NextControl<S::Output>,
    maskwid: u32,
    current: Arbitration,
    accepted: Vec<u64>,
}

/// Priority fan-in that forwards records unchanged apart from the mux ID.
pub type PriorityCombMuxInPipe<T> = CombMultiInPipeline<PassThroughStage<T>>;

impl<S> CombMultiInPipeline<S>
where
    S: Stage,
    S::Input: MuxId,
{
    /// Creates a fan-in over `lanes` lanes without masks.
    ///
    /// # Errors
    ///
    /// [`BuildError::NoLanes`] when `lanes` is zero.
    pub fn new(stage: S, lanes: usize) -> Result<Self, BuildError> {
        Self::with_masks(stage, lanes, 0)
    }

    /// Creates a fan-in whose lanes carry `maskwid`-bit cancellation masks.
    ///
    /// # Errors
    ///
    /// [`BuildError::NoLanes`] when `lanes` is zero, [`BuildError::MaskTooWide`] when the
    /// concatenated masks exceed 64 bits.
    pub fn with_masks(mut stage: S, lanes: usize, maskwid: u32) -> Result<Self, BuildError> {
        let arbiter = InputPriorityArbiter::new(lanes)?;
        check_mask_width(lanes, maskwid)?;
        stage.setup();
        Ok(Self {
            stage,
            arbiter,
            p: (0..lanes).map(|_| PrevControl::new()).collect(),
            n: NextControl::default(),
            maskwid,
            current: Arbitration::default(),
            accepted: vec![0; lanes],
        })
    }

    /// Number of lanes.
    pub fn lanes(&self) -> usize {
        self.p.len()
    }

    /// Upstream port of `lane`.
    pub fn p(&self, lane: usize) -> &PrevControl<S::Input> {
        &self.p[lane]
    }

    /// Mutable upstream port of `lane`.
    pub fn p_mut(&mut self, lane: usize) -> &mut PrevControl<S::Input> {
        &mut self.p[lane]
    }

    /// Downstream port.
    pub const fn n(&self) -> &NextControl<S::Output> {
        &self.n
    }

    /// Mutable downstream port.
    pub const fn n_mut(&mut self) -> &mut NextControl<S::Output> {
        &mut self.n
    }

    /// Result of the current tick's arbitration.
    pub const fn arbitration(&self) -> Arbitration {
        self.current
    }

    /// Transfers accepted from `lane` since reset.
    pub fn accepted(&self, lane: usize) -> u64 {
        self.accepted[lane]
    }

    /// Declared shape of each upstream lane.
    pub fn ispec(&self) -> Shape {
        self.stage.ispec()
    }

    /// Declared shape of the downstream link.
    pub fn ospec(&self) -> Shape {
        self.stage.ospec()
    }

    fn requests(&self) -> Vec<bool> {
        self.p
            .iter()
            .map(|port| {
                port.valid_i_test() && (self.maskwid == 0 || port.live_mask() & mask(self.maskwid) != 0)
            })
            .collect()
    }

    fn ready_i_test(&self) -> bool {
        self.n.ready_i && self.stage.d_valid(self.n.ready_i)
    }
}

impl<S> Clocked for CombMultiInPipeline<S>
where
    S: Stage,
    S::Input: MuxId,
{
    fn settle_forward(&mut self) {
        self.current = self.arbiter.select(&self.requests());
        let Arbitration { active, selected } = self.current;

        self.n.valid_o = active && self.stage.d_ready();
        if active {
            let mut stamped = self.p[selected].data_i.clone();
            stamped.set_muxid(selected);
            self.n.data_o = self.stage.process(&stamped);
        }

        if self.maskwid > 0 {
            let m = mask(self.maskwid);
            let shift = |lane: usize| lane as u32 * self.maskwid;
            self.n.mask_o = if active {
                (self.p[selected].mask_i & m) << shift(selected)
            } else {
                0
            };
            self.n.stop_o = self
                .p
                .iter()
                .enumerate()
                .fold(0, |acc, (lane, port)| acc | (port.stop_i & m) << shift(lane));
        }
    }

    fn settle_backward(&mut self) {
        let ready = self.ready_i_test() && self.stage.d_ready();
        let Arbitration { active, selected } = self.current;
        for (lane, port) in self.p.iter_mut().enumerate() {
            port.ready_o = active && lane == selected && ready;
        }
    }

    fn clock(&mut self) {
        let Arbitration { active, selected } = self.current;
        if active && self.n.valid_o && self.p[selected].ready_o {
            trace!(lane = selected, "fan-in: accepted");
            self.accepted[selected] += 1;
        }
    }

    fn reset(&mut self) {
        self.current = Arbitration::default();
        self.accepted.fill(0);
    }

    fn comb_paths(&self) -> CombPaths {
        CombPaths::THROUGH
    }
}

impl<T, S> Node<T> for CombMultiInPipeline<S>
where
    T: MuxId,
    S: Stage<Input = T, Output = T>,
{
    fn num_inputs(&self) -> usize {
        self.p.len()
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn input(&self, port: usize) -> &PrevControl<T> {
        &self.p[port]
    }

    fn input_mut(&mut self, port: usize) -> &mut PrevControl<T> {
        &mut self.p[port]
    }

    fn output(&self, _port: usize) -> &NextControl<T> {
        &self.n
    }

    fn output_mut(&mut self, _port: usize) -> &mut NextControl<T> {
        &mut self.n
    }
}
