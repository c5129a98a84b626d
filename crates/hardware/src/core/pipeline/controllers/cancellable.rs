//! Mask-cancellable register stage.
//!
//! Every transaction carries a mask naming the lane (or lanes) it belongs to. A stop
//! vector travels alongside the data, and any in-flight transaction whose mask intersects
//! it is dropped: it disappears from `valid_o` on the tick the stop bit is raised, and its
//! slot is free to be refilled at that tick's clock edge.

use tracing::trace;

use crate::core::pipeline::signals::{NextControl, PrevControl};
use crate::core::pipeline::traits::{Clocked, CombPaths, Pipe, Stage};

/// One-slot register stage whose contents can be cancelled.
#[derive(Debug)]
pub struct MaskCancellable<S: Stage> {
    stage: S,
    p: PrevControl<S::Input>,
    n: NextControl<S::Output>,
    r_valid: bool,
    r_mask: u64,
    r_data: S::Output,
    cancelled: u64,
}

impl<S: Stage> MaskCancellable<S> {
    /// Wraps `stage`.
    pub fn new(mut stage: S) -> Self {
        stage.setup();
        Self {
            stage,
            p: PrevControl::new(),
            n: NextControl::default(),
            r_valid: false,
            r_mask: 0,
            r_data: S::Output::default(),
            cancelled: 0,
        }
    }

    /// Number of transactions dropped by this stage since reset.
    pub const fn cancelled(&self) -> u64 {
        self.cancelled
    }

    /// Whether the held transaction survives the current stop vector.
    const fn live(&self) -> bool {
        self.r_valid && self.r_mask & !self.p.stop_i != 0
    }

    fn ready_i_test(&self) -> bool {
        self.n.ready_i && self.stage.d_valid(self.n.ready_i)
    }
}

impl<S: Stage> Clocked for MaskCancellable<S> {
    fn settle_forward(&mut self) {
        let live = self.live();
        self.n.valid_o = live;
        self.n.mask_o = if live { self.r_mask } else { 0 };
        self.n.stop_o = self.p.stop_i;
        self.n.data_o.clone_from(&self.r_data);
    }

    fn settle_backward(&mut self) {
        self.p.ready_o = (!self.live() || self.ready_i_test()) && self.stage.d_ready();
    }

    fn clock(&mut self) {
        let live = self.live();
        if self.r_valid && !live {
            trace!(mask = self.r_mask, "cancellable: dropped in-flight item");
            self.cancelled += 1;
        }
        let incoming = self.p.valid_i_test() && self.p.live_mask() != 0 && self.stage.d_ready();
        if incoming && self.p.ready_o {
            self.r_data = self.stage.process(&self.p.data_i);
            self.r_mask = self.p.mask_i;
            self.r_valid = true;
        } else if !live || self.ready_i_test() {
            self.r_valid = false;
            self.r_mask = 0;
        }
    }

    fn reset(&mut self) {
        self.r_valid = false;
        self.r_mask = 0;
        self.r_data = S::Output::default();
        self.cancelled = 0;
    }

    fn comb_paths(&self) -> CombPaths {
        CombPaths::THROUGH
    }
}

impl<S: Stage> Pipe for MaskCancellable<S> {
    type Input = S::Input;
    type Output = S::Output;

    stage_ports!();
}
