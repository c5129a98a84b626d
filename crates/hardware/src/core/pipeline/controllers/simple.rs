//! Simple handshake controller.
//!
//! The stage runs on the input side and its result is registered. Readiness is passed
//! straight through from downstream, so a stall propagates upstream in the same tick.

use tracing::trace;

use crate::core::pipeline::signals::{NextControl, PrevControl};
use crate::core::pipeline::traits::{Clocked, CombPaths, Pipe, Stage};

/// Registered-output controller with `ready_o = ready_i`.
#[derive(Debug)]
pub struct SimpleHandshake<S: Stage> {
    stage: S,
    p: PrevControl<S::Input>,
    n: NextControl<S::Output>,
    r_busy: bool,
    r_out: S::Output,
}

impl<S: Stage> SimpleHandshake<S> {
    /// Wraps `stage`.
    pub fn new(mut stage: S) -> Self {
        stage.setup();
        Self {
            stage,
            p: PrevControl::new(),
            n: NextControl::default(),
            r_busy: false,
            r_out: S::Output::default(),
        }
    }

    /// The wrapped stage.
    pub const fn stage(&self) -> &S {
        &self.stage
    }

    fn ready_i_test(&self) -> bool {
        self.n.ready_i && self.stage.d_valid(self.n.ready_i)
    }
}

impl<S: Stage> Clocked for SimpleHandshake<S> {
    fn settle_forward(&mut self) {
        self.n.valid_o = self.r_busy;
        self.n.data_o.clone_from(&self.r_out);
    }

    fn settle_backward(&mut self) {
        self.p.ready_o = self.ready_i_test() && self.stage.d_ready();
    }

    fn clock(&mut self) {
        let valid_i = self.p.valid_i_test() && self.stage.d_ready();
        if valid_i && self.p.ready_o {
            trace!("simple handshake: registered result");
            self.r_out = self.stage.process(&self.p.data_i);
            self.r_busy = true;
        } else if self.ready_i_test() {
            self.r_busy = false;
        }
    }

    fn reset(&mut self) {
        self.r_busy = false;
        self.r_out = S::Output::default();
    }

    fn comb_paths(&self) -> CombPaths {
        CombPaths::READY_THROUGH
    }
}

impl<S: Stage> Pipe for SimpleHandshake<S> {
    type Input = S::Input;
    type Output = S::Output;

    stage_ports!();
}
