//! Pass-through handshake controller.
//!
//! One registered output. The controller accepts new input whenever its register is empty
//! or is being read this tick, and holds its contents otherwise.
//!
//! Per tick:
//! - `ready_o = !valid_o || ready_i`
//! - `valid_o' = (valid_i && ready_o) || (valid_o && !ready_i)`
//! - `r_data' = process(data_i)` when `valid_i && ready_o`

use tracing::trace;

use crate::core::pipeline::signals::{NextControl, PrevControl};
use crate::core::pipeline::traits::{Clocked, CombPaths, Pipe, Stage};

/// Registered-output controller that refills on the tick it is emptied.
#[derive(Debug)]
pub struct PassThroughHandshake<S: Stage> {
    stage: S,
    p: PrevControl<S::Input>,
    n: NextControl<S::Output>,
    r_valid: bool,
    r_data: S::Output,
}

impl<S: Stage> PassThroughHandshake<S> {
    /// Wraps `stage`.
    pub fn new(mut stage: S) -> Self {
        stage.setup();
        Self {
            stage,
            p: PrevControl::new(),
            n: NextControl::default(),
            r_valid: false,
            r_data: S::Output::default(),
        }
    }

    fn ready_i_test(&self) -> bool {
        self.n.ready_i && self.stage.d_valid(self.n.ready_i)
    }
}

impl<S: Stage> Clocked for PassThroughHandshake<S> {
    fn settle_forward(&mut self) {
        self.n.valid_o = self.r_valid;
        self.n.data_o.clone_from(&self.r_data);
    }

    fn settle_backward(&mut self) {
        self.p.ready_o = (!self.r_valid || self.ready_i_test()) && self.stage.d_ready();
    }

    fn clock(&mut self) {
        let accepted = self.p.valid_i_test() && self.stage.d_ready() && self.p.ready_o;
        if accepted {
            trace!("pass-through handshake: registered result");
            self.r_data = self.stage.process(&self.p.data_i);
        }
        self.r_valid = accepted || (self.r_valid && !self.ready_i_test());
    }

    fn reset(&mut self) {
        self.r_valid = false;
        self.r_data = S::Output::default();
    }

    fn comb_paths(&self) -> CombPaths {
        CombPaths::READY_THROUGH
    }
}

impl<S: Stage> Pipe for PassThroughHandshake<S> {
    type Input = S::Input;
    type Output = S::Output;

    stage_ports!();
}
