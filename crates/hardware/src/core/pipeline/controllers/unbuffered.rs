//! Unbuffered pipeline controller.
//!
//! Holds one input-shaped register and a valid flag. The stage runs combinationally on
//! the register every tick, so chaining several of these accumulates combinational depth
//! on the data path in exchange for the smallest amount of state per stage.
//!
//! Per tick:
//! - `valid_o = data_valid`, `data_o = process(r_data)`
//! - `ready_o = !data_valid || ready_i`
//! - `data_valid' = valid_i || (data_valid && !ready_i)`
//! - `r_data' = data_i` when `valid_i && ready_o`

use tracing::trace;

use crate::core::pipeline::signals::{NextControl, PrevControl};
use crate::core::pipeline::traits::{Clocked, CombPaths, Pipe, Stage};

/// One item in flight per stage, registered on the input side.
#[derive(Debug)]
pub struct UnbufferedPipeline<S: Stage> {
    stage: S,
    p: PrevControl<S::Input>,
    n: NextControl<S::Output>,
    data_valid: bool,
    r_data: S::Input,
}

impl<S: Stage> UnbufferedPipeline<S> {
    /// Wraps `stage` with a single-bit valid input.
    pub fn new(stage: S) -> Self {
        Self::with_valid_width(stage, 1)
    }

    /// Wraps `stage` with a `width`-bit valid input that counts only when all bits are set.
    pub fn with_valid_width(mut stage: S, width: u32) -> Self {
        stage.setup();
        Self {
            stage,
            p: PrevControl::with_valid_width(width),
            n: NextControl::default(),
            data_valid: false,
            r_data: S::Input::default(),
        }
    }

    /// The wrapped stage.
    pub const fn stage(&self) -> &S {
        &self.stage
    }

    /// Whether the input register holds an item.
    pub const fn is_occupied(&self) -> bool {
        self.data_valid
    }

    fn ready_i_test(&self) -> bool {
        self.n.ready_i && self.stage.d_valid(self.n.ready_i)
    }
}

impl<S: Stage> Clocked for UnbufferedPipeline<S> {
    fn settle_forward(&mut self) {
        self.n.valid_o = self.data_valid;
        self.n.data_o = self.stage.process(&self.r_data);
    }

    fn settle_backward(&mut self) {
        self.p.ready_o = (!self.data_valid || self.ready_i_test()) && self.stage.d_ready();
    }

    fn clock(&mut self) {
        let valid_i = self.p.valid_i_test() && self.stage.d_ready();
        let ready_i = self.ready_i_test();
        if valid_i && self.p.ready_o {
            trace!("unbuffered: latched input");
            self.r_data.clone_from(&self.p.data_i);
        }
        self.data_valid = valid_i || (self.data_valid && !ready_i);
    }

    fn reset(&mut self) {
        self.data_valid = false;
        self.r_data = S::Input::default();
    }

    fn comb_paths(&self) -> CombPaths {
        CombPaths::READY_THROUGH
    }
}

impl<S: Stage> Pipe for UnbufferedPipeline<S> {
    type Input = S::Input;
    type Output = S::Output;

    stage_ports!();
}
