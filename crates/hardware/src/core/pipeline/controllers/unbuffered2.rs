//! Unbuffered pipeline controller, output-buffered variant.
//!
//! While its buffer is empty the controller is a wire: `data_o` is the stage applied to
//! `data_i` in the same tick. When downstream refuses a valid output, that output is
//! copied into the buffer and presented from there until it is taken, and `ready_o` stays
//! low meanwhile. `ready_o` depends only on the buffer, so no ready path runs through it.
//!
//! Per tick:
//! - `valid_o = buf_full || valid_i`
//! - `ready_o = !buf_full`
//! - `data_o = if buf_full { buf } else { process(data_i) }`
//! - `buf_full' = valid_o && !ready_i`, `buf' = data_o`

use tracing::trace;

use crate::core::pipeline::signals::{NextControl, PrevControl};
use crate::core::pipeline::traits::{Clocked, CombPaths, Pipe, Stage};

/// Combinational stage with a one-entry skid buffer on its output.
#[derive(Debug)]
pub struct UnbufferedPipeline2<S: Stage> {
    stage: S,
    p: PrevControl<S::Input>,
    n: NextControl<S::Output>,
    buf_full: bool,
    buf: S::Output,
}

impl<S: Stage> UnbufferedPipeline2<S> {
    /// Wraps `stage`.
    pub fn new(mut stage: S) -> Self {
        stage.setup();
        Self {
            stage,
            p: PrevControl::new(),
            n: NextControl::default(),
            buf_full: false,
            buf: S::Output::default(),
        }
    }

    /// Whether a refused output is parked in the buffer.
    pub const fn is_holding(&self) -> bool {
        self.buf_full
    }

    fn valid_i_test(&self) -> bool {
        self.p.valid_i_test() && self.stage.d_ready()
    }

    fn ready_i_test(&self) -> bool {
        self.n.ready_i && self.stage.d_valid(self.n.ready_i)
    }
}

impl<S: Stage> Clocked for UnbufferedPipeline2<S> {
    fn settle_forward(&mut self) {
        self.n.valid_o = self.buf_full || self.valid_i_test();
        if self.buf_full {
            self.n.data_o.clone_from(&self.buf);
        } else {
            self.n.data_o = self.stage.process(&self.p.data_i);
        }
    }

    fn settle_backward(&mut self) {
        self.p.ready_o = !self.buf_full && self.stage.d_ready();
    }

    fn clock(&mut self) {
        let buf_full = self.n.valid_o && !self.ready_i_test();
        if buf_full && !self.buf_full {
            trace!("unbuffered2: output refused, buffered");
        }
        self.buf.clone_from(&self.n.data_o);
        self.buf_full = buf_full;
    }

    fn reset(&mut self) {
        self.buf_full = false;
        self.buf = S::Output::default();
        self.n.valid_o = false;
    }

    fn comb_paths(&self) -> CombPaths {
        CombPaths {
            forward: true,
            backward: false,
        }
    }
}

impl<S: Stage> Pipe for UnbufferedPipeline2<S> {
    type Input = S::Input;
    type Output = S::Output;

    stage_ports!();
}
