//! Stage and Controller Interfaces.
//!
//! This module defines the common traits for pipeline components. It provides:
//! 1. **Stage Interface:** A pure `process` function with declared input and output shapes.
//! 2. **Clocked Interface:** The three phases every stateful component runs each tick.
//! 3. **Pipe Interface:** A clocked component with one upstream and one downstream link,
//!    which is what `connect()` composes.
//!
//! # Tick model
//!
//! A tick settles the combinational network and then clocks every register at once.
//! Settling happens in two sweeps. The forward sweep derives `valid_o`/`data_o` from
//! registers and upstream `valid_i`/`data_i`; the backward sweep derives `ready_o` from
//! registers, downstream `ready_i`, and the now-settled valids. No component lets a
//! `valid` depend on a `ready`, so the two sweeps reach the fixed point directly.

use super::record::{Record, Shape};
use super::signals::{NextControl, PrevControl, TickInputs, TickOutputs};

/// A combinational processing step.
///
/// A stage holds no state that changes between ticks; anything that must persist lives
/// in the controller wrapping it.
pub trait Stage {
    /// Payload consumed by the stage.
    type Input: Record;
    /// Payload produced by the stage.
    type Output: Record;

    /// Declared shape of the input payload.
    fn ispec(&self) -> Shape;

    /// Declared shape of the output payload.
    fn ospec(&self) -> Shape;

    /// Computes the output for one input.
    fn process(&self, input: &Self::Input) -> Self::Output;

    /// Called once by a controller when it takes ownership of the stage.
    fn setup(&mut self) {}

    /// Dynamic readiness: `false` stalls the input side of the wrapping controller.
    fn d_ready(&self) -> bool {
        true
    }

    /// Dynamic validity: `false` holds the output side regardless of `ready_i`.
    fn d_valid(&self, _ready_i: bool) -> bool {
        true
    }
}

/// Which outputs of a component depend on its inputs within the same tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CombPaths {
    /// `valid_o`/`data_o` follow `valid_i`/`data_i` without a register in between.
    pub forward: bool,
    /// `ready_o` follows `ready_i` without a register in between.
    pub backward: bool,
}

impl CombPaths {
    /// Both directions are registered.
    pub const REGISTERED: Self = Self {
        forward: false,
        backward: false,
    };
    /// Only the ready path is combinational (the usual case for a registered stage).
    pub const READY_THROUGH: Self = Self {
        forward: false,
        backward: true,
    };
    /// Both directions are combinational.
    pub const THROUGH: Self = Self {
        forward: true,
        backward: true,
    };
}

/// A component that participates in the tick model.
pub trait Clocked {
    /// Settles `valid_o`/`data_o` from registers and upstream inputs.
    fn settle_forward(&mut self);

    /// Settles `ready_o` from registers, downstream readiness and settled valids.
    fn settle_backward(&mut self);

    /// Samples the settled signals and advances every register by one clock edge.
    fn clock(&mut self);

    /// Returns every register to its reset value.
    fn reset(&mut self);

    /// Combinational paths through this component.
    fn comb_paths(&self) -> CombPaths;
}

/// A clocked component with exactly one upstream and one downstream link.
///
/// Controllers implement this directly; `connect()` composes pipes into a larger pipe with
/// the same interface.
pub trait Pipe: Clocked {
    /// Payload accepted on the upstream link.
    type Input: Record;
    /// Payload offered on the downstream link.
    type Output: Record;

    /// Upstream port.
    fn p(&self) -> &PrevControl<Self::Input>;

    /// Mutable upstream port.
    fn p_mut(&mut self) -> &mut PrevControl<Self::Input>;

    /// Downstream port.
    fn n(&self) -> &NextControl<Self::Output>;

    /// Mutable downstream port.
    fn n_mut(&mut self) -> &mut NextControl<Self::Output>;

    /// Declared shape of the upstream payload.
    fn ispec(&self) -> Shape;

    /// Declared shape of the downstream payload.
    fn ospec(&self) -> Shape;

    /// Runs one full tick with the given inputs.
    ///
    /// Returns the outputs as they stood just before the clock edge: `ready_o` says whether
    /// `data_i` was accepted (when `valid_i` was high), `valid_o`/`data_o` what was offered.
    fn tick(&mut self, inputs: TickInputs<Self::Input>) -> TickOutputs<Self::Output> {
        let p = self.p_mut();
        p.set_valid(inputs.valid_i);
        p.data_i = inputs.data_i;
        self.n_mut().ready_i = inputs.ready_i;

        self.settle_forward();
        self.settle_backward();
        let outputs = TickOutputs {
            ready_o: self.p().ready_o,
            valid_o: self.n().valid_o,
            data_o: self.n().data_o.clone(),
        };
        self.clock();
        outputs
    }
}

impl<C: Clocked + ?Sized> Clocked for Box<C> {
    fn settle_forward(&mut self) {
        (**self).settle_forward();
    }

    fn settle_backward(&mut self) {
        (**self).settle_backward();
    }

    fn clock(&mut self) {
        (**self).clock();
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn comb_paths(&self) -> CombPaths {
        (**self).comb_paths()
    }
}

impl<P: Pipe + ?Sized> Pipe for Box<P> {
    type Input = P::Input;
    type Output = P::Output;

    fn p(&self) -> &PrevControl<P::Input> {
        (**self).p()
    }

    fn p_mut(&mut self) -> &mut PrevControl<P::Input> {
        (**self).p_mut()
    }

    fn n(&self) -> &NextControl<P::Output> {
        (**self).n()
    }

    fn n_mut(&mut self) -> &mut NextControl<P::Output> {
        (**self).n_mut()
    }

    fn ispec(&self) -> Shape {
        (**self).ispec()
    }

    fn ospec(&self) -> Shape {
        (**self).ospec()
    }
}
