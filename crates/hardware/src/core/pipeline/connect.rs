//! Recursive pipeline composition.
//!
//! `connect()` wires the downstream port of each pipe to the upstream port of the next and
//! exposes the first upstream and last downstream ports as its own. The composite holds no
//! registers; all state stays in the member pipes. Two forms are provided:
//! 1. **Connected:** A typed pair whose payload compatibility is checked by the compiler.
//!    [`connect!`](crate::connect) nests pairs for longer chains.
//! 2. **PipeChain:** A run-time list of boxed pipes over one payload type.

use std::fmt;

use tracing::debug;

use super::record::{Record, Shape};
use super::signals::{NextControl, PrevControl};
use super::traits::{Clocked, CombPaths, Pipe};
use crate::common::BuildError;

/// Two pipes connected back to back.
#[derive(Debug)]
pub struct Connected<A, B> {
    first: A,
    second: B,
}

impl<A, B> Connected<A, B>
where
    A: Pipe,
    B: Pipe<Input = A::Output>,
{
    /// Connects `first.n` to `second.p`.
    ///
    /// # Errors
    ///
    /// [`BuildError::ShapeMismatch`] when the declared shapes do not fit.
    pub fn new(first: A, second: B) -> Result<Self, BuildError> {
        let (out, inp) = (first.ospec(), second.ispec());
        if !out.is_assignable_to(&inp) {
            return Err(BuildError::ShapeMismatch {
                from: out.to_string(),
                to: inp.to_string(),
            });
        }
        Ok(Self { first, second })
    }

    /// Upstream member.
    pub const fn first(&self) -> &A {
        &self.first
    }

    /// Downstream member.
    pub const fn second(&self) -> &B {
        &self.second
    }
}

impl<A, B> Clocked for Connected<A, B>
where
    A: Pipe,
    B: Pipe<Input = A::Output>,
{
    fn settle_forward(&mut self) {
        self.first.settle_forward();
        self.first.n().forward_to(self.second.p_mut());
        self.second.settle_forward();
    }

    fn settle_backward(&mut self) {
        self.second.settle_backward();
        self.first.n_mut().ready_from(self.second.p());
        self.first.settle_backward();
    }

    fn clock(&mut self) {
        self.first.clock();
        self.second.clock();
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }

    fn comb_paths(&self) -> CombPaths {
        let (a, b) = (self.first.comb_paths(), self.second.comb_paths());
        CombPaths {
            forward: a.forward && b.forward,
            backward: a.backward && b.backward,
        }
    }
}

impl<A, B> Pipe for Connected<A, B>
where
    A: Pipe,
    B: Pipe<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn p(&self) -> &PrevControl<A::Input> {
        self.first.p()
    }

    fn p_mut(&mut self) -> &mut PrevControl<A::Input> {
        self.first.p_mut()
    }

    fn n(&self) -> &NextControl<B::Output> {
        self.second.n()
    }

    fn n_mut(&mut self) -> &mut NextControl<B::Output> {
        self.second.n_mut()
    }

    fn ispec(&self) -> Shape {
        self.first.ispec()
    }

    fn ospec(&self) -> Shape {
        self.second.ospec()
    }
}

/// Connects one or more pipes, folding from the left.
///
/// Evaluates to `Result<_, BuildError>`; a single pipe is returned as-is. An empty
/// invocation does not compile.
#[macro_export]
macro_rules! connect {
    ($only:expr $(,)?) => {
        ::core::result::Result::<_, $crate::common::BuildError>::Ok($only)
    };
    ($first:expr, $second:expr $(, $rest:expr)* $(,)?) => {
        $crate::core::pipeline::connect::Connected::new($first, $second)
            $(.and_then(|chain| $crate::core::pipeline::connect::Connected::new(chain, $rest)))*
    };
}

/// A boxed pipe over a single payload type.
pub type BoxedPipe<T> = Box<dyn Pipe<Input = T, Output = T>>;

/// A run-time list of connected pipes over one payload type.
pub struct PipeChain<T> {
    pipes: Vec<BoxedPipe<T>>,
}

impl<T: Record> PipeChain<T> {
    /// Connects `pipes` in order.
    ///
    /// # Errors
    ///
    /// [`BuildError::EmptyConnect`] for an empty list, [`BuildError::ShapeMismatch`] when a
    /// neighbouring pair does not fit.
    pub fn connect(pipes: Vec<BoxedPipe<T>>) -> Result<Self, BuildError> {
        if pipes.is_empty() {
            return Err(BuildError::EmptyConnect);
        }
        for pair in pipes.windows(2) {
            let (out, inp) = (pair[0].ospec(), pair[1].ispec());
            if !out.is_assignable_to(&inp) {
                return Err(BuildError::ShapeMismatch {
                    from: out.to_string(),
                    to: inp.to_string(),
                });
            }
        }
        debug!(len = pipes.len(), "pipes connected");
        Ok(Self { pipes })
    }

    /// Number of member pipes.
    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    /// Always `false`: construction rejects empty lists.
    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    fn last(&self) -> usize {
        self.pipes.len() - 1
    }
}

impl<T> fmt::Debug for PipeChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeChain")
            .field("len", &self.pipes.len())
            .finish()
    }
}

impl<T: Record> Clocked for PipeChain<T> {
    fn settle_forward(&mut self) {
        let len = self.pipes.len();
        for i in 0..len {
            self.pipes[i].settle_forward();
            if i + 1 < len {
                let (before, after) = self.pipes.split_at_mut(i + 1);
                before[i].n().forward_to(after[0].p_mut());
            }
        }
    }

    fn settle_backward(&mut self) {
        for i in (0..self.pipes.len()).rev() {
            self.pipes[i].settle_backward();
            if i > 0 {
                let (before, after) = self.pipes.split_at_mut(i);
                before[i - 1].n_mut().ready_from(after[0].p());
            }
        }
    }

    fn clock(&mut self) {
        for pipe in &mut self.pipes {
            pipe.clock();
        }
    }

    fn reset(&mut self) {
        for pipe in &mut self.pipes {
            pipe.reset();
        }
    }

    fn comb_paths(&self) -> CombPaths {
        self.pipes.iter().fold(CombPaths::THROUGH, |acc, pipe| {
            let paths = pipe.comb_paths();
            CombPaths {
                forward: acc.forward && paths.forward,
                backward: acc.backward && paths.backward,
            }
        })
    }
}

impl<T: Record> Pipe for PipeChain<T> {
    type Input = T;
    type Output = T;

    fn p(&self) -> &PrevControl<T> {
        self.pipes[0].p()
    }

    fn p_mut(&mut self) -> &mut PrevControl<T> {
        self.pipes[0].p_mut()
    }

    fn n(&self) -> &NextControl<T> {
        self.pipes[self.last()].n()
    }

    fn n_mut(&mut self) -> &mut NextControl<T> {
        let last = self.last();
        self.pipes[last].n_mut()
    }

    fn ispec(&self) -> Shape {
        self.pipes[0].ispec()
    }

    fn ospec(&self) -> Shape {
        self.pipes[self.last()].ospec()
    }
}
