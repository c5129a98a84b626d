//! Stage implementations and combinational composition.
//!
//! This module provides the reusable stages of the framework:
//! 1. **PassThroughStage:** The identity stage, used by registers and multiplexers.
//! 2. **FnStage:** Wraps a closure as a stage with explicit shapes.
//! 3. **StageChain:** Two stages composed back to back with no register in between;
//!    nest it (or use [`stage_chain!`](crate::stage_chain)) for longer chains.
//! 4. **StageList:** A run-time list of same-typed stages composed the same way.

use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use super::record::{Record, Shape};
use super::traits::Stage;
use crate::common::BuildError;

/// Identity stage.
#[derive(Clone, Debug)]
pub struct PassThroughStage<T> {
    shape: Shape,
    _payload: PhantomData<fn(T) -> T>,
}

impl<T> PassThroughStage<T> {
    /// Creates an identity stage over payloads of the given shape.
    pub const fn new(shape: Shape) -> Self {
        Self {
            shape,
            _payload: PhantomData,
        }
    }
}

impl<T: Record> Stage for PassThroughStage<T> {
    type Input = T;
    type Output = T;

    fn ispec(&self) -> Shape {
        self.shape.clone()
    }

    fn ospec(&self) -> Shape {
        self.shape.clone()
    }

    fn process(&self, input: &T) -> T {
        input.clone()
    }
}

/// Stage defined by a closure.
pub struct FnStage<I, O, F> {
    ishape: Shape,
    oshape: Shape,
    f: F,
    _payload: PhantomData<fn(I) -> O>,
}

impl<I, O, F> FnStage<I, O, F>
where
    F: Fn(&I) -> O,
{
    /// Creates a stage from input/output shapes and the processing function.
    pub const fn new(ishape: Shape, oshape: Shape, f: F) -> Self {
        Self {
            ishape,
            oshape,
            f,
            _payload: PhantomData,
        }
    }
}

impl<I, O, F> fmt::Debug for FnStage<I, O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStage")
            .field("ispec", &self.ishape)
            .field("ospec", &self.oshape)
            .finish_non_exhaustive()
    }
}

impl<I: Record, O: Record, F: Fn(&I) -> O> Stage for FnStage<I, O, F> {
    type Input = I;
    type Output = O;

    fn ispec(&self) -> Shape {
        self.ishape.clone()
    }

    fn ospec(&self) -> Shape {
        self.oshape.clone()
    }

    fn process(&self, input: &I) -> O {
        (self.f)(input)
    }
}

/// Two stages run back to back within one cycle.
///
/// The payload types are checked by the compiler; the declared shapes are checked when
/// the chain is built.
#[derive(Clone, Debug)]
pub struct StageChain<A, B> {
    first: A,
    second: B,
}

impl<A, B> StageChain<A, B>
where
    A: Stage,
    B: Stage<Input = A::Output>,
{
    /// Chains `first` into `second`.
    ///
    /// # Errors
    ///
    /// [`BuildError::ShapeMismatch`] if `first.ospec()` is not assignable to `second.ispec()`.
    pub fn new(first: A, second: B) -> Result<Self, BuildError> {
        let (out, inp) = (first.ospec(), second.ispec());
        if !out.is_assignable_to(&inp) {
            return Err(BuildError::ShapeMismatch {
                from: out.to_string(),
                to: inp.to_string(),
            });
        }
        debug!(from = out.name(), to = inp.name(), "stage chained");
        Ok(Self { first, second })
    }

    /// First stage of the chain.
    pub const fn first(&self) -> &A {
        &self.first
    }

    /// Second stage of the chain.
    pub const fn second(&self) -> &B {
        &self.second
    }
}

impl<A, B> Stage for StageChain<A, B>
where
    A: Stage,
    B: Stage<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn ispec(&self) -> Shape {
        self.first.ispec()
    }

    fn ospec(&self) -> Shape {
        self.second.ospec()
    }

    fn process(&self, input: &A::Input) -> B::Output {
        self.second.process(&self.first.process(input))
    }

    fn setup(&mut self) {
        self.first.setup();
        self.second.setup();
    }

    fn d_ready(&self) -> bool {
        self.first.d_ready() && self.second.d_ready()
    }

    fn d_valid(&self, ready_i: bool) -> bool {
        self.first.d_valid(ready_i) && self.second.d_valid(ready_i)
    }
}

/// Builds a [`StageChain`] from one or more stages, folding from the left.
///
/// Evaluates to `Result<_, BuildError>`; a single stage is returned as-is.
///
/// ```
/// use pipesim_core::core::pipeline::record::Shape;
/// use pipesim_core::core::pipeline::stage::FnStage;
/// use pipesim_core::core::pipeline::traits::Stage;
/// use pipesim_core::stage_chain;
///
/// let word = || Shape::scalar("word", 16);
/// let inc = FnStage::new(word(), word(), |x: &u16| x.wrapping_add(1));
/// let dbl = FnStage::new(word(), word(), |x: &u16| x.wrapping_mul(2));
/// let chain = stage_chain![inc, dbl].unwrap();
/// assert_eq!(chain.process(&3), 8);
/// ```
#[macro_export]
macro_rules! stage_chain {
    ($only:expr $(,)?) => {
        ::core::result::Result::<_, $crate::common::BuildError>::Ok($only)
    };
    ($first:expr, $second:expr $(, $rest:expr)* $(,)?) => {
        $crate::core::pipeline::stage::StageChain::new($first, $second)
            $(.and_then(|chain| $crate::core::pipeline::stage::StageChain::new(chain, $rest)))*
    };
}

/// A run-time list of stages over one payload type, composed in order.
pub struct StageList<T> {
    stages: Vec<Box<dyn Stage<Input = T, Output = T>>>,
}

impl<T: Record> StageList<T> {
    /// Composes `stages` in order.
    ///
    /// # Errors
    ///
    /// [`BuildError::EmptyChain`] for an empty list, [`BuildError::ShapeMismatch`] when a
    /// neighbouring pair does not fit.
    pub fn new(stages: Vec<Box<dyn Stage<Input = T, Output = T>>>) -> Result<Self, BuildError> {
        if stages.is_empty() {
            return Err(BuildError::EmptyChain);
        }
        for pair in stages.windows(2) {
            let (out, inp) = (pair[0].ospec(), pair[1].ispec());
            if !out.is_assignable_to(&inp) {
                return Err(BuildError::ShapeMismatch {
                    from: out.to_string(),
                    to: inp.to_string(),
                });
            }
        }
        Ok(Self { stages })
    }

    /// Number of stages in the list.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always `false`: construction rejects empty lists.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<T> fmt::Debug for StageList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageList")
            .field("len", &self.stages.len())
            .finish()
    }
}

impl<T: Record> Stage for StageList<T> {
    type Input = T;
    type Output = T;

    fn ispec(&self) -> Shape {
        self.stages[0].ispec()
    }

    fn ospec(&self) -> Shape {
        self.stages[self.stages.len() - 1].ospec()
    }

    fn process(&self, input: &T) -> T {
        self.stages
            .iter()
            .fold(input.clone(), |acc, stage| stage.process(&acc))
    }

    fn setup(&mut self) {
        for stage in &mut self.stages {
            stage.setup();
        }
    }

    fn d_ready(&self) -> bool {
        self.stages.iter().all(|s| s.d_ready())
    }

    fn d_valid(&self, ready_i: bool) -> bool {
        self.stages.iter().all(|s| s.d_valid(ready_i))
    }
}
