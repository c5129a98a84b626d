//! Queue-backed controllers.
//!
//! This module models the FIFO-backed buffered handshake. It provides:
//! 1. **Queue:** A bounded slot queue that panics on protocol violations.
//! 2. **Process modes:** Whether the stage runs as items are written or as they are read,
//!    fixed per instantiation by a type parameter.
//! 3. **FifoControl:** The controller, parameterised by depth, first-word-fall-through
//!    and pipe mode.
//!
//! A write is accepted whenever the queue is not full; in pipe mode a full queue also
//! accepts when its head is leaving in the same tick. A read is offered whenever the queue
//! is not empty. With first-word-fall-through, an empty queue offers the arriving input
//! directly, and when that input is taken in the same tick it never enters the queue.
//!
//! Depth 1 without fall-through is a plain register stage ([`RegisterPipeline`]); depth 2
//! with fall-through gives the upstream stage one tick of grace before it must stall
//! ([`BufferedHandshake`]).

use std::collections::VecDeque;
use std::marker::PhantomData;

use tracing::trace;

use crate::common::BuildError;
use crate::config::QueueConfig;
use crate::core::pipeline::record::{Record, Shape};
use crate::core::pipeline::signals::{NextControl, PrevControl};
use crate::core::pipeline::stage::PassThroughStage;
use crate::core::pipeline::traits::{Clocked, CombPaths, Pipe, Stage};

/// Bounded FIFO of slots.
#[derive(Clone, Debug)]
pub struct Queue<T> {
    slots: VecDeque<T>,
    depth: usize,
}

impl<T> Queue<T> {
    /// Creates an empty queue holding at most `depth` items.
    ///
    /// # Errors
    ///
    /// [`BuildError::ZeroDepth`] when `depth` is zero.
    pub fn new(depth: usize) -> Result<Self, BuildError> {
        if depth == 0 {
            return Err(BuildError::ZeroDepth);
        }
        Ok(Self {
            slots: VecDeque::with_capacity(depth),
            depth,
        })
    }

    /// Maximum number of items.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Number of items held.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no item is held.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether `depth` items are held.
    pub fn is_full(&self) -> bool {
        self.slots.len() == self.depth
    }

    /// Oldest item, if any.
    pub fn front(&self) -> Option<&T> {
        self.slots.front()
    }

    /// Appends an item.
    ///
    /// # Panics
    ///
    /// When the queue is full: the writer ignored a deasserted `ready_o`.
    pub fn push(&mut self, item: T) {
        assert!(
            !self.is_full(),
            "protocol violation: write to a full queue (depth {})",
            self.depth
        );
        self.slots.push_back(item);
    }

    /// Removes and returns the oldest item.
    ///
    /// # Panics
    ///
    /// When the queue is empty: the reader took data while `valid_o` was low.
    pub fn pop(&mut self) -> T {
        match self.slots.pop_front() {
            Some(item) => item,
            None => panic!("protocol violation: read from an empty queue"),
        }
    }

    /// Drops every item.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Where a [`FifoControl`] runs its stage.
pub trait ProcessMode<S: Stage> {
    /// What a queue slot holds.
    type Slot: Record;

    /// Converts an accepted input into a slot.
    fn on_write(stage: &S, input: &S::Input) -> Self::Slot;

    /// Converts a slot into the offered output.
    fn on_read(stage: &S, slot: &Self::Slot) -> S::Output;
}

/// Run the stage as items are written; slots hold results.
#[derive(Clone, Copy, Debug, Default)]
pub struct OnWrite;

/// Run the stage as items are read; slots hold raw inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct OnRead;

impl<S: Stage> ProcessMode<S> for OnWrite {
    type Slot = S::Output;

    fn on_write(stage: &S, input: &S::Input) -> S::Output {
        stage.process(input)
    }

    fn on_read(_stage: &S, slot: &S::Output) -> S::Output {
        slot.clone()
    }
}

impl<S: Stage> ProcessMode<S> for OnRead {
    type Slot = S::Input;

    fn on_write(_stage: &S, input: &S::Input) -> S::Input {
        input.clone()
    }

    fn on_read(stage: &S, slot: &S::Input) -> S::Output {
        stage.process(slot)
    }
}

/// Queue-backed controller.
#[derive(Debug)]
pub struct FifoControl<S: Stage, M: ProcessMode<S> = OnWrite> {
    stage: S,
    p: PrevControl<S::Input>,
    n: NextControl<S::Output>,
    queue: Queue<M::Slot>,
    fwft: bool,
    pipe: bool,
    _mode: PhantomData<M>,
}

/// Depth-2 first-word-fall-through queue processing on write.
pub type BufferedHandshake<S> = FifoControl<S, OnWrite>;

/// Depth-1 registered queue around the identity stage.
pub type RegisterPipeline<T> = FifoControl<PassThroughStage<T>, OnWrite>;

impl<S: Stage, M: ProcessMode<S>> FifoControl<S, M> {
    /// Wraps `stage` with a queue of `depth` slots.
    ///
    /// `fwft` enables first-word-fall-through; `pipe` lets a full queue accept when its
    /// head leaves in the same tick.
    ///
    /// # Errors
    ///
    /// [`BuildError::ZeroDepth`] when `depth` is zero.
    pub fn new(mut stage: S, depth: usize, fwft: bool, pipe: bool) -> Result<Self, BuildError> {
        stage.setup();
        Ok(Self {
            stage,
            p: PrevControl::new(),
            n: NextControl::default(),
            queue: Queue::new(depth)?,
            fwft,
            pipe,
            _mode: PhantomData,
        })
    }

    /// Wraps `stage` with the queue parameters from a configuration.
    ///
    /// # Errors
    ///
    /// [`BuildError::ZeroDepth`] when the configured depth is zero.
    pub fn from_config(stage: S, config: &QueueConfig) -> Result<Self, BuildError> {
        Self::new(stage, config.depth, config.fwft, config.pipe)
    }

    /// Number of items currently buffered.
    pub fn occupancy(&self) -> usize {
        self.queue.len()
    }

    /// Queue depth.
    pub const fn depth(&self) -> usize {
        self.queue.depth()
    }

    fn valid_i_test(&self) -> bool {
        self.p.valid_i_test() && self.stage.d_ready()
    }

    fn ready_i_test(&self) -> bool {
        self.n.ready_i && self.stage.d_valid(self.n.ready_i)
    }
}

impl<S: Stage> FifoControl<S, OnWrite> {
    /// Depth-2 first-word-fall-through buffer.
    pub fn buffered(stage: S) -> Self {
        Self::fixed(stage, 2, true, false)
    }

    fn fixed(mut stage: S, depth: usize, fwft: bool, pipe: bool) -> Self {
        stage.setup();
        Self {
            stage,
            p: PrevControl::new(),
            n: NextControl::default(),
            queue: Queue {
                slots: VecDeque::with_capacity(depth),
                depth,
            },
            fwft,
            pipe,
            _mode: PhantomData,
        }
    }
}

impl<T: Record> FifoControl<PassThroughStage<T>, OnWrite> {
    /// Register stage: holds every item for exactly one tick, full throughput.
    pub fn register(shape: Shape) -> Self {
        Self::fixed(PassThroughStage::new(shape), 1, false, true)
    }
}

impl<S: Stage, M: ProcessMode<S>> Clocked for FifoControl<S, M> {
    fn settle_forward(&mut self) {
        if let Some(head) = self.queue.front() {
            self.n.valid_o = true;
            self.n.data_o = M::on_read(&self.stage, head);
        } else if self.fwft && self.valid_i_test() {
            let slot = M::on_write(&self.stage, &self.p.data_i);
            self.n.valid_o = true;
            self.n.data_o = M::on_read(&self.stage, &slot);
        } else {
            self.n.valid_o = false;
        }
    }

    fn settle_backward(&mut self) {
        let reading = self.n.valid_o && self.ready_i_test();
        let writable = !self.queue.is_full() || (self.pipe && reading);
        self.p.ready_o = writable && self.stage.d_ready();
    }

    fn clock(&mut self) {
        let enq = self.valid_i_test() && self.p.ready_o;
        let deq = self.n.valid_o && self.ready_i_test();
        if self.fwft && self.queue.is_empty() {
            if enq && !deq {
                self.queue.push(M::on_write(&self.stage, &self.p.data_i));
            } else if enq {
                trace!("fifo: input fell through");
            }
            return;
        }
        if deq {
            let _ = self.queue.pop();
        }
        if enq {
            self.queue.push(M::on_write(&self.stage, &self.p.data_i));
        }
        trace!(occupancy = self.queue.len(), enq, deq, "fifo: clocked");
    }

    fn reset(&mut self) {
        self.queue.clear();
    }

    fn comb_paths(&self) -> CombPaths {
        CombPaths {
            forward: self.fwft,
            backward: self.pipe,
        }
    }
}

impl<S: Stage, M: ProcessMode<S>> Pipe for FifoControl<S, M> {
    type Input = S::Input;
    type Output = S::Output;

    stage_ports!();
}
