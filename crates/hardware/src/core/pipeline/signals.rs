//! Handshake signals for one producer-to-consumer link.
//!
//! This module defines the two halves of a valid/ready link. It provides:
//! 1. **PrevControl:** The upstream-facing port of a component (`valid_i`, `ready_o`, `data_i`).
//! 2. **NextControl:** The downstream-facing port (`valid_o`, `ready_i`, `data_o`).
//! 3. **Cancellation:** Optional `mask`/`stop` bit vectors that travel with the data.
//! 4. **Tick records:** The per-cycle inputs and settled outputs of a standalone controller.
//!
//! A transfer happens on a link in every cycle where the producer's `valid_o` and the
//! consumer's `ready_o` are both high when the clock edge arrives.

use crate::common::bits::mask;

/// Upstream-facing side of a pipeline component.
///
/// The `_i` signals are driven by the producer, `ready_o` by this component.
#[derive(Clone, Debug)]
pub struct PrevControl<T> {
    /// Valid bits from the producer. All bits must be set for the input to count.
    pub valid_i: u64,
    /// Ready signal driven back to the producer.
    pub ready_o: bool,
    /// Payload from the producer.
    pub data_i: T,
    /// Cancellation mask identifying the incoming transaction.
    pub mask_i: u64,
    /// Stop bits: any transaction whose mask intersects these is cancelled.
    pub stop_i: u64,
    valid_width: u32,
}

impl<T: Default> Default for PrevControl<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Default> PrevControl<T> {
    /// Creates a port with a single-bit valid.
    pub fn new() -> Self {
        Self::with_valid_width(1)
    }

    /// Creates a port whose valid signal is `width` bits wide.
    ///
    /// Wide valids double as per-lane valid buses; the input only counts as valid when
    /// every bit is set.
    pub fn with_valid_width(width: u32) -> Self {
        Self {
            valid_i: 0,
            ready_o: false,
            data_i: T::default(),
            mask_i: 0,
            stop_i: 0,
            valid_width: width.max(1),
        }
    }
}

impl<T> PrevControl<T> {
    /// Width of the valid signal in bits.
    pub const fn valid_width(&self) -> u32 {
        self.valid_width
    }

    /// Drives every valid bit high or low.
    pub const fn set_valid(&mut self, valid: bool) {
        self.valid_i = if valid { mask(self.valid_width) } else { 0 };
    }

    /// Whether the valid signal counts as asserted (all bits set).
    pub const fn valid_i_test(&self) -> bool {
        let m = mask(self.valid_width);
        self.valid_i & m == m
    }

    /// Mask bits of the incoming transaction that have not been stopped.
    pub const fn live_mask(&self) -> u64 {
        self.mask_i & !self.stop_i
    }

    /// Whether a transfer happens on this port in the current cycle.
    pub const fn trigger(&self) -> bool {
        self.valid_i_test() && self.ready_o
    }
}

/// Downstream-facing side of a pipeline component.
///
/// The `_o` signals are driven by this component, `ready_i` by the consumer.
#[derive(Clone, Debug, Default)]
pub struct NextControl<T> {
    /// Valid signal driven to the consumer.
    pub valid_o: bool,
    /// Ready signal from the consumer.
    pub ready_i: bool,
    /// Payload driven to the consumer.
    pub data_o: T,
    /// Cancellation mask of the outgoing transaction.
    pub mask_o: u64,
    /// Stop bits forwarded downstream.
    pub stop_o: u64,
}

impl<T: Clone> NextControl<T> {
    /// Copies the forward signals (valid, data, mask, stop) into the next component's input.
    pub fn forward_to(&self, next: &mut PrevControl<T>) {
        next.set_valid(self.valid_o);
        next.data_i.clone_from(&self.data_o);
        next.mask_i = self.mask_o;
        next.stop_i = self.stop_o;
    }
}

impl<T> NextControl<T> {
    /// Samples the ready signal driven by the next component.
    pub const fn ready_from(&mut self, next: &PrevControl<T>) {
        self.ready_i = next.ready_o;
    }

    /// Whether a transfer happens on this port in the current cycle.
    pub const fn trigger(&self) -> bool {
        self.valid_o && self.ready_i
    }
}

/// Inputs applied to a standalone controller for one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickInputs<T> {
    /// Producer asserts data is present.
    pub valid_i: bool,
    /// Consumer can accept data this tick.
    pub ready_i: bool,
    /// Payload offered by the producer.
    pub data_i: T,
}

impl<T> TickInputs<T> {
    /// Offers `data` with the consumer ready.
    pub const fn send(data: T) -> Self {
        Self {
            valid_i: true,
            ready_i: true,
            data_i: data,
        }
    }
}

/// Settled outputs of a controller during one tick, sampled before the clock edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickOutputs<T> {
    /// The controller accepted `data_i` at this tick's edge if `valid_i` was also high.
    pub ready_o: bool,
    /// The controller offered `data_o` this tick.
    pub valid_o: bool,
    /// Payload offered downstream.
    pub data_o: T,
}
