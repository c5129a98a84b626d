//! # Queue-Backed Controller Tests
//!
//! Depth, first-word-fall-through, pipe mode and the two process modes.

use pipesim_core::common::BuildError;
use pipesim_core::config::QueueConfig;
use pipesim_core::core::pipeline::controllers::{FifoControl, OnRead, RegisterPipeline};
use pipesim_core::core::pipeline::signals::TickInputs;
use pipesim_core::core::pipeline::traits::{Clocked, Pipe};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::{always, drive};
use crate::common::stages::{add_one, identity, word};

fn blocked(data: u32) -> TickInputs<u32> {
    TickInputs {
        valid_i: true,
        ready_i: false,
        data_i: data,
    }
}

#[test]
fn test_zero_depth_rejected() {
    assert!(matches!(
        FifoControl::<_>::new(identity(), 0, false, false),
        Err(BuildError::ZeroDepth)
    ));
}

#[rstest]
#[case(1)]
#[case(3)]
#[case(5)]
fn test_accepts_exactly_depth_items(#[case] depth: usize) {
    let mut fifo = FifoControl::<_>::new(identity(), depth, false, false).unwrap();
    let mut taken = 0;
    for i in 0..10 {
        if fifo.tick(blocked(i)).ready_o {
            taken += 1;
        }
    }
    assert_eq!(taken, depth);
    assert_eq!(fifo.occupancy(), depth);
    assert_eq!(fifo.depth(), depth);
}

#[test]
fn test_fall_through_offers_input_same_tick() {
    let mut fifo = FifoControl::<_>::new(add_one(), 2, true, false).unwrap();
    let out = fifo.tick(TickInputs::send(5));
    assert!(out.valid_o);
    assert_eq!(out.data_o, 6);
    assert_eq!(fifo.occupancy(), 0);
}

#[test]
fn test_fall_through_item_is_kept_when_not_taken() {
    let mut fifo = FifoControl::<_>::new(add_one(), 2, true, false).unwrap();
    let first = fifo.tick(blocked(5));
    assert!(first.valid_o && first.ready_o);
    assert_eq!(fifo.occupancy(), 1);
    let second = fifo.tick(TickInputs {
        valid_i: false,
        ready_i: true,
        data_i: 0,
    });
    assert_eq!(second.data_o, 6);
    assert_eq!(fifo.occupancy(), 0);
}

#[test]
fn test_without_fall_through_output_is_registered() {
    let mut fifo = FifoControl::<_>::new(add_one(), 2, false, false).unwrap();
    assert!(!fifo.tick(TickInputs::send(5)).valid_o);
    let out = fifo.tick(TickInputs::default());
    assert!(out.valid_o);
    assert_eq!(out.data_o, 6);
}

#[test]
fn test_full_queue_without_pipe_alternates() {
    let mut fifo = FifoControl::<_>::new(identity(), 1, false, false).unwrap();
    let run = drive(&mut fifo, 0..4, 4, always, 20);
    assert_eq!(run.accepted_at, vec![0, 2, 4, 6]);
    assert_eq!(run.delivered_at, vec![1, 3, 5, 7]);
}

#[test]
fn test_pipe_mode_refills_while_draining() {
    let mut fifo = FifoControl::<_>::new(identity(), 1, false, true).unwrap();
    let run = drive(&mut fifo, 0..4, 4, always, 20);
    assert_eq!(run.accepted_at, vec![0, 1, 2, 3]);
    assert_eq!(run.delivered_at, vec![1, 2, 3, 4]);
}

#[test]
fn test_process_on_read_matches_on_write() {
    let mut on_read = FifoControl::<_, OnRead>::new(add_one(), 3, false, false).unwrap();
    let mut on_write = FifoControl::<_>::new(add_one(), 3, false, false).unwrap();
    let pattern = |t: u64| t % 3 != 1;
    let a = drive(&mut on_read, 0..10, 10, pattern, 100);
    let b = drive(&mut on_write, 0..10, 10, pattern, 100);
    assert_eq!(a.outputs, b.outputs);
    assert_eq!(a.delivered_at, b.delivered_at);
}

#[test]
fn test_register_pipeline_holds_one_tick() {
    let mut reg = RegisterPipeline::<u32>::register(word());
    let run = drive(&mut reg, [7, 8, 9], 3, always, 10);
    assert_eq!(run.outputs, vec![7, 8, 9]);
    assert_eq!(run.delivered_at, vec![1, 2, 3]);
}

#[test]
fn test_buffered_gives_one_tick_of_grace() {
    let mut buf = FifoControl::buffered(identity());
    // Consumer stalls; the producer still gets two items in before it must stop.
    let run = drive(&mut buf, 0..5, usize::MAX, |_| false, 4);
    assert_eq!(run.accepted_at, vec![0, 1]);
    assert_eq!(buf.occupancy(), 2);
}

#[test]
fn test_from_config() {
    let config = QueueConfig {
        depth: 3,
        fwft: false,
        pipe: true,
    };
    let fifo = FifoControl::<_>::from_config(identity(), &config).unwrap();
    assert_eq!(fifo.depth(), 3);
    assert!(!fifo.comb_paths().forward);
    assert!(fifo.comb_paths().backward);
}

#[test]
fn test_reset_clears_queue() {
    let mut fifo = FifoControl::<_>::new(identity(), 2, false, false).unwrap();
    let _ = fifo.tick(blocked(1));
    assert_eq!(fifo.occupancy(), 1);
    fifo.reset();
    assert_eq!(fifo.occupancy(), 0);
}
