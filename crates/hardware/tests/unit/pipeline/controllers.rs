//! # Controller Handshake Tests
//!
//! Laws every controller obeys whichever discipline it implements:
//! - Items come out once each, in order, processed by the stage.
//! - A stalled output is held unchanged (checked by the harness on every tick).
//! - With nothing stalling, the first result appears after the discipline's latency and
//!   throughput is one item per tick.

use pipesim_core::config::{ControllerKind, QueueConfig};
use pipesim_core::core::pipeline::controllers::{
    self, DynController, SimpleHandshake, UnbufferedPipeline, UnbufferedPipeline2,
};
use pipesim_core::core::pipeline::signals::TickInputs;
use pipesim_core::core::pipeline::traits::{Clocked, CombPaths, Pipe};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use crate::common::harness::{always, drive, init_tracing};
use crate::common::stages::add_one;

const ALL_KINDS: [ControllerKind; 8] = [
    ControllerKind::Unbuffered,
    ControllerKind::Unbuffered2,
    ControllerKind::Simple,
    ControllerKind::PassThrough,
    ControllerKind::Register,
    ControllerKind::Buffered,
    ControllerKind::Fifo,
    ControllerKind::MaskCancellable,
];

fn build(kind: ControllerKind) -> DynController<u32, u32> {
    let mut pipe = controllers::wrap(kind, add_one(), &QueueConfig::default()).unwrap();
    if kind.is_cancellable() {
        pipe.p_mut().mask_i = 1;
    }
    pipe
}

#[rstest]
#[case(ControllerKind::Unbuffered)]
#[case(ControllerKind::Unbuffered2)]
#[case(ControllerKind::Simple)]
#[case(ControllerKind::PassThrough)]
#[case(ControllerKind::Register)]
#[case(ControllerKind::Buffered)]
#[case(ControllerKind::Fifo)]
#[case(ControllerKind::MaskCancellable)]
fn test_full_throughput_when_unstalled(#[case] kind: ControllerKind) {
    init_tracing();
    let mut pipe = build(kind);
    let latency = u64::from(kind.stage_latency(&QueueConfig::default()));

    let run = drive(&mut pipe, 0..16, 16, always, 100);

    assert_eq!(run.outputs, (1..17).collect::<Vec<u32>>());
    assert_eq!(run.accepted_at, (0..16).collect::<Vec<u64>>());
    assert_eq!(run.delivered_at, (latency..latency + 16).collect::<Vec<u64>>());
}

#[rstest]
#[case(ControllerKind::Unbuffered)]
#[case(ControllerKind::Unbuffered2)]
#[case(ControllerKind::Simple)]
#[case(ControllerKind::PassThrough)]
#[case(ControllerKind::Register)]
#[case(ControllerKind::Buffered)]
#[case(ControllerKind::Fifo)]
#[case(ControllerKind::MaskCancellable)]
fn test_blocked_consumer_fills_then_stalls(#[case] kind: ControllerKind) {
    let mut pipe = build(kind);
    let run = drive(&mut pipe, 0..8, usize::MAX, |_| false, 10);
    assert!(run.accepted_at.len() <= 2, "{kind:?} took {} items", run.accepted_at.len());

    // Released, everything comes out in order.
    let mut rest = build(kind);
    let run = drive(&mut rest, 0..8, 8, |t| t >= 5, 100);
    assert_eq!(run.outputs, (1..9).collect::<Vec<u32>>());
}

#[test]
fn test_reset_empties_every_controller() {
    for kind in ALL_KINDS {
        let mut pipe = build(kind);
        let _ = pipe.tick(TickInputs {
            valid_i: true,
            ready_i: false,
            data_i: 3,
        });
        pipe.reset();
        let out = pipe.tick(TickInputs::default());
        assert!(!out.valid_o, "{kind:?} still offers data after reset");
    }
}

#[test]
fn test_simple_handshake_ready_follows_consumer() {
    let mut pipe = SimpleHandshake::new(add_one());
    let stalled = pipe.tick(TickInputs {
        valid_i: true,
        ready_i: false,
        data_i: 1,
    });
    assert!(!stalled.ready_o);
    let open = pipe.tick(TickInputs::send(1));
    assert!(open.ready_o);
}

#[test]
fn test_unbuffered_runs_stage_on_registered_input() {
    let mut pipe = UnbufferedPipeline::new(add_one());
    let _ = pipe.tick(TickInputs::send(10));
    assert!(pipe.is_occupied());
    let out = pipe.tick(TickInputs {
        valid_i: false,
        ready_i: true,
        data_i: 0,
    });
    assert!(out.valid_o);
    assert_eq!(out.data_o, 11);
    assert!(!pipe.is_occupied());
}

#[test]
fn test_unbuffered_register_holds_while_stalled() {
    let mut pipe = UnbufferedPipeline::new(add_one());
    let _ = pipe.tick(TickInputs::send(10));
    for _ in 0..3 {
        let out = pipe.tick(TickInputs {
            valid_i: true,
            ready_i: false,
            data_i: 99,
        });
        assert!(out.valid_o);
        assert!(!out.ready_o);
        assert_eq!(out.data_o, 11);
        assert!(pipe.is_occupied());
    }
    let out = pipe.tick(TickInputs::send(99));
    assert_eq!(out.data_o, 11);
    let out = pipe.tick(TickInputs::default());
    assert_eq!(out.data_o, 100);
}

#[test]
fn test_unbuffered2_parks_refused_output() {
    let mut pipe = UnbufferedPipeline2::new(add_one());
    let first = pipe.tick(TickInputs {
        valid_i: true,
        ready_i: false,
        data_i: 4,
    });
    assert!(first.valid_o);
    assert!(first.ready_o);
    assert_eq!(first.data_o, 5);
    assert!(pipe.is_holding());

    let held = pipe.tick(TickInputs {
        valid_i: true,
        ready_i: false,
        data_i: 7,
    });
    assert!(!held.ready_o);
    assert_eq!(held.data_o, 5);

    let drained = pipe.tick(TickInputs::send(7));
    assert_eq!(drained.data_o, 5);
    assert!(!pipe.is_holding());
    let next = pipe.tick(TickInputs::send(7));
    assert!(next.ready_o);
    assert_eq!(next.data_o, 8);
}

#[test]
fn test_comb_paths_per_discipline() {
    let paths = |kind| build(kind).comb_paths();
    assert_eq!(paths(ControllerKind::Unbuffered), CombPaths::READY_THROUGH);
    assert_eq!(paths(ControllerKind::Simple), CombPaths::READY_THROUGH);
    assert_eq!(paths(ControllerKind::PassThrough), CombPaths::READY_THROUGH);
    assert_eq!(paths(ControllerKind::Register), CombPaths::READY_THROUGH);
    assert_eq!(
        paths(ControllerKind::Buffered),
        CombPaths {
            forward: true,
            backward: false
        }
    );
    assert_eq!(
        paths(ControllerKind::Unbuffered2),
        CombPaths {
            forward: true,
            backward: false
        }
    );
    assert_eq!(paths(ControllerKind::MaskCancellable), CombPaths::THROUGH);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_stalls_preserve_order(
        kind in prop::sample::select(ALL_KINDS.to_vec()),
        pattern in prop::collection::vec(any::<bool>(), 1..12),
        items in prop::collection::vec(any::<u32>(), 1..24),
    ) {
        let mut pipe = build(kind);
        let n = items.len();
        let expected: Vec<u32> = items.iter().map(|x| x.wrapping_add(1)).collect();
        let run = drive(&mut pipe, items, n, |t| t >= 400 || pattern[t as usize % pattern.len()], 1_000);
        prop_assert_eq!(run.outputs, expected);
    }
}
