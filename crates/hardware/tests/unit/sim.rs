//! # Simulator Tests
//!
//! Lanes sharing the adder, per-lane result order, output stalls, cancellation and the
//! cycle budget.

use pipesim_core::common::{BuildError, SimError};
use pipesim_core::config::{Config, ControllerKind};
use pipesim_core::core::units::fpu::FpFormat;
use pipesim_core::sim::Simulator;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::fp::add_comb;
use crate::common::harness::init_tracing;

fn config(kind: ControllerKind, rows: usize) -> Config {
    let mut config = Config::default();
    config.fpu.controller = kind;
    config.fpu.num_rows = rows;
    config
}

fn operands(lane: usize, i: usize) -> (u64, u64) {
    let a = 0x3F80_0000 + ((lane as u64) << 20) + i as u64;
    let b = 0xBE00_0000 + ((i as u64) << 19);
    (a, b)
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
fn test_lanes_get_their_own_results_in_order(#[case] kind: ControllerKind) {
    init_tracing();
    let mut sim = Simulator::new(&config(kind, 4)).unwrap();
    assert_eq!(sim.lanes(), 4);
    for lane in 0..4 {
        for i in 0..5 {
            let (a, b) = operands(lane, i);
            sim.submit(lane, a, b);
        }
    }
    let ticks = sim.run_until_idle().unwrap();
    assert!(ticks >= 20, "one issue per tick at most, took {ticks}");

    for lane in 0..4 {
        let expected: Vec<u64> = (0..5)
            .map(|i| {
                let (a, b) = operands(lane, i);
                add_comb(FpFormat::BINARY32, a, b)
            })
            .collect();
        assert_eq!(sim.results(lane), expected.as_slice(), "lane {lane}");
    }
    assert_eq!(sim.stats.issued, 20);
    assert_eq!(sim.stats.completed, 20);
    assert_eq!(sim.stats.lane_completions, vec![5, 5, 5, 5]);
    assert_eq!(sim.stats.in_flight(), 0);
    assert!(sim.stats.input_stalls > 0);
}

#[test]
fn test_priority_lane_finishes_first() {
    let mut sim = Simulator::new(&config(ControllerKind::PassThrough, 2)).unwrap();
    for i in 0..3 {
        sim.submit(0, 0x3F80_0000, 0x3F80_0000);
        sim.submit(1, 0x3F80_0000 + i, 0x3F80_0000);
    }
    for _ in 0..6 {
        sim.tick();
    }
    assert_eq!(sim.results(0).len(), 3);
    assert!(sim.results(1).len() < 3);
}

#[test]
fn test_output_stall_holds_results() {
    let mut sim = Simulator::new(&config(ControllerKind::Unbuffered, 2)).unwrap();
    sim.submit(1, 0x3F80_0000, 0x3F80_0000);
    sim.set_output_ready(1, false);
    for _ in 0..10 {
        sim.tick();
    }
    assert!(sim.results(1).is_empty());
    assert_eq!(sim.in_flight(1), 1);
    assert!(sim.stats.output_stalls > 0);

    sim.set_output_ready(1, true);
    let _ = sim.run_until_idle().unwrap();
    assert_eq!(sim.results(1), &[0x4000_0000]);
}

#[test]
fn test_cycle_budget() {
    let mut cfg = config(ControllerKind::Unbuffered, 1);
    cfg.sim.max_cycles = 20;
    let mut sim = Simulator::new(&cfg).unwrap();
    sim.submit(0, 0x3F80_0000, 0x3F80_0000);
    sim.submit(0, 0x3F80_0000, 0x3F80_0000);
    sim.set_output_ready(0, false);
    let err = sim.run_until_idle().unwrap_err();
    assert_eq!(
        err,
        SimError::CycleBudget {
            max_cycles: 20,
            outstanding: 2
        }
    );
    assert!(err.to_string().contains("20 cycles"));
}

#[test]
fn test_cancel_drops_in_flight_work() {
    let mut sim = Simulator::new(&config(ControllerKind::MaskCancellable, 2)).unwrap();
    sim.submit(0, 0x3F80_0000, 0x3F80_0000);
    sim.submit(1, 0x4000_0000, 0x4000_0000);
    sim.tick();
    sim.tick();
    assert_eq!(sim.in_flight(0), 1);
    assert_eq!(sim.in_flight(1), 1);

    sim.cancel(0);
    sim.tick();
    assert_eq!(sim.in_flight(0), 0);
    assert_eq!(sim.stats.cancelled, 1);

    let _ = sim.run_until_idle().unwrap();
    assert!(sim.results(0).is_empty());
    assert_eq!(sim.results(1), &[0x4080_0000]);
    assert_eq!(sim.stats.in_flight(), 0);
}

#[test]
fn test_cancel_keeps_queued_work() {
    let mut sim = Simulator::new(&config(ControllerKind::MaskCancellable, 1)).unwrap();
    sim.submit(0, 0x3F80_0000, 0x3F80_0000);
    sim.submit(0, 0x4000_0000, 0x4000_0000);
    sim.tick();
    sim.cancel(0);
    sim.tick();
    let _ = sim.run_until_idle().unwrap();
    assert_eq!(sim.results(0), &[0x4080_0000]);
    assert_eq!(sim.stats.cancelled, 1);
}

#[test]
#[should_panic(expected = "cancellable")]
fn test_cancel_needs_cancellable_controller() {
    let mut sim = Simulator::new(&config(ControllerKind::Unbuffered, 1)).unwrap();
    sim.cancel(0);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_submit_to_missing_lane() {
    let mut sim = Simulator::new(&config(ControllerKind::Unbuffered, 2)).unwrap();
    sim.submit(2, 0, 0);
}

#[test]
fn test_invalid_config_rejected() {
    let mut cfg = Config::default();
    cfg.fpu.width = 24;
    assert!(matches!(Simulator::new(&cfg), Err(BuildError::UnsupportedWidth(24))));
}

#[test]
fn test_other_widths() {
    let mut cfg = config(ControllerKind::Buffered, 1);
    cfg.fpu.width = 16;
    cfg.sim.trace = true;
    let mut sim = Simulator::new(&cfg).unwrap();
    assert_eq!(sim.format(), FpFormat::BINARY16);
    sim.submit(0, 0x3C00, 0x3C00);
    let _ = sim.run_until_idle().unwrap();
    assert_eq!(sim.results(0), &[0x4000]);
}

#[test]
fn test_reset_forgets_everything() {
    let mut sim = Simulator::new(&config(ControllerKind::Simple, 2)).unwrap();
    sim.submit(0, 0x3F80_0000, 0x3F80_0000);
    sim.submit(1, 0x3F80_0000, 0x3F80_0000);
    sim.tick();
    sim.reset();
    assert!(sim.is_idle());
    assert!(sim.results(0).is_empty());
    assert_eq!(sim.stats.cycles, 0);
    assert_eq!(sim.stats.lane_completions, vec![0, 0]);
    assert_eq!(sim.run_until_idle(), Ok(0));
    assert_eq!(sim.unit().num_rows(), 2);
}
