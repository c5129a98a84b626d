//! # Realisation Tests
//!
//! The pipeline under every controller, the state machine's timing, and reservation
//! stations sharing one adder between lanes.

use pipesim_core::config::{Config, ControllerKind, QueueConfig};
use pipesim_core::core::pipeline::signals::TickInputs;
use pipesim_core::core::pipeline::traits::{Clocked, Pipe};
use pipesim_core::core::units::fpu::pipeline::FPADD_STAGES;
use pipesim_core::core::units::fpu::{
    FpAddFsm, FpAddInput, FpAddPipe, FpFormat, FsmState, fpadd_mux_in_out,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::fp::{add_comb, add_fsm, add_pipe};
use crate::common::harness::{always, drive, init_tracing};

const VECTORS: [(u64, u64); 8] = [
    (0x3F80_0000, 0x3F80_0000),
    (0x4040_0000, 0xBF80_0000),
    (0x7F80_0000, 0xFF80_0000),
    (0x0080_0000, 0x8000_0001),
    (0x3F80_0001, 0x3380_0000),
    (0x4B00_0000, 0x3F00_0000),
    (0x7F7F_FFFF, 0x7F7F_FFFF),
    (0xC2F6_E979, 0x4479_8000),
];

#[rstest]
#[case(ControllerKind::Unbuffered)]
#[case(ControllerKind::Unbuffered2)]
#[case(ControllerKind::Simple)]
#[case(ControllerKind::PassThrough)]
#[case(ControllerKind::Register)]
#[case(ControllerKind::Buffered)]
#[case(ControllerKind::Fifo)]
#[case(ControllerKind::MaskCancellable)]
fn test_every_controller_computes_the_same_sums(#[case] kind: ControllerKind) {
    init_tracing();
    let fmt = FpFormat::BINARY32;
    let expected: Vec<u64> = VECTORS.iter().map(|&(a, b)| add_comb(fmt, a, b)).collect();
    assert_eq!(add_pipe(fmt, kind, &VECTORS), expected);
}

#[rstest]
#[case(ControllerKind::Unbuffered, 3)]
#[case(ControllerKind::Unbuffered2, 0)]
#[case(ControllerKind::Simple, 3)]
#[case(ControllerKind::PassThrough, 3)]
#[case(ControllerKind::Register, 3)]
#[case(ControllerKind::Buffered, 0)]
#[case(ControllerKind::Fifo, 0)]
#[case(ControllerKind::MaskCancellable, 3)]
fn test_pipeline_latency(#[case] kind: ControllerKind, #[case] latency: u32) {
    let mut pipe = FpAddPipe::new(FpFormat::BINARY32, kind, &QueueConfig::default()).unwrap();
    assert_eq!(pipe.latency(), latency);
    assert_eq!(pipe.kind(), kind);
    if kind.is_cancellable() {
        pipe.p_mut().mask_i = 1;
    }
    let inputs = VECTORS.iter().map(|&(a, b)| FpAddInput::new(a, b));
    let run = drive(&mut pipe, inputs, VECTORS.len(), always, 50);
    let first = u64::from(latency);
    assert_eq!(run.delivered_at, (first..first + 8).collect::<Vec<u64>>());
}

#[test]
fn test_pipeline_shapes_follow_format() {
    let pipe = FpAddPipe::new(FpFormat::BINARY64, ControllerKind::Unbuffered, &QueueConfig::default())
        .unwrap();
    assert_eq!(pipe.format(), FpFormat::BINARY64);
    assert_eq!(pipe.ispec(), FpAddInput::shape(&FpFormat::BINARY64));
    assert_eq!(pipe.ispec().width(), 64 + 64 + 8);
    assert_eq!(FPADD_STAGES, 3);
}

#[test]
fn test_zero_depth_fifo_is_rejected() {
    let queue = QueueConfig {
        depth: 0,
        fwft: true,
        pipe: false,
    };
    assert!(FpAddPipe::new(FpFormat::BINARY32, ControllerKind::Fifo, &queue).is_err());
}

#[test]
fn test_pipeline_holds_results_under_stall() {
    let fmt = FpFormat::BINARY32;
    let mut pipe = FpAddPipe::new(fmt, ControllerKind::PassThrough, &QueueConfig::default()).unwrap();
    let inputs = VECTORS.iter().map(|&(a, b)| FpAddInput::new(a, b));
    let run = drive(&mut pipe, inputs, VECTORS.len(), |t| t % 4 == 3, 200);
    let expected: Vec<u64> = VECTORS.iter().map(|&(a, b)| add_comb(fmt, a, b)).collect();
    assert_eq!(run.outputs.iter().map(|o| o.z).collect::<Vec<_>>(), expected);
}

#[test]
fn test_state_machine_matches_combinational() {
    let fmt = FpFormat::BINARY32;
    for &(a, b) in &VECTORS {
        assert_eq!(add_fsm(fmt, a, b).0, add_comb(fmt, a, b), "{a:#x} + {b:#x}");
    }
}

#[test]
fn test_state_machine_alignment_is_bit_serial() {
    let fmt = FpFormat::BINARY32;
    let (_, equal) = add_fsm(fmt, 0x3F80_0000, 0x3F80_0000);
    let (_, far) = add_fsm(fmt, 0x4B00_0000, 0x3F80_0000);
    // 2^23 + 1 needs 23 extra alignment ticks.
    assert_eq!(far, equal + 23);
}

#[test]
fn test_state_machine_is_busy_until_result_taken() {
    let mut fsm = FpAddFsm::new(FpFormat::BINARY32);
    assert!(fsm.is_idle());
    let _ = fsm.tick(TickInputs::send(FpAddInput::new(0x3F80_0000, 0x4000_0000)));
    assert_eq!(fsm.state().name(), "special_cases");

    let mut saw_result = false;
    for _ in 0..100 {
        let out = fsm.tick(TickInputs {
            valid_i: true,
            ready_i: false,
            data_i: FpAddInput::new(0, 0),
        });
        assert!(!out.ready_o, "busy adder accepted new operands");
        if out.valid_o {
            saw_result = true;
            assert_eq!(out.data_o.z, 0x4040_0000);
        }
    }
    assert!(saw_result);
    assert!(matches!(fsm.state(), FsmState::PutZ(_)));

    let _ = fsm.tick(TickInputs {
        ready_i: true,
        ..TickInputs::default()
    });
    assert!(fsm.is_idle());
}

#[test]
fn test_state_machine_reset() {
    let mut fsm = FpAddFsm::new(FpFormat::BINARY16);
    let _ = fsm.tick(TickInputs::send(FpAddInput::new(0x3C00, 0x3C00)));
    fsm.reset();
    assert!(fsm.is_idle());
    assert_eq!(fsm.format(), FpFormat::BINARY16);
    assert_eq!(*fsm.state(), FsmState::GetOps);
}

#[test]
fn test_reservation_stations_share_one_adder() {
    let config = Config::from_json(r#"{ "fpu": { "num_rows": 2, "controller": "PassThrough" } }"#).unwrap();
    let mut unit = fpadd_mux_in_out(&config).unwrap();
    assert_eq!(unit.num_rows(), 2);
    assert_eq!(unit.alu().latency(), 3);

    let ops = [(0x3F80_0000, 0x3F80_0000), (0x4040_0000, 0xBF80_0000)];
    let mut got = [None, None];
    for lane in 0..2 {
        let port = unit.p_mut(lane);
        port.set_valid(true);
        port.data_i = FpAddInput::new(ops[lane].0, ops[lane].1);
        unit.n_mut(lane).ready_i = true;
    }
    for _ in 0..10 {
        unit.settle_forward();
        unit.settle_backward();
        let issued: Vec<bool> = (0..2).map(|lane| unit.p(lane).trigger()).collect();
        for lane in 0..2 {
            if unit.n(lane).trigger() {
                got[lane] = Some(unit.n(lane).data_o.z);
            }
        }
        unit.clock();
        for (lane, _) in issued.iter().enumerate().filter(|(_, done)| **done) {
            unit.p_mut(lane).set_valid(false);
        }
    }
    assert_eq!(got, [Some(0x4000_0000), Some(0x4000_0000)]);
}
