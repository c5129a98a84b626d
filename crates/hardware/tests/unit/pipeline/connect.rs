//! # Composition Tests
//!
//! `connect!` and `PipeChain`: payload flow, latency adding up, shape checks, and the
//! combined combinational paths.

use pipesim_core::common::BuildError;
use pipesim_core::config::{ControllerKind, QueueConfig};
use pipesim_core::connect;
use pipesim_core::core::pipeline::connect::{BoxedPipe, Connected, PipeChain};
use pipesim_core::core::pipeline::controllers::{self, BufferedHandshake, FifoControl, UnbufferedPipeline};
use pipesim_core::core::pipeline::record::Shape;
use pipesim_core::core::pipeline::stage::FnStage;
use pipesim_core::core::pipeline::traits::{Clocked, CombPaths, Pipe};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::harness::{always, drive};
use crate::common::stages::{add_one, double, identity, word};

fn boxed(kind: ControllerKind) -> BoxedPipe<u32> {
    controllers::wrap(kind, add_one(), &QueueConfig::default()).unwrap()
}

#[test]
fn test_connect_runs_stages_in_order() {
    let mut pipe = connect![
        UnbufferedPipeline::new(add_one()),
        UnbufferedPipeline::new(double()),
    ]
    .unwrap();
    let run = drive(&mut pipe, [1, 2, 3], 3, always, 20);
    assert_eq!(run.outputs, vec![4, 6, 8]);
    assert_eq!(run.delivered_at[0], 2);
}

#[test]
fn test_connect_of_one_is_the_pipe() {
    let mut pipe = connect![UnbufferedPipeline::new(add_one())].unwrap();
    let run = drive(&mut pipe, [1], 1, always, 5);
    assert_eq!(run.outputs, vec![2]);
}

#[test]
fn test_connect_rejects_shape_mismatch() {
    let narrow = FnStage::new(word(), Shape::scalar("half", 16), |x: &u32| x & 0xFFFF);
    let joined = Connected::new(
        UnbufferedPipeline::new(narrow),
        UnbufferedPipeline::new(identity()),
    );
    assert!(matches!(joined, Err(BuildError::ShapeMismatch { .. })));
}

#[test]
fn test_fall_through_chain_has_no_latency() {
    let mut pipe = connect![
        BufferedHandshake::buffered(add_one()),
        BufferedHandshake::buffered(add_one()),
        BufferedHandshake::buffered(add_one()),
    ]
    .unwrap();
    let out = pipe.tick(pipesim_core::core::pipeline::signals::TickInputs::send(0));
    assert!(out.valid_o);
    assert_eq!(out.data_o, 3);
}

#[test]
fn test_comb_paths_combine_with_and() {
    let mixed = connect![
        BufferedHandshake::buffered(add_one()),
        UnbufferedPipeline::new(add_one()),
    ]
    .unwrap();
    assert_eq!(mixed.comb_paths(), CombPaths::REGISTERED);

    let ready_through = connect![
        UnbufferedPipeline::new(add_one()),
        UnbufferedPipeline::new(add_one()),
    ]
    .unwrap();
    assert_eq!(ready_through.comb_paths(), CombPaths::READY_THROUGH);
}

#[test]
fn test_members_are_reachable() {
    let pipe = connect![
        UnbufferedPipeline::new(add_one()),
        FifoControl::<_>::new(double(), 4, false, true).unwrap(),
    ]
    .unwrap();
    assert_eq!(pipe.second().depth(), 4);
    assert!(!pipe.first().is_occupied());
}

#[test]
fn test_pipe_chain_rejects_empty() {
    assert!(matches!(PipeChain::<u32>::connect(Vec::new()), Err(BuildError::EmptyConnect)));
}

#[test]
fn test_pipe_chain_mixes_disciplines() {
    let mut chain = PipeChain::connect(vec![
        boxed(ControllerKind::Buffered),
        boxed(ControllerKind::Simple),
        boxed(ControllerKind::Register),
        boxed(ControllerKind::PassThrough),
    ])
    .unwrap();
    assert_eq!(chain.len(), 4);
    assert!(!chain.is_empty());
    let run = drive(&mut chain, 0..10, 10, always, 50);
    assert_eq!(run.outputs, (4..14).collect::<Vec<u32>>());
    assert_eq!(run.delivered_at[0], 3);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_chain_under_stalls_delivers_everything(
        pattern in prop::collection::vec(any::<bool>(), 1..10),
        count in 1usize..30,
    ) {
        let mut chain = PipeChain::connect(vec![
            boxed(ControllerKind::Unbuffered),
            boxed(ControllerKind::Fifo),
            boxed(ControllerKind::Simple),
            boxed(ControllerKind::PassThrough),
        ])
        .unwrap();
        let inputs: Vec<u32> = (0..count as u32).collect();
        let run = drive(&mut chain, inputs, count, |t| t >= 300 || pattern[t as usize % pattern.len()], 1_000);
        let expected: Vec<u32> = (4..count as u32 + 4).collect();
        prop_assert_eq!(run.outputs, expected);
    }
}
