//! # Graph Builder Tests
//!
//! Port validation, the classification of cycles (undeclared, combinational, or closed
//! by a registered controller), and ticking a built graph.

use pipesim_core::common::BuildError;
use pipesim_core::core::pipeline::builder::{NodeId, PipelineBuilder, PipelineGraph};
use pipesim_core::core::pipeline::controllers::{FifoControl, UnbufferedPipeline};
use pipesim_core::core::pipeline::multipipe::{
    CombMuxOutPipe, PriorityCombMuxInPipe, ReservationStations,
};
use pipesim_core::core::pipeline::record::Record;
use pipesim_core::core::pipeline::stage::PassThroughStage;
use pipesim_core::core::pipeline::traits::Clocked;
use pretty_assertions::assert_eq;

use crate::common::harness::init_tracing;
use crate::common::stages::{Tagged, add_one, double, identity, tagged, tagged_add};

/// Registered both ways: no fall-through, no pipe mode.
fn registered() -> FifoControl<impl pipesim_core::core::pipeline::traits::Stage<Input = u32, Output = u32>> {
    FifoControl::new(identity(), 2, false, false).unwrap()
}

/// Combinational both ways.
fn through() -> FifoControl<impl pipesim_core::core::pipeline::traits::Stage<Input = u32, Output = u32>> {
    FifoControl::new(identity(), 2, true, true).unwrap()
}

/// One tick of a graph with one external input and one external output.
fn step<T: Record>(
    graph: &mut PipelineGraph<T>,
    input: (NodeId, usize),
    output: (NodeId, usize),
    data: Option<T>,
) -> Option<T> {
    let port = graph.input_mut(input.0, input.1);
    port.set_valid(data.is_some());
    if let Some(d) = data {
        port.data_i = d;
    }
    graph.output_mut(output.0, output.1).ready_i = true;
    graph.settle_forward();
    graph.settle_backward();
    let out = graph.output(output.0, output.1);
    let result = out.valid_o.then(|| out.data_o.clone());
    graph.clock();
    result
}

#[test]
fn test_output_port_out_of_range() {
    let mut b = PipelineBuilder::<u32>::new();
    let x = b.add_pipe("x", registered());
    let y = b.add_pipe("y", registered());
    let _ = b.link(x, 1, y, 0);
    let err = b.build().unwrap_err();
    assert!(matches!(
        err,
        BuildError::PortOutOfRange { direction: "output", index: 1, .. }
    ));
}

#[test]
fn test_input_port_out_of_range() {
    let mut b = PipelineBuilder::<u32>::new();
    let x = b.add_pipe("x", registered());
    let y = b.add_pipe("y", registered());
    let _ = b.link(x, 0, y, 3);
    assert!(matches!(
        b.build(),
        Err(BuildError::PortOutOfRange { direction: "input", index: 3, .. })
    ));
}

#[test]
fn test_port_linked_twice() {
    let mut b = PipelineBuilder::<u32>::new();
    let x = b.add_pipe("x", registered());
    let y = b.add_pipe("y", registered());
    let z = b.add_pipe("z", registered());
    let _ = b.link(x, 0, y, 0).link(x, 0, z, 0);
    let err = b.build().unwrap_err();
    assert!(matches!(err, BuildError::PortAlreadyLinked { direction: "output", .. }));
}

#[test]
fn test_connect_needs_nodes() {
    let mut b = PipelineBuilder::<u32>::new();
    assert!(matches!(b.connect(&[]), Err(BuildError::EmptyConnect)));
}

#[test]
fn test_undeclared_cycle() {
    let mut b = PipelineBuilder::<u32>::new();
    let x = b.add_pipe("x", registered());
    let y = b.add_pipe("y", registered());
    let _ = b.link(x, 0, y, 0).link(y, 0, x, 0);
    match b.build() {
        Err(BuildError::UndeclaredCycle(names)) => assert_eq!(names, vec!["x", "y"]),
        other => panic!("expected an undeclared cycle, got {other:?}"),
    }
}

#[test]
fn test_combinational_loop_rejected() {
    let mut b = PipelineBuilder::<u32>::new();
    let x = b.add_pipe("x", through());
    let y = b.add_pipe("y", through());
    let _ = b.link(x, 0, y, 0).feedback(y, 0, x, 0);
    match b.build() {
        Err(BuildError::CombinationalLoop(names)) => assert_eq!(names, vec!["x", "y"]),
        other => panic!("expected a combinational loop, got {other:?}"),
    }
}

#[test]
fn test_ready_only_loop_rejected() {
    // Valid is registered everywhere, but ready passes straight through both nodes.
    let mut b = PipelineBuilder::<u32>::new();
    let x = b.add_pipe("x", UnbufferedPipeline::new(identity()));
    let y = b.add_pipe("y", UnbufferedPipeline::new(identity()));
    let _ = b.link(x, 0, y, 0).feedback(y, 0, x, 0);
    assert!(matches!(b.build(), Err(BuildError::CombinationalLoop(_))));
}

#[test]
fn test_feedback_through_registered_controller_accepted() {
    init_tracing();
    let mut b = PipelineBuilder::<u32>::new();
    let x = b.add_pipe("x", registered());
    let y = b.add_pipe("y", UnbufferedPipeline::new(add_one()));
    let _ = b.link(x, 0, y, 0).feedback(y, 0, x, 0);
    let graph = b.build().unwrap();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.links().len(), 2);
    assert!(graph.links()[1].feedback);
    // y's ready depends on x's, so x settles first on the way back.
    let backward: Vec<NodeId> = graph.backward_order().collect();
    assert_eq!(backward, vec![x, y]);
}

#[test]
fn test_linear_graph_ticks() {
    let mut b = PipelineBuilder::<u32>::new();
    let x = b.add_pipe("inc", UnbufferedPipeline::new(add_one()));
    let y = b.add_pipe("dbl", UnbufferedPipeline::new(double()));
    let _ = b.connect(&[x, y]).unwrap();
    let mut graph = b.build().unwrap();
    assert_eq!(graph.name(y), "dbl");

    assert_eq!(step(&mut graph, (x, 0), (y, 0), Some(5)), None);
    assert_eq!(step(&mut graph, (x, 0), (y, 0), Some(6)), None);
    assert_eq!(step(&mut graph, (x, 0), (y, 0), None), Some(12));
    assert_eq!(step(&mut graph, (x, 0), (y, 0), None), Some(14));
    assert_eq!(step(&mut graph, (x, 0), (y, 0), None), None);
}

#[test]
fn test_fan_out_and_back_in() {
    // Route by lane ID into two different pipes, then merge again.
    let mut b = PipelineBuilder::<Tagged>::new();
    let split = b.add_node(
        "split",
        CombMuxOutPipe::new(PassThroughStage::<Tagged>::new(tagged()), 2).unwrap(),
    );
    let ten = b.add_pipe("ten", UnbufferedPipeline::new(tagged_add(10)));
    let hundred = b.add_pipe("hundred", UnbufferedPipeline::new(tagged_add(100)));
    let merge = b.add_node(
        "merge",
        PriorityCombMuxInPipe::new(PassThroughStage::<Tagged>::new(tagged()), 2).unwrap(),
    );
    let _ = b
        .link(split, 0, ten, 0)
        .link(split, 1, hundred, 0)
        .link(ten, 0, merge, 0)
        .link(hundred, 0, merge, 1);
    let mut graph = b.build().unwrap();

    let first = step(&mut graph, (split, 0), (merge, 0), Some(Tagged { id: 1, v: 1 }));
    assert_eq!(first, None);
    let second = step(&mut graph, (split, 0), (merge, 0), None);
    assert_eq!(second, Some(Tagged { id: 1, v: 101 }));
}

#[test]
fn test_reservation_stations_as_a_graph_node() {
    let mut b = PipelineBuilder::<Tagged>::new();
    let rs = b.add_node(
        "rs",
        ReservationStations::new(2, UnbufferedPipeline::new(tagged_add(1))).unwrap(),
    );
    let mut graph = b.build().unwrap();
    assert_eq!(graph.node_count(), 1);

    let first = step(&mut graph, (rs, 1), (rs, 1), Some(Tagged::new(5)));
    assert_eq!(first, None);
    let second = step(&mut graph, (rs, 1), (rs, 1), None);
    assert_eq!(second, Some(Tagged { id: 1, v: 6 }));
}
