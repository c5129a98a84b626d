//! Pipeline graph builder.
//!
//! `connect()` covers straight lines. Anything with fan-in, fan-out or feedback is
//! described to a [`PipelineBuilder`] as nodes and links and frozen into a
//! [`PipelineGraph`]. Building performs these checks:
//! 1. **Ports:** Every link names an existing port, and no port is linked twice.
//! 2. **Feedback:** Links not marked as feedback must form a DAG.
//! 3. **Combinational loops:** A cycle in which every node passes `valid` (or `ready`)
//!    through in the same tick has no fixed point and is rejected.
//!
//! The surviving graph settles its nodes in two topological orders, one per sweep.

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace};

use super::record::Record;
use super::signals::{NextControl, PrevControl};
use super::traits::{Clocked, CombPaths, Pipe};
use crate::common::BuildError;

/// A clocked component with any number of ports over one payload type.
pub trait Node<T>: Clocked {
    /// Number of upstream ports.
    fn num_inputs(&self) -> usize;

    /// Number of downstream ports.
    fn num_outputs(&self) -> usize;

    /// Upstream port `port`.
    fn input(&self, port: usize) -> &PrevControl<T>;

    /// Mutable upstream port `port`.
    fn input_mut(&mut self, port: usize) -> &mut PrevControl<T>;

    /// Downstream port `port`.
    fn output(&self, port: usize) -> &NextControl<T>;

    /// Mutable downstream port `port`.
    fn output_mut(&mut self, port: usize) -> &mut NextControl<T>;
}

/// Adapts a single-port [`Pipe`] into a graph [`Node`].
#[derive(Debug)]
pub struct PipeNode<P>(pub P);

impl<P: Pipe> Clocked for PipeNode<P> {
    fn settle_forward(&mut self) {
        self.0.settle_forward();
    }

    fn settle_backward(&mut self) {
        self.0.settle_backward();
    }

    fn clock(&mut self) {
        self.0.clock();
    }

    fn reset(&mut self) {
        self.0.reset();
    }

    fn comb_paths(&self) -> CombPaths {
        self.0.comb_paths()
    }
}

impl<T, P> Node<T> for PipeNode<P>
where
    P: Pipe<Input = T, Output = T>,
{
    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn input(&self, _port: usize) -> &PrevControl<T> {
        self.0.p()
    }

    fn input_mut(&mut self, _port: usize) -> &mut PrevControl<T> {
        self.0.p_mut()
    }

    fn output(&self, _port: usize) -> &NextControl<T> {
        self.0.n()
    }

    fn output_mut(&mut self, _port: usize) -> &mut NextControl<T> {
        self.0.n_mut()
    }
}

/// Handle to a node added to a [`PipelineBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in insertion order.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A directed connection from a downstream port to an upstream port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    /// Producing node.
    pub from: NodeId,
    /// Output port on the producing node.
    pub out_port: usize,
    /// Consuming node.
    pub to: NodeId,
    /// Input port on the consuming node.
    pub in_port: usize,
    /// Closes an intentional cycle.
    pub feedback: bool,
}

type BoxedNode<T> = Box<dyn Node<T>>;

/// Collects nodes and links before validation.
pub struct PipelineBuilder<T> {
    names: Vec<String>,
    nodes: Vec<BoxedNode<T>>,
    links: Vec<Link>,
}

impl<T: Record + 'static> Default for PipelineBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record + 'static> PipelineBuilder<T> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            nodes: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Adds a multi-port node.
    pub fn add_node(&mut self, name: impl Into<String>, node: impl Node<T> + 'static) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.names.push(name.into());
        self.nodes.push(Box::new(node));
        id
    }

    /// Adds a single-port pipe.
    pub fn add_pipe(
        &mut self,
        name: impl Into<String>,
        pipe: impl Pipe<Input = T, Output = T> + 'static,
    ) -> NodeId {
        self.add_node(name, PipeNode(pipe))
    }

    /// Links `from.n[out_port]` to `to.p[in_port]`.
    pub fn link(&mut self, from: NodeId, out_port: usize, to: NodeId, in_port: usize) -> &mut Self {
        self.links.push(Link {
            from,
            out_port,
            to,
            in_port,
            feedback: false,
        });
        self
    }

    /// Links `from.n[out_port]` to `to.p[in_port]` and marks the link as closing a cycle.
    pub fn feedback(
        &mut self,
        from: NodeId,
        out_port: usize,
        to: NodeId,
        in_port: usize,
    ) -> &mut Self {
        self.links.push(Link {
            from,
            out_port,
            to,
            in_port,
            feedback: true,
        });
        self
    }

    /// Links port 0 of each node to port 0 of the next.
    ///
    /// # Errors
    ///
    /// [`BuildError::EmptyConnect`] when `ids` is empty.
    pub fn connect(&mut self, ids: &[NodeId]) -> Result<&mut Self, BuildError> {
        if ids.is_empty() {
            return Err(BuildError::EmptyConnect);
        }
        for pair in ids.windows(2) {
            let _ = self.link(pair[0], 0, pair[1], 0);
        }
        Ok(self)
    }

    /// Validates the wiring and freezes it.
    ///
    /// # Errors
    ///
    /// - [`BuildError::PortOutOfRange`] / [`BuildError::PortAlreadyLinked`] for bad links.
    /// - [`BuildError::UndeclaredCycle`] when a cycle has no feedback link.
    /// - [`BuildError::CombinationalLoop`] when a cycle is combinational end to end.
    pub fn build(self) -> Result<PipelineGraph<T>, BuildError> {
        self.check_ports()?;

        let n = self.nodes.len();
        let structural: Vec<(usize, usize)> = self
            .links
            .iter()
            .filter(|l| !l.feedback)
            .map(|l| (l.from.0, l.to.0))
            .collect();
        let _ = topo(n, &structural)
            .map_err(|rest| BuildError::UndeclaredCycle(self.names_of(&rest)))?;

        let paths: Vec<CombPaths> = self.nodes.iter().map(|node| node.comb_paths()).collect();
        let forward_edges: Vec<(usize, usize)> = self
            .links
            .iter()
            .filter(|l| paths[l.to.0].forward)
            .map(|l| (l.from.0, l.to.0))
            .collect();
        let backward_edges: Vec<(usize, usize)> = self
            .links
            .iter()
            .filter(|l| paths[l.from.0].backward)
            .map(|l| (l.to.0, l.from.0))
            .collect();
        let forward_order = topo(n, &forward_edges)
            .map_err(|rest| BuildError::CombinationalLoop(self.names_of(&rest)))?;
        let backward_order = topo(n, &backward_edges)
            .map_err(|rest| BuildError::CombinationalLoop(self.names_of(&rest)))?;

        debug!(
            forward = ?self.names_of(&forward_order),
            backward = ?self.names_of(&backward_order),
            links = self.links.len(),
            "pipeline graph built"
        );

        let mut outgoing = vec![Vec::new(); n];
        let mut incoming = vec![Vec::new(); n];
        for (i, link) in self.links.iter().enumerate() {
            outgoing[link.from.0].push(i);
            incoming[link.to.0].push(i);
        }

        Ok(PipelineGraph {
            names: self.names,
            nodes: self.nodes,
            links: self.links,
            outgoing,
            incoming,
            forward_order,
            backward_order,
        })
    }

    fn check_ports(&self) -> Result<(), BuildError> {
        let mut driven_outputs = Vec::new();
        let mut driven_inputs = Vec::new();
        for link in &self.links {
            let (from, to) = (link.from.0, link.to.0);
            if link.out_port >= self.nodes[from].num_outputs() {
                return Err(BuildError::PortOutOfRange {
                    node: self.names[from].clone(),
                    direction: "output",
                    index: link.out_port,
                });
            }
            if link.in_port >= self.nodes[to].num_inputs() {
                return Err(BuildError::PortOutOfRange {
                    node: self.names[to].clone(),
                    direction: "input",
                    index: link.in_port,
                });
            }
            if driven_outputs.contains(&(from, link.out_port)) {
                return Err(BuildError::PortAlreadyLinked {
                    node: self.names[from].clone(),
                    direction: "output",
                    index: link.out_port,
                });
            }
            if driven_inputs.contains(&(to, link.in_port)) {
                return Err(BuildError::PortAlreadyLinked {
                    node: self.names[to].clone(),
                    direction: "input",
                    index: link.in_port,
                });
            }
            driven_outputs.push((from, link.out_port));
            driven_inputs.push((to, link.in_port));
        }
        Ok(())
    }

    fn names_of(&self, ids: &[usize]) -> Vec<String> {
        ids.iter().map(|&i| self.names[i].clone()).collect()
    }
}

impl<T> fmt::Debug for PipelineBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("nodes", &self.names)
            .field("links", &self.links)
            .finish()
    }
}

/// Kahn's algorithm over `n` nodes.
///
/// Returns the nodes in dependency order, or the nodes left over when a cycle blocks
/// the sort (the cycle members and everything downstream of them).
fn topo(n: usize, edges: &[(usize, usize)]) -> Result<Vec<usize>, Vec<usize>> {
    let mut degree = vec![0usize; n];
    for &(_, to) in edges {
        degree[to] += 1;
    }
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(head) = queue.pop_front() {
        order.push(head);
        for &(from, to) in edges {
            if from == head {
                degree[to] -= 1;
                if degree[to] == 0 {
                    queue.push_back(to);
                }
            }
        }
    }
    if order.len() == n {
        Ok(order)
    } else {
        Err((0..n).filter(|&i| degree[i] > 0).collect())
    }
}

/// A validated, immutable pipeline graph.
///
/// Unlinked ports are the graph's external interface: drive them through
/// [`input_mut`](Self::input_mut) and [`output_mut`](Self::output_mut) before each tick.
pub struct PipelineGraph<T> {
    names: Vec<String>,
    nodes: Vec<BoxedNode<T>>,
    links: Vec<Link>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    forward_order: Vec<usize>,
    backward_order: Vec<usize>,
}

impl<T: Record> PipelineGraph<T> {
    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Name given to `id` when it was added.
    pub fn name(&self, id: NodeId) -> &str {
        &self.names[id.0]
    }

    /// Every link, in insertion order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Order in which the forward sweep settles nodes.
    pub fn forward_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.forward_order.iter().map(|&i| NodeId(i))
    }

    /// Order in which the backward sweep settles nodes.
    pub fn backward_order(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.backward_order.iter().map(|&i| NodeId(i))
    }

    /// Upstream port `port` of node `id`.
    pub fn input(&self, id: NodeId, port: usize) -> &PrevControl<T> {
        self.nodes[id.0].input(port)
    }

    /// Mutable upstream port, for driving an unlinked input.
    pub fn input_mut(&mut self, id: NodeId, port: usize) -> &mut PrevControl<T> {
        self.nodes[id.0].input_mut(port)
    }

    /// Downstream port `port` of node `id`.
    pub fn output(&self, id: NodeId, port: usize) -> &NextControl<T> {
        self.nodes[id.0].output(port)
    }

    /// Mutable downstream port, for driving `ready_i` of an unlinked output.
    pub fn output_mut(&mut self, id: NodeId, port: usize) -> &mut NextControl<T> {
        self.nodes[id.0].output_mut(port)
    }

    fn propagate_forward(&mut self, node: usize) {
        for &i in &self.outgoing[node] {
            let link = self.links[i];
            let out = self.nodes[link.from.0].output(link.out_port).clone();
            out.forward_to(self.nodes[link.to.0].input_mut(link.in_port));
        }
    }

    fn propagate_backward(&mut self, node: usize) {
        for &i in &self.incoming[node] {
            let link = self.links[i];
            let ready = self.nodes[link.to.0].input(link.in_port).ready_o;
            self.nodes[link.from.0].output_mut(link.out_port).ready_i = ready;
        }
    }
}

impl<T: Record> Clocked for PipelineGraph<T> {
    fn settle_forward(&mut self) {
        for k in 0..self.forward_order.len() {
            let node = self.forward_order[k];
            self.nodes[node].settle_forward();
            self.propagate_forward(node);
        }
    }

    fn settle_backward(&mut self) {
        for k in 0..self.backward_order.len() {
            let node = self.backward_order[k];
            self.nodes[node].settle_backward();
            self.propagate_backward(node);
        }
    }

    fn clock(&mut self) {
        for (i, link) in self.links.iter().enumerate() {
            let out = self.nodes[link.from.0].output(link.out_port);
            if out.trigger() {
                trace!(
                    link = i,
                    from = %self.names[link.from.0],
                    to = %self.names[link.to.0],
                    "transfer"
                );
            }
        }
        for node in &mut self.nodes {
            node.clock();
        }
    }

    fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }

    fn comb_paths(&self) -> CombPaths {
        self.nodes.iter().fold(CombPaths::REGISTERED, |acc, node| {
            let paths = node.comb_paths();
            CombPaths {
                forward: acc.forward || paths.forward,
                backward: acc.backward || paths.backward,
            }
        })
    }
}

impl<T> fmt::Debug for PipelineGraph<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineGraph")
            .field("nodes", &self.names)
            .field("links", &self.links)
            .field("forward_order", &self.forward_order)
            .field("backward_order", &self.backward_order)
            .finish()
    }
}
