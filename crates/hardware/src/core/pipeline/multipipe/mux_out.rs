//! Combinational fan-out.
//!
//! Offers each arriving record on the single lane its mux ID (or a custom router) names,
//! and passes that lane's `ready` back upstream. A masked fan-out slices the incoming stop
//! vector into per-lane stop bits.

use tracing::trace;

use super::check_mask_width;
use crate::common::{BuildError, mask};
use crate::core::pipeline::builder::Node;
use crate::core::pipeline::record::{MuxId, Shape};
use crate::core::pipeline::signals::{NextControl, PrevControl};
use crate::core::pipeline::traits::{Clocked, CombPaths, Stage};

/// Reads the destination lane from a processed record.
pub type Router<T> = fn(&T) -> usize;

/// One upstream link, many downstream lanes, routed by the record's mux ID.
#[derive(Debug)]
pub struct CombMuxOutPipe<S: Stage> {
    stage: S,
    p: PrevControl<S::Input>,
    n: Vec<NextControl<S::Output>>,
    router: Router<S::Output>,
    maskwid: u32,
    route: Option<usize>,
    delivered: Vec<u64>,
}

impl<S> CombMuxOutPipe<S>
where
    S: Stage,
    S::Output: MuxId,
{
    /// Creates a fan-out over `lanes` lanes that routes on [`MuxId::muxid`].
    ///
    /// # Errors
    ///
    /// [`BuildError::NoLanes`] when `lanes` is zero.
    pub fn new(stage: S, lanes: usize) -> Result<Self, BuildError> {
        Self::routed(stage, lanes, |out: &S::Output| out.muxid())
    }
}

impl<S: Stage> CombMuxOutPipe<S> {
    /// Creates a fan-out that routes with a custom function of the processed record.
    ///
    /// # Errors
    ///
    /// [`BuildError::NoLanes`] when `lanes` is zero.
    pub fn routed(mut stage: S, lanes: usize, router: Router<S::Output>) -> Result<Self, BuildError> {
        if lanes == 0 {
            return Err(BuildError::NoLanes);
        }
        stage.setup();
        Ok(Self {
            stage,
            p: PrevControl::new(),
            n: (0..lanes).map(|_| NextControl::default()).collect(),
            router,
            maskwid: 0,
            route: None,
            delivered: vec![0; lanes],
        })
    }

    /// Enables `maskwid`-bit per-lane masks.
    ///
    /// # Errors
    ///
    /// [`BuildError::MaskTooWide`] when the lanes' masks exceed 64 bits.
    pub fn masked(mut self, maskwid: u32) -> Result<Self, BuildError> {
        check_mask_width(self.n.len(), maskwid)?;
        self.maskwid = maskwid;
        Ok(self)
    }

    /// Number of lanes.
    pub fn lanes(&self) -> usize {
        self.n.len()
    }

    /// Upstream port.
    pub const fn p(&self) -> &PrevControl<S::Input> {
        &self.p
    }

    /// Mutable upstream port.
    pub const fn p_mut(&mut self) -> &mut PrevControl<S::Input> {
        &mut self.p
    }

    /// Downstream port of `lane`.
    pub fn n(&self, lane: usize) -> &NextControl<S::Output> {
        &self.n[lane]
    }

    /// Mutable downstream port of `lane`.
    pub fn n_mut(&mut self, lane: usize) -> &mut NextControl<S::Output> {
        &mut self.n[lane]
    }

    /// Results delivered on `lane` since reset.
    pub fn delivered(&self, lane: usize) -> u64 {
        self.delivered[lane]
    }

    /// Declared shape of the upstream link.
    pub fn ispec(&self) -> Shape {
        self.stage.ispec()
    }

    /// Declared shape of each downstream lane.
    pub fn ospec(&self) -> Shape {
        self.stage.ospec()
    }

    fn valid_i_test(&self) -> bool {
        self.p.valid_i_test()
            && (self.maskwid == 0 || self.p.live_mask() != 0)
            && self.stage.d_ready()
    }
}

impl<S: Stage> Clocked for CombMuxOutPipe<S> {
    /// # Panics
    ///
    /// When a valid record names a lane this fan-out does not have.
    fn settle_forward(&mut self) {
        let valid = self.valid_i_test();
        let out = self.stage.process(&self.p.data_i);
        let lane = (self.router)(&out);
        let lanes = self.n.len();
        assert!(
            !valid || lane < lanes,
            "protocol violation: mux ID {lane} routes past {lanes} lanes"
        );
        self.route = (lane < lanes).then_some(lane);

        for (i, port) in self.n.iter_mut().enumerate() {
            port.valid_o = valid && i == lane;
        }
        if self.maskwid > 0 {
            let m = mask(self.maskwid);
            for (i, port) in self.n.iter_mut().enumerate() {
                let shift = i as u32 * self.maskwid;
                port.stop_o = (self.p.stop_i >> shift) & m;
                port.mask_o = if valid && i == lane {
                    (self.p.mask_i >> shift) & m
                } else {
                    0
                };
            }
        }
        if let Some(lane) = self.route {
            self.n[lane].data_o = out;
        }
    }

    fn settle_backward(&mut self) {
        self.p.ready_o = self.route.is_some_and(|lane| {
            let ready_i = self.n[lane].ready_i;
            ready_i && self.stage.d_valid(ready_i) && self.stage.d_ready()
        });
    }

    fn clock(&mut self) {
        if let Some(lane) = self.route {
            if self.n[lane].valid_o && self.p.ready_o {
                trace!(lane, "fan-out: delivered");
                self.delivered[lane] += 1;
            }
        }
    }

    fn reset(&mut self) {
        self.route = None;
        self.delivered.fill(0);
    }

    fn comb_paths(&self) -> CombPaths {
        CombPaths::THROUGH
    }
}

impl<T, S> Node<T> for CombMuxOutPipe<S>
where
    S: Stage<Input = T, Output = T>,
{
    fn num_inputs(&self) -> usize {
        1
    }

    fn num_outputs(&self) -> usize {
        self.n.len()
    }

    fn input(&self, _port: usize) -> &PrevControl<T> {
        &self.p
    }

    fn input_mut(&mut self, _port: usize) -> &mut PrevControl<T> {
        &mut self.p
    }

    fn output(&self, port: usize) -> &NextControl<T> {
        &self.n[port]
    }

    fn output_mut(&mut self, port: usize) -> &mut NextControl<T> {
        &mut self.n[port]
    }
}
