//! Simulator: drives an FP-add reservation-station unit tick by tick.
//!
//! Each lane has a queue of operand pairs waiting to issue. Every tick the head of each
//! queue is offered to the fan-in, each lane's output readiness is applied, the network
//! settles, transfers are recorded and the registers are clocked.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::common::{BuildError, SimError};
use crate::config::Config;
use crate::core::pipeline::traits::Clocked;
use crate::core::units::fpu::{FpAddInput, FpAddMuxInOut, FpFormat, fpadd_mux_in_out};
use crate::stats::PipeStats;

/// Top-level simulator: the adder unit plus per-lane operand and result queues.
#[derive(Debug)]
pub struct Simulator {
    config: Config,
    fmt: FpFormat,
    unit: FpAddMuxInOut,
    pending: Vec<VecDeque<(u64, u64)>>,
    in_flight: Vec<u64>,
    results: Vec<Vec<u64>>,
    output_ready: Vec<bool>,
    stop: u64,
    /// Transfer statistics.
    pub stats: PipeStats,
}

impl Simulator {
    /// Builds the unit `config` describes.
    ///
    /// # Errors
    ///
    /// Any [`BuildError`] from validating `config` or assembling the unit.
    pub fn new(config: &Config) -> Result<Self, BuildError> {
        config.validate()?;
        let fmt = FpFormat::standard(config.fpu.width)?;
        let unit = fpadd_mux_in_out(config)?;
        let lanes = unit.num_rows();
        debug!(lanes, width = fmt.width(), "simulator ready");
        Ok(Self {
            config: config.clone(),
            fmt,
            unit,
            pending: vec![VecDeque::new(); lanes],
            in_flight: vec![0; lanes],
            results: vec![Vec::new(); lanes],
            output_ready: vec![true; lanes],
            stop: 0,
            stats: PipeStats::new(lanes),
        })
    }

    /// Operand format.
    pub const fn format(&self) -> FpFormat {
        self.fmt
    }

    /// Number of lanes.
    pub fn lanes(&self) -> usize {
        self.pending.len()
    }

    /// The unit being driven.
    pub const fn unit(&self) -> &FpAddMuxInOut {
        &self.unit
    }

    /// Queues `a + b` on `lane`.
    ///
    /// # Panics
    ///
    /// When `lane` is out of range.
    pub fn submit(&mut self, lane: usize, a: u64, b: u64) {
        assert!(lane < self.lanes(), "lane {lane} out of range");
        self.pending[lane].push_back((a, b));
    }

    /// Holds (`false`) or releases (`true`) results for `lane`.
    pub fn set_output_ready(&mut self, lane: usize, ready: bool) {
        self.output_ready[lane] = ready;
    }

    /// Drops every operation of `lane` currently inside the unit on the next tick.
    ///
    /// Queued operations that have not issued yet are kept.
    ///
    /// # Panics
    ///
    /// Unless the unit was built with a cancellable controller.
    pub fn cancel(&mut self, lane: usize) {
        assert!(
            self.config.fpu.controller.is_cancellable(),
            "cancel needs a cancellable controller, not {:?}",
            self.config.fpu.controller
        );
        self.stop |= 1 << lane;
    }

    /// Results delivered to `lane`, oldest first.
    pub fn results(&self, lane: usize) -> &[u64] {
        &self.results[lane]
    }

    /// Operations of `lane` issued but not yet delivered.
    pub fn in_flight(&self, lane: usize) -> u64 {
        self.in_flight[lane]
    }

    /// Whether every queue is empty and nothing is in flight.
    pub fn is_idle(&self) -> bool {
        self.pending.iter().all(VecDeque::is_empty) && self.in_flight.iter().all(|&n| n == 0)
    }

    fn outstanding(&self) -> u64 {
        let queued: usize = self.pending.iter().map(VecDeque::len).sum();
        queued as u64 + self.in_flight.iter().sum::<u64>()
    }

    /// Advances the unit by one clock cycle.
    pub fn tick(&mut self) {
        let masked = self.config.fpu.controller.is_cancellable();
        let stop = std::mem::take(&mut self.stop);

        for lane in 0..self.lanes() {
            let head = self.pending[lane].front().copied();
            let port = self.unit.p_mut(lane);
            port.set_valid(head.is_some());
            if let Some((a, b)) = head {
                port.data_i = FpAddInput::new(a, b);
            }
            if masked {
                port.mask_i = 1;
                port.stop_i = (stop >> lane) & 1;
            }
            self.unit.n_mut(lane).ready_i = self.output_ready[lane];
        }

        self.unit.settle_forward();
        self.unit.settle_backward();

        for lane in 0..self.lanes() {
            if self.unit.p(lane).trigger() {
                let _ = self.pending[lane].pop_front();
                self.in_flight[lane] += 1;
                self.stats.issued += 1;
            } else if !self.pending[lane].is_empty() {
                self.stats.input_stalls += 1;
            }

            let out = self.unit.n(lane);
            if !out.valid_o {
                continue;
            }
            if out.ready_i {
                let z = out.data_o.z;
                if self.config.sim.trace {
                    debug!(lane, cycle = self.stats.cycles, z = %format!("{z:#x}"), "result");
                }
                self.results[lane].push(z);
                self.in_flight[lane] -= 1;
                self.stats.completed += 1;
                self.stats.lane_completions[lane] += 1;
            } else {
                self.stats.output_stalls += 1;
            }
        }

        self.unit.clock();

        if stop != 0 {
            for lane in (0..self.lanes()).filter(|&lane| (stop >> lane) & 1 == 1) {
                let dropped = std::mem::take(&mut self.in_flight[lane]);
                trace!(lane, dropped, "lane cancelled");
                self.stats.cancelled += dropped;
            }
        }
        self.stats.cycles += 1;
    }

    /// Ticks until idle and returns the number of ticks taken.
    ///
    /// # Errors
    ///
    /// [`SimError::CycleBudget`] when the unit is still busy after `sim.max_cycles` ticks.
    pub fn run_until_idle(&mut self) -> Result<u64, SimError> {
        let max_cycles = self.config.sim.max_cycles;
        let mut ticks = 0;
        while !self.is_idle() {
            if ticks == max_cycles {
                return Err(SimError::CycleBudget {
                    max_cycles,
                    outstanding: self.outstanding(),
                });
            }
            self.tick();
            ticks += 1;
        }
        debug!(ticks, completed = self.stats.completed, "simulator idle");
        Ok(ticks)
    }

    /// Returns the unit and the statistics to their reset state, dropping all queued work.
    pub fn reset(&mut self) {
        self.unit.reset();
        let lanes = self.lanes();
        self.pending.iter_mut().for_each(VecDeque::clear);
        self.in_flight.fill(0);
        self.results.iter_mut().for_each(Vec::clear);
        self.stop = 0;
        self.stats = PipeStats::new(lanes);
    }
}
