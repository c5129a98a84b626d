//! Simulation statistics collection and reporting.
//!
//! This module tracks transfer metrics for a pipeline run. It provides:
//! 1. **Cycles and throughput:** Ticks elapsed, operations issued and completed.
//! 2. **Stalls:** Ticks where a lane had work but the fan-in refused it, and ticks where
//!    a result was held because its lane was not ready.
//! 3. **Cancellation:** Operations dropped in flight.
//! 4. **Per-lane completions:** Results delivered to each lane.

use std::time::Instant;

/// Transfer statistics of one simulator run.
#[derive(Clone, Debug)]
pub struct PipeStats {
    start_time: Instant,
    /// Total ticks elapsed.
    pub cycles: u64,
    /// Operations accepted by the fan-in.
    pub issued: u64,
    /// Results delivered to their lane.
    pub completed: u64,
    /// Ticks where a lane had a pending operation that was not accepted.
    pub input_stalls: u64,
    /// Ticks where a result was offered but its lane was not ready.
    pub output_stalls: u64,
    /// Operations removed in flight by a cancel.
    pub cancelled: u64,
    /// Results delivered, per lane.
    pub lane_completions: Vec<u64>,
}

impl PipeStats {
    /// Creates zeroed statistics for `lanes` lanes.
    pub fn new(lanes: usize) -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            issued: 0,
            completed: 0,
            input_stalls: 0,
            output_stalls: 0,
            cancelled: 0,
            lane_completions: vec![0; lanes],
        }
    }

    /// Results delivered per tick.
    pub fn throughput(&self) -> f64 {
        let cyc = if self.cycles == 0 { 1 } else { self.cycles };
        self.completed as f64 / cyc as f64
    }

    /// Operations issued but neither completed nor cancelled.
    pub const fn in_flight(&self) -> u64 {
        self.issued - self.completed - self.cancelled
    }

    /// Prints all statistics to stdout.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        println!("==========================================================");
        println!("PIPELINE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("ops_issued               {}", self.issued);
        println!("ops_completed            {}", self.completed);
        println!("ops_cancelled            {}", self.cancelled);
        println!("throughput               {:.4} ops/cycle", self.throughput());
        println!("----------------------------------------------------------");
        println!("STALLS");
        println!("  stall.input            {}", self.input_stalls);
        println!("  stall.output           {}", self.output_stalls);
        println!("----------------------------------------------------------");
        println!("LANES");
        for (lane, done) in self.lane_completions.iter().enumerate() {
            println!("  lane{:<3} completed     {}", lane, done);
        }
        println!("==========================================================");
    }
}

impl Default for PipeStats {
    fn default() -> Self {
        Self::new(0)
    }
}
