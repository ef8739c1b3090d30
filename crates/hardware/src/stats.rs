//! Simulation statistics collection and reporting.
//!
//! This module gathers the counters kept by every component into one report. It provides:
//! 1. **Summary:** Cycles, instructions and operations, throughput and latency.
//! 2. **Pipeline:** Per-stage acceptances and stall cycles, admission refusals.
//! 3. **Memory:** Per-SRAM reads, writes and port conflicts; DRAM traffic.
//! 4. **Control:** Cycles spent in each instruction FSM state.

use std::io::{self, Write};
use std::time::Instant;

use crate::common::{BufferKind, BufferMap};
use crate::core::control::{ControlStats, InstState};
use crate::core::pipeline::stages::{StageId, StageStats};
use crate::soc::memory::{DramStats, SramStats};

/// Section names for selective stats output.
///
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "pipeline", "memory", "control"];

/// Snapshot of every simulator counter.
#[derive(Clone, Debug)]
pub struct SimStats {
    start_time: Instant,
    /// Clock edges simulated.
    pub cycles: u64,
    /// Operations admitted by the datapath.
    pub ops_issued: u64,
    /// Operations retired by the datapath.
    pub ops_completed: u64,
    /// Admissions refused because the head register was occupied.
    pub insert_refusals: u64,
    /// Sum of per-operation latencies.
    pub latency_total: u64,
    /// Largest per-operation latency.
    pub latency_max: u64,
    /// Per-stage counters, in [`StageId::ALL`] order.
    pub stages: [StageStats; 3],
    /// Per-SRAM counters.
    pub srams: BufferMap<SramStats>,
    /// DRAM traffic.
    pub dram: DramStats,
    /// Control-processor counters.
    pub control: ControlStats,
}

impl Default for SimStats {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl SimStats {
    /// Creates zeroed statistics whose host time is measured from `start_time`.
    pub fn new(start_time: Instant) -> Self {
        Self {
            start_time,
            cycles: 0,
            ops_issued: 0,
            ops_completed: 0,
            insert_refusals: 0,
            latency_total: 0,
            latency_max: 0,
            stages: [StageStats::default(); 3],
            srams: BufferMap::default(),
            dram: DramStats::default(),
            control: ControlStats::default(),
        }
    }

    /// Mean retire-minus-issue latency, or 0 before the first retirement.
    pub fn mean_latency(&self) -> f64 {
        if self.ops_completed == 0 {
            return 0.0;
        }
        self.latency_total as f64 / self.ops_completed as f64
    }

    /// Writes the requested sections to `out`.
    ///
    /// # Errors
    ///
    /// Propagates write failures from `out`.
    pub fn write_sections<W: Write>(&self, out: &mut W, sections: &[String]) -> io::Result<()> {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let cyc = self.cycles.max(1) as f64;

        if want("summary") {
            let seconds = self.start_time.elapsed().as_secs_f64();
            let khz = if seconds > 0.0 {
                (self.cycles as f64 / seconds) / 1000.0
            } else {
                0.0
            };
            writeln!(out, "\n==========================================================")?;
            writeln!(out, "DNN ACCELERATOR SIMULATION STATISTICS")?;
            writeln!(out, "==========================================================")?;
            writeln!(out, "host_seconds             {seconds:.4} s")?;
            writeln!(out, "sim_cycles               {}", self.cycles)?;
            writeln!(out, "sim_freq                 {khz:.2} kHz")?;
            writeln!(out, "sim_insts                {}", self.control.instructions_completed)?;
            writeln!(out, "ops.issued               {}", self.ops_issued)?;
            writeln!(out, "ops.completed            {}", self.ops_completed)?;
            writeln!(
                out,
                "ops.per_cycle            {:.4}",
                self.ops_completed as f64 / cyc
            )?;
            writeln!(out, "latency.mean             {:.2}", self.mean_latency())?;
            writeln!(out, "latency.max              {}", self.latency_max)?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("pipeline") {
            writeln!(out, "PIPELINE")?;
            writeln!(out, "  insert.refused         {}", self.insert_refusals)?;
            for (id, stage) in StageId::ALL.iter().zip(&self.stages) {
                writeln!(
                    out,
                    "  {:<6} accepted: {:<10} | stalls: {:<10} ({:.2}%)",
                    id.to_string(),
                    stage.accepted,
                    stage.stall_cycles,
                    (stage.stall_cycles as f64 / cyc) * 100.0
                )?;
            }
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("memory") {
            writeln!(out, "MEMORY")?;
            for buffer in BufferKind::ALL {
                let sram = &self.srams[buffer];
                writeln!(
                    out,
                    "  {:<6} reads: {:<8} | writes: {:<8} | conflicts: {:<8} | lines: {}",
                    buffer.name(),
                    sram.reads,
                    sram.writes,
                    sram.port_conflicts,
                    sram.lines_transferred
                )?;
            }
            writeln!(
                out,
                "  DRAM   reads: {:<8} | writes: {:<8} | bytes: {}",
                self.dram.reads,
                self.dram.writes,
                self.dram.bytes_read + self.dram.bytes_written
            )?;
            writeln!(out, "----------------------------------------------------------")?;
        }
        if want("control") {
            writeln!(out, "CONTROL")?;
            for state in InstState::ALL {
                let cycles = self.control.cycles_in(state);
                writeln!(
                    out,
                    "  {:<12} {:<10} ({:.2}%)",
                    state.to_string(),
                    cycles,
                    (cycles as f64 / cyc) * 100.0
                )?;
            }
            writeln!(out, "  dram.requests          {}", self.control.dram_requests)?;
            writeln!(out, "  fill.retries           {}", self.control.fill_retries)?;
        }
        writeln!(out, "==========================================================")
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]. Pass an empty slice
    /// to print all sections (same as `print()`).
    pub fn print_sections(&self, sections: &[String]) {
        let stdout = io::stdout();
        let _ = self.write_sections(&mut stdout.lock(), sections);
    }

    /// Prints all statistics sections to stdout.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
