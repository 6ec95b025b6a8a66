//! Simulation statistics: counters and derived metrics.

/// Monotonically increasing counters for a simulation run, plus CPI and
/// misprediction-rate accessors derived on demand.
#[derive(Default, Debug, Clone)]
pub struct Statistics {
    pub total_cycles: u64,
    pub instructions_completed: u64,

    pub data_hazard_stalls: u64,
    pub memory_stalls: u64,
    pub control_hazard_stalls: u64,
    pub ram_wait_cycles: u64,

    pub cache_misses: u64,

    pub total_branches: u64,
    pub branch_mispredictions: u64,

    pub exceptions: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cycles per instruction. `0.0` before any instruction has completed.
    pub fn cpi(&self) -> f64 {
        if self.instructions_completed == 0 {
            0.0
        } else {
            self.total_cycles as f64 / self.instructions_completed as f64
        }
    }

    /// Fraction of resolved branches that were mispredicted. `0.0` if no
    /// branch has resolved yet.
    pub fn misprediction_rate(&self) -> f64 {
        if self.total_branches == 0 {
            0.0
        } else {
            self.branch_mispredictions as f64 / self.total_branches as f64
        }
    }

    /// Prints a grouped-section report to stdout.
    pub fn print(&self) {
        println!("\n=========================================================");

        println!("\n[General]");
        println!("  Cycles:                {}", self.total_cycles);
        println!("  Instructions Completed: {}", self.instructions_completed);
        println!("  CPI:                    {:.4}", self.cpi());

        println!("\n[Pipeline Stalls]");
        let total_stalls =
            self.data_hazard_stalls + self.memory_stalls + self.control_hazard_stalls;
        println!("  Total Stalled Cycles:  {total_stalls}");
        if total_stalls > 0 {
            println!(
                "    Data Hazards:        {:<10} ({:.2}%)",
                self.data_hazard_stalls,
                (self.data_hazard_stalls as f64 / total_stalls as f64) * 100.0
            );
            println!(
                "    Memory Latency:      {:<10} ({:.2}%)",
                self.memory_stalls,
                (self.memory_stalls as f64 / total_stalls as f64) * 100.0
            );
            println!(
                "    Control Hazards:     {:<10} ({:.2}%)",
                self.control_hazard_stalls,
                (self.control_hazard_stalls as f64 / total_stalls as f64) * 100.0
            );
        }

        println!("\n[Branch Prediction]");
        if self.total_branches > 0 {
            println!(
                "  Accuracy:              {:.2}% ({} / {})",
                (1.0 - self.misprediction_rate()) * 100.0,
                self.total_branches - self.branch_mispredictions,
                self.total_branches
            );
        } else {
            println!("  No branches executed.");
        }

        println!("\n[Memory Hierarchy]");
        println!("  Cache Misses:          {}", self.cache_misses);
        println!("  RAM Wait Cycles:       {}", self.ram_wait_cycles);

        println!("\n[Exceptions]");
        println!("  Count:                 {}", self.exceptions);

        println!("=========================================================\n");
    }
}
