//! Byte-addressed RAM with write latency, backed by an owned data cache.

use crate::cache::Cache;
use crate::cpu_state::Exception;

/// Main memory. Out-of-range 32-bit accesses during simulation are silent
/// no-ops (writes dropped, reads return 0); only the bulk [`Ram::load`]
/// path used by the driver treats out-of-range as a fault.
#[derive(Debug)]
pub struct Ram {
    bytes: Vec<u8>,
    wait_cycles: u64,
    data_cache: Cache,
}

impl Ram {
    pub fn new(size_bytes: usize) -> Self {
        Self {
            bytes: vec![0; size_bytes],
            wait_cycles: 0,
            data_cache: Cache::new(),
        }
    }

    /// Reads a little-endian 32-bit word. Out-of-range reads return 0.
    pub fn read32(&self, addr: u32) -> u32 {
        let addr = addr as usize;
        if addr + 4 > self.bytes.len() {
            return 0;
        }
        u32::from_le_bytes(self.bytes[addr..addr + 4].try_into().unwrap())
    }

    /// Writes a little-endian 32-bit word.
    ///
    /// On a cache miss, 2 wait cycles are added; the write then always ends
    /// by assigning `wait_cycles = 2` regardless of hit or miss — this
    /// overwrite is preserved exactly for timing reproducibility (see
    /// `DESIGN.md`), even though it discards the miss penalty just added.
    pub fn write32(&mut self, addr: u32, value: u32) {
        let addr_usize = addr as usize;
        if addr_usize + 4 > self.bytes.len() {
            return;
        }

        if !self.data_cache.access(addr as u64, true) {
            self.wait_cycles += 2;
        }

        self.bytes[addr_usize..addr_usize + 4].copy_from_slice(&value.to_le_bytes());
        self.wait_cycles = 2;
    }

    /// Reads a 32-bit value at `addr` reinterpreted as `f32`.
    pub fn read_float(&self, addr: u32) -> f32 {
        f32::from_bits(self.read32(addr))
    }

    /// Writes `value`'s bit pattern at `addr` via [`Ram::write32`].
    pub fn write_float(&mut self, addr: u32, value: f32) {
        self.write32(addr, value.to_bits());
    }

    /// Whether a prior write's latency is still outstanding.
    pub fn is_waiting(&self) -> bool {
        self.wait_cycles > 0
    }

    /// Advances the latency model by one cycle. Called once per pipeline
    /// tick, after stage logic has run.
    pub fn tick(&mut self) {
        if self.wait_cycles > 0 {
            self.wait_cycles -= 1;
        }
    }

    /// Bulk-loads `data` at `at`, for driver-side program/array
    /// initialization outside the timing model. Rejects ranges that don't
    /// fit, unlike the timed `write32` path.
    pub fn load(&mut self, data: &[u8], at: u32) -> Result<(), Exception> {
        let start = at as usize;
        let end = start + data.len();
        if end > self.bytes.len() {
            return Err(Exception::MemoryAccessFault {
                address: at,
                message: format!(
                    "range {start}..{end} exceeds RAM size {}",
                    self.bytes.len()
                ),
            });
        }
        self.bytes[start..end].copy_from_slice(data);
        Ok(())
    }
}
