//! Fetch stage: reads the next instruction word and consults the branch
//! predictor for BNEZ.

use crate::branch_predictor::BranchPredictor;
use crate::cache::Cache;
use crate::isa::{decode, opcodes};
use crate::pipeline::latches::PipelineStage;
use crate::ram::Ram;
use crate::stats::Statistics;

/// Fetches the instruction at `pc`, advancing `pc` (or following a taken
/// branch prediction). Returns a bubble and leaves `pc` untouched while the
/// RAM is still servicing a prior write.
pub fn fetch(
    pc: &mut u32,
    ram: &Ram,
    icache: &mut Cache,
    predictor: &BranchPredictor,
    stats: &mut Statistics,
) -> PipelineStage {
    if ram.is_waiting() {
        stats.ram_wait_cycles += 1;
        return PipelineStage::bubble();
    }

    let fetch_pc = *pc;
    if !icache.access(u64::from(fetch_pc), false) {
        stats.cache_misses += 1;
    }

    let word = ram.read32(fetch_pc);
    let inst = decode(word);

    let mut predicted_taken = false;
    let mut predicted_target = 0;
    let mut next_pc = fetch_pc.wrapping_add(4);

    if inst.opcode == opcodes::BNEZ {
        predicted_taken = predictor.predict(fetch_pc);
        if predicted_taken {
            predicted_target = (fetch_pc as i64 + i64::from(inst.imm)) as u32;
            next_pc = predicted_target;
        }
    }

    *pc = next_pc;

    PipelineStage {
        pc: fetch_pc,
        inst,
        bubble: false,
        stall: false,
        predicted_taken,
        predicted_target,
    }
}
