//! Writeback stage: the sole commit point for `instructions_completed`.

use crate::isa::{funct7, opcodes};
use crate::pipeline::latches::PipelineStage;
use crate::stats::Statistics;

/// Whether `inst` is one of the recognized, non-no-op opcodes that counts
/// as a completed instruction.
fn is_counted(opcode: u32, funct7_field: u32) -> bool {
    matches!(
        opcode,
        opcodes::LUI | opcodes::ADDI | opcodes::FLW | opcodes::FSW | opcodes::BNEZ
    ) || (opcode == opcodes::OP_FP && funct7_field == funct7::FADD_S)
}

pub fn writeback(mem_wb: &PipelineStage, stats: &mut Statistics) {
    if mem_wb.bubble || mem_wb.stall {
        return;
    }
    if is_counted(mem_wb.inst.opcode, mem_wb.inst.funct7) {
        stats.instructions_completed += 1;
    }
}
