//! Execute stage: ALU/FPU dispatch, branch resolution, and architectural
//! register commit for non-memory instructions.
//!
//! Execute reads `x`/`f` directly from [`CpuState`]; it does not apply the
//! forwarding intent computed in Decode (see `crate::forwarding`).

use crate::branch_predictor::BranchPredictor;
use crate::cpu_state::CpuState;
use crate::isa::{funct7, opcodes};
use crate::pipeline::latches::PipelineStage;
use crate::stats::Statistics;

/// Outcome of running Execute for one cycle: the resulting EX/MEM latch,
/// and an optional branch redirect (new PC) when a misprediction requires
/// flushing the younger instructions in IF and ID.
#[derive(Debug)]
pub struct ExecuteOutcome {
    pub ex_mem: PipelineStage,
    pub redirect: Option<u32>,
}

pub fn execute(
    id_ex: &PipelineStage,
    cpu: &mut CpuState,
    predictor: &mut BranchPredictor,
    stats: &mut Statistics,
) -> ExecuteOutcome {
    if id_ex.bubble {
        return ExecuteOutcome {
            ex_mem: PipelineStage::bubble(),
            redirect: None,
        };
    }

    let inst = id_ex.inst;
    let mut redirect = None;

    match inst.opcode {
        opcodes::LUI => cpu.x.write(inst.rd, inst.imm as u32),
        opcodes::ADDI => {
            let value = cpu.x.read(inst.rs1).wrapping_add(inst.imm as u32);
            cpu.x.write(inst.rd, value);
        }
        opcodes::OP_FP if inst.funct7 == funct7::FADD_S => {
            let value = cpu.f.read(inst.rs1) + cpu.f.read(inst.rs2);
            cpu.f.write(inst.rd, value);
        }
        opcodes::BNEZ => {
            stats.total_branches += 1;
            let actual_taken = cpu.x.read(inst.rs1) != 0;
            let target = if actual_taken {
                (id_ex.pc as i64 + i64::from(inst.imm)) as u32
            } else {
                id_ex.pc.wrapping_add(4)
            };
            predictor.update(id_ex.pc, actual_taken);

            let mispredicted = actual_taken != id_ex.predicted_taken
                || (actual_taken && target != id_ex.predicted_target);
            if mispredicted {
                stats.branch_mispredictions += 1;
                stats.control_hazard_stalls += 2;
                redirect = Some(target);
            }
        }
        _ => {}
    }

    ExecuteOutcome {
        ex_mem: PipelineStage {
            pc: id_ex.pc,
            inst,
            bubble: false,
            stall: false,
            predicted_taken: false,
            predicted_target: 0,
        },
        redirect,
    }
}
