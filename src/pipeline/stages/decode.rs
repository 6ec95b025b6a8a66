//! Decode stage: the data-hazard check and the (advisory-only) forwarding
//! consultation.

use crate::forwarding::{self, ForwardSource};
use crate::pipeline::latches::PipelineStage;

/// Full RAW hazard check: true if either the current EX or MEM producer
/// writes a register the instruction in `if_id` reads.
///
/// `id_ex` and `ex_mem` must be the genuine ID/EX and EX/MEM latch contents
/// for this cycle (the producer currently in EX, and the producer
/// currently in MEM) — callers must snapshot `ex_mem` before this cycle's
/// Execute call overwrites that latch.
///
/// Unlike a load-use-only check, this fires for any non-bubble producer
/// with a matching non-zero `rd`, because forwarding is never applied here
/// (see `crate::forwarding`).
pub fn check_data_hazards(if_id: &PipelineStage, id_ex: &PipelineStage, ex_mem: &PipelineStage) -> bool {
    if if_id.bubble {
        return false;
    }
    let rs1 = if_id.inst.rs1;
    let rs2 = if_id.inst.rs2;

    let hazard_against = |producer: &PipelineStage| {
        !producer.bubble && producer.inst.rd != 0 && (producer.inst.rd == rs1 || producer.inst.rd == rs2)
    };

    hazard_against(id_ex) || hazard_against(ex_mem)
}

/// Produces the ID/EX latch from the current IF/ID latch, and the
/// forwarding intent an observer could compare against Execute's actual
/// (non-forwarded) register reads.
///
/// `ex_mem` and `mem_wb` are the genuine EX/MEM and MEM/WB latch contents
/// for this cycle (the producer currently in MEM, and the producer
/// currently in WB) — callers must snapshot them before this cycle's
/// Memory/Execute calls overwrite those latches.
pub fn decode(
    if_id: &PipelineStage,
    ex_mem: &PipelineStage,
    mem_wb: &PipelineStage,
) -> (PipelineStage, (ForwardSource, ForwardSource)) {
    let forward = forwarding::resolve(if_id, ex_mem, mem_wb);
    let mut next = if_id.clone();
    next.stall = false;
    (next, forward)
}
