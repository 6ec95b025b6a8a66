//! Pure forwarding-intent computation.
//!
//! `ForwardingUnit` decides which stage a hazardous operand *would* be
//! forwarded from. Execute does not apply this decision to the values it
//! reads from the architectural register file — see the advisory-only
//! design note. The unit exists so its decisions can be observed and
//! tested independently of that choice.

use crate::pipeline::latches::PipelineStage;

/// Where (if anywhere) an operand would be forwarded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardSource {
    None,
    FromExMem,
    FromMemWb,
}

/// Computes forwarding intent for the two source operands of the
/// instruction in `id_ex`, given the newer `ex_mem` and `mem_wb` snapshots.
///
/// EX/MEM takes priority over MEM/WB for the same register, matching a
/// standard forwarding priority scheme.
pub fn resolve(
    id_ex: &PipelineStage,
    ex_mem: &PipelineStage,
    mem_wb: &PipelineStage,
) -> (ForwardSource, ForwardSource) {
    let mut a = ForwardSource::None;
    let mut b = ForwardSource::None;

    if !ex_mem.bubble && ex_mem.inst.rd != 0 {
        if ex_mem.inst.rd == id_ex.inst.rs1 {
            a = ForwardSource::FromExMem;
        }
        if ex_mem.inst.rd == id_ex.inst.rs2 {
            b = ForwardSource::FromExMem;
        }
    }

    if !mem_wb.bubble && mem_wb.inst.rd != 0 {
        if a == ForwardSource::None && mem_wb.inst.rd == id_ex.inst.rs1 {
            a = ForwardSource::FromMemWb;
        }
        if b == ForwardSource::None && mem_wb.inst.rd == id_ex.inst.rs2 {
            b = ForwardSource::FromMemWb;
        }
    }

    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::decode;

    fn stage_with_rd(rd: usize) -> PipelineStage {
        let mut stage = PipelineStage::bubble();
        stage.bubble = false;
        stage.inst = decode(0);
        stage.inst.rd = rd;
        stage
    }

    fn id_ex_with_sources(rs1: usize, rs2: usize) -> PipelineStage {
        let mut stage = PipelineStage::bubble();
        stage.bubble = false;
        stage.inst = decode(0);
        stage.inst.rs1 = rs1;
        stage.inst.rs2 = rs2;
        stage
    }

    #[test]
    fn ex_mem_takes_priority_over_mem_wb() {
        let id_ex = id_ex_with_sources(5, 0);
        let ex_mem = stage_with_rd(5);
        let mem_wb = stage_with_rd(5);
        let (a, _) = resolve(&id_ex, &ex_mem, &mem_wb);
        assert_eq!(a, ForwardSource::FromExMem);
    }

    #[test]
    fn mem_wb_forwards_when_ex_mem_does_not_match() {
        let id_ex = id_ex_with_sources(0, 6);
        let ex_mem = stage_with_rd(5);
        let mem_wb = stage_with_rd(6);
        let (_, b) = resolve(&id_ex, &ex_mem, &mem_wb);
        assert_eq!(b, ForwardSource::FromMemWb);
    }

    #[test]
    fn rd_zero_never_forwards() {
        let id_ex = id_ex_with_sources(0, 0);
        let ex_mem = stage_with_rd(0);
        let mem_wb = stage_with_rd(0);
        let (a, b) = resolve(&id_ex, &ex_mem, &mem_wb);
        assert_eq!(a, ForwardSource::None);
        assert_eq!(b, ForwardSource::None);
    }

    #[test]
    fn bubble_stages_never_forward() {
        let id_ex = id_ex_with_sources(5, 5);
        let mut ex_mem = stage_with_rd(5);
        ex_mem.bubble = true;
        let mut mem_wb = stage_with_rd(5);
        mem_wb.bubble = true;
        let (a, b) = resolve(&id_ex, &ex_mem, &mem_wb);
        assert_eq!(a, ForwardSource::None);
        assert_eq!(b, ForwardSource::None);
    }
}
