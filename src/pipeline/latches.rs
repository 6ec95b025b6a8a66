//! Pipeline stage latches: the registers that sit between adjacent stages.

use crate::isa::Instruction;

/// A latch between two pipeline stages.
///
/// `bubble` marks an empty (no-op) slot. `stall` marks a latch that is
/// being held for a producer (the load-use / RAW hazard path): when set on
/// the ID latch, the next shift bubbles EX instead of advancing, and Fetch
/// is skipped so the PC stays frozen.
#[derive(Clone, Debug)]
pub struct PipelineStage {
    pub pc: u32,
    pub inst: Instruction,
    pub bubble: bool,
    pub stall: bool,
    /// BNEZ-only: the direction Decode's branch predictor consultation
    /// predicted for this instruction, compared against Execute's resolved
    /// outcome. Meaningless for non-branch instructions.
    pub predicted_taken: bool,
    /// BNEZ-only: the PC the predictor's direction implied Fetch would jump
    /// to, used to redirect on a correct taken prediction without waiting
    /// for Execute.
    pub predicted_target: u32,
}

impl PipelineStage {
    /// A fresh bubble at PC 0, used to seed empty latches.
    pub fn bubble() -> Self {
        Self {
            pc: 0,
            inst: crate::isa::decode(Instruction::NOP),
            bubble: true,
            stall: false,
            predicted_taken: false,
            predicted_target: 0,
        }
    }
}

impl Default for PipelineStage {
    fn default() -> Self {
        Self::bubble()
    }
}
