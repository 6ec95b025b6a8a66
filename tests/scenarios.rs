//! Integration tests driving a whole `Pipeline` through the concrete
//! scenarios: back-to-back RAW hazard, float add, a counted branch loop,
//! RAM latency on a cache-missing write, and exception reset.

use pipe5sim::cpu_state::Exception;
use pipe5sim::isa::{funct7, opcodes};
use pipe5sim::{Pipeline, Ram};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn enc_lui(rd: usize, upper20: u32) -> u32 {
    opcodes::LUI | ((rd as u32) << 7) | (upper20 << 12)
}

fn enc_addi(rd: usize, rs1: usize, imm12: i32) -> u32 {
    opcodes::ADDI | ((rd as u32) << 7) | ((rs1 as u32) << 15) | (((imm12 as u32) & 0xFFF) << 20)
}

fn enc_flw(rd: usize, rs1: usize, imm12: i32) -> u32 {
    opcodes::FLW | ((rd as u32) << 7) | ((rs1 as u32) << 15) | (((imm12 as u32) & 0xFFF) << 20)
}

fn enc_fsw(rs1: usize, rs2: usize, imm12: i32) -> u32 {
    let imm = imm12 as u32 & 0xFFF;
    opcodes::FSW
        | ((imm & 0x1f) << 7)
        | ((rs1 as u32) << 15)
        | ((rs2 as u32) << 20)
        | ((imm >> 5) << 25)
}

fn enc_fadd_s(rd: usize, rs1: usize, rs2: usize) -> u32 {
    opcodes::OP_FP
        | ((rd as u32) << 7)
        | ((rs1 as u32) << 15)
        | ((rs2 as u32) << 20)
        | (funct7::FADD_S << 25)
}

fn enc_bnez(rs1: usize, imm13: i32) -> u32 {
    let imm = imm13 as u32 & 0x1FFF;
    let bit11 = (imm >> 11) & 0x1;
    let bit12 = (imm >> 12) & 0x1;
    let bits_4_1 = (imm >> 1) & 0xF;
    let bits_10_5 = (imm >> 5) & 0x3F;
    opcodes::BNEZ
        | (bit11 << 7)
        | (bits_4_1 << 8)
        | ((rs1 as u32) << 15)
        | (bits_10_5 << 25)
        | (bit12 << 31)
}

#[test]
fn s1_lui_then_addi_raw_hazard() {
    let mut ram = Ram::new(1024);
    ram.write32(0, enc_lui(5, 0x10));
    ram.write32(4, enc_addi(5, 5, 1));

    let mut pipeline = Pipeline::new();
    for _ in 0..12 {
        pipeline.tick(&mut ram);
    }

    assert_eq!(pipeline.cpu.x.read(5), 0x1_0001);
    assert!(pipeline.stats.data_hazard_stalls >= 1);
}

#[test]
fn s2_fadd_s_from_loaded_operands() {
    let mut ram = Ram::new(4096);
    ram.write_float(0x100, 1.5);
    ram.write_float(0x104, 2.25);
    for _ in 0..4 {
        ram.tick();
    }

    ram.write32(0, enc_lui(1, 0x100 >> 12));
    ram.write32(4, enc_addi(1, 1, 0x100 & 0xFFF));
    ram.write32(8, enc_lui(2, 0x100 >> 12));
    ram.write32(12, enc_addi(2, 2, 0x104 & 0xFFF));
    ram.write32(16, enc_flw(1, 1, 0));
    ram.write32(20, enc_flw(2, 2, 0));
    ram.write32(24, enc_fadd_s(3, 1, 2));

    let mut pipeline = Pipeline::new();
    for _ in 0..30 {
        pipeline.tick(&mut ram);
    }

    assert_eq!(pipeline.cpu.f.read(3), 3.75);
}

#[test]
fn s3_fsw_result_round_trips_through_ram() {
    let mut ram = Ram::new(4096);
    ram.write_float(0x100, 1.0);
    ram.write_float(0x104, 2.0);
    for _ in 0..4 {
        ram.tick();
    }

    ram.write32(0, enc_lui(1, 0x100 >> 12));
    ram.write32(4, enc_addi(1, 1, 0x100 & 0xFFF));
    ram.write32(8, enc_lui(2, 0x100 >> 12));
    ram.write32(12, enc_addi(2, 2, 0x104 & 0xFFF));
    ram.write32(16, enc_lui(3, 0x200 >> 12));
    ram.write32(20, enc_addi(3, 3, 0x200 & 0xFFF));
    ram.write32(24, enc_flw(1, 1, 0));
    ram.write32(28, enc_flw(2, 2, 0));
    ram.write32(32, enc_fadd_s(3, 1, 2));
    ram.write32(36, enc_fsw(3, 3, 0));

    let mut pipeline = Pipeline::new();
    for _ in 0..40 {
        pipeline.tick(&mut ram);
    }

    assert_eq!(ram.read_float(0x200), 3.0);
}

#[test]
fn s4_branch_taken_loop_counts_every_resolution() {
    // Counter starts at 4: the loop resolves BNEZ on 3, 2, 1 (taken) and on
    // 0 (not taken), four resolutions total.
    let mut ram = Ram::new(1024);
    ram.write32(0, enc_addi(1, 0, 4));
    ram.write32(4, enc_addi(1, 1, -1));
    ram.write32(8, enc_bnez(1, -4));

    let mut pipeline = Pipeline::new();
    for _ in 0..60 {
        pipeline.tick(&mut ram);
    }

    assert_eq!(pipeline.cpu.x.read(1), 0);
    assert_eq!(pipeline.stats.total_branches, 4);
}

#[test]
fn s5_cache_missing_write_leaves_ram_waiting() {
    let mut ram = Ram::new(4096);
    // Addresses spaced by (num_sets * block_bytes) map to the same set with
    // distinct tags, so each of the first four is a guaranteed miss.
    for i in 0..5u32 {
        ram.write32(i * 256, 0xAAAA_AAAA);
        assert!(ram.is_waiting());
        while ram.is_waiting() {
            ram.tick();
        }
    }
}

#[test]
fn s6_exception_reset_clears_state_and_counts_once() {
    let mut ram = Ram::new(1024);
    let mut pipeline = Pipeline::new();
    pipeline.cpu.x.write(5, 42);
    pipeline.cpu.pc = 0x100;
    pipeline.cpu.raise(Exception::DivideByZero { pc: 0x100 });

    pipeline.tick(&mut ram);

    assert_eq!(pipeline.stats.exceptions, 1);
    assert_eq!(pipeline.cpu.pc, 0);
    assert_eq!(pipeline.cpu.x.read(5), 0);
    assert!(pipeline.cpu.exception.is_none());
}

#[rstest]
#[case::lui(enc_lui(5, 0x1), true)]
#[case::addi(enc_addi(5, 0, 1), true)]
#[case::flw(enc_flw(1, 0, 0), true)]
#[case::fsw(enc_fsw(0, 1, 0), true)]
#[case::fadd_s(enc_fadd_s(1, 2, 3), true)]
#[case::bnez(enc_bnez(1, 4), true)]
#[case::unassigned_opcode(0xFFFF_FFFF, false)]
fn opcode_table_matches_the_supported_subset(#[case] word: u32, #[case] recognized: bool) {
    let inst = pipe5sim::isa::decode(word);
    let is_recognized = inst.opcode == opcodes::LUI
        || inst.opcode == opcodes::ADDI
        || inst.opcode == opcodes::FLW
        || inst.opcode == opcodes::FSW
        || inst.opcode == opcodes::OP_FP
        || inst.opcode == opcodes::BNEZ;
    assert_eq!(is_recognized, recognized);
}
