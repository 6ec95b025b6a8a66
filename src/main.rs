//! `pipe5sim` — cycle-accurate 5-stage pipeline simulator CLI.
//!
//! Assembles a reference vector-add program, loads it and its input arrays
//! into RAM, and drives the pipeline one cycle at a time until the program
//! reaches its terminator, a cycle cap is hit, or a fatal exception occurs.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use pipe5sim::config::Config;
use pipe5sim::isa::{funct7, opcodes};
use pipe5sim::{Pipeline, Ram};

#[derive(Parser, Debug)]
#[command(
    name = "pipe5sim",
    author,
    version,
    about = "Cycle-accurate simulator for a 5-stage in-order pipeline"
)]
struct Cli {
    /// Print a per-cycle five-stage trace to stderr.
    #[arg(long)]
    trace: bool,

    /// Load simulation parameters from a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the cycle cap beyond which the run is declared incomplete.
    #[arg(long)]
    cycles: Option<u64>,
}

const PROGRAM_BASE: u32 = 0;
const DATA_A: u32 = 0x1000;
const DATA_B: u32 = 0x2000;
const DATA_C: u32 = 0x3000;
const VECTOR_LEN: usize = 8;

const DRAIN_CYCLES: u64 = 8;

const X_PTR_A: usize = 1;
const X_PTR_B: usize = 2;
const X_PTR_C: usize = 3;
const X_COUNTER: usize = 4;
const F_A: usize = 1;
const F_B: usize = 2;
const F_SUM: usize = 3;

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
    opcodes::FSW | ((imm & 0x1f) << 7) | ((rs1 as u32) << 15) | ((rs2 as u32) << 20) | ((imm >> 5) << 25)
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

fn enc_j() -> u32 {
    opcodes::JAL
}

/// Assembles the reference vector-add loop: `C[i] = A[i] + B[i]` for
/// `i in 0..VECTOR_LEN`, using pointer walking since the supported subset
/// has no multiply.
fn build_program() -> Vec<u32> {
    let mut words = vec![
        enc_lui(X_PTR_A, DATA_A >> 12),
        enc_addi(X_PTR_A, X_PTR_A, (DATA_A & 0xFFF) as i32),
        enc_lui(X_PTR_B, DATA_B >> 12),
        enc_addi(X_PTR_B, X_PTR_B, (DATA_B & 0xFFF) as i32),
        enc_lui(X_PTR_C, DATA_C >> 12),
        enc_addi(X_PTR_C, X_PTR_C, (DATA_C & 0xFFF) as i32),
        enc_addi(X_COUNTER, 0, VECTOR_LEN as i32),
    ];

    let loop_start = (words.len() * 4) as u32;
    words.extend_from_slice(&[
        enc_flw(F_A, X_PTR_A, 0),
        enc_flw(F_B, X_PTR_B, 0),
        enc_fadd_s(F_SUM, F_A, F_B),
        enc_fsw(X_PTR_C, F_SUM, 0),
        enc_addi(X_PTR_A, X_PTR_A, 4),
        enc_addi(X_PTR_B, X_PTR_B, 4),
        enc_addi(X_PTR_C, X_PTR_C, 4),
        enc_addi(X_COUNTER, X_COUNTER, -1),
    ]);

    let branch_pc = (words.len() * 4) as u32;
    let branch_imm = loop_start as i32 - branch_pc as i32;
    words.push(enc_bnez(X_COUNTER, branch_imm));
    words.push(enc_j());

    words
}

fn load_program(ram: &mut Ram, words: &[u32]) {
    for (i, &word) in words.iter().enumerate() {
        ram.write32(PROGRAM_BASE + (i as u32 * 4), word);
        // Drain the write's modeled latency immediately; program loading
        // happens before the timing model is in play.
        ram.tick();
        ram.tick();
    }
}

fn load_vectors(ram: &mut Ram) -> (Vec<f32>, Vec<f32>) {
    let a: Vec<f32> = (0..VECTOR_LEN).map(|i| (i + 1) as f32).collect();
    let b: Vec<f32> = (0..VECTOR_LEN).map(|i| (2 * i) as f32).collect();
    for (i, (&av, &bv)) in a.iter().zip(b.iter()).enumerate() {
        ram.write_float(DATA_A + (i as u32 * 4), av);
        ram.write_float(DATA_B + (i as u32 * 4), bv);
        ram.tick();
        ram.tick();
    }
    (a, b)
}

fn dump_state(pipeline: &Pipeline) {
    eprintln!("pc = {:#010x}", pipeline.cpu.pc);
    for i in (0..32).step_by(4) {
        eprintln!(
            "x{:<2}={:#010x} x{:<2}={:#010x} x{:<2}={:#010x} x{:<2}={:#010x}",
            i,
            pipeline.cpu.x.read(i),
            i + 1,
            pipeline.cpu.x.read(i + 1),
            i + 2,
            pipeline.cpu.x.read(i + 2),
            i + 3,
            pipeline.cpu.x.read(i + 3),
        );
    }
}

fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("error loading config: {e}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    if cli.trace {
        config.trace = true;
    }
    if let Some(cycles) = cli.cycles {
        config.cycle_cap = cycles;
    }

    let filter = if config.trace { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let mut ram = Ram::new(config.ram_size);
    let program = build_program();
    load_program(&mut ram, &program);
    let (a, b) = load_vectors(&mut ram);

    let done_pc = config
        .done_pc
        .unwrap_or_else(|| ((program.len() - 1) as u32) * 4);

    let mut pipeline = Pipeline::new();
    pipeline.cpu.pc = PROGRAM_BASE;

    let mut draining: Option<u64> = None;

    for cycle in 0..config.cycle_cap {
        pipeline.tick(&mut ram);

        if let Some(exception) = pipeline.cpu.exception.clone() {
            eprintln!("\nFATAL: {exception}");
            dump_state(&pipeline);
            pipeline.stats.print();
            process::exit(1);
        }

        if draining.is_none() && pipeline.cpu.pc >= done_pc {
            draining = Some(DRAIN_CYCLES);
        }
        if let Some(remaining) = draining.as_mut() {
            if *remaining == 0 {
                break;
            }
            *remaining -= 1;
        }
        let _ = cycle;
    }

    let mut mismatches = Vec::new();
    for i in 0..VECTOR_LEN {
        let expected = a[i] + b[i];
        let actual = ram.read_float(DATA_C + (i as u32 * 4));
        if (actual - expected).abs() > f32::EPSILON {
            mismatches.push((i, expected, actual));
        }
    }

    if mismatches.is_empty() {
        println!("vector add verified: {VECTOR_LEN} elements correct");
    } else {
        for (i, expected, actual) in &mismatches {
            eprintln!("C[{i}] mismatch: expected {expected}, got {actual}");
        }
    }

    pipeline.stats.print();

    if !mismatches.is_empty() {
        process::exit(1);
    }
}
