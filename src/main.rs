use std::path::PathBuf;

use clap::Parser;
use stepvm::disasm;
use stepvm::interp::Interpreter;
use stepvm::isa::Instr;
use stepvm::memory::Memory;
use stepvm::register::{NUM_REGS, RegisterFile};

#[derive(Parser)]
#[command(name = "stepvm", about = "A minimal stepped bytecode virtual machine")]
struct Cli {
    /// Path to the binary image to execute.
    image: PathBuf,

    /// Stop after at most this many executed instructions.
    #[arg(long)]
    step_limit: Option<u64>,

    /// Print the image disassembly and exit without executing.
    #[arg(long)]
    disassemble: bool,

    /// Print each instruction to stderr as it executes.
    #[arg(long)]
    trace: bool,

    /// Print the final register file and terminal state to stderr.
    #[arg(long)]
    dump_registers: bool,
}

fn main() {
    let cli = Cli::parse();

    // File problems are environment errors and the only nonzero exits;
    // whatever the machine itself does is an ordinary run.
    let bytes = match std::fs::read(&cli.image) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{}: {e}", cli.image.display());
            std::process::exit(1);
        }
    };

    if cli.disassemble {
        print!("{}", disasm::disassemble(&bytes));
        return;
    }

    println!("size = {}", bytes.len());

    let mut mem = Memory::new(bytes);
    let mut regs = RegisterFile::new();
    let mut interp = Interpreter::new(&mut mem, &mut regs);

    loop {
        if cli
            .step_limit
            .is_some_and(|limit| interp.retired() >= limit)
        {
            eprintln!("step limit reached after {} instructions", interp.retired());
            break;
        }
        if cli.trace {
            let pc = interp.pc();
            if let Ok(instr) = Instr::fetch(interp.memory(), pc) {
                eprintln!("{pc:08X}  {}", disasm::render(instr));
            }
        }
        if !interp.step() {
            break;
        }
    }
    println!();

    let status = interp.status();
    let fault = interp.last_fault();
    let retired = interp.retired();
    drop(interp);

    if cli.dump_registers {
        match fault {
            Some(fault) => eprintln!("{status} ({fault}) after {retired} instructions"),
            None => eprintln!("{status} after {retired} instructions"),
        }
        eprintln!("  pc = {:#010X}", regs.pc());
        for i in 0..NUM_REGS as u8 {
            // Indices below NUM_REGS are always valid.
            let value = regs.get(i).unwrap_or_default();
            eprintln!("  r{i} = {value:#010X}");
        }
    }
}
