use crate::fault::Fault;
use crate::isa::{Instr, Opcode};
use crate::memory::Memory;

/// Pretty-print a linear disassembly of an image for human inspection.
///
/// Sweeps from offset 0, one line per decoded instruction:
/// address, hex dump of the instruction bytes, mnemonic and operands.
/// A byte with no opcode (or a malformed operand) prints as `???`, an
/// instruction cut off by the image end as `(truncated)`; both advance a
/// single byte so the sweep resynchronizes.
pub fn disassemble(image: &[u8]) -> String {
    use std::fmt::Write;

    let mem = Memory::new(image.to_vec());
    let mut out = String::new();
    let mut addr = 0usize;

    while addr < image.len() {
        let (text, size) = match Instr::fetch(&mem, addr as u32) {
            Ok(instr) => (render(instr), instr.encoded_len()),
            Err(Fault::OutOfBounds) if Opcode::from_byte(image[addr]).is_some() => {
                ("(truncated)".to_string(), 1)
            }
            Err(_) => ("???".to_string(), 1),
        };

        let mut hex = String::new();
        for i in 0..size {
            if i > 0 {
                hex.push(' ');
            }
            write!(hex, "{:02X}", image[addr + i]).unwrap();
        }

        let _ = writeln!(out, "{addr:04X}: {hex:<18} {text}");
        addr += size;
    }

    out
}

/// Render one decoded instruction the way [`disassemble`] prints it.
pub fn render(instr: Instr) -> String {
    let m = instr.opcode().mnemonic();
    match instr {
        Instr::Halt => m.to_string(),
        Instr::LoadImm { dst, imm } => format!("{m} r{dst}, {imm:#010X}"),
        Instr::Add { dst, lhs, rhs }
        | Instr::Sub { dst, lhs, rhs }
        | Instr::Mul { dst, lhs, rhs }
        | Instr::Div { dst, lhs, rhs } => format!("{m} r{dst}, r{lhs}, r{rhs}"),
        Instr::Load { dst, addr, width } => format!("{m} r{dst}, [r{addr}], {}", width.bytes()),
        Instr::Store { addr, src, width } => format!("{m} [r{addr}], r{src}, {}", width.bytes()),
        Instr::Jmp { target } => format!("{m} {target:#010X}"),
        Instr::Jz { cond, target } | Instr::Jnz { cond, target } => {
            format!("{m} r{cond}, {target:#010X}")
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn never_panics(image in prop::collection::vec(any::<u8>(), 0..512)) {
            let _ = disassemble(&image);
        }

        #[test]
        fn covers_every_byte(image in prop::collection::vec(any::<u8>(), 1..256)) {
            // The sweep must terminate and emit at least one line, and no
            // line may claim an address past the end.
            let dis = disassemble(&image);
            prop_assert!(!dis.is_empty());
            for line in dis.lines() {
                let addr = usize::from_str_radix(&line[..4], 16).unwrap();
                prop_assert!(addr < image.len());
            }
        }
    }
}
