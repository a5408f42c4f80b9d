//! Instruction set definitions.
//!
//! Instructions use variable-length encoding: a one-byte opcode followed by
//! zero or more fixed-width operand fields. Register operands are one byte
//! (an index into the register bank), immediates and jump targets are
//! 32-bit little-endian words, and access widths are one byte holding the
//! literal width (1, 2 or 4).
//!
//! | Byte | Mnemonic | Operands        | Length | Effect |
//! |------|----------|-----------------|--------|--------|
//! | 0x00 | HALT     | —               | 1      | latch the halted state |
//! | 0x01 | LOADI    | dst, imm32      | 6      | `r[dst] = imm32` |
//! | 0x02 | ADD      | dst, lhs, rhs   | 4      | `r[dst] = r[lhs] + r[rhs]` (wrapping) |
//! | 0x03 | SUB      | dst, lhs, rhs   | 4      | wrapping subtract |
//! | 0x04 | MUL      | dst, lhs, rhs   | 4      | wrapping multiply |
//! | 0x05 | DIV      | dst, lhs, rhs   | 4      | unsigned divide, faults on zero divisor |
//! | 0x06 | LOAD     | dst, addr, w    | 4      | `r[dst] = mem[r[addr]..][..w]` zero-extended |
//! | 0x07 | STORE    | addr, src, w    | 4      | `mem[r[addr]..][..w] = low w bytes of r[src]` |
//! | 0x08 | JMP      | target32        | 5      | `pc = target32` |
//! | 0x09 | JZ       | cond, target32  | 6      | `pc = target32` if `r[cond] == 0` |
//! | 0x0A | JNZ      | cond, target32  | 6      | `pc = target32` if `r[cond] != 0` |
//!
//! Every other opcode byte faults the machine with `InvalidOpcode`. The
//! table is closed: decoding is a total match over [`Opcode`], so an
//! unhandled opcode cannot slip through.

use crate::fault::Fault;
use crate::memory::{Memory, Width};

/// The closed set of opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Halt,
    LoadImm,
    Add,
    Sub,
    Mul,
    Div,
    Load,
    Store,
    Jmp,
    Jz,
    Jnz,
}

impl Opcode {
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        match byte {
            0x00 => Some(Opcode::Halt),
            0x01 => Some(Opcode::LoadImm),
            0x02 => Some(Opcode::Add),
            0x03 => Some(Opcode::Sub),
            0x04 => Some(Opcode::Mul),
            0x05 => Some(Opcode::Div),
            0x06 => Some(Opcode::Load),
            0x07 => Some(Opcode::Store),
            0x08 => Some(Opcode::Jmp),
            0x09 => Some(Opcode::Jz),
            0x0A => Some(Opcode::Jnz),
            _ => None,
        }
    }

    /// Number of operand bytes following the opcode byte.
    pub fn operand_len(self) -> usize {
        match self {
            Opcode::Halt => 0,
            Opcode::LoadImm => 5,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => 3,
            Opcode::Load | Opcode::Store => 3,
            Opcode::Jmp => 4,
            Opcode::Jz | Opcode::Jnz => 5,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Halt => "HALT",
            Opcode::LoadImm => "LOADI",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
            Opcode::Jmp => "JMP",
            Opcode::Jz => "JZ",
            Opcode::Jnz => "JNZ",
        }
    }
}

/// A fully decoded instruction: opcode plus operand fields.
///
/// Register indices are carried as raw bytes; the bank bound is checked at
/// execution time, before the instruction's single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    Halt,
    LoadImm { dst: u8, imm: u32 },
    Add { dst: u8, lhs: u8, rhs: u8 },
    Sub { dst: u8, lhs: u8, rhs: u8 },
    Mul { dst: u8, lhs: u8, rhs: u8 },
    Div { dst: u8, lhs: u8, rhs: u8 },
    Load { dst: u8, addr: u8, width: Width },
    Store { addr: u8, src: u8, width: Width },
    Jmp { target: u32 },
    Jz { cond: u8, target: u32 },
    Jnz { cond: u8, target: u32 },
}

impl Instr {
    /// Fetch and decode one instruction at `at`.
    ///
    /// An opcode or operand fetch past the image end is `OutOfBounds`; an
    /// unknown opcode byte or a malformed width operand is `InvalidOpcode`.
    /// Decoding touches no machine state.
    pub fn fetch(mem: &Memory, at: u32) -> Result<Instr, Fault> {
        let byte = |k: u32| -> Result<u8, Fault> {
            let off = at.checked_add(k).ok_or(Fault::OutOfBounds)?;
            Ok(mem.read(off, Width::B1)? as u8)
        };
        let word = |k: u32| -> Result<u32, Fault> {
            let off = at.checked_add(k).ok_or(Fault::OutOfBounds)?;
            Ok(mem.read(off, Width::B4)? as u32)
        };
        let access_width = |k: u32| -> Result<Width, Fault> {
            // Registers are 32-bit, so 8-byte accesses are not encodable.
            match Width::from_byte(byte(k)?) {
                Some(Width::B8) | None => Err(Fault::InvalidOpcode),
                Some(w) => Ok(w),
            }
        };

        let opcode = Opcode::from_byte(byte(0)?).ok_or(Fault::InvalidOpcode)?;
        let instr = match opcode {
            Opcode::Halt => Instr::Halt,
            Opcode::LoadImm => Instr::LoadImm {
                dst: byte(1)?,
                imm: word(2)?,
            },
            Opcode::Add => Instr::Add {
                dst: byte(1)?,
                lhs: byte(2)?,
                rhs: byte(3)?,
            },
            Opcode::Sub => Instr::Sub {
                dst: byte(1)?,
                lhs: byte(2)?,
                rhs: byte(3)?,
            },
            Opcode::Mul => Instr::Mul {
                dst: byte(1)?,
                lhs: byte(2)?,
                rhs: byte(3)?,
            },
            Opcode::Div => Instr::Div {
                dst: byte(1)?,
                lhs: byte(2)?,
                rhs: byte(3)?,
            },
            Opcode::Load => Instr::Load {
                dst: byte(1)?,
                addr: byte(2)?,
                width: access_width(3)?,
            },
            Opcode::Store => Instr::Store {
                addr: byte(1)?,
                src: byte(2)?,
                width: access_width(3)?,
            },
            Opcode::Jmp => Instr::Jmp { target: word(1)? },
            Opcode::Jz => Instr::Jz {
                cond: byte(1)?,
                target: word(2)?,
            },
            Opcode::Jnz => Instr::Jnz {
                cond: byte(1)?,
                target: word(2)?,
            },
        };
        Ok(instr)
    }

    pub fn opcode(self) -> Opcode {
        match self {
            Instr::Halt => Opcode::Halt,
            Instr::LoadImm { .. } => Opcode::LoadImm,
            Instr::Add { .. } => Opcode::Add,
            Instr::Sub { .. } => Opcode::Sub,
            Instr::Mul { .. } => Opcode::Mul,
            Instr::Div { .. } => Opcode::Div,
            Instr::Load { .. } => Opcode::Load,
            Instr::Store { .. } => Opcode::Store,
            Instr::Jmp { .. } => Opcode::Jmp,
            Instr::Jz { .. } => Opcode::Jz,
            Instr::Jnz { .. } => Opcode::Jnz,
        }
    }

    /// Total encoded length, opcode byte included.
    pub fn encoded_len(self) -> usize {
        1 + self.opcode().operand_len()
    }
}
