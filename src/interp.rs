use crate::fault::Fault;
use crate::isa::Instr;
use crate::memory::Memory;
use crate::register::RegisterFile;

/// Where the machine is in its lifecycle.
///
/// `Halted` and `Faulted` are terminal: every later `step()` call returns
/// `false` without touching memory or registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Halted,
    Faulted,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Running => write!(f, "running"),
            Status::Halted => write!(f, "halted"),
            Status::Faulted => write!(f, "faulted"),
        }
    }
}

/// The decode-dispatch loop, one instruction per `step()` call.
///
/// An interpreter borrows exactly one [`Memory`] and one [`RegisterFile`]
/// for its whole lifetime; the borrows guarantee it cannot outlive either
/// and that nothing else mutates them while it runs. The caller owns the
/// stepping cadence — `step()` never blocks, never yields mid-instruction,
/// and does a bounded amount of work per call.
///
/// Every instruction's effect is all-or-nothing: operand decode, register
/// bounds and memory bounds are all checked before the instruction's
/// single write, so a faulting instruction leaves the machine exactly as
/// it found it (apart from the latched fault).
pub struct Interpreter<'a> {
    mem: &'a mut Memory,
    regs: &'a mut RegisterFile,
    halted: bool,
    last_fault: Option<Fault>,
    retired: u64,
}

impl<'a> Interpreter<'a> {
    pub fn new(mem: &'a mut Memory, regs: &'a mut RegisterFile) -> Self {
        Self {
            mem,
            regs,
            halted: false,
            last_fault: None,
            retired: 0,
        }
    }

    pub fn status(&self) -> Status {
        if self.regs.fault() {
            Status::Faulted
        } else if self.halted {
            Status::Halted
        } else {
            Status::Running
        }
    }

    /// The fault that ended the run, if one did.
    pub fn last_fault(&self) -> Option<Fault> {
        self.last_fault
    }

    /// Number of instructions that fully executed (`step()` calls that
    /// returned `true`).
    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// The current instruction pointer, for between-step inspection.
    pub fn pc(&self) -> u32 {
        self.regs.pc()
    }

    /// Read-only view of the machine's memory, for between-step
    /// inspection (e.g. tracing the upcoming instruction).
    pub fn memory(&self) -> &Memory {
        self.mem
    }

    /// Execute at most one instruction.
    ///
    /// Returns `true` if an instruction fully executed and the machine
    /// remains runnable; `false` once the machine is halted or faulted.
    /// Terminal calls are idempotent and side-effect free.
    pub fn step(&mut self) -> bool {
        if self.halted || self.regs.fault() {
            return false;
        }
        match self.exec_one() {
            Ok(running) => running,
            Err(fault) => {
                self.regs.set_fault();
                self.last_fault = Some(fault);
                false
            }
        }
    }

    /// One fetch-decode-execute-advance cycle. `Ok(false)` is an orderly
    /// halt; any `Err` faults the machine.
    fn exec_one(&mut self) -> Result<bool, Fault> {
        let pc = self.regs.pc();
        let instr = Instr::fetch(self.mem, pc)?;
        // The next fetch re-checks bounds, so a wrap at the top of the
        // address space surfaces as OutOfBounds there.
        let next = pc.wrapping_add(instr.encoded_len() as u32);

        match instr {
            Instr::Halt => {
                // pc stays on the HALT byte; the halt call itself reports
                // non-runnable.
                self.halted = true;
                return Ok(false);
            }
            Instr::LoadImm { dst, imm } => {
                self.regs.set(dst, imm)?;
            }
            Instr::Add { dst, lhs, rhs } => {
                let v = self.regs.get(lhs)?.wrapping_add(self.regs.get(rhs)?);
                self.regs.set(dst, v)?;
            }
            Instr::Sub { dst, lhs, rhs } => {
                let v = self.regs.get(lhs)?.wrapping_sub(self.regs.get(rhs)?);
                self.regs.set(dst, v)?;
            }
            Instr::Mul { dst, lhs, rhs } => {
                let v = self.regs.get(lhs)?.wrapping_mul(self.regs.get(rhs)?);
                self.regs.set(dst, v)?;
            }
            Instr::Div { dst, lhs, rhs } => {
                let l = self.regs.get(lhs)?;
                let r = self.regs.get(rhs)?;
                if r == 0 {
                    return Err(Fault::DivisionByZero);
                }
                self.regs.set(dst, l / r)?;
            }
            Instr::Load { dst, addr, width } => {
                let a = self.regs.get(addr)?;
                let v = self.mem.read(a, width)?;
                self.regs.set(dst, v as u32)?;
            }
            Instr::Store { addr, src, width } => {
                let a = self.regs.get(addr)?;
                let v = self.regs.get(src)?;
                self.mem.write(a, width, v as u64)?;
            }
            Instr::Jmp { target } => {
                self.regs.set_pc(target);
                self.retired += 1;
                return Ok(true);
            }
            Instr::Jz { cond, target } => {
                if self.regs.get(cond)? == 0 {
                    self.regs.set_pc(target);
                    self.retired += 1;
                    return Ok(true);
                }
            }
            Instr::Jnz { cond, target } => {
                if self.regs.get(cond)? != 0 {
                    self.regs.set_pc(target);
                    self.retired += 1;
                    return Ok(true);
                }
            }
        }

        self.regs.set_pc(next);
        self.retired += 1;
        Ok(true)
    }
}
