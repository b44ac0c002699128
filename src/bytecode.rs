//! Byte-stream program format and its decoder.
//!
//! A program is a flat byte sequence: one opcode byte followed by a fixed,
//! opcode-specific payload. The encoder half of this contract lives in
//! [`crate::ast`]; the two must stay in lockstep.
//!
//! | byte | payload |
//! |------|---------|
//! | `NOP` | none |
//! | `LDC` | register selector, word lo, word hi (little endian) |
//! | `CPY`/`ADD`/`SUB` | src selector, dst selector |
//! | `INC`/`DEC` | register selector |
//! | `MOV`/`DIG` | dx as i8, dy as i8 |
//! | `JMP`/`JNZ` | label: length byte + ASCII name |
//! | `LABEL` | label; binds the name to the next instruction index, emits no op |

use log::{debug, trace};

use crate::executor::OpExecutor;
use crate::ops::Op;
use crate::registers::{Register, Word};

pub mod opcode {
    pub const NOP: u8 = 0x00;
    pub const LDC: u8 = 0x01;
    pub const CPY: u8 = 0x02;
    pub const ADD: u8 = 0x03;
    pub const SUB: u8 = 0x04;
    pub const INC: u8 = 0x05;
    pub const DEC: u8 = 0x06;
    pub const MOV: u8 = 0x07;
    pub const DIG: u8 = 0x08;
    pub const JMP: u8 = 0x09;
    pub const JNZ: u8 = 0x0A;
    pub const LABEL: u8 = 0x0B;
}

/// Diagnostics record for byte-program assembly. The assembler never panics
/// or propagates on malformed input; it records the first fault here and the
/// caller decides whether the program may be scheduled.
#[derive(Clone, Default, Debug)]
pub struct Status {
    pub has_error: bool,
    pub message: String,
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fault. The first fault wins; later ones are downstream
    /// noise from the same malformed stream.
    pub fn error(&mut self, message: impl Into<String>) {
        if self.has_error {
            return;
        }
        self.has_error = true;
        self.message = message.into();
    }
}

/// Assembly-time knobs stamped into the emitted ops.
#[derive(Clone, Copy, Debug)]
pub struct AsmContext {
    /// Movement speed bound into every `Move` op, in map-units per pulse
    /// scaled by the renderer. The headless core only carries it through.
    pub move_speed: u16,
}

impl Default for AsmContext {
    fn default() -> Self {
        AsmContext { move_speed: 12 }
    }
}

/// Decoder for byte-encoded programs. Walks the stream once to lay out
/// instructions and label positions, then backpatches jump targets, so
/// labels may be referenced before they are declared.
pub struct Assembler<'a> {
    code: &'a [u8],
    pos: usize,
    ctx: AsmContext,
}

impl<'a> Assembler<'a> {
    pub fn new(code: &'a [u8], ctx: AsmContext) -> Self {
        Assembler { code, pos: 0, ctx }
    }

    /// Assembles the stream into a ready executor. On malformed input the
    /// well-formed prefix is still returned for diagnostics, with the fault
    /// recorded in `status`; an errored program must not be scheduled.
    pub fn assemble(mut self, status: &mut Status) -> OpExecutor {
        let mut exec = OpExecutor::new();
        // Jump ops awaiting label resolution: (op index, label name)
        let mut patches: Vec<(usize, String)> = Vec::new();

        while let Some(op) = self.next_byte() {
            let at = self.pos - 1;
            match op {
                opcode::NOP => {
                    exec.add_op(Op::Nop);
                }
                opcode::LDC => {
                    let Some(reg) = self.read_reg(status) else {
                        return exec;
                    };
                    let Some(value) = self.read_word(status) else {
                        return exec;
                    };
                    exec.add_op(Op::LoadConst { reg, value });
                }
                opcode::CPY => {
                    let Some((src, dst)) = self.read_reg_pair(status) else {
                        return exec;
                    };
                    exec.add_op(Op::Copy { src, dst });
                }
                opcode::ADD => {
                    let Some((src, dst)) = self.read_reg_pair(status) else {
                        return exec;
                    };
                    exec.add_op(Op::Add { src, dst });
                }
                opcode::SUB => {
                    let Some((src, dst)) = self.read_reg_pair(status) else {
                        return exec;
                    };
                    exec.add_op(Op::Sub { src, dst });
                }
                opcode::INC => {
                    let Some(reg) = self.read_reg(status) else {
                        return exec;
                    };
                    exec.add_op(Op::Inc { reg });
                }
                opcode::DEC => {
                    let Some(reg) = self.read_reg(status) else {
                        return exec;
                    };
                    exec.add_op(Op::Dec { reg });
                }
                opcode::MOV => {
                    let Some((dx, dy)) = self.read_delta_pair(status) else {
                        return exec;
                    };
                    exec.add_op(Op::Move {
                        dx,
                        dy,
                        speed: self.ctx.move_speed,
                    });
                }
                opcode::DIG => {
                    let Some((dx, dy)) = self.read_delta_pair(status) else {
                        return exec;
                    };
                    exec.add_op(Op::Dig { dx, dy });
                }
                opcode::JMP => {
                    let Some(name) = self.read_label(status) else {
                        return exec;
                    };
                    let idx = exec.add_op(Op::Jump { target: 0 });
                    patches.push((idx, name));
                }
                opcode::JNZ => {
                    let Some(name) = self.read_label(status) else {
                        return exec;
                    };
                    let idx = exec.add_op(Op::JumpNotZero { target: 0 });
                    patches.push((idx, name));
                }
                opcode::LABEL => {
                    let Some(name) = self.read_label(status) else {
                        return exec;
                    };
                    trace!("label '{name}' at op {}", exec.len());
                    if !exec.add_label(name.clone()) {
                        status.error(format!("duplicate label '{name}' at byte {at}"));
                        return exec;
                    }
                }
                unknown => {
                    status.error(format!("unrecognized opcode 0x{unknown:02x} at byte {at}"));
                    return exec;
                }
            }
        }

        for (idx, name) in patches {
            match exec.label_idx(&name) {
                Some(target) => {
                    trace!("patching jump at op {idx} -> {target}");
                    exec.patch_jump(idx, target);
                }
                None => {
                    status.error(format!("jump to undeclared label '{name}'"));
                    return exec;
                }
            }
        }

        debug!("assembled {} ops", exec.len());
        exec
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.code.get(self.pos).copied()?;
        self.pos += 1;
        Some(byte)
    }

    fn read_reg(&mut self, status: &mut Status) -> Option<Register> {
        let Some(byte) = self.next_byte() else {
            status.error(format!("truncated operand stream at byte {}", self.pos));
            return None;
        };
        match Register::from_selector(byte) {
            Some(reg) => Some(reg),
            None => {
                status.error(format!(
                    "invalid register selector 0x{byte:02x} at byte {}",
                    self.pos - 1
                ));
                None
            }
        }
    }

    fn read_reg_pair(&mut self, status: &mut Status) -> Option<(Register, Register)> {
        let src = self.read_reg(status)?;
        let dst = self.read_reg(status)?;
        Some((src, dst))
    }

    fn read_word(&mut self, status: &mut Status) -> Option<Word> {
        let lo = self.next_byte();
        let hi = self.next_byte();
        match (lo, hi) {
            (Some(lo), Some(hi)) => Some(Word::from_le_bytes([lo, hi])),
            _ => {
                status.error(format!("truncated operand stream at byte {}", self.pos));
                None
            }
        }
    }

    fn read_delta_pair(&mut self, status: &mut Status) -> Option<(i8, i8)> {
        let dx = self.next_byte();
        let dy = self.next_byte();
        match (dx, dy) {
            (Some(dx), Some(dy)) => Some((dx as i8, dy as i8)),
            _ => {
                status.error(format!("truncated operand stream at byte {}", self.pos));
                None
            }
        }
    }

    fn read_label(&mut self, status: &mut Status) -> Option<String> {
        let Some(len) = self.next_byte() else {
            status.error(format!("truncated label at byte {}", self.pos));
            return None;
        };
        let start = self.pos;
        let end = start + len as usize;
        if end > self.code.len() {
            status.error(format!("truncated label at byte {start}"));
            return None;
        }
        self.pos = end;
        match std::str::from_utf8(&self.code[start..end]) {
            Ok(name) if !name.is_empty() => Some(name.to_string()),
            Ok(_) => {
                status.error(format!("empty label name at byte {start}"));
                None
            }
            Err(_) => {
                status.error(format!("label at byte {start} is not valid UTF-8"));
                None
            }
        }
    }
}
