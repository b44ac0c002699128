use crate::bytecode::opcode;
use crate::registers::{Register, Word};

/// Statement forms produced by the text front-end. `Label` binds a name to
/// the next instruction; every other form encodes to exactly one instruction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AsmStmt {
    Label(String),
    Nop,
    LoadConst { reg: Register, value: Word },
    Copy { src: Register, dst: Register },
    Add { src: Register, dst: Register },
    Sub { src: Register, dst: Register },
    Inc { reg: Register },
    Dec { reg: Register },
    Move { dx: i8, dy: i8 },
    Dig { dx: i8, dy: i8 },
    Jump { dest: String },
    JumpNotZero { dest: String },
}

impl AsmStmt {
    /// Encoder half of the byte-format contract; the decoder lives in
    /// [`crate::bytecode`].
    pub fn emit_into(&self, out: &mut Vec<u8>) {
        match self {
            AsmStmt::Label(name) => {
                out.push(opcode::LABEL);
                emit_label(out, name);
            }
            AsmStmt::Nop => out.push(opcode::NOP),
            AsmStmt::LoadConst { reg, value } => {
                out.push(opcode::LDC);
                out.push(*reg as u8);
                out.extend_from_slice(&value.to_le_bytes());
            }
            AsmStmt::Copy { src, dst } => emit_reg_pair(out, opcode::CPY, *src, *dst),
            AsmStmt::Add { src, dst } => emit_reg_pair(out, opcode::ADD, *src, *dst),
            AsmStmt::Sub { src, dst } => emit_reg_pair(out, opcode::SUB, *src, *dst),
            AsmStmt::Inc { reg } => {
                out.push(opcode::INC);
                out.push(*reg as u8);
            }
            AsmStmt::Dec { reg } => {
                out.push(opcode::DEC);
                out.push(*reg as u8);
            }
            AsmStmt::Move { dx, dy } => {
                out.push(opcode::MOV);
                out.push(*dx as u8);
                out.push(*dy as u8);
            }
            AsmStmt::Dig { dx, dy } => {
                out.push(opcode::DIG);
                out.push(*dx as u8);
                out.push(*dy as u8);
            }
            AsmStmt::Jump { dest } => {
                out.push(opcode::JMP);
                emit_label(out, dest);
            }
            AsmStmt::JumpNotZero { dest } => {
                out.push(opcode::JNZ);
                emit_label(out, dest);
            }
        }
    }
}

fn emit_reg_pair(out: &mut Vec<u8>, op: u8, src: Register, dst: Register) {
    out.push(op);
    out.push(src as u8);
    out.push(dst as u8);
}

fn emit_label(out: &mut Vec<u8>, name: &str) {
    // Length limit enforced during parsing
    debug_assert!(name.len() <= u8::MAX as usize);
    out.push(name.len() as u8);
    out.extend_from_slice(name.as_bytes());
}

/// Encodes a parsed program into the byte format.
pub fn emit_program(stmts: &[AsmStmt]) -> Vec<u8> {
    let mut out = Vec::new();
    for stmt in stmts {
        stmt.emit_into(&mut out);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bytecode::{AsmContext, Assembler, Status};
    use crate::ops::Op;

    #[test]
    fn emit_layout_is_stable() {
        let bytes = emit_program(&[
            AsmStmt::Label("top".into()),
            AsmStmt::LoadConst {
                reg: Register::B,
                value: 0x0102,
            },
            AsmStmt::Move { dx: -1, dy: 0 },
            AsmStmt::Jump { dest: "top".into() },
        ]);
        assert_eq!(
            bytes,
            vec![
                opcode::LABEL, 3, b't', b'o', b'p',
                opcode::LDC, 1, 0x02, 0x01,
                opcode::MOV, 0xFF, 0x00,
                opcode::JMP, 3, b't', b'o', b'p',
            ]
        );
    }

    #[test]
    fn emitted_bytes_assemble_back_to_same_ops() {
        let stmts = [
            AsmStmt::LoadConst {
                reg: Register::A,
                value: 3,
            },
            AsmStmt::Label("loop".into()),
            AsmStmt::Dig { dx: 0, dy: 1 },
            AsmStmt::Dec { reg: Register::A },
            AsmStmt::JumpNotZero {
                dest: "loop".into(),
            },
        ];
        let bytes = emit_program(&stmts);

        let mut status = Status::new();
        let exec = Assembler::new(&bytes, AsmContext::default()).assemble(&mut status);
        assert!(!status.has_error, "{}", status.message);
        assert_eq!(
            exec.ops(),
            &[
                Op::LoadConst {
                    reg: Register::A,
                    value: 3
                },
                Op::Dig { dx: 0, dy: 1 },
                Op::Dec { reg: Register::A },
                Op::JumpNotZero { target: 1 },
            ]
        );
        assert_eq!(exec.label_idx("loop"), Some(1));
    }
}
