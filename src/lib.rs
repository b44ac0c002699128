// Text front-end
mod parser;
pub use parser::AsmParser;
mod ast;
pub use ast::{emit_program, AsmStmt};
mod error;
mod lexer;
mod span;

// Byte programs & execution
mod bytecode;
pub use bytecode::{opcode, AsmContext, Assembler, Status};
mod executor;
pub use executor::{ExecState, OpExecutor};
mod ops;
pub use ops::{ExecContext, Op, PulseOutcome};
mod registers;
pub use registers::{Register, RegisterFile, Word};

// Colony collaborators
mod ant;
pub use ant::{Ant, AntBody};
mod inventory;
pub use inventory::{Inventory, Yield};
mod map;
pub use map::{EntityData, Map, MapEntity, Tile};

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 8;
