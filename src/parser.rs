use std::iter::Peekable;
use std::vec::IntoIter;

use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use miette::Result;

use crate::ast::AsmStmt;
use crate::error;
use crate::lexer::{tokenize, InstrKind, Token, TokenKind};
use crate::registers::Register;
use crate::span::Span;

/// Transforms the token stream of a textual ant program into statements
/// ready for encoding. Label declarations are leading identifiers; label
/// references are jump operands and may point forward.
pub struct AsmParser<'a> {
    /// Reference to the source file
    src: &'a str,
    /// Peekable iterator over tokens (whitespace and comments pre-stripped)
    toks: Peekable<IntoIter<Token>>,
    /// Parsed statements
    stmts: Vec<AsmStmt>,
    /// Declared labels, kept for duplicate detection
    labels: IndexMap<String, Span, FxBuildHasher>,
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str) -> Result<Self> {
        let toks = tokenize(src)?;
        Ok(AsmParser {
            src,
            toks: toks.into_iter().peekable(),
            stmts: Vec::new(),
            labels: IndexMap::with_hasher(FxBuildHasher::default()),
        })
    }

    fn get_span(&self, span: Span) -> &str {
        &self.src[span.offs()..span.end()]
    }

    /// Consumes the parser and produces the statement list.
    pub fn parse(mut self) -> Result<Vec<AsmStmt>> {
        while let Some(tok) = self.toks.next() {
            match tok.kind {
                TokenKind::Label => self.parse_label_decl(tok)?,
                TokenKind::Instr(kind) => self.parse_instr(kind)?,
                // Lines must start with an instruction or a label
                TokenKind::Reg(_) | TokenKind::Lit(_) => {
                    return Err(error::parse_generic_unexpected(
                        self.src,
                        "instruction or label",
                        tok,
                    ))
                }
            }
        }
        Ok(self.stmts)
    }

    fn parse_label_decl(&mut self, tok: Token) -> Result<()> {
        let name = self.get_span(tok.span).to_string();
        if name.len() > u8::MAX as usize {
            return Err(error::parse_label_too_long(tok.span, self.src));
        }
        if self.labels.contains_key(&name) {
            return Err(error::parse_duplicate_label(tok.span, self.src));
        }
        self.labels.insert(name.clone(), tok.span);
        self.stmts.push(AsmStmt::Label(name));
        Ok(())
    }

    fn parse_instr(&mut self, kind: InstrKind) -> Result<()> {
        let stmt = match kind {
            InstrKind::Nop => AsmStmt::Nop,
            InstrKind::Ldc => {
                let reg = self.expect_reg()?;
                let value = self.expect_word()?;
                AsmStmt::LoadConst { reg, value }
            }
            InstrKind::Cpy => {
                let src = self.expect_reg()?;
                let dst = self.expect_reg()?;
                AsmStmt::Copy { src, dst }
            }
            InstrKind::Add => {
                let src = self.expect_reg()?;
                let dst = self.expect_reg()?;
                AsmStmt::Add { src, dst }
            }
            InstrKind::Sub => {
                let src = self.expect_reg()?;
                let dst = self.expect_reg()?;
                AsmStmt::Sub { src, dst }
            }
            InstrKind::Inc => AsmStmt::Inc {
                reg: self.expect_reg()?,
            },
            InstrKind::Dec => AsmStmt::Dec {
                reg: self.expect_reg()?,
            },
            InstrKind::Mov => {
                let dx = self.expect_delta()?;
                let dy = self.expect_delta()?;
                AsmStmt::Move { dx, dy }
            }
            InstrKind::Dig => {
                let dx = self.expect_delta()?;
                let dy = self.expect_delta()?;
                AsmStmt::Dig { dx, dy }
            }
            InstrKind::Jmp => AsmStmt::Jump {
                dest: self.expect_label_ref()?,
            },
            InstrKind::Jnz => AsmStmt::JumpNotZero {
                dest: self.expect_label_ref()?,
            },
        };
        self.stmts.push(stmt);
        Ok(())
    }

    fn expect_where(
        &mut self,
        mut check: impl FnMut(&TokenKind) -> bool,
        expected: &str,
    ) -> Result<Token> {
        match self.toks.next() {
            Some(tok) if check(&tok.kind) => Ok(tok),
            Some(unexpected) => Err(error::parse_generic_unexpected(
                self.src, expected, unexpected,
            )),
            None => Err(error::parse_eof(self.src)),
        }
    }

    fn expect_reg(&mut self) -> Result<Register> {
        match self
            .expect_where(|kind| matches!(kind, TokenKind::Reg(_)), "register")?
            .kind
        {
            TokenKind::Reg(reg) => Ok(reg),
            _ => unreachable!(),
        }
    }

    fn expect_word(&mut self) -> Result<u16> {
        let tok = self.expect_where(|kind| matches!(kind, TokenKind::Lit(_)), "numeric literal")?;
        let TokenKind::Lit(val) = tok.kind else {
            unreachable!()
        };
        // Accept the signed range too so `ldc a #-1` means all-ones
        if !(i16::MIN as i32..=u16::MAX as i32).contains(&val) {
            return Err(error::parse_lit_range(
                tok.span,
                self.src,
                "-32768..=65535",
            ));
        }
        Ok(val as u16)
    }

    fn expect_delta(&mut self) -> Result<i8> {
        let tok = self.expect_where(|kind| matches!(kind, TokenKind::Lit(_)), "numeric literal")?;
        let TokenKind::Lit(val) = tok.kind else {
            unreachable!()
        };
        if !(i8::MIN as i32..=i8::MAX as i32).contains(&val) {
            return Err(error::parse_lit_range(tok.span, self.src, "-128..=127"));
        }
        Ok(val as i8)
    }

    fn expect_label_ref(&mut self) -> Result<String> {
        let tok = self.expect_where(|kind| matches!(kind, TokenKind::Label), "label")?;
        let name = self.get_span(tok.span).to_string();
        if name.len() > u8::MAX as usize {
            return Err(error::parse_label_too_long(tok.span, self.src));
        }
        Ok(name)
    }
}
