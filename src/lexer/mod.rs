use std::fmt;
use std::str::FromStr;

use miette::Result;

use crate::error;
use crate::lexer::cursor::Cursor;
use crate::registers::Register;
use crate::span::{Span, SrcOffset};

pub mod cursor;

/// A 'light' token that only carries basic and easily derivable info
#[derive(Debug)]
struct LToken {
    kind: LTokenKind,
    len: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum LTokenKind {
    Ident,
    Lit,
    Comment,
    /// Also includes commas
    Whitespace,
    Unknown,
    Eof,
}

/// Token with its classification resolved and its literal parsed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Instr(InstrKind),
    Reg(Register),
    /// `#`-prefixed decimal literal.
    Lit(i32),
    /// Identifier that is neither a mnemonic nor a register.
    Label,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Instr(kind) => write!(f, "instruction ({kind})"),
            TokenKind::Reg(_) => f.write_str("register"),
            TokenKind::Lit(_) => f.write_str("numeric literal"),
            TokenKind::Label => f.write_str("label"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InstrKind {
    Nop,
    Ldc,
    Cpy,
    Add,
    Sub,
    Inc,
    Dec,
    Mov,
    Dig,
    Jmp,
    Jnz,
}

impl fmt::Display for InstrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstrKind::Nop => "nop",
            InstrKind::Ldc => "ldc",
            InstrKind::Cpy => "cpy",
            InstrKind::Add => "add",
            InstrKind::Sub => "sub",
            InstrKind::Inc => "inc",
            InstrKind::Dec => "dec",
            InstrKind::Mov => "mov",
            InstrKind::Dig => "dig",
            InstrKind::Jmp => "jmp",
            InstrKind::Jnz => "jnz",
        };
        f.write_str(s)
    }
}

impl FromStr for InstrKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nop" => Ok(InstrKind::Nop),
            "ldc" => Ok(InstrKind::Ldc),
            "cpy" => Ok(InstrKind::Cpy),
            "add" => Ok(InstrKind::Add),
            "sub" => Ok(InstrKind::Sub),
            "inc" => Ok(InstrKind::Inc),
            "dec" => Ok(InstrKind::Dec),
            "mov" => Ok(InstrKind::Mov),
            "dig" => Ok(InstrKind::Dig),
            "jmp" => Ok(InstrKind::Jmp),
            "jnz" => Ok(InstrKind::Jnz),
            _ => Err(()),
        }
    }
}

/// Test if a character is considered to be whitespace.
pub(crate) fn is_whitespace(c: char) -> bool {
    // Commas are essentially whitespace in ant assembly
    matches!(c, ' ' | '\n' | '\t' | '\r' | ',')
}

/// Test if a character is considered an identifier character.
pub(crate) fn is_id(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
}

impl Cursor<'_> {
    fn advance_token(&mut self) -> LToken {
        let first_char = match self.bump() {
            Some(c) => c,
            None => {
                return LToken {
                    kind: LTokenKind::Eof,
                    len: 0,
                }
            }
        };
        let kind = match first_char {
            ';' => {
                self.take_while(|c| c != '\n');
                LTokenKind::Comment
            }
            c if is_whitespace(c) => {
                self.take_while(is_whitespace);
                LTokenKind::Whitespace
            }
            // Decimal literal, optionally negative
            '#' => {
                if self.first() == '-' {
                    self.bump();
                }
                self.take_while(|c| c.is_ascii_digit());
                LTokenKind::Lit
            }
            c if is_id(c) => {
                self.take_while(is_id);
                LTokenKind::Ident
            }
            _ => LTokenKind::Unknown,
        };
        let res = LToken {
            kind,
            len: self.pos_in_token(),
        };
        self.reset_pos();
        res
    }
}

/// Tokenizes a whole source file, dropping whitespace and comments so the
/// parser sees a clean stream.
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let mut cursor = Cursor::new(src);
    let mut toks = Vec::new();
    let mut offs = 0usize;

    loop {
        let ltok = cursor.advance_token();
        let span = Span::new(SrcOffset(offs), ltok.len);
        offs += ltok.len;
        match ltok.kind {
            LTokenKind::Eof => break,
            LTokenKind::Whitespace | LTokenKind::Comment => continue,
            LTokenKind::Unknown => return Err(error::lex_unknown(span, src)),
            LTokenKind::Ident => {
                let text = &src[span.offs()..span.end()];
                toks.push(Token {
                    kind: classify_ident(text),
                    span,
                });
            }
            LTokenKind::Lit => {
                let text = &src[span.offs()..span.end()];
                let val = text[1..]
                    .parse::<i32>()
                    .map_err(|e| error::lex_invalid_lit(span, src, e))?;
                toks.push(Token {
                    kind: TokenKind::Lit(val),
                    span,
                });
            }
        }
    }
    Ok(toks)
}

fn classify_ident(text: &str) -> TokenKind {
    let lower = text.to_ascii_lowercase();
    if let Ok(instr) = lower.parse::<InstrKind>() {
        return TokenKind::Instr(instr);
    }
    if let Ok(reg) = lower.parse::<Register>() {
        return TokenKind::Reg(reg);
    }
    TokenKind::Label
}
