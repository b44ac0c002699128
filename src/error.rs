use std::num::ParseIntError;

use miette::{miette, LabeledSpan, Report, Severity};

use crate::lexer::Token;
use crate::span::Span;

// Lexer errors

pub fn lex_invalid_lit(span: Span, src: &str, e: ParseIntError) -> Report {
    miette!(
        severity = Severity::Error,
        code = "lex::bad_lit",
        help = "literals look like #12 or #-3",
        labels = vec![LabeledSpan::at(span, "incorrect literal")],
        "Encountered an invalid literal: {e}",
    )
    .with_source_code(src.to_string())
}

pub fn lex_unknown(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "lex::unknown",
        help = "make sure that your numeric literals start with #",
        labels = vec![LabeledSpan::at(span, "unknown token")],
        "Encountered an unknown token",
    )
    .with_source_code(src.to_string())
}

// Parser errors

pub fn parse_duplicate_label(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::duplicate_label",
        help = "labels may be declared only once per program",
        labels = vec![LabeledSpan::at(span, "duplicate label")],
        "Duplicate label declaration"
    )
    .with_source_code(src.to_string())
}

pub fn parse_label_too_long(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::label_len",
        help = "the byte format stores label names with a single length byte",
        labels = vec![LabeledSpan::at(span, "oversized label")],
        "Label names are limited to 255 bytes"
    )
    .with_source_code(src.to_string())
}

pub fn parse_generic_unexpected(src: &str, expected: &str, found: Token) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::unexpected_token",
        help = "check the operands for this instruction",
        labels = vec![LabeledSpan::at(found.span, "unexpected token")],
        "Expected token of type {expected}, found {}",
        found.kind
    )
    .with_source_code(src.to_string())
}

pub fn parse_lit_range(span: Span, src: &str, range: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::lit_range",
        help = format!("this operand accepts values in {range}"),
        labels = vec![LabeledSpan::at(span, "out-of-range literal")],
        "Found numeric literal of incorrect size"
    )
    .with_source_code(src.to_string())
}

pub fn parse_eof(src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::unexpected_eof",
        help = "you may be missing operands in your last statement",
        labels = vec![LabeledSpan::at_offset(
            src.len().saturating_sub(1),
            "unexpected end"
        )],
        "Unexpected end of file",
    )
    .with_source_code(src.to_string())
}
