//! Operand syntax parsing and statement rendering.
//!
//! Syntax strings look like `LOADFUEL $rd,offset($rs)`: placeholders prefixed
//! with `$` name registers, `label` names a branch or jump target, and any
//! other bare identifier names a signed immediate. Punctuation is copied
//! through verbatim when a statement is rendered.

use std::iter::Peekable;
use std::str::CharIndices;

use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    Register,
    Immediate,
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyntaxPiece<'a> {
    Literal(&'a str),
    Placeholder(OperandKind),
}

/// Operand kinds named by `syntax`, in order. `None` when the syntax has no
/// mnemonic or contains a dangling `$`.
pub fn operand_kinds(syntax: &str) -> Option<SmallVec<[OperandKind; 3]>> {
    let (_, operands) = split_mnemonic(syntax)?;
    let mut kinds = SmallVec::new();
    for piece in SyntaxPieces::new(operands) {
        if let SyntaxPiece::Placeholder(kind) = piece? {
            kinds.push(kind);
        }
    }
    Some(kinds)
}

/// Renders `syntax` with placeholders replaced by `operands`, e.g.
/// `LOADFUEL $4,-8($29)` or `EQBRANCH $1,$2,0x00400010`.
pub fn render_statement(syntax: &str, operands: &[i32]) -> String {
    let Some((mnemonic, rest)) = split_mnemonic(syntax) else {
        return syntax.to_string();
    };
    let mut out = String::from(mnemonic);
    if rest.is_empty() {
        return out;
    }
    out.push(' ');
    let mut values = operands.iter();
    for piece in SyntaxPieces::new(rest) {
        match piece {
            Some(SyntaxPiece::Literal(text)) => out.push_str(text),
            Some(SyntaxPiece::Placeholder(kind)) => match values.next() {
                Some(value) => out.push_str(&format_operand(kind, *value)),
                None => out.push('?'),
            },
            None => break,
        }
    }
    out
}

pub fn format_operand(kind: OperandKind, value: i32) -> String {
    match kind {
        OperandKind::Register => format!("${value}"),
        OperandKind::Immediate => value.to_string(),
        OperandKind::Label => format!("0x{:08X}", value as u32),
    }
}

fn split_mnemonic(syntax: &str) -> Option<(&str, &str)> {
    let trimmed = syntax.trim();
    let (mnemonic, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
    (!mnemonic.is_empty()).then_some((mnemonic, rest.trim()))
}

struct SyntaxPieces<'a> {
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> SyntaxPieces<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices().peekable(),
        }
    }

    fn identifier_end(&mut self, start: usize) -> usize {
        let mut end = start;
        while let Some((idx, ch)) = self.chars.peek().copied() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                break;
            }
            end = idx + ch.len_utf8();
            self.chars.next();
        }
        end
    }
}

impl<'a> Iterator for SyntaxPieces<'a> {
    type Item = Option<SyntaxPiece<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, ch) = self.chars.next()?;
        if ch == '$' {
            let end = self.identifier_end(start + 1);
            if end == start + 1 {
                return Some(None);
            }
            return Some(Some(SyntaxPiece::Placeholder(OperandKind::Register)));
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            let end = self.identifier_end(start + ch.len_utf8());
            let kind = if self.text[start..end].eq_ignore_ascii_case("label") {
                OperandKind::Label
            } else {
                OperandKind::Immediate
            };
            return Some(Some(SyntaxPiece::Placeholder(kind)));
        }
        Some(Some(SyntaxPiece::Literal(
            &self.text[start..start + ch.len_utf8()],
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_kinds_follow_placeholder_order() {
        assert_eq!(
            operand_kinds("LOADFUEL $rd,offset($rs)").expect("kinds").as_slice(),
            &[
                OperandKind::Register,
                OperandKind::Immediate,
                OperandKind::Register
            ]
        );
        assert_eq!(
            operand_kinds("WARP label").expect("kinds").as_slice(),
            &[OperandKind::Label]
        );
        assert!(operand_kinds("LAUNCH $").is_none(), "dangling register sigil");
        assert!(operand_kinds("   ").is_none());
    }

    #[test]
    fn statements_render_with_concrete_operands() {
        assert_eq!(
            render_statement("LIFT $rd,$rs,$rt", &[3, 1, 2]),
            "LIFT $3,$1,$2"
        );
        assert_eq!(
            render_statement("LOADFUEL $rd,offset($rs)", &[4, -8, 29]),
            "LOADFUEL $4,-8($29)"
        );
        assert_eq!(
            render_statement("EQBRANCH $rs,$rt,label", &[1, 2, 0x0040_0010]),
            "EQBRANCH $1,$2,0x00400010"
        );
        assert_eq!(render_statement("IGNITE $rt", &[5]), "IGNITE $5");
    }
}
