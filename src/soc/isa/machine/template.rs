//! 32-character bit templates describing how an instruction word is laid out.
//!
//! A template is written most-significant bit first using `0`/`1` for fixed
//! bits and `f`, `s`, `t` for the first, second and third operand fields.
//! Whitespace is ignored so templates can be grouped by field for reading.

use std::fmt;

use smallvec::SmallVec;

pub const TEMPLATE_BITS: usize = 32;
const OPERAND_LETTERS: [char; 3] = ['f', 's', 't'];

/// Encoding family of an instruction, which fixes how label operands resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionFormat {
    Register,
    Immediate,
    BranchImmediate,
    JumpImmediate,
}

/// Contiguous bit range holding one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandField {
    pub operand: usize,
    pub lsb: u8,
    pub width: u8,
}

impl OperandField {
    pub fn mask(&self) -> u32 {
        field_mask(self.width) << self.lsb
    }

    pub fn extract(&self, word: u32) -> u32 {
        (word >> self.lsb) & field_mask(self.width)
    }

    pub fn insert(&self, word: u32, raw: u32) -> u32 {
        (word & !self.mask()) | ((raw & field_mask(self.width)) << self.lsb)
    }

    /// Whether `raw` survives truncation to this field unchanged.
    pub fn holds(&self, raw: u32) -> bool {
        raw & !field_mask(self.width) == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitTemplate {
    mask: u32,
    pattern: u32,
    fields: SmallVec<[OperandField; 3]>,
}

impl BitTemplate {
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let symbols: Vec<char> = text.chars().filter(|ch| !ch.is_whitespace()).collect();
        if symbols.len() != TEMPLATE_BITS {
            return Err(TemplateError::Length(symbols.len()));
        }

        let mut mask = 0u32;
        let mut pattern = 0u32;
        let mut spans: [Option<(u8, u8)>; 3] = [None; 3];
        for (idx, symbol) in symbols.iter().enumerate() {
            let bit = (TEMPLATE_BITS - 1 - idx) as u8;
            match symbol {
                '0' => mask |= 1 << bit,
                '1' => {
                    mask |= 1 << bit;
                    pattern |= 1 << bit;
                }
                letter => {
                    let operand = OPERAND_LETTERS
                        .iter()
                        .position(|candidate| candidate == letter)
                        .ok_or(TemplateError::Symbol(*letter))?;
                    spans[operand] = match spans[operand] {
                        None => Some((bit, bit)),
                        Some((high, low)) if low == bit + 1 => Some((high, bit)),
                        Some(_) => return Err(TemplateError::SplitField(*letter)),
                    };
                }
            }
        }

        let mut fields = SmallVec::new();
        for (operand, span) in spans.iter().enumerate() {
            match span {
                Some((high, low)) => fields.push(OperandField {
                    operand,
                    lsb: *low,
                    width: high - low + 1,
                }),
                None => {
                    if let Some(later) = spans[operand..].iter().position(Option::is_some) {
                        return Err(TemplateError::MissingField {
                            letter: OPERAND_LETTERS[operand],
                            before: OPERAND_LETTERS[operand + later],
                        });
                    }
                }
            }
        }

        Ok(Self {
            mask,
            pattern,
            fields,
        })
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn pattern(&self) -> u32 {
        self.pattern
    }

    pub fn fields(&self) -> &[OperandField] {
        &self.fields
    }

    pub fn field(&self, operand: usize) -> Option<&OperandField> {
        self.fields.get(operand)
    }

    pub fn matches(&self, word: u32) -> bool {
        word & self.mask == self.pattern
    }

    /// True when some word would satisfy both templates.
    pub fn overlaps(&self, other: &BitTemplate) -> bool {
        (self.pattern ^ other.pattern) & self.mask & other.mask == 0
    }
}

impl fmt::Display for BitTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in (0..TEMPLATE_BITS as u8).rev() {
            let symbol = if self.mask & (1 << bit) != 0 {
                if self.pattern & (1 << bit) != 0 { '1' } else { '0' }
            } else {
                self.fields
                    .iter()
                    .find(|field| field.mask() & (1 << bit) != 0)
                    .map(|field| OPERAND_LETTERS[field.operand])
                    .unwrap_or('-')
            };
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    Length(usize),
    Symbol(char),
    SplitField(char),
    MissingField { letter: char, before: char },
    FieldWidth { operand: usize, width: u8, expected: u8 },
    OperandCount { fields: usize, operands: usize },
    Syntax(String),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Length(found) => {
                write!(f, "expected {TEMPLATE_BITS} bit symbols, found {found}")
            }
            TemplateError::Symbol(symbol) => write!(f, "unexpected symbol '{symbol}'"),
            TemplateError::SplitField(letter) => {
                write!(f, "operand field '{letter}' is not contiguous")
            }
            TemplateError::MissingField { letter, before } => {
                write!(f, "operand field '{letter}' is missing but '{before}' is present")
            }
            TemplateError::FieldWidth {
                operand,
                width,
                expected,
            } => write!(
                f,
                "operand {operand} spans {width} bits, expected {expected}"
            ),
            TemplateError::OperandCount { fields, operands } => write!(
                f,
                "template has {fields} operand field(s) but syntax names {operands}"
            ),
            TemplateError::Syntax(syntax) => write!(f, "malformed syntax '{syntax}'"),
        }
    }
}

impl std::error::Error for TemplateError {}

/// Sign-extends the low `bits` of `raw`.
pub fn sign_extend(raw: u32, bits: u8) -> i32 {
    if bits == 0 || bits >= 32 {
        return raw as i32;
    }
    let shift = 32 - u32::from(bits);
    ((raw << shift) as i32) >> shift
}

/// Sign-extends the low 16 bits of an immediate operand.
pub fn sign_extend16(value: i32) -> i32 {
    i32::from(value as i16)
}

fn field_mask(width: u8) -> u32 {
    match width {
        0 => 0,
        32.. => u32::MAX,
        _ => (1u32 << width) - 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_template_collects_fixed_bits_and_fields() {
        let template =
            BitTemplate::parse("000000 sssss ttttt fffff 00000 100000").expect("parse");
        assert_eq!(template.mask(), 0xFC00_07FF);
        assert_eq!(template.pattern(), 0x0000_0020);
        assert_eq!(
            template.fields(),
            &[
                OperandField {
                    operand: 0,
                    lsb: 11,
                    width: 5
                },
                OperandField {
                    operand: 1,
                    lsb: 21,
                    width: 5
                },
                OperandField {
                    operand: 2,
                    lsb: 16,
                    width: 5
                },
            ]
        );
        assert!(template.matches(0x0022_1820));
        assert!(!template.matches(0x0022_1822));
        assert_eq!(
            template.to_string(),
            "000000ssssstttttfffff00000100000"
        );
    }

    #[test]
    fn malformed_templates_are_rejected() {
        assert_eq!(
            BitTemplate::parse("0101"),
            Err(TemplateError::Length(4))
        );
        assert_eq!(
            BitTemplate::parse("000000 sssss xxxxx fffff 00000 100000"),
            Err(TemplateError::Symbol('x'))
        );
        assert_eq!(
            BitTemplate::parse("000000 fffff sssss fffff 00000 100000"),
            Err(TemplateError::SplitField('f'))
        );
        assert!(matches!(
            BitTemplate::parse("000000 00000 sssss 00000 00000 100000"),
            Err(TemplateError::MissingField { letter: 'f', .. })
        ));
    }

    #[test]
    fn overlap_requires_agreement_on_shared_fixed_bits() {
        let lift = BitTemplate::parse("000000 sssss ttttt fffff 00000 100000").expect("lift");
        let drop = BitTemplate::parse("000000 sssss ttttt fffff 00000 100010").expect("drop");
        let wide = BitTemplate::parse("000000 ffffffffffffffffffffffffff").expect("wide");
        assert!(!lift.overlaps(&drop));
        assert!(lift.overlaps(&wide), "wide opcode-only template shadows lift");
        assert!(wide.overlaps(&drop));
    }

    #[test]
    fn field_insert_and_extract_stay_in_bounds() {
        let field = OperandField {
            operand: 2,
            lsb: 0,
            width: 16,
        };
        let word = field.insert(0x2000_0000, 0xFFFF_FFFF);
        assert_eq!(word, 0x2000_FFFF);
        assert_eq!(field.extract(word), 0xFFFF);
        assert!(field.holds(0xFFFF));
        assert!(!field.holds(0x1_0000));
    }

    #[test]
    fn sign_extension_widths() {
        assert_eq!(sign_extend(0xFFFF, 16), -1);
        assert_eq!(sign_extend(0x7FFF, 16), 32767);
        assert_eq!(sign_extend(0x3FF_FFFF, 26), -1);
        assert_eq!(sign_extend16(65535), -1);
        assert_eq!(sign_extend16(0x8000), -32768);
        assert_eq!(sign_extend16(-8), -8);
    }
}
