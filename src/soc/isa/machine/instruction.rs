use std::fmt;

use smallvec::SmallVec;

use crate::soc::isa::error::{IsaError, IsaResult};
use crate::soc::isa::semantics::SemanticAction;

use super::format::{self, OperandKind};
use super::template::{BitTemplate, InstructionFormat, OperandField, TemplateError, sign_extend};

/// Resolved operand values: register indices, sign-extended immediates, or
/// absolute branch targets stored as their 32-bit pattern.
pub type Operands = SmallVec<[i32; 3]>;

/// Stable identifier of each catalog entry, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    Lift,
    Drop,
    Combust,
    LoadFuel,
    StoreFuel,
    EqBranch,
    LessBranch,
    Warp,
    SetLess,
    NeqBranch,
    Ignite,
    Thrust,
    Launch,
    Parachute,
    Land,
}

impl Opcode {
    pub const ALL: [Opcode; 15] = [
        Opcode::Lift,
        Opcode::Drop,
        Opcode::Combust,
        Opcode::LoadFuel,
        Opcode::StoreFuel,
        Opcode::EqBranch,
        Opcode::LessBranch,
        Opcode::Warp,
        Opcode::SetLess,
        Opcode::NeqBranch,
        Opcode::Ignite,
        Opcode::Thrust,
        Opcode::Launch,
        Opcode::Parachute,
        Opcode::Land,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Lift => "LIFT",
            Opcode::Drop => "DROP",
            Opcode::Combust => "COMBUST",
            Opcode::LoadFuel => "LOADFUEL",
            Opcode::StoreFuel => "STOREFUEL",
            Opcode::EqBranch => "EQBRANCH",
            Opcode::LessBranch => "LESSBRANCH",
            Opcode::Warp => "WARP",
            Opcode::SetLess => "SETLESS",
            Opcode::NeqBranch => "NEQBRANCH",
            Opcode::Ignite => "IGNITE",
            Opcode::Thrust => "THRUST",
            Opcode::Launch => "LAUNCH",
            Opcode::Parachute => "PARACHUTE",
            Opcode::Land => "LAND",
        }
    }

    /// Position of this opcode in the catalog.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One catalog entry: identity, syntax, layout and behavior.
#[derive(Clone)]
pub struct InstructionDefinition {
    opcode: Opcode,
    syntax: &'static str,
    description: &'static str,
    format: InstructionFormat,
    template: BitTemplate,
    operands: SmallVec<[OperandKind; 3]>,
    action: SemanticAction,
}

impl InstructionDefinition {
    pub fn new(
        opcode: Opcode,
        syntax: &'static str,
        description: &'static str,
        format: InstructionFormat,
        template: &str,
        action: SemanticAction,
    ) -> IsaResult<Self> {
        let invalid = |source: TemplateError| IsaError::InvalidTemplate { opcode, source };
        let template = BitTemplate::parse(template).map_err(invalid)?;
        let operands = format::operand_kinds(syntax)
            .ok_or_else(|| invalid(TemplateError::Syntax(syntax.to_string())))?;
        if template.fields().len() != operands.len() {
            return Err(invalid(TemplateError::OperandCount {
                fields: template.fields().len(),
                operands: operands.len(),
            }));
        }
        for (field, kind) in template.fields().iter().zip(operands.iter()) {
            let expected = match (kind, format) {
                (OperandKind::Register, _) => 5,
                (OperandKind::Immediate, _) => 16,
                (OperandKind::Label, InstructionFormat::JumpImmediate) => 26,
                (OperandKind::Label, _) => 16,
            };
            if field.width != expected {
                return Err(invalid(TemplateError::FieldWidth {
                    operand: field.operand,
                    width: field.width,
                    expected,
                }));
            }
        }
        Ok(Self {
            opcode,
            syntax,
            description,
            format,
            template,
            operands,
            action,
        })
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn mnemonic(&self) -> &'static str {
        self.opcode.mnemonic()
    }

    pub fn syntax(&self) -> &'static str {
        self.syntax
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn format(&self) -> InstructionFormat {
        self.format
    }

    pub fn template(&self) -> &BitTemplate {
        &self.template
    }

    pub fn operand_kinds(&self) -> &[OperandKind] {
        &self.operands
    }

    pub fn action(&self) -> SemanticAction {
        self.action
    }

    /// Extracts operand values from `word` fetched at `address`.
    pub fn decode_operands(&self, word: u32, address: u32) -> Operands {
        self.template
            .fields()
            .iter()
            .zip(self.operands.iter())
            .map(|(field, kind)| self.decode_field(field, *kind, word, address))
            .collect()
    }

    fn decode_field(
        &self,
        field: &OperandField,
        kind: OperandKind,
        word: u32,
        address: u32,
    ) -> i32 {
        let raw = field.extract(word);
        match kind {
            OperandKind::Register => raw as i32,
            OperandKind::Immediate => sign_extend(raw, field.width),
            OperandKind::Label => self.resolve_target(raw, field.width, address) as i32,
        }
    }

    fn resolve_target(&self, raw: u32, width: u8, address: u32) -> u32 {
        let next = address.wrapping_add(4);
        match self.format {
            InstructionFormat::JumpImmediate => (next & 0xF000_0000) | (raw << 2),
            _ => next.wrapping_add((sign_extend(raw, width) << 2) as u32),
        }
    }

    /// Builds the instruction word for `operands` placed at `address`.
    pub fn encode(&self, operands: &[i32], address: u32) -> IsaResult<u32> {
        self.check_operands(operands)?;
        let mut word = self.template.pattern();
        for (position, ((field, kind), value)) in self
            .template
            .fields()
            .iter()
            .zip(self.operands.iter())
            .zip(operands.iter())
            .enumerate()
        {
            let raw = self
                .encode_field(field, *kind, *value, address)
                .ok_or(IsaError::OperandRange {
                    mnemonic: self.mnemonic(),
                    position,
                    value: i64::from(*value),
                })?;
            word = field.insert(word, raw);
        }
        Ok(word)
    }

    fn encode_field(
        &self,
        field: &OperandField,
        kind: OperandKind,
        value: i32,
        address: u32,
    ) -> Option<u32> {
        match kind {
            OperandKind::Register => {
                let raw = u32::try_from(value).ok()?;
                field.holds(raw).then_some(raw)
            }
            OperandKind::Immediate => Some(value as u32 & 0xFFFF),
            OperandKind::Label => {
                let target = value as u32;
                if target % 4 != 0 {
                    return None;
                }
                let next = address.wrapping_add(4);
                match self.format {
                    InstructionFormat::JumpImmediate => {
                        (target & 0xF000_0000 == next & 0xF000_0000).then_some(target >> 2)
                    }
                    _ => {
                        let words = (target.wrapping_sub(next) as i32) >> 2;
                        i16::try_from(words).ok().map(|offset| offset as u16 as u32)
                    }
                }
            }
        }
    }

    /// Validates operand count and the ranges each operand kind accepts.
    pub fn check_operands(&self, operands: &[i32]) -> IsaResult<()> {
        if operands.len() != self.operands.len() {
            return Err(IsaError::OperandCount {
                mnemonic: self.mnemonic(),
                expected: self.operands.len(),
                found: operands.len(),
            });
        }
        for (position, (kind, value)) in self.operands.iter().zip(operands.iter()).enumerate() {
            let in_range = match kind {
                OperandKind::Register => (0..32).contains(value),
                OperandKind::Immediate => (-32768..=65535).contains(value),
                OperandKind::Label => true,
            };
            if !in_range {
                return Err(IsaError::OperandRange {
                    mnemonic: self.mnemonic(),
                    position,
                    value: i64::from(*value),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for InstructionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstructionDefinition")
            .field("opcode", &self.opcode)
            .field("syntax", &self.syntax)
            .field("format", &self.format)
            .field("template", &self.template.to_string())
            .finish()
    }
}

/// A definition paired with concrete operands, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedStatement {
    opcode: Opcode,
    syntax: &'static str,
    operands: Operands,
    address: Option<u32>,
    word: Option<u32>,
}

impl DecodedStatement {
    /// Pairs `definition` with caller-supplied operands after range checks.
    pub fn new(definition: &InstructionDefinition, operands: &[i32]) -> IsaResult<Self> {
        definition.check_operands(operands)?;
        Ok(Self {
            opcode: definition.opcode(),
            syntax: definition.syntax(),
            operands: operands.iter().copied().collect(),
            address: None,
            word: None,
        })
    }

    pub(crate) fn decoded(
        definition: &InstructionDefinition,
        operands: Operands,
        address: u32,
        word: u32,
    ) -> Self {
        Self {
            opcode: definition.opcode(),
            syntax: definition.syntax(),
            operands,
            address: Some(address),
            word: Some(word),
        }
    }

    /// Records the address the statement was fetched from.
    pub fn at(mut self, address: u32) -> Self {
        self.address = Some(address);
        self
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn mnemonic(&self) -> &'static str {
        self.opcode.mnemonic()
    }

    pub fn operands(&self) -> &[i32] {
        &self.operands
    }

    pub fn address(&self) -> Option<u32> {
        self.address
    }

    pub fn word(&self) -> Option<u32> {
        self.word
    }

    /// Indices of every register operand, in operand order.
    pub fn register_operands(&self) -> impl Iterator<Item = u8> + '_ {
        format::operand_kinds(self.syntax)
            .unwrap_or_default()
            .into_iter()
            .zip(self.operands.iter())
            .filter(|(kind, _)| *kind == OperandKind::Register)
            .map(|(_, value)| *value as u8)
    }
}

impl fmt::Display for DecodedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format::render_statement(self.syntax, &self.operands))
    }
}
