//! Instruction catalog for the Rocket instruction set. The catalog owns one
//! [`InstructionDefinition`] per [`Opcode`], checks at construction that no two
//! bit templates can claim the same word, and decodes fetched words into
//! [`DecodedStatement`]s the execution engine can run.

mod format;
pub mod host;
mod instruction;
mod template;

pub use format::{OperandKind, format_operand, operand_kinds, render_statement};
pub use host::HostArithResult;
pub use instruction::{DecodedStatement, InstructionDefinition, Opcode, Operands};
pub use template::{
    BitTemplate, InstructionFormat, OperandField, TEMPLATE_BITS, TemplateError, sign_extend,
    sign_extend16,
};

use ahash::AHashMap;

use crate::soc::isa::error::{IsaError, IsaResult};
use crate::soc::isa::semantics::{SemanticAction, base, flight};

pub const CATALOG_NAME: &str = "Rocket";
pub const CATALOG_DESCRIPTION: &str = "Launch and fly a Rocket!";

struct CatalogEntry {
    opcode: Opcode,
    syntax: &'static str,
    description: &'static str,
    format: InstructionFormat,
    template: &'static str,
    action: SemanticAction,
}

const ROCKET_ENTRIES: [CatalogEntry; 15] = [
    CatalogEntry {
        opcode: Opcode::Lift,
        syntax: "LIFT $rd,$rs,$rt",
        description: "rd = rs + rt, faulting on signed overflow",
        format: InstructionFormat::Register,
        template: "000000 sssss ttttt fffff 00000 100000",
        action: base::lift,
    },
    CatalogEntry {
        opcode: Opcode::Drop,
        syntax: "DROP $rd,$rs,$rt",
        description: "rd = rs - rt",
        format: InstructionFormat::Register,
        template: "000000 sssss ttttt fffff 00000 100010",
        action: base::drop,
    },
    CatalogEntry {
        opcode: Opcode::Combust,
        syntax: "COMBUST $rt,$rs,imm",
        description: "rt = rs + sign-extended immediate",
        format: InstructionFormat::Immediate,
        template: "001000 sssss fffff tttttttttttttttt",
        action: base::combust,
    },
    CatalogEntry {
        opcode: Opcode::LoadFuel,
        syntax: "LOADFUEL $rd,offset($rs)",
        description: "Load fuel level from memory into register",
        format: InstructionFormat::Immediate,
        template: "100011 ttttt fffff ssssssssssssssss",
        action: base::load_fuel,
    },
    CatalogEntry {
        opcode: Opcode::StoreFuel,
        syntax: "STOREFUEL $rd,offset($rs)",
        description: "Store fuel level from register into memory",
        format: InstructionFormat::Immediate,
        template: "101011 ttttt fffff ssssssssssssssss",
        action: base::store_fuel,
    },
    CatalogEntry {
        opcode: Opcode::EqBranch,
        syntax: "EQBRANCH $rs,$rt,label",
        description: "Branch if equal",
        format: InstructionFormat::BranchImmediate,
        template: "000100 fffff sssss tttttttttttttttt",
        action: base::eq_branch,
    },
    CatalogEntry {
        opcode: Opcode::LessBranch,
        syntax: "LESSBRANCH $rs,$rt,label",
        description: "Branch if less than",
        format: InstructionFormat::BranchImmediate,
        template: "000111 fffff sssss tttttttttttttttt",
        action: base::less_branch,
    },
    CatalogEntry {
        opcode: Opcode::Warp,
        syntax: "WARP label",
        description: "Jump to label",
        format: InstructionFormat::JumpImmediate,
        template: "000011 ffffffffffffffffffffffffff",
        action: base::warp,
    },
    CatalogEntry {
        opcode: Opcode::SetLess,
        syntax: "SETLESS $rd,$rs,$rt",
        description: "Set rd to 1 if rs < rt, else set rd to 0",
        format: InstructionFormat::Register,
        template: "000000 sssss ttttt fffff 00000 101010",
        action: base::set_less,
    },
    CatalogEntry {
        opcode: Opcode::NeqBranch,
        syntax: "NEQBRANCH $rs,$rt,label",
        description: "Branch if not equal",
        format: InstructionFormat::BranchImmediate,
        template: "000101 fffff sssss tttttttttttttttt",
        action: base::neq_branch,
    },
    CatalogEntry {
        opcode: Opcode::Ignite,
        syntax: "IGNITE $rt",
        description: "Ignite the rocket engines: set STATUS register to 1",
        format: InstructionFormat::Register,
        template: "011111 00000 00000 fffff 00000 000001",
        action: flight::ignite,
    },
    CatalogEntry {
        opcode: Opcode::Thrust,
        syntax: "THRUST $status,$alt,$fuel",
        description: "Thrust the rocket upwards: increase ALTITUDE if STATUS is 1",
        format: InstructionFormat::Register,
        template: "011111 fffff sssss ttttt 00000 000010",
        action: flight::thrust,
    },
    CatalogEntry {
        opcode: Opcode::Launch,
        syntax: "LAUNCH $rt",
        description: "Launch the rocket: set STATUS register to 2 if STATUS is 1",
        format: InstructionFormat::Register,
        template: "011111 00000 00000 fffff 00000 000011",
        action: flight::launch,
    },
    CatalogEntry {
        opcode: Opcode::Parachute,
        syntax: "PARACHUTE $status,$vel",
        description: "Deploy the parachute: set STATUS register to 3 and reduce velocity",
        format: InstructionFormat::Register,
        template: "011111 fffff sssss 00000 00000 000100",
        action: flight::parachute,
    },
    CatalogEntry {
        opcode: Opcode::Land,
        syntax: "LAND $status,$alt,$vel",
        description: "Land the rocket: Status = 4, velocity = 0, altitude = 0",
        format: InstructionFormat::Register,
        template: "011111 fffff sssss ttttt 00000 000101",
        action: flight::land,
    },
];

/// Ordered, immutable set of instruction definitions.
#[derive(Debug, Clone)]
pub struct InstructionCatalog {
    definitions: Vec<InstructionDefinition>,
    by_mnemonic: AHashMap<&'static str, Opcode>,
}

impl InstructionCatalog {
    /// Builds the Rocket catalog.
    pub fn rocket() -> IsaResult<Self> {
        let definitions = ROCKET_ENTRIES
            .iter()
            .map(|entry| {
                InstructionDefinition::new(
                    entry.opcode,
                    entry.syntax,
                    entry.description,
                    entry.format,
                    entry.template,
                    entry.action,
                )
            })
            .collect::<IsaResult<Vec<_>>>()?;
        Self::from_definitions(definitions)
    }

    fn from_definitions(definitions: Vec<InstructionDefinition>) -> IsaResult<Self> {
        check_templates(&definitions)?;
        let by_mnemonic = definitions
            .iter()
            .map(|definition| (definition.mnemonic(), definition.opcode()))
            .collect();
        Ok(Self {
            definitions,
            by_mnemonic,
        })
    }

    pub fn name(&self) -> &'static str {
        CATALOG_NAME
    }

    pub fn description(&self) -> &'static str {
        CATALOG_DESCRIPTION
    }

    pub fn definitions(&self) -> &[InstructionDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definition(&self, opcode: Opcode) -> &InstructionDefinition {
        &self.definitions[opcode.index()]
    }

    /// Case-insensitive lookup by mnemonic.
    pub fn lookup(&self, mnemonic: &str) -> IsaResult<&InstructionDefinition> {
        let upper = mnemonic.trim().to_ascii_uppercase();
        self.by_mnemonic
            .get(upper.as_str())
            .map(|opcode| self.definition(*opcode))
            .ok_or_else(|| IsaError::UnknownMnemonic(mnemonic.to_string()))
    }

    /// Finds the definition whose template matches `word`.
    pub fn identify(&self, word: u32) -> Option<&InstructionDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.template().matches(word))
    }

    /// Decodes `word` fetched from `address` into an executable statement.
    pub fn decode(&self, word: u32, address: u32) -> IsaResult<DecodedStatement> {
        let definition = self
            .identify(word)
            .ok_or(IsaError::UnknownInstruction { word, address })?;
        let operands = definition.decode_operands(word, address);
        Ok(DecodedStatement::decoded(definition, operands, address, word))
    }

    /// Builds a statement from an opcode and operand values.
    pub fn statement(&self, opcode: Opcode, operands: &[i32]) -> IsaResult<DecodedStatement> {
        DecodedStatement::new(self.definition(opcode), operands)
    }

    /// Encodes `opcode` with `operands` as if placed at `address`.
    pub fn encode(&self, opcode: Opcode, operands: &[i32], address: u32) -> IsaResult<u32> {
        self.definition(opcode).encode(operands, address)
    }
}

fn check_templates(definitions: &[InstructionDefinition]) -> IsaResult<()> {
    for (idx, first) in definitions.iter().enumerate() {
        for second in &definitions[idx + 1..] {
            if first.template().overlaps(second.template()) {
                return Err(IsaError::AmbiguousTemplates {
                    first: first.opcode(),
                    second: second.opcode(),
                });
            }
        }
    }
    Ok(())
}
