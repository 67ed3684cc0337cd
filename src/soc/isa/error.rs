use std::fmt;

use crate::soc::bus::BusError;
use crate::soc::isa::machine::{DecodedStatement, Opcode, TemplateError};

/// Cause code reported for a signed add overflow.
pub const CAUSE_ARITHMETIC_OVERFLOW: u32 = 12;
/// Cause code reported for an addressing fault on load or store.
pub const CAUSE_ADDRESS_ERROR: u32 = 4;

/// Per-instruction fault raised by a semantic action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    ArithmeticOverflow,
    Address(BusError),
}

impl FaultKind {
    pub fn cause_code(&self) -> u32 {
        match self {
            FaultKind::ArithmeticOverflow => CAUSE_ARITHMETIC_OVERFLOW,
            FaultKind::Address(_) => CAUSE_ADDRESS_ERROR,
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::ArithmeticOverflow => write!(f, "arithmetic overflow"),
            FaultKind::Address(err) => write!(f, "address error: {err}"),
        }
    }
}

impl From<BusError> for FaultKind {
    fn from(err: BusError) -> Self {
        FaultKind::Address(err)
    }
}

/// A fault together with the statement that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFault {
    pub kind: FaultKind,
    pub opcode: Opcode,
    pub statement: String,
    pub address: Option<u32>,
}

impl ExecutionFault {
    pub fn new(kind: FaultKind, statement: &DecodedStatement) -> Self {
        Self {
            kind,
            opcode: statement.opcode(),
            statement: statement.to_string(),
            address: statement.address(),
        }
    }

    pub fn cause_code(&self) -> u32 {
        self.kind.cause_code()
    }
}

impl fmt::Display for ExecutionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in `{}`", self.kind, self.statement)?;
        if let Some(address) = self.address {
            write!(f, " at 0x{address:08X}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutionFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            FaultKind::Address(err) => Some(err),
            FaultKind::ArithmeticOverflow => None,
        }
    }
}

/// Catalog construction and decoding failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsaError {
    UnknownInstruction {
        word: u32,
        address: u32,
    },
    UnknownMnemonic(String),
    AmbiguousTemplates {
        first: Opcode,
        second: Opcode,
    },
    InvalidTemplate {
        opcode: Opcode,
        source: TemplateError,
    },
    OperandCount {
        mnemonic: &'static str,
        expected: usize,
        found: usize,
    },
    OperandRange {
        mnemonic: &'static str,
        position: usize,
        value: i64,
    },
    RegisterOutOfRange {
        mnemonic: &'static str,
        index: u8,
        count: usize,
    },
}

pub type IsaResult<T> = Result<T, IsaError>;

impl fmt::Display for IsaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsaError::UnknownInstruction { word, address } => write!(
                f,
                "word 0x{word:08X} at 0x{address:08X} matches no instruction"
            ),
            IsaError::UnknownMnemonic(name) => write!(f, "unknown mnemonic '{name}'"),
            IsaError::AmbiguousTemplates { first, second } => write!(
                f,
                "templates of {} and {} can match the same word",
                first.mnemonic(),
                second.mnemonic()
            ),
            IsaError::InvalidTemplate { opcode, source } => {
                write!(f, "invalid template for {}: {source}", opcode.mnemonic())
            }
            IsaError::OperandCount {
                mnemonic,
                expected,
                found,
            } => write!(f, "{mnemonic} takes {expected} operand(s), got {found}"),
            IsaError::OperandRange {
                mnemonic,
                position,
                value,
            } => write!(
                f,
                "{mnemonic} operand {position} value {value} does not fit its field"
            ),
            IsaError::RegisterOutOfRange {
                mnemonic,
                index,
                count,
            } => write!(
                f,
                "{mnemonic} names register {index} but the file holds {count}"
            ),
        }
    }
}

impl std::error::Error for IsaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IsaError::InvalidTemplate { source, .. } => Some(source),
            _ => None,
        }
    }
}
