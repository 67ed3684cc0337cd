use std::sync::Arc;

use crate::soc::bus::{AddressSpace, BusError};
use crate::soc::core::specification::CoreSpec;
use crate::soc::isa::semantics::flight::FlightStatus;

/// Fixed-length file of signed 32-bit registers addressed by index.
///
/// Register 0 is an ordinary slot: writes to it stick. Indices at or past
/// [`RegisterFile::len`] are a caller contract violation and panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    values: Vec<i32>,
}

impl RegisterFile {
    pub fn new(count: usize) -> Self {
        Self {
            values: vec![0; count],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn read(&self, index: u8) -> i32 {
        self.values[index as usize]
    }

    #[inline]
    pub fn write(&mut self, index: u8, value: i32) {
        self.values[index as usize] = value;
    }

    pub fn get(&self, index: u8) -> Option<i32> {
        self.values.get(index as usize).copied()
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Interprets register `index` as a flight status code.
    pub fn flight_status(&self, index: u8) -> Option<FlightStatus> {
        self.get(index)
            .and_then(|value| FlightStatus::try_from(value).ok())
    }

    pub fn reset(&mut self) {
        self.values.fill(0);
    }
}

/// Registers plus memory map owned by exactly one engine instance.
pub struct CoreState {
    spec: Arc<CoreSpec>,
    registers: RegisterFile,
    memory: AddressSpace,
}

impl CoreState {
    pub fn new(spec: Arc<CoreSpec>) -> StateResult<Self> {
        let registers = RegisterFile::new(spec.register_count());
        let memory = spec.build_address_space()?;
        Ok(Self {
            spec,
            registers,
            memory,
        })
    }

    pub fn specification(&self) -> &CoreSpec {
        &self.spec
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    pub fn memory(&self) -> &AddressSpace {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut AddressSpace {
        &mut self.memory
    }

    /// Splits the state so an instruction can mutate registers and memory together.
    pub fn split_mut(&mut self) -> (&mut RegisterFile, &mut AddressSpace) {
        (&mut self.registers, &mut self.memory)
    }

    pub fn read_register(&self, name: &str) -> StateResult<i32> {
        let index = self.resolve(name)?;
        Ok(self.registers.read(index))
    }

    pub fn write_register(&mut self, name: &str, value: i32) -> StateResult<()> {
        let index = self.resolve(name)?;
        self.registers.write(index, value);
        Ok(())
    }

    /// Clears registers and remaps fresh memory.
    pub fn zeroize(&mut self) -> StateResult<()> {
        self.registers.reset();
        self.memory = self.spec.build_address_space()?;
        Ok(())
    }

    fn resolve(&self, name: &str) -> StateResult<u8> {
        self.spec
            .resolve_register(name)
            .ok_or_else(|| StateError::UnknownRegister(name.to_string()))
    }
}

#[derive(Debug)]
pub enum StateError {
    Bus(BusError),
    UnknownRegister(String),
}

pub type StateResult<T> = Result<T, StateError>;

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateError::Bus(err) => write!(f, "bus error: {err}"),
            StateError::UnknownRegister(name) => write!(f, "unknown register '{name}'"),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StateError::Bus(err) => Some(err),
            StateError::UnknownRegister(_) => None,
        }
    }
}

impl From<BusError> for StateError {
    fn from(err: BusError) -> Self {
        StateError::Bus(err)
    }
}
