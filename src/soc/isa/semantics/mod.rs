//! Instruction behavior. Each catalog entry points at a plain function taking
//! an [`ExecutionContext`], which bundles the statement being executed with
//! the register file, memory, notification sink and tracer of one engine.

pub mod base;
pub mod flight;
pub mod notify;
pub mod trace;

use crate::soc::bus::AddressSpace;
use crate::soc::core::state::RegisterFile;
use crate::soc::isa::error::FaultKind;
use crate::soc::isa::machine::{DecodedStatement, HostArithResult, host, sign_extend16};

use notify::NotificationSink;
use trace::{HostOpKind, TraceEvent, TraceFilter, TraceHub};

/// Control-flow outcome of a statement that did not fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Redirect(u32),
}

pub type SemanticResult = Result<Flow, FaultKind>;

/// Behavior attached to an instruction definition.
pub type SemanticAction = fn(&mut ExecutionContext<'_>) -> SemanticResult;

pub struct ExecutionContext<'a> {
    statement: &'a DecodedStatement,
    registers: &'a mut RegisterFile,
    memory: &'a mut AddressSpace,
    sink: &'a mut dyn NotificationSink,
    trace: &'a mut TraceHub,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        statement: &'a DecodedStatement,
        registers: &'a mut RegisterFile,
        memory: &'a mut AddressSpace,
        sink: &'a mut dyn NotificationSink,
        trace: &'a mut TraceHub,
    ) -> Self {
        Self {
            statement,
            registers,
            memory,
            sink,
            trace,
        }
    }

    pub fn statement(&self) -> &DecodedStatement {
        self.statement
    }

    /// Register index named by operand `position`.
    pub fn register_operand(&self, position: usize) -> u8 {
        self.statement.operands()[position] as u8
    }

    /// Sign-extended 16-bit immediate at operand `position`.
    pub fn immediate_operand(&self, position: usize) -> i32 {
        sign_extend16(self.statement.operands()[position])
    }

    /// Absolute branch or jump target at operand `position`.
    pub fn target_operand(&self, position: usize) -> u32 {
        self.statement.operands()[position] as u32
    }

    pub fn read(&mut self, index: u8) -> i32 {
        let value = self.registers.read(index);
        self.trace
            .emit_with(TraceFilter::REGISTERS, || TraceEvent::RegisterRead { index, value });
        value
    }

    /// Reads the register named by operand `position`.
    pub fn read_operand(&mut self, position: usize) -> i32 {
        let index = self.register_operand(position);
        self.read(index)
    }

    pub fn write(&mut self, index: u8, value: i32) {
        self.registers.write(index, value);
        self.trace
            .emit_with(TraceFilter::REGISTERS, || TraceEvent::RegisterWrite { index, value });
    }

    /// Writes the register named by operand `position`.
    pub fn write_operand(&mut self, position: usize, value: i32) {
        let index = self.register_operand(position);
        self.write(index, value);
    }

    pub fn load_word(&mut self, address: u32) -> Result<i32, FaultKind> {
        let value = self.memory.load_word(address)?;
        self.trace
            .emit_with(TraceFilter::MEMORY, || TraceEvent::MemoryRead { address, value });
        Ok(value)
    }

    pub fn store_word(&mut self, address: u32, value: i32) -> Result<(), FaultKind> {
        self.memory.store_word(address, value)?;
        self.trace
            .emit_with(TraceFilter::MEMORY, || TraceEvent::MemoryWrite { address, value });
        Ok(())
    }

    pub fn add(&mut self, lhs: i32, rhs: i32) -> HostArithResult {
        let result = host::add(lhs, rhs);
        self.trace_host(HostOpKind::Add, lhs, rhs, result);
        result
    }

    pub fn sub(&mut self, lhs: i32, rhs: i32) -> HostArithResult {
        let result = host::sub(lhs, rhs);
        self.trace_host(HostOpKind::Sub, lhs, rhs, result);
        result
    }

    pub fn notify(&mut self, line: &str) {
        self.sink.notify(line);
        self.trace.emit_with(TraceFilter::NOTIFY, || TraceEvent::Notify {
            line: line.to_string(),
        });
    }

    pub(crate) fn trace_host(
        &mut self,
        op: HostOpKind,
        lhs: i32,
        rhs: i32,
        result: HostArithResult,
    ) {
        self.trace.emit_with(TraceFilter::ALU, || TraceEvent::HostOp {
            op,
            lhs,
            rhs,
            result: result.value,
            overflow: result.overflow,
        });
    }
}
