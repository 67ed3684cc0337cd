//! Executes one decoded statement at a time against an owned core state.
//!
//! The engine holds no program counter. Callers learn where to go next from
//! the returned [`ExecutionResult`] and keep their own fetch address.

use std::fmt;
use std::sync::Arc;

use crate::soc::core::state::CoreState;
use crate::soc::isa::error::{ExecutionFault, IsaError, IsaResult};
use crate::soc::isa::machine::{DecodedStatement, InstructionCatalog};
use crate::soc::isa::semantics::notify::{NotificationSink, NullSink};
use crate::soc::isa::semantics::trace::{ExecutionTracer, TraceEvent, TraceFilter, TraceHub};
use crate::soc::isa::semantics::{ExecutionContext, Flow};

/// Outcome of executing one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Continue,
    Redirect(u32),
    Fault(ExecutionFault),
}

impl ExecutionResult {
    pub fn fault(&self) -> Option<&ExecutionFault> {
        match self {
            ExecutionResult::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<Flow, ExecutionFault> {
        match self {
            ExecutionResult::Continue => Ok(Flow::Continue),
            ExecutionResult::Redirect(target) => Ok(Flow::Redirect(target)),
            ExecutionResult::Fault(fault) => Err(fault),
        }
    }
}

pub struct ExecutionEngine {
    catalog: Arc<InstructionCatalog>,
    state: CoreState,
    sink: Box<dyn NotificationSink>,
    trace: TraceHub,
}

impl ExecutionEngine {
    pub fn new(
        catalog: Arc<InstructionCatalog>,
        state: CoreState,
        sink: Box<dyn NotificationSink>,
    ) -> Self {
        Self {
            catalog,
            state,
            sink,
            trace: TraceHub::default(),
        }
    }

    /// Engine whose notifications are discarded.
    pub fn silent(catalog: Arc<InstructionCatalog>, state: CoreState) -> Self {
        Self::new(catalog, state, Box::new(NullSink))
    }

    pub fn catalog(&self) -> &Arc<InstructionCatalog> {
        &self.catalog
    }

    pub fn state(&self) -> &CoreState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CoreState {
        &mut self.state
    }

    pub fn set_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.sink = sink;
    }

    pub fn enable_tracer(&mut self, tracer: Box<dyn ExecutionTracer>) {
        self.enable_tracer_filtered(tracer, TraceFilter::all());
    }

    pub fn enable_tracer_filtered(&mut self, tracer: Box<dyn ExecutionTracer>, filter: TraceFilter) {
        self.trace.set(Some(tracer), filter);
    }

    pub fn disable_tracer(&mut self) {
        self.trace.set(None, TraceFilter::all());
    }

    pub fn emit_trace(&mut self, event: TraceEvent) {
        self.trace.emit(event);
    }

    /// Rejects statements naming registers past the end of this engine's file.
    pub fn check_registers(&self, statement: &DecodedStatement) -> IsaResult<()> {
        let count = self.state.registers().len();
        match statement
            .register_operands()
            .find(|index| usize::from(*index) >= count)
        {
            Some(index) => Err(IsaError::RegisterOutOfRange {
                mnemonic: statement.mnemonic(),
                index,
                count,
            }),
            None => Ok(()),
        }
    }

    /// Runs the action bound to `statement`.
    ///
    /// Register indices are trusted; use [`ExecutionEngine::check_registers`]
    /// first when the register file may be smaller than 32 entries.
    pub fn execute(&mut self, statement: &DecodedStatement) -> ExecutionResult {
        let action = self.catalog.definition(statement.opcode()).action();
        let (registers, memory) = self.state.split_mut();
        let mut ctx = ExecutionContext::new(
            statement,
            registers,
            memory,
            self.sink.as_mut(),
            &mut self.trace,
        );
        match action(&mut ctx) {
            Ok(Flow::Continue) => ExecutionResult::Continue,
            Ok(Flow::Redirect(target)) => {
                self.trace.emit_with(TraceFilter::CONTROL, || TraceEvent::Redirect { target });
                ExecutionResult::Redirect(target)
            }
            Err(kind) => {
                let fault = ExecutionFault::new(kind, statement);
                self.trace.emit_with(TraceFilter::FAULTS, || TraceEvent::Fault {
                    cause: fault.cause_code(),
                    message: fault.to_string(),
                });
                ExecutionResult::Fault(fault)
            }
        }
    }
}

impl fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("catalog", &self.catalog.name())
            .field("core", &self.state.specification().name())
            .field("tracing", &self.trace.is_active())
            .finish()
    }
}
