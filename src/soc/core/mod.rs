//! Core-level runtime: the descriptor of one engine instance, its mutable
//! register and memory state, the statement executor, and a reference
//! fetch-decode-execute loop built on top of it.

pub mod engine;
pub mod harness;
pub mod specification;
pub mod state;

pub use engine::{ExecutionEngine, ExecutionResult};
pub use harness::{ExecutionHarness, HarnessError, InstructionExecution, RunSummary, StopReason};
pub use specification::{
    CoreSpec, CoreSpecBuildError, CoreSpecBuilder, CoreSpecError, DATA_BASE, RegionSpec,
    TEXT_BASE,
};
pub use state::{CoreState, RegisterFile, StateError, StateResult};
