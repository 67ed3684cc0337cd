//! Rocket instruction set: the catalog of definitions and their bit
//! templates, plus the semantic actions that give each instruction its effect.

pub mod error;
pub mod machine;
pub mod semantics;

pub use error::{ExecutionFault, FaultKind, IsaError, IsaResult};
pub use machine::{DecodedStatement, InstructionCatalog, InstructionDefinition, Opcode};
pub use semantics::Flow;
pub use semantics::flight::{FlightStatus, roles};
pub use semantics::notify::{BufferedSink, NotificationSink, NullSink, WriterSink};
pub use semantics::trace::{ExecutionTracer, PipelinePrinter, TraceEvent, TraceFilter};
