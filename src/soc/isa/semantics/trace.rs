use std::fmt;
use std::io::Write;

use bitflags::bitflags;

bitflags! {
    /// Event categories a tracer can subscribe to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TraceFilter: u32 {
        const FETCH = 1 << 0;
        const REGISTERS = 1 << 1;
        const MEMORY = 1 << 2;
        const ALU = 1 << 3;
        const CONTROL = 1 << 4;
        const NOTIFY = 1 << 5;
        const FAULTS = 1 << 6;
    }
}

impl Default for TraceFilter {
    fn default() -> Self {
        TraceFilter::all()
    }
}

/// High-level events emitted while executing statements so tooling can build
/// pipeline-style traces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Fetch {
        address: u32,
        word: u32,
        mnemonic: String,
        detail: String,
    },
    RegisterRead {
        index: u8,
        value: i32,
    },
    RegisterWrite {
        index: u8,
        value: i32,
    },
    MemoryRead {
        address: u32,
        value: i32,
    },
    MemoryWrite {
        address: u32,
        value: i32,
    },
    HostOp {
        op: HostOpKind,
        lhs: i32,
        rhs: i32,
        result: i32,
        overflow: bool,
    },
    Redirect {
        target: u32,
    },
    Notify {
        line: String,
    },
    Fault {
        cause: u32,
        message: String,
    },
}

impl TraceEvent {
    pub fn category(&self) -> TraceFilter {
        match self {
            TraceEvent::Fetch { .. } => TraceFilter::FETCH,
            TraceEvent::RegisterRead { .. } | TraceEvent::RegisterWrite { .. } => {
                TraceFilter::REGISTERS
            }
            TraceEvent::MemoryRead { .. } | TraceEvent::MemoryWrite { .. } => TraceFilter::MEMORY,
            TraceEvent::HostOp { .. } => TraceFilter::ALU,
            TraceEvent::Redirect { .. } => TraceFilter::CONTROL,
            TraceEvent::Notify { .. } => TraceFilter::NOTIFY,
            TraceEvent::Fault { .. } => TraceFilter::FAULTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOpKind {
    Add,
    Sub,
    SetLess,
}

impl fmt::Display for HostOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOpKind::Add => write!(f, "+"),
            HostOpKind::Sub => write!(f, "-"),
            HostOpKind::SetLess => write!(f, "<"),
        }
    }
}

/// Consumers implement this trait to receive execution trace events.
pub trait ExecutionTracer {
    fn on_event(&mut self, event: TraceEvent);
}

/// Optional tracer plus the categories it wants delivered.
#[derive(Default)]
pub struct TraceHub {
    tracer: Option<Box<dyn ExecutionTracer>>,
    filter: TraceFilter,
}

impl TraceHub {
    pub fn set(&mut self, tracer: Option<Box<dyn ExecutionTracer>>, filter: TraceFilter) {
        self.tracer = tracer;
        self.filter = filter;
    }

    pub fn filter(&self) -> TraceFilter {
        self.filter
    }

    pub fn is_active(&self) -> bool {
        self.tracer.is_some()
    }

    pub fn wants(&self, category: TraceFilter) -> bool {
        self.tracer.is_some() && self.filter.intersects(category)
    }

    pub fn emit(&mut self, event: TraceEvent) {
        if !self.filter.intersects(event.category()) {
            return;
        }
        if let Some(tracer) = self.tracer.as_mut() {
            tracer.on_event(event);
        }
    }

    /// Builds the event only when a tracer subscribes to `category`.
    pub fn emit_with(&mut self, category: TraceFilter, build: impl FnOnce() -> TraceEvent) {
        if self.wants(category) {
            self.emit(build());
        }
    }
}

/// Simple tracer that prints events using a pipeline-like layout.
pub struct PipelinePrinter<W: Write> {
    writer: W,
}

impl<W: Write> PipelinePrinter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn writeln(&mut self, line: &str) {
        let _ = writeln!(self.writer, "{line}");
    }
}

impl PipelinePrinter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ExecutionTracer for PipelinePrinter<W> {
    fn on_event(&mut self, event: TraceEvent) {
        match event {
            TraceEvent::Fetch {
                address,
                word,
                mnemonic,
                detail,
            } => self.writeln(&format!(
                "[Fetch] 0x{address:08X} 0x{word:08X} {mnemonic} {detail}",
                detail = detail.trim()
            )),
            TraceEvent::RegisterRead { index, value } => {
                self.writeln(&format!("[ Read]   ${index} -> 0x{:08X}", value as u32))
            }
            TraceEvent::RegisterWrite { index, value } => {
                self.writeln(&format!("[Write]   ${index} <- 0x{:08X}", value as u32))
            }
            TraceEvent::MemoryRead { address, value } => self.writeln(&format!(
                "[ Load]   [0x{address:08X}] -> 0x{:08X}",
                value as u32
            )),
            TraceEvent::MemoryWrite { address, value } => self.writeln(&format!(
                "[Store]   [0x{address:08X}] <- 0x{:08X}",
                value as u32
            )),
            TraceEvent::HostOp {
                op,
                lhs,
                rhs,
                result,
                overflow,
            } => self.writeln(&format!(
                "[IntOp]   0x{:08X} {op} 0x{:08X} = 0x{:08X}{}",
                lhs as u32,
                rhs as u32,
                result as u32,
                if overflow { " (overflow)" } else { "" }
            )),
            TraceEvent::Redirect { target } => {
                self.writeln(&format!("[ Jump]   -> 0x{target:08X}"))
            }
            TraceEvent::Notify { line } => self.writeln(&format!("[ Note]   {line}")),
            TraceEvent::Fault { cause, message } => {
                self.writeln(&format!("[Fault]   cause {cause}: {message}"))
            }
        }
    }
}
