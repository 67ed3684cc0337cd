use std::sync::Arc;

use crate::soc::bus::BusError;
use crate::soc::core::engine::{ExecutionEngine, ExecutionResult};
use crate::soc::core::specification::{CoreSpec, CoreSpecBuildError};
use crate::soc::core::state::{CoreState, StateError};
use crate::soc::device::WORD_BYTES;
use crate::soc::isa::error::{ExecutionFault, IsaError};
use crate::soc::isa::machine::InstructionCatalog;
use crate::soc::isa::semantics::Flow;
use crate::soc::isa::semantics::notify::NotificationSink;
use crate::soc::isa::semantics::trace::{ExecutionTracer, TraceEvent};

/// Reference fetch-decode-execute loop. Owns the program counter the engine
/// leaves to its caller, so tests can load a program image and run it to
/// completion while observing registers, memory and notifications.
pub struct ExecutionHarness {
    catalog: Arc<InstructionCatalog>,
    engine: ExecutionEngine,
    pc: u32,
    program_end: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionExecution {
    pub address: u32,
    pub word: u32,
    pub mnemonic: &'static str,
    pub statement: String,
    pub flow: Flow,
}

#[derive(Debug)]
pub enum StopReason {
    /// The program counter reached the word after the loaded program.
    EndOfProgram,
    StepLimit,
    Error(HarnessError),
}

#[derive(Debug)]
pub struct RunSummary {
    pub steps: usize,
    pub stop: StopReason,
}

impl RunSummary {
    pub fn fault(&self) -> Option<&ExecutionFault> {
        match &self.stop {
            StopReason::Error(HarnessError::Fault(fault)) => Some(fault),
            _ => None,
        }
    }

    pub fn completed(&self) -> bool {
        matches!(self.stop, StopReason::EndOfProgram)
    }
}

pub enum HarnessError {
    Isa(IsaError),
    Core(CoreSpecBuildError),
    State(StateError),
    Fetch { address: u32, source: BusError },
    Load(BusError),
    Image { len: usize },
    ProgramTooLarge { words: usize, capacity: usize },
    NoEntryPoint,
    Fault(ExecutionFault),
}

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarnessError::Isa(err) => write!(f, "ISA error: {err}"),
            HarnessError::Core(err) => write!(f, "core spec error: {err}"),
            HarnessError::State(err) => write!(f, "core state error: {err}"),
            HarnessError::Fetch { address, source } => {
                write!(f, "fetch from 0x{address:08X} failed: {source}")
            }
            HarnessError::Load(err) => write!(f, "program load failed: {err}"),
            HarnessError::Image { len } => {
                write!(f, "program image of {len} bytes is not a whole number of words")
            }
            HarnessError::ProgramTooLarge { words, capacity } => write!(
                f,
                "program of {words} words does not fit the {capacity}-word text region"
            ),
            HarnessError::NoEntryPoint => write!(f, "core has no executable region"),
            HarnessError::Fault(fault) => write!(f, "execution fault: {fault}"),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Isa(err) => Some(err),
            HarnessError::Core(err) => Some(err),
            HarnessError::State(err) => Some(err),
            HarnessError::Fetch { source, .. } => Some(source),
            HarnessError::Load(err) => Some(err),
            HarnessError::Fault(fault) => Some(fault),
            HarnessError::Image { .. }
            | HarnessError::ProgramTooLarge { .. }
            | HarnessError::NoEntryPoint => None,
        }
    }
}

impl std::fmt::Debug for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl From<IsaError> for HarnessError {
    fn from(value: IsaError) -> Self {
        HarnessError::Isa(value)
    }
}

impl From<CoreSpecBuildError> for HarnessError {
    fn from(value: CoreSpecBuildError) -> Self {
        HarnessError::Core(value)
    }
}

impl From<StateError> for HarnessError {
    fn from(value: StateError) -> Self {
        HarnessError::State(value)
    }
}

impl From<ExecutionFault> for HarnessError {
    fn from(value: ExecutionFault) -> Self {
        HarnessError::Fault(value)
    }
}

impl ExecutionHarness {
    /// Harness over the default Rocket core layout.
    pub fn rocket(sink: Box<dyn NotificationSink>) -> Result<Self, HarnessError> {
        Self::from_spec(CoreSpec::rocket_builder().build()?, sink)
    }

    pub fn from_spec(spec: CoreSpec, sink: Box<dyn NotificationSink>) -> Result<Self, HarnessError> {
        let catalog = Arc::new(InstructionCatalog::rocket()?);
        let state = CoreState::new(Arc::new(spec))?;
        let engine = ExecutionEngine::new(catalog.clone(), state, sink);
        let pc = engine.state().specification().entry_point().unwrap_or(0);
        Ok(Self {
            catalog,
            engine,
            pc,
            program_end: None,
        })
    }

    pub fn catalog(&self) -> &InstructionCatalog {
        &self.catalog
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ExecutionEngine {
        &mut self.engine
    }

    pub fn state(&self) -> &CoreState {
        self.engine.state()
    }

    pub fn state_mut(&mut self) -> &mut CoreState {
        self.engine.state_mut()
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn enable_tracer(&mut self, tracer: Box<dyn ExecutionTracer>) {
        self.engine.enable_tracer(tracer);
    }

    pub fn disable_tracer(&mut self) {
        self.engine.disable_tracer();
    }

    pub fn read(&self, register: &str) -> Result<i32, HarnessError> {
        Ok(self.state().read_register(register)?)
    }

    pub fn write(&mut self, register: &str, value: i32) -> Result<(), HarnessError> {
        Ok(self.state_mut().write_register(register, value)?)
    }

    /// Places `words` at the entry point and points the program counter at it.
    ///
    /// Memory is left untouched when the program does not fit the region
    /// holding the entry point.
    pub fn load_program(&mut self, words: &[u32]) -> Result<u32, HarnessError> {
        let spec = self.state().specification();
        let entry = spec.entry_point().ok_or(HarnessError::NoEntryPoint)?;
        let capacity = spec
            .regions()
            .iter()
            .find(|region| region.base == entry)
            .map_or(0, |region| region.size as usize / WORD_BYTES);
        if words.len() > capacity {
            return Err(HarnessError::ProgramTooLarge {
                words: words.len(),
                capacity,
            });
        }
        let memory = self.engine.state_mut().memory_mut();
        let mut address = entry;
        for word in words {
            memory.poke_word(address, *word).map_err(HarnessError::Load)?;
            address = address.wrapping_add(WORD_BYTES as u32);
        }
        self.pc = entry;
        self.program_end = Some(address);
        Ok(entry)
    }

    /// Like [`ExecutionHarness::load_program`] but takes raw bytes laid out in
    /// the core's byte order.
    pub fn load_image(&mut self, image: &[u8]) -> Result<u32, HarnessError> {
        if image.len() % WORD_BYTES != 0 {
            return Err(HarnessError::Image { len: image.len() });
        }
        let endianness = self.state().specification().endianness();
        let words: Vec<u32> = image
            .chunks_exact(WORD_BYTES)
            .map(|chunk| endianness.decode_word([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        self.load_program(&words)
    }

    /// Fetches, decodes and executes the statement at the program counter.
    ///
    /// On a fault the program counter stays on the faulting statement.
    pub fn step(&mut self) -> Result<InstructionExecution, HarnessError> {
        let address = self.pc;
        let word = self
            .state()
            .memory()
            .fetch_word(address)
            .map_err(|source| HarnessError::Fetch { address, source })?;
        let statement = self.catalog.decode(word, address)?;
        self.engine.check_registers(&statement)?;
        let rendered = statement.to_string();
        self.engine.emit_trace(TraceEvent::Fetch {
            address,
            word,
            mnemonic: statement.mnemonic().to_string(),
            detail: rendered.clone(),
        });
        let flow = match self.engine.execute(&statement) {
            ExecutionResult::Continue => {
                self.pc = address.wrapping_add(WORD_BYTES as u32);
                Flow::Continue
            }
            ExecutionResult::Redirect(target) => {
                self.pc = target;
                Flow::Redirect(target)
            }
            ExecutionResult::Fault(fault) => return Err(HarnessError::Fault(fault)),
        };
        Ok(InstructionExecution {
            address,
            word,
            mnemonic: statement.mnemonic(),
            statement: rendered,
            flow,
        })
    }

    /// Steps until the program ends, an error occurs, or `max_steps` statements ran.
    pub fn run(&mut self, max_steps: usize) -> RunSummary {
        let mut steps = 0;
        loop {
            if self.program_end == Some(self.pc) {
                return RunSummary {
                    steps,
                    stop: StopReason::EndOfProgram,
                };
            }
            if steps == max_steps {
                return RunSummary {
                    steps,
                    stop: StopReason::StepLimit,
                };
            }
            if let Err(err) = self.step() {
                return RunSummary {
                    steps,
                    stop: StopReason::Error(err),
                };
            }
            steps += 1;
        }
    }

    /// Clears registers and memory, forgetting any loaded program.
    pub fn reset(&mut self) -> Result<(), HarnessError> {
        self.engine.state_mut().zeroize()?;
        self.pc = self.state().specification().entry_point().unwrap_or(0);
        self.program_end = None;
        Ok(())
    }
}
