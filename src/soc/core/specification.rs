use ahash::AHashMap;

use crate::soc::bus::{AccessFlags, AddressSpace, BusResult};
use crate::soc::device::{Endianness, WORD_BYTES};

/// Largest register file the 5-bit operand fields can address.
pub const MAX_REGISTERS: usize = 32;

pub const TEXT_BASE: u32 = 0x0040_0000;
pub const DATA_BASE: u32 = 0x1001_0000;
pub const DEFAULT_SEGMENT_BYTES: u32 = 0x1_0000;

/// Declarative description of one engine instance: register file size, the
/// register naming conventions, and the memory map the embedder wants.
#[derive(Debug, Clone)]
pub struct CoreSpec {
    name: String,
    register_count: usize,
    endianness: Endianness,
    aliases: AHashMap<String, u8>,
    display_names: Vec<Option<String>>,
    regions: Vec<RegionSpec>,
}

impl CoreSpec {
    pub fn builder(name: impl Into<String>) -> CoreSpecBuilder {
        CoreSpecBuilder::new(name)
    }

    /// Builder preloaded with the Rocket conventions: 32 registers, the flight
    /// register names, and the usual text/data segment layout.
    pub fn rocket_builder() -> CoreSpecBuilder {
        CoreSpecBuilder::new("rocket")
            .registers(MAX_REGISTERS)
            .alias("zero", 0)
            .alias("alt", 1)
            .alias("vel", 2)
            .alias("oxt", 3)
            .alias("fuel", 4)
            .alias("stat", 5)
            .region(
                "text",
                TEXT_BASE,
                DEFAULT_SEGMENT_BYTES,
                AccessFlags::READ | AccessFlags::EXEC,
            )
            .region(
                "data",
                DATA_BASE,
                DEFAULT_SEGMENT_BYTES,
                AccessFlags::READ | AccessFlags::WRITE,
            )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn register_count(&self) -> usize {
        self.register_count
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn regions(&self) -> &[RegionSpec] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&RegionSpec> {
        self.regions.iter().find(|region| region.name == name)
    }

    /// Base of the first executable region, where programs are placed.
    pub fn entry_point(&self) -> Option<u32> {
        self.regions
            .iter()
            .find(|region| region.flags.contains(AccessFlags::EXEC))
            .map(|region| region.base)
    }

    /// Resolves `$alt`, `ALT`, `$5`, `r5` or `5` to a register index.
    pub fn resolve_register(&self, name: &str) -> Option<u8> {
        let trimmed = name.trim();
        let bare = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let lowered = bare.to_ascii_lowercase();
        if let Some(index) = self.aliases.get(&lowered) {
            return Some(*index);
        }
        let digits = lowered.strip_prefix('r').unwrap_or(&lowered);
        digits
            .parse::<u8>()
            .ok()
            .filter(|index| (*index as usize) < self.register_count)
    }

    /// First alias registered for `index`, if any.
    pub fn register_name(&self, index: u8) -> Option<&str> {
        self.display_names
            .get(index as usize)
            .and_then(|name| name.as_deref())
    }

    /// Instantiates a fresh, zeroed memory map for one engine.
    pub fn build_address_space(&self) -> BusResult<AddressSpace> {
        let mut space = AddressSpace::new(self.endianness);
        for region in &self.regions {
            space.map_ram(region.name.clone(), region.base, region.size, region.flags)?;
        }
        Ok(space)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSpec {
    pub name: String,
    pub base: u32,
    pub size: u32,
    pub flags: AccessFlags,
}

impl RegionSpec {
    fn end(&self) -> u64 {
        u64::from(self.base) + u64::from(self.size)
    }
}

#[derive(Debug)]
pub struct CoreSpecBuilder {
    name: String,
    register_count: usize,
    endianness: Endianness,
    aliases: Vec<(String, u8)>,
    regions: Vec<RegionSpec>,
    errors: Vec<CoreSpecError>,
}

impl CoreSpecBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            register_count: MAX_REGISTERS,
            endianness: Endianness::Little,
            aliases: Vec::new(),
            regions: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn registers(mut self, count: usize) -> Self {
        self.register_count = count;
        self
    }

    pub fn endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    pub fn alias(mut self, name: impl Into<String>, index: u8) -> Self {
        let name = name.into().to_ascii_lowercase();
        if self.aliases.iter().any(|(existing, _)| *existing == name) {
            self.errors.push(CoreSpecError::DuplicateAlias(name));
            return self;
        }
        self.aliases.push((name, index));
        self
    }

    pub fn region(mut self, name: impl Into<String>, base: u32, size: u32, flags: AccessFlags) -> Self {
        let name = name.into();
        if self.regions.iter().any(|region| region.name == name) {
            self.errors.push(CoreSpecError::DuplicateRegion(name));
            return self;
        }
        if size == 0 {
            self.errors.push(CoreSpecError::EmptyRegion(name));
            return self;
        }
        let word = WORD_BYTES as u32;
        if base % word != 0 || size % word != 0 {
            self.errors
                .push(CoreSpecError::MisalignedRegion { name, base, size });
            return self;
        }
        self.regions.push(RegionSpec {
            name,
            base,
            size,
            flags,
        });
        self
    }

    pub fn build(mut self) -> Result<CoreSpec, CoreSpecBuildError> {
        if self.register_count == 0 || self.register_count > MAX_REGISTERS {
            self.errors
                .push(CoreSpecError::InvalidRegisterCount(self.register_count));
        }
        for (name, index) in &self.aliases {
            if *index as usize >= self.register_count {
                self.errors.push(CoreSpecError::AliasOutOfRange {
                    name: name.clone(),
                    index: *index,
                    count: self.register_count,
                });
            }
        }
        self.regions.sort_by_key(|region| region.base);
        for pair in self.regions.windows(2) {
            if pair[0].end() > u64::from(pair[1].base) {
                self.errors.push(CoreSpecError::OverlappingRegions {
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }
        if let Some(last) = self.regions.last()
            && last.end() > 1u64 << 32
        {
            self.errors.push(CoreSpecError::RegionWraps(last.name.clone()));
        }
        if !self.errors.is_empty() {
            return Err(CoreSpecBuildError { errors: self.errors });
        }

        let mut aliases = AHashMap::with_capacity(self.aliases.len());
        let mut display_names = vec![None; self.register_count];
        for (name, index) in self.aliases {
            let slot = &mut display_names[index as usize];
            if slot.is_none() {
                *slot = Some(name.clone());
            }
            aliases.insert(name, index);
        }
        Ok(CoreSpec {
            name: self.name,
            register_count: self.register_count,
            endianness: self.endianness,
            aliases,
            display_names,
            regions: self.regions,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreSpecError {
    InvalidRegisterCount(usize),
    DuplicateAlias(String),
    AliasOutOfRange { name: String, index: u8, count: usize },
    DuplicateRegion(String),
    EmptyRegion(String),
    MisalignedRegion { name: String, base: u32, size: u32 },
    OverlappingRegions { first: String, second: String },
    RegionWraps(String),
}

#[derive(Debug)]
pub struct CoreSpecBuildError {
    pub errors: Vec<CoreSpecError>,
}

impl std::fmt::Display for CoreSpecBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.errors.is_empty() {
            return write!(f, "core spec build failed");
        }
        writeln!(f, "core spec build failed with {} error(s):", self.errors.len())?;
        for err in &self.errors {
            writeln!(f, "  - {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CoreSpecBuildError {}

impl std::fmt::Display for CoreSpecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreSpecError::InvalidRegisterCount(count) => write!(
                f,
                "register file must hold between 1 and {MAX_REGISTERS} registers (got {count})"
            ),
            CoreSpecError::DuplicateAlias(name) => {
                write!(f, "register alias '{name}' declared multiple times")
            }
            CoreSpecError::AliasOutOfRange { name, index, count } => write!(
                f,
                "register alias '{name}' targets index {index} but only {count} registers exist"
            ),
            CoreSpecError::DuplicateRegion(name) => {
                write!(f, "memory region '{name}' declared multiple times")
            }
            CoreSpecError::EmptyRegion(name) => write!(f, "memory region '{name}' is empty"),
            CoreSpecError::MisalignedRegion { name, base, size } => write!(
                f,
                "memory region '{name}' at 0x{base:08X} size 0x{size:X} is not word aligned"
            ),
            CoreSpecError::OverlappingRegions { first, second } => {
                write!(f, "memory regions '{first}' and '{second}' overlap")
            }
            CoreSpecError::RegionWraps(name) => {
                write!(f, "memory region '{name}' extends past 0xFFFFFFFF")
            }
        }
    }
}

impl std::error::Error for CoreSpecError {}
