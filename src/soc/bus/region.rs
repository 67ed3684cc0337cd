use bitflags::bitflags;

use crate::soc::device::Device;

bitflags! {
    #[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
    pub struct AccessFlags: u32 {
        const READ  = 0b1;
        const WRITE = 0b10;
        const EXEC  = 0b100;
    }
}

/// One device window inside the address space.
pub struct MappedRegion {
    pub(super) base: u32,
    pub(super) size: u32,
    pub(super) flags: AccessFlags,
    pub(super) device: Box<dyn Device>,
}

impl MappedRegion {
    pub fn name(&self) -> &str {
        self.device.name()
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn flags(&self) -> AccessFlags {
        self.flags
    }

    /// Exclusive end, widened so a region ending at 4 GiB is representable.
    pub fn end(&self) -> u64 {
        u64::from(self.base) + u64::from(self.size)
    }

    pub fn contains(&self, address: u32, len: usize) -> bool {
        let start = u64::from(address);
        start >= u64::from(self.base) && start + len as u64 <= self.end()
    }

    pub(super) fn overlaps(&self, base: u32, size: u32) -> bool {
        let start = u64::from(base);
        let end = start + u64::from(size);
        start < self.end() && u64::from(self.base) < end
    }
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("name", &self.name())
            .field("base", &format_args!("0x{:08X}", self.base))
            .field("size", &self.size)
            .field("flags", &self.flags)
            .finish()
    }
}
