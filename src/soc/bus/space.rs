//! AddressSpace owns the memory map of one engine instance. Word accesses are
//! checked for alignment, mapping and region permissions before they reach the
//! backing device, so every failure surfaces as a `BusError` the engine can
//! report as an addressing fault.
use crate::soc::device::{Device, Endianness, RamMemory, WORD_BYTES};

use super::error::{BusError, BusResult};
use super::region::{AccessFlags, MappedRegion};

pub struct AddressSpace {
    endianness: Endianness,
    regions: Vec<MappedRegion>,
}

impl AddressSpace {
    pub fn new(endianness: Endianness) -> Self {
        Self {
            endianness,
            regions: Vec::new(),
        }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn regions(&self) -> &[MappedRegion] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&MappedRegion> {
        self.regions.iter().find(|region| region.name() == name)
    }

    /// Maps a zero-filled RAM device of `size` bytes at `base`.
    pub fn map_ram(
        &mut self,
        name: impl Into<String>,
        base: u32,
        size: u32,
        flags: AccessFlags,
    ) -> BusResult<()> {
        let ram = RamMemory::new(name, size as usize, self.endianness);
        self.map_device(Box::new(ram), base, flags)
    }

    pub fn map_device(
        &mut self,
        device: Box<dyn Device>,
        base: u32,
        flags: AccessFlags,
    ) -> BusResult<()> {
        let span = device.span();
        let size = u32::try_from(span.len()).map_err(|_| BusError::InvalidSpan {
            address: base,
            details: format!("device '{}' is larger than the address space", device.name()),
        })?;
        if span.start != 0 || size == 0 {
            return Err(BusError::InvalidSpan {
                address: base,
                details: format!("device '{}' reported an empty span", device.name()),
            });
        }
        if base as usize % WORD_BYTES != 0 {
            return Err(BusError::Misaligned {
                address: base,
                width: WORD_BYTES,
            });
        }
        if u64::from(base) + u64::from(size) > 1u64 << 32 {
            return Err(BusError::InvalidSpan {
                address: base,
                details: "range wraps past 0xFFFFFFFF".into(),
            });
        }
        if let Some(conflict) = self.regions.iter().find(|region| region.overlaps(base, size)) {
            return Err(BusError::Overlap {
                address: base,
                details: format!("conflicts with region '{}'", conflict.name()),
            });
        }
        let pos = self.regions.partition_point(|region| region.base < base);
        self.regions.insert(
            pos,
            MappedRegion {
                base,
                size,
                flags,
                device,
            },
        );
        Ok(())
    }

    /// Loads a signed word from a readable region.
    pub fn load_word(&self, address: u32) -> BusResult<i32> {
        self.read_word(address, AccessFlags::READ).map(|word| word as i32)
    }

    /// Stores a signed word into a writable region.
    pub fn store_word(&mut self, address: u32, value: i32) -> BusResult<()> {
        self.write_word(address, value as u32, AccessFlags::WRITE)
    }

    /// Fetches an instruction word from an executable region.
    pub fn fetch_word(&self, address: u32) -> BusResult<u32> {
        self.read_word(address, AccessFlags::READ | AccessFlags::EXEC)
    }

    /// Reads a word ignoring region permissions (inspection only).
    pub fn peek_word(&self, address: u32) -> BusResult<u32> {
        self.read_word(address, AccessFlags::empty())
    }

    /// Writes a word ignoring region permissions, used to place program images.
    pub fn poke_word(&mut self, address: u32, value: u32) -> BusResult<()> {
        self.write_word(address, value, AccessFlags::empty())
    }

    fn read_word(&self, address: u32, required: AccessFlags) -> BusResult<u32> {
        let idx = self.resolve(address, required)?;
        let region = &self.regions[idx];
        let mut bytes = [0u8; WORD_BYTES];
        region
            .device
            .read((address - region.base) as usize, &mut bytes)
            .map_err(|source| BusError::DeviceFault {
                device: region.name().to_string(),
                source,
            })?;
        Ok(region.device.endianness().decode_word(bytes))
    }

    fn write_word(&mut self, address: u32, value: u32, required: AccessFlags) -> BusResult<()> {
        let idx = self.resolve(address, required)?;
        let region = &mut self.regions[idx];
        let bytes = region.device.endianness().encode_word(value);
        let offset = (address - region.base) as usize;
        region
            .device
            .write(offset, &bytes)
            .map_err(|source| BusError::DeviceFault {
                device: region.device.name().to_string(),
                source,
            })
    }

    fn resolve(&self, address: u32, required: AccessFlags) -> BusResult<usize> {
        if address as usize % WORD_BYTES != 0 {
            return Err(BusError::Misaligned {
                address,
                width: WORD_BYTES,
            });
        }
        let idx = self
            .regions
            .partition_point(|region| region.base <= address)
            .checked_sub(1)
            .filter(|idx| self.regions[*idx].contains(address, WORD_BYTES))
            .ok_or(BusError::NotMapped { address })?;
        let granted = self.regions[idx].flags;
        if !granted.contains(required) {
            return Err(BusError::AccessDenied {
                address,
                required,
                granted,
            });
        }
        Ok(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_space() -> AddressSpace {
        let mut space = AddressSpace::new(Endianness::Little);
        space
            .map_ram("text", 0x0040_0000, 0x100, AccessFlags::READ | AccessFlags::EXEC)
            .expect("map text");
        space
            .map_ram("data", 0x1001_0000, 0x100, AccessFlags::READ | AccessFlags::WRITE)
            .expect("map data");
        space
    }

    #[test]
    fn store_then_load_round_trips_signed_words() {
        let mut space = demo_space();
        space.store_word(0x1001_0010, -42).expect("store");
        assert_eq!(space.load_word(0x1001_0010).expect("load"), -42);
        assert_eq!(
            space.peek_word(0x1001_0010).expect("peek"),
            (-42i32) as u32,
            "raw view shares storage"
        );
    }

    #[test]
    fn misaligned_access_faults_before_lookup() {
        let mut space = demo_space();
        assert_eq!(
            space.load_word(0x1001_0002),
            Err(BusError::Misaligned {
                address: 0x1001_0002,
                width: 4
            })
        );
        assert!(matches!(
            space.store_word(0x1001_0001, 1),
            Err(BusError::Misaligned { .. })
        ));
    }

    #[test]
    fn unmapped_and_tail_accesses_fault() {
        let mut space = demo_space();
        assert_eq!(
            space.load_word(0x2000_0000),
            Err(BusError::NotMapped {
                address: 0x2000_0000
            })
        );
        assert!(space.load_word(0x1001_00FC).is_ok(), "last word is in range");
        assert!(matches!(
            space.store_word(0x1001_0100, 7),
            Err(BusError::NotMapped { .. })
        ));
        assert!(matches!(
            space.load_word(0x0000_0000),
            Err(BusError::NotMapped { .. })
        ));
    }

    #[test]
    fn permissions_are_enforced_per_region() {
        let mut space = demo_space();
        let err = space.store_word(0x0040_0000, 1).expect_err("text is read-only");
        assert!(matches!(err, BusError::AccessDenied { .. }), "got {err}");
        assert!(matches!(
            space.fetch_word(0x1001_0000),
            Err(BusError::AccessDenied { .. })
        ));
        space.poke_word(0x0040_0000, 0xABCD_0123).expect("loader bypasses flags");
        assert_eq!(space.fetch_word(0x0040_0000).expect("fetch"), 0xABCD_0123);
    }

    #[test]
    fn overlapping_and_misaligned_maps_are_rejected() {
        let mut space = demo_space();
        assert!(matches!(
            space.map_ram("dup", 0x0040_0080, 0x100, AccessFlags::READ),
            Err(BusError::Overlap { .. })
        ));
        assert!(matches!(
            space.map_ram("odd", 0x3000_0002, 0x10, AccessFlags::READ),
            Err(BusError::Misaligned { .. })
        ));
        assert!(matches!(
            space.map_ram("wrap", 0xFFFF_FFF0, 0x20, AccessFlags::READ),
            Err(BusError::InvalidSpan { .. })
        ));
        assert_eq!(space.regions().len(), 2);
        assert_eq!(space.region("data").expect("data").base(), 0x1001_0000);
    }

    #[test]
    fn empty_device_is_rejected_as_invalid_span() {
        let mut space = demo_space();
        let err = space
            .map_device(
                Box::new(RamMemory::new("empty", 0, Endianness::Little)),
                0x2000_0000,
                AccessFlags::READ,
            )
            .expect_err("zero-length device");
        assert!(
            matches!(err, BusError::InvalidSpan { address: 0x2000_0000, .. }),
            "got {err}"
        );
        assert!(err.to_string().contains("empty span"), "{err}");
        assert_eq!(space.regions().len(), 2, "map is unchanged");
    }

    #[test]
    fn big_endian_space_lays_out_words_msb_first() {
        let mut space = AddressSpace::new(Endianness::Big);
        space
            .map_ram("data", 0, 8, AccessFlags::READ | AccessFlags::WRITE)
            .expect("map");
        space.store_word(4, 0x0102_0304).expect("store");
        assert_eq!(space.load_word(4).expect("load"), 0x0102_0304);
    }
}
