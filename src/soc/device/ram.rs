use std::ops::Range;

use crate::soc::device::{Device, DeviceError, DeviceResult, Endianness};

/// Flat zero-initialised byte store backing one mapped region.
pub struct RamMemory {
    name: String,
    bytes: Vec<u8>,
    endian: Endianness,
}

impl RamMemory {
    pub fn new(name: impl Into<String>, len: usize, endian: Endianness) -> Self {
        Self {
            name: name.into(),
            bytes: vec![0_u8; len],
            endian,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn check(&self, offset: usize, len: usize) -> DeviceResult<Range<usize>> {
        let end = offset.checked_add(len).ok_or(DeviceError::OutOfRange {
            offset,
            len,
            capacity: self.len(),
        })?;
        if end > self.len() {
            return Err(DeviceError::OutOfRange {
                offset,
                len,
                capacity: self.len(),
            });
        }
        Ok(offset..end)
    }
}

impl Device for RamMemory {
    fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    fn span(&self) -> Range<usize> {
        0..self.len()
    }

    #[inline(always)]
    fn endianness(&self) -> Endianness {
        self.endian
    }

    fn read(&self, offset: usize, out: &mut [u8]) -> DeviceResult<()> {
        if out.is_empty() {
            return Ok(());
        }
        let range = self.check(offset, out.len())?;
        out.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data_in: &[u8]) -> DeviceResult<()> {
        if data_in.is_empty() {
            return Ok(());
        }
        let range = self.check(offset, data_in.len())?;
        self.bytes[range].copy_from_slice(data_in);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_round_trips_bytes() {
        let mut ram = RamMemory::new("data", 16, Endianness::Little);
        ram.write(4, &[1, 2, 3, 4]).expect("write in range");
        let mut out = [0u8; 4];
        ram.read(4, &mut out).expect("read in range");
        assert_eq!(out, [1, 2, 3, 4]);
        assert_eq!(ram.span(), 0..16);
    }

    #[test]
    fn ram_rejects_access_past_end() {
        let mut ram = RamMemory::new("data", 8, Endianness::Little);
        let err = ram.write(6, &[0; 4]).expect_err("straddles end");
        assert_eq!(
            err,
            DeviceError::OutOfRange {
                offset: 6,
                len: 4,
                capacity: 8
            }
        );
        let mut out = [0u8; 4];
        assert!(ram.read(usize::MAX, &mut out).is_err(), "offset overflow is rejected");
    }
}
