//! Defines the `Device` trait used by the address space. Devices expose their
//! byte span and raw read/write helpers with a consistent `DeviceResult` error
//! surface so the address space can translate failures into
//! `BusError::DeviceFault`.
use std::ops::Range;

use super::{endianness::Endianness, error::DeviceResult};

pub trait Device: Send {
    fn name(&self) -> &str;
    fn span(&self) -> Range<usize>;

    #[inline(always)]
    fn endianness(&self) -> Endianness {
        Endianness::Little
    }

    /// Read a contiguous slice of bytes from the device at `byte_offset` into `out`.
    fn read(&self, byte_offset: usize, out: &mut [u8]) -> DeviceResult<()>;

    /// Write a contiguous slice of bytes to the device at `byte_offset` from `data`.
    fn write(&mut self, byte_offset: usize, data: &[u8]) -> DeviceResult<()>;
}
