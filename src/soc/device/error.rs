use std::{error::Error, fmt};

pub type DeviceResult<T> = Result<T, DeviceError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    OutOfRange { offset: usize, len: usize, capacity: usize },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::OutOfRange { offset, len, capacity } => {
                write!(
                    f,
                    "device access offset 0x{offset:08X} len {len} exceeds capacity 0x{capacity:08X}"
                )
            }
        }
    }
}

impl Error for DeviceError {}
