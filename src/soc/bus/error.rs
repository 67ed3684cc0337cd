use std::{error::Error, fmt};

use crate::soc::device::DeviceError;

use super::region::AccessFlags;

pub type BusResult<T> = Result<T, BusError>;

/// Failures raised by the address space. Every variant a word access can
/// produce is an addressing fault from the instruction's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    Misaligned {
        address: u32,
        width: usize,
    },
    NotMapped {
        address: u32,
    },
    AccessDenied {
        address: u32,
        required: AccessFlags,
        granted: AccessFlags,
    },
    Overlap {
        address: u32,
        details: String,
    },
    InvalidSpan {
        address: u32,
        details: String,
    },
    DeviceFault {
        device: String,
        source: DeviceError,
    },
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Misaligned { address, width } => write!(
                f,
                "address 0x{address:08X} is not aligned on a {width}-byte boundary"
            ),
            BusError::NotMapped { address } => write!(f, "address 0x{address:08X} is not mapped"),
            BusError::AccessDenied {
                address,
                required,
                granted,
            } => write!(
                f,
                "address 0x{address:08X} requires {required:?} but region grants {granted:?}"
            ),
            BusError::Overlap { address, details } => write!(
                f,
                "address 0x{address:08X} overlaps existing mapping ({details})"
            ),
            BusError::InvalidSpan { address, details } => {
                write!(f, "cannot map at 0x{address:08X}: {details}")
            }
            BusError::DeviceFault { device, .. } => write!(f, "device '{device}' reported a fault"),
        }
    }
}

impl Error for BusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BusError::DeviceFault { source, .. } => Some(source),
            _ => None,
        }
    }
}
