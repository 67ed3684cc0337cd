//! Word-addressed memory map shared by the execution engine and the reference
//! execution loop.

pub mod error;
pub mod region;
pub mod space;

pub use error::{BusError, BusResult};
pub use region::{AccessFlags, MappedRegion};
pub use space::AddressSpace;
