//! Rocket instruction-set execution engine: a fixed catalog of general-purpose
//! and flight-control instructions executed against an owned register file and
//! a word-addressed memory map.

pub mod soc;
