//! Library surface of the seqmine CLI: input parsing helpers shared by
//! the binary and its tests.

pub mod input;
