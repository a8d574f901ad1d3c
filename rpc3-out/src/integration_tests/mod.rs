//! Uses `rpc3-in` to read back what this crate writes, checking that the two
//! crates agree on layout.
mod roundtrip;
