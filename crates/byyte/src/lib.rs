//! Primitive readers and writers for the little-endian EPOC file formats.

pub mod le;

pub use le::{ByteReader, ByteWriter};
