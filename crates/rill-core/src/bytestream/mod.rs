//! Byte-stream readers and writers.
//!
//! Multi-byte accessors come in big-endian and little-endian flavours;
//! PNG-style wire formats are big-endian on the wire but keep some
//! little-endian packed words internally, so both are provided.
mod reader;
mod writer;

pub use reader::{ByteReader, NotEnoughBytes};
pub use writer::ByteWriter;
