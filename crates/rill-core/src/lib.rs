//! Core primitives shared by the rill codec crates.
//!
//! This crate carries no codec logic of its own; it provides the
//! byte-oriented reading and writing helpers the format crates build on.
pub mod bytestream;

pub use bytestream::{ByteReader, ByteWriter, NotEnoughBytes};
