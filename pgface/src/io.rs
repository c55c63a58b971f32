//! Socket io futures.
mod read_chunk;

pub use read_chunk::ReadChunk;
