mod chunk_buffer;

pub use chunk_buffer::ChunkBuffer;
