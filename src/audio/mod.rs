//! Audio I/O: decoding inputs and staging buffers for external tools

pub mod decoder;
pub mod staging;

pub use decoder::decode;
pub use staging::write_wav;
