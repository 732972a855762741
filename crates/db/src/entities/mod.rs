//! Database entities.

pub mod media_chunk;
pub mod media_file;
pub mod report;

pub use media_chunk::Entity as MediaChunk;
pub use media_file::Entity as MediaFile;
pub use report::Entity as Report;
