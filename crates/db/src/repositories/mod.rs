//! Repository layer for database operations.

pub mod media;
pub mod report;

pub use media::MediaRepository;
pub use report::ReportRepository;
