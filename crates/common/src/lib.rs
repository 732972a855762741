//! Common utilities and shared types for haven.
//!
//! This crate provides foundational components used across all haven crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Cryptography**: Authenticated encryption of report content via [`ReportCipher`]
//! - **ID Generation**: ULID-based identifiers and short share codes via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use haven_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crypto;
pub mod error;
pub mod id;

pub use config::Config;
pub use crypto::{EncryptedMessage, ReportCipher};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
