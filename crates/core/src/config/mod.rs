//! Configuration loading and schema definitions
//!
//! ```text
//! edgepix.toml (optional)
//!     → loader.rs (parse, env overrides, validation)
//!     → EdgeConfig (validated, immutable, shared by reference)
//! ```

mod loader;
mod schema;

pub use schema::*;
