//! Database module exports.

mod error;
mod guild;
mod store;

pub use error::StoreError;
pub use guild::{DEFAULT_PREFIX, GuildConfig};
pub use store::Database;
