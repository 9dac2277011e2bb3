//! Persisted canonical state.
//!
//! After every read of the backend the flattened configuration is stored as
//! a [`StateSnapshot`]. The next read is flattened against it, and comparing
//! fingerprints tells whether anything changed.

mod hash;
mod local;
mod store;
mod types;

pub use hash::StateHasher;
pub use local::{LocalStateStore, STATE_DIR, STATE_DIR_ENV};
pub use store::StateStore;
pub use types::{StateSnapshot, STATE_VERSION};
