//! Provider adapter implementations.
//!
//! Concrete HTTP adapters live in the embedding application; this crate ships
//! only the scriptable mock.

pub mod mock;
pub use mock::{MockAdapter, MockFailure};
