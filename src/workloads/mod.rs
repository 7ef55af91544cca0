//! The benchmark suite
//!
//! - [`list_creation`] - building `[0, size)` three ways
//! - [`serialization`] - encoding and decoding a mapping in three formats
//! - [`string_ops`] - three concatenation strategies

pub mod list_creation;
pub mod serialization;
pub mod string_ops;

use crate::error::Result;
use crate::harness::Suite;

/// Register every workload
///
/// `max_size` caps the codec payload sizes; the other groups are fixed-size.
pub fn register_all(suite: &mut Suite, max_size: Option<usize>) -> Result<()> {
    list_creation::register(suite)?;
    serialization::register(suite, max_size)?;
    string_ops::register(suite)?;
    Ok(())
}

/// A suite holding every workload
pub fn suite(max_size: Option<usize>) -> Result<Suite> {
    let mut suite = Suite::new();
    register_all(&mut suite, max_size)?;
    Ok(suite)
}
