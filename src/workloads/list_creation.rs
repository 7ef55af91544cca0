//! List creation workloads: three ways to build `[0, size)`

use crate::error::Result;
use crate::harness::{operation, Params, Suite};

pub const GROUP: &str = "list_creation";
pub const SIZE: usize = 10_000;

/// Iterator collect
pub fn collect(size: usize) -> Vec<i64> {
    (0..size as i64).collect()
}

/// Repeated push onto an empty vector
pub fn push_loop(size: usize) -> Vec<i64> {
    let mut values = Vec::new();
    for value in 0..size as i64 {
        values.push(value);
    }
    values
}

/// Push into a vector allocated up front
pub fn with_capacity(size: usize) -> Vec<i64> {
    let mut values = Vec::with_capacity(size);
    values.extend(0..size as i64);
    values
}

pub fn register(suite: &mut Suite) -> Result<()> {
    let variants: [(&str, fn(usize) -> Vec<i64>); 3] = [
        ("collect", collect),
        ("push_loop", push_loop),
        ("with_capacity", with_capacity),
    ];

    for (variant, build) in variants {
        suite.register(GROUP, variant, Params::new().with("size", SIZE), move |params| {
            let size = params
                .size("size")
                .ok_or_else(|| anyhow::anyhow!("missing integer parameter 'size'"))?;
            Ok(operation(move || build(size)))
        })?;
    }
    Ok(())
}
