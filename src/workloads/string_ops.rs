//! String concatenation workloads

use crate::error::Result;
use crate::harness::{operation, Params, Suite};

pub const GROUP: &str = "string_concat";
pub const COUNT: usize = 10_000;
pub const PART: &str = "string";

/// Naive `+=` on an immutable string: every step copies the whole prefix
pub fn plus_equals(parts: &[&str]) -> String {
    let mut result = String::new();
    for part in parts {
        result = format!("{result}{part}");
    }
    result
}

/// Amortized in-place append
pub fn push_str(parts: &[&str]) -> String {
    let mut result = String::new();
    for part in parts {
        result.push_str(part);
    }
    result
}

/// Single pre-sized concatenation
pub fn join(parts: &[&str]) -> String {
    parts.concat()
}

pub fn register(suite: &mut Suite) -> Result<()> {
    let variants: [(&str, fn(&[&str]) -> String); 3] = [
        ("plus_equals", plus_equals),
        ("push_str", push_str),
        ("join", join),
    ];

    for (variant, concat) in variants {
        suite.register(GROUP, variant, Params::new().with("count", COUNT), move |params| {
            let count = params
                .size("count")
                .ok_or_else(|| anyhow::anyhow!("missing integer parameter 'count'"))?;
            let parts = vec![PART; count];
            Ok(operation(move || concat(&parts)))
        })?;
    }
    Ok(())
}
