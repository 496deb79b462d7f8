//! Ring member offsets.
//!
//! Inputs store ring members as relative offsets: the first is an absolute
//! output index, each following one is the distance from its predecessor.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OffsetError {
    #[error("absolute offset overflows u64 at ring position {position}")]
    Overflow { position: usize },

    #[error("absolute offsets decrease at ring position {position}")]
    NotSorted { position: usize },
}

/// Convert relative offsets to absolute output indices.
pub fn relative_to_absolute(offsets: &[u64]) -> Result<Vec<u64>, OffsetError> {
    let mut result = Vec::with_capacity(offsets.len());
    let mut sum = 0u64;
    for (position, &off) in offsets.iter().enumerate() {
        sum = sum
            .checked_add(off)
            .ok_or(OffsetError::Overflow { position })?;
        result.push(sum);
    }
    Ok(result)
}

/// Convert absolute indices back to relative offsets.
pub fn absolute_to_relative(indices: &[u64]) -> Result<Vec<u64>, OffsetError> {
    let mut result = Vec::with_capacity(indices.len());
    let mut prev = 0u64;
    for (position, &idx) in indices.iter().enumerate() {
        let delta = idx
            .checked_sub(prev)
            .ok_or(OffsetError::NotSorted { position })?;
        result.push(delta);
        prev = idx;
    }
    Ok(result)
}
