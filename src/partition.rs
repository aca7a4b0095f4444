use std::{ops::Range, thread};

use crate::{
    error::{Error, Result},
    misc::log::targets,
};

/// Hardware threads of the machine, or a fixed guess when undetectable.
pub fn available_threads() -> usize {
    thread::available_parallelism()
        .map(|val| val.get())
        .unwrap_or(4)
}

/// Checks a requested thread count against what the machine offers.
pub fn validate_threads(requested: usize, available: usize) -> Result<usize> {
    if requested == 0 || requested > available {
        return Err(Error::ThreadCount {
            requested,
            available,
        });
    }
    Ok(requested)
}

/// Splits `0..len` into `threads` contiguous ranges in order. The first
/// `len % threads` ranges hold one element more than the rest.
pub fn partition(len: usize, threads: usize) -> Vec<Range<usize>> {
    if threads == 0 {
        return vec![];
    }

    let base = len / threads;
    let extra = len % threads;

    let mut ranges = Vec::with_capacity(threads);
    let mut start = 0;
    for index in 0..threads {
        let size = base + usize::from(index < extra);
        ranges.push(start..start + size);
        start += size;
    }

    log::debug!(target: targets::PARTITION, "Split {len} variables into {ranges:?}");
    ranges
}
