//! Burrows-Wheeler Transform for BZip2.
//!
//! The BWT is a reversible transformation that groups similar bytes together,
//! making the data more compressible.
//!
//! Rotations are sorted through the suffix array of the block doubled onto
//! itself, so the forward transform runs in linear time even for highly
//! repetitive blocks. Identical rotations (a periodic block) keep ascending
//! start-index order.

use crate::sais;
use bzcodec_core::{BzError, Result};

/// Perform the Burrows-Wheeler Transform.
/// Returns the transformed data and the index of the original string.
pub fn transform(data: &[u8]) -> (Vec<u8>, u32) {
    if data.is_empty() {
        return (Vec::new(), 0);
    }

    let n = data.len();

    let mut doubled = Vec::with_capacity(2 * n);
    doubled.extend_from_slice(data);
    doubled.extend_from_slice(data);
    let sa = sais::suffix_array(&doubled, 255);

    // Suffixes starting in the first copy are the rotations, in sorted order.
    let mut transformed = Vec::with_capacity(n);
    let mut orig_ptr = 0usize;
    for p in sa.into_iter().filter(|&p| p < n) {
        if p == 0 {
            orig_ptr = transformed.len();
        }
        transformed.push(data[(p + n - 1) % n]);
    }

    // A block with period p has n/p copies of every rotation. The suffix
    // order ranks the copy starting at 0 last among its equals.
    let period = smallest_period(data);
    if period < n {
        orig_ptr -= n / period - 1;
    }

    (transformed, orig_ptr as u32)
}

/// Smallest `p` dividing `data.len()` such that `data` is `p`-periodic.
fn smallest_period(data: &[u8]) -> usize {
    let n = data.len();
    let mut prefix = vec![0usize; n];
    let mut k = 0;
    for i in 1..n {
        while k > 0 && data[i] != data[k] {
            k = prefix[k - 1];
        }
        if data[i] == data[k] {
            k += 1;
        }
        prefix[i] = k;
    }

    let p = n - prefix[n - 1];
    if n % p == 0 { p } else { n }
}

/// Perform inverse Burrows-Wheeler Transform.
/// Reconstructs the original data from the transformed data and origin pointer.
pub fn inverse_transform(data: &[u8], orig_ptr: u32) -> Result<Vec<u8>> {
    let n = data.len();
    if orig_ptr as usize >= n {
        if n == 0 && orig_ptr == 0 {
            return Ok(Vec::new());
        }
        return Err(BzError::invalid_origin(orig_ptr, n));
    }

    // Count occurrences of each byte
    let mut counts = [0usize; 256];
    for &byte in data {
        counts[byte as usize] += 1;
    }

    // Starting position of each byte value in the sorted first column
    let mut positions = [0usize; 256];
    let mut total = 0;
    for (pos, &count) in positions.iter_mut().zip(counts.iter()) {
        *pos = total;
        total += count;
    }

    // T[i] is the row that follows row i in the original text
    let mut transform = vec![0usize; n];
    for (i, &byte) in data.iter().enumerate() {
        transform[positions[byte as usize]] = i;
        positions[byte as usize] += 1;
    }

    let mut result = Vec::with_capacity(n);
    let mut idx = transform[orig_ptr as usize];

    for _ in 0..n {
        result.push(data[idx]);
        idx = transform[idx];
    }

    Ok(result)
}

#[cfg(test)]
pub(crate) fn naive_transform(data: &[u8]) -> (Vec<u8>, u32) {
    let n = data.len();
    if n == 0 {
        return (Vec::new(), 0);
    }
    let mut indices: Vec<usize> = (0..n).collect();
    // stable: equal rotations stay in index order
    indices.sort_by(|&a, &b| {
        (0..n)
            .map(|i| data[(a + i) % n].cmp(&data[(b + i) % n]))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let orig_ptr = indices.iter().position(|&i| i == 0).unwrap_or(0) as u32;
    let transformed = indices.iter().map(|&i| data[(i + n - 1) % n]).collect();
    (transformed, orig_ptr)
}
