//! Batch assembly for bulk writes.
//!
//! [`chunk`] groups any iterator into contiguous, order-preserving batches
//! without materializing the whole input. [`collapse_duplicates`] reduces a
//! batch to one record per registration number.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use crate::models::StudentRecord;

/// Lazily splits `items` into batches of `size` elements; the last batch may
/// be shorter. An empty input yields no batches.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use diemthi_core::batch::chunk;
///
/// let size = NonZeroUsize::new(5).unwrap();
/// let sizes: Vec<usize> = chunk(0..12, size).map(|b| b.len()).collect();
/// assert_eq!(sizes, vec![5, 5, 2]);
/// ```
pub fn chunk<I: IntoIterator>(items: I, size: NonZeroUsize) -> Chunks<I::IntoIter> {
    Chunks {
        inner: items.into_iter(),
        size: size.get(),
    }
}

/// Iterator returned by [`chunk`].
#[derive(Debug)]
pub struct Chunks<I> {
    inner: I,
    size: usize,
}

impl<I> Chunks<I> {
    /// The wrapped iterator, e.g. to read counters it keeps.
    pub fn inner(&self) -> &I {
        &self.inner
    }
}

impl<I: Iterator> Iterator for Chunks<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch = Vec::with_capacity(self.size);
        for item in self.inner.by_ref() {
            batch.push(item);
            if batch.len() == self.size {
                break;
            }
        }
        (!batch.is_empty()).then_some(batch)
    }
}

/// Keeps one record per `sbd`: the last occurrence wins, and survivors keep the
/// relative order of their winning occurrence.
///
/// PostgreSQL rejects an `INSERT ... ON CONFLICT DO UPDATE` that touches the
/// same row twice, so a batch must be collapsed before it is written.
pub fn collapse_duplicates(batch: &[StudentRecord]) -> Vec<&StudentRecord> {
    let mut last_index: HashMap<&str, usize> = HashMap::with_capacity(batch.len());
    for (index, record) in batch.iter().enumerate() {
        last_index.insert(record.sbd.as_str(), index);
    }

    batch
        .iter()
        .enumerate()
        .filter(|(index, record)| last_index.get(record.sbd.as_str()) == Some(index))
        .map(|(_, record)| record)
        .collect()
}
