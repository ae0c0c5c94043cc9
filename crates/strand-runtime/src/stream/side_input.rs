//! Side-input snapshots.

use super::{Stream, StreamRef};

/// A read-only snapshot of a fully materialized stream.
///
/// Every call to [`open`](Self::open) returns a fresh cursor positioned at the
/// start; cursors never share position state.
#[derive(Debug, Clone)]
pub struct SideInput<T> {
    source: StreamRef,
    stream: Stream<T>,
}

impl<T> SideInput<T> {
    /// Binds a snapshot to the materialized contents of `source`.
    pub fn new(source: StreamRef, stream: Stream<T>) -> Self {
        Self { source, stream }
    }

    /// Returns the stream this snapshot was taken from.
    pub fn source(&self) -> &StreamRef {
        &self.source
    }

    /// Opens an independent cursor at the start of the snapshot.
    pub fn open(&self) -> Cursor<'_, T> {
        Cursor {
            items: self.stream.as_slice(),
            position: 0,
        }
    }

    /// Returns the number of elements in the snapshot.
    #[inline]
    pub fn len(&self) -> usize {
        self.stream.len()
    }

    /// Returns whether the snapshot is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stream.is_empty()
    }

    /// Returns the underlying stream.
    pub fn stream(&self) -> &Stream<T> {
        &self.stream
    }
}

/// Cursor over a [`SideInput`]; yields `None` once exhausted.
#[derive(Debug, Clone)]
pub struct Cursor<'a, T> {
    items: &'a [T],
    position: usize,
}

impl<'a, T> Iterator for Cursor<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.items.get(self.position)?;
        self.position += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl<T> ExactSizeIterator for Cursor<'_, T> {}
