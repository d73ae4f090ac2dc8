//! Fixed paging: pages over a caller-supplied list of values held in memory.

use super::PageSource;
use crate::document::{Document, Hit};
use crate::types::{QuadexError, Value};

/// Pages over values supplied by the caller instead of an index query.
///
/// Each value becomes a hit keyed by the value itself with an empty source.
/// Values may be appended at any time; later pages see them.
#[derive(Debug, Clone)]
pub struct FixedPager {
    values: Vec<Value>,
    batch_size: usize,
    offset: usize,
}

impl FixedPager {
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = Value>, batch_size: usize) -> Self {
        Self {
            values: values.into_iter().collect(),
            batch_size: batch_size.max(1),
            offset: 0,
        }
    }

    /// Append a value.
    pub fn add(&mut self, value: Value) {
        self.values.push(value);
    }
}

impl PageSource for FixedPager {
    async fn next_page(&mut self) -> Result<Vec<Hit>, QuadexError> {
        let end = self.offset.saturating_add(self.batch_size).min(self.values.len());
        let page = self.values[self.offset..end]
            .iter()
            .map(|v| Hit::new(v.as_str(), Document::Null))
            .collect();
        self.offset = end;
        Ok(page)
    }

    fn rewind(&mut self) {
        self.offset = 0;
    }

    fn fresh(&self) -> Self {
        Self {
            offset: 0,
            ..self.clone()
        }
    }

    fn close(&mut self) {}

    fn describe(&self) -> String {
        format!("fixed/{}", self.values.len())
    }
}
