//! # Cursor
//!
//! A lazy, resumable enumerator over a query's results, pulling pages from
//! a pluggable [`PageSource`].
//!
//! ## States
//!
//! ```text
//! Fresh ──advance──▶ Ready ──advance──▶ Ready ... ──▶ Exhausted
//!   ▲                  │                                  │
//!   └──────reset───────┴──────────────reset───────────────┘
//! ```
//!
//! - Results are decoded one at a time from the current page.
//! - At most one page request is in flight per cursor.
//! - `size()` is a snapshot taken when the cursor was built; the cursor never
//!   consumes more hits than that snapshot.
//! - A malformed document is skipped (and counted) rather than failing the
//!   cursor.
//! - A lapsed scroll session triggers one re-synchronization: the query is
//!   re-run and the hits already consumed are discarded. A second lapse
//!   without progress, or any other fetch error, ends the cursor.
//!
//! ## Paging strategies
//!
//! - [`OffsetPager`]: re-queries with a growing offset (point look-ups)
//! - [`ScrollPager`]: a background task streams scroll pages through a
//!   bounded channel (full enumeration, and look-ups too large for offsets)
//! - [`FixedPager`]: values supplied by the caller, held in memory

mod fixed;
mod offset;
mod scroll;

pub use fixed::FixedPager;
pub use offset::OffsetPager;
pub use scroll::ScrollPager;

use crate::document::{self, Hit};
use crate::index::IndexClient;
use crate::primitives::NEXT_COST;
use crate::types::{Quad, QuadexError, Value};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// PAGE SOURCE
// =============================================================================

/// A page-fetch strategy.
pub trait PageSource: Send {
    /// Fetch the next page of raw hits. An empty page ends the enumeration.
    fn next_page(&mut self) -> impl Future<Output = Result<Vec<Hit>, QuadexError>> + Send;

    /// Forget paging progress; the next fetch re-runs the query from the start.
    fn rewind(&mut self);

    /// An unstarted source over the same query, sharing no paging state.
    fn fresh(&self) -> Self;

    /// Stop background work and release server-side state. Idempotent.
    fn close(&mut self);

    /// Short human-readable description of the backing query.
    fn describe(&self) -> String;
}

/// The paging strategies a `QuadStore` hands out.
#[derive(Debug)]
pub enum Pager<C: IndexClient> {
    Offset(OffsetPager<C>),
    Scroll(ScrollPager<C>),
    Fixed(FixedPager),
}

impl<C: IndexClient> PageSource for Pager<C> {
    async fn next_page(&mut self) -> Result<Vec<Hit>, QuadexError> {
        match self {
            Self::Offset(pager) => pager.next_page().await,
            Self::Scroll(pager) => pager.next_page().await,
            Self::Fixed(pager) => pager.next_page().await,
        }
    }

    fn rewind(&mut self) {
        match self {
            Self::Offset(pager) => pager.rewind(),
            Self::Scroll(pager) => pager.rewind(),
            Self::Fixed(pager) => pager.rewind(),
        }
    }

    fn fresh(&self) -> Self {
        match self {
            Self::Offset(pager) => Self::Offset(pager.fresh()),
            Self::Scroll(pager) => Self::Scroll(pager.fresh()),
            Self::Fixed(pager) => Self::Fixed(pager.fresh()),
        }
    }

    fn close(&mut self) {
        match self {
            Self::Offset(pager) => pager.close(),
            Self::Scroll(pager) => pager.close(),
            Self::Fixed(pager) => pager.close(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Offset(pager) => pager.describe(),
            Self::Scroll(pager) => pager.describe(),
            Self::Fixed(pager) => pager.describe(),
        }
    }
}

// =============================================================================
// SUPPORTING TYPES
// =============================================================================

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique cursor id.
pub fn next_uid() -> u64 {
    NEXT_UID.fetch_add(1, Ordering::Relaxed)
}

/// Lifecycle state of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CursorState {
    /// Built or reset; nothing fetched yet.
    Fresh,
    /// Holding a current result.
    Ready,
    /// No more results. Terminal until `reset`.
    Exhausted,
}

/// What a cursor's results are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultKind {
    /// Node names from the node collection.
    Nodes,
    /// Quad identifiers from the quad collection.
    Quads,
    /// Handles supplied by the caller, returned as given.
    Values,
}

/// Named tag bindings carried by a cursor.
///
/// Dynamic tags bind to the current result; fixed tags bind to a constant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tagger {
    tags: BTreeSet<String>,
    fixed: BTreeMap<String, Value>,
}

impl Tagger {
    /// Bind `tag` to the current result.
    pub fn add(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    /// Bind `tag` to a constant.
    pub fn add_fixed(&mut self, tag: impl Into<String>, value: Value) {
        self.fixed.insert(tag.into(), value);
    }

    /// Dynamic tag names.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Fixed tag bindings.
    #[must_use]
    pub fn fixed(&self) -> &BTreeMap<String, Value> {
        &self.fixed
    }
}

/// Summary of a cursor for plan display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Description {
    pub uid: u64,
    pub name: String,
    pub kind: ResultKind,
    pub size: u64,
}

/// Cost estimates reported to query planners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CursorStats {
    /// Cost of one `contains` call. Proportional to size: it drains a copy.
    pub contains_cost: u64,
    /// Cost of one `advance` call.
    pub next_cost: u64,
    /// Snapshot size.
    pub size: u64,
}

// =============================================================================
// CURSOR
// =============================================================================

/// A resumable enumerator over one query.
#[derive(Debug)]
pub struct Cursor<P> {
    uid: u64,
    kind: ResultKind,
    source: P,
    batch: Vec<Hit>,
    batch_pos: usize,
    /// Hits taken off pages since the last reset, including skipped ones.
    position: u64,
    size: u64,
    state: CursorState,
    result: Option<Value>,
    quad: Option<Quad>,
    tagger: Tagger,
    /// Hits still to discard after a re-synchronization.
    resync_skip: u64,
    resyncing: bool,
    skipped: u64,
    closed: bool,
}

impl<P: PageSource> Cursor<P> {
    /// Create a cursor over `source` whose query matched `size` documents.
    #[must_use]
    pub fn new(kind: ResultKind, source: P, size: u64) -> Self {
        Self {
            uid: next_uid(),
            kind,
            source,
            batch: Vec::new(),
            batch_pos: 0,
            position: 0,
            size,
            state: CursorState::Fresh,
            result: None,
            quad: None,
            tagger: Tagger::default(),
            resync_skip: 0,
            resyncing: false,
            skipped: 0,
            closed: false,
        }
    }

    /// Pull the next result. Returns `false` once exhausted, on every call.
    pub async fn advance(&mut self) -> Result<bool, QuadexError> {
        if self.state == CursorState::Exhausted {
            return Ok(false);
        }

        loop {
            if self.position >= self.size {
                self.finish();
                return Ok(false);
            }

            if self.batch_pos < self.batch.len() {
                let idx = self.batch_pos;
                self.batch_pos += 1;
                self.position += 1;
                match self.materialize(idx) {
                    Ok(()) => {
                        self.state = CursorState::Ready;
                        return Ok(true);
                    }
                    Err(e) => {
                        self.skipped += 1;
                        tracing::warn!(uid = self.uid, error = %e, "skipping malformed document");
                        continue;
                    }
                }
            }

            if !self.fetch().await? {
                self.finish();
                return Ok(false);
            }
        }
    }

    /// Decode `batch[idx]` into the current result.
    fn materialize(&mut self, idx: usize) -> Result<(), QuadexError> {
        let hit = &self.batch[idx];
        match self.kind {
            ResultKind::Nodes => {
                let name = document::decode_node(&hit.id, &hit.source)?;
                self.result = Some(Value::new(name));
                self.quad = None;
            }
            ResultKind::Quads => {
                let quad = document::decode(&hit.id, &hit.source)?;
                self.result = Some(Value::new(hit.id.clone()));
                self.quad = Some(quad);
            }
            ResultKind::Values => {
                self.result = Some(Value::new(hit.id.clone()));
                self.quad = None;
            }
        }
        Ok(())
    }

    /// Replace the batch with the next non-empty page. `false` at the end.
    async fn fetch(&mut self) -> Result<bool, QuadexError> {
        loop {
            match self.source.next_page().await {
                Ok(mut page) => {
                    if page.is_empty() {
                        return Ok(false);
                    }
                    if self.resync_skip > 0 {
                        let n = self.resync_skip.min(page.len() as u64);
                        self.resync_skip -= n;
                        page = page.split_off(n as usize);
                        if page.is_empty() {
                            continue;
                        }
                    }
                    self.resyncing = false;
                    tracing::debug!(uid = self.uid, hits = page.len(), position = self.position, "page fetched");
                    self.batch = page;
                    self.batch_pos = 0;
                    return Ok(true);
                }
                Err(QuadexError::CursorExpired(session)) if !self.resyncing => {
                    tracing::warn!(
                        uid = self.uid,
                        position = self.position,
                        session = %session,
                        "scroll session expired, re-running query"
                    );
                    self.resyncing = true;
                    self.source.rewind();
                    self.batch.clear();
                    self.batch_pos = 0;
                    self.resync_skip = self.position;
                }
                Err(e) => {
                    self.finish();
                    return Err(e);
                }
            }
        }
    }

    /// Enter `Exhausted` and release the source.
    fn finish(&mut self) {
        self.state = CursorState::Exhausted;
        self.batch.clear();
        self.batch_pos = 0;
        self.source.close();
    }

    /// The current result.
    ///
    /// Fails with `NoCurrentResult` before the first successful `advance`
    /// and after `reset`. Stays stable until the next successful `advance`.
    pub fn result(&self) -> Result<&Value, QuadexError> {
        self.result.as_ref().ok_or(QuadexError::NoCurrentResult)
    }

    /// The decoded quad behind the current result of a quad cursor.
    pub fn result_quad(&self) -> Result<&Quad, QuadexError> {
        self.quad.as_ref().ok_or(QuadexError::NoCurrentResult)
    }

    /// Alternate paths for the current result. A flat cursor has none.
    pub fn next_path(&mut self) -> bool {
        false
    }

    /// Return to the initial state. The next `advance` re-runs the query.
    ///
    /// Has no effect on a closed cursor.
    pub fn reset(&mut self) {
        if self.closed {
            return;
        }
        self.source.rewind();
        self.batch.clear();
        self.batch_pos = 0;
        self.position = 0;
        self.resync_skip = 0;
        self.resyncing = false;
        self.result = None;
        self.quad = None;
        self.state = CursorState::Fresh;
    }

    /// A new cursor over the same query, starting from the beginning.
    ///
    /// The clone shares no position with `self`; it keeps the tags and the
    /// size snapshot. The query itself is re-run on the clone's first
    /// `advance`.
    #[must_use]
    pub fn fresh_clone(&self) -> Self {
        let mut clone = Self::new(self.kind, self.source.fresh(), self.size);
        clone.tagger = self.tagger.clone();
        clone
    }

    /// Stop fetching and release the source. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
        self.finish();
    }

    /// Whether `value` is among this cursor's results.
    ///
    /// Expensive: drains a fresh clone of the whole query (O(size) hits
    /// fetched). This cursor's position and current result are untouched.
    /// Planners should prefer a direction lookup.
    pub async fn contains(&self, value: &Value) -> Result<bool, QuadexError> {
        let mut side = self.fresh_clone();
        let mut found = false;
        while side.advance().await? {
            if side.result.as_ref() == Some(value) {
                found = true;
                break;
            }
        }
        side.close();
        Ok(found)
    }

    /// Write tag bindings into `dst`: dynamic tags get the current result,
    /// fixed tags their constant. Does not move the cursor.
    pub fn collect_tags(&self, dst: &mut BTreeMap<String, Value>) -> Result<(), QuadexError> {
        if !self.tagger.tags.is_empty() {
            let current = self.result()?;
            for tag in &self.tagger.tags {
                dst.insert(tag.clone(), current.clone());
            }
        }
        for (tag, value) in &self.tagger.fixed {
            dst.insert(tag.clone(), value.clone());
        }
        Ok(())
    }

    /// Snapshot of the number of matching documents when the cursor was built.
    ///
    /// An estimate: concurrent writes and skipped documents are not reflected.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Hits consumed since construction or the last reset.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Malformed documents skipped so far.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    #[must_use]
    pub fn state(&self) -> CursorState {
        self.state
    }

    #[must_use]
    pub fn uid(&self) -> u64 {
        self.uid
    }

    #[must_use]
    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    /// Results come in index order, not sorted by value.
    #[must_use]
    pub fn sorted(&self) -> bool {
        false
    }

    #[must_use]
    pub fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    pub fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.tagger
    }

    #[must_use]
    pub fn describe(&self) -> Description {
        Description {
            uid: self.uid,
            name: self.source.describe(),
            kind: self.kind,
            size: self.size,
        }
    }

    #[must_use]
    pub fn stats(&self) -> CursorStats {
        CursorStats {
            contains_cost: self.size.saturating_mul(NEXT_COST),
            next_cost: NEXT_COST,
            size: self.size,
        }
    }
}

impl<C: IndexClient> Cursor<Pager<C>> {
    /// Append `value` to a fixed cursor. Returns `false`, changing nothing,
    /// for index-backed or closed cursors.
    ///
    /// An exhausted fixed cursor resumes with the new value on its next
    /// `advance`.
    pub fn add(&mut self, value: Value) -> bool {
        if self.closed {
            return false;
        }
        let Pager::Fixed(pager) = &mut self.source else {
            return false;
        };
        pager.add(value);
        self.size = self.size.saturating_add(1);
        if self.state == CursorState::Exhausted {
            self.state = if self.result.is_some() {
                CursorState::Ready
            } else {
                CursorState::Fresh
            };
        }
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================
