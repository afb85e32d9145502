//! Incremental, batched retrieval of the catalog.
//!
//! A [`CollectionLoader`] walks the [`StaticIndex`] front to back, one batch
//! per [`CollectionLoader::load_next_batch`] call, and accumulates the
//! enriched entries in index order.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_stream::stream;
use derive_more::Display;
use futures::Stream;
use futures::future::join_all;
use indexmap::IndexMap;
use pokedex_catalog::ClientTrait;
use thiserror::Error;
use tracing::{debug, instrument, trace, warn};

use crate::models::entry::CatalogEntry;
use crate::models::index::{CatalogEntryRef, StaticIndex};

/// Number of references enriched concurrently per batch, unless configured
/// otherwise.
pub const BATCH_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LoadPhase {
    /// Ready for the next batch.
    #[display("idle")]
    Idle,
    /// A batch is in flight, further calls are ignored.
    #[display("loading")]
    Loading,
    /// The last batch failed as a whole, the next call retries it.
    #[display("errored")]
    Errored,
    /// Every reference has been processed. Terminal.
    #[display("exhausted")]
    Exhausted,
}

/// Failure of a batch as a whole, as opposed to the failure of one entry.
#[derive(Debug, Error, PartialEq)]
pub enum LoadError {
    #[error("index reference '{identifier}' does not point at a numeric id: '{url}'")]
    InvalidReference { identifier: String, url: String },
}

/// A point-in-time copy of the loader state.
#[derive(Debug, Clone)]
pub struct LoadState {
    /// Unique by id, in index order.
    pub collection: Vec<Arc<CatalogEntry>>,
    /// Position in the static index of the next batch.
    pub cursor: usize,
    pub index_size: usize,
    pub phase: LoadPhase,
    pub is_loading: bool,
    pub has_more: bool,
    pub error: Option<Arc<LoadError>>,
}

impl LoadState {
    /// Share of the static index processed so far, in percent.
    pub fn progress(&self) -> f64 {
        if self.index_size == 0 {
            return 100.0;
        }
        self.cursor as f64 / self.index_size as f64 * 100.0
    }
}

#[derive(Debug)]
struct Progress {
    collection: IndexMap<u32, Arc<CatalogEntry>>,
    cursor: usize,
    phase: LoadPhase,
    error: Option<Arc<LoadError>>,
}

/// Drives batched enrichment of a [`StaticIndex`] through a catalog client.
///
/// At most one batch is in flight per loader,
/// a call made while a batch is loading returns without doing anything.
#[derive(Debug)]
pub struct CollectionLoader<C> {
    client: C,
    index: StaticIndex,
    batch_size: usize,
    progress: Mutex<Progress>,
}

impl<C: ClientTrait> CollectionLoader<C> {
    pub fn new(client: C, index: StaticIndex) -> Self {
        let phase = if index.is_empty() {
            LoadPhase::Exhausted
        } else {
            LoadPhase::Idle
        };

        Self {
            client,
            index,
            batch_size: BATCH_SIZE,
            progress: Mutex::new(Progress {
                collection: IndexMap::new(),
                cursor: 0,
                phase,
                error: None,
            }),
        }
    }

    /// Enrich `batch_size` references per batch, at least one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn index(&self) -> &StaticIndex {
        &self.index
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn phase(&self) -> LoadPhase {
        self.lock().phase
    }

    pub fn snapshot(&self) -> LoadState {
        let progress = self.lock();
        let index_size = self.index.len();

        LoadState {
            collection: progress.collection.values().cloned().collect(),
            cursor: progress.cursor,
            index_size,
            phase: progress.phase,
            is_loading: progress.phase == LoadPhase::Loading,
            has_more: progress.cursor < index_size,
            error: progress.error.clone(),
        }
    }

    /// Enrich the next batch of references and merge the results.
    ///
    /// Does nothing while another batch is loading or once the index is
    /// exhausted. Entries that fail to load are skipped for good,
    /// a batch that fails as a whole leaves the cursor in place so the
    /// next call retries it.
    #[instrument(skip(self), level = "debug")]
    pub async fn load_next_batch(&self) -> LoadState {
        match self.load_batch().await {
            Some(state) => state,
            None => self.snapshot(),
        }
    }

    /// Like [`CollectionLoader::load_next_batch`],
    /// but `None` if the call was a no-op.
    async fn load_batch(&self) -> Option<LoadState> {
        let batch = self.begin_batch()?;
        let start = batch.start;
        let end = (start + self.batch_size).min(self.index.len());
        let references = self.index.slice(start..end);

        let ids = match resolve_ids(references) {
            Ok(ids) => ids,
            Err(err) => {
                warn!(start, end, %err, "batch failed");
                self.fail_batch(batch, err);
                return Some(self.snapshot());
            },
        };

        debug!(start, end, "loading batch");
        // join_all yields results in input order, whatever order they complete in
        let entries = join_all(
            ids.iter()
                .zip(references)
                .map(|(id, reference)| self.enrich_entry(*id, reference, &batch.known)),
        )
        .await;

        self.finish_batch(batch, end, entries);
        Some(self.snapshot())
    }

    fn begin_batch(&self) -> Option<BatchGuard<'_>> {
        let mut progress = self.lock();
        match progress.phase {
            LoadPhase::Loading | LoadPhase::Exhausted => {
                trace!(phase = %progress.phase, "ignoring load request");
                return None;
            },
            LoadPhase::Idle | LoadPhase::Errored => {},
        }

        progress.phase = LoadPhase::Loading;
        progress.error = None;
        Some(BatchGuard {
            progress: &self.progress,
            start: progress.cursor,
            known: progress.collection.keys().copied().collect(),
            committed: false,
        })
    }

    async fn enrich_entry(
        &self,
        id: u32,
        reference: &CatalogEntryRef,
        known: &HashSet<u32>,
    ) -> Option<CatalogEntry> {
        if known.contains(&id) {
            trace!(id, "already loaded");
            return None;
        }

        match CatalogEntry::fetch(&self.client, id).await {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(id, identifier = %reference.identifier, %err, "skipping catalog entry");
                None
            },
        }
    }

    fn finish_batch(
        &self,
        mut batch: BatchGuard<'_>,
        end: usize,
        entries: Vec<Option<CatalogEntry>>,
    ) {
        batch.committed = true;
        let mut progress = self.lock();
        let before = progress.collection.len();

        for entry in entries.into_iter().flatten() {
            // also drops duplicates within this batch
            if progress.collection.contains_key(&entry.id()) {
                continue;
            }
            progress.collection.insert(entry.id(), Arc::new(entry));
        }

        progress.cursor = progress.cursor.max(end);
        progress.phase = if progress.cursor < self.index.len() {
            LoadPhase::Idle
        } else {
            LoadPhase::Exhausted
        };
        debug!(
            added = progress.collection.len() - before,
            cursor = progress.cursor,
            phase = %progress.phase,
            "batch complete"
        );
    }

    fn fail_batch(&self, mut batch: BatchGuard<'_>, err: LoadError) {
        batch.committed = true;
        let mut progress = self.lock();
        progress.phase = LoadPhase::Errored;
        progress.error = Some(Arc::new(err));
    }

    /// Snapshots after each batch, until the index is exhausted.
    ///
    /// A batch that fails as a whole yields its snapshot and ends the stream.
    /// The stream is empty if another batch is in flight when it is polled.
    pub fn batches(&self) -> impl Stream<Item = LoadState> + '_ {
        stream! {
            while let Some(state) = self.load_batch().await {
                let last = state.error.is_some() || !state.has_more;
                yield state;
                if last {
                    break;
                }
            }
        }
    }

    /// Load batches until the collection holds at least `count` entries,
    /// the index is exhausted, or a batch fails.
    pub async fn load_until(&self, count: usize) -> LoadState {
        loop {
            let state = self.snapshot();
            if state.collection.len() >= count || !state.has_more {
                return state;
            }

            match self.load_batch().await {
                Some(state) if state.error.is_none() => continue,
                Some(state) => return state,
                None => return self.snapshot(),
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        lock_progress(&self.progress)
    }
}

fn lock_progress(progress: &Mutex<Progress>) -> MutexGuard<'_, Progress> {
    // the lock is never held across an await or a panicking call
    progress.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The batch in flight.
///
/// Dropping it before the batch is committed, e.g. because the caller gave
/// up on the future, returns the loader to [`LoadPhase::Idle`] with the
/// cursor untouched, so the next call retries the same range.
struct BatchGuard<'a> {
    progress: &'a Mutex<Progress>,
    start: usize,
    known: HashSet<u32>,
    committed: bool,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut progress = lock_progress(self.progress);
        if progress.phase == LoadPhase::Loading {
            debug!(cursor = progress.cursor, "batch abandoned");
            progress.phase = LoadPhase::Idle;
        }
    }
}

fn resolve_ids(references: &[CatalogEntryRef]) -> Result<Vec<u32>, LoadError> {
    references
        .iter()
        .map(|reference| {
            reference.id().ok_or_else(|| LoadError::InvalidReference {
                identifier: reference.identifier.clone(),
                url: reference.resource_url.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::StreamExt;
    use pokedex_catalog::{MockClient, MockResponse};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn ids(state: &LoadState) -> Vec<u32> {
        state.collection.iter().map(|entry| entry.id()).collect()
    }

    /// A mock client with entries `1..=count` and a matching index.
    fn seeded(count: u32) -> (MockClient, StaticIndex) {
        let client = MockClient::default();
        for id in 1..=count {
            client.seed_entry(id, id);
        }
        let index = StaticIndex::generated(client.catalog_url(), count);
        (client, index)
    }

    #[tokio::test]
    async fn first_batch() {
        let (client, index) = seeded(30);
        let loader = CollectionLoader::new(client, index);

        let state = loader.load_next_batch().await;

        assert_eq!(ids(&state), (1..=20).collect::<Vec<_>>());
        assert_eq!(state.cursor, 20);
        assert_eq!(state.phase, LoadPhase::Idle);
        assert!(state.has_more);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn cursor_advances_until_exhausted() {
        let (client, index) = seeded(45);
        let loader = CollectionLoader::new(client, index);

        let mut cursors = vec![];
        let mut has_more = vec![];
        for _ in 0..3 {
            let state = loader.load_next_batch().await;
            cursors.push(state.cursor);
            has_more.push(state.has_more);
        }

        assert_eq!(cursors, vec![20, 40, 45]);
        assert_eq!(has_more, vec![true, true, false]);
        assert_eq!(loader.phase(), LoadPhase::Exhausted);
        assert_eq!(loader.snapshot().progress(), 100.0);
    }

    #[tokio::test]
    async fn failed_item_is_skipped() {
        let (client, index) = seeded(20);
        client.respond(client.details_url(3), MockResponse::Status(500));
        let loader = CollectionLoader::new(client, index);

        let state = loader.load_next_batch().await;

        assert_eq!(state.collection.len(), 19);
        assert!(!ids(&state).contains(&3));
        assert_eq!(state.cursor, 20);
        assert!(state.error.is_none());
        assert_eq!(state.phase, LoadPhase::Exhausted);
    }

    #[tokio::test]
    async fn network_failure_is_skipped() {
        let (client, index) = seeded(3);
        client.respond(
            client.species_url(2),
            MockResponse::Transport("connection reset".to_string()),
        );
        let loader = CollectionLoader::new(client, index);

        let state = loader.load_next_batch().await;
        assert_eq!(ids(&state), vec![1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn order_follows_index_not_completion() {
        let client = MockClient::default();
        // earlier entries answer later
        for id in 1..=5 {
            client.seed_entry_after(id, id, Some(Duration::from_millis(100 * u64::from(6 - id))));
        }
        let index = StaticIndex::generated(client.catalog_url(), 5);
        let loader = CollectionLoader::new(client, index);

        let state = loader.load_next_batch().await;
        assert_eq!(ids(&state), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_call_is_ignored() {
        let client = MockClient::default();
        for id in 1..=40 {
            client.seed_entry_after(id, id, Some(Duration::from_millis(50)));
        }
        let index = StaticIndex::generated(client.catalog_url(), 40);
        let loader = CollectionLoader::new(client.clone(), index);

        let (first, second) = tokio::join!(loader.load_next_batch(), loader.load_next_batch());

        assert!(second.is_loading);
        assert!(second.collection.is_empty());
        assert_eq!(first.cursor, 20);
        assert_eq!(first.collection.len(), 20);
        for id in 1..=20 {
            assert_eq!(client.calls(&client.details_url(id)), 1);
        }
        for id in 21..=40 {
            assert_eq!(client.calls(&client.details_url(id)), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_batch_is_retried() {
        let client = MockClient::default();
        for id in 1..=30 {
            client.seed_entry_after(id, id, Some(Duration::from_millis(50)));
        }
        let index = StaticIndex::generated(client.catalog_url(), 30);
        let loader = CollectionLoader::new(client.clone(), index);

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), loader.load_next_batch()).await;
        assert!(abandoned.is_err());
        assert_eq!(loader.phase(), LoadPhase::Idle);
        assert_eq!(loader.snapshot().cursor, 0);

        let state = loader.load_next_batch().await;
        assert_eq!(ids(&state), (1..=20).collect::<Vec<_>>());
        assert_eq!(state.cursor, 20);
        // every reference of the batch was requested again
        assert_eq!(client.calls(&client.details_url(1)), 2);
        assert_eq!(client.calls(&client.details_url(20)), 2);
    }

    #[tokio::test]
    async fn exhausted_loader_does_nothing() {
        let (client, index) = seeded(5);
        let loader = CollectionLoader::new(client.clone(), index);

        let exhausted = loader.load_next_batch().await;
        let calls = client.total_calls();
        let again = loader.load_next_batch().await;

        assert_eq!(client.total_calls(), calls);
        assert_eq!(ids(&again), ids(&exhausted));
        assert_eq!(again.cursor, exhausted.cursor);
        assert_eq!(again.phase, LoadPhase::Exhausted);
    }

    #[tokio::test]
    async fn invalid_reference_stalls_cursor() {
        let (client, _) = seeded(2);
        let index = StaticIndex::new(vec![
            CatalogEntryRef::new("1", client.details_url(1)),
            CatalogEntryRef::new("missingno", "https://mock.pokedex.test/api/v2/pokemon/missingno/"),
            CatalogEntryRef::new("2", client.details_url(2)),
        ]);
        let loader = CollectionLoader::new(client.clone(), index).with_batch_size(1);

        let first = loader.load_next_batch().await;
        assert_eq!(first.cursor, 1);

        let failed = loader.load_next_batch().await;
        assert_eq!(failed.phase, LoadPhase::Errored);
        assert_eq!(failed.cursor, 1);
        assert_eq!(ids(&failed), vec![1]);
        assert_eq!(
            failed.error.as_deref(),
            Some(&LoadError::InvalidReference {
                identifier: "missingno".to_string(),
                url: "https://mock.pokedex.test/api/v2/pokemon/missingno/".to_string(),
            })
        );

        // retried, and fails the same way
        let calls = client.total_calls();
        let retried = loader.load_next_batch().await;
        assert_eq!(retried.phase, LoadPhase::Errored);
        assert_eq!(retried.cursor, 1);
        assert_eq!(client.total_calls(), calls);
    }

    #[tokio::test]
    async fn empty_index_is_exhausted() {
        let loader = CollectionLoader::new(MockClient::default(), StaticIndex::default());

        let state = loader.load_next_batch().await;

        assert_eq!(state.phase, LoadPhase::Exhausted);
        assert!(!state.has_more);
        assert_eq!(state.progress(), 100.0);
        assert_eq!(loader.client().total_calls(), 0);
    }

    #[tokio::test]
    async fn batch_size_is_at_least_one() {
        let (client, index) = seeded(3);
        let loader = CollectionLoader::new(client, index).with_batch_size(0);

        assert_eq!(loader.batch_size(), 1);
        assert_eq!(loader.load_next_batch().await.cursor, 1);
    }

    #[tokio::test]
    async fn known_ids_are_not_fetched_again() {
        let client = MockClient::default();
        client.seed_entry(1, 1);
        client.seed_entry(2, 2);
        let index = StaticIndex::new(vec![
            CatalogEntryRef::new("1", client.details_url(1)),
            CatalogEntryRef::new("2", client.details_url(2)),
            CatalogEntryRef::new("1-again", format!("{}/", client.details_url(1))),
        ]);
        let loader = CollectionLoader::new(client.clone(), index).with_batch_size(2);

        loader.load_next_batch().await;
        let state = loader.load_next_batch().await;

        assert_eq!(ids(&state), vec![1, 2]);
        assert_eq!(client.calls(&client.details_url(1)), 1);
    }

    #[tokio::test]
    async fn batches_stream_until_exhausted() {
        let (client, index) = seeded(45);
        let loader = CollectionLoader::new(client, index);

        let cursors = loader
            .batches()
            .map(|state| state.cursor)
            .collect::<Vec<_>>()
            .await;

        assert_eq!(cursors, vec![20, 40, 45]);
        assert_eq!(loader.batches().count().await, 0);
    }

    #[tokio::test]
    async fn batches_stream_ends_on_error() {
        let index = StaticIndex::new(vec![CatalogEntryRef::new("bad", "not a url")]);
        let loader = CollectionLoader::new(MockClient::default(), index);

        let states = loader.batches().collect::<Vec<_>>().await;

        assert_eq!(states.len(), 1);
        assert!(states[0].error.is_some());
    }

    #[tokio::test]
    async fn load_until_stops_early() {
        let (client, index) = seeded(100);
        let loader = CollectionLoader::new(client, index);

        let state = loader.load_until(30).await;
        assert_eq!(state.collection.len(), 40);
        assert_eq!(state.cursor, 40);

        let state = loader.load_until(1000).await;
        assert_eq!(state.collection.len(), 100);
        assert!(!state.has_more);
    }

    proptest! {
        #[test]
        fn no_duplicates_and_index_order(
            refs in proptest::collection::vec(1u32..=10, 0..40),
            batch_size in 1usize..8,
        ) {
            let client = MockClient::default();
            for id in 1..=10 {
                client.seed_entry(id, id);
            }
            let index = StaticIndex::new(
                refs.iter()
                    .map(|id| CatalogEntryRef::new(id.to_string(), client.details_url(*id)))
                    .collect(),
            );
            let loader = CollectionLoader::new(client, index).with_batch_size(batch_size);

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let mut cursor = 0;
            let state = runtime.block_on(async {
                loop {
                    let state = loader.load_next_batch().await;
                    prop_assert!(state.cursor >= cursor);
                    cursor = state.cursor;
                    if !state.has_more {
                        break Ok(state);
                    }
                }
            })?;

            let mut expected = vec![];
            for id in &refs {
                if !expected.contains(id) {
                    expected.push(*id);
                }
            }
            prop_assert_eq!(ids(&state), expected);
            prop_assert_eq!(state.cursor, refs.len());
        }
    }
}
