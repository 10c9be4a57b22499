//! Analysis session: the one owner of per-job state.
//!
//! The session holds the event store, the fitting tools, the cluster cache
//! and the event counter. Advancing to a new event is the only place the
//! cache is reset.

use crate::error::StoreError;
use crate::event::{Cluster, EventHeader, EventStore};
use crate::residual::{ParabolicExtrapolator, ResidualFitter, TrackExtrapolator};
use crate::track::{ClusterCache, TrackView};
use crate::vertex::{LinearVertexFitter, VertexFitter};
use log::debug;

pub struct AnalysisSession<S, E = ParabolicExtrapolator, V = LinearVertexFitter> {
    store: S,
    residuals: ResidualFitter<E>,
    vertices: V,
    cache: ClusterCache,
    events_processed: usize,
    header: Option<EventHeader>,
}

/// Borrowed view of the session for processing the current event.
pub struct EventContext<'s, S, E, V> {
    pub store: &'s S,
    pub residuals: &'s ResidualFitter<E>,
    pub vertices: &'s V,
    cache: &'s mut ClusterCache,
}

impl<S, E, V> AnalysisSession<S, E, V>
where
    S: EventStore,
    E: TrackExtrapolator,
    V: VertexFitter,
{
    pub fn new(store: S, residuals: ResidualFitter<E>, vertices: V) -> Self {
        Self {
            store,
            residuals,
            vertices,
            cache: ClusterCache::new(),
            events_processed: 0,
            header: None,
        }
    }

    /// Moves to the next event and drops the cluster index of the previous one.
    pub fn advance(&mut self) -> Result<Option<EventHeader>, StoreError> {
        self.cache.invalidate();
        self.header = self.store.advance()?;
        if let Some(header) = self.header {
            self.events_processed += 1;
            debug!(
                "session: event {} (run {}, #{})",
                header.event_number, header.run_number, self.events_processed
            );
        }
        Ok(self.header)
    }

    pub fn header(&self) -> Option<EventHeader> {
        self.header
    }

    pub fn events_processed(&self) -> usize {
        self.events_processed
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cluster(&mut self, channel_id: u64) -> Option<Cluster> {
        self.cache.lookup(self.store.clusters(), channel_id)
    }

    pub fn cache(&self) -> &ClusterCache {
        &self.cache
    }

    pub fn event(&mut self) -> EventContext<'_, S, E, V> {
        EventContext {
            store: &self.store,
            residuals: &self.residuals,
            vertices: &self.vertices,
            cache: &mut self.cache,
        }
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

impl<'s, S: EventStore, E, V> EventContext<'s, S, E, V> {
    pub fn cluster(&mut self, channel_id: u64) -> Option<Cluster> {
        self.cache.lookup(self.store.clusters(), channel_id)
    }

    pub fn track_views(&self) -> Vec<TrackView<'s, S>> {
        let store: &'s S = self.store;
        store
            .tracks()
            .iter()
            .map(|raw| TrackView::new(raw, store))
            .collect()
    }
}
