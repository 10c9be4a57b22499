use super::types::{
    ChargedCandidate, Cluster, EventHeader, EventRecord, McParticle, PrimaryVertex, RawTrack,
};
use super::EventStore;
use crate::error::StoreError;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Event store replaying pre-recorded events.
#[derive(Default)]
pub struct MemoryEventStore {
    pending: VecDeque<EventRecord>,
    current: Option<LoadedEvent>,
}

struct LoadedEvent {
    record: EventRecord,
    links: HashMap<u32, Vec<u32>>,
    particles: HashMap<u32, usize>,
}

impl LoadedEvent {
    fn new(record: EventRecord) -> Self {
        let mut links: HashMap<u32, Vec<u32>> = HashMap::new();
        for link in &record.truth_links {
            links.entry(link.track_key).or_default().push(link.particle_key);
        }
        let particles = record
            .mc_particles
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.key, idx))
            .collect();
        Self {
            record,
            links,
            particles,
        }
    }
}

impl MemoryEventStore {
    pub fn from_events(events: impl IntoIterator<Item = EventRecord>) -> Self {
        Self {
            pending: events.into_iter().collect(),
            current: None,
        }
    }

    /// Reads a JSON Lines dump with one event per line.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: EventRecord = serde_json::from_str(&line).map_err(|source| StoreError::Parse {
                line: idx + 1,
                source,
            })?;
            events.push(record);
        }
        debug!("event store: loaded {} events from {}", events.len(), path.display());
        Ok(Self::from_events(events))
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn record(&self) -> Option<&EventRecord> {
        self.current.as_ref().map(|e| &e.record)
    }
}

impl EventStore for MemoryEventStore {
    fn advance(&mut self) -> Result<Option<EventHeader>, StoreError> {
        self.current = self.pending.pop_front().map(LoadedEvent::new);
        Ok(self.header())
    }

    fn header(&self) -> Option<EventHeader> {
        self.record().map(|r| r.header)
    }

    fn clusters(&self) -> &[Cluster] {
        self.record().map(|r| r.clusters.as_slice()).unwrap_or_default()
    }

    fn tracks(&self) -> &[RawTrack] {
        self.record().map(|r| r.tracks.as_slice()).unwrap_or_default()
    }

    fn truth_links(&self, track_key: u32) -> &[u32] {
        self.current
            .as_ref()
            .and_then(|e| e.links.get(&track_key))
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    fn mc_particle(&self, key: u32) -> Option<&McParticle> {
        let event = self.current.as_ref()?;
        event
            .particles
            .get(&key)
            .map(|&idx| &event.record.mc_particles[idx])
    }

    fn primary_vertices(&self) -> &[PrimaryVertex] {
        self.record().map(|r| r.primary_vertices.as_slice()).unwrap_or_default()
    }

    fn pions(&self) -> &[ChargedCandidate] {
        self.record().map(|r| r.pions.as_slice()).unwrap_or_default()
    }

    fn kaons(&self) -> &[ChargedCandidate] {
        self.record().map(|r| r.kaons.as_slice()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TruthLink;
    use nalgebra::{Point3, Vector3};
    use std::io::Write;

    fn event(n: u64) -> EventRecord {
        let mut e = EventRecord::new(7, n);
        e.clusters.push(Cluster {
            channel_id: n,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        });
        e.mc_particles.push(McParticle {
            key: 3,
            pid: 211,
            momentum: Vector3::new(0.0, 0.0, 1000.0),
            origin_vertex: Point3::origin(),
            end_vertices: Vec::new(),
            mother: None,
        });
        e.truth_links.push(TruthLink {
            track_key: 1,
            particle_key: 3,
        });
        e
    }

    #[test]
    fn advances_until_exhausted() {
        let mut store = MemoryEventStore::from_events([event(1), event(2)]);
        assert!(store.clusters().is_empty());
        assert_eq!(store.advance().unwrap().unwrap().event_number, 1);
        assert_eq!(store.truth_links(1), &[3]);
        assert_eq!(store.mc_particle(3).unwrap().pid, 211);
        assert!(store.truth_links(2).is_empty());
        assert_eq!(store.advance().unwrap().unwrap().event_number, 2);
        assert_eq!(store.clusters()[0].channel_id, 2);
        assert!(store.advance().unwrap().is_none());
        assert!(store.clusters().is_empty());
        assert!(store.header().is_none());
    }

    #[test]
    fn open_reports_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "{}", serde_json::to_string(&event(1)).unwrap()).unwrap();
        writeln!(f, "{{not json").unwrap();
        drop(f);
        let err = MemoryEventStore::open(&path).err().unwrap();
        assert!(matches!(err, StoreError::Parse { line: 2, .. }));
    }
}
