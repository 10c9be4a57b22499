use crate::event::Cluster;
use log::debug;
use std::collections::HashMap;

/// Channel-keyed cluster index for the current event.
///
/// Built on the first lookup after an [`invalidate`](ClusterCache::invalidate)
/// and dropped on the next one, so a lookup never sees clusters of another
/// event.
#[derive(Debug, Default)]
pub struct ClusterCache {
    by_channel: Option<HashMap<u64, Cluster>>,
}

impl ClusterCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.by_channel = None;
    }

    pub fn is_primed(&self) -> bool {
        self.by_channel.is_some()
    }

    pub fn lookup(&mut self, clusters: &[Cluster], channel_id: u64) -> Option<Cluster> {
        let index = self.by_channel.get_or_insert_with(|| {
            debug!("cluster cache: indexing {} clusters", clusters.len());
            clusters.iter().map(|c| (c.channel_id, *c)).collect()
        });
        index.get(&channel_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(channel_id: u64, z: f64) -> Cluster {
        Cluster {
            channel_id,
            x: 0.0,
            y: 0.0,
            z,
        }
    }

    #[test]
    fn primes_lazily() {
        let mut cache = ClusterCache::new();
        assert!(!cache.is_primed());
        let clusters = [cluster(1, 5.0)];
        assert_eq!(cache.lookup(&clusters, 1).unwrap().z, 5.0);
        assert!(cache.is_primed());
        assert!(cache.lookup(&clusters, 2).is_none());
    }

    #[test]
    fn invalidation_forgets_previous_event() {
        let mut cache = ClusterCache::new();
        let first = [cluster(1, 5.0)];
        let second = [cluster(2, 7.0)];
        assert!(cache.lookup(&first, 1).is_some());
        cache.invalidate();
        assert!(cache.lookup(&second, 1).is_none());
        assert_eq!(cache.lookup(&second, 2).unwrap().z, 7.0);
    }
}
