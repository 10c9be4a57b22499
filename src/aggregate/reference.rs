use super::records::ClusterRow;
use super::table::read_table_dir;
use crate::error::ReferenceError;
use log::info;
use nalgebra::Point3;
use std::collections::HashMap;
use std::path::Path;

type Key = (u32, u64, u64);

/// Undistorted cluster positions keyed by (run, event, channel).
///
/// Built from the cluster table of a reference scenario. A key present more
/// than once means the table was not indexed by run/event/channel and is
/// rejected at load time.
#[derive(Debug, Default)]
pub struct TrueGeometryIndex {
    positions: HashMap<Key, Point3<f64>>,
}

impl TrueGeometryIndex {
    pub fn from_rows<'r>(
        rows: impl IntoIterator<Item = &'r ClusterRow>,
    ) -> Result<Self, ReferenceError> {
        let mut grouped: HashMap<Key, Vec<Point3<f64>>> = HashMap::new();
        for row in rows {
            grouped
                .entry((row.run, row.event, row.channel_id))
                .or_default()
                .push(row.position());
        }
        let mut positions = HashMap::with_capacity(grouped.len());
        for ((run, event, channel_id), found) in grouped {
            if found.len() != 1 {
                return Err(ReferenceError::DuplicateKey {
                    run,
                    event,
                    channel_id,
                    count: found.len(),
                });
            }
            positions.insert((run, event, channel_id), found[0]);
        }
        Ok(Self { positions })
    }

    /// Loads every `clusters_*.jsonl` table in `dir`.
    pub fn load_dir(dir: &Path) -> Result<Self, ReferenceError> {
        let (rows, shards) =
            read_table_dir::<ClusterRow>(dir, "clusters").map_err(ReferenceError::Io)?;
        let index = Self::from_rows(&rows)?;
        info!(
            "reference: {} clusters from {} tables in {}",
            index.len(),
            shards,
            dir.display()
        );
        Ok(index)
    }

    pub fn get(&self, run: u32, event: u64, channel_id: u64) -> Option<Point3<f64>> {
        self.positions.get(&(run, event, channel_id)).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
