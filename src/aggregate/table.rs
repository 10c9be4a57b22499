use super::records::{ClusterRow, ParticleRow, ResidualRow, TrackRow, VertexRow};
use crate::error::AggregateError;
use crate::io::{append_jsonl, read_jsonl, truncate_file};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Output tables of one scenario shard:
/// `{output_dir}/{scenario}/{name}_{job_id}.jsonl`.
#[derive(Clone, Debug)]
pub struct TableSet {
    pub clusters: PathBuf,
    pub tracks: PathBuf,
    pub residuals: PathBuf,
    pub particles: PathBuf,
    pub vertices: PathBuf,
}

impl TableSet {
    pub fn new(output_dir: &Path, scenario: &str, job_id: u32) -> Self {
        let dir = output_dir.join(scenario);
        let path = |name: &str| dir.join(format!("{name}_{job_id}.jsonl"));
        Self {
            clusters: path("clusters"),
            tracks: path("tracks"),
            residuals: path("residuals"),
            particles: path("particles"),
            vertices: path("vertices"),
        }
    }

    pub fn paths(&self) -> [&Path; 5] {
        [
            self.clusters.as_path(),
            self.tracks.as_path(),
            self.residuals.as_path(),
            self.particles.as_path(),
            self.vertices.as_path(),
        ]
    }

    /// Empties every table so a rerun starts from zero rows.
    pub fn truncate_all(&self) -> Result<(), AggregateError> {
        for path in self.paths() {
            truncate_file(path).map_err(|message| table_error(path, message))?;
        }
        Ok(())
    }
}

fn table_error(path: &Path, message: String) -> AggregateError {
    AggregateError::Table {
        path: path.display().to_string(),
        message,
    }
}

fn append<T: Serialize>(path: &Path, rows: &mut Vec<T>) -> Result<usize, AggregateError> {
    let written = append_jsonl(path, rows).map_err(|message| table_error(path, message))?;
    rows.clear();
    Ok(written)
}

/// Reads every `{name}_*.jsonl` shard in `dir`, in file-name order.
///
/// Returns the rows and the number of shards read.
pub fn read_table_dir<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<(Vec<T>, usize), String> {
    let entries =
        std::fs::read_dir(dir).map_err(|e| format!("Failed to list {}: {e}", dir.display()))?;
    let prefix = format!("{name}_");
    let mut shards = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| format!("Failed to list {}: {e}", dir.display()))?
            .path();
        let is_shard = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".jsonl"));
        if is_shard {
            shards.push(path);
        }
    }
    shards.sort();
    let mut rows = Vec::new();
    for path in &shards {
        rows.extend(read_jsonl::<T>(path)?);
    }
    Ok((rows, shards.len()))
}

/// Rows accumulated since the last flush.
#[derive(Debug, Default)]
pub struct RowBuffers {
    pub clusters: Vec<ClusterRow>,
    pub tracks: Vec<TrackRow>,
    pub residuals: Vec<ResidualRow>,
    pub particles: Vec<ParticleRow>,
    pub vertices: Vec<VertexRow>,
}

/// Row counts written by one flush.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushCounts {
    pub clusters: usize,
    pub tracks: usize,
    pub residuals: usize,
    pub particles: usize,
    pub vertices: usize,
}

/// Buffer lengths before an event was emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferMark {
    clusters: usize,
    tracks: usize,
    residuals: usize,
    particles: usize,
    vertices: usize,
}

impl RowBuffers {
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
            && self.tracks.is_empty()
            && self.residuals.is_empty()
            && self.particles.is_empty()
            && self.vertices.is_empty()
    }

    pub fn mark(&self) -> BufferMark {
        BufferMark {
            clusters: self.clusters.len(),
            tracks: self.tracks.len(),
            residuals: self.residuals.len(),
            particles: self.particles.len(),
            vertices: self.vertices.len(),
        }
    }

    /// Drops every row pushed after `mark`.
    pub fn rollback(&mut self, mark: BufferMark) {
        self.clusters.truncate(mark.clusters);
        self.tracks.truncate(mark.tracks);
        self.residuals.truncate(mark.residuals);
        self.particles.truncate(mark.particles);
        self.vertices.truncate(mark.vertices);
    }

    /// Appends every buffer to its table and clears it. A buffer is only
    /// cleared once its rows are on disk.
    pub fn flush(&mut self, tables: &TableSet) -> Result<FlushCounts, AggregateError> {
        Ok(FlushCounts {
            clusters: append(&tables.clusters, &mut self.clusters)?,
            tracks: append(&tables.tracks, &mut self.tracks)?,
            residuals: append(&tables.residuals, &mut self.residuals)?,
            particles: append(&tables.particles, &mut self.particles)?,
            vertices: append(&tables.vertices, &mut self.vertices)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(channel_id: u64) -> ClusterRow {
        ClusterRow {
            run: 1,
            event: 1,
            channel_id,
            module: 0,
            station: 0,
            sensor: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    #[test]
    fn paths_follow_layout() {
        let tables = TableSet::new(Path::new("/out"), "tip_y=-100um", 3);
        assert_eq!(tables.residuals, Path::new("/out/tip_y=-100um/residuals_3.jsonl"));
    }

    #[test]
    fn flush_appends_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let tables = TableSet::new(dir.path(), "s", 0);
        tables.truncate_all().unwrap();
        let mut buffers = RowBuffers::default();
        buffers.clusters.push(cluster(1));
        let counts = buffers.flush(&tables).unwrap();
        assert_eq!(counts.clusters, 1);
        assert!(buffers.is_empty());
        buffers.clusters.push(cluster(2));
        buffers.flush(&tables).unwrap();
        let rows: Vec<ClusterRow> = read_jsonl(&tables.clusters).unwrap();
        assert_eq!(rows.iter().map(|r| r.channel_id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(read_jsonl::<TrackRow>(&tables.tracks).unwrap().is_empty());
    }

    #[test]
    fn rollback_keeps_rows_before_mark() {
        let mut buffers = RowBuffers::default();
        buffers.clusters.push(cluster(1));
        let mark = buffers.mark();
        buffers.clusters.push(cluster(2));
        buffers.clusters.push(cluster(3));
        buffers.rollback(mark);
        assert_eq!(buffers.clusters.len(), 1);
        assert_eq!(buffers.mark(), mark);
    }

    #[test]
    fn reads_all_shards_of_one_table() {
        let dir = tempfile::tempdir().unwrap();
        append_jsonl(&dir.path().join("clusters_1.jsonl"), &[cluster(2)]).unwrap();
        append_jsonl(&dir.path().join("clusters_0.jsonl"), &[cluster(1)]).unwrap();
        append_jsonl(&dir.path().join("tracks_0.jsonl"), &[cluster(9)]).unwrap();
        let (rows, shards) = read_table_dir::<ClusterRow>(dir.path(), "clusters").unwrap();
        assert_eq!(shards, 2);
        assert_eq!(rows.iter().map(|r| r.channel_id).collect::<Vec<_>>(), vec![1, 2]);
    }
}
