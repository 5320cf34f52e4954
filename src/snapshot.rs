use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::world::{World, WorldSnapshot};

/// On-disk form of a snapshot: the world projection plus when it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub world: WorldSnapshot,
}

/// Writes `<dir>/<scenario>/tick_NNNNNN.json` every `interval_ticks` ticks.
/// An interval of 0 disables snapshots.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval_ticks: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval_ticks: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval_ticks,
        }
    }

    pub fn is_due(&self, tick: u64) -> bool {
        self.interval_ticks > 0 && tick > 0 && tick % self.interval_ticks == 0
    }

    pub fn maybe_write(&self, world: &World, scenario: &str) -> Result<Option<PathBuf>> {
        if !self.is_due(world.tick()) {
            return Ok(None);
        }
        self.write(world, scenario).map(Some)
    }

    pub fn write(&self, world: &World, scenario: &str) -> Result<PathBuf> {
        let dir = self.dir.join(scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create snapshot directory {}", dir.display()))?;
        let path = dir.join(format!("tick_{:06}.json", world.tick()));
        let record = SnapshotRecord {
            generated_at: Utc::now(),
            world: world.snapshot(scenario),
        };
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&path, json)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        info!(tick = world.tick(), path = %path.display(), "snapshot written");
        Ok(path)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<SnapshotRecord> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{climate::ClimateConfig, materials::MaterialTable};

    #[test]
    fn test_interval_schedule() {
        let writer = SnapshotWriter::new("unused", 10);
        assert!(!writer.is_due(0));
        assert!(!writer.is_due(9));
        assert!(writer.is_due(10));
        assert!(!writer.is_due(11));
        assert!(writer.is_due(20));
        assert!(!SnapshotWriter::new("unused", 0).is_due(10));
    }

    #[test]
    fn test_written_snapshot_reads_back() {
        let temp = tempfile::tempdir().unwrap();
        let mut world = World::new(3, ClimateConfig::default(), MaterialTable::default()).unwrap();
        for _ in 0..4 {
            world.advance_time();
        }
        let writer = SnapshotWriter::new(temp.path(), 2);
        let path = writer.maybe_write(&world, "unit").unwrap().unwrap();
        assert_eq!(path, temp.path().join("unit").join("tick_000004.json"));

        let record = SnapshotWriter::read(&path).unwrap();
        assert_eq!(record.world.tick, 4);
        assert_eq!(record.world.scenario, "unit");
        assert_eq!(record.world.tiles.len(), 9);
    }
}
