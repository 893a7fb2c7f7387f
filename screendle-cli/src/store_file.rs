//! JSON snapshot store: catalog plus persisted schedule in one file.

use anyhow::{Context, Result};
use screendle_core::{
    AssignmentStore, CandidateMovie, ClassicAssignment, DateSpan, ExternalId, MemoryStore, PoolProvider,
    ScalesRound,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    movies: Vec<CandidateMovie>,
    #[serde(default)]
    classic: Vec<ClassicAssignment>,
    #[serde(default)]
    scales: Vec<ScalesRound>,
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonStore {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: MemoryStore::default(),
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read {}", path.display()))?;
        let snap: Snapshot = serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        debug!(
            path = %path.display(),
            movies = snap.movies.len(),
            classic = snap.classic.len(),
            scales = snap.scales.len(),
            "store loaded"
        );
        let inner = MemoryStore::new(snap.movies)
            .with_classic(snap.classic)
            .with_scales(snap.scales);
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    /// Load if present, otherwise start empty at `path`.
    pub async fn load_or_empty(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::empty(path))
        }
    }

    /// Write via a temp file and rename so a crash never leaves half a store.
    pub async fn save(&self) -> Result<()> {
        let snap = Snapshot {
            movies: self.inner.catalog.clone(),
            classic: self.inner.classic.values().copied().collect(),
            scales: self.inner.scales.values().copied().collect(),
        };
        let json = serde_json::to_string_pretty(&snap).context("serialize store")?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn catalog(&self) -> &[CandidateMovie] {
        &self.inner.catalog
    }

    pub fn replace_catalog(&mut self, movies: Vec<CandidateMovie>) {
        self.inner.catalog = movies;
    }

    /// Titles by id, for rendering output.
    pub fn titles(&self) -> HashMap<ExternalId, &str> {
        self.inner
            .catalog
            .iter()
            .map(|m| (m.external_id, m.title.as_str()))
            .collect()
    }
}

impl PoolProvider for JsonStore {
    fn eligible_pool(&self) -> Result<Vec<CandidateMovie>> {
        self.inner.eligible_pool()
    }
}

impl AssignmentStore for JsonStore {
    fn classic_in(&self, span: DateSpan) -> Result<Vec<ClassicAssignment>> {
        self.inner.classic_in(span)
    }

    fn scales_in(&self, span: DateSpan) -> Result<Vec<ScalesRound>> {
        self.inner.scales_in(span)
    }

    fn insert_classic(&mut self, assignment: ClassicAssignment) -> Result<bool> {
        self.inner.insert_classic(assignment)
    }

    fn insert_scales(&mut self, round: ScalesRound) -> Result<bool> {
        self.inner.insert_scales(round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("screendle-store-{}", std::process::id()));
        let path = dir.join("store.json");

        let mut store = JsonStore::empty(&path);
        store.replace_catalog(vec![CandidateMovie::new(155, 9.0).with_title("The Dark Knight")]);
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        store.insert_classic(ClassicAssignment { date, movie: 155 }).unwrap();
        store
            .insert_scales(ScalesRound { date, round: 1, movie_a: 155, movie_b: 238 })
            .unwrap();
        store.save().await.unwrap();

        let back = JsonStore::load(&path).await.unwrap();
        assert_eq!(back.catalog().len(), 1);
        assert_eq!(back.titles().get(&155).copied(), Some("The Dark Knight"));
        let day = DateSpan { start: date, end: date };
        assert_eq!(back.classic_in(day).unwrap().len(), 1);
        assert_eq!(back.scales_in(day).unwrap().len(), 1);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let store = JsonStore::load_or_empty("/nonexistent/screendle/store.json").await.unwrap();
        assert!(store.catalog().is_empty());
        assert!(JsonStore::load("/nonexistent/screendle/store.json").await.is_err());
    }
}
