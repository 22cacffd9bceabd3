//! Project-level analysis: table lookup, profiling and persistence.
//!
//! A project can have an uploaded table and a table of Salla orders kept
//! in a store. [`ProjectAnalyzer`] profiles whichever exist and hands the
//! result to a [`ProfileSink`].
//!
//! # Lookup
//!
//! ```text
//! ProjectAnalyzer ──► CachedTableStore ──hit──► Arc<Table>
//!                          │
//!                         miss
//!                          ▼
//!                     TableStore::load_table ──► cache ──► Arc<Table>
//! ```
//!
//! Collaborators are injected at construction. Nothing here is global.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ProfilingError, Result, ResultExt};
use crate::profiler::TableProfiler;
use crate::sanitize::to_json_value;
use crate::table::Table;
use crate::types::DatasetProfile;

/// Source label of the stored order table.
pub const STORED_SOURCE: &str = "Salla";

/// Identifier of a chat project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A table with the label it is reported under.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTable {
    pub source: String,
    pub table: Table,
}

impl NamedTable {
    pub fn new(source: impl Into<String>, table: Table) -> Self {
        Self {
            source: source.into(),
            table,
        }
    }
}

/// Profiles of every dataset of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub project_id: ProjectId,
    pub dataframes: Vec<DatasetProfile>,
}

impl ProjectAnalysis {
    pub fn is_empty(&self) -> bool {
        self.dataframes.is_empty()
    }
}

// ============================================================================
// TABLE STORES
// ============================================================================

/// Persistent tier holding one stored table per project.
pub trait TableStore: Send + Sync {
    /// Load the stored table, `Ok(None)` when the project has none.
    fn load_table(&self, project_id: ProjectId) -> Result<Option<Table>>;
}

/// Table store backed by a map, for tests and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryTableStore {
    tables: RwLock<HashMap<ProjectId, Table>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, project_id: ProjectId, table: Table) {
        self.tables.write().insert(project_id, table);
    }

    pub fn remove(&self, project_id: ProjectId) -> Option<Table> {
        self.tables.write().remove(&project_id)
    }
}

impl TableStore for InMemoryTableStore {
    fn load_table(&self, project_id: ProjectId) -> Result<Option<Table>> {
        Ok(self.tables.read().get(&project_id).cloned())
    }
}

/// Read-through session cache in front of a [`TableStore`].
#[derive(Debug)]
pub struct CachedTableStore<S> {
    store: S,
    cache: RwLock<HashMap<ProjectId, Arc<Table>>>,
}

impl<S: TableStore> CachedTableStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Cached table, loading from the store on a miss.
    pub fn get(&self, project_id: ProjectId) -> Result<Option<Arc<Table>>> {
        if let Some(table) = self.cache.read().get(&project_id) {
            debug!("Table cache hit for project {}", project_id);
            return Ok(Some(Arc::clone(table)));
        }

        let Some(table) = self
            .store
            .load_table(project_id)
            .context(format!("Failed to load table for project {project_id}"))?
        else {
            return Ok(None);
        };

        debug!("Table cache miss for project {}, loaded from store", project_id);
        let table = Arc::new(table);
        // Another caller may have filled the slot meanwhile; keep theirs
        let mut cache = self.cache.write();
        let entry = cache.entry(project_id).or_insert(table);
        Ok(Some(Arc::clone(entry)))
    }

    /// Replace the cached table for a project.
    pub fn insert(&self, project_id: ProjectId, table: Table) -> Arc<Table> {
        let table = Arc::new(table);
        self.cache.write().insert(project_id, Arc::clone(&table));
        table
    }

    /// Drop the cached table, returning whether one was cached.
    pub fn evict(&self, project_id: ProjectId) -> bool {
        self.cache.write().remove(&project_id).is_some()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

// ============================================================================
// PROFILE SINKS
// ============================================================================

/// Persistence for project analyses.
pub trait ProfileSink: Send + Sync {
    fn save_analysis(&self, analysis: &ProjectAnalysis) -> Result<()>;
    fn load_analysis(&self, project_id: ProjectId) -> Result<Option<ProjectAnalysis>>;
}

/// Profile sink kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryProfileSink {
    analyses: RwLock<HashMap<ProjectId, ProjectAnalysis>>,
}

impl InMemoryProfileSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileSink for InMemoryProfileSink {
    fn save_analysis(&self, analysis: &ProjectAnalysis) -> Result<()> {
        self.analyses
            .write()
            .insert(analysis.project_id, analysis.clone());
        Ok(())
    }

    fn load_analysis(&self, project_id: ProjectId) -> Result<Option<ProjectAnalysis>> {
        Ok(self.analyses.read().get(&project_id).cloned())
    }
}

/// Profile sink writing one `project_<id>.json` file per project.
#[derive(Debug, Clone)]
pub struct JsonFileProfileSink {
    dir: PathBuf,
}

impl JsonFileProfileSink {
    /// Use `dir` as the store, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            ProfilingError::Io(e).with_context(format!("Failed to create {}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, project_id: ProjectId) -> PathBuf {
        self.dir.join(format!("project_{}.json", project_id))
    }
}

impl ProfileSink for JsonFileProfileSink {
    fn save_analysis(&self, analysis: &ProjectAnalysis) -> Result<()> {
        let path = self.path_for(analysis.project_id);
        let json = serde_json::to_string_pretty(&to_json_value(analysis))?;
        std::fs::write(&path, json).map_err(|e| {
            ProfilingError::Io(e).with_context(format!("Failed to write {}", path.display()))
        })?;
        debug!("Saved analysis to {}", path.display());
        Ok(())
    }

    fn load_analysis(&self, project_id: ProjectId) -> Result<Option<ProjectAnalysis>> {
        let path = self.path_for(project_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let analysis = serde_json::from_str(&content)
            .map_err(|e| ProfilingError::Json(e).with_context(format!("Corrupt {}", path.display())))?;
        Ok(Some(analysis))
    }
}

// ============================================================================
// ANALYZER
// ============================================================================

/// Result of [`ProjectAnalyzer::analyze_and_store`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAnalysis {
    pub analysis: ProjectAnalysis,
    /// False when there was nothing to analyze.
    pub stored: bool,
}

/// Profiles a project's datasets and persists the result.
pub struct ProjectAnalyzer<S, P> {
    profiler: TableProfiler,
    tables: CachedTableStore<S>,
    sink: P,
}

impl<S: TableStore, P: ProfileSink> ProjectAnalyzer<S, P> {
    pub fn new(profiler: TableProfiler, store: S, sink: P) -> Self {
        Self {
            profiler,
            tables: CachedTableStore::new(store),
            sink,
        }
    }

    pub fn tables(&self) -> &CachedTableStore<S> {
        &self.tables
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    /// Profile the upload (if any) and the project's stored table (if any).
    ///
    /// Empty tables are skipped. A failing store is logged and the stored
    /// table left out.
    pub fn analyze(&self, project_id: ProjectId, upload: Option<NamedTable>) -> ProjectAnalysis {
        let mut dataframes = Vec::new();

        if let Some(upload) = upload {
            if upload.table.is_empty() {
                debug!("Skipping empty upload '{}'", upload.source);
            } else {
                dataframes.push(DatasetProfile {
                    profile: self.profiler.profile(&upload.table),
                    source: upload.source,
                });
            }
        }

        match self.tables.get(project_id) {
            Ok(Some(table)) if !table.is_empty() => dataframes.push(DatasetProfile {
                source: STORED_SOURCE.to_string(),
                profile: self.profiler.profile(&table),
            }),
            Ok(_) => debug!("No stored table for project {}", project_id),
            Err(e) => warn!("Skipping stored table for project {}: {}", project_id, e),
        }

        info!(
            "Analyzed {} dataset(s) for project {}",
            dataframes.len(),
            project_id
        );
        ProjectAnalysis {
            project_id,
            dataframes,
        }
    }

    /// Analyze and persist when at least one dataset was profiled.
    pub fn analyze_and_store(
        &self,
        project_id: ProjectId,
        upload: Option<NamedTable>,
    ) -> Result<StoredAnalysis> {
        let analysis = self.analyze(project_id, upload);
        if analysis.is_empty() {
            warn!("No datasets to analyze for project {}", project_id);
            return Ok(StoredAnalysis {
                analysis,
                stored: false,
            });
        }

        self.sink
            .save_analysis(&analysis)
            .context(format!("Failed to save analysis for project {project_id}"))?;
        Ok(StoredAnalysis {
            analysis,
            stored: true,
        })
    }
}
