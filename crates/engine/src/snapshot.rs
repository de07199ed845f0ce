//! Graph snapshots
//!
//! A snapshot is the serialized hand-off between pipeline stages. Once
//! written it is never modified: a new run writes a new file.

use crate::citation::CitationGraph;
use chrono::{DateTime, Utc};
use refgraph_common::errors::{AppError, Result};
use refgraph_common::{PaperId, Year};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: PaperId,
    pub title: String,
    pub venue: String,
    pub year: Year,
    pub depth: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub nodes: usize,
    pub edges: usize,
    pub missing: usize,
    pub frontier_citations: usize,
    pub self_loops: usize,
    pub deepest_level: Option<u32>,
}

/// Serialized citation graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub seed: PaperId,
    pub max_depth: u32,

    /// Hex SHA-256 over nodes, edges and missing
    pub digest: String,

    pub nodes: Vec<SnapshotNode>,
    pub edges: Vec<(PaperId, PaperId)>,
    pub missing: Vec<PaperId>,
    pub stats: SnapshotStats,
}

impl GraphSnapshot {
    pub fn from_graph(graph: &CitationGraph) -> Result<Self> {
        let nodes: Vec<SnapshotNode> = graph
            .nodes()
            .map(|node| SnapshotNode {
                id: node.id.clone(),
                title: node.title.clone(),
                venue: node.venue.clone(),
                year: node.year,
                depth: node.depth,
            })
            .collect();
        let edges: Vec<(PaperId, PaperId)> = graph
            .edges()
            .map(|(citing, cited)| (citing.clone(), cited.clone()))
            .collect();
        let missing: Vec<PaperId> = graph.missing().iter().cloned().collect();

        let digest = content_digest(&nodes, &edges, &missing)?;
        let stats = SnapshotStats {
            nodes: nodes.len(),
            edges: edges.len(),
            missing: missing.len(),
            frontier_citations: graph.frontier_citations(),
            self_loops: graph.self_loop_count(),
            deepest_level: graph.deepest_level(),
        };

        Ok(Self {
            run_id: Uuid::now_v7(),
            generated_at: Utc::now(),
            seed: graph.seed().clone(),
            max_depth: graph.max_depth(),
            digest,
            nodes,
            edges,
            missing,
            stats,
        })
    }

    /// Recompute the digest and compare it with the stored one
    pub fn verify_digest(&self) -> Result<bool> {
        Ok(content_digest(&self.nodes, &self.edges, &self.missing)? == self.digest)
    }

    /// `refgraph_<seed>_<digest prefix>.json`
    pub fn file_name(&self) -> String {
        let seed: String = self
            .seed
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        format!("refgraph_{}_{}.json", seed, &self.digest[..12.min(self.digest.len())])
    }

    /// Write into `dir`, leaving an existing snapshot of the same content untouched
    pub async fn write(&self, dir: &Path, pretty: bool) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(self.file_name());

        if tokio::fs::try_exists(&path).await? {
            info!(path = %path.display(), digest = %self.digest, "Identical snapshot already present");
            return Ok(path);
        }

        let body = if pretty {
            serde_json::to_vec_pretty(self)?
        } else {
            serde_json::to_vec(self)?
        };

        let tmp = dir.join(format!(".{}.{}.tmp", self.file_name(), self.run_id));
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::rename(&tmp, &path).await?;

        info!(path = %path.display(), bytes = body.len(), nodes = self.stats.nodes, "Snapshot written");
        Ok(path)
    }

    pub async fn read(path: &Path) -> Result<Self> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::SnapshotNotFound {
                    path: path.display().to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: Self = serde_json::from_slice(&raw)?;
        debug!(path = %path.display(), run_id = %snapshot.run_id, "Snapshot read");
        Ok(snapshot)
    }
}

fn content_digest(nodes: &[SnapshotNode], edges: &[(PaperId, PaperId)], missing: &[PaperId]) -> Result<String> {
    let canonical = serde_json::to_vec(&(nodes, edges, missing))?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(hex::encode(hasher.finalize()))
}
