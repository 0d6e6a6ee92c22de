// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{
    Annotation, AnnotationId, AnnotationKind, AnnotationSet, BranchStatus, Edge, EdgeProvenance,
    MergeDecision, NodeRecord, ProofreadGraph, SegmentId, Session, VoxelPoint,
};

const SNAPSHOT_PREFIX: &str = "review-";
const SNAPSHOT_SUFFIX: &str = ".json";

fn snapshot_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^review-(\d+)\.json$").expect("hard-coded snapshot name pattern is valid")
    })
}

/// One persisted moment of a review session.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub session: Session,
    /// Where the operator's cursor was when the snapshot was taken, so the
    /// next run can resume at the same spot.
    pub last_position: Option<VoxelPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to stable
    /// storage where possible. Exact guarantees are platform/filesystem-dependent.
    Durable,
}

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidSnapshot {
        path: PathBuf,
        reason: String,
    },
    SymlinkRefused {
        path: PathBuf,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::InvalidSnapshot { path, reason } => {
                write!(f, "invalid snapshot at {path:?}: {reason}")
            }
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidSnapshot { .. } => None,
            Self::SymlinkRefused { .. } => None,
        }
    }
}

/// A directory of timestamped session snapshots, newest file wins on reload.
#[derive(Debug, Clone)]
pub struct ReviewFolder {
    root: PathBuf,
    durability: WriteDurability,
}

impl ReviewFolder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), durability: WriteDurability::default() }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    /// Persists a snapshot under `review-<unix-millis>.json` and returns the
    /// path written.
    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<PathBuf, StoreError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let path = self.root.join(format!("{SNAPSHOT_PREFIX}{millis}{SNAPSHOT_SUFFIX}"));

        let json = snapshot_to_json(snapshot);
        let mut contents = serde_json::to_vec_pretty(&json)
            .map_err(|source| StoreError::Json { path: path.clone(), source })?;
        contents.push(b'\n');

        write_atomic(&self.root, &path, &contents, self.durability)?;
        Ok(path)
    }

    /// The snapshot file with the highest embedded timestamp, if any.
    pub fn latest_snapshot_path(&self) -> Result<Option<PathBuf>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io { path: self.root.clone(), source });
            }
        };

        let mut latest: Option<(u128, PathBuf)> = None;
        for entry in entries {
            let entry =
                entry.map_err(|source| StoreError::Io { path: self.root.clone(), source })?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            let Some(captures) = snapshot_name_regex().captures(name) else {
                continue;
            };
            let Ok(millis) = captures[1].parse::<u128>() else {
                continue;
            };
            if latest.as_ref().map_or(true, |(newest, _)| millis > *newest) {
                latest = Some((millis, entry.path()));
            }
        }
        Ok(latest.map(|(_, path)| path))
    }

    /// Loads the most recent snapshot, or `None` when the folder holds none.
    pub fn load_latest(&self) -> Result<Option<Snapshot>, StoreError> {
        match self.latest_snapshot_path()? {
            Some(path) => self.load_snapshot(&path).map(Some),
            None => Ok(None),
        }
    }

    pub fn load_snapshot(&self, path: &Path) -> Result<Snapshot, StoreError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
        let json: SnapshotJson = serde_json::from_str(&contents)
            .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;
        snapshot_from_json(json, path)
    }
}

// JSON DTOs. The model stays serde-free; everything on disk goes through
// these.

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotJson {
    #[serde(default)]
    last_position: Option<[i64; 3]>,
    #[serde(default)]
    nodes: Vec<NodeJson>,
    #[serde(default)]
    edges: Vec<EdgeJson>,
    #[serde(default)]
    annotations: Vec<AnnotationJson>,
    #[serde(default)]
    merges_to_apply: Vec<MergeJson>,
    #[serde(default)]
    splits_to_apply: Vec<[u64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeJson {
    segment: u64,
    order: u64,
    #[serde(default)]
    without_edge: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EdgeJson {
    a: u64,
    b: u64,
    provenance: ProvenanceJson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ProvenanceJson {
    FalseSplitMerge,
    ComponentConfirmation,
    BulkGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnnotationJson {
    id: u64,
    point: [i64; 3],
    kind: AnnotationKindJson,
    #[serde(default)]
    visited: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AnnotationKindJson {
    BranchPoint,
    SegmentationMerger,
    Misalignment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MergeJson {
    a: u64,
    b: u64,
    locations: [[i64; 3]; 2],
}

fn point_to_json(point: VoxelPoint) -> [i64; 3] {
    [point.x, point.y, point.z]
}

fn point_from_json(raw: [i64; 3]) -> VoxelPoint {
    VoxelPoint::new(raw[0], raw[1], raw[2])
}

fn snapshot_to_json(snapshot: &Snapshot) -> SnapshotJson {
    let session = &snapshot.session;

    let nodes = session
        .graph()
        .segments()
        .filter_map(|segment| {
            session.graph().node(segment).map(|record| NodeJson {
                segment: segment.get(),
                order: record.order(),
                without_edge: record.without_edge(),
            })
        })
        .collect();

    let edges = session
        .graph()
        .edges()
        .map(|(edge, provenance)| EdgeJson {
            a: edge.lo().get(),
            b: edge.hi().get(),
            provenance: match provenance {
                EdgeProvenance::FalseSplitMerge => ProvenanceJson::FalseSplitMerge,
                EdgeProvenance::ComponentConfirmation => ProvenanceJson::ComponentConfirmation,
                EdgeProvenance::BulkGroup => ProvenanceJson::BulkGroup,
            },
        })
        .collect();

    let annotations = session
        .annotations()
        .iter()
        .map(|annotation| {
            let (kind, visited) = match annotation.kind() {
                AnnotationKind::BranchPoint { status } => {
                    (AnnotationKindJson::BranchPoint, status == BranchStatus::Visited)
                }
                AnnotationKind::SegmentationMerger => (AnnotationKindJson::SegmentationMerger, false),
                AnnotationKind::Misalignment => (AnnotationKindJson::Misalignment, false),
            };
            AnnotationJson {
                id: annotation.id().get(),
                point: point_to_json(annotation.point()),
                kind,
                visited,
            }
        })
        .collect();

    let merges_to_apply = session
        .merges_to_apply()
        .iter()
        .map(|decision| MergeJson {
            a: decision.edge.lo().get(),
            b: decision.edge.hi().get(),
            locations: [
                point_to_json(decision.locations[0]),
                point_to_json(decision.locations[1]),
            ],
        })
        .collect();

    let splits_to_apply = session
        .splits_to_apply()
        .iter()
        .map(|edge| [edge.lo().get(), edge.hi().get()])
        .collect();

    SnapshotJson {
        last_position: snapshot.last_position.map(point_to_json),
        nodes,
        edges,
        annotations,
        merges_to_apply,
        splits_to_apply,
    }
}

fn snapshot_from_json(json: SnapshotJson, path: &Path) -> Result<Snapshot, StoreError> {
    let invalid = |reason: String| StoreError::InvalidSnapshot {
        path: path.to_path_buf(),
        reason,
    };

    let parse_segment = |raw: u64| {
        SegmentId::new(raw).map_err(|err| invalid(format!("segment id {raw}: {err}")))
    };

    let parse_edge = |a: u64, b: u64| {
        let a = parse_segment(a)?;
        let b = parse_segment(b)?;
        Edge::new(a, b).map_err(|err| invalid(format!("edge {a}-{b}: {err}")))
    };

    let mut graph = ProofreadGraph::new();
    for node in &json.nodes {
        let segment = parse_segment(node.segment)?;
        if graph.is_member(segment) {
            return Err(invalid(format!("duplicate node {segment}")));
        }
        graph.restore_node(segment, NodeRecord::new(node.order, node.without_edge));
    }
    for edge_json in &json.edges {
        let edge = parse_edge(edge_json.a, edge_json.b)?;
        if !graph.is_member(edge.lo()) || !graph.is_member(edge.hi()) {
            return Err(invalid(format!("edge {}-{} has a missing endpoint", edge.lo(), edge.hi())));
        }
        if graph.has_edge(edge.lo(), edge.hi()) {
            return Err(invalid(format!("duplicate edge {}-{}", edge.lo(), edge.hi())));
        }
        let provenance = match edge_json.provenance {
            ProvenanceJson::FalseSplitMerge => EdgeProvenance::FalseSplitMerge,
            ProvenanceJson::ComponentConfirmation => EdgeProvenance::ComponentConfirmation,
            ProvenanceJson::BulkGroup => EdgeProvenance::BulkGroup,
        };
        graph.restore_edge(edge, provenance);
    }

    let mut entries = Vec::with_capacity(json.annotations.len());
    for annotation in &json.annotations {
        let kind = match annotation.kind {
            AnnotationKindJson::BranchPoint => AnnotationKind::BranchPoint {
                status: if annotation.visited {
                    BranchStatus::Visited
                } else {
                    BranchStatus::Unvisited
                },
            },
            AnnotationKindJson::SegmentationMerger => AnnotationKind::SegmentationMerger,
            AnnotationKindJson::Misalignment => AnnotationKind::Misalignment,
        };
        entries.push(Annotation::new(
            AnnotationId::from_raw(annotation.id),
            point_from_json(annotation.point),
            kind,
        ));
    }
    let annotations = AnnotationSet::from_entries(entries);

    let mut merges = Vec::with_capacity(json.merges_to_apply.len());
    for merge in &json.merges_to_apply {
        merges.push(MergeDecision {
            edge: parse_edge(merge.a, merge.b)?,
            locations: [
                point_from_json(merge.locations[0]),
                point_from_json(merge.locations[1]),
            ],
        });
    }

    let mut splits = Vec::with_capacity(json.splits_to_apply.len());
    for pair in &json.splits_to_apply {
        splits.push(parse_edge(pair[0], pair[1])?);
    }

    Ok(Snapshot {
        session: Session::from_parts(graph, annotations, merges, splits),
        last_position: json.last_position.map(point_from_json),
    })
}

fn write_atomic(
    root: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    fs::create_dir_all(root)
        .map_err(|source| StoreError::Io { path: root.to_path_buf(), source })?;

    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused { path: path.to_path_buf() });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(StoreError::Io { path: path.to_path_buf(), source });
        }
    }

    let Some(parent) = path.parent() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no parent"),
        });
    };
    let Some(file_name) = path.file_name() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path =
        parent.join(format!(".galatea.tmp.{}.{}", file_name.to_string_lossy(), nanos));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;

    file.write_all(contents)
        .map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;

    if durability == WriteDurability::Durable {
        file.sync_all()
            .map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;
    }
    drop(file);

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io { path: path.to_path_buf(), source });
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(parent)
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
            let _ = dir.sync_all();
        }
    }

    Ok(())
}
