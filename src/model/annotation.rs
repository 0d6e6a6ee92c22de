// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Point annotations left behind during review: branch points to revisit,
//! plus marker kinds recorded for offline repair.

use std::fmt;

use super::ids::{AnnotationId, VoxelPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    Unvisited,
    Visited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// A neurite branching/merge site that needs a later review pass.
    BranchPoint { status: BranchStatus },
    /// A true segmentation merger the tool cannot fix; logged for offline
    /// repair and immutable except for deletion.
    SegmentationMerger,
    /// A volume-alignment defect; same lifecycle as merger markers.
    Misalignment,
}

impl AnnotationKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BranchPoint { .. } => "branch point",
            Self::SegmentationMerger => "segmentation merger",
            Self::Misalignment => "misalignment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    id: AnnotationId,
    point: VoxelPoint,
    kind: AnnotationKind,
}

impl Annotation {
    pub(crate) fn new(id: AnnotationId, point: VoxelPoint, kind: AnnotationKind) -> Self {
        Self { id, point, kind }
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn point(&self) -> VoxelPoint {
        self.point
    }

    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    pub fn is_unvisited_branch(&self) -> bool {
        matches!(self.kind, AnnotationKind::BranchPoint { status: BranchStatus::Unvisited })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    NotFound { id: AnnotationId },
    NotABranchPoint { id: AnnotationId },
}

impl fmt::Display for AnnotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "annotation {id} does not exist"),
            Self::NotABranchPoint { id } => {
                write!(f, "annotation {id} is a marker and carries no visit status")
            }
        }
    }
}

impl std::error::Error for AnnotationError {}

/// Insertion-ordered annotation collection for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSet {
    next_id: AnnotationId,
    entries: Vec<Annotation>,
}

impl Default for AnnotationSet {
    fn default() -> Self {
        Self { next_id: AnnotationId::first(), entries: Vec::new() }
    }
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a set from persisted entries, continuing id allocation after
    /// the highest restored id.
    pub(crate) fn from_entries(entries: Vec<Annotation>) -> Self {
        let next_id = entries
            .iter()
            .map(|annotation| annotation.id.next())
            .max()
            .unwrap_or_else(AnnotationId::first);
        Self { next_id, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.entries.iter()
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.entries.iter().find(|annotation| annotation.id == id)
    }

    pub fn add(&mut self, kind: AnnotationKind, point: VoxelPoint) -> AnnotationId {
        let id = self.next_id;
        self.next_id = self.next_id.next();
        self.entries.push(Annotation { id, point, kind });
        id
    }

    pub fn remove(&mut self, id: AnnotationId) -> Result<Annotation, AnnotationError> {
        let index = self
            .entries
            .iter()
            .position(|annotation| annotation.id == id)
            .ok_or(AnnotationError::NotFound { id })?;
        Ok(self.entries.remove(index))
    }

    /// Flips the visit status of a branch point. Marker kinds are immutable
    /// and reject this.
    pub fn set_branch_status(
        &mut self,
        id: AnnotationId,
        status: BranchStatus,
    ) -> Result<(), AnnotationError> {
        let annotation = self
            .entries
            .iter_mut()
            .find(|annotation| annotation.id == id)
            .ok_or(AnnotationError::NotFound { id })?;
        match &mut annotation.kind {
            AnnotationKind::BranchPoint { status: current } => {
                *current = status;
                Ok(())
            }
            AnnotationKind::SegmentationMerger | AnnotationKind::Misalignment => {
                Err(AnnotationError::NotABranchPoint { id })
            }
        }
    }

    /// First unvisited branch point in insertion order, if any.
    pub fn next_unvisited_branch(&self) -> Option<&Annotation> {
        self.entries.iter().find(|annotation| annotation.is_unvisited_branch())
    }

    /// Annotation closest to `point` by squared euclidean distance. Ties go
    /// to the earlier insertion.
    pub fn nearest(&self, point: VoxelPoint) -> Option<&Annotation> {
        self.entries
            .iter()
            .min_by_key(|annotation| annotation.point.distance_squared(point))
    }
}
