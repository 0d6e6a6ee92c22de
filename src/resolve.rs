// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Segment identity resolution against the external volume collaborator.
//!
//! The engine never touches voxel data itself; it asks the volume for the
//! segment under a coordinate, or for the full base-volume component of a
//! segment. Results are not cached because earlier mutations can refresh the
//! segmentation underneath us.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::model::{SegmentId, VolumeSelector, VoxelPoint};

/// The narrow surface the engine consumes from the segmentation volume.
pub trait VolumeLookup {
    /// Segment under a voxel coordinate; `None` for background/unsegmented.
    fn point_to_segment(&self, point: VoxelPoint, selector: VolumeSelector) -> Option<SegmentId>;

    /// Every base-volume segment agglomerated together with `segment`,
    /// including `segment` itself; `None` when the volume does not know the
    /// segment.
    fn base_component_of(&self, segment: SegmentId) -> Option<BTreeSet<SegmentId>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    NotFound { point: VoxelPoint, selector: VolumeSelector },
    UnknownSegment { segment: SegmentId },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { point, selector } => {
                write!(f, "no {selector} segment at voxel {point}")
            }
            Self::UnknownSegment { segment } => {
                write!(f, "segment {segment} is unknown to the volume")
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resolves a cursor coordinate to a segment id, turning background voxels
/// into a reportable error.
pub fn resolve(
    volume: &dyn VolumeLookup,
    point: VoxelPoint,
    selector: VolumeSelector,
) -> Result<SegmentId, ResolveError> {
    volume
        .point_to_segment(point, selector)
        .ok_or(ResolveError::NotFound { point, selector })
}

/// Fetches the full agglomerated base-volume component of a segment.
pub fn base_component(
    volume: &dyn VolumeLookup,
    segment: SegmentId,
) -> Result<BTreeSet<SegmentId>, ResolveError> {
    volume
        .base_component_of(segment)
        .ok_or(ResolveError::UnknownSegment { segment })
}

/// In-memory [`VolumeLookup`] used by the demo session and the test suite.
///
/// Voxels map to a (base, agglomerated) segment pair; components are stored
/// explicitly per base segment.
#[derive(Debug, Clone, Default)]
pub struct MemoryVolume {
    voxels: BTreeMap<VoxelPoint, (SegmentId, SegmentId)>,
    components: BTreeMap<SegmentId, BTreeSet<SegmentId>>,
}

impl MemoryVolume {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voxel(mut self, point: VoxelPoint, base: SegmentId, agglomerated: SegmentId) -> Self {
        self.voxels.insert(point, (base, agglomerated));
        self
    }

    /// Declares one agglomerated component; every member maps to the full
    /// member set.
    pub fn with_component(mut self, members: &[SegmentId]) -> Self {
        let set: BTreeSet<SegmentId> = members.iter().copied().collect();
        for member in &set {
            self.components.insert(*member, set.clone());
        }
        self
    }
}

impl VolumeLookup for MemoryVolume {
    fn point_to_segment(&self, point: VoxelPoint, selector: VolumeSelector) -> Option<SegmentId> {
        self.voxels.get(&point).map(|(base, agglomerated)| match selector {
            VolumeSelector::Base => *base,
            VolumeSelector::Agglomerated => *agglomerated,
        })
    }

    fn base_component_of(&self, segment: SegmentId) -> Option<BTreeSet<SegmentId>> {
        self.components.get(&segment).cloned()
    }
}
