// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a segment in a segmentation volume.
///
/// Segment ids are opaque integers assigned by the volume. The id `0` is the
/// reserved background/unsegmented value and is never a valid segment, so the
/// constructor rejects it; lookups that land on background report `NotFound`
/// at the resolver instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u64);

impl SegmentId {
    pub fn new(raw: u64) -> Result<Self, SegmentIdError> {
        if raw == 0 {
            return Err(SegmentIdError::Background);
        }
        Ok(Self(raw))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SegmentId {
    type Err = SegmentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s.parse().map_err(SegmentIdError::NotAnInteger)?;
        Self::new(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentIdError {
    Background,
    NotAnInteger(ParseIntError),
}

impl fmt::Display for SegmentIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Background => f.write_str("segment id 0 is the background value"),
            Self::NotAnInteger(err) => write!(f, "segment id must be an integer: {err}"),
        }
    }
}

impl std::error::Error for SegmentIdError {}

/// Identifier of an annotation within one session.
///
/// Allocated sequentially by the annotation set; never reused within a
/// session, not even after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationId(u64);

impl AnnotationId {
    pub(crate) fn first() -> Self {
        Self(1)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selector for one of the two segmentation spaces of a reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VolumeSelector {
    /// Fine-grained supervoxels, never merged; graph nodes live here.
    Base,
    /// Upstream-merged candidate objects, read-only reference data.
    Agglomerated,
}

impl VolumeSelector {
    pub fn other(self) -> Self {
        match self {
            Self::Base => Self::Agglomerated,
            Self::Agglomerated => Self::Base,
        }
    }
}

impl fmt::Display for VolumeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base => f.write_str("base"),
            Self::Agglomerated => f.write_str("agglomerated"),
        }
    }
}

/// An integer voxel coordinate in volume space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelPoint {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl VoxelPoint {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Squared euclidean distance; enough for nearest-annotation picks.
    pub fn distance_squared(self, other: Self) -> u128 {
        let dx = (self.x - other.x).unsigned_abs() as u128;
        let dy = (self.y - other.y).unsigned_abs() as u128;
        let dz = (self.z - other.z).unsigned_abs() as u128;
        dx * dx + dy * dy + dz * dz
    }
}

impl fmt::Display for VoxelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}
