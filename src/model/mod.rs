// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: the proofreading graph, annotations, and the session
//! container that owns them for the lifetime of one reconstruction.

pub mod annotation;
pub(crate) mod fixtures;
pub mod graph;
pub mod ids;
pub mod reversal;
pub mod session;

pub use annotation::{Annotation, AnnotationError, AnnotationKind, AnnotationSet, BranchStatus};
pub use graph::{Edge, EdgeProvenance, GraphError, NodeRecord, ProofreadGraph};
pub use ids::{AnnotationId, SegmentId, SegmentIdError, VolumeSelector, VoxelPoint};
pub use reversal::Reversal;
pub use session::{MergeDecision, Session};
