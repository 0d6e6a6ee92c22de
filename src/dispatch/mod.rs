// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Command dispatch: one discrete operator event in, one graph operation out.
//!
//! The dispatcher is the only writer of the session. It resolves cursor
//! coordinates through the volume collaborator, enforces mode preconditions,
//! applies the mutation, records the reversal on the undo log, and pushes the
//! new display state to the viewer. Failures are reported and never fatal;
//! the graph is left untouched by a failed command.

use std::collections::BTreeSet;
use std::fmt;

use crate::model::{
    AnnotationError, AnnotationKind, BranchStatus, Edge, EdgeProvenance, GraphError, Reversal,
    SegmentId, Session, VolumeSelector, VoxelPoint,
};
use crate::resolve::{base_component, resolve, ResolveError, VolumeLookup};
use crate::sync::{ViewerPort, ViewerSync};
use crate::undo::{UndoError, UndoLog};

pub mod keymap;

/// Discrete operator commands, one per bound key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// First half of fixing a false split: remember the fragment under the
    /// cursor.
    MarkSplitSource,
    /// Second half: connect the remembered fragment to the segment under the
    /// cursor.
    MarkMergeTarget,
    /// Show every graph segment connected to the one under the cursor.
    QueryConnectedPartners,
    /// While reviewing, cut the edge between the review seed and the segment
    /// under the cursor.
    SplitEdge,
    /// Detach the erroneous side (the hovered segment's component) from the
    /// neuron.
    ConfirmMergeSplit,
    /// Stage the hovered segment's whole base-volume component as a disjoint
    /// group of removal candidates.
    SplitOffGroup,
    /// Remove the hovered segment's connected component from the neuron.
    RemoveFromGroup,
    /// Add the hovered segment's base-volume component without any edge.
    AddUnconnected,
    SetBranchPoint,
    TagBranchVisited,
    JumpToUnvisitedBranch,
    MarkSegmentationMerger,
    MarkMisalignment,
    RemoveNearestAnnotation,
    Undo,
    ClearBaseSelection,
    ToggleLayout,
    CycleOpacity(VolumeSelector),
    ToggleNeuronDisplay,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Self::MarkSplitSource => "mark-split-source",
            Self::MarkMergeTarget => "mark-merge-target",
            Self::QueryConnectedPartners => "query-connected-partners",
            Self::SplitEdge => "split-edge",
            Self::ConfirmMergeSplit => "confirm-merge-split",
            Self::SplitOffGroup => "split-off-group",
            Self::RemoveFromGroup => "remove-from-group",
            Self::AddUnconnected => "add-unconnected",
            Self::SetBranchPoint => "set-branch-point",
            Self::TagBranchVisited => "tag-branch-visited",
            Self::JumpToUnvisitedBranch => "jump-to-unvisited-branch",
            Self::MarkSegmentationMerger => "mark-segmentation-merger",
            Self::MarkMisalignment => "mark-misalignment",
            Self::RemoveNearestAnnotation => "remove-nearest-annotation",
            Self::Undo => "undo",
            Self::ClearBaseSelection => "clear-base-selection",
            Self::ToggleLayout => "toggle-layout",
            Self::CycleOpacity(_) => "cycle-opacity",
            Self::ToggleNeuronDisplay => "toggle-neuron-display",
        }
    }
}

/// One operator input: a command plus the cursor context it was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub command: Command,
    pub cursor: Option<VoxelPoint>,
    pub selector: VolumeSelector,
}

impl InputEvent {
    pub fn new(command: Command, cursor: Option<VoxelPoint>, selector: VolumeSelector) -> Self {
        Self { command, cursor, selector }
    }
}

/// Dispatcher mode. Only two workflows span more than one event: the
/// split-source/merge-target pairing and the component review.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Idle,
    AwaitingMergeTarget {
        source: SegmentId,
        location: VoxelPoint,
    },
    ReviewingComponent {
        seed: SegmentId,
        members: BTreeSet<SegmentId>,
    },
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingMergeTarget { .. } => "awaiting-merge-target",
            Self::ReviewingComponent { .. } => "reviewing-component",
        }
    }
}

/// Per-command feedback for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    message: String,
}

impl Status {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Resolve(ResolveError),
    Graph(GraphError),
    Annotation(AnnotationError),
    Undo(UndoError),
    InvalidTransition { command: &'static str, mode: &'static str },
    MissingCursor { command: &'static str },
    NoUnvisitedBranch,
    NoAnnotations,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve(err) => err.fmt(f),
            Self::Graph(err) => err.fmt(f),
            Self::Annotation(err) => err.fmt(f),
            Self::Undo(err) => err.fmt(f),
            Self::InvalidTransition { command, mode } => {
                write!(f, "{command} is not legal while {mode}")
            }
            Self::MissingCursor { command } => {
                write!(f, "{command} needs a cursor position")
            }
            Self::NoUnvisitedBranch => f.write_str("no unvisited branch point found"),
            Self::NoAnnotations => f.write_str("no annotation to delete"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resolve(err) => Some(err),
            Self::Graph(err) => Some(err),
            Self::Annotation(err) => Some(err),
            Self::Undo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResolveError> for CommandError {
    fn from(err: ResolveError) -> Self {
        Self::Resolve(err)
    }
}

impl From<GraphError> for CommandError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

impl From<AnnotationError> for CommandError {
    fn from(err: AnnotationError) -> Self {
        Self::Annotation(err)
    }
}

impl From<UndoError> for CommandError {
    fn from(err: UndoError) -> Self {
        Self::Undo(err)
    }
}

/// Joins segment ids for status messages without going through `format!`
/// per element.
fn join_segment_ids<I>(ids: I) -> String
where
    I: IntoIterator<Item = SegmentId>,
{
    let mut buffer = itoa::Buffer::new();
    let mut out = String::new();
    for id in ids {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(buffer.format(id.get()));
    }
    out
}

/// The session's single writer.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatcher {
    session: Session,
    undo: UndoLog,
    sync: ViewerSync,
    mode: Mode,
}

impl Dispatcher {
    pub fn new(session: Session) -> Self {
        Self { session, undo: UndoLog::new(), sync: ViewerSync::new(), mode: Mode::Idle }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn sync(&self) -> &ViewerSync {
        &self.sync
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    #[cfg(test)]
    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Runs one command. On success the viewer has been refreshed where the
    /// display changed; on failure session state is untouched and the error
    /// is the operator's feedback.
    pub fn dispatch(
        &mut self,
        event: InputEvent,
        volume: &dyn VolumeLookup,
        viewer: &mut dyn ViewerPort,
    ) -> Result<Status, CommandError> {
        match event.command {
            Command::MarkSplitSource => self.mark_split_source(event, volume),
            Command::MarkMergeTarget => self.mark_merge_target(event, volume, viewer),
            Command::QueryConnectedPartners => self.query_partners(event, volume, viewer),
            Command::SplitEdge => self.split_edge(event, volume, viewer),
            Command::ConfirmMergeSplit => self.confirm_merge_split(event, volume, viewer),
            Command::SplitOffGroup => self.split_off_group(event, volume, viewer),
            Command::RemoveFromGroup => self.remove_from_group(event, volume, viewer),
            Command::AddUnconnected => self.add_unconnected(event, volume, viewer),
            Command::SetBranchPoint => self.set_branch_point(event, viewer),
            Command::TagBranchVisited => self.tag_branch_visited(viewer),
            Command::JumpToUnvisitedBranch => self.jump_to_unvisited_branch(),
            Command::MarkSegmentationMerger => {
                self.add_marker(event, AnnotationKind::SegmentationMerger, viewer)
            }
            Command::MarkMisalignment => {
                self.add_marker(event, AnnotationKind::Misalignment, viewer)
            }
            Command::RemoveNearestAnnotation => self.remove_nearest_annotation(event, viewer),
            Command::Undo => self.undo_last(viewer),
            Command::ClearBaseSelection => {
                self.sync.clear_base_selection();
                self.sync.refresh(viewer, &self.session);
                Ok(Status::new("base viewport cleared"))
            }
            Command::ToggleLayout => {
                let layout = self.sync.toggle_layout(viewer);
                Ok(Status::new(format!("layout: {layout:?}")))
            }
            Command::CycleOpacity(selector) => {
                let value = self.sync.cycle_opacity(viewer, selector);
                Ok(Status::new(format!("{selector} layer opacity: {value}")))
            }
            Command::ToggleNeuronDisplay => {
                let visible = self.sync.toggle_neuron(viewer, &self.session);
                Ok(Status::new(if visible { "neuron shown" } else { "neuron hidden" }))
            }
        }
    }

    fn cursor(&self, event: InputEvent) -> Result<VoxelPoint, CommandError> {
        event.cursor.ok_or(CommandError::MissingCursor { command: event.command.name() })
    }

    fn resolve_cursor(
        &self,
        event: InputEvent,
        volume: &dyn VolumeLookup,
    ) -> Result<(SegmentId, VoxelPoint), CommandError> {
        let point = self.cursor(event)?;
        let segment = resolve(volume, point, event.selector)?;
        Ok((segment, point))
    }

    fn mark_split_source(
        &mut self,
        event: InputEvent,
        volume: &dyn VolumeLookup,
    ) -> Result<Status, CommandError> {
        let (source, location) = self.resolve_cursor(event, volume)?;
        self.mode = Mode::AwaitingMergeTarget { source, location };
        Ok(Status::new(format!("segment {source} marked; pick the merge target")))
    }

    fn mark_merge_target(
        &mut self,
        event: InputEvent,
        volume: &dyn VolumeLookup,
        viewer: &mut dyn ViewerPort,
    ) -> Result<Status, CommandError> {
        let Mode::AwaitingMergeTarget { source, location } = self.mode else {
            return Err(CommandError::InvalidTransition {
                command: event.command.name(),
                mode: self.mode.name(),
            });
        };

        // A failed pairing is ambiguous; restart from the source mark.
        let outcome = self.apply_merge(event, volume, source, location);
        self.mode = Mode::Idle;
        let (edge, reversal) = outcome?;

        self.undo.record(reversal);
        self.sync.refresh(viewer, &self.session);
        Ok(Status::new(format!("an edge was set between {} and {}", edge.lo(), edge.hi())))
    }

    fn apply_merge(
        &mut self,
        event: InputEvent,
        volume: &dyn VolumeLookup,
        source: SegmentId,
        source_location: VoxelPoint,
    ) -> Result<(Edge, Reversal), CommandError> {
        let (target, target_location) = self.resolve_cursor(event, volume)?;
        let edge = Edge::new(source, target)?;

        let graph = self.session.graph();
        let reversal = match (graph.is_member(source), graph.is_member(target)) {
            (true, true) => {
                self.session.graph_mut().add_edge(source, target, EdgeProvenance::FalseSplitMerge)?
            }
            (false, true) => self.session.graph_mut().add_node(source, Some(target))?,
            (true, false) => self.session.graph_mut().add_node(target, Some(source))?,
            (false, false) => return Err(GraphError::NotMember { segment: target }.into()),
        };

        self.session.record_merge(edge, [source_location, target_location]);
        Ok((edge, reversal))
    }

    fn query_partners(
        &mut self,
        event: InputEvent,
        volume: &dyn VolumeLookup,
        viewer: &mut dyn ViewerPort,
    ) -> Result<Status, CommandError> {
        let (seed, _) = self.resolve_cursor(event, volume)?;
        let ordered = self.session.graph().connected_component(seed)?;
        let members: BTreeSet<SegmentId> = ordered.iter().copied().collect();

        self.sync.set_base_selection(members.clone());
        self.sync.refresh(viewer, &self.session);
        let listing = join_segment_ids(ordered);
        self.mode = Mode::ReviewingComponent { seed, members };
        Ok(Status::new(format!("connected to {seed}: {listing}")))
    }

    fn split_edge(
        &mut self,
        event: InputEvent,
        volume: &dyn VolumeLookup,
        viewer: &mut dyn ViewerPort,
    ) -> Result<Status, CommandError> {
        let Mode::ReviewingComponent { seed, .. } = self.mode else {
            return Err(CommandError::InvalidTransition {
                command: event.command.name(),
                mode: self.mode.name(),
            });
        };

        let (partner, _) = self.resolve_cursor(event, volume)?;
        let edge = Edge::new(seed, partner)?;
        let reversal = self.session.graph_mut().remove_edge(seed, partner)?;
        self.session.record_split(edge);
        self.undo.record(reversal);

        // the review continues on the seed's shrunken component
        let ordered = self.session.graph().connected_component(seed)?;
        let members: BTreeSet<SegmentId> = ordered.into_iter().collect();
        self.sync.set_base_selection(members.clone());
        self.sync.refresh(viewer, &self.session);
        self.mode = Mode::ReviewingComponent { seed, members };

        Ok(Status::new(format!(
            "split edge between {seed} and {partner}; confirm with the segment to detach"
        )))
    }

    fn confirm_merge_split(
        &mut self,
        event: InputEvent,
        volume: &dyn VolumeLookup,
        viewer: &mut dyn ViewerPort,
    ) -> Result<Status, CommandError> {
        if !matches!(self.mode, Mode::ReviewingComponent { .. }) {
            return Err(CommandError::InvalidTransition {
                command: event.command.name(),
                mode: self.mode.name(),
            });
        }

        let (hovered, _) = self.resolve_cursor(event, volume)?;
        let detached: BTreeSet<SegmentId> =
            self.session.graph().connected_component(hovered)?.into_iter().collect();
        let count = detached.len();
        let reversal = self.session.graph_mut().remove_group(&detached)?;
        self.undo.record(reversal);

        self.mode = Mode::Idle;
        self.sync.clear_base_selection();
        self.sync.refresh(viewer, &self.session);
        Ok(Status::new(format!("detached {count} segment(s) from the neuron")))
    }

    fn split_off_group(
        &mut self,
        event: InputEvent,
        volume: &dyn VolumeLookup,
        viewer: &mut dyn ViewerPort,
    ) -> Result<Status, CommandError> {
        if !matches!(self.mode, Mode::Idle) {
            return Err(CommandError::InvalidTransition {
                command: event.command.name(),
                mode: self.mode.name(),
            });
        }

        let point = self.cursor(event)?;
        // split-off always works on the base volume, whatever pane the
        // cursor is in
        let seed = resolve(volume, point, VolumeSelector::Base)?;
        if self.session.graph().is_member(seed) {
            return Err(GraphError::AlreadyMember { segment: seed }.into());
        }
        let members = base_component(volume, seed)?;
        let reversal = self.session.graph_mut().add_group(&members)?;
        self.undo.record(reversal);

        self.sync.set_base_selection(members.clone());
        self.sync.refresh(viewer, &self.session);
        Ok(Status::new(format!(
            "staged {} disjoint segment(s); remove the false ones",
            members.len()
        )))
    }

    fn remove_from_group(
        &mut self,
        event: InputEvent,
        volume: &dyn VolumeLookup,
        viewer: &mut dyn ViewerPort,
    ) -> Result<Status, CommandError> {
        if !matches!(self.mode, Mode::Idle) {
            return Err(CommandError::InvalidTransition {
                command: event.command.name(),
                mode: self.mode.name(),
            });
        }

        let (hovered, _) = self.resolve_cursor(event, volume)?;
        let members: BTreeSet<SegmentId> =
            self.session.graph().connected_component(hovered)?.into_iter().collect();
        let count = members.len();
        let reversal = self.session.graph_mut().remove_group(&members)?;
        self.undo.record(reversal);

        self.sync.clear_base_selection();
        self.sync.refresh(viewer, &self.session);
        Ok(Status::new(format!("removed {count} segment(s) from the neuron")))
    }

    fn add_unconnected(
        &mut self,
        event: InputEvent,
        volume: &dyn VolumeLookup,
        viewer: &mut dyn ViewerPort,
    ) -> Result<Status, CommandError> {
        let (seed, _) = self.resolve_cursor(event, volume)?;
        let members = base_component(volume, seed)?;
        let reversal = self.session.graph_mut().add_group(&members)?;
        let added = match &reversal {
            Reversal::GroupAdded { segments } => segments.len(),
            _ => members.len(),
        };
        self.undo.record(reversal);

        self.sync.refresh(viewer, &self.session);
        Ok(Status::new(format!("added {added} segment(s) to the neuron graph")))
    }

    fn set_branch_point(
        &mut self,
        event: InputEvent,
        viewer: &mut dyn ViewerPort,
    ) -> Result<Status, CommandError> {
        let point = self.cursor(event)?;
        let duplicate = self.session.annotations().iter().any(|annotation| {
            annotation.point() == point
                && matches!(annotation.kind(), AnnotationKind::BranchPoint { .. })
        });
        if duplicate {
            return Ok(Status::new(format!("branch point at {point} already set")));
        }

        let id = self
            .session
            .annotations_mut()
            .add(AnnotationKind::BranchPoint { status: BranchStatus::Unvisited }, point);
        self.undo.record(Reversal::AnnotationAdded { id });
        self.sync.refresh(viewer, &self.session);
        Ok(Status::new(format!("branch point {id} set at {point}")))
    }

    fn tag_branch_visited(&mut self, viewer: &mut dyn ViewerPort) -> Result<Status, CommandError> {
        let id = self
            .session
            .annotations()
            .next_unvisited_branch()
            .map(|annotation| annotation.id())
            .ok_or(CommandError::NoUnvisitedBranch)?;
        self.session.annotations_mut().set_branch_status(id, BranchStatus::Visited)?;
        self.sync.refresh(viewer, &self.session);
        Ok(Status::new(format!("branch point {id} tagged as visited")))
    }

    fn jump_to_unvisited_branch(&self) -> Result<Status, CommandError> {
        let annotation = self
            .session
            .annotations()
            .next_unvisited_branch()
            .ok_or(CommandError::NoUnvisitedBranch)?;
        Ok(Status::new(format!(
            "next unvisited branch: {} at {}",
            annotation.id(),
            annotation.point()
        )))
    }

    fn add_marker(
        &mut self,
        event: InputEvent,
        kind: AnnotationKind,
        viewer: &mut dyn ViewerPort,
    ) -> Result<Status, CommandError> {
        let point = self.cursor(event)?;
        let label = kind.label();
        let id = self.session.annotations_mut().add(kind, point);
        self.undo.record(Reversal::AnnotationAdded { id });
        self.sync.refresh(viewer, &self.session);
        Ok(Status::new(format!("{label} marked at {point}")))
    }

    fn remove_nearest_annotation(
        &mut self,
        event: InputEvent,
        viewer: &mut dyn ViewerPort,
    ) -> Result<Status, CommandError> {
        let point = self.cursor(event)?;
        let id = self
            .session
            .annotations()
            .nearest(point)
            .map(|annotation| annotation.id())
            .ok_or(CommandError::NoAnnotations)?;
        let removed = self.session.annotations_mut().remove(id)?;
        self.sync.refresh(viewer, &self.session);
        Ok(Status::new(format!(
            "deleted {} annotation {} at {}",
            removed.kind().label(),
            id,
            removed.point()
        )))
    }

    fn undo_last(&mut self, viewer: &mut dyn ViewerPort) -> Result<Status, CommandError> {
        let reversal = self.undo.undo_last()?;
        let kind = reversal.kind();
        self.session.revert(reversal);

        // conservative: whatever multi-step workflow was active is void now
        self.mode = Mode::Idle;
        self.sync.clear_base_selection();
        self.sync.refresh(viewer, &self.session);
        Ok(Status::new(format!("undid {kind}")))
    }
}

#[cfg(test)]
mod tests;
