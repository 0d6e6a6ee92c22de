// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Viewer synchronization.
//!
//! After each successful mutation the adapter derives the full desired
//! visible state and pushes it to the external viewer. The push is
//! declarative: the viewer may re-render everything from the delta, so no
//! incremental patching is assumed and nothing is read back.

use std::collections::BTreeSet;

use crate::model::{Annotation, SegmentId, Session, VolumeSelector};

/// Viewer pane arrangement: cross-section plus the agglomeration 3-D view,
/// optionally with a third pane for the base volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    TwoPane,
    ThreePane,
}

impl LayoutMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::TwoPane => Self::ThreePane,
            Self::ThreePane => Self::TwoPane,
        }
    }
}

/// Selected-segment opacity steps the operator cycles through.
pub const OPACITY_STEPS: [f32; 3] = [0.0, 0.25, 0.5];

fn next_opacity(current: f32) -> f32 {
    match OPACITY_STEPS.iter().position(|step| *step == current) {
        Some(index) => OPACITY_STEPS[(index + 1) % OPACITY_STEPS.len()],
        None => OPACITY_STEPS[OPACITY_STEPS.len() - 1],
    }
}

/// The surface the external viewer exposes to the engine. Side effects only.
pub trait ViewerPort {
    fn set_visible_segments(&mut self, selector: VolumeSelector, segments: &BTreeSet<SegmentId>);
    fn set_annotation_layer(&mut self, annotations: &[Annotation]);
    fn set_layout(&mut self, layout: LayoutMode);
    fn set_layer_opacity(&mut self, selector: VolumeSelector, value: f32);
}

/// The declarative display delta derived from session state.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleState {
    pub agglomerated: BTreeSet<SegmentId>,
    pub base: BTreeSet<SegmentId>,
    pub annotations: Vec<Annotation>,
}

/// Tracks the display-only knobs (layout, opacity, review selection, neuron
/// visibility) and mirrors graph state out to the viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSync {
    layout: LayoutMode,
    base_opacity: f32,
    agglomerated_opacity: f32,
    base_selection: BTreeSet<SegmentId>,
    neuron_visible: bool,
}

impl Default for ViewerSync {
    fn default() -> Self {
        Self {
            layout: LayoutMode::ThreePane,
            // the base layer starts invisible so the agglomeration dominates
            base_opacity: 0.0,
            agglomerated_opacity: OPACITY_STEPS[OPACITY_STEPS.len() - 1],
            base_selection: BTreeSet::new(),
            neuron_visible: true,
        }
    }
}

impl ViewerSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn base_selection(&self) -> &BTreeSet<SegmentId> {
        &self.base_selection
    }

    pub fn neuron_visible(&self) -> bool {
        self.neuron_visible
    }

    /// Replaces the base-viewport review selection (the segments shown while
    /// hunting for false mergers).
    pub fn set_base_selection(&mut self, segments: BTreeSet<SegmentId>) {
        self.base_selection = segments;
    }

    pub fn clear_base_selection(&mut self) {
        self.base_selection.clear();
    }

    /// Derives the desired visible state from the session.
    pub fn desired_state(&self, session: &Session) -> VisibleState {
        let agglomerated = if self.neuron_visible {
            session.graph().segments().collect()
        } else {
            BTreeSet::new()
        };
        VisibleState {
            agglomerated,
            base: self.base_selection.clone(),
            annotations: session.annotations().iter().copied().collect(),
        }
    }

    /// Pushes the full desired state to the viewer.
    pub fn refresh(&self, viewer: &mut dyn ViewerPort, session: &Session) {
        let state = self.desired_state(session);
        viewer.set_visible_segments(VolumeSelector::Agglomerated, &state.agglomerated);
        viewer.set_visible_segments(VolumeSelector::Base, &state.base);
        viewer.set_annotation_layer(&state.annotations);
    }

    pub fn toggle_layout(&mut self, viewer: &mut dyn ViewerPort) -> LayoutMode {
        self.layout = self.layout.toggled();
        viewer.set_layout(self.layout);
        self.layout
    }

    /// Cycles a layer's selected-segment opacity through [`OPACITY_STEPS`].
    pub fn cycle_opacity(&mut self, viewer: &mut dyn ViewerPort, selector: VolumeSelector) -> f32 {
        let slot = match selector {
            VolumeSelector::Base => &mut self.base_opacity,
            VolumeSelector::Agglomerated => &mut self.agglomerated_opacity,
        };
        *slot = next_opacity(*slot);
        let value = *slot;
        viewer.set_layer_opacity(selector, value);
        value
    }

    /// Toggles the reconstructed neuron's display in the agglomeration pane.
    pub fn toggle_neuron(&mut self, viewer: &mut dyn ViewerPort, session: &Session) -> bool {
        self.neuron_visible = !self.neuron_visible;
        self.refresh(viewer, session);
        self.neuron_visible
    }
}

/// [`ViewerPort`] double that records the last pushed state; used by the
/// test suites and nothing else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingViewer {
    pub base_segments: BTreeSet<SegmentId>,
    pub agglomerated_segments: BTreeSet<SegmentId>,
    pub annotations: Vec<Annotation>,
    pub layout: Option<LayoutMode>,
    pub opacities: Vec<(VolumeSelector, f32)>,
    pub refreshes: usize,
}

impl ViewerPort for RecordingViewer {
    fn set_visible_segments(&mut self, selector: VolumeSelector, segments: &BTreeSet<SegmentId>) {
        match selector {
            VolumeSelector::Base => self.base_segments = segments.clone(),
            VolumeSelector::Agglomerated => {
                self.agglomerated_segments = segments.clone();
                self.refreshes += 1;
            }
        }
    }

    fn set_annotation_layer(&mut self, annotations: &[Annotation]) {
        self.annotations = annotations.to_vec();
    }

    fn set_layout(&mut self, layout: LayoutMode) {
        self.layout = Some(layout);
    }

    fn set_layer_opacity(&mut self, selector: VolumeSelector, value: f32) {
        self.opacities.push((selector, value));
    }
}
