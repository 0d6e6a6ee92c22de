// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end proofreading workflows through the public dispatcher API,
//! running against the built-in demo scene: a five-segment neuron (100..=104),
//! a falsely split fragment pair (200, 201), and a disconnected membrane
//! cluster (300..=302), all laid out along the x axis at 10-voxel spacing.

use std::collections::BTreeSet;

use galatea::console::{demo_session, demo_volume};
use galatea::dispatch::{Command, CommandError, Dispatcher, InputEvent, Mode};
use galatea::model::{SegmentId, VolumeSelector, VoxelPoint};
use galatea::resolve::MemoryVolume;
use galatea::sync::RecordingViewer;

fn seg(raw: u64) -> SegmentId {
    SegmentId::new(raw).expect("segment id")
}

fn at(x: i64) -> VoxelPoint {
    VoxelPoint::new(x, 0, 0)
}

struct Scene {
    dispatcher: Dispatcher,
    volume: MemoryVolume,
    viewer: RecordingViewer,
}

impl Scene {
    fn new() -> Self {
        Self {
            dispatcher: Dispatcher::new(demo_session()),
            volume: demo_volume(),
            viewer: RecordingViewer::default(),
        }
    }

    fn command(&mut self, command: Command, x: i64) -> Result<String, CommandError> {
        let input = InputEvent::new(command, Some(at(x)), VolumeSelector::Base);
        self.dispatcher
            .dispatch(input, &self.volume, &mut self.viewer)
            .map(|status| status.message().to_owned())
    }

    fn members(&self) -> BTreeSet<SegmentId> {
        self.dispatcher.session().graph().segments().collect()
    }
}

#[test]
fn scenario_fix_a_false_split() {
    let mut scene = Scene::new();

    // The operator spots fragment 200 hanging off the neuron tip at 104.
    scene.command(Command::MarkSplitSource, 50).expect("mark fragment");
    scene.command(Command::MarkMergeTarget, 40).expect("connect to tip");

    let session = scene.dispatcher.session();
    assert!(session.graph().has_edge(seg(104), seg(200)));
    assert_eq!(session.merges_to_apply().len(), 1);
    assert_eq!(session.merges_to_apply()[0].locations, [at(50), at(40)]);

    // The viewer now shows the fragment as part of the neuron.
    assert!(scene.viewer.agglomerated_segments.contains(&seg(200)));

    // Second thoughts: one undo removes the node, the edge, and the ledger
    // entry together.
    scene.command(Command::Undo, 0).expect("undo");
    assert!(!scene.dispatcher.session().graph().is_member(seg(200)));
    assert!(scene.dispatcher.session().merges_to_apply().is_empty());
}

#[test]
fn scenario_review_and_split_a_false_merger() {
    let mut scene = Scene::new();

    let listing = scene.command(Command::QueryConnectedPartners, 20).expect("review 102");
    // Breadth-first from the seed, lowest id first among neighbors.
    assert_eq!(listing, "connected to 102: 102, 101, 103, 100, 104");

    scene.command(Command::SplitEdge, 30).expect("cut 102-103");
    assert_eq!(scene.dispatcher.session().splits_to_apply().len(), 1);

    scene.command(Command::ConfirmMergeSplit, 40).expect("detach 103-104 via 104");
    assert_eq!(*scene.dispatcher.mode(), Mode::Idle);

    let expected: BTreeSet<_> = [100u64, 101, 102].into_iter().map(seg).collect();
    assert_eq!(scene.members(), expected);
}

#[test]
fn scenario_stage_and_prune_a_bulk_group() {
    let mut scene = Scene::new();

    // Stage the whole membrane cluster, then drop the false member.
    scene.command(Command::SplitOffGroup, 70).expect("stage 300..=302");
    assert!(scene.members().contains(&seg(302)));

    scene.command(Command::RemoveFromGroup, 90).expect("drop 302");
    assert!(!scene.members().contains(&seg(302)));
    assert!(scene.members().contains(&seg(300)));

    // Undo restores the dropped segment, then the whole staged group goes.
    scene.command(Command::Undo, 0).expect("undo removal");
    assert!(scene.members().contains(&seg(302)));
    scene.command(Command::Undo, 0).expect("undo staging");
    for raw in [300u64, 301, 302] {
        assert!(!scene.members().contains(&seg(raw)));
    }
}

#[test]
fn scenario_branch_point_bookkeeping() {
    let mut scene = Scene::new();

    scene.command(Command::SetBranchPoint, 10).expect("branch at 10");
    scene.command(Command::SetBranchPoint, 30).expect("branch at 30");

    // Jumps walk in insertion order and tagging consumes the current stop.
    let first = scene.command(Command::JumpToUnvisitedBranch, 0).expect("first stop");
    assert!(first.contains("10,0,0"));
    scene.command(Command::TagBranchVisited, 0).expect("visited");

    let second = scene.command(Command::JumpToUnvisitedBranch, 0).expect("second stop");
    assert!(second.contains("30,0,0"));
    scene.command(Command::TagBranchVisited, 0).expect("visited");

    let err = scene.command(Command::JumpToUnvisitedBranch, 0).expect_err("none left");
    assert_eq!(err, CommandError::NoUnvisitedBranch);
}

#[test]
fn undo_log_keeps_only_the_ten_newest_entries() {
    let mut scene = Scene::new();

    // Eleven undoable commands: one branch point per voxel step.
    for i in 0..11 {
        scene.command(Command::SetBranchPoint, i).expect("branch point");
    }
    assert_eq!(scene.dispatcher.undo_depth(), 10);

    for _ in 0..10 {
        scene.command(Command::Undo, 0).expect("undo");
    }
    let err = scene.command(Command::Undo, 0).expect_err("log exhausted");
    assert_eq!(err, CommandError::Undo(galatea::undo::UndoError::EmptyLog));

    // The oldest entry was evicted, so its effect survives.
    assert_eq!(scene.dispatcher.session().annotations().len(), 1);
    assert_eq!(
        scene.dispatcher.session().annotations().iter().next().map(|a| a.point()),
        Some(at(0))
    );
}

#[test]
fn errors_leave_the_graph_untouched() {
    let mut scene = Scene::new();
    let before = scene.dispatcher.session().clone();

    // Background voxel, non-member seed, and an illegal transition.
    scene.command(Command::QueryConnectedPartners, 999).expect_err("background");
    scene.command(Command::QueryConnectedPartners, 50).expect_err("not a member");
    scene.command(Command::SplitEdge, 10).expect_err("not reviewing");

    assert_eq!(*scene.dispatcher.session(), before);
    assert_eq!(scene.dispatcher.undo_depth(), 0);
}
