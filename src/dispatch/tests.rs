// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use rstest::rstest;

use crate::model::fixtures::{demo_session, demo_volume};
use crate::model::{GraphError, SegmentId, VolumeSelector, VoxelPoint};
use crate::resolve::{MemoryVolume, ResolveError};
use crate::sync::RecordingViewer;
use crate::undo::UndoError;

use super::{Command, CommandError, Dispatcher, InputEvent, Mode, Status};

fn seg(raw: u64) -> SegmentId {
    SegmentId::new(raw).expect("segment id")
}

fn at(x: i64) -> VoxelPoint {
    VoxelPoint::new(x, 0, 0)
}

fn event(command: Command, x: i64) -> InputEvent {
    InputEvent::new(command, Some(at(x)), VolumeSelector::Base)
}

struct Bench {
    dispatcher: Dispatcher,
    volume: MemoryVolume,
    viewer: RecordingViewer,
}

impl Bench {
    fn new() -> Self {
        Self {
            dispatcher: Dispatcher::new(demo_session()),
            volume: demo_volume(),
            viewer: RecordingViewer::default(),
        }
    }

    fn run(&mut self, input: InputEvent) -> Result<Status, CommandError> {
        self.dispatcher.dispatch(input, &self.volume, &mut self.viewer)
    }

    fn members(&self) -> BTreeSet<SegmentId> {
        self.dispatcher.session().graph().segments().collect()
    }
}

#[test]
fn merge_pairing_connects_a_false_split() {
    let mut bench = Bench::new();

    // voxel 50 is fragment 200, not yet part of the neuron
    bench.run(event(Command::MarkSplitSource, 50)).expect("mark source");
    assert!(matches!(bench.dispatcher.mode(), Mode::AwaitingMergeTarget { .. }));

    // voxel 40 is member 104
    let status = bench.run(event(Command::MarkMergeTarget, 40)).expect("mark target");
    assert_eq!(status.message(), "an edge was set between 104 and 200");
    assert_eq!(*bench.dispatcher.mode(), Mode::Idle);

    let session = bench.dispatcher.session();
    assert!(session.graph().is_member(seg(200)));
    assert!(session.graph().has_edge(seg(104), seg(200)));
    assert_eq!(session.merges_to_apply().len(), 1);
    assert_eq!(session.merges_to_apply()[0].locations, [at(50), at(40)]);
    assert_eq!(bench.dispatcher.undo_depth(), 1);
    assert!(bench.viewer.agglomerated_segments.contains(&seg(200)));
}

#[test]
fn merge_between_two_existing_members_sets_a_plain_edge() {
    let mut bench = Bench::new();
    bench.dispatcher.session_mut().graph_mut().remove_edge(seg(100), seg(101)).expect("cut");

    bench.run(event(Command::MarkSplitSource, 0)).expect("mark source");
    bench.run(event(Command::MarkMergeTarget, 10)).expect("mark target");

    assert!(bench.dispatcher.session().graph().has_edge(seg(100), seg(101)));
}

#[test]
fn mark_target_without_a_source_is_rejected() {
    let mut bench = Bench::new();
    let err = bench.run(event(Command::MarkMergeTarget, 40)).expect_err("no source marked");
    assert!(matches!(err, CommandError::InvalidTransition { .. }));
    assert_eq!(bench.dispatcher.undo_depth(), 0);
}

#[rstest]
#[case(0, 0)] // same segment twice
#[case(0, 10)] // edge 100-101 already present
fn failed_pairing_resets_to_idle(#[case] source_x: i64, #[case] target_x: i64) {
    let mut bench = Bench::new();
    let before = bench.dispatcher.session().clone();

    bench.run(event(Command::MarkSplitSource, source_x)).expect("mark source");
    bench.run(event(Command::MarkMergeTarget, target_x)).expect_err("pairing must fail");

    assert_eq!(*bench.dispatcher.mode(), Mode::Idle);
    assert_eq!(*bench.dispatcher.session(), before);
    assert_eq!(bench.dispatcher.undo_depth(), 0);
}

#[test]
fn query_partners_enters_review_and_selects_the_component() {
    let mut bench = Bench::new();

    let status = bench.run(event(Command::QueryConnectedPartners, 0)).expect("query");
    assert_eq!(status.message(), "connected to 100: 100, 101, 102, 103, 104");

    let expected: BTreeSet<_> = [100u64, 101, 102, 103, 104].into_iter().map(seg).collect();
    match bench.dispatcher.mode() {
        Mode::ReviewingComponent { seed, members } => {
            assert_eq!(*seed, seg(100));
            assert_eq!(*members, expected);
        }
        other => panic!("expected review mode, got {other:?}"),
    }
    assert_eq!(bench.viewer.base_segments, expected);
    // a query mutates nothing
    assert_eq!(bench.dispatcher.undo_depth(), 0);
}

#[test]
fn query_on_a_non_member_leaves_the_mode_alone() {
    let mut bench = Bench::new();
    let err = bench.run(event(Command::QueryConnectedPartners, 50)).expect_err("not a member");
    assert_eq!(err, CommandError::Graph(GraphError::NotMember { segment: seg(200) }));
    assert_eq!(*bench.dispatcher.mode(), Mode::Idle);
}

#[test]
fn split_then_confirm_detaches_the_far_branch() {
    let mut bench = Bench::new();

    bench.run(event(Command::QueryConnectedPartners, 20)).expect("review around 102");
    bench.run(event(Command::SplitEdge, 30)).expect("cut 102-103");

    let session = bench.dispatcher.session();
    assert!(!session.graph().has_edge(seg(102), seg(103)));
    assert_eq!(session.splits_to_apply().len(), 1);

    // review continues on the seed's shrunken component
    let near: BTreeSet<_> = [100u64, 101, 102].into_iter().map(seg).collect();
    match bench.dispatcher.mode() {
        Mode::ReviewingComponent { members, .. } => assert_eq!(*members, near),
        other => panic!("expected review mode, got {other:?}"),
    }

    // detach the far side by hovering it
    bench.run(event(Command::ConfirmMergeSplit, 30)).expect("detach");
    assert_eq!(*bench.dispatcher.mode(), Mode::Idle);
    assert_eq!(bench.members(), near);
    assert!(bench.viewer.base_segments.is_empty());
    assert_eq!(bench.dispatcher.undo_depth(), 2);
}

#[rstest]
#[case(Command::SplitEdge)]
#[case(Command::ConfirmMergeSplit)]
fn review_only_commands_are_rejected_while_idle(#[case] command: Command) {
    let mut bench = Bench::new();
    let err = bench.run(event(command, 10)).expect_err("not reviewing");
    assert!(matches!(err, CommandError::InvalidTransition { .. }));
}

#[test]
fn split_edge_on_a_non_neighbor_keeps_the_review_alive() {
    let mut bench = Bench::new();
    bench.run(event(Command::QueryConnectedPartners, 0)).expect("review around 100");

    let err = bench.run(event(Command::SplitEdge, 20)).expect_err("100 and 102 share no edge");
    assert_eq!(err, CommandError::Graph(GraphError::EdgeNotFound { a: seg(100), b: seg(102) }));
    assert!(matches!(bench.dispatcher.mode(), Mode::ReviewingComponent { .. }));
}

#[test]
fn split_off_group_stages_the_base_component_disjointly() {
    let mut bench = Bench::new();

    let status = bench.run(event(Command::SplitOffGroup, 70)).expect("stage cluster");
    assert_eq!(status.message(), "staged 3 disjoint segment(s); remove the false ones");

    let session = bench.dispatcher.session();
    for raw in [300u64, 301, 302] {
        assert!(session.graph().is_member(seg(raw)));
        assert_eq!(session.graph().neighbors(seg(raw)).map(BTreeSet::len), Some(0));
    }
    assert_eq!(bench.dispatcher.undo_depth(), 1);
    assert!(bench.viewer.base_segments.contains(&seg(301)));
}

#[test]
fn split_off_group_rejects_an_existing_member_seed() {
    let mut bench = Bench::new();
    let err = bench.run(event(Command::SplitOffGroup, 0)).expect_err("100 is a member");
    assert_eq!(err, CommandError::Graph(GraphError::AlreadyMember { segment: seg(100) }));
}

#[test]
fn remove_from_group_drops_the_hovered_component() {
    let mut bench = Bench::new();
    bench.run(event(Command::RemoveFromGroup, 20)).expect("remove neuron");
    assert!(bench.dispatcher.session().graph().is_empty());
    assert_eq!(bench.dispatcher.undo_depth(), 1);
}

#[test]
fn add_unconnected_skips_segments_already_present() {
    let mut bench = Bench::new();
    bench.run(event(Command::SplitOffGroup, 70)).expect("stage cluster");
    bench.dispatcher.session_mut().graph_mut().remove_node(seg(302)).expect("drop one");

    let status = bench.run(event(Command::AddUnconnected, 70)).expect("re-add");
    assert_eq!(status.message(), "added 1 segment(s) to the neuron graph");
}

#[test]
fn unresolvable_cursor_reports_not_found() {
    let mut bench = Bench::new();
    let err = bench.run(event(Command::QueryConnectedPartners, 999)).expect_err("empty voxel");
    assert_eq!(
        err,
        CommandError::Resolve(ResolveError::NotFound {
            point: at(999),
            selector: VolumeSelector::Base,
        })
    );
}

#[test]
fn cursor_commands_demand_a_cursor() {
    let mut bench = Bench::new();
    let input = InputEvent::new(Command::MarkSplitSource, None, VolumeSelector::Base);
    let err = bench.run(input).expect_err("no cursor");
    assert_eq!(err, CommandError::MissingCursor { command: "mark-split-source" });
}

#[test]
fn branch_point_workflow_walks_in_insertion_order() {
    let mut bench = Bench::new();

    bench.run(event(Command::SetBranchPoint, 5)).expect("first branch");
    bench.run(event(Command::SetBranchPoint, 25)).expect("second branch");
    assert_eq!(bench.dispatcher.undo_depth(), 2);

    let status = bench.run(event(Command::JumpToUnvisitedBranch, 0)).expect("jump");
    assert_eq!(status.message(), "next unvisited branch: 1 at 5,0,0");

    bench.run(event(Command::TagBranchVisited, 0)).expect("tag first");
    let status = bench.run(event(Command::JumpToUnvisitedBranch, 0)).expect("jump again");
    assert_eq!(status.message(), "next unvisited branch: 2 at 25,0,0");

    bench.run(event(Command::TagBranchVisited, 0)).expect("tag second");
    let err = bench.run(event(Command::TagBranchVisited, 0)).expect_err("all visited");
    assert_eq!(err, CommandError::NoUnvisitedBranch);
}

#[test]
fn duplicate_branch_point_is_reported_and_not_recorded() {
    let mut bench = Bench::new();
    bench.run(event(Command::SetBranchPoint, 5)).expect("first");
    let status = bench.run(event(Command::SetBranchPoint, 5)).expect("duplicate is benign");

    assert_eq!(status.message(), "branch point at 5,0,0 already set");
    assert_eq!(bench.dispatcher.session().annotations().len(), 1);
    assert_eq!(bench.dispatcher.undo_depth(), 1);
}

#[test]
fn nearest_annotation_wins_on_removal() {
    let mut bench = Bench::new();
    bench.run(event(Command::MarkSegmentationMerger, 5)).expect("merger at 5");
    bench.run(event(Command::MarkMisalignment, 60)).expect("misalignment at 60");

    let status = bench.run(event(Command::RemoveNearestAnnotation, 50)).expect("remove");
    assert_eq!(status.message(), "deleted misalignment annotation 2 at 60,0,0");
    assert_eq!(bench.dispatcher.session().annotations().len(), 1);
}

#[test]
fn removing_with_no_annotations_is_an_error() {
    let mut bench = Bench::new();
    let err = bench.run(event(Command::RemoveNearestAnnotation, 0)).expect_err("nothing there");
    assert_eq!(err, CommandError::NoAnnotations);
}

#[test]
fn undo_reverts_the_merge_and_its_ledger_entry() {
    let mut bench = Bench::new();
    let before = bench.dispatcher.session().clone();

    bench.run(event(Command::MarkSplitSource, 50)).expect("mark source");
    bench.run(event(Command::MarkMergeTarget, 40)).expect("mark target");
    let status = bench.run(event(Command::Undo, 0)).expect("undo");

    assert_eq!(status.message(), "undid add node");
    assert_eq!(*bench.dispatcher.session(), before);
    assert!(bench.dispatcher.session().merges_to_apply().is_empty());
    assert_eq!(bench.dispatcher.undo_depth(), 0);
}

#[test]
fn undo_resets_an_active_review() {
    let mut bench = Bench::new();
    bench.run(event(Command::SetBranchPoint, 5)).expect("branch");
    bench.run(event(Command::QueryConnectedPartners, 0)).expect("review");

    bench.run(event(Command::Undo, 0)).expect("undo the branch point");
    assert_eq!(*bench.dispatcher.mode(), Mode::Idle);
    assert!(bench.dispatcher.session().annotations().is_empty());
}

#[test]
fn undo_on_an_empty_log_is_an_error() {
    let mut bench = Bench::new();
    let err = bench.run(event(Command::Undo, 0)).expect_err("log is empty");
    assert_eq!(err, CommandError::Undo(UndoError::EmptyLog));
}

#[rstest]
#[case(Command::ClearBaseSelection)]
#[case(Command::ToggleLayout)]
#[case(Command::CycleOpacity(VolumeSelector::Base))]
#[case(Command::ToggleNeuronDisplay)]
fn display_commands_never_touch_the_undo_log(#[case] command: Command) {
    let mut bench = Bench::new();
    let before = bench.dispatcher.session().clone();

    bench.run(event(command, 0)).expect("display command");

    assert_eq!(*bench.dispatcher.session(), before);
    assert_eq!(bench.dispatcher.undo_depth(), 0);
}
