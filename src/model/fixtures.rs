// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::ids::{SegmentId, VoxelPoint};
use super::session::Session;
use crate::resolve::MemoryVolume;

fn seg(raw: u64) -> SegmentId {
    SegmentId::new(raw).expect("fixture segment id")
}

/// A small two-neuron scene: the target neuron occupies segments 100..=104
/// (agglomerated object 1000), a falsely split fragment lives at 200..=201
/// (object 2000), and a membrane cluster 300..=302 (object 3000) is merged
/// onto nothing yet. Voxels are laid out on the x axis, 10 apart.
pub(crate) fn demo_volume() -> MemoryVolume {
    let mut volume = MemoryVolume::new()
        .with_component(&[seg(100), seg(101), seg(102), seg(103), seg(104)])
        .with_component(&[seg(200), seg(201)])
        .with_component(&[seg(300), seg(301), seg(302)]);

    let layout: [(i64, u64, u64); 10] = [
        (0, 100, 1000),
        (10, 101, 1000),
        (20, 102, 1000),
        (30, 103, 1000),
        (40, 104, 1000),
        (50, 200, 2000),
        (60, 201, 2000),
        (70, 300, 3000),
        (80, 301, 3000),
        (90, 302, 3000),
    ];
    for (x, base, agglomerated) in layout {
        volume = volume.with_voxel(VoxelPoint::new(x, 0, 0), seg(base), seg(agglomerated));
    }
    volume
}

/// Demo session seeded with the target neuron's soma component.
pub(crate) fn demo_session() -> Session {
    let mut session = Session::new();
    let mut previous: Option<SegmentId> = None;
    for raw in [100u64, 101, 102, 103, 104] {
        let segment = seg(raw);
        session
            .graph_mut()
            .add_node(segment, previous)
            .expect("fixture graph is duplicate-free");
        previous = Some(segment);
    }
    session
}

#[cfg(test)]
mod tests {
    use super::{demo_session, demo_volume};
    use crate::model::{SegmentId, VolumeSelector, VoxelPoint};
    use crate::resolve::VolumeLookup;

    #[test]
    fn demo_volume_and_session_agree_on_the_soma() {
        let volume = demo_volume();
        let session = demo_session();

        let seed = volume
            .point_to_segment(VoxelPoint::new(0, 0, 0), VolumeSelector::Base)
            .expect("seed voxel");
        assert_eq!(seed, SegmentId::new(100).expect("id"));
        assert!(session.graph().is_member(seed));
        assert_eq!(session.graph().node_count(), 5);
    }
}
