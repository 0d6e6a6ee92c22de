// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Key bindings for the interactive console.
//!
//! Bindings mirror the proofreading workstation conventions operators already
//! know; `s` (mark split source) and `x` (misalignment) are the two additions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::VolumeSelector;

use super::Command;

/// Maps a pressed key to a command, or `None` for unbound keys.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('x') => Some(Command::SplitEdge),
            KeyCode::Char(']') => Some(Command::SplitOffGroup),
            KeyCode::Char('a') => Some(Command::AddUnconnected),
            KeyCode::Char('r') => Some(Command::TagBranchVisited),
            KeyCode::Char('z') => Some(Command::Undo),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('s') => Some(Command::MarkSplitSource),
        KeyCode::Char('d') => Some(Command::MarkMergeTarget),
        KeyCode::Char('c') => Some(Command::QueryConnectedPartners),
        KeyCode::Char('k') => Some(Command::ConfirmMergeSplit),
        KeyCode::Char('F') => Some(Command::RemoveFromGroup),
        KeyCode::Char('y') => Some(Command::SetBranchPoint),
        KeyCode::Char('7') => Some(Command::JumpToUnvisitedBranch),
        KeyCode::Char('m') => Some(Command::MarkSegmentationMerger),
        KeyCode::Char('x') => Some(Command::MarkMisalignment),
        KeyCode::Char('0') => Some(Command::RemoveNearestAnnotation),
        KeyCode::Char('f') => Some(Command::ClearBaseSelection),
        KeyCode::Char('w') => Some(Command::ToggleLayout),
        KeyCode::Char('2') => Some(Command::CycleOpacity(VolumeSelector::Base)),
        KeyCode::Char('3') => Some(Command::CycleOpacity(VolumeSelector::Agglomerated)),
        KeyCode::Char('n') => Some(Command::ToggleNeuronDisplay),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;
    use rstest::rstest;

    fn plain(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    #[rstest]
    #[case(plain(KeyCode::Char('s')), Command::MarkSplitSource)]
    #[case(plain(KeyCode::Char('d')), Command::MarkMergeTarget)]
    #[case(plain(KeyCode::Char('c')), Command::QueryConnectedPartners)]
    #[case(ctrl(KeyCode::Char('x')), Command::SplitEdge)]
    #[case(plain(KeyCode::Char('k')), Command::ConfirmMergeSplit)]
    #[case(ctrl(KeyCode::Char(']')), Command::SplitOffGroup)]
    #[case(
        KeyEvent::new(KeyCode::Char('F'), KeyModifiers::SHIFT),
        Command::RemoveFromGroup
    )]
    #[case(ctrl(KeyCode::Char('a')), Command::AddUnconnected)]
    #[case(plain(KeyCode::Char('y')), Command::SetBranchPoint)]
    #[case(ctrl(KeyCode::Char('r')), Command::TagBranchVisited)]
    #[case(plain(KeyCode::Char('7')), Command::JumpToUnvisitedBranch)]
    #[case(plain(KeyCode::Char('m')), Command::MarkSegmentationMerger)]
    #[case(plain(KeyCode::Char('x')), Command::MarkMisalignment)]
    #[case(plain(KeyCode::Char('0')), Command::RemoveNearestAnnotation)]
    #[case(ctrl(KeyCode::Char('z')), Command::Undo)]
    #[case(plain(KeyCode::Char('f')), Command::ClearBaseSelection)]
    #[case(plain(KeyCode::Char('w')), Command::ToggleLayout)]
    #[case(plain(KeyCode::Char('2')), Command::CycleOpacity(VolumeSelector::Base))]
    #[case(plain(KeyCode::Char('3')), Command::CycleOpacity(VolumeSelector::Agglomerated))]
    #[case(plain(KeyCode::Char('n')), Command::ToggleNeuronDisplay)]
    fn bound_keys(#[case] key: KeyEvent, #[case] expected: Command) {
        assert_eq!(command_for(&key), Some(expected));
    }

    #[test]
    fn unbound_keys_map_to_none() {
        assert_eq!(command_for(&plain(KeyCode::Char('q'))), None);
        assert_eq!(command_for(&plain(KeyCode::Enter)), None);
        assert_eq!(command_for(&ctrl(KeyCode::Char('d'))), None);
    }

    #[test]
    fn plain_x_is_not_split_edge() {
        assert_eq!(command_for(&plain(KeyCode::Char('x'))), Some(Command::MarkMisalignment));
    }
}
