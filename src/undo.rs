// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Bounded, strictly ordered history of inverse operations.

use std::collections::VecDeque;
use std::fmt;

use crate::model::Reversal;

/// Only the most recent ten mutations stay undoable; older entries are
/// evicted silently.
pub const UNDO_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoError {
    EmptyLog,
}

impl fmt::Display for UndoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLog => f.write_str("nothing left to undo"),
        }
    }
}

impl std::error::Error for UndoError {}

/// Ring buffer of reversals. The log never applies anything itself; it hands
/// the newest entry back to the caller, which reverts the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoLog {
    entries: VecDeque<Reversal>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record(&mut self, entry: Reversal) {
        if self.entries.len() == UNDO_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Pops the most recent reversal; the entry is consumed either way.
    pub fn undo_last(&mut self) -> Result<Reversal, UndoError> {
        self.entries.pop_back().ok_or(UndoError::EmptyLog)
    }
}
