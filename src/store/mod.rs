// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for review sessions on disk.
//!
//! The store module reads/writes the review folder format: timestamped JSON
//! snapshots of the session, newest file wins on reload.

pub mod review_folder;

pub use review_folder::{ReviewFolder, Snapshot, StoreError, WriteDurability};
