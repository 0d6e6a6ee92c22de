// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Galatea — proofreading graph engine for agglomerated neuron segmentation.
//!
//! Operators correct agglomeration errors (false splits, false mergers) by
//! editing a graph over base-volume segments; the dispatcher turns discrete
//! cursor commands into atomic graph operations with bounded undo, and the
//! sync adapter mirrors the result out to an external 3-D viewer.

pub mod console;
pub mod dispatch;
pub mod model;
pub mod resolve;
pub mod store;
pub mod sync;
pub mod undo;
