// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Interactive console shell.
//!
//! A line-oriented crossterm loop standing in for a 3-D viewer: a movable
//! voxel probe plays the cursor, Tab flips the active volume, bound keys
//! dispatch commands. The engine never depends on this module.

use std::collections::BTreeSet;
use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::dispatch::{keymap, Dispatcher, InputEvent};
use crate::model::{Annotation, SegmentId, Session, VolumeSelector, VoxelPoint};
use crate::resolve::VolumeLookup;
use crate::store::{ReviewFolder, Snapshot};
use crate::sync::{LayoutMode, ViewerPort};

const PROBE_STEP: i64 = 10;

/// Raw mode for the lifetime of the loop, restored even on early return.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// [`ViewerPort`] that narrates display updates as console lines.
#[derive(Debug, Default)]
struct ConsoleViewer {
    last_agglomerated: BTreeSet<SegmentId>,
}

impl ViewerPort for ConsoleViewer {
    fn set_visible_segments(&mut self, selector: VolumeSelector, segments: &BTreeSet<SegmentId>) {
        match selector {
            VolumeSelector::Agglomerated => {
                if *segments != self.last_agglomerated {
                    print_line(&format!("[viewer] neuron: {} segment(s)", segments.len()));
                    self.last_agglomerated = segments.clone();
                }
            }
            VolumeSelector::Base => {
                if !segments.is_empty() {
                    print_line(&format!("[viewer] base review: {} segment(s)", segments.len()));
                }
            }
        }
    }

    fn set_annotation_layer(&mut self, _annotations: &[Annotation]) {}

    fn set_layout(&mut self, layout: LayoutMode) {
        print_line(&format!("[viewer] layout: {layout:?}"));
    }

    fn set_layer_opacity(&mut self, selector: VolumeSelector, value: f32) {
        print_line(&format!("[viewer] {selector} opacity: {value}"));
    }
}

// Raw mode leaves the cursor where the line ended; always emit \r\n.
fn print_line(text: &str) {
    let mut stdout = io::stdout();
    let _ = write!(stdout, "{text}\r\n");
    let _ = stdout.flush();
}

fn print_help() {
    print_line("galatea proofreading console");
    print_line("  arrows / PgUp / PgDn  move the voxel probe (x/y/z)");
    print_line("  Tab                   flip the active volume (base/agglomerated)");
    print_line("  s / d                 mark split source / merge target");
    print_line("  c                     show connected partners");
    print_line("  ctrl-x / k            split edge / confirm merge split");
    print_line("  ctrl-] / F / ctrl-a   split off group / remove group / add unconnected");
    print_line("  y / ctrl-r / 7        branch point: set / tag visited / jump to next");
    print_line("  m / x / 0             mark merger / misalignment / delete nearest");
    print_line("  ctrl-z                undo");
    print_line("  w / 2 / 3 / f / n     layout / opacity / clear base / neuron display");
    print_line("  ctrl-s                save a snapshot   q or Esc: quit");
}

fn probe_moved(probe: &mut VoxelPoint, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Left => probe.x -= PROBE_STEP,
        KeyCode::Right => probe.x += PROBE_STEP,
        KeyCode::Up => probe.y -= PROBE_STEP,
        KeyCode::Down => probe.y += PROBE_STEP,
        KeyCode::PageUp => probe.z -= PROBE_STEP,
        KeyCode::PageDown => probe.z += PROBE_STEP,
        _ => return false,
    }
    true
}

/// Runs the interactive loop until the operator quits. Saves a final
/// snapshot when a review folder is attached.
pub fn run(
    session: Session,
    volume: &dyn VolumeLookup,
    folder: Option<&ReviewFolder>,
    start_position: Option<VoxelPoint>,
) -> Result<(), Box<dyn std::error::Error>> {
    let _raw = RawModeGuard::enable()?;

    let mut dispatcher = Dispatcher::new(session);
    let mut viewer = ConsoleViewer::default();
    let mut probe = start_position.unwrap_or(VoxelPoint::new(0, 0, 0));
    let mut selector = VolumeSelector::Base;

    print_help();
    print_probe(probe, selector, volume);

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if probe_moved(&mut probe, &key) {
            print_probe(probe, selector, volume);
            continue;
        }

        match key.code {
            KeyCode::Tab => {
                selector = selector.other();
                print_probe(probe, selector, volume);
                continue;
            }
            KeyCode::Esc => break,
            KeyCode::Char('q') if key.modifiers.is_empty() => break,
            KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                save(folder, &dispatcher, probe);
                continue;
            }
            KeyCode::Char('?') => {
                print_help();
                continue;
            }
            _ => {}
        }

        let Some(command) = keymap::command_for(&key) else {
            continue;
        };
        let input = InputEvent::new(command, Some(probe), selector);
        match dispatcher.dispatch(input, volume, &mut viewer) {
            Ok(status) => print_line(status.message()),
            Err(err) => print_line(&format!("! {err}")),
        }
    }

    save(folder, &dispatcher, probe);
    Ok(())
}

fn print_probe(probe: VoxelPoint, selector: VolumeSelector, volume: &dyn VolumeLookup) {
    let segment = match volume.point_to_segment(probe, selector) {
        Some(segment) => format!("segment {segment}"),
        None => "background".to_owned(),
    };
    print_line(&format!("probe {probe} [{selector}]: {segment}"));
}

fn save(folder: Option<&ReviewFolder>, dispatcher: &Dispatcher, probe: VoxelPoint) {
    let Some(folder) = folder else {
        return;
    };
    let snapshot =
        Snapshot { session: dispatcher.session().clone(), last_position: Some(probe) };
    match folder.save_snapshot(&snapshot) {
        Ok(path) => print_line(&format!("saved {}", path.display())),
        Err(err) => print_line(&format!("! snapshot failed: {err}")),
    }
}

/// Built-in demo scene, also used by `--demo`.
pub fn demo_session() -> Session {
    crate::model::fixtures::demo_session()
}

/// The demo scene's volume backend.
pub fn demo_volume() -> crate::resolve::MemoryVolume {
    crate::model::fixtures::demo_volume()
}
