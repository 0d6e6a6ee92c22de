// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Galatea CLI entrypoint.
//!
//! Runs the interactive proofreading console against a review folder, or
//! against a built-in demo scene with `--demo`.

use std::error::Error;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<review-dir>] [--durable-writes]\n  {program} [--session <dir>] [--durable-writes]\n  {program} --demo\n\nIf review-dir/--session is omitted, the current working directory is used.\nThe most recent `review-<millis>.json` snapshot in the folder is loaded on\nstartup and a new one is written on exit.\n--demo uses a built-in demo scene and cannot be combined with review-dir/--session.\n\n--durable-writes opts into slower, best-effort durable persistence (fsync/sync where supported)."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    demo: bool,
    session_dir: Option<String>,
    durable_writes: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" => {
                if options.demo {
                    return Err(());
                }
                options.demo = true;
            }
            "--session" => {
                if options.session_dir.is_some() {
                    return Err(());
                }
                let dir = args.next().ok_or(())?;
                options.session_dir = Some(dir);
            }
            "--durable-writes" => {
                if options.durable_writes {
                    return Err(());
                }
                options.durable_writes = true;
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.session_dir.is_some() {
                    return Err(());
                }
                options.session_dir = Some(arg);
            }
        }
    }

    if options.demo && options.session_dir.is_some() {
        return Err(());
    }

    Ok(options)
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "galatea".to_owned());

        let options = match parse_options(args) {
            Ok(options) => options,
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        if options.demo {
            let volume = galatea::console::demo_volume();
            let session = galatea::console::demo_session();
            return galatea::console::run(session, &volume, None, None);
        }

        let dir = options.session_dir.unwrap_or_else(|| ".".to_owned());
        let folder = if options.durable_writes {
            galatea::store::ReviewFolder::new(dir)
                .with_durability(galatea::store::WriteDurability::Durable)
        } else {
            galatea::store::ReviewFolder::new(dir)
        };

        let (session, start_position) = match folder.load_latest()? {
            Some(snapshot) => (snapshot.session, snapshot.last_position),
            None => (galatea::model::Session::new(), None),
        };

        // No remote segmentation backend is wired in; the probe resolves to
        // background everywhere outside demo mode.
        let volume = galatea::resolve::MemoryVolume::new();
        galatea::console::run(session, &volume, Some(&folder), start_position)
    })();

    if let Err(err) = result {
        eprintln!("galatea: {err}");
        std::process::exit(1);
    }
}
