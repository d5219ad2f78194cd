//! Command-line inspector for mod data directories.
//!
//! # Responsibility
//! - Report which mods a save slot depends on, without a running host.
//! - Keep output deterministic for scripting.
//! - Write core events to rolling log files when `--log-dir` is given.

use moddata_core::{
    CompatibilityValidator, DataPaths, ModRegistry, ModScopes, SaveSlot, DEFAULT_MANAGER_ID,
};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "usage: moddata_cli [--log-dir <dir>] version | inspect <modded_root> <slot> [installed_id ...]";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (log_dir, args) = match split_log_dir(&args) {
        Ok(split) => split,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if let Some(dir) = log_dir {
        if let Err(message) = moddata_core::init_logging(moddata_core::default_log_level(), &dir)
        {
            eprintln!("logging init failed: {message}");
            return ExitCode::from(2);
        }
    }

    match args.first().map(String::as_str) {
        Some("version") => {
            println!("moddata_core version={}", moddata_core::core_version());
            ExitCode::SUCCESS
        }
        Some("inspect") => match inspect(&args[1..]) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::from(1),
            Err(message) => {
                eprintln!("{message}\n{USAGE}");
                ExitCode::from(2)
            }
        },
        _ => {
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
    }
}

/// Splits a leading `--log-dir <dir>` off the command.
///
/// Relative directories resolve against the working directory because the
/// logger only accepts absolute paths.
fn split_log_dir(args: &[String]) -> Result<(Option<PathBuf>, &[String]), String> {
    match args {
        [flag, dir, rest @ ..] if flag == "--log-dir" => {
            let dir = PathBuf::from(dir);
            let dir = if dir.is_absolute() {
                dir
            } else {
                std::env::current_dir()
                    .map_err(|err| format!("cannot resolve log dir: {err}"))?
                    .join(dir)
            };
            Ok((Some(dir), rest))
        }
        [flag] if flag == "--log-dir" => Err("--log-dir needs a directory".to_string()),
        _ => Ok((None, args)),
    }
}

/// Prints slot contents; `Ok(false)` when mods are missing.
fn inspect(args: &[String]) -> Result<bool, String> {
    let [root, slot, installed @ ..] = args else {
        return Err("inspect needs <modded_root> <slot>".to_string());
    };
    let index: u32 = slot
        .parse()
        .map_err(|err| format!("invalid slot `{slot}`: {err}"))?;
    let slot = SaveSlot::from_index(index);
    let root = PathBuf::from(root);
    // Profile data is never inspected here.
    let paths = DataPaths::new(&root, &root);

    let mut registry = ModRegistry::new();
    let marker = ModScopes::new().with_required(false);
    for id in std::iter::once(DEFAULT_MANAGER_ID).chain(installed.iter().map(String::as_str)) {
        registry
            .register(id, &marker)
            .map_err(|err| format!("invalid installed id: {err}"))?;
    }

    let referenced = match slot.active() {
        Some(index) => moddata_core::storage::list_fragment_ids(&paths.save_slot_dir(index))
            .map_err(|err| err.to_string())?,
        None => Vec::new(),
    };
    let missing = CompatibilityValidator::new(DEFAULT_MANAGER_ID).missing_mods(
        &registry,
        &paths,
        slot,
    );

    println!("slot={slot} fragments={}", referenced.join(","));
    println!("slot={slot} missing={}", missing.join(","));
    Ok(missing.is_empty())
}
