use anyhow::{Result, anyhow};
use log::{error, info};
use notify::{RecursiveMode, Watcher};
use pico_args::Arguments;
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    env,
    fs::File,
    io::{self, BufReader},
    sync::mpsc,
    thread,
};

use wristctl::config::{ConfigState, ProfileStore};
use wristctl::pipeline::{Pipeline, RunStats};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let subcmd: Option<String> = pargs.subcommand()?;

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.opt_free_from_str()?;
            match topic {
                Some(t) => print_subcmd_help(&t),
                None => print_help(),
            }
            Ok(())
        }

        Some("list") => {
            let cfg = load_config()?;
            print_response(&serde_json::json!({
                "ok": true,
                "data": {"profiles": cfg.list_profiles(), "active": cfg.active_name}
            }));
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: wristctl use <profile_name>"))?;
            let mut cfg = load_config()?;
            let resp = match cfg.set_active(&name) {
                Ok(()) => serde_json::json!({"ok": true, "data": {"active_profile": cfg.active_name}}),
                Err(e) => serde_json::json!({"ok": false, "error": e.to_string()}),
            };
            print_response(&resp);
            Ok(())
        }

        Some("show") => {
            let cfg = load_config()?;
            print_response(&serde_json::json!({"ok": true, "data": cfg.summary()}));
            Ok(())
        }

        Some("replay") => {
            let profile_name: Option<String> = pargs.opt_value_from_str("--profile")?;
            let path: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: wristctl replay <session.jsonl> [--profile <name>]"))?;
            let cfg = load_session_config(profile_name)?;

            let file = File::open(&path).map_err(|e| anyhow!("failed to open {path}: {e}"))?;
            info!("replaying {path} with profile '{}'", cfg.active_name);
            let mut pipeline = Pipeline::new(cfg.profile)?;
            let stats = pipeline.run(BufReader::new(file), io::stdout().lock(), |_| {})?;
            log_stats(&stats);
            Ok(())
        }

        Some("watch") => {
            let profile_name: Option<String> = pargs.opt_value_from_str("--profile")?;
            watch(load_session_config(profile_name)?)
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn load_config() -> Result<ConfigState> {
    ConfigState::load_or_install_default(ProfileStore::default_location()?)
}

/// Active profile, or `--profile` for this run only.
fn load_session_config(profile_name: Option<String>) -> Result<ConfigState> {
    let mut cfg = load_config()?;
    if let Some(name) = profile_name {
        cfg.select(&name)?;
    }
    Ok(cfg)
}

fn watch(mut cfg: ConfigState) -> Result<()> {
    let path = cfg.active_path();

    // hot reload: the directory is watched since editors tend to replace the file
    let (tx, rx) = mpsc::channel::<()>();
    let target = path.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(ev) = res {
            if (ev.kind.is_modify() || ev.kind.is_create()) && ev.paths.iter().any(|p| p == &target)
            {
                let _ = tx.send(());
            }
        }
    })?;
    watcher.watch(&cfg.store.profiles_dir, RecursiveMode::NonRecursive)?;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            info!("received signal {sig}; stopping");
            std::process::exit(0);
        }
    });

    // the engine lives on this thread, so a pending change is applied before the next record
    info!(
        "watching stdin with profile '{}' (reloads on change to {}, applied at the next record)",
        cfg.active_name,
        path.display()
    );
    let mut pipeline = Pipeline::new(cfg.profile.clone())?;
    let stats = pipeline.run(io::stdin().lock(), io::stdout().lock(), |engine| {
        if rx.try_recv().is_err() {
            return;
        }
        while rx.try_recv().is_ok() {}
        match cfg.reload() {
            Ok(()) => engine.apply_profile(&cfg.profile),
            Err(e) => error!("reload failed, keeping last good profile: {e}"),
        }
    })?;
    log_stats(&stats);
    Ok(())
}

fn log_stats(stats: &RunStats) {
    info!(
        "{} records, {} skipped, {} events",
        stats.lines, stats.skipped, stats.events
    );
}

fn print_help() {
    println!(
        r#"wristctl — wrist gesture classifier

USAGE:
  wristctl help [command]                        Show general or command-specific help
  wristctl list                                  List profiles
  wristctl use <name>                            Switch active profile
  wristctl show                                  Print the active profile
  wristctl replay <session.jsonl> [--profile N]  Run a recorded session, print gesture events
  wristctl watch [--profile N]                   Classify records from stdin live

TIPS:
  - Profiles: ~/.config/wristctl/profiles
  - Active profile pointer: ~/.config/wristctl/active
  - watch applies profile edits when the next input record arrives
  - RUST_LOG=debug shows every emitted gesture
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "list" => {
            println!("usage: wristctl list\nLists available profiles and the active one.")
        }
        "use" => {
            println!("usage: wristctl use <name>\nSwitches the active profile to <name>.")
        }
        "show" => println!("usage: wristctl show\nPrints the active profile with all thresholds."),
        "replay" => println!(
            "usage: wristctl replay <session.jsonl> [--profile <name>]\n\
             Feeds JSON-line records (sample, tick, extension, shake, swipe, connection)\n\
             through a fresh classifier and prints one JSON line per event."
        ),
        "watch" => println!(
            "usage: wristctl watch [--profile <name>]\n\
             Same as replay but reads stdin; reloads the profile when its file changes.\n\
             A reload takes effect when the next input record arrives, so an idle\n\
             stream keeps the old thresholds until it produces another line."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
