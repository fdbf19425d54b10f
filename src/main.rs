mod auth;
mod calc;
mod config;
mod db;
mod error;
mod ipc;
mod model;
mod mutate;
mod query;
mod store;

use std::io::{self, BufRead, Write};

use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let cfg = config::Config::from_env();

    // stdout carries the IPC protocol; logs go to stderr.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cfg.log_level)
        .with_writer(io::stderr)
        .with_ansi(false)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("trackerd: logging already initialised");
    }

    let mut state = ipc::AppState {
        workspace: None,
        store: None,
        seed: cfg.seed,
    };

    if let Some(path) = cfg.workspace.as_ref() {
        match store::SqliteStore::open(path, cfg.seed) {
            Ok(s) => {
                info!(workspace = %path.display(), "workspace opened from environment");
                state.workspace = Some(path.clone());
                state.store = Some(s);
            }
            Err(e) => {
                let reason = format!("{e:#}");
                error!(workspace = %path.display(), error = %reason, "could not open workspace");
            }
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let reply = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", reply);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
