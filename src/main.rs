use edutracker::config::{Config, LOG_ENV};
use edutracker::ipc;
use serde_json::json;
use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn write_line(stdout: &mut io::Stdout, resp: &serde_json::Value) {
    let line = serde_json::to_string(resp).unwrap_or_else(|_| "{\"ok\":false}".to_string());
    let _ = writeln!(stdout, "{}", line);
    let _ = stdout.flush();
}

fn main() {
    init_tracing();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %format!("{e:#}"), "invalid configuration");
            std::process::exit(2);
        }
    };
    let mut state = ipc::AppState::new(config);

    if let Some(path) = state.config.workspace.clone() {
        match ipc::open_workspace(&state, &path) {
            Ok(ws) => state.workspace = Some(ws),
            Err(e) => warn!(error = %format!("{e:#}"), "could not open configured workspace"),
        }
    }
    info!(version = env!("CARGO_PKG_VERSION"), "edutrackerd ready");

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
                // No id to echo back.
                warn!(error = %e, "malformed request line");
                write_line(
                    &mut stdout,
                    &json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    }),
                );
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        write_line(&mut stdout, &resp);
    }
}
