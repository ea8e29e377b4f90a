//! dweb-nav terminal entry point.
//!
//! Loads the configuration, starts the node (bootstrap dials plus the
//! gateway resolver), opens the deep link or default page, then reads
//! navigation commands from stdin until `quit` or end of input.
//!
//! Usage: `dweb-app [config.toml] [deep-link]`

mod commands;

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use futures::executor::block_on;

use commands::Command;
use dweb_browser::{NavigationController, SessionHistory, normalize};
use dweb_node::{Node, TcpDialer};
use dweb_types::config::DwebConfig;
use dweb_types::reference::ContentReference;

const DEFAULT_CONFIG: &str = "dweb.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Resolve config path from CLI arg, DWEB_CONFIG env var, or the default.
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DWEB_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = DwebConfig::load(Path::new(&config_path))
        .with_context(|| format!("loading {config_path}"))?;

    let node = Node::start(&config.node, &TcpDialer)?;

    let history = match std::env::args().nth(2) {
        Some(link) => deep_link_history(&link),
        None => SessionHistory::new(),
    };
    let nav = NavigationController::new(node.into_resolver(), history, config.browser);

    if let Some(outcome) = block_on(nav.bootstrap()) {
        print_lines(&commands::describe(&nav, &outcome));
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        print!("dweb> ");
        io::stdout().flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        match commands::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => print_lines(&block_on(commands::execute(&nav, &cmd))),
            Ok(None) => {},
            Err(e) => println!("{e}"),
        }
    }

    log::info!("Shutting down");
    Ok(())
}

/// History opened at a deep link given either as a fragment
/// (`#/ipfs/<id>`) or as anything the normalizer accepts.
fn deep_link_history(link: &str) -> SessionHistory {
    if link.starts_with('#') {
        return SessionHistory::with_fragment(link);
    }
    match ContentReference::parse(&normalize(link)) {
        Ok(reference) => SessionHistory::with_fragment(&reference.to_fragment()),
        Err(e) => {
            log::warn!("Ignoring deep link {link:?}: {e}");
            SessionHistory::new()
        },
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
