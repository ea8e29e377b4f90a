//! Navigation commands read from the terminal.

use anyhow::{Result, bail};
use dweb_browser::{History, HistoryEntry, NavOutcome, NavigationController, ViewAction};
use dweb_types::backend::Resolver;

pub const HELP: &str = "\
Commands:
  open <ref>    open a reference (ipfs://, ipns://, /ipfs/ path or gateway URL)
  follow <n>    follow link number n on the current page
  links         list links on the current page
  back          history back
  forward       history forward
  home          load the default page in a new entry
  show          print the current page text
  markup        print the current page markup
  history       list history entries, most recent first
  help          show this help
  quit          exit";

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open(String),
    Follow(usize),
    Links,
    Back,
    Forward,
    Home,
    Show,
    Markup,
    History,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let cmd = match (name, rest.as_slice()) {
        ("open" | "o", [reference]) => Command::Open((*reference).to_string()),
        ("open" | "o", _) => bail!("Usage: open <ref>"),
        ("follow" | "f", [n]) => match n.parse() {
            Ok(index) => Command::Follow(index),
            Err(_) => bail!("Usage: follow <n>  (n is a link number from 'links')"),
        },
        ("follow" | "f", _) => bail!("Usage: follow <n>"),
        ("links", []) => Command::Links,
        ("back", []) => Command::Back,
        ("forward", []) => Command::Forward,
        ("home", []) => Command::Home,
        ("show", []) => Command::Show,
        ("markup", []) => Command::Markup,
        ("history", []) => Command::History,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit" | "q", []) => Command::Quit,
        (name, []) => bail!("Unknown command: {name} (try 'help')"),
        (name, _) => bail!("{name} takes no arguments"),
    };
    Ok(Some(cmd))
}

/// Run a command and return the lines to print. `Quit` is the caller's
/// business and prints nothing.
pub async fn execute<R: Resolver>(nav: &NavigationController<R>, cmd: &Command) -> Vec<String> {
    match cmd {
        Command::Open(reference) => describe(nav, &nav.navigate_raw(reference).await),
        Command::Follow(n) => match nav.activate_link(*n).await {
            Some(outcome) => describe(nav, &outcome),
            None => vec![format!("No link {n} on this page.")],
        },
        Command::Links => list_links(nav),
        Command::Back => match nav.dispatch(ViewAction::Back).await {
            Some(outcome) => describe(nav, &outcome),
            None => vec!["Nothing to go back to.".to_string()],
        },
        Command::Forward => match nav.forward().await {
            Some(outcome) => describe(nav, &outcome),
            None => vec!["Nothing to go forward to.".to_string()],
        },
        Command::Home => match nav.dispatch(ViewAction::Home).await {
            Some(outcome) => describe(nav, &outcome),
            None => Vec::new(),
        },
        Command::Show => nav.visible_text().lines().map(String::from).collect(),
        Command::Markup => vec![nav.markup()],
        Command::History => list_history(nav),
        Command::Help => HELP.lines().map(String::from).collect(),
        Command::Quit => Vec::new(),
    }
}

/// Summarize a navigation outcome followed by the page text.
pub fn describe<R: Resolver, H: History>(
    nav: &NavigationController<R, H>,
    outcome: &NavOutcome,
) -> Vec<String> {
    let mut out = Vec::new();
    match outcome {
        NavOutcome::Displayed(page) => {
            let what = page
                .reference
                .as_ref()
                .map_or_else(|| "cached page".to_string(), ToString::to_string);
            let content_type = if page.content_type.is_empty() {
                "unknown type"
            } else {
                page.content_type.as_str()
            };
            out.push(format!("== {what} [{content_type}]"));
            out.extend(nav.visible_text().lines().map(String::from));
            let links = nav.links().len();
            if links > 0 {
                out.push(format!("-- {links} link(s); 'links' to list, 'follow <n>' to open"));
            }
        },
        NavOutcome::Failed { kind, message } => {
            out.push(format!("!! {message} ({kind:?})"));
            let actions: Vec<&str> = nav.actions().into_iter().map(ViewAction::as_str).collect();
            if !actions.is_empty() {
                out.push(format!("-- try: {}", actions.join(", ")));
            }
        },
        NavOutcome::Superseded => out.push("(superseded by a newer navigation)".to_string()),
    }
    out
}

fn list_links<R: Resolver, H: History>(nav: &NavigationController<R, H>) -> Vec<String> {
    let links = nav.links();
    if links.is_empty() {
        return vec!["No links on this page.".to_string()];
    }
    links
        .iter()
        .enumerate()
        .map(|(i, link)| format!("[{i}] {} -> {}", link.label, link.reference))
        .collect()
}

fn list_history<R: Resolver>(nav: &NavigationController<R>) -> Vec<String> {
    let history = nav.history();
    history
        .entries()
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let marker = if i == 0 { '*' } else { ' ' };
            format!("{marker} {}", entry_label(entry))
        })
        .collect()
}

fn entry_label(entry: &HistoryEntry) -> String {
    let fragment = entry.fragment.as_deref().unwrap_or("(no fragment)");
    match &entry.state {
        Some(page) => format!("{fragment} [{}]", page.content_type),
        None => fragment.to_string(),
    }
}
