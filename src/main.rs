// src/main.rs
//
// editorial-state <latest.json> [published.json]
//
// Loads a latest (preview) content tree and, optionally, its published
// counterpart, resolves editorial states for the whole tree and prints the
// result.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use editorial_state::domain::{validate_snapshot_pair, ContentNode};
use editorial_state::services::StateResolver;

fn load_tree(path: &Path) -> Result<ContentNode> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse '{}'", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (latest_path, published_path) = match args.as_slice() {
        [latest] => (latest, None),
        [latest, published] => (latest, Some(published)),
        _ => bail!("usage: editorial-state <latest.json> [published.json]"),
    };

    let mut latest = load_tree(Path::new(latest_path))?;
    let published = published_path
        .map(|path| load_tree(Path::new(path)))
        .transpose()?;

    validate_snapshot_pair(&latest, published.as_ref())?;

    let state = StateResolver::new().resolve_tree(&mut latest, published.as_ref());

    println!("{}", serde_json::to_string_pretty(&latest)?);

    let badges: Vec<String> = state.badges().iter().map(|b| b.to_string()).collect();
    println!("state: {}", state);
    println!("badges: [{}]", badges.join(", "));

    Ok(())
}
