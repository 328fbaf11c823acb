//! The file-based command-line driver: reads three text files (keys to
//! insert, keys to delete, commands), runs each command against the
//! library's [`BTree`], and writes one line of output per command.
//!
//! This module is the *only* place in the crate that touches the
//! filesystem or a process exit code; the tree itself is a pure in-memory
//! structure.

use std::path::PathBuf;

use clap::Parser;

use crate::error::DriverError;
use crate::BTree;

/// `order_stat_btree <T> <KEYS_TO_INSERT> <KEYS_TO_DELETE> <COMMANDS>`
#[derive(Parser, Debug)]
#[command(name = "order_stat_btree", about = "In-memory order-statistic B-tree batch driver")]
pub struct Cli {
    /// Minimum degree of the tree (must be >= 2).
    #[arg(value_parser = clap::value_parser!(u32).range(2..))]
    pub t: u32,

    /// File with one positive integer per line, inserted in order.
    pub insertions: PathBuf,

    /// File with one positive integer per line, deleted in order.
    pub deletions: PathBuf,

    /// File with one command per line (`select`, `rank`, `keysInRange`,
    /// `primesInRange`).
    pub commands: PathBuf,

    /// Where to write one line of output per command.
    #[arg(long, default_value = "output.txt")]
    pub output: PathBuf,
}

/// A single parsed line from the commands file.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// The k-th smallest key. Signed because `k < 1` is a normal,
    /// explicitly-specified "absent" case rather than a parse error.
    Select(i64),
    Rank(u64),
    KeysInRange(u64, u64),
    PrimesInRange(u64, u64),
}

impl Command {
    fn parse(line: &str) -> Option<Command> {
        let mut tokens = line.split_whitespace();
        let command = match tokens.next()? {
            "select" => Command::Select(tokens.next()?.parse().ok()?),
            "rank" => Command::Rank(tokens.next()?.parse().ok()?),
            "keysInRange" => {
                let lo = tokens.next()?.parse().ok()?;
                let hi = tokens.next()?.parse().ok()?;
                Command::KeysInRange(lo, hi)
            }
            "primesInRange" => {
                let lo = tokens.next()?.parse().ok()?;
                let hi = tokens.next()?.parse().ok()?;
                Command::PrimesInRange(lo, hi)
            }
            _ => return None,
        };
        if tokens.next().is_some() {
            return None;
        }
        Some(command)
    }
}

/// Runs the full batch: load insertions, load deletions, execute
/// commands, write the output file.
pub fn run(cli: &Cli) -> Result<(), DriverError> {
    let mut tree = BTree::new(cli.t as usize);

    let insertions = parse_key_file(&cli.insertions)?;
    log::info!("loaded {} key(s) to insert from {}", insertions.len(), cli.insertions.display());
    for key in insertions {
        tree.insert(key);
    }

    let deletions = parse_key_file(&cli.deletions)?;
    log::info!("loaded {} key(s) to delete from {}", deletions.len(), cli.deletions.display());
    for key in deletions {
        tree.delete(key);
    }

    let commands = parse_command_file(&cli.commands)?;
    log::info!("loaded {} command(s) from {}", commands.len(), cli.commands.display());

    let mut output = String::new();
    for command in &commands {
        output.push_str(&render(&tree, command));
        output.push('\n');
    }

    std::fs::write(&cli.output, output).map_err(|source| DriverError::Io {
        path: cli.output.clone(),
        source,
    })
}

fn parse_key_file(path: &std::path::Path) -> Result<Vec<u64>, DriverError> {
    let contents = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.trim()
                .parse::<u64>()
                .ok()
                .filter(|&key| key >= 1)
                .ok_or_else(|| {
                    log::warn!("{}:{}: not a positive integer: {line:?}", path.display(), index + 1);
                    DriverError::MalformedKeyLine {
                        path: path.to_path_buf(),
                        line: index + 1,
                        text: line.to_string(),
                    }
                })
        })
        .collect()
}

fn parse_command_file(path: &std::path::Path) -> Result<Vec<Command>, DriverError> {
    let contents = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            Command::parse(line.trim()).ok_or_else(|| {
                log::warn!("{}:{}: unrecognized command: {line:?}", path.display(), index + 1);
                DriverError::MalformedCommand {
                    path: path.to_path_buf(),
                    line: index + 1,
                    text: line.to_string(),
                }
            })
        })
        .collect()
}

fn render(tree: &BTree, command: &Command) -> String {
    match *command {
        Command::Select(k) => usize::try_from(k)
            .ok()
            .and_then(|k| tree.select(k))
            .map_or_else(|| "-1".to_string(), |key| key.to_string()),
        Command::Rank(x) => tree.rank(x).map_or_else(|| "-1".to_string(), |rank| rank.to_string()),
        Command::KeysInRange(lo, hi) => render_keys(&tree.keys_in_range(lo, hi)),
        Command::PrimesInRange(lo, hi) => render_keys(&tree.primes_in_range(lo, hi)),
    }
}

fn render_keys(keys: &[u64]) -> String {
    if keys.is_empty() {
        "-1".to_string()
    } else {
        keys.iter().map(u64::to_string).collect::<Vec<_>>().join(" ")
    }
}
