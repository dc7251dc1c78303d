mod config;
mod error;
mod exclusion;
mod generator;
mod model;
mod parser;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use crate::error::Error;
use crate::exclusion::ExclusionList;

const EXAMPLES: &str = r#"Examples:
  randid -r 'AB_[0-9]{3}'
      a ticket id such as AB_492

  randid -r 'srv-[a-z]{8}' -e taken.txt -a
      a resource name absent from taken.txt, recorded there afterwards

  randid -r '(P|Q)_\d{4}_\1'
      group 1 repeated through the backreference, e.g. P_2217_P

Unbounded repetitions (*, +, {n,}) and negated classes are rejected;
bounded ones ({n}, {n,m}, ?) always take the minimum count."#;

/// Generates a random id matching a regular expression.
#[derive(Debug, Parser)]
#[command(name = "randid", version, after_help = EXAMPLES)]
struct Args {
    /// Pattern the generated id must match
    #[arg(short, long, value_name = "PATTERN")]
    regexp: String,

    /// File of already issued ids, one per line, never to be generated again
    #[arg(short, long, value_name = "FILE")]
    exclusion_file: Option<PathBuf>,

    /// Append the generated id to the exclusion file
    #[arg(short, long)]
    auto_add: bool,

    /// Generation method
    #[arg(short, long, default_value = config::METHOD_RANDOM_ID)]
    method: String,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let id = run(Args::parse())?;
    println!("{id}");
    Ok(())
}

fn run(args: Args) -> anyhow::Result<String> {
    if args.method != config::METHOD_RANDOM_ID {
        return Err(Error::Configuration(format!("unknown method {:?}", args.method)).into());
    }

    // Shells often force quoting around patterns full of metacharacters,
    // and a stray quoted layer should not end up inside the ids.
    let pattern = args.regexp.trim_matches('\'');
    if pattern.is_empty() {
        return Err(Error::Configuration("empty pattern".to_string()).into());
    }

    let nodes = parser::parse(pattern)?;
    log::debug!("parsed {pattern:?} into {nodes:?}");

    let (exclusions, auto_add) = load_exclusions(args.exclusion_file.as_deref(), args.auto_add)?;
    log::debug!("avoiding {} already issued ids", exclusions.len());

    let mut rng = rand::thread_rng();
    let id = generator::unique_instance(&nodes, &exclusions, &mut rng)?;

    if auto_add {
        let path = args
            .exclusion_file
            .as_deref()
            .ok_or_else(|| Error::Configuration("no exclusion file to append to".to_string()))?;
        exclusion::append(path, &id)
            .with_context(|| format!("failed to append to {}", path.display()))?;
    }

    Ok(id)
}

/// Loads the exclusion file when there is one to load. Without a usable file
/// the list degrades to empty and auto-append is switched off with it, since
/// there is nothing meaningful to append to.
fn load_exclusions(
    path: Option<&Path>,
    auto_add: bool,
) -> anyhow::Result<(ExclusionList, bool)> {
    let Some(path) = path else {
        if auto_add {
            log::warn!("--auto-add needs an exclusion file, ignoring it");
        }
        return Ok((ExclusionList::new(), false));
    };
    if !path.exists() {
        log::warn!("exclusion file {} not found, assuming empty", path.display());
        if auto_add {
            log::warn!("--auto-add needs an existing exclusion file, ignoring it");
        }
        return Ok((ExclusionList::new(), false));
    }
    let list = ExclusionList::load(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok((list, auto_add))
}
