use std::io::Write;

use anyhow::{bail, Context};

use crate::catalog::Catalog;
use crate::models::EntityKind;

const USAGE: &str = "usage: content-admin [--seed | --list <quote|book|job> | --random <quote|book|job> [category] | --mark-downloaded <quote|book|job> <id>]";

/// What to do for this invocation. Everything except `Tui` runs once and exits.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Tui,
    Seed,
    List(EntityKind),
    Random {
        kind: EntityKind,
        category: Option<String>,
    },
    MarkDownloaded {
        kind: EntityKind,
        id: String,
    },
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let Some(flag) = args.get(1) else {
        return Ok(Command::Tui);
    };

    match flag.as_str() {
        "--seed" => Ok(Command::Seed),
        "--list" => Ok(Command::List(parse_kind(args.get(2))?)),
        "--random" => {
            let kind = parse_kind(args.get(2))?;
            let category = args
                .get(3)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());
            Ok(Command::Random { kind, category })
        }
        "--mark-downloaded" => {
            let kind = parse_kind(args.get(2))?;
            let Some(id) = args.get(3) else {
                bail!("--mark-downloaded needs an id\n{USAGE}");
            };
            Ok(Command::MarkDownloaded {
                kind,
                id: id.clone(),
            })
        }
        "-h" | "--help" => bail!("{USAGE}"),
        other => bail!("unknown argument '{other}'\n{USAGE}"),
    }
}

fn parse_kind(arg: Option<&String>) -> anyhow::Result<EntityKind> {
    let Some(arg) = arg else {
        bail!("missing entity kind\n{USAGE}");
    };
    Ok(arg.parse()?)
}

pub async fn run(command: Command, catalog: &Catalog, out: &mut impl Write) -> anyhow::Result<()> {
    match command {
        Command::Tui => {}

        Command::Seed => {
            let report = catalog.seed().await;
            writeln!(out, "{report}")?;
        }

        Command::List(kind) => {
            let records: Vec<_> = catalog
                .list(kind)
                .await
                .iter()
                .map(|r| r.to_json())
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
        }

        Command::Random { kind, category } => {
            match catalog.pick_random(kind, category.as_deref()).await {
                Some(record) => {
                    let json = serde_json::to_string_pretty(&record.to_json())?;
                    writeln!(out, "{json}")?;
                }
                None => match category {
                    Some(category) => {
                        writeln!(out, "No {} found in category '{}'.", kind.table(), category)?
                    }
                    None => writeln!(out, "No {} found.", kind.table())?,
                },
            }
        }

        Command::MarkDownloaded { kind, id } => {
            catalog
                .mark_downloaded(kind, &id)
                .await
                .with_context(|| format!("marking {} {} as downloaded", kind.singular().to_lowercase(), id))?;
            writeln!(out, "Marked {} {} as downloaded.", kind.singular().to_lowercase(), id)?;
        }
    }

    Ok(())
}
