//! Command-line parsing

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;

use worldloom_domain::catalog;
use worldloom_domain::{FormValues, ResourceSpec, TypeFilter, WorldId};

pub const USAGE: &str = "\
Usage: worldloom <command>

Commands:
  worlds                               List worlds (* marks the selection)
  select <world-id> | select --clear   Select a world, or clear the selection
  kinds                                List resource kinds
  list <kind>                          List records of the selected world
  stats <kind>                         Counts by category, status and group
  create <kind> field=value...         Create a record
  edit <kind> <id> field=value...      Update a record
  delete <kind> <id> [--yes]           Delete a record
  search <term> [--type <kind|all>]    Search the selected world
  browse [--type <kind|all>]           Search as you type; one term per line on stdin

<kind> is `world` or an entity kind such as `character` or `power-level`.
Field names are the form names shown by `kinds`; values are read as JSON
numbers or booleans when they parse, otherwise as text.";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Worlds,
    /// `None` clears the selection
    Select(Option<WorldId>),
    Kinds,
    List(&'static ResourceSpec),
    Stats(&'static ResourceSpec),
    Create {
        spec: &'static ResourceSpec,
        values: FormValues,
    },
    Edit {
        spec: &'static ResourceSpec,
        id: String,
        values: FormValues,
    },
    Delete {
        spec: &'static ResourceSpec,
        id: String,
        assume_yes: bool,
    },
    Search {
        term: String,
        filter: TypeFilter,
    },
    /// Interactive search, terms read from stdin
    Browse(TypeFilter),
    Help,
}

impl Command {
    /// Parse the arguments after the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        match name.as_str() {
            "worlds" => {
                no_extra(rest)?;
                Ok(Command::Worlds)
            }
            "select" => match rest {
                [flag] if flag == "--clear" => Ok(Command::Select(None)),
                [id] => Ok(Command::Select(Some(
                    WorldId::parse(id).with_context(|| format!("invalid world id '{}'", id))?,
                ))),
                _ => bail!("usage: worldloom select <world-id> | --clear"),
            },
            "kinds" => {
                no_extra(rest)?;
                Ok(Command::Kinds)
            }
            "list" => match rest {
                [kind] => Ok(Command::List(resource(kind)?)),
                _ => bail!("usage: worldloom list <kind>"),
            },
            "stats" => match rest {
                [kind] => Ok(Command::Stats(resource(kind)?)),
                _ => bail!("usage: worldloom stats <kind>"),
            },
            "create" => match rest {
                [kind, fields @ ..] => Ok(Command::Create {
                    spec: resource(kind)?,
                    values: assignments(fields)?,
                }),
                _ => bail!("usage: worldloom create <kind> field=value..."),
            },
            "edit" => match rest {
                [kind, id, fields @ ..] => Ok(Command::Edit {
                    spec: resource(kind)?,
                    id: id.clone(),
                    values: assignments(fields)?,
                }),
                _ => bail!("usage: worldloom edit <kind> <id> field=value..."),
            },
            "delete" => {
                let assume_yes = rest.iter().any(|a| a == "--yes" || a == "-y");
                let positional: Vec<&String> = rest
                    .iter()
                    .filter(|a| *a != "--yes" && *a != "-y")
                    .collect();
                match positional.as_slice() {
                    [kind, id] => Ok(Command::Delete {
                        spec: resource(kind)?,
                        id: (*id).clone(),
                        assume_yes,
                    }),
                    _ => bail!("usage: worldloom delete <kind> <id> [--yes]"),
                }
            }
            "search" => parse_search(rest),
            "browse" => match rest {
                [] => Ok(Command::Browse(TypeFilter::All)),
                [flag, raw] if flag == "--type" => Ok(Command::Browse(type_filter(raw)?)),
                [arg] => match arg.strip_prefix("--type=") {
                    Some(raw) => Ok(Command::Browse(type_filter(raw)?)),
                    None => bail!("usage: worldloom browse [--type <kind|all>]"),
                },
                _ => bail!("usage: worldloom browse [--type <kind|all>]"),
            },
            "help" | "--help" | "-h" => Ok(Command::Help),
            other => bail!("unknown command '{}'\n\n{}", other, USAGE),
        }
    }
}

fn parse_search(rest: &[String]) -> Result<Command> {
    let mut filter = TypeFilter::All;
    let mut terms = Vec::new();
    let mut args = rest.iter();
    while let Some(arg) = args.next() {
        if arg == "--type" {
            let raw = args.next().ok_or_else(|| anyhow!("--type needs a kind or 'all'"))?;
            filter = type_filter(raw)?;
        } else if let Some(raw) = arg.strip_prefix("--type=") {
            filter = type_filter(raw)?;
        } else {
            terms.push(arg.as_str());
        }
    }

    if terms.is_empty() {
        bail!("usage: worldloom search <term> [--type <kind|all>]");
    }
    Ok(Command::Search {
        term: terms.join(" "),
        filter,
    })
}

fn type_filter(raw: &str) -> Result<TypeFilter> {
    raw.parse::<TypeFilter>()
        .with_context(|| format!("invalid search type '{}'", raw))
}

fn no_extra(rest: &[String]) -> Result<()> {
    match rest.first() {
        Some(extra) => bail!("unexpected argument '{}'", extra),
        None => Ok(()),
    }
}

fn resource(kind: &str) -> Result<&'static ResourceSpec> {
    catalog::resolve(kind).ok_or_else(|| anyhow!("unknown kind '{}' (see `worldloom kinds`)", kind))
}

fn assignments(fields: &[String]) -> Result<FormValues> {
    let mut values = FormValues::new();
    for field in fields {
        let (key, raw) = field
            .split_once('=')
            .ok_or_else(|| anyhow!("expected field=value, got '{}'", field))?;
        let key = key.trim();
        if key.is_empty() {
            bail!("empty field name in '{}'", field);
        }
        values.set(key, parse_value(raw));
    }
    Ok(values)
}

/// JSON scalars when they parse, text otherwise
pub fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_) | Value::Null | Value::String(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}
