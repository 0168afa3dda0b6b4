//! Hostbind Probe Binary
//!
//! Run with: `hostbind-probe [--model FILE] <COMMAND>`

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use hostbind::{Config, ConversionEngine, Dispatch, OverloadResolver};
use hostbind_probe::{parse_tag, parse_value, Model, ModelFile};

#[derive(Parser)]
#[command(name = "hostbind-probe")]
#[command(about = "Inspect overload resolution and value conversion against a host model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Host model file (JSON)
    #[arg(short, long, global = true)]
    model: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a call against an overload set
    Resolve {
        /// Class the call is made on
        class: String,
        /// Member name
        member: String,
        /// Call the type itself rather than an instance
        #[arg(long = "static")]
        on_type: bool,
        /// Argument tags, e.g. `int`, `String`, `nil`, `userdata<Dog>`
        tags: Vec<String>,
    },
    /// Score an argument tag against a declared type
    Distance { from: String, to: String },
    /// Convert a guest value into a host type
    Convert {
        /// Guest value, e.g. `42`, `-0x1F`, `"text"`, `nil`, `ud:3`
        #[arg(allow_hyphen_values = true)]
        value: String,
        #[arg(long)]
        to: String,
    },
    /// List the members of every class, or of one
    Members { class: Option<String> },
    /// Print the default configuration, or check a configuration file
    Config { file: Option<PathBuf> },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Commands::Resolve {
            class,
            member,
            on_type,
            tags,
        } => resolve(&cli, class, member, *on_type, tags),
        Commands::Distance { from, to } => distance(&cli, from, to),
        Commands::Convert { value, to } => convert(&cli, value, to),
        Commands::Members { class } => members(&cli, class.as_deref()),
        Commands::Config { file } => config(file.as_deref()),
    }
}

fn load_model(cli: &Cli) -> Result<Model> {
    let file = match &cli.model {
        Some(path) => {
            debug!("Loading model: {}", path.display());
            ModelFile::load(path).with_context(|| format!("Failed to load model: {}", path.display()))?
        }
        None => ModelFile::default(),
    };
    Ok(file.build()?)
}

fn resolve(cli: &Cli, class: &str, member: &str, on_type: bool, tags: &[String]) -> Result<()> {
    let model = load_model(cli)?;
    let table = model
        .table(class)
        .ok_or_else(|| anyhow!("no class `{}` in the model", class))?;
    let set = table
        .get(member)
        .ok_or_else(|| anyhow!("no member `{}` on `{}`", member, class))?;
    let tags = tags
        .iter()
        .map(|t| parse_tag(t, &model))
        .collect::<Result<Vec<_>, _>>()?;

    let dispatch = if on_type { Dispatch::Static } else { Dispatch::Instance };
    let winner = OverloadResolver::new().resolve(set, dispatch, &tags)?;
    info!("Resolved among {} candidates", set.len());
    println!("{}", winner);
    Ok(())
}

fn distance(cli: &Cli, from: &str, to: &str) -> Result<()> {
    let model = load_model(cli)?;
    let tag = parse_tag(from, &model)?;
    let target = model
        .parse_type(to)
        .ok_or_else(|| anyhow!("unknown type `{}`", to))?;

    println!("{}", ConversionEngine::new().tag_distance(&tag, &target));
    Ok(())
}

fn convert(cli: &Cli, value: &str, to: &str) -> Result<()> {
    let model = load_model(cli)?;
    let value = parse_value(value)?;
    let target = model
        .parse_type(to)
        .ok_or_else(|| anyhow!("unknown type `{}`", to))?;

    let engine = ConversionEngine::new();
    debug!("Distance {} -> {}: {}", value.type_name(), target, engine.distance(&value, &target));
    let converted = engine.convert(&value, &target)?;
    println!("{} ({})", converted, converted.type_name());
    Ok(())
}

fn members(cli: &Cli, class: Option<&str>) -> Result<()> {
    let model = load_model(cli)?;
    if let Some(name) = class {
        if model.table(name).is_none() {
            bail!("no class `{}` in the model", name);
        }
    }

    for table in model.tables() {
        if class.is_some_and(|name| name != table.owner().name()) {
            continue;
        }
        println!("{}", table.owner());
        for set in table.overload_sets() {
            for member in set.iter() {
                println!("  [{}] {} {}", member.index(), member.what(), member);
            }
        }
    }
    Ok(())
}

fn config(file: Option<&Path>) -> Result<()> {
    let config = match file {
        Some(path) => Config::load(path).with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => Config::default(),
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}
