//! Plume CLI
//!
//! Command-line access to the metadata form core:
//! - Showing the form of a table comment's metadata
//! - Importing an RDF file into a table comment
//! - Selecting the template of a dataset from a template store

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use plume_keytree::{KeyTree, Mode, TreeOptions};
use plume_rdf::parse::parse_file;
use plume_rdf::{CommentDescription, MetadataGraph};
use plume_shape::{ShapeCatalog, TemplateConfig, TemplateStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

mod dump;

#[derive(Parser)]
#[command(name = "plume")]
#[command(author, version, about = "Plume: metadata forms for PostgreSQL table comments")]
struct Cli {
    /// More logs on stderr (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the form of the metadata held in a table comment.
    Show {
        /// File holding the comment text
        comment: PathBuf,
        /// Tree options (JSON)
        #[arg(long)]
        options: Option<PathBuf>,
        /// Template store (JSON); the applicable template is used
        #[arg(long)]
        store: Option<PathBuf>,
        /// Template to use instead of the automatic selection
        #[arg(long, requires = "store")]
        template: Option<String>,
        /// Read mode
        #[arg(long)]
        read: bool,
        /// Print the render state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import an RDF file as the metadata of a table comment.
    ///
    /// The updated comment is written to `--out`, or to stdout.
    Import {
        /// Turtle, N-Triples or RDF/XML file
        rdf: PathBuf,
        /// Current comment; its text and dataset identifier are kept
        #[arg(long)]
        old: Option<PathBuf>,
        /// Output file for the new comment
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the name of the template applying to a comment's metadata.
    SelectTemplate {
        /// Template store (JSON)
        store: PathBuf,
        /// File holding the comment text
        comment: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Show {
            comment,
            options,
            store,
            template,
            read,
            json,
        } => cmd_show(
            &comment,
            options.as_deref(),
            store.as_deref(),
            template.as_deref(),
            read,
            json,
        ),
        Commands::Import { rdf, old, out } => cmd_import(&rdf, old.as_deref(), out.as_deref()),
        Commands::SelectTemplate { store, comment } => cmd_select_template(&store, &comment),
    }
}

fn read_comment(path: &Path) -> Result<CommentDescription> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read comment {}", path.display()))?;
    Ok(CommentDescription::parse(&text))
}

fn load_store(path: &Path) -> Result<TemplateStore> {
    TemplateStore::load(path).with_context(|| format!("failed to load template store {}", path.display()))
}

fn cmd_show(
    comment: &Path,
    options: Option<&Path>,
    store: Option<&Path>,
    template: Option<&str>,
    read: bool,
    json: bool,
) -> Result<()> {
    let description = read_comment(comment)?;
    let catalog = ShapeCatalog::bundled()?;
    let mut options = match options {
        Some(path) => TreeOptions::from_json_file(path)?,
        None => TreeOptions::default(),
    };
    if read {
        options.mode = Mode::Read;
    }

    let template: Option<TemplateConfig> = match store {
        Some(path) => {
            let store = load_store(path)?;
            let definition = match (template, description.metagraph()) {
                (Some(name), _) => Some(
                    store
                        .get(name)
                        .with_context(|| format!("no template named {name}"))?,
                ),
                (None, Some(metagraph)) => store.search(metagraph),
                (None, None) => None,
            };
            definition.map(|d| d.config())
        }
        None => None,
    };

    let tree = KeyTree::build(&catalog, template.as_ref(), description.metagraph(), options)?;
    let render = tree.render()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&render)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        "Dataset".green().bold(),
        tree.datasetid(),
        template
            .as_ref()
            .map(|t| t.name.as_str())
            .unwrap_or("no template")
    );
    print!("{}", dump::render_tree(&tree, &render));
    Ok(())
}

fn cmd_import(rdf: &Path, old: Option<&Path>, out: Option<&Path>) -> Result<()> {
    let raw = parse_file(rdf).with_context(|| format!("failed to import {}", rdf.display()))?;
    let catalog = ShapeCatalog::bundled()?;
    let mut description = match old {
        Some(path) => read_comment(path)?,
        None => CommentDescription::default(),
    };
    let old_id = description.metagraph().map(|m| m.datasetid().clone());
    let mut metagraph = MetadataGraph::clean(&raw, &catalog, old_id.as_ref());
    metagraph.update_metadata_date();
    tracing::info!(
        dataset = %metagraph.datasetid(),
        triples = metagraph.len(),
        "imported metadata"
    );
    description.set_metagraph(Some(metagraph));

    let text = description.to_string();
    match out {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn cmd_select_template(store: &Path, comment: &Path) -> Result<()> {
    let store = load_store(store)?;
    let description = read_comment(comment)?;
    let selected = description.metagraph().and_then(|m| store.search(m));
    match selected {
        Some(template) => println!("{}", template.name),
        None => eprintln!("{} no applicable template", "info:".yellow().bold()),
    }
    Ok(())
}
