//! Datashift CLI - transform structured data files through rule sets.
//!
//! # Commands
//!
//! ```bash
//! datashift transform input.csv --to json --rules rules.json   # Transform a file
//! datashift analyze input.csv                                  # Inspect source structure
//! datashift templates                                          # List registered templates
//! datashift example-rules                                      # Show an example rule set
//! ```

use clap::{Parser, Subcommand};
use datashift::{
    analyze, example_rules, OutputFormat, RuleSet, Source, SourceFormat, TemplateRegistry,
    Transformer,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "datashift")]
#[command(about = "Transform structured data files between JSON, XML, CSV and XLSX", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a source file through a rule set
    Transform {
        /// Input file (.json, .xml, .csv, .xlsx)
        input: PathBuf,

        /// Output format
        #[arg(short, long)]
        to: OutputFormat,

        /// Rule set JSON file (defaults to identity lookups)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Template name
        #[arg(long, default_value = "default")]
        template: String,

        /// Key/element naming the item collection in JSON/XML sources
        #[arg(long)]
        collection: Option<String>,

        /// Treat the input as this extension instead of the path's
        #[arg(long)]
        extension: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect a source file's structure
    Analyze {
        /// Input file
        input: PathBuf,
    },

    /// List registered template names
    Templates,

    /// Show an example rule set
    ExampleRules,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transform {
            input,
            to,
            rules,
            template,
            collection,
            extension,
            output,
        } => cmd_transform(
            &input,
            to,
            rules.as_deref(),
            &template,
            collection.as_deref(),
            extension.as_deref(),
            output.as_deref(),
        ),

        Commands::Analyze { input } => cmd_analyze(&input),

        Commands::Templates => cmd_templates(),

        Commands::ExampleRules => cmd_example_rules(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_transform(
    input: &Path,
    to: OutputFormat,
    rules_path: Option<&Path>,
    template: &str,
    collection: Option<&str>,
    extension: Option<&str>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Transforming: {}", input.display());

    let rules = match rules_path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            RuleSet::from_json(&content)?
        }
        None => RuleSet::new(),
    };

    let mut source = Source::new(input);
    if let Some(hint) = collection {
        source = source.with_collection_hint(hint);
    }
    if let Some(ext) = extension {
        source = source.with_extension(ext);
    }

    let transformer = Transformer::new(to, TemplateRegistry::with_defaults());

    match output {
        Some(path) => {
            let written = transformer.transform_to_file(&source, &rules, template, path)?;
            eprintln!("Wrote {} bytes to {}", written, path.display());
        }
        None => {
            let bytes = transformer.transform(&source, &rules, template)?;
            if to == OutputFormat::Xlsx {
                return Err("refusing to write binary XLSX to stdout; use --output".into());
            }
            print!("{}", String::from_utf8_lossy(&bytes));
        }
    }

    Ok(())
}

fn cmd_analyze(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let format = SourceFormat::from_extension(extension)
        .ok_or_else(|| format!("unsupported source extension '{}'", extension))?;

    let profile = analyze(input, format)?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

fn cmd_templates() -> Result<(), Box<dyn std::error::Error>> {
    let registry = TemplateRegistry::with_defaults();
    for (format, names) in registry.names() {
        println!("{}:", format);
        for name in names {
            println!("  {}", name);
        }
    }
    Ok(())
}

fn cmd_example_rules() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", example_rules().to_json()?);
    Ok(())
}
