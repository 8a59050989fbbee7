use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use api::{init_tracing, AppConfig, AppContext};
use ingest::BackendSelector;

#[derive(Parser)]
#[command(name = "fundrisk")]
#[command(about = "Batch fund onboarding: fetch fund data, analyse risk disclosures, stamp documents")]
struct Cli {
    /// JSON config file (defaults to ./fundrisk.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch fund data for ISINs and export the onboarding CSV
    Fetch {
        /// ISIN codes
        isins: Vec<String>,
        /// Text file with one ISIN per line
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output folder, overriding the config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract key risks from a PDF or text file, or every document in a folder
    Analyze {
        path: PathBuf,
        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// Replace the remembered date stamp in a Word template
    Stamp {
        /// Template path or file name in the output folder
        template: Option<String>,
        /// New date such as "Oct 03"; defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// List available templates instead
        #[arg(short, long)]
        list: bool,
    },
    /// Dump the risk taxonomy
    Taxonomy {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    init_tracing(config.log_format);

    match cli.command {
        Commands::Fetch {
            isins,
            file,
            output,
        } => fetch(config, isins, file.as_deref(), output).await,
        Commands::Analyze { path, json } => analyze(config, &path, json).await,
        Commands::Stamp {
            template,
            date,
            list,
        } => stamp_template(config, template, date, list).await,
        Commands::Taxonomy { output, json } => export_taxonomy(&config, output.as_deref(), json),
    }
}

async fn fetch(
    mut config: AppConfig,
    mut isins: Vec<String>,
    file: Option<&Path>,
    output: Option<PathBuf>,
) -> Result<()> {
    if let Some(file) = file {
        let content = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        isins.extend(read_isins(&content));
    }
    if isins.is_empty() {
        bail!("No ISIN codes provided");
    }
    if config.fetch.access_code.is_empty() {
        bail!("A Morningstar access code is required (config fetch.access_code or FUNDRISK_ACCESS_CODE)");
    }
    if let Some(output) = output {
        config.output_dir = output;
    }

    let ctx = AppContext::build(config).await?;
    let batch = ctx.fetch_funds(&isins, true).await?;

    println!("Processed {} funds", batch.records.len());
    println!(
        "Funds with standard risks: {}/{}",
        batch.summary.funds_with_standard_risks, batch.summary.total_funds
    );
    println!(
        "Funds with unclassified risks: {}/{}",
        batch.summary.funds_with_other_risks, batch.summary.total_funds
    );
    if let Some(path) = batch.csv_path {
        println!("Data exported to: {}", path.display());
    }
    Ok(())
}

/// One ISIN per line, blanks and surrounding whitespace dropped
fn read_isins(content: &str) -> impl Iterator<Item = String> + '_ {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
}

async fn analyze(config: AppConfig, path: &Path, json: bool) -> Result<()> {
    let ctx = AppContext::build(config).await?;
    let selector = BackendSelector::default();

    let documents = if path.is_dir() {
        ingest::ingest_directory(path, &selector).await?
    } else {
        vec![(
            path.display().to_string(),
            ingest::ingest_file(path, &selector).await?,
        )]
    };

    let mut results = Vec::with_capacity(documents.len());
    for (name, selected) in documents {
        let fields = match &selected {
            Some(selected) => ctx.analyze_text(&selected.text).await,
            None => Default::default(),
        };
        results.push(serde_json::json!({
            "document": name,
            "backend": selected.as_ref().map(|s| s.backend.clone()),
            "standard_risks": fields.standard_risks,
            "other_risks": fields.other_risks,
        }));

        if !json {
            println!("{name}");
            println!("  Key Risks for Investors: {}", fields.standard_risks);
            println!("  Other Risks: {}", fields.other_risks);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}

async fn stamp_template(config: AppConfig, template: Option<String>, date: Option<String>, list: bool) -> Result<()> {
    let stamper = config.stamper();

    if list {
        let templates = stamp::list_templates(stamper.output_dir())?;
        if templates.is_empty() {
            println!("No templates in {}", stamper.output_dir().display());
        }
        for (i, template) in templates.iter().enumerate() {
            println!("  {}. {}", i + 1, template.display());
        }
        return Ok(());
    }

    let Some(template) = template else {
        bail!("A template is required unless --list is given");
    };
    let template = config.resolve_template(&template);
    let date = date.unwrap_or_else(|| Local::now().format("%b %d").to_string());

    let outcome = tokio::task::spawn_blocking(move || stamper.stamp(&template, &date)).await??;
    println!(
        "Replaced '{}' with '{}' ({} replacements)",
        outcome.old_text, outcome.new_text, outcome.replacements
    );
    println!("Saved: {}", outcome.output_path.display());
    Ok(())
}

fn export_taxonomy(config: &AppConfig, output: Option<&Path>, json: bool) -> Result<()> {
    let taxonomy = config.taxonomy()?;
    let rendered = if json {
        serde_json::to_string_pretty(taxonomy.categories())?
    } else {
        taxonomy.export_text()
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Taxonomy written to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
