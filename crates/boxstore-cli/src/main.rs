//! boxstore CLI
//!
//! - `info`: tally the keys of a record store
//! - `show`: load one sample and print its shapes and targets as JSON
//! - `verify`: load every sample in a range and report the ones that fail
//! - `pack`: build a record store from a directory of `{id}.jpg` / `{id}.json`

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use boxstore_store::{
    DatasetConfig, DirectorySource, RedbStore, ResizeFilter, StoreDataset, StoreWriter,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::json;

mod logging;

#[derive(Parser)]
#[command(name = "boxstore")]
#[command(
    author,
    version,
    about = "boxstore: detection datasets in an embedded key-value store"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count image/annotation keys and list unpaired or foreign ones.
    Info {
        /// Record store (redb file)
        #[arg(long)]
        store: PathBuf,
        /// Print the tally as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load one sample and print a JSON summary of it.
    Show {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Local index within the dataset range
        #[arg(long, default_value_t = 0)]
        index: usize,
    },

    /// Load every sample in the range and report failures.
    ///
    /// Exits non-zero if any sample fails.
    Verify {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Build a record store from `{id}.jpg` + `{id}.json` files.
    Pack {
        /// Directory holding the files
        #[arg(long)]
        dir: PathBuf,
        /// Store to create (or add to)
        #[arg(long)]
        out: PathBuf,
        /// First record index to pack
        #[arg(long, default_value_t = 0)]
        start: usize,
        /// Last record index to pack (inclusive)
        #[arg(long)]
        end: usize,
    },
}

/// Dataset selection: a JSON config, individual flags, or both (flags win).
#[derive(Args)]
struct DatasetArgs {
    /// Dataset config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Record store (redb file)
    #[arg(long)]
    store: Option<PathBuf>,
    /// First store index (inclusive)
    #[arg(long)]
    start: Option<usize>,
    /// Last store index (inclusive); defaults to the last record in the store
    #[arg(long)]
    end: Option<usize>,
    /// Resize width
    #[arg(long)]
    width: Option<u32>,
    /// Resize height
    #[arg(long)]
    height: Option<u32>,
    /// Resampling filter
    #[arg(long, value_enum)]
    filter: Option<FilterArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl From<FilterArg> for ResizeFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Nearest => ResizeFilter::Nearest,
            FilterArg::Triangle => ResizeFilter::Triangle,
            FilterArg::CatmullRom => ResizeFilter::CatmullRom,
            FilterArg::Gaussian => ResizeFilter::Gaussian,
            FilterArg::Lanczos3 => ResizeFilter::Lanczos3,
        }
    }
}

impl DatasetArgs {
    fn resolve(&self) -> Result<DatasetConfig> {
        let mut config = match &self.config {
            Some(path) => DatasetConfig::from_json_file(path)?,
            None => {
                let store = self
                    .store
                    .clone()
                    .ok_or_else(|| anyhow!("either --config or --store is required"))?;
                let mut config = DatasetConfig::new(store, 0, 0);
                if self.end.is_none() {
                    config.end_index = last_index(&config.store_path)?;
                }
                config
            }
        };

        if let Some(store) = &self.store {
            config.store_path = store.clone();
        }
        if let Some(start) = self.start {
            config.start_index = start;
        }
        if let Some(end) = self.end {
            config.end_index = end;
        }
        if let Some(width) = self.width {
            config.transform.width = width;
        }
        if let Some(height) = self.height {
            config.transform.height = height;
        }
        if let Some(filter) = self.filter {
            config.transform.filter = filter.into();
        }
        Ok(config)
    }
}

/// Largest record index present in the store.
fn last_index(store: &Path) -> Result<usize> {
    let reader = RedbStore::open(store)?;
    let census = reader.census()?;
    reader.close();
    census
        .index_span
        .map(|(_, last)| last)
        .ok_or_else(|| anyhow!("store {} holds no records", store.display()))
}

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { store, json } => cmd_info(&store, json),
        Commands::Show { dataset, index } => cmd_show(&dataset.resolve()?, index),
        Commands::Verify { dataset } => cmd_verify(&dataset.resolve()?),
        Commands::Pack {
            dir,
            out,
            start,
            end,
        } => cmd_pack(&dir, &out, start, end),
    }
}

fn cmd_info(store: &Path, as_json: bool) -> Result<()> {
    let reader = RedbStore::open(store)?;
    let census = reader
        .census()
        .with_context(|| format!("reading keys of {}", store.display()))?;
    reader.close();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&census)?);
        return Ok(());
    }

    println!("{} {}", "Store".green().bold(), store.display());
    println!("  images:      {}", census.images);
    println!("  annotations: {}", census.annotations);
    match census.index_span {
        Some((first, last)) => println!("  index span:  {first}..={last}"),
        None => println!("  index span:  (empty)"),
    }
    if !census.unpaired.is_empty() {
        println!("  {} {}", "unpaired:".yellow(), census.unpaired.join(", "));
    }
    if !census.unrecognized.is_empty() {
        println!(
            "  {} {}",
            "unrecognized keys:".yellow(),
            census.unrecognized.join(", ")
        );
    }
    Ok(())
}

fn cmd_show(config: &DatasetConfig, index: usize) -> Result<()> {
    let dataset = StoreDataset::open(config)?;
    let sample = dataset
        .get(index)
        .with_context(|| format!("loading sample {index}"))?;
    dataset.close();

    let boxes: Vec<Vec<f32>> = sample
        .target
        .boxes
        .rows()
        .into_iter()
        .map(|row| row.to_vec())
        .collect();
    let summary = json!({
        "id": sample.id.to_string(),
        "store_index": sample.id.index(),
        "image_shape": sample.image.shape(),
        "objects": sample.target.len(),
        "boxes": boxes,
        "labels": sample.target.labels.to_vec(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_verify(config: &DatasetConfig) -> Result<()> {
    let dataset = StoreDataset::open(config)?;
    let total = dataset.len();
    let mut failed = 0usize;

    for (local, result) in dataset.iter().enumerate() {
        if let Err(err) = result {
            failed += 1;
            let store_index = local + dataset.start_index();
            tracing::warn!(index = store_index, error = %err, "sample failed");
            println!("{} {store_index}: {err}", "FAIL".red().bold());
        }
    }
    dataset.close();

    let ok = total - failed;
    println!(
        "{} {ok} ok, {failed} failed ({total} samples)",
        if failed == 0 {
            "Verified".green().bold()
        } else {
            "Verified".yellow().bold()
        }
    );
    if failed > 0 {
        bail!("{failed} of {total} samples failed");
    }
    Ok(())
}

fn cmd_pack(dir: &Path, out: &Path, start: usize, end: usize) -> Result<()> {
    println!("{} {} -> {}", "Packing".green().bold(), dir.display(), out.display());

    let source = DirectorySource::from_dir(dir);
    let writer = StoreWriter::create(out)?;
    let report = writer
        .copy_from(&source, start, end)
        .with_context(|| format!("packing {}", dir.display()))?;
    writer.finish();

    println!(
        "  {} records ({} image bytes, {} annotation bytes)",
        report.records, report.image_bytes, report.annotation_bytes
    );
    Ok(())
}
