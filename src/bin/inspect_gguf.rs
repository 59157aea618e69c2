use anyhow::Context;
use clap::{Parser, Subcommand};
use gguf_theta::loader::{load_file_with, load_properties, LoadOptions, StorageMode};
use gguf_theta::tensor::TensorSummary;
use gguf_theta::{PropertyValue, TokenEmbedding};
use std::path::PathBuf;

/// Arrays longer than this are elided in human-readable output
const MAX_ARRAY_PREVIEW: usize = 8;

#[derive(Parser, Debug)]
#[command(name = "gguf-inspect", version)]
#[command(about = "Inspect the properties and tensors of a GGUF file", long_about = None)]
struct Cli {
    /// Path to the GGUF file
    gguf: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print metadata properties (tensor data is never read)
    Properties {
        /// Emit a JSON object instead of one line per property
        #[arg(long)]
        json: bool,
    },
    /// List tensors with logical shapes and encodings
    Tensors {
        /// Only tensors whose name starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        json: bool,
        /// Storage mode: mmap or copy (defaults to GGUF_THETA_STORAGE)
        #[arg(long)]
        storage: Option<StorageMode>,
    },
    /// Look up embedding rows for token ids
    Embed {
        /// Name of the embedding weight
        #[arg(long, default_value = "token_embd.weight")]
        weight: String,
        /// Token ids
        #[arg(required = true)]
        ids: Vec<u32>,
    },
}

fn main() -> anyhow::Result<()> {
    gguf_theta::init_logging_default();
    let cli = Cli::parse();

    match cli.command {
        Commands::Properties { json } => {
            let props = load_properties(&cli.gguf)
                .with_context(|| format!("failed to read properties of {}", cli.gguf.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&props)?);
            } else {
                for (name, value) in &props {
                    println!("{} = {}", name, preview(value));
                }
            }
        }
        Commands::Tensors {
            prefix,
            json,
            storage,
        } => {
            let mut options = LoadOptions::from_env()?;
            if let Some(mode) = storage {
                options = options.with_storage_mode(mode);
            }
            let dataset = load_file_with(&cli.gguf, &options)
                .with_context(|| format!("failed to load {}", cli.gguf.display()))?;

            let summaries: Vec<TensorSummary> = dataset
                .root_theta()
                .iter()
                .filter(|(name, _)| prefix.as_deref().map_or(true, |p| name.starts_with(p)))
                .map(|(_, tensor)| tensor.summary())
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                for s in &summaries {
                    println!("{:<48} {:<10} {:?} ({} bytes)", s.name, s.encoding, s.shape, s.nbytes);
                }
                let total: usize = summaries.iter().map(|s| s.nbytes).sum();
                println!("{} tensors, {:.1} MiB", summaries.len(), total as f64 / (1024.0 * 1024.0));
            }
        }
        Commands::Embed { weight, ids } => {
            let dataset = load_file_with(&cli.gguf, &LoadOptions::from_env()?)
                .with_context(|| format!("failed to load {}", cli.gguf.display()))?;
            let embedding = TokenEmbedding::new(dataset.root_theta(), &weight)?;
            for (id, row) in ids.iter().zip(embedding.forward(&ids)?) {
                let head: Vec<String> = row.iter().take(MAX_ARRAY_PREVIEW).map(|v| format!("{:.4}", v)).collect();
                println!("{:>8}: [{}{}]", id, head.join(", "), if row.len() > MAX_ARRAY_PREVIEW { ", ..." } else { "" });
            }
        }
    }

    Ok(())
}

fn preview(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Array(items) if items.len() > MAX_ARRAY_PREVIEW => {
            let head: Vec<String> = items.iter().take(MAX_ARRAY_PREVIEW).map(|v| v.to_string()).collect();
            format!("[{}, ... ({} items)]", head.join(", "), items.len())
        }
        other => other.to_string(),
    }
}
