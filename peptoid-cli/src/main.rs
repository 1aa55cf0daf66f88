use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use peptoid_synth::{generate_peptoid_strings, Assembler, SynthesisConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate random peptoid libraries and assemble them into SMILES.
#[derive(Parser, Debug)]
#[command(name = "peptoid", author, version, about, long_about = None)]
struct Cli {
    /// Synthesis config (TOML); defaults to the bundled demo library
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print random distinct sequences, one per line
    Generate {
        /// Number of sequences
        #[arg(short = 'n', long)]
        count: usize,
        /// Residues per sequence
        #[arg(short, long)]
        length: usize,
        /// Monomer codes to draw from (default: library codes minus the start code)
        #[arg(short, long)]
        alphabet: Option<String>,
        /// RNG seed (overrides the config seed)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Assemble sequences, printing `sequence<TAB>smiles`
    Assemble {
        #[arg(required = true)]
        sequences: Vec<String>,
    },
    /// Generate and assemble, printing `id<TAB>sequence<TAB>formula<TAB>mw<TAB>smiles`
    Library {
        #[arg(short = 'n', long)]
        count: usize,
        #[arg(short, long)]
        length: usize,
        #[arg(short, long)]
        alphabet: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_ref())?;
    let assembler = Assembler::from_config(&config).context("failed to build assembler")?;

    match cli.command {
        Commands::Generate {
            count,
            length,
            alphabet,
            seed,
        } => {
            let sequences = generate(&assembler, &config, count, length, alphabet, seed)?;
            for seq in sequences {
                println!("{seq}");
            }
        }
        Commands::Assemble { sequences } => {
            for seq in &sequences {
                let product = assembler
                    .assemble(seq)
                    .with_context(|| format!("failed to assemble {seq}"))?;
                println!("{}\t{}", product.sequence, product.smiles);
            }
            info!(assembled = sequences.len(), "done");
        }
        Commands::Library {
            count,
            length,
            alphabet,
            seed,
        } => {
            let sequences = generate(&assembler, &config, count, length, alphabet, seed)?;
            for seq in &sequences {
                let product = assembler
                    .assemble(seq)
                    .with_context(|| format!("failed to assemble {seq}"))?;
                println!(
                    "{}\t{}\t{}\t{:.3}\t{}",
                    product.id,
                    product.sequence,
                    product.formula,
                    product.molecular_weight,
                    product.smiles
                );
            }
            info!(assembled = sequences.len(), "library complete");
        }
    }

    Ok(())
}

/// Config from `path`, or the bundled library.
fn load_config(path: Option<&PathBuf>) -> Result<SynthesisConfig> {
    match path {
        Some(path) => SynthesisConfig::from_file(path)
            .with_context(|| format!("invalid config {}", path.display())),
        None => SynthesisConfig::bundled().context("bundled library is invalid"),
    }
}

fn generate(
    assembler: &Assembler,
    config: &SynthesisConfig,
    count: usize,
    length: usize,
    alphabet: Option<String>,
    seed: Option<u64>,
) -> Result<Vec<String>> {
    let alphabet: Vec<char> = match alphabet {
        Some(codes) => codes.chars().filter(|c| !c.is_whitespace() && *c != ',').collect(),
        None => assembler.alphabet(),
    };
    let mut rng = match seed.or(config.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    info!(count, length, alphabet = %alphabet.iter().collect::<String>(), "generating sequences");
    generate_peptoid_strings(count, length, &alphabet, &mut rng)
        .context("sequence generation failed")
}
