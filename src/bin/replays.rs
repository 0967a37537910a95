use std::error::Error;
use std::path::PathBuf;

use burn_ndarray::{NdArray, NdArrayDevice};
use clap::{Args, Parser, Subcommand};
use log::info;

use hikari_data::ml::{DEFAULT_SPLIT_SEED, DEFAULT_VALIDATION_SPLIT, FeatureCache, ReplayDataset};
use hikari_data::{DEFAULT_SUFFIX, ReplayEncoder, read_replays};

type InspectBackend = NdArray<f32>;

/// Inspect and preprocess replay data for training.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every record of a replay file.
    Dump {
        file: PathBuf,
    },
    /// Show one record together with its encoded tensors.
    Inspect {
        file: PathBuf,
        /// Index of the record within the file.
        #[arg(long, default_value_t = 0)]
        index: usize,
    },
    /// Summarize every replay file in a directory.
    Stats {
        #[command(flatten)]
        source: SourceArgs,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Report the train/validation split of a directory.
    Split {
        #[command(flatten)]
        source: SourceArgs,
        /// Fraction of replays held out for validation.
        #[arg(long, default_value_t = DEFAULT_VALIDATION_SPLIT)]
        validation: f32,
        /// Seed of the split shuffle.
        #[arg(long, default_value_t = DEFAULT_SPLIT_SEED)]
        seed: u64,
    },
    /// Encode a directory once and store the features with bincode.
    Cache {
        #[command(flatten)]
        source: SourceArgs,
        /// Destination of the feature cache.
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Directory holding replay files.
    dir: PathBuf,
    /// Extension of replay files inside the directory.
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    suffix: String,
}

impl SourceArgs {
    fn load(&self) -> Result<ReplayDataset, Box<dyn Error>> {
        Ok(ReplayDataset::load_dir(&self.dir, &self.suffix)?)
    }
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Dump { file } => dump(file),
        Command::Inspect { file, index } => inspect(file, index),
        Command::Stats { source, json } => stats(&source, json),
        Command::Split {
            source,
            validation,
            seed,
        } => split(&source, validation, seed),
        Command::Cache { source, out } => cache(&source, out),
    }
}

fn dump(file: PathBuf) -> Result<(), Box<dyn Error>> {
    for replay in read_replays(&file)? {
        println!("{replay:?}");
    }
    Ok(())
}

fn inspect(file: PathBuf, index: usize) -> Result<(), Box<dyn Error>> {
    let replays = read_replays(&file)?;
    let total = replays.len();
    let replay = replays
        .get(index)
        .ok_or_else(|| format!("record {index} out of range, file holds {total}"))?;
    let state = &replay.state;
    println!(
        "player {} frame {} ({}/{})",
        replay.player_id,
        replay.frame,
        index + 1,
        total
    );
    print!("{}", state.board);
    let queue: String = state.queue.iter().map(|kind| kind.as_str()).collect();
    let bag: String = state.bag.iter().map(|kind| kind.as_str()).collect();
    println!(
        "current {} unhold {} hold {} queue [{queue}] bag [{bag}] ren {} b2b {}",
        state.current,
        state.unhold,
        state
            .hold
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "-".to_string()),
        state.ren,
        state.b2b
    );
    println!("action {:?} spin {}", replay.action.cells, replay.action.spin);

    let device = NdArrayDevice::Cpu;
    let (board, meta, action) = ReplayEncoder::encode_tensors::<InspectBackend>(replay, &device);
    println!("board tensor {:?}", board.dims());
    println!("meta tensor {:?}", meta.dims());
    println!("action tensor {:?}", action.dims());
    let meta_values = meta.into_data().to_vec::<f32>().map_err(|err| format!("{err:?}"))?;
    println!("meta {meta_values:?}");
    Ok(())
}

fn stats(source: &SourceArgs, json: bool) -> Result<(), Box<dyn Error>> {
    let stats = source.load()?.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("records      {}", stats.records);
    println!("players      {}", stats.players);
    println!(
        "spins        none {} / mini {} / full {}",
        stats.spins.none, stats.spins.mini, stats.spins.full
    );
    println!("mean queue   {:.2}", stats.mean_queue);
    println!("b2b rate     {:.3}", stats.b2b_rate);
    println!("hold rate    {:.3}", stats.hold_rate);
    println!("mean height  {:.2}", stats.mean_height);
    println!("max height   {}", stats.max_height);
    Ok(())
}

fn split(source: &SourceArgs, validation: f32, seed: u64) -> Result<(), Box<dyn Error>> {
    if !(0.0..1.0).contains(&validation) {
        return Err(format!("validation fraction must be in [0, 1), got {validation}").into());
    }
    let dataset = source.load()?;
    let (train, valid) = dataset.split(validation, seed);
    println!("{} {}", train.len(), valid.len());
    Ok(())
}

fn cache(source: &SourceArgs, out: PathBuf) -> Result<(), Box<dyn Error>> {
    let dataset = source.load()?;
    let cache = FeatureCache::build(&dataset);
    cache.save(&out)?;
    info!("cached {} samples", cache.len());
    Ok(())
}
