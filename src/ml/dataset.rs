use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use burn::data::dataset::Dataset;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::encoding::{BoardEncoder, EncodedReplay, ReplayEncoder, SuggestEncoder};
use crate::codec::{read_replays, replay_files};
use crate::error::ReplayError;
use crate::piece::SpinKind;
use crate::replay::Replay;

pub const DEFAULT_VALIDATION_SPLIT: f32 = 0.2;
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Immutable, cheaply cloneable list of replays.
#[derive(Clone, Debug, Default)]
pub struct ReplayDataset {
    replays: Arc<Vec<Replay>>,
}

impl ReplayDataset {
    pub fn from_replays(replays: Vec<Replay>) -> Self {
        Self {
            replays: Arc::new(replays),
        }
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        Ok(Self::from_replays(read_replays(path)?))
    }

    /// Loads every `*.{suffix}` file directly inside `dir`.
    pub fn load_dir(dir: impl AsRef<Path>, suffix: &str) -> Result<Self, ReplayError> {
        let dir = dir.as_ref();
        let files = replay_files(dir, suffix)?;
        let progress = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} files ({eta})",
        ) {
            progress.set_style(style.progress_chars("=>-"));
        }
        let mut replays = Vec::new();
        for path in &files {
            let mut batch = read_replays(path)?;
            replays.append(&mut batch);
            progress.inc(1);
        }
        progress.finish_and_clear();
        info!(
            "Loaded {} replays from {} files in {}",
            replays.len(),
            files.len(),
            dir.display()
        );
        Ok(Self::from_replays(replays))
    }

    pub fn len(&self) -> usize {
        self.replays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replays.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Replay> {
        self.replays.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Replay> {
        self.replays.iter()
    }

    pub fn replays(&self) -> &[Replay] {
        &self.replays
    }

    /// Deterministic shuffled split into `(train, validation)`.
    ///
    /// The training part keeps `floor(len * (1 - validation_fraction))` replays.
    pub fn split(&self, validation_fraction: f32, seed: u64) -> (Self, Self) {
        let mut replays: Vec<Replay> = self.replays.as_ref().clone();
        let mut rng = StdRng::seed_from_u64(seed);
        replays.shuffle(&mut rng);
        let validation = replays.split_off(train_size(replays.len(), validation_fraction));
        (Self::from_replays(replays), Self::from_replays(validation))
    }

    /// Lazily encoded view usable with burn data loaders.
    pub fn features<F: ReplayFeatures>(&self) -> FeatureDataset<F> {
        FeatureDataset {
            replays: Arc::clone(&self.replays),
            _features: PhantomData,
        }
    }

    pub fn stats(&self) -> DatasetStats {
        DatasetStats::collect(&self.replays)
    }
}

/// Number of replays kept for training, `floor(len * (1 - validation_fraction))`.
///
/// The fraction is clamped to `[0, 1]` and read to six decimal places, so
/// `0.2f32` means exactly one fifth; NaN counts as no validation set.
pub fn train_size(len: usize, validation_fraction: f32) -> usize {
    let fraction = if validation_fraction.is_nan() {
        0.0
    } else {
        (f64::from(validation_fraction.clamp(0.0, 1.0)) * 1e6).round() / 1e6
    };
    ((len as f64 * (1.0 - fraction)).floor() as usize).min(len)
}

impl From<Vec<Replay>> for ReplayDataset {
    fn from(value: Vec<Replay>) -> Self {
        Self::from_replays(value)
    }
}

/// Chooses how a replay is turned into a training item.
pub trait ReplayFeatures: Send + Sync + 'static {
    type Item: Clone + Send + Sync;

    fn features(replay: &Replay) -> Self::Item;
}

/// Board, meta and action vectors for the evaluator.
pub struct EvaluatorFeatures;

impl ReplayFeatures for EvaluatorFeatures {
    type Item = EncodedReplay;

    fn features(replay: &Replay) -> Self::Item {
        ReplayEncoder::encode(replay)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoardSample {
    pub board: Vec<f32>,
}

/// Board occupancy only, for the autoencoder.
pub struct BoardFeatures;

impl ReplayFeatures for BoardFeatures {
    type Item = BoardSample;

    fn features(replay: &Replay) -> Self::Item {
        BoardSample {
            board: BoardEncoder::encode(replay).to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SuggestSample {
    pub input: Vec<f32>,
    pub target: Vec<f32>,
}

/// Suggester input paired with the placement that was actually played.
pub struct SuggestFeatures;

impl ReplayFeatures for SuggestFeatures {
    type Item = SuggestSample;

    fn features(replay: &Replay) -> Self::Item {
        SuggestSample {
            input: SuggestEncoder::encode(&replay.state).to_vec(),
            target: ReplayEncoder::encode_action(replay).to_vec(),
        }
    }
}

pub struct FeatureDataset<F: ReplayFeatures> {
    replays: Arc<Vec<Replay>>,
    _features: PhantomData<fn() -> F>,
}

impl<F: ReplayFeatures> Clone for FeatureDataset<F> {
    fn clone(&self) -> Self {
        Self {
            replays: Arc::clone(&self.replays),
            _features: PhantomData,
        }
    }
}

impl<F: ReplayFeatures> Dataset<F::Item> for FeatureDataset<F> {
    fn get(&self, index: usize) -> Option<F::Item> {
        self.replays.get(index).map(F::features)
    }

    fn len(&self) -> usize {
        self.replays.len()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpinCounts {
    pub none: usize,
    pub mini: usize,
    pub full: usize,
}

/// Aggregate description of a replay collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub records: usize,
    pub players: usize,
    pub spins: SpinCounts,
    pub mean_queue: f32,
    pub b2b_rate: f32,
    pub hold_rate: f32,
    pub mean_height: f32,
    pub max_height: u32,
}

impl DatasetStats {
    pub fn collect(replays: &[Replay]) -> Self {
        let mut stats = DatasetStats {
            records: replays.len(),
            ..Default::default()
        };
        if replays.is_empty() {
            return stats;
        }
        let mut players = BTreeSet::new();
        let mut queue_total = 0usize;
        let mut b2b = 0usize;
        let mut holds = 0usize;
        let mut height_total = 0u64;
        for replay in replays {
            players.insert(replay.player_id);
            match replay.action.spin {
                SpinKind::None => stats.spins.none += 1,
                SpinKind::Mini => stats.spins.mini += 1,
                SpinKind::Full => stats.spins.full += 1,
            }
            queue_total += replay.state.queue.len();
            b2b += usize::from(replay.state.b2b);
            holds += usize::from(replay.state.hold.is_some());
            let height = replay.state.board.max_height();
            height_total += u64::from(height);
            stats.max_height = stats.max_height.max(height);
        }
        let total = replays.len() as f32;
        stats.players = players.len();
        stats.mean_queue = queue_total as f32 / total;
        stats.b2b_rate = b2b as f32 / total;
        stats.hold_rate = holds as f32 / total;
        stats.mean_height = height_total as f32 / total;
        stats
    }
}
