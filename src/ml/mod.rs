pub mod batcher;
pub mod cache;
pub mod dataset;
pub mod encoding;

pub use batcher::{
    BoardBatch, BoardBatcher, EvaluatorBatch, EvaluatorBatcher, SuggestBatch, SuggestBatcher,
};
pub use cache::{CACHE_VERSION, CachedDataset, FeatureCache};
pub use dataset::{
    BoardFeatures, BoardSample, DEFAULT_SPLIT_SEED, DEFAULT_VALIDATION_SPLIT, DatasetStats,
    EvaluatorFeatures, FeatureDataset, ReplayDataset, ReplayFeatures, SpinCounts, SuggestFeatures,
    SuggestSample, train_size,
};
pub use encoding::{
    ACTION_FEATURES, BOARD_FEATURES, BoardEncoder, EncodedReplay, META_FEATURES, ReplayEncoder,
    SUGGEST_FEATURES, SuggestEncoder,
};
