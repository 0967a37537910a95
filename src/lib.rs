//! Replay decoding and tensor encoding for training falling-block puzzle agents.

pub mod board;
pub mod codec;
pub mod error;
pub mod ml;
pub mod piece;
pub mod replay;

pub use crate::board::{BOARD_CELLS, BOARD_HEIGHT, BOARD_WIDTH, Board};
pub use crate::codec::{
    DEFAULT_SUFFIX, decode_replays, encode_replays, read_replays, replay_files, write_replays,
};
pub use crate::error::{CacheError, InvalidReplay, ReplayError};
pub use crate::ml::{
    DatasetStats, EncodedReplay, EvaluatorBatcher, FeatureCache, ReplayDataset, ReplayEncoder,
};
pub use crate::piece::{PieceKind, SpinKind};
pub use crate::replay::{MAX_QUEUE, PieceIdentity, PlayerId, Replay, ReplayState};
