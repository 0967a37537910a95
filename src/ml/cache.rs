use std::fs;
use std::path::Path;

use burn::data::dataset::Dataset;
use log::info;
use serde::{Deserialize, Serialize};

use super::dataset::ReplayDataset;
use super::encoding::{ACTION_FEATURES, BOARD_FEATURES, EncodedReplay, META_FEATURES, ReplayEncoder};
use crate::error::CacheError;

/// Bumped whenever the evaluator feature layout changes.
pub const CACHE_VERSION: u32 = 1;

/// Evaluator features of a whole dataset, encoded once and stored with bincode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureCache {
    pub version: u32,
    pub samples: Vec<EncodedReplay>,
}

impl FeatureCache {
    pub fn build(dataset: &ReplayDataset) -> Self {
        Self {
            version: CACHE_VERSION,
            samples: dataset.iter().map(ReplayEncoder::encode).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CacheError> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CacheError> {
        let (cache, _): (FeatureCache, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        if cache.version != CACHE_VERSION {
            return Err(CacheError::Version {
                found: cache.version,
                expected: CACHE_VERSION,
            });
        }
        cache.check_shapes()?;
        Ok(cache)
    }

    /// Every sample must match the evaluator layout the batcher stacks.
    fn check_shapes(&self) -> Result<(), CacheError> {
        for (index, sample) in self.samples.iter().enumerate() {
            for (part, len, expected) in [
                ("board", sample.board.len(), BOARD_FEATURES),
                ("meta", sample.meta.len(), META_FEATURES),
                ("action", sample.action.len(), ACTION_FEATURES),
            ] {
                if len != expected {
                    return Err(CacheError::SampleShape {
                        index,
                        part,
                        len,
                        expected,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CacheError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "Wrote {} cached samples ({} bytes) to {}",
            self.samples.len(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn into_dataset(self) -> CachedDataset {
        CachedDataset {
            samples: self.samples,
        }
    }
}

/// Pre-encoded evaluator items, served without touching the replays again.
#[derive(Clone, Debug, Default)]
pub struct CachedDataset {
    samples: Vec<EncodedReplay>,
}

impl Dataset<EncodedReplay> for CachedDataset {
    fn get(&self, index: usize) -> Option<EncodedReplay> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::piece::{PieceKind, SpinKind};
    use crate::replay::{PieceIdentity, Replay, ReplayState};

    fn dataset() -> ReplayDataset {
        let mut board = Board::new();
        board.set(2, 0, true);
        let replay = Replay {
            player_id: 3,
            frame: 99,
            state: ReplayState {
                board,
                current: PieceKind::S,
                unhold: PieceKind::Z,
                queue: vec![PieceKind::L, PieceKind::J, PieceKind::O],
                hold: Some(PieceKind::I),
                ren: 2,
                b2b: true,
                bag: vec![PieceKind::T],
            },
            action: PieceIdentity::new([(0, 0), (0, 1), (0, 2), (0, 3)], SpinKind::None),
        };
        ReplayDataset::from_replays(vec![replay.clone(), replay])
    }

    #[test]
    fn bytes_restore_the_same_samples() {
        let cache = FeatureCache::build(&dataset());
        assert_eq!(cache.len(), 2);
        let bytes = cache.to_bytes().expect("encode");
        let restored = FeatureCache::from_bytes(&bytes).expect("decode");
        assert_eq!(restored, cache);

        let served = restored.into_dataset();
        assert_eq!(served.len(), 2);
        assert_eq!(
            served.get(0),
            Some(ReplayEncoder::encode(&dataset().replays()[0]))
        );
        assert!(served.get(2).is_none());
    }

    #[test]
    fn stale_versions_are_rejected() {
        let mut cache = FeatureCache::build(&dataset());
        cache.version = CACHE_VERSION + 1;
        let bytes = cache.to_bytes().expect("encode");
        match FeatureCache::from_bytes(&bytes) {
            Err(CacheError::Version { found, expected }) => {
                assert_eq!(found, CACHE_VERSION + 1);
                assert_eq!(expected, CACHE_VERSION);
            }
            other => panic!("expected a version error, got {other:?}"),
        }
    }

    #[test]
    fn misshapen_samples_are_rejected() {
        let mut cache = FeatureCache::build(&dataset());
        cache.samples[1].board = vec![0.0; 10];
        let bytes = cache.to_bytes().expect("encode");
        match FeatureCache::from_bytes(&bytes) {
            Err(CacheError::SampleShape {
                index,
                part,
                len,
                expected,
            }) => {
                assert_eq!((index, part, len, expected), (1, "board", 10, BOARD_FEATURES));
            }
            other => panic!("expected a shape error, got {other:?}"),
        }

        let mut cache = FeatureCache::build(&dataset());
        cache.samples[0].action.pop();
        let bytes = cache.to_bytes().expect("encode");
        assert!(matches!(
            FeatureCache::from_bytes(&bytes),
            Err(CacheError::SampleShape { index: 0, part: "action", .. })
        ));
    }

    #[test]
    fn truncated_bytes_fail_to_decode() {
        let bytes = FeatureCache::build(&dataset()).to_bytes().expect("encode");
        assert!(matches!(
            FeatureCache::from_bytes(&bytes[..bytes.len() / 2]),
            Err(CacheError::Decode(_))
        ));
    }
}
