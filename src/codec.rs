//! Reading and writing MessagePack replay files.
//!
//! A replay file is a single top-level array of `Replay` records. Records are
//! written as maps keyed by field name; positional arrays decode as well.

use std::cell::Cell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserializer as _;
use serde::de::{SeqAccess, Visitor};

use crate::error::ReplayError;
use crate::replay::Replay;

/// Extension of replay files inside a data directory.
pub const DEFAULT_SUFFIX: &str = "bin";

/// Collects the top-level array, remembering which record is being decoded.
struct Records<'a> {
    current: &'a Cell<Option<usize>>,
}

impl<'de> Visitor<'de> for Records<'_> {
    type Value = Vec<Replay>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of replay records")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut replays = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        self.current.set(Some(0));
        while let Some(replay) = seq.next_element::<Replay>()? {
            replays.push(replay);
            self.current.set(Some(replays.len()));
        }
        Ok(replays)
    }
}

/// Decodes and validates every record in `bytes`.
///
/// Schema errors inside a record surface as `MalformedRecord` carrying its
/// index; a file that is not an array at all is a plain `Decode` error.
pub fn decode_replays(bytes: &[u8]) -> Result<Vec<Replay>, ReplayError> {
    let current = Cell::new(None);
    let mut de = rmp_serde::Deserializer::from_read_ref(bytes);
    let replays = de
        .deserialize_seq(Records { current: &current })
        .map_err(|source| match current.get() {
            Some(index) => ReplayError::MalformedRecord { index, source },
            None => ReplayError::Decode(source),
        })?;
    for (index, replay) in replays.iter().enumerate() {
        replay
            .validate()
            .map_err(|reason| ReplayError::InvalidRecord { index, reason })?;
    }
    Ok(replays)
}

pub fn encode_replays(replays: &[Replay]) -> Result<Vec<u8>, ReplayError> {
    Ok(rmp_serde::to_vec_named(replays)?)
}

pub fn read_replays(path: impl AsRef<Path>) -> Result<Vec<Replay>, ReplayError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| ReplayError::io(path, err))?;
    let replays = decode_replays(&bytes)?;
    debug!("decoded {} replays from {}", replays.len(), path.display());
    Ok(replays)
}

pub fn write_replays(path: impl AsRef<Path>, replays: &[Replay]) -> Result<(), ReplayError> {
    let path = path.as_ref();
    let bytes = encode_replays(replays)?;
    fs::write(path, bytes).map_err(|err| ReplayError::io(path, err))
}

/// Regular files directly inside `dir` whose extension is `suffix`, sorted by path.
pub fn replay_files(dir: impl AsRef<Path>, suffix: &str) -> Result<Vec<PathBuf>, ReplayError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ReplayError::NotADirectory(dir.to_path_buf()));
    }
    let suffix = suffix.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|err| ReplayError::io(dir, err))? {
        let path = entry.map_err(|err| ReplayError::io(dir, err))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == suffix) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
