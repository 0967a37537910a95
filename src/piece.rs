use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::InvalidReplay;

/// Number of distinct piece kinds.
pub const PIECE_KINDS: usize = 7;

/// One of the seven tetromino shapes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    /// All kinds in one-hot order.
    pub const ALL: [PieceKind; PIECE_KINDS] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Position of this kind inside a one-hot vector.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            PieceKind::I => 0,
            PieceKind::O => 1,
            PieceKind::T => 2,
            PieceKind::S => 3,
            PieceKind::Z => 4,
            PieceKind::J => 5,
            PieceKind::L => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::O => "O",
            PieceKind::T => "T",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
            PieceKind::J => "J",
            PieceKind::L => "L",
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PieceKind {
    type Err = InvalidReplay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "I" => Ok(PieceKind::I),
            "O" => Ok(PieceKind::O),
            "T" => Ok(PieceKind::T),
            "S" => Ok(PieceKind::S),
            "Z" => Ok(PieceKind::Z),
            "J" => Ok(PieceKind::J),
            "L" => Ok(PieceKind::L),
            other => Err(InvalidReplay::PieceKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for PieceKind {
    type Error = InvalidReplay;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for PieceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Spin classification of a placement.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum SpinKind {
    #[default]
    None,
    Mini,
    Full,
}

impl SpinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SpinKind::None => "none",
            SpinKind::Mini => "mini",
            SpinKind::Full => "full",
        }
    }
}

impl fmt::Display for SpinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpinKind {
    type Err = InvalidReplay;

    // The game's data generator writes the capitalized variant names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "None" => Ok(SpinKind::None),
            "mini" | "Mini" => Ok(SpinKind::Mini),
            "full" | "Full" => Ok(SpinKind::Full),
            other => Err(InvalidReplay::SpinKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for SpinKind {
    type Error = InvalidReplay;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for SpinKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[inline]
pub fn one_hot(kind: PieceKind) -> [f32; PIECE_KINDS] {
    let mut out = [0.0; PIECE_KINDS];
    out[kind.index()] = 1.0;
    out
}

/// One-hot vector, or all zeros when no piece is present.
#[inline]
pub fn one_hot_opt(kind: Option<PieceKind>) -> [f32; PIECE_KINDS] {
    kind.map(one_hot).unwrap_or([0.0; PIECE_KINDS])
}

/// Marks every kind that is still present in the bag.
pub fn bag_mask(bag: &[PieceKind]) -> [f32; PIECE_KINDS] {
    let mut out = [0.0; PIECE_KINDS];
    for kind in bag {
        out[kind.index()] = 1.0;
    }
    out
}
