use serde::{Deserialize, Serialize};

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Board};
use crate::error::InvalidReplay;
use crate::piece::{PIECE_KINDS, PieceKind, SpinKind};

/// Maximum number of preview pieces a replay may carry.
pub const MAX_QUEUE: usize = 18;
pub const PIECE_CELLS: usize = 4;

pub type PlayerId = u32;

/// A placed piece, identified by the cells it occupies.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(from = "RawPieceIdentity")]
pub struct PieceIdentity {
    pub cells: [(i8, i8); PIECE_CELLS],
    pub spin: SpinKind,
}

impl PieceIdentity {
    /// Sorts the cells so equal placements compare and hash equal.
    pub fn new(mut cells: [(i8, i8); PIECE_CELLS], spin: SpinKind) -> Self {
        cells.sort();
        Self { cells, spin }
    }

    pub fn is_spin(&self) -> bool {
        self.spin != SpinKind::None
    }
}

#[derive(Deserialize)]
struct RawPieceIdentity {
    cells: [(i8, i8); PIECE_CELLS],
    spin: SpinKind,
}

impl From<RawPieceIdentity> for PieceIdentity {
    fn from(raw: RawPieceIdentity) -> Self {
        Self::new(raw.cells, raw.spin)
    }
}

/// Game state observed right before the recorded action.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReplayState {
    pub board: Board,
    pub current: PieceKind,
    pub unhold: PieceKind,
    pub queue: Vec<PieceKind>,
    pub hold: Option<PieceKind>,
    pub ren: i8,
    pub b2b: bool,
    pub bag: Vec<PieceKind>,
}

/// One recorded state/action pair.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    pub player_id: PlayerId,
    pub frame: u64,
    pub state: ReplayState,
    pub action: PieceIdentity,
}

impl Replay {
    /// Checks the constraints the type system does not already enforce.
    pub fn validate(&self) -> Result<(), InvalidReplay> {
        if self.state.queue.len() > MAX_QUEUE {
            return Err(InvalidReplay::QueueLength(self.state.queue.len()));
        }
        for &(x, y) in &self.action.cells {
            if x < 0 || x as usize >= BOARD_WIDTH || y < 0 || y as usize >= BOARD_HEIGHT {
                return Err(InvalidReplay::CellOutOfBounds { x, y });
            }
        }
        let mut seen = [false; PIECE_KINDS];
        for kind in &self.state.bag {
            if std::mem::replace(&mut seen[kind.index()], true) {
                return Err(InvalidReplay::DuplicateBagPiece(*kind));
            }
        }
        Ok(())
    }
}
