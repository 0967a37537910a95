use burn::tensor::{Tensor, TensorData, backend::Backend};
use serde::{Deserialize, Serialize};

use crate::board::{BOARD_CELLS, BOARD_HEIGHT, BOARD_WIDTH};
use crate::piece::{PIECE_KINDS, PieceKind, SpinKind, bag_mask, one_hot, one_hot_opt};
use crate::replay::{MAX_QUEUE, Replay, ReplayState};

pub const BOARD_FEATURES: usize = BOARD_CELLS;
pub const PIECE_FEATURES: usize = PIECE_KINDS;
pub const QUEUE_FEATURES: usize = MAX_QUEUE * PIECE_KINDS;
pub const BAG_FEATURES: usize = PIECE_KINDS;
// current + unhold, queue, hold, bag, ren, b2b
pub const META_FEATURES: usize =
    2 * PIECE_FEATURES + QUEUE_FEATURES + PIECE_FEATURES + BAG_FEATURES + 1 + 1;
pub const SPIN_FEATURES: usize = 2;
pub const ACTION_FEATURES: usize = BOARD_CELLS + SPIN_FEATURES;

pub const SUGGEST_BOARD_ROWS: usize = 40;
pub const SUGGEST_BOARD_FEATURES: usize = BOARD_WIDTH * SUGGEST_BOARD_ROWS;
pub const SUGGEST_FEATURES: usize =
    SUGGEST_BOARD_FEATURES + QUEUE_FEATURES + PIECE_FEATURES + 1 + 1;
/// Divisor applied to the combo counter in the suggester input.
pub const REN_SCALE: f32 = 20.0;

#[inline]
fn put(out: &mut [f32], offset: &mut usize, values: &[f32]) {
    out[*offset..*offset + values.len()].copy_from_slice(values);
    *offset += values.len();
}

/// Queue one-hot rows, padded with zero rows up to `MAX_QUEUE`.
fn put_queue(out: &mut [f32], offset: &mut usize, queue: &[PieceKind]) {
    debug_assert!(queue.len() <= MAX_QUEUE);
    for kind in queue.iter().take(MAX_QUEUE) {
        put(out, offset, &one_hot(*kind));
    }
    *offset += (MAX_QUEUE - queue.len().min(MAX_QUEUE)) * PIECE_KINDS;
}

/// Evaluator features of one replay, flattened.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedReplay {
    pub board: Vec<f32>,
    pub meta: Vec<f32>,
    pub action: Vec<f32>,
}

pub struct ReplayEncoder;

impl ReplayEncoder {
    pub fn encode_board(state: &ReplayState) -> [f32; BOARD_FEATURES] {
        state.board.features()
    }

    pub fn encode_meta(state: &ReplayState) -> [f32; META_FEATURES] {
        let mut out = [0.0; META_FEATURES];
        let mut offset = 0;

        put(&mut out, &mut offset, &one_hot(state.current));
        put(&mut out, &mut offset, &one_hot(state.unhold));
        put_queue(&mut out, &mut offset, &state.queue);
        put(&mut out, &mut offset, &one_hot_opt(state.hold));
        put(&mut out, &mut offset, &bag_mask(&state.bag));
        out[offset] = state.ren as f32;
        offset += 1;
        out[offset] = if state.b2b { 1.0 } else { 0.0 };
        offset += 1;

        debug_assert_eq!(offset, META_FEATURES);
        out
    }

    /// Placement grid followed by the `[mini, full]` spin flags.
    pub fn encode_action(replay: &Replay) -> [f32; ACTION_FEATURES] {
        let mut out = [0.0; ACTION_FEATURES];
        for &(x, y) in &replay.action.cells {
            // validated replays never carry cells off the board
            if (0..BOARD_WIDTH as i8).contains(&x) && (0..BOARD_HEIGHT as i8).contains(&y) {
                out[x as usize * BOARD_HEIGHT + y as usize] = 1.0;
            }
        }
        match replay.action.spin {
            SpinKind::None => {}
            SpinKind::Mini => out[BOARD_CELLS] = 1.0,
            SpinKind::Full => out[BOARD_CELLS + 1] = 1.0,
        }
        out
    }

    pub fn encode(replay: &Replay) -> EncodedReplay {
        EncodedReplay {
            board: Self::encode_board(&replay.state).to_vec(),
            meta: Self::encode_meta(&replay.state).to_vec(),
            action: Self::encode_action(replay).to_vec(),
        }
    }

    /// Board `[10, 64]`, meta `[156]` and action `[642]` tensors.
    pub fn encode_tensors<B: Backend>(
        replay: &Replay,
        device: &B::Device,
    ) -> (Tensor<B, 2>, Tensor<B, 1>, Tensor<B, 1>) {
        let encoded = Self::encode(replay);
        let board = Tensor::<B, 2>::from_data(
            TensorData::new(encoded.board, [BOARD_WIDTH, BOARD_HEIGHT]),
            device,
        );
        let meta =
            Tensor::<B, 1>::from_data(TensorData::new(encoded.meta, [META_FEATURES]), device);
        let action =
            Tensor::<B, 1>::from_data(TensorData::new(encoded.action, [ACTION_FEATURES]), device);
        (board, meta, action)
    }
}

/// Board-only input used by the autoencoder experiments.
pub struct BoardEncoder;

impl BoardEncoder {
    pub fn encode(replay: &Replay) -> [f32; BOARD_FEATURES] {
        replay.state.board.features()
    }

    pub fn encode_tensor<B: Backend>(replay: &Replay, device: &B::Device) -> Tensor<B, 2> {
        let features = Self::encode(replay).to_vec();
        Tensor::<B, 2>::from_data(
            TensorData::new(features, [BOARD_WIDTH, BOARD_HEIGHT]),
            device,
        )
    }
}

/// Suggester input: the lower 40 rows, queue, hold, scaled ren and b2b.
pub struct SuggestEncoder;

impl SuggestEncoder {
    pub fn encode(state: &ReplayState) -> [f32; SUGGEST_FEATURES] {
        let mut out = [0.0; SUGGEST_FEATURES];
        let mut offset = 0;

        put(
            &mut out,
            &mut offset,
            &state.board.features_truncated(SUGGEST_BOARD_ROWS),
        );
        put_queue(&mut out, &mut offset, &state.queue);
        put(&mut out, &mut offset, &one_hot_opt(state.hold));
        out[offset] = state.ren as f32 / REN_SCALE;
        offset += 1;
        out[offset] = if state.b2b { 1.0 } else { 0.0 };
        offset += 1;

        debug_assert_eq!(offset, SUGGEST_FEATURES);
        out
    }

    pub fn encode_tensor<B: Backend>(state: &ReplayState, device: &B::Device) -> Tensor<B, 1> {
        let features = Self::encode(state).to_vec();
        Tensor::<B, 1>::from_data(TensorData::new(features, [SUGGEST_FEATURES]), device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::replay::PieceIdentity;
    use burn_ndarray::NdArray;

    fn sample() -> Replay {
        let mut board = Board::new();
        board.set(0, 0, true);
        board.set(9, 50, true);
        Replay {
            player_id: 0,
            frame: 7,
            state: ReplayState {
                board,
                current: PieceKind::T,
                unhold: PieceKind::O,
                queue: vec![PieceKind::I, PieceKind::L],
                hold: Some(PieceKind::S),
                ren: 4,
                b2b: true,
                bag: vec![PieceKind::Z, PieceKind::J],
            },
            action: PieceIdentity::new([(3, 0), (4, 0), (5, 0), (4, 1)], SpinKind::Mini),
        }
    }

    #[test]
    fn feature_sizes_match_model_inputs() {
        assert_eq!(BOARD_FEATURES, 640);
        assert_eq!(META_FEATURES, 156);
        assert_eq!(ACTION_FEATURES, 642);
        assert_eq!(SUGGEST_FEATURES, 535);
    }

    #[test]
    fn meta_layout_follows_field_order() {
        let meta = ReplayEncoder::encode_meta(&sample().state);
        // current T, unhold O
        assert_eq!(meta[2], 1.0);
        assert_eq!(meta[7 + 1], 1.0);
        // queue I then L, remaining rows zero
        assert_eq!(meta[14], 1.0);
        assert_eq!(meta[21 + 6], 1.0);
        assert!(meta[28..14 + QUEUE_FEATURES].iter().all(|v| *v == 0.0));
        let hold = 14 + QUEUE_FEATURES;
        assert_eq!(&meta[hold..hold + 7], &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        let bag = hold + 7;
        assert_eq!(&meta[bag..bag + 7], &[0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
        assert_eq!(meta[META_FEATURES - 2], 4.0);
        assert_eq!(meta[META_FEATURES - 1], 1.0);
        assert_eq!(meta.iter().sum::<f32>(), 1.0 + 1.0 + 2.0 + 1.0 + 2.0 + 4.0 + 1.0);
    }

    #[test]
    fn full_queue_fills_every_slot() {
        let mut replay = sample();
        replay.state.queue = vec![PieceKind::J; MAX_QUEUE];
        let meta = ReplayEncoder::encode_meta(&replay.state);
        let queue = &meta[14..14 + QUEUE_FEATURES];
        assert_eq!(queue.iter().sum::<f32>(), MAX_QUEUE as f32);
    }

    #[test]
    fn action_marks_cells_and_spin() {
        let action = ReplayEncoder::encode_action(&sample());
        for (x, y) in [(3usize, 0usize), (4, 0), (5, 0), (4, 1)] {
            assert_eq!(action[x * BOARD_HEIGHT + y], 1.0);
        }
        assert_eq!(action[..BOARD_CELLS].iter().sum::<f32>(), 4.0);
        assert_eq!(&action[BOARD_CELLS..], &[1.0, 0.0]);

        let mut full = sample();
        full.action.spin = SpinKind::Full;
        assert_eq!(&ReplayEncoder::encode_action(&full)[BOARD_CELLS..], &[0.0, 1.0]);
        full.action.spin = SpinKind::None;
        assert_eq!(&ReplayEncoder::encode_action(&full)[BOARD_CELLS..], &[0.0, 0.0]);
    }

    #[test]
    fn suggest_input_scales_ren_and_truncates_board() {
        let features = SuggestEncoder::encode(&sample().state);
        // the cell at row 50 is above the truncated window
        assert_eq!(features[..SUGGEST_BOARD_FEATURES].iter().sum::<f32>(), 1.0);
        assert_eq!(features[SUGGEST_BOARD_FEATURES], 1.0);
        assert_eq!(features[SUGGEST_FEATURES - 2], 4.0 / REN_SCALE);
        assert_eq!(features[SUGGEST_FEATURES - 1], 1.0);
    }

    #[test]
    fn tensors_have_expected_shapes() {
        let device = Default::default();
        let (board, meta, action) =
            ReplayEncoder::encode_tensors::<NdArray<f32>>(&sample(), &device);
        assert_eq!(board.dims(), [BOARD_WIDTH, BOARD_HEIGHT]);
        assert_eq!(meta.dims(), [META_FEATURES]);
        assert_eq!(action.dims(), [ACTION_FEATURES]);
        let values = board.into_data().to_vec::<f32>().expect("f32 data");
        assert_eq!(values[0], 1.0);
        assert_eq!(values.iter().sum::<f32>(), 2.0);

        let only_board = BoardEncoder::encode_tensor::<NdArray<f32>>(&sample(), &device);
        assert_eq!(only_board.dims(), [BOARD_WIDTH, BOARD_HEIGHT]);
        let suggest = SuggestEncoder::encode_tensor::<NdArray<f32>>(&sample().state, &device);
        assert_eq!(suggest.dims(), [SUGGEST_FEATURES]);
    }
}
