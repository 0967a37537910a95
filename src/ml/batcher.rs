use burn::data::dataloader::batcher::Batcher;
use burn::tensor::{Tensor, TensorData, backend::Backend};

use super::dataset::{BoardSample, SuggestSample};
use super::encoding::{
    ACTION_FEATURES, BOARD_FEATURES, EncodedReplay, META_FEATURES, SUGGEST_FEATURES,
};
use crate::board::{BOARD_HEIGHT, BOARD_WIDTH};

fn stack<B: Backend, const D: usize>(
    values: Vec<f32>,
    shape: [usize; D],
    device: &B::Device,
) -> Tensor<B, D> {
    Tensor::<B, D>::from_data(TensorData::new(values, shape), device)
}

#[derive(Clone, Debug)]
pub struct EvaluatorBatch<B: Backend> {
    /// `[batch, 1, 10, 64]`
    pub boards: Tensor<B, 4>,
    pub meta: Tensor<B, 2>,
    pub actions: Tensor<B, 2>,
}

impl<B: Backend> EvaluatorBatch<B> {
    pub fn sample_count(&self) -> usize {
        self.boards.dims()[0]
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EvaluatorBatcher;

impl<B: Backend> Batcher<B, EncodedReplay, EvaluatorBatch<B>> for EvaluatorBatcher {
    fn batch(&self, items: Vec<EncodedReplay>, device: &B::Device) -> EvaluatorBatch<B> {
        let batch_size = items.len();
        let mut boards = Vec::with_capacity(batch_size * BOARD_FEATURES);
        let mut meta = Vec::with_capacity(batch_size * META_FEATURES);
        let mut actions = Vec::with_capacity(batch_size * ACTION_FEATURES);
        for item in items {
            boards.extend_from_slice(&item.board);
            meta.extend_from_slice(&item.meta);
            actions.extend_from_slice(&item.action);
        }
        EvaluatorBatch {
            boards: stack(boards, [batch_size, 1, BOARD_WIDTH, BOARD_HEIGHT], device),
            meta: stack(meta, [batch_size, META_FEATURES], device),
            actions: stack(actions, [batch_size, ACTION_FEATURES], device),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BoardBatch<B: Backend> {
    /// `[batch, 640]`, flattened for the dense autoencoder.
    pub boards: Tensor<B, 2>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BoardBatcher;

impl<B: Backend> Batcher<B, BoardSample, BoardBatch<B>> for BoardBatcher {
    fn batch(&self, items: Vec<BoardSample>, device: &B::Device) -> BoardBatch<B> {
        let batch_size = items.len();
        let mut boards = Vec::with_capacity(batch_size * BOARD_FEATURES);
        for item in items {
            boards.extend_from_slice(&item.board);
        }
        BoardBatch {
            boards: stack(boards, [batch_size, BOARD_FEATURES], device),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SuggestBatch<B: Backend> {
    pub inputs: Tensor<B, 2>,
    pub targets: Tensor<B, 2>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SuggestBatcher;

impl<B: Backend> Batcher<B, SuggestSample, SuggestBatch<B>> for SuggestBatcher {
    fn batch(&self, items: Vec<SuggestSample>, device: &B::Device) -> SuggestBatch<B> {
        let batch_size = items.len();
        let mut inputs = Vec::with_capacity(batch_size * SUGGEST_FEATURES);
        let mut targets = Vec::with_capacity(batch_size * ACTION_FEATURES);
        for item in items {
            inputs.extend_from_slice(&item.input);
            targets.extend_from_slice(&item.target);
        }
        SuggestBatch {
            inputs: stack(inputs, [batch_size, SUGGEST_FEATURES], device),
            targets: stack(targets, [batch_size, ACTION_FEATURES], device),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::data::dataset::Dataset;
    use burn_ndarray::{NdArray, NdArrayDevice};

    use crate::board::Board;
    use crate::ml::dataset::{BoardFeatures, EvaluatorFeatures, ReplayDataset, SuggestFeatures};
    use crate::piece::{PieceKind, SpinKind};
    use crate::replay::{PieceIdentity, Replay, ReplayState};

    type Backend = NdArray<f32>;

    fn dataset() -> ReplayDataset {
        let replays = (0..4)
            .map(|x| {
                let mut board = Board::new();
                board.set(x, 0, true);
                Replay {
                    player_id: 0,
                    frame: x as u64,
                    state: ReplayState {
                        board,
                        current: PieceKind::Z,
                        unhold: PieceKind::J,
                        queue: vec![PieceKind::T],
                        hold: None,
                        ren: -1,
                        b2b: false,
                        bag: PieceKind::ALL.to_vec(),
                    },
                    action: PieceIdentity::new(
                        [(4, 1), (5, 1), (5, 2), (6, 2)],
                        SpinKind::None,
                    ),
                }
            })
            .collect::<Vec<_>>();
        ReplayDataset::from_replays(replays)
    }

    fn items<I: Clone + Send + Sync>(data: &impl Dataset<I>) -> Vec<I> {
        (0..data.len()).filter_map(|index| data.get(index)).collect()
    }

    #[test]
    fn evaluator_batch_stacks_items() {
        let device = NdArrayDevice::Cpu;
        let data = dataset().features::<EvaluatorFeatures>();
        let batch: EvaluatorBatch<Backend> = EvaluatorBatcher.batch(items(&data), &device);
        assert_eq!(batch.sample_count(), 4);
        assert_eq!(batch.boards.dims(), [4, 1, BOARD_WIDTH, BOARD_HEIGHT]);
        assert_eq!(batch.meta.dims(), [4, META_FEATURES]);
        assert_eq!(batch.actions.dims(), [4, ACTION_FEATURES]);

        let boards = batch.boards.into_data().to_vec::<f32>().expect("f32 data");
        // item x has its single filled cell at column x, row 0
        for x in 0..4 {
            assert_eq!(boards[x * BOARD_FEATURES + x * BOARD_HEIGHT], 1.0);
        }
        assert_eq!(boards.iter().sum::<f32>(), 4.0);
    }

    #[test]
    fn board_batch_is_flat() {
        let device = NdArrayDevice::Cpu;
        let data = dataset().features::<BoardFeatures>();
        let batch: BoardBatch<Backend> = BoardBatcher.batch(items(&data), &device);
        assert_eq!(batch.boards.dims(), [4, BOARD_FEATURES]);
    }

    #[test]
    fn suggest_batch_pairs_inputs_and_targets() {
        let device = NdArrayDevice::Cpu;
        let data = dataset().features::<SuggestFeatures>();
        let batch: SuggestBatch<Backend> = SuggestBatcher.batch(items(&data), &device);
        assert_eq!(batch.inputs.dims(), [4, SUGGEST_FEATURES]);
        assert_eq!(batch.targets.dims(), [4, ACTION_FEATURES]);
        let targets = batch.targets.into_data().to_vec::<f32>().expect("f32 data");
        assert_eq!(targets.iter().sum::<f32>(), 16.0);
    }
}
