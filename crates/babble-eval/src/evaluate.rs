//! Sequential evaluation.

use babble_core::{GameError, Mode, TokenId, Vocabulary};
use babble_game::{Game, GameInputs, GameOutput, MessageBatch};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::meter::AverageMeter;

/// Aggregate of a run over many batches.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalReport {
    /// Mode every batch was played in.
    pub mode: Mode,
    /// Per-batch mean loss.
    pub loss: AverageMeter,
    /// Per-batch accuracy.
    pub accuracy: AverageMeter,
    /// Per-batch mean stopping length.
    pub length: AverageMeter,
    /// Every padded message, concatenated along the batch axis in batch
    /// order. `None` when there were no batches.
    pub messages: Option<MessageBatch>,
    /// Every stopping length, in the same order as `messages`.
    pub lengths: Vec<usize>,
}

impl EvalReport {
    /// Fold per-batch outputs, already in batch order.
    ///
    /// # Errors
    ///
    /// Returns an error if the messages cannot be concatenated (mixed
    /// modes or shapes).
    pub fn from_outputs(mode: Mode, outputs: Vec<GameOutput>) -> Result<Self, GameError> {
        let mut loss = AverageMeter::new();
        let mut accuracy = AverageMeter::new();
        let mut length = AverageMeter::new();
        let mut lengths = Vec::new();
        let mut messages = Vec::with_capacity(outputs.len());
        for out in outputs {
            loss.update(out.loss);
            accuracy.update(out.accuracy);
            length.update(out.mean_length());
            lengths.extend_from_slice(&out.lengths);
            messages.push(out.message);
        }
        let messages = if messages.is_empty() {
            None
        } else {
            Some(MessageBatch::concat(&messages)?)
        };
        Ok(Self {
            mode,
            loss,
            accuracy,
            length,
            messages,
            lengths,
        })
    }

    /// Number of batches folded in.
    pub fn batches(&self) -> usize {
        self.loss.count
    }

    /// Every message as words, one string per example, stopping at the
    /// game's `boundary` token.
    pub fn render(&self, vocab: &Vocabulary, boundary: TokenId) -> Vec<String> {
        match &self.messages {
            Some(m) => m
                .token_ids()
                .rows()
                .into_iter()
                .map(|row| vocab.render_with(&row.to_vec(), boundary))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// The RNG for batch `index` of a seeded run.
pub fn batch_rng(seed: u64, index: usize) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed ^ index as u64)
}

/// Play every batch in order, drawing from one shared `rng`.
///
/// # Errors
///
/// Stops at and returns the first error from [`Game::play`].
pub fn evaluate<R: Rng + ?Sized>(
    game: &Game,
    batches: &[GameInputs],
    mode: Mode,
    rng: &mut R,
) -> Result<EvalReport, GameError> {
    let outputs = batches
        .iter()
        .enumerate()
        .map(|(i, inputs)| {
            let out = game.play(inputs, mode, &mut *rng)?;
            debug!(batch = i, loss = out.loss, accuracy = out.accuracy, "evaluated batch");
            Ok(out)
        })
        .collect::<Result<Vec<_>, GameError>>()?;
    summarise(EvalReport::from_outputs(mode, outputs)?)
}

/// Play every batch in order, batch `i` drawing from
/// [`batch_rng(seed, i)`](batch_rng).
///
/// # Errors
///
/// Stops at and returns the first error from [`Game::play`].
pub fn evaluate_seeded(
    game: &Game,
    batches: &[GameInputs],
    mode: Mode,
    seed: u64,
) -> Result<EvalReport, GameError> {
    let outputs = batches
        .iter()
        .enumerate()
        .map(|(i, inputs)| game.play(inputs, mode, &mut batch_rng(seed, i)))
        .collect::<Result<Vec<_>, GameError>>()?;
    summarise(EvalReport::from_outputs(mode, outputs)?)
}

pub(crate) fn summarise(report: EvalReport) -> Result<EvalReport, GameError> {
    info!(
        mode = %report.mode,
        batches = report.batches(),
        loss = report.loss.avg,
        accuracy = report.accuracy.avg,
        mean_length = report.length.avg,
        "evaluation finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use babble_core::GameConfig;
    use babble_test_utils::{
        reference_game, reference_game_for, reference_inputs, REFERENCE_BOUNDARY,
    };

    #[test]
    fn reference_batches_average_exactly() {
        let game = reference_game(REFERENCE_BOUNDARY);
        let batches = vec![reference_inputs(), reference_inputs(), reference_inputs()];
        let report = evaluate(&game, &batches, Mode::Evaluation, &mut batch_rng(0, 0)).unwrap();
        assert_eq!(report.batches(), 3);
        assert_eq!(report.loss.avg, 2.0);
        assert_eq!(report.accuracy.avg, 0.5);
        assert_eq!(report.length.avg, 2.0);
        assert_eq!(report.lengths, vec![2; 6]);
        let messages = report.messages.unwrap();
        assert_eq!(messages.batch_size(), 6);
        assert_eq!(messages.token(5, 1).id(), TokenId(4));
    }

    #[test]
    fn renders_messages_as_words() {
        let vocab = Vocabulary::with_size(5).unwrap();
        let batches = vec![reference_inputs()];

        let silent = reference_game(REFERENCE_BOUNDARY);
        let report = evaluate_seeded(&silent, &batches, Mode::Evaluation, 0).unwrap();
        assert_eq!(
            report.render(&vocab, REFERENCE_BOUNDARY),
            vec![String::new(), String::new()]
        );

        let chatty = reference_game(TokenId(1));
        let report = evaluate_seeded(&chatty, &batches, Mode::Evaluation, 0).unwrap();
        assert_eq!(report.render(&vocab, REFERENCE_BOUNDARY), vec!["w1 w1 w1", "w1 w1 w1"]);
    }

    #[test]
    fn renders_with_a_non_default_boundary() {
        let config = GameConfig::builder()
            .n_features(2)
            .vocab_size(5)
            .embedding_dim(3)
            .hidden_size(4)
            .batch_size(2)
            .boundary(TokenId(0))
            .max_sentence_length(3)
            .build()
            .unwrap();
        let vocab = Vocabulary::with_size(5).unwrap();
        let batches = vec![reference_inputs()];

        let silent = reference_game_for(config.clone(), TokenId(0));
        let report = evaluate_seeded(&silent, &batches, Mode::Evaluation, 0).unwrap();
        assert_eq!(report.lengths, vec![2, 2]);
        assert_eq!(
            report.render(&vocab, config.boundary()),
            vec![String::new(), String::new()]
        );

        let chatty = reference_game_for(config.clone(), TokenId(2));
        let report = evaluate_seeded(&chatty, &batches, Mode::Evaluation, 0).unwrap();
        assert_eq!(report.render(&vocab, config.boundary()), vec!["w2 w2 w2", "w2 w2 w2"]);
    }

    #[test]
    fn no_batches_no_messages() {
        let game = reference_game(REFERENCE_BOUNDARY);
        let report = evaluate_seeded(&game, &[], Mode::Training, 1).unwrap();
        assert_eq!(report.batches(), 0);
        assert!(report.messages.is_none());
        assert!(report.lengths.is_empty());
    }

    #[test]
    fn first_error_stops_the_run() {
        let game = reference_game(REFERENCE_BOUNDARY);
        let mut bad = reference_inputs();
        bad.distractors.clear();
        let batches = vec![reference_inputs(), bad];
        let err = evaluate_seeded(&game, &batches, Mode::Evaluation, 0).unwrap_err();
        assert_eq!(err, GameError::NoDistractors);
    }

    #[test]
    fn seeded_runs_repeat() {
        let game = reference_game(TokenId(1));
        let batches = vec![reference_inputs(), reference_inputs()];
        let a = evaluate_seeded(&game, &batches, Mode::Training, 11).unwrap();
        let b = evaluate_seeded(&game, &batches, Mode::Training, 11).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.messages.map(|m| m.mode()), Some(Mode::Training));
    }
}
