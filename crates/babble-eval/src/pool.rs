//! Worker-pool evaluation.
//!
//! Batch indices are queued on a crossbeam channel; scoped worker
//! threads share the game and the batches by reference, play each
//! batch with its own [`batch_rng`], and send `(index, result)` back on a
//! second channel. Results are reordered by index, so the report is the
//! same as [`evaluate_seeded`](crate::evaluate_seeded) for any worker
//! count.

use std::thread;

use babble_core::{GameError, Mode};
use babble_game::{Game, GameInputs, GameOutput};
use crossbeam_channel::unbounded;
use tracing::debug;

use crate::evaluate::{batch_rng, summarise, EvalReport};

/// A fixed number of evaluation workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalPool {
    workers: usize,
}

impl EvalPool {
    /// A pool of `workers` threads. Zero is treated as one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Play every batch, batch `i` drawing from `batch_rng(seed, i)`.
    ///
    /// Threads are spawned per call and joined before returning.
    ///
    /// # Errors
    ///
    /// Returns the error of the lowest-indexed failing batch.
    pub fn evaluate(
        &self,
        game: &Game,
        batches: &[GameInputs],
        mode: Mode,
        seed: u64,
    ) -> Result<EvalReport, GameError> {
        let (task_tx, task_rx) = unbounded::<usize>();
        let (result_tx, result_rx) = unbounded::<(usize, Result<GameOutput, GameError>)>();
        for i in 0..batches.len() {
            // Receiver is alive: this cannot fail.
            let _ = task_tx.send(i);
        }
        drop(task_tx);

        thread::scope(|scope| {
            for worker in 0..self.workers.min(batches.len()) {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    let mut played = 0usize;
                    while let Ok(i) = task_rx.recv() {
                        let out = game.play(&batches[i], mode, &mut batch_rng(seed, i));
                        played += 1;
                        if result_tx.send((i, out)).is_err() {
                            break;
                        }
                    }
                    debug!(worker, played, "evaluation worker finished");
                });
            }
        });
        drop(result_tx);

        let mut slots: Vec<Option<Result<GameOutput, GameError>>> =
            (0..batches.len()).map(|_| None).collect();
        for (i, out) in result_rx.iter() {
            slots[i] = Some(out);
        }
        let outputs = slots
            .into_iter()
            .flatten()
            .collect::<Result<Vec<_>, GameError>>()?;
        summarise(EvalReport::from_outputs(mode, outputs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::evaluate_seeded;
    use babble_core::GameConfig;
    use babble_test_utils::{
        random_inputs, reference_game, reference_inputs, seeded_game, REFERENCE_BOUNDARY,
    };

    fn config() -> GameConfig {
        GameConfig::builder()
            .n_features(4)
            .vocab_size(6)
            .embedding_dim(5)
            .hidden_size(7)
            .batch_size(3)
            .max_sentence_length(4)
            .greedy(false)
            .build()
            .unwrap()
    }

    #[test]
    fn pool_matches_sequential_seeded_run() {
        let cfg = config();
        let game = seeded_game(cfg.clone(), 3);
        let batches: Vec<_> = (0..9).map(|s| random_inputs(&cfg, 2, s)).collect();
        for mode in [Mode::Training, Mode::Evaluation] {
            let sequential = evaluate_seeded(&game, &batches, mode, 77).unwrap();
            for workers in [1, 2, 4] {
                let pooled = EvalPool::new(workers)
                    .evaluate(&game, &batches, mode, 77)
                    .unwrap();
                assert_eq!(pooled, sequential, "{workers} workers, {mode}");
            }
        }
    }

    #[test]
    fn lowest_failing_batch_wins() {
        let game = reference_game(REFERENCE_BOUNDARY);
        let mut no_distractors = reference_inputs();
        no_distractors.distractors.clear();
        let mut wrong_width = reference_inputs();
        wrong_width.distractors.push(ndarray::Array2::zeros((2, 3)));
        let batches = vec![reference_inputs(), no_distractors, wrong_width];
        let err = EvalPool::new(3)
            .evaluate(&game, &batches, Mode::Evaluation, 0)
            .unwrap_err();
        assert_eq!(err, GameError::NoDistractors);
    }

    #[test]
    fn zero_workers_still_runs() {
        let game = reference_game(REFERENCE_BOUNDARY);
        let pool = EvalPool::new(0);
        assert_eq!(pool.workers(), 1);
        let report = pool
            .evaluate(&game, &[reference_inputs()], Mode::Evaluation, 0)
            .unwrap();
        assert_eq!(report.loss.avg, 2.0);
    }
}
