//! The bounded sentence-decoding worker pool.
//!
//! A fixed set of OS threads consumes a shared task queue; each task
//! decodes one sentence and answers over a oneshot channel. Decoding is
//! pure CPU work, so the pool lives outside the async runtime and
//! submitters await the oneshot instead of blocking a runtime worker.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, mpsc};

use glossa_decoder::{DecoderError, DecoderParams, SentenceDecoder, SentenceResult};
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::models::LoadedModels;

/// One sentence to decode.
pub struct SentenceTask {
    /// Tokenised, lower-cased source sentence.
    pub source: String,
    /// Whether per-stack load statistics are wanted.
    pub want_info: bool,
    /// The owning job's stop flag.
    pub stop: Arc<AtomicBool>,
    /// Where the outcome goes.
    pub reply: oneshot::Sender<Result<SentenceResult, DecoderError>>,
}

/// Fixed-size decoding pool.
pub struct WorkerPool {
    tx: mpsc::Sender<SentenceTask>,
}

impl WorkerPool {
    /// Spawn `num_workers` decoding threads over the shared models.
    #[must_use]
    pub fn new(num_workers: usize, models: Arc<LoadedModels>, params: DecoderParams) -> Self {
        let (tx, rx) = mpsc::channel::<SentenceTask>();
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..num_workers.max(1) {
            let rx = Arc::clone(&rx);
            let models = Arc::clone(&models);
            let params = params.clone();
            std::thread::Builder::new()
                .name(format!("decoder-{worker}"))
                .spawn(move || worker_loop(worker, &rx, &models, &params))
                .expect("worker thread spawn failed");
        }

        Self { tx }
    }

    /// Queue one sentence; returns `false` when the pool has shut down.
    pub fn submit(&self, task: SentenceTask) -> bool {
        self.tx.send(task).is_ok()
    }
}

fn worker_loop(
    worker: usize,
    rx: &Mutex<mpsc::Receiver<SentenceTask>>,
    models: &LoadedModels,
    params: &DecoderParams,
) {
    debug!(worker, "decoder worker up");
    loop {
        // Hold the queue lock only while waiting for the next task.
        let task = {
            let guard = rx.lock().expect("worker queue poisoned");
            guard.recv()
        };
        let Ok(task) = task else {
            debug!(worker, "decoder worker down");
            return;
        };

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let decoder =
                SentenceDecoder::new(params, &models.lm, &models.tm, &models.rm, &task.stop);
            decoder.translate(&task.source, task.want_info)
        }));

        let result = match outcome {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_owned())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "decoder panicked".to_owned());
                error!(worker, detail = %detail, "sentence decoder panicked");
                Err(DecoderError::Internal(detail))
            }
        };

        // The submitter may have gone away with its session; fine.
        let _ = task.reply.send(result);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use glossa_test::{toy_lm, toy_rm, toy_tm};

    use super::*;

    fn toy_models() -> LoadedModels {
        let lm = toy_lm();
        let tm = toy_tm(&lm);
        LoadedModels {
            source_lang: "en".to_owned(),
            target_lang: "de".to_owned(),
            lm,
            tm,
            rm: toy_rm(),
        }
    }

    fn pool() -> WorkerPool {
        WorkerPool::new(2, Arc::new(toy_models()), DecoderParams::default())
    }

    #[tokio::test]
    async fn decodes_a_sentence() {
        let pool = pool();
        let (reply, rx) = oneshot::channel();
        assert!(pool.submit(SentenceTask {
            source: "hello .".to_owned(),
            want_info: false,
            stop: Arc::new(AtomicBool::new(false)),
            reply,
        }));
        let result = rx.await.unwrap().unwrap();
        assert_eq!(result.text, "hallo .");
        assert!(result.stack_loads.is_none());
    }

    #[tokio::test]
    async fn stopped_task_echoes_the_source() {
        let pool = pool();
        let stop = Arc::new(AtomicBool::new(false));
        stop.store(true, Ordering::Release);
        let (reply, rx) = oneshot::channel();
        pool.submit(SentenceTask {
            source: "hello .".to_owned(),
            want_info: false,
            stop,
            reply,
        });
        let result = rx.await.unwrap().unwrap();
        assert_eq!(result.text, "hello .");
    }
}
