// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Background fetch worker.
//!
//! Runs backend requests on a dedicated tokio runtime thread and hands the
//! results back to the UI thread through a channel.

use std::sync::mpsc as std_mpsc;
use std::sync::Arc;

use geohash_client::{
    puzzle, Backend, BackendError, ForecastEntry, GlobalPuzzle, PuzzleRequest, PuzzleResult,
};
use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A fetch to run in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchJob {
    Puzzle(PuzzleRequest),
    Forecast,
    Globalhash,
}

/// A finished fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Puzzle(PuzzleRequest, Result<PuzzleResult, BackendError>),
    Forecast(Result<Vec<ForecastEntry>, BackendError>),
    Globalhash(Result<GlobalPuzzle, BackendError>),
}

/// Run a single job against the backend.
pub async fn run_job<B: Backend>(backend: &B, job: FetchJob) -> FetchOutcome {
    match job {
        FetchJob::Puzzle(request) => {
            let result = puzzle::fetch(backend, request.cell, request.date).await;
            FetchOutcome::Puzzle(request, result)
        }
        FetchJob::Forecast => FetchOutcome::Forecast(backend.get_forecast().await),
        FetchJob::Globalhash => FetchOutcome::Globalhash(backend.get_global_puzzle().await),
    }
}

/// Owns the background runtime thread. Dropping it cancels the thread.
pub struct FetchWorker {
    jobs: mpsc::UnboundedSender<FetchJob>,
    outcomes: std_mpsc::Receiver<FetchOutcome>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for FetchWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchWorker")
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl FetchWorker {
    /// Start the worker thread. `notify` runs after every finished job.
    pub fn spawn<B, N>(backend: B, notify: N) -> std::io::Result<Self>
    where
        B: Backend + Send + Sync + 'static,
        N: Fn() + Send + Sync + 'static,
    {
        let (jobs_tx, mut jobs_rx) = mpsc::unbounded_channel::<FetchJob>();
        let (outcome_tx, outcome_rx) = std_mpsc::channel();
        let cancel_token = CancellationToken::new();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let token = cancel_token.clone();
        let backend = Arc::new(backend);
        let notify = Arc::new(notify);

        std::thread::Builder::new()
            .name("geohash-fetch".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    info!("Fetch worker started");
                    loop {
                        tokio::select! {
                            () = token.cancelled() => break,
                            job = jobs_rx.recv() => {
                                let Some(job) = job else { break };
                                debug!("Running {:?}", job);

                                let backend = Arc::clone(&backend);
                                let notify = Arc::clone(&notify);
                                let outcome_tx = outcome_tx.clone();
                                tokio::spawn(async move {
                                    let outcome = run_job(backend.as_ref(), job).await;
                                    if outcome_tx.send(outcome).is_ok() {
                                        notify();
                                    }
                                });
                            }
                        }
                    }
                    info!("Fetch worker stopped");
                });
            })?;

        Ok(Self {
            jobs: jobs_tx,
            outcomes: outcome_rx,
            cancel_token,
        })
    }

    pub fn submit(&self, job: FetchJob) {
        if self.jobs.send(job).is_err() {
            error!("Fetch worker is gone, dropping {:?}", job);
        }
    }

    /// Finished fetches, without blocking.
    pub fn try_iter(&self) -> std_mpsc::TryIter<'_, FetchOutcome> {
        self.outcomes.try_iter()
    }
}

impl Drop for FetchWorker {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
