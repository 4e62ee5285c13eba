//! Bounded off-loop execution of detector calls.
//!
//! Inference is CPU-bound, so every call runs on tokio's blocking pool.
//! A semaphore caps how many run at once; callers beyond the cap wait
//! their turn instead of piling threads onto the model.

use std::sync::Arc;
use std::time::Duration;

use roadsign_core::detection::DetectionSummary;
use tokio::sync::Semaphore;

use crate::detector::{AnnotatedDetection, DetectError, Detector};
use crate::frame;
use crate::model::InferenceError;

#[derive(Clone)]
pub struct InferencePool {
    detector: Arc<Detector>,
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl InferencePool {
    pub fn new(detector: Arc<Detector>, workers: usize, timeout: Duration) -> Self {
        Self {
            detector,
            permits: Arc::new(Semaphore::new(workers.max(1))),
            timeout,
        }
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// Decode and detect off the async runtime.
    ///
    /// Like [`Detector::detect_data_uri`] this never fails; timeouts and
    /// worker panics come back as an error summary.
    pub async fn detect_data_uri(&self, payload: String) -> DetectionSummary {
        let result = self
            .submit(move |detector| Ok(detector.detect_data_uri(&payload)))
            .await;

        match result {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, "Inference call failed");
                DetectionSummary::failed(e.to_string())
            }
        }
    }

    /// Decode, detect and draw the boxes, off the async runtime.
    pub async fn annotate_data_uri(
        &self,
        payload: String,
    ) -> Result<AnnotatedDetection, DetectError> {
        self.submit(move |detector| {
            let frame = frame::decode(&payload)?;
            detector.detect_frame(&frame)
        })
        .await
    }

    /// Run `job` on the blocking pool once a permit is free.
    ///
    /// The timeout covers the wait for a permit as well as the job itself.
    async fn submit<T, F>(&self, job: F) -> Result<T, DetectError>
    where
        T: Send + 'static,
        F: FnOnce(&Detector) -> Result<T, DetectError> + Send + 'static,
    {
        match tokio::time::timeout(self.timeout, self.run(job)).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::TimedOut(self.timeout).into()),
        }
    }

    async fn run<T, F>(&self, job: F) -> Result<T, DetectError>
    where
        T: Send + 'static,
        F: FnOnce(&Detector) -> Result<T, DetectError> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| InferenceError::WorkerFailed(e.to_string()))?;

        let detector = Arc::clone(&self.detector);
        tokio::task::spawn_blocking(move || {
            // Held until the model returns, even if the caller gave up.
            let _permit = permit;
            job(&detector)
        })
        .await
        .map_err(|e| InferenceError::WorkerFailed(e.to_string()))?
    }
}
