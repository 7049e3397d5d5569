//! Timeout-bounded wrapper around an [`ExternalClassifier`]
//!
//! The call runs on its own thread and reports back over a bounded(1)
//! channel. The caller waits at most `timeout` from the moment the call was
//! spawned; a late reply is dropped with the channel. No retries happen here.

use super::{AiResult, ExternalClassifier, ExternalVerdict};
use crate::models::{Language, Method, MethodOutcome, MethodResult};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct ExternalAdapter {
    classifier: Arc<dyn ExternalClassifier>,
    timeout: Duration,
}

impl std::fmt::Debug for ExternalAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalAdapter")
            .field("classifier", &self.classifier.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ExternalAdapter {
    pub fn new(classifier: Arc<dyn ExternalClassifier>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Classify `code`, or report the method unavailable on error or timeout
    pub fn classify(&self, code: &str, language: Language) -> MethodOutcome {
        self.spawn(code, language).wait()
    }

    /// Start the call in the background. The timeout clock starts now.
    pub fn spawn(&self, code: &str, language: Language) -> PendingCall {
        let name = self.classifier.name().to_string();
        let (tx, rx) = bounded(1);
        let classifier = Arc::clone(&self.classifier);
        let code = code.to_string();
        let started = Instant::now();

        let spawned = thread::Builder::new()
            .name("external-classifier".to_string())
            .spawn(move || {
                // Receiver may be gone after a timeout
                let _ = tx.send(classifier.classify(&code, language));
            });
        let rx = match spawned {
            Ok(_) => Ok(rx),
            Err(e) => {
                tracing::warn!("Failed to start external classifier thread: {}", e);
                Err(format!("cannot spawn worker: {e}"))
            }
        };

        PendingCall {
            name,
            rx,
            started,
            timeout: self.timeout,
        }
    }
}

/// An external call in flight
pub struct PendingCall {
    name: String,
    rx: Result<Receiver<AiResult<ExternalVerdict>>, String>,
    started: Instant,
    timeout: Duration,
}

impl PendingCall {
    /// Block until the reply arrives or the deadline passes
    pub fn wait(self) -> MethodOutcome {
        let name = self.name;
        let rx = match self.rx {
            Ok(rx) => rx,
            Err(reason) => return MethodOutcome::unavailable(Method::External, reason),
        };

        // A deadline past what Instant can hold means no deadline
        let reply = match self.started.checked_add(self.timeout) {
            Some(deadline) => rx.recv_deadline(deadline),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match reply {
            Ok(Ok(verdict)) => {
                tracing::debug!(
                    "External classifier {} answered in {:.2?}: {} ({:.1})",
                    name,
                    self.started.elapsed(),
                    verdict.label,
                    verdict.score
                );
                let mut indicators = vec![format!("{name}: {}", verdict.explanation)];
                if verdict.fallback {
                    indicators.push(format!("{name}: reply was not JSON, keyword mapping used"));
                }
                MethodOutcome::Present(MethodResult::with_label(
                    Method::External,
                    verdict.label,
                    verdict.score,
                    indicators,
                ))
            }
            Ok(Err(e)) => {
                tracing::warn!("External classifier {} unavailable: {}", name, e);
                MethodOutcome::unavailable(Method::External, e.to_string())
            }
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    "External classifier {} timed out after {:?}",
                    name,
                    self.timeout
                );
                MethodOutcome::unavailable(
                    Method::External,
                    format!("timed out after {:.1}s", self.timeout.as_secs_f64()),
                )
            }
            Err(RecvTimeoutError::Disconnected) => MethodOutcome::unavailable(
                Method::External,
                "classifier exited without a reply",
            ),
        }
    }
}
