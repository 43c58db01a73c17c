//! Attack orchestrator
//!
//! Drives one strategy end-to-end against a target account: partitions the
//! candidate sequence, fans it out across worker tasks, and resolves to
//! exactly one of `Succeeded`, `Exhausted`, or `Aborted`.
//!
//! The run is a state machine `Idle → Running → {Succeeded, Exhausted,
//! Aborted}`; the current phase is observable through a watch channel.
//! Workers check the stop signal between candidates, so no worker issues
//! more than one attempt after a winner is found.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};

use crate::{
    Error,
    config::AttackConfig,
    error::VerifierError,
    generator::{AttackStrategy, Candidate},
    partition::{Partition, partition},
    verifier::Verifier,
};

/// Observable run phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackPhase {
    Idle,
    Running,
    Succeeded,
    Exhausted,
    Aborted,
}

/// Terminal result of a run.
#[derive(Debug, Clone)]
pub enum AttackOutcome {
    /// A worker found the password. At most one winner is ever reported.
    Succeeded { candidate: Candidate },
    /// Every partition was enumerated without a hit.
    Exhausted,
    /// Every worker exceeded its retry budget at least once and nothing
    /// succeeded; the last observed error is surfaced.
    Aborted { error: VerifierError },
}

/// Outcome plus run totals.
#[derive(Debug, Clone)]
pub struct AttackReport {
    pub outcome: AttackOutcome,
    /// Candidates tried across all workers, including abandoned ones.
    pub attempts: u64,
}

pub struct AttackOrchestrator<V: Verifier> {
    verifier: Arc<V>,
    config: AttackConfig,
    phase: watch::Sender<AttackPhase>,
}

impl<V: Verifier> AttackOrchestrator<V> {
    pub fn new(verifier: Arc<V>, config: AttackConfig) -> Result<Self, Error> {
        config.validate()?;
        let (phase, _) = watch::channel(AttackPhase::Idle);
        Ok(Self {
            verifier,
            config,
            phase,
        })
    }

    pub fn phase(&self) -> AttackPhase {
        *self.phase.borrow()
    }

    /// Watch phase transitions, e.g. from a progress reporter.
    pub fn subscribe_phase(&self) -> watch::Receiver<AttackPhase> {
        self.phase.subscribe()
    }

    /// Run the strategy against `username`. Partitioning errors abort
    /// before any worker starts.
    pub async fn run(
        &self,
        username: &str,
        strategy: &AttackStrategy,
    ) -> Result<AttackReport, Error> {
        let partitions = partition(strategy, self.config.worker_count)?;
        tracing::info!(
            username,
            kind = strategy.kind(),
            workers = self.config.worker_count,
            partitions = partitions.len(),
            "starting attack run"
        );
        self.phase.send_replace(AttackPhase::Running);

        let queue = Arc::new(Mutex::new(VecDeque::from(partitions)));
        let (stop_tx, stop_rx) = watch::channel(false);
        let (found_tx, mut found_rx) = mpsc::unbounded_channel::<Candidate>();

        let mut handles = Vec::with_capacity(self.config.worker_count);
        for worker_id in 0..self.config.worker_count {
            let worker = Worker {
                id: worker_id,
                username: username.to_string(),
                verifier: Arc::clone(&self.verifier),
                config: self.config.clone(),
                queue: Arc::clone(&queue),
                stop: stop_rx.clone(),
                found: found_tx.clone(),
            };
            handles.push(tokio::spawn(worker.run()));
        }
        drop(found_tx);
        drop(stop_rx);

        // First success wins; everything after it is discarded.
        let winner = found_rx.recv().await;
        if winner.is_some() {
            let _ = stop_tx.send(true);
        }

        let mut attempts = 0u64;
        let mut all_exceeded = true;
        let mut last_error = None;
        for handle in handles {
            let summary = handle.await.map_err(|e| Error::Worker(e.to_string()))?;
            attempts += summary.attempts;
            if summary.exceeded_retries {
                if let Some(error) = summary.last_error {
                    last_error = Some(error);
                }
            } else {
                all_exceeded = false;
            }
        }

        let outcome = match winner {
            Some(candidate) => {
                self.phase.send_replace(AttackPhase::Succeeded);
                tracing::info!(username, attempts, "attack succeeded");
                AttackOutcome::Succeeded { candidate }
            }
            None => match last_error {
                Some(error) if all_exceeded => {
                    self.phase.send_replace(AttackPhase::Aborted);
                    tracing::warn!(username, attempts, %error, "attack aborted");
                    AttackOutcome::Aborted { error }
                }
                _ => {
                    self.phase.send_replace(AttackPhase::Exhausted);
                    tracing::info!(username, attempts, "keyspace exhausted");
                    AttackOutcome::Exhausted
                }
            },
        };

        Ok(AttackReport { outcome, attempts })
    }
}

struct Worker<V: Verifier> {
    id: usize,
    username: String,
    verifier: Arc<V>,
    config: AttackConfig,
    queue: Arc<Mutex<VecDeque<Partition>>>,
    stop: watch::Receiver<bool>,
    found: mpsc::UnboundedSender<Candidate>,
}

#[derive(Debug, Default)]
struct WorkerSummary {
    attempts: u64,
    exceeded_retries: bool,
    last_error: Option<VerifierError>,
}

impl<V: Verifier> Worker<V> {
    async fn run(self) -> WorkerSummary {
        let mut summary = WorkerSummary::default();

        'partitions: loop {
            let Some(partition) = self.queue.lock().await.pop_front() else {
                break;
            };

            for candidate in partition.candidates() {
                // Stop signal is observed between candidates: at most one
                // in-flight attempt after a winner.
                if *self.stop.borrow() {
                    tracing::debug!(worker = self.id, "stopping, winner already reported");
                    break 'partitions;
                }

                summary.attempts += 1;
                match self.attempt_with_retry(candidate.as_str()).await {
                    Ok(true) => {
                        tracing::debug!(worker = self.id, "candidate accepted");
                        let _ = self.found.send(candidate);
                        break 'partitions;
                    }
                    Ok(false) => {}
                    Err(error) => {
                        // Candidate abandoned; keep going with the next one.
                        tracing::debug!(
                            worker = self.id,
                            %error,
                            "retries exceeded, abandoning candidate"
                        );
                        summary.exceeded_retries = true;
                        summary.last_error = Some(error);
                    }
                }
            }
        }

        summary
    }

    /// One candidate, retried on transient failure with linear backoff.
    async fn attempt_with_retry(&self, password: &str) -> Result<bool, VerifierError> {
        let mut last_error = None;
        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tokio::time::sleep(self.config.retry_backoff * retry).await;
            }
            match self.verifier.attempt(&self.username, password).await {
                Ok(verified) => return Ok(verified),
                Err(error) => {
                    last_error = Some(error);
                }
            }
        }
        Err(last_error.unwrap_or(VerifierError::Unavailable("no attempt made".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::keyspace::KeyspaceRange;
    use crate::rainbow::{RainbowEntry, RainbowTable};
    use crate::wordlist::{Dictionary, MutationRule, Wordlist};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    /// Verifier that accepts one password and counts every call.
    struct CountingVerifier {
        password: String,
        calls: AtomicU64,
        seen: StdMutex<Vec<String>>,
    }

    impl CountingVerifier {
        fn accepting(password: &str) -> Self {
            Self {
                password: password.to_string(),
                calls: AtomicU64::new(0),
                seen: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Verifier for CountingVerifier {
        async fn attempt(&self, _username: &str, password: &str) -> Result<bool, VerifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(password.to_string());
            Ok(password == self.password)
        }
    }

    /// Verifier that fails transiently a fixed number of times per call
    /// sequence before answering.
    struct FlakyVerifier {
        password: String,
        failures_before_answer: u64,
        calls: AtomicU64,
    }

    #[async_trait]
    impl Verifier for FlakyVerifier {
        async fn attempt(&self, _username: &str, password: &str) -> Result<bool, VerifierError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_answer {
                return Err(VerifierError::Unavailable("flaky".into()));
            }
            Ok(password == self.password)
        }
    }

    struct AlwaysDownVerifier;

    #[async_trait]
    impl Verifier for AlwaysDownVerifier {
        async fn attempt(&self, _username: &str, _password: &str) -> Result<bool, VerifierError> {
            Err(VerifierError::Unavailable("connection refused".into()))
        }
    }

    fn quick_config(workers: usize) -> AttackConfig {
        AttackConfig {
            worker_count: workers,
            max_retries: 3,
            retry_backoff: Duration::from_millis(1),
        }
    }

    fn pin_keyspace() -> AttackStrategy {
        AttackStrategy::keyspace(
            KeyspaceRange::mono(Alphabet::custom("pin", "0123").unwrap(), 1, 2).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_single_worker_finds_target_in_order() {
        let verifier = Arc::new(CountingVerifier::accepting("21"));
        let orchestrator =
            AttackOrchestrator::new(Arc::clone(&verifier), quick_config(1)).unwrap();
        assert_eq!(orchestrator.phase(), AttackPhase::Idle);

        let report = orchestrator.run("alice", &pin_keyspace()).await.unwrap();

        let AttackOutcome::Succeeded { candidate } = &report.outcome else {
            panic!("expected success, got {:?}", report.outcome);
        };
        assert_eq!(candidate.as_str(), "21");
        // "21" is the 14th candidate: 4 of length 1, then 00..03, 10..13,
        // 20, 21.
        assert_eq!(report.attempts, 14);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 14);
        assert_eq!(orchestrator.phase(), AttackPhase::Succeeded);

        let seen = verifier.seen.lock().unwrap();
        assert_eq!(seen[0..4], ["0", "1", "2", "3"]);
        assert_eq!(seen[13], "21");
    }

    #[tokio::test]
    async fn test_exhaustion_reports_total_attempts() {
        let verifier = Arc::new(CountingVerifier::accepting("not-in-keyspace"));
        let orchestrator =
            AttackOrchestrator::new(Arc::clone(&verifier), quick_config(1)).unwrap();

        let report = orchestrator.run("alice", &pin_keyspace()).await.unwrap();
        assert!(matches!(report.outcome, AttackOutcome::Exhausted));
        assert_eq!(report.attempts, 20);
        assert_eq!(orchestrator.phase(), AttackPhase::Exhausted);
    }

    #[tokio::test]
    async fn test_parallel_workers_find_target() {
        let verifier = Arc::new(CountingVerifier::accepting("33"));
        let orchestrator = AttackOrchestrator::new(Arc::clone(&verifier), quick_config(4)).unwrap();

        let report = orchestrator.run("alice", &pin_keyspace()).await.unwrap();
        let AttackOutcome::Succeeded { candidate } = &report.outcome else {
            panic!("expected success");
        };
        assert_eq!(candidate.as_str(), "33");
        // Workers stop within one candidate of the winner being reported.
        assert!(report.attempts <= 20);
    }

    #[tokio::test]
    async fn test_transient_errors_retried_then_recovered() {
        // Two transient failures, then answers; retries stay on the same
        // candidate so the target is still found.
        let verifier = Arc::new(FlakyVerifier {
            password: "0".into(),
            failures_before_answer: 2,
            calls: AtomicU64::new(0),
        });
        let orchestrator = AttackOrchestrator::new(verifier, quick_config(1)).unwrap();

        let report = orchestrator.run("alice", &pin_keyspace()).await.unwrap();
        let AttackOutcome::Succeeded { candidate } = &report.outcome else {
            panic!("expected success after retries");
        };
        assert_eq!(candidate.as_str(), "0");
        assert_eq!(report.attempts, 1);
    }

    #[tokio::test]
    async fn test_persistent_verifier_failure_aborts() {
        let orchestrator =
            AttackOrchestrator::new(Arc::new(AlwaysDownVerifier), quick_config(2)).unwrap();

        let report = orchestrator.run("alice", &pin_keyspace()).await.unwrap();
        assert!(matches!(
            report.outcome,
            AttackOutcome::Aborted {
                error: VerifierError::Unavailable(_)
            }
        ));
        assert_eq!(orchestrator.phase(), AttackPhase::Aborted);
    }

    #[tokio::test]
    async fn test_dictionary_attack_single_partition_path() {
        let dictionary = Dictionary::new(
            Wordlist::from_words(["password", "letmein"]),
            vec![MutationRule::common_suffixes()],
            None,
        );
        let verifier = Arc::new(CountingVerifier::accepting("letmein123"));
        let orchestrator = AttackOrchestrator::new(Arc::clone(&verifier), quick_config(1)).unwrap();

        let report = orchestrator
            .run("alice", &AttackStrategy::dictionary(dictionary))
            .await
            .unwrap();
        let AttackOutcome::Succeeded { candidate } = &report.outcome else {
            panic!("expected success");
        };
        assert_eq!(candidate.as_str(), "letmein123");
    }

    #[tokio::test]
    async fn test_rainbow_hit_and_miss() {
        let table = Arc::new(
            RainbowTable::from_entries([RainbowEntry::new(vec![0x01], "hunter2")]).unwrap(),
        );

        let verifier = Arc::new(CountingVerifier::accepting("hunter2"));
        let orchestrator = AttackOrchestrator::new(Arc::clone(&verifier), quick_config(1)).unwrap();

        let report = orchestrator
            .run("alice", &AttackStrategy::rainbow(Arc::clone(&table), vec![0x01]))
            .await
            .unwrap();
        assert!(matches!(report.outcome, AttackOutcome::Succeeded { .. }));
        assert_eq!(report.attempts, 1);

        let orchestrator = AttackOrchestrator::new(verifier, quick_config(1)).unwrap();
        let report = orchestrator
            .run("alice", &AttackStrategy::rainbow(table, vec![0xff]))
            .await
            .unwrap();
        assert!(matches!(report.outcome, AttackOutcome::Exhausted));
        assert_eq!(report.attempts, 0);
    }

    #[tokio::test]
    async fn test_zero_workers_rejected_at_construction() {
        let verifier = Arc::new(CountingVerifier::accepting("x"));
        let orchestrator = AttackOrchestrator::new(Arc::clone(&verifier), quick_config(0));
        assert!(orchestrator.is_err());
    }
}
