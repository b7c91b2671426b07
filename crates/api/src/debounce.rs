//! Debounced CPF existence checking.
//!
//! Policy (one abstraction, no ad hoc timers): every edit restarts a 300 ms
//! debounce window; only a timer that fires with no newer edit issues the
//! existence request, tagged with the value it was issued for; a response is
//! applied only while its tag is still current. There is no request
//! cancellation; correctness comes from the discard rule, enforced by
//! [`UniquenessProbe`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

use matricula_enrollment::UniquenessProbe;

/// Debounce window between the last edit and the issued request.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

const CPF_DIGITS: usize = 11;

#[derive(Debug, Error)]
pub enum ExistenceCheckError {
    #[error("existence check failed: {0}")]
    Transport(String),
}

/// The remote collaborator answering "does this CPF already have an
/// enrollment?".
pub trait CpfExistenceCheck: Send + Sync {
    fn exists(
        &self,
        cpf: &str,
    ) -> impl std::future::Future<Output = Result<bool, ExistenceCheckError>> + Send;
}

/// `CpfExistenceCheck` backed by the portal's own `POST /api/check-cpf`.
#[derive(Debug, Clone)]
pub struct HttpCpfExistenceCheck {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCpfExistenceCheck {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl CpfExistenceCheck for HttpCpfExistenceCheck {
    async fn exists(&self, cpf: &str) -> Result<bool, ExistenceCheckError> {
        let response = self
            .http
            .post(format!("{}/api/check-cpf", self.base_url))
            .json(&serde_json::json!({ "cpf": cpf }))
            .send()
            .await
            .map_err(|e| ExistenceCheckError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ExistenceCheckError::Transport(format!(
                "status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ExistenceCheckError::Transport(e.to_string()))?;

        Ok(body.get("exists").and_then(|v| v.as_bool()).unwrap_or(false))
    }
}

/// Debounced wrapper around a [`CpfExistenceCheck`].
///
/// Call [`on_edit`](Self::on_edit) on every keystroke; read the latest
/// applied result with [`exists`](Self::exists) (`None` while unresolved).
#[derive(Debug)]
pub struct DebouncedCpfChecker<C> {
    checker: Arc<C>,
    delay: Duration,
    probe: Arc<Mutex<UniquenessProbe>>,
}

impl<C> DebouncedCpfChecker<C>
where
    C: CpfExistenceCheck + 'static,
{
    pub fn new(checker: Arc<C>) -> Self {
        Self::with_delay(checker, DEBOUNCE_DELAY)
    }

    pub fn with_delay(checker: Arc<C>, delay: Duration) -> Self {
        Self {
            checker,
            delay,
            probe: Arc::new(Mutex::new(UniquenessProbe::new())),
        }
    }

    fn lock_probe(probe: &Arc<Mutex<UniquenessProbe>>) -> std::sync::MutexGuard<'_, UniquenessProbe> {
        probe.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an edit and (re)start the debounce window.
    ///
    /// Incomplete values (fewer than 11 digits) restart the window and clear
    /// the previous result but never issue a request.
    pub fn on_edit(&self, value: &str) {
        let tag = Self::lock_probe(&self.probe).edit(value);

        let digit_count = value.chars().filter(|c| c.is_ascii_digit()).count();
        if digit_count != CPF_DIGITS {
            return;
        }

        let checker = self.checker.clone();
        let probe = self.probe.clone();
        let delay = self.delay;
        let value = value.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // A newer edit supersedes this timer: issue nothing.
            if !Self::lock_probe(&probe).is_current(tag) {
                return;
            }

            match checker.exists(&value).await {
                Ok(exists) => {
                    // Stale responses are discarded inside resolve().
                    Self::lock_probe(&probe).resolve(tag, exists);
                }
                Err(e) => {
                    tracing::warn!("CPF existence check failed: {e}");
                    // Lookup failure must not block the wizard.
                    Self::lock_probe(&probe).resolve(tag, false);
                }
            }
        });
    }

    /// Latest applied result for the current value (`None` while pending).
    pub fn exists(&self) -> Option<bool> {
        Self::lock_probe(&self.probe).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    /// Scriptable checker: per-value response delay and result, plus a call log.
    struct ScriptedChecker {
        responses: HashMap<String, (Duration, bool)>,
        calls: StdMutex<Vec<String>>,
    }

    impl ScriptedChecker {
        fn new(responses: &[(&str, Duration, bool)]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|(v, d, r)| (v.to_string(), (*d, *r)))
                    .collect(),
                calls: StdMutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CpfExistenceCheck for ScriptedChecker {
        async fn exists(&self, cpf: &str) -> Result<bool, ExistenceCheckError> {
            self.calls.lock().unwrap().push(cpf.to_string());
            let (delay, result) = self
                .responses
                .get(cpf)
                .copied()
                .unwrap_or((Duration::ZERO, false));
            tokio::time::sleep(delay).await;
            Ok(result)
        }
    }

    const CPF_A: &str = "11144477735";
    const CPF_B: &str = "52998224725";

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_the_debounce_window() {
        let checker = Arc::new(ScriptedChecker::new(&[(CPF_A, Duration::ZERO, true)]));
        let debounced = DebouncedCpfChecker::new(checker.clone());

        debounced.on_edit(CPF_A);
        assert_eq!(debounced.exists(), None);

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(checker.calls(), vec![CPF_A.to_string()]);
        assert_eq!(debounced.exists(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_collapse_to_one_request_for_the_latest_value() {
        let checker = Arc::new(ScriptedChecker::new(&[
            (CPF_A, Duration::ZERO, true),
            (CPF_B, Duration::ZERO, false),
        ]));
        let debounced = DebouncedCpfChecker::new(checker.clone());

        debounced.on_edit(CPF_A);
        tokio::time::sleep(Duration::from_millis(100)).await;
        // Second edit lands inside A's window: A must never be probed.
        debounced.on_edit(CPF_B);
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(checker.calls(), vec![CPF_B.to_string()]);
        assert_eq!(debounced.exists(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_stale_response_does_not_overwrite_the_current_value() {
        // A's answer (exists) arrives long after B became current.
        let checker = Arc::new(ScriptedChecker::new(&[
            (CPF_A, Duration::from_millis(5_000), true),
            (CPF_B, Duration::from_millis(10), false),
        ]));
        let debounced = DebouncedCpfChecker::new(checker.clone());

        debounced.on_edit(CPF_A);
        // Let A's request go out...
        tokio::time::sleep(Duration::from_millis(400)).await;
        // ...then switch to B while A is still in flight.
        debounced.on_edit(CPF_B);
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(debounced.exists(), Some(false));

        // A's response finally lands: discarded, B's state untouched.
        tokio::time::sleep(Duration::from_millis(6_000)).await;
        assert_eq!(debounced.exists(), Some(false));
        assert_eq!(checker.calls(), vec![CPF_A.to_string(), CPF_B.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_cpf_is_never_probed() {
        let checker = Arc::new(ScriptedChecker::new(&[]));
        let debounced = DebouncedCpfChecker::new(checker.clone());

        debounced.on_edit("111.444");
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(checker.calls().is_empty());
        assert_eq!(debounced.exists(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_resolves_to_not_existing() {
        struct FailingChecker;
        impl CpfExistenceCheck for FailingChecker {
            async fn exists(&self, _cpf: &str) -> Result<bool, ExistenceCheckError> {
                Err(ExistenceCheckError::Transport("boom".to_string()))
            }
        }

        let debounced = DebouncedCpfChecker::new(Arc::new(FailingChecker));
        debounced.on_edit(CPF_A);
        tokio::time::sleep(Duration::from_millis(400)).await;

        // The wizard must not stay blocked on a failed lookup.
        assert_eq!(debounced.exists(), Some(false));
    }
}
