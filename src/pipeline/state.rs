//! Pipeline State
//!
//! Session-scoped record of completed analyses keyed by fingerprint, plus
//! the in-flight set backing the at-most-one-call-per-fingerprint invariant.
//! Passed explicitly to every orchestration call - never a process global -
//! so independent sessions coexist and tests stay hermetic.
//!
//! DashMap keeps reads lock-free under concurrent custom-report sections;
//! the orchestrator is the only writer.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::types::{AnalysisResult, Fingerprint, TokenUsage};

/// Session-scoped analysis cache and accounting
#[derive(Debug)]
pub struct PipelineState {
    session_id: String,
    results: DashMap<Fingerprint, AnalysisResult>,
    in_flight: DashMap<Fingerprint, ()>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            results: DashMap::new(),
            in_flight: DashMap::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Cached result for a fingerprint, if any
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<AnalysisResult> {
        self.results.get(fingerprint).map(|r| r.clone())
    }

    /// Record a completed analysis
    pub fn insert(&self, fingerprint: Fingerprint, result: AnalysisResult) {
        self.results.insert(fingerprint, result);
    }

    /// Number of recorded analyses
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Sum of the recorded results' individually computed costs.
    ///
    /// Deliberately an exact sum over stored values, never a re-derived
    /// estimate.
    pub fn cumulative_cost(&self) -> f64 {
        self.results.iter().map(|r| r.cost_usd).sum()
    }

    /// Total token usage across recorded results
    pub fn cumulative_usage(&self) -> TokenUsage {
        self.results
            .iter()
            .fold(TokenUsage::default(), |acc, r| acc.add(&r.usage))
    }

    /// Clear all recorded results (explicit session reset)
    pub fn reset(&self) {
        self.results.clear();
        self.in_flight.clear();
    }

    /// Try to claim the in-flight slot for a fingerprint.
    ///
    /// Returns a guard on success; `None` means another call for the same
    /// fingerprint is outstanding. The guard releases the slot on drop, so
    /// failures and cancellations cannot leak a claim.
    pub fn try_begin<'a>(&'a self, fingerprint: &Fingerprint) -> Option<InFlightGuard<'a>> {
        match self.in_flight.entry(fingerprint.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(entry) => {
                entry.insert(());
                Some(InFlightGuard {
                    state: self,
                    fingerprint: fingerprint.clone(),
                })
            }
        }
    }

    /// Whether a call for this fingerprint is currently outstanding
    pub fn is_in_flight(&self, fingerprint: &Fingerprint) -> bool {
        self.in_flight.contains_key(fingerprint)
    }
}

/// RAII claim on a fingerprint's in-flight slot
pub struct InFlightGuard<'a> {
    state: &'a PipelineState,
    fingerprint: Fingerprint,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.state.in_flight.remove(&self.fingerprint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisKind, Parameters};

    fn fingerprint(text: &str) -> Fingerprint {
        Fingerprint::compute(AnalysisKind::Summary, &Parameters::new(), text)
    }

    fn result(cost: f64, usage: TokenUsage) -> AnalysisResult {
        AnalysisResult {
            kind: AnalysisKind::Summary,
            content: "content".to_string(),
            usage,
            cost_usd: cost,
            model: "gpt-4o-mini".to_string(),
            elapsed_ms: 10,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let state = PipelineState::new();
        let fp = fingerprint("a");

        assert!(state.get(&fp).is_none());
        state.insert(fp.clone(), result(0.01, TokenUsage::new(100, 50)));
        assert!(state.get(&fp).is_some());
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_cumulative_cost_is_exact_sum() {
        let state = PipelineState::new();
        state.insert(fingerprint("a"), result(0.0025, TokenUsage::new(100, 50)));
        state.insert(fingerprint("b"), result(0.00425, TokenUsage::new(200, 75)));

        assert!((state.cumulative_cost() - 0.00675).abs() < 1e-12);

        let usage = state.cumulative_usage();
        assert_eq!(usage.prompt_tokens, 300);
        assert_eq!(usage.completion_tokens, 125);
    }

    #[test]
    fn test_in_flight_guard_exclusive() {
        let state = PipelineState::new();
        let fp = fingerprint("a");

        let guard = state.try_begin(&fp).expect("first claim succeeds");
        assert!(state.try_begin(&fp).is_none());
        assert!(state.is_in_flight(&fp));

        drop(guard);
        assert!(!state.is_in_flight(&fp));
        assert!(state.try_begin(&fp).is_some());
    }

    #[test]
    fn test_guard_released_on_panic_path() {
        let state = PipelineState::new();
        let fp = fingerprint("a");
        {
            let _guard = state.try_begin(&fp).unwrap();
            // Simulated failure: scope exit without insert
        }
        assert!(!state.is_in_flight(&fp));
        assert!(state.get(&fp).is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let state = PipelineState::new();
        state.insert(fingerprint("a"), result(0.01, TokenUsage::new(1, 1)));
        state.reset();
        assert!(state.is_empty());
        assert_eq!(state.cumulative_cost(), 0.0);
    }

    #[test]
    fn test_distinct_sessions_have_distinct_ids() {
        assert_ne!(PipelineState::new().session_id(), PipelineState::new().session_id());
    }
}
