//! Wait Engine - adaptive duration waits and condition polling
//!
//! One invocation flows through:
//!
//! ```text
//! validate → snapshot context → resolve speed → compute interval
//!          → scale by profile + learned bias → sleep / poll → record outcome
//! ```
//!
//! The engine owns no global state. Context, learning and usage sinks are
//! injected so tests can run against fixed scores and an in-memory store.

mod compute;
mod error;
mod pool;
pub mod speed;

pub use compute::{
    apply_profile_and_bias, compute_factor, duration_interval, poll_interval, ClampedInterval,
};
pub use error::WaitError;
pub use pool::{CancelPredicate, PoolTask};

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::WaitConfig;
use crate::context::{ContextProvider, SystemContext};
use crate::explain::ExplainReport;
use crate::learning::{
    InMemoryLearningStore, JsonFileLearningStore, LearningSample, LearningStore,
};
use crate::telemetry::usage::{JsonlUsageLog, UsageLog};
use crate::telemetry::{TelemetrySession, TelemetrySubscriber, TelemetrySummary};
use crate::types::{
    ContextSnapshot, Detector, ExecutionProfile, ProfileRegistry, RequestedInput, Speed,
    WaitDecision, WaitRequest,
};

// ============================================================================
// Options
// ============================================================================

/// Per-invocation knobs.
#[derive(Clone, Default)]
pub struct WaitOptions {
    /// Network of interest; `None` means no Wi-Fi score is captured.
    pub wifi: Option<String>,
    pub speed: Speed,
    /// Derive speed from context, ignoring `speed`.
    pub smart: bool,
    /// Profile name; `None` books the wait under `auto`.
    pub profile: Option<String>,
    pub verbose: bool,
    /// Attach an [`ExplainReport`] to the outcome.
    pub explain: bool,
    /// Collect a telemetry session.
    pub telemetry: bool,
    pub subscriber: Option<Arc<dyn TelemetrySubscriber>>,
    pub cancel: Option<CancellationToken>,
}

impl WaitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options seeded from the `[defaults]` config section.
    pub fn from_config(config: &WaitConfig) -> Self {
        Self {
            speed: config.defaults.speed.parse().unwrap_or_default(),
            profile: config.defaults.profile.clone(),
            telemetry: config.defaults.telemetry,
            ..Self::default()
        }
    }

    pub fn with_wifi(mut self, wifi: impl Into<String>) -> Self {
        self.wifi = Some(wifi.into());
        self
    }

    pub fn with_speed(mut self, speed: impl Into<Speed>) -> Self {
        self.speed = speed.into();
        self
    }

    pub fn with_smart(mut self, smart: bool) -> Self {
        self.smart = smart;
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    pub fn with_telemetry(mut self, telemetry: bool) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn TelemetrySubscriber>) -> Self {
        self.subscriber = Some(subscriber);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl std::fmt::Debug for WaitOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitOptions")
            .field("wifi", &self.wifi)
            .field("speed", &self.speed)
            .field("smart", &self.smart)
            .field("profile", &self.profile)
            .field("verbose", &self.verbose)
            .field("explain", &self.explain)
            .field("telemetry", &self.telemetry)
            .field("subscriber", &self.subscriber.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Primary result of one invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitResult {
    /// Duration mode: seconds actually slept (the final interval).
    Waited(f64),
    /// Condition mode: whether the condition held before the timeout.
    Condition(bool),
}

#[derive(Debug, Clone)]
pub struct WaitOutcome {
    pub result: WaitResult,
    /// Measured wall time of the invocation.
    pub elapsed: Duration,
    pub decision: WaitDecision,
    pub report: Option<ExplainReport>,
    pub telemetry: Option<TelemetrySummary>,
}

impl WaitOutcome {
    /// Seconds slept, for duration-mode outcomes.
    pub fn waited(&self) -> Option<f64> {
        match self.result {
            WaitResult::Waited(seconds) => Some(seconds),
            WaitResult::Condition(_) => None,
        }
    }

    /// Whether the condition held, for condition-mode outcomes.
    pub fn condition_met(&self) -> Option<bool> {
        match self.result {
            WaitResult::Condition(met) => Some(met),
            WaitResult::Waited(_) => None,
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Explicit engine instance; cheap to clone (every component is shared).
#[derive(Clone)]
pub struct WaitEngine {
    profiles: ProfileRegistry,
    context: Arc<dyn ContextProvider>,
    learning: Arc<dyn LearningStore>,
    usage: Option<Arc<dyn UsageLog>>,
}

impl WaitEngine {
    pub fn new(context: Arc<dyn ContextProvider>, learning: Arc<dyn LearningStore>) -> Self {
        Self {
            profiles: ProfileRegistry,
            context,
            learning,
            usage: None,
        }
    }

    /// Engine wired from configuration: system sensors, file-backed learning
    /// (or in-memory when disabled) and the local usage log when enabled.
    pub fn from_config(config: &WaitConfig) -> Self {
        let learning: Arc<dyn LearningStore> = if config.learning.enabled {
            Arc::new(JsonFileLearningStore::open(&config.learning.path))
        } else {
            Arc::new(InMemoryLearningStore::new())
        };
        let engine = Self::new(Arc::new(SystemContext::new()), learning);
        if config.usage.effective_enabled() {
            engine.with_usage_log(Arc::new(JsonlUsageLog::from_config(&config.usage)))
        } else {
            engine
        }
    }

    pub fn with_usage_log(mut self, usage: Arc<dyn UsageLog>) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn learning(&self) -> &Arc<dyn LearningStore> {
        &self.learning
    }

    pub fn context_provider(&self) -> &Arc<dyn ContextProvider> {
        &self.context
    }

    /// Run one wait.
    ///
    /// Sensor and persistence faults never surface; a condition timeout is
    /// `Ok(WaitResult::Condition(false))`.
    pub async fn wait(
        &self,
        request: WaitRequest,
        options: &WaitOptions,
    ) -> Result<WaitOutcome, WaitError> {
        request.validate()?;
        let requested = request.requested();
        match request {
            WaitRequest::Duration(_) | WaitRequest::Auto => {
                self.run_duration(requested, options).await
            }
            WaitRequest::Condition { condition, timeout } => {
                self.run_condition(condition, timeout, options).await
            }
        }
    }

    /// Synchronous wrapper around [`WaitEngine::wait`].
    ///
    /// Builds a current-thread runtime, so it must not be called from
    /// inside an async context.
    pub fn wait_blocking(
        &self,
        request: WaitRequest,
        options: &WaitOptions,
    ) -> Result<WaitOutcome, WaitError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on(self.wait(request, options))
    }

    /// Compute the decision for a request without sleeping.
    pub fn decide(
        &self,
        requested: RequestedInput,
        options: &WaitOptions,
        context: ContextSnapshot,
    ) -> WaitDecision {
        let profile = self.profiles.resolve(options.profile.as_deref());
        self.decide_for(requested, options, profile, context)
    }

    fn decide_for(
        &self,
        requested: RequestedInput,
        options: &WaitOptions,
        profile: &ExecutionProfile,
        context: ContextSnapshot,
    ) -> WaitDecision {
        let speed_value = speed::resolve(options.speed, options.smart, &context);
        let factor = compute_factor(&context, speed_value);
        let clamped = match requested {
            RequestedInput::Duration { seconds } => duration_interval(Some(seconds), factor),
            RequestedInput::Auto => duration_interval(None, factor),
            RequestedInput::Condition { .. } => poll_interval(factor),
        };
        let bias = self.learning.bias(profile.name);

        WaitDecision {
            requested,
            speed: options.speed,
            smart: options.smart,
            speed_value,
            profile: profile.name.to_string(),
            aggressiveness: profile.aggressiveness,
            context,
            factor,
            bias,
            resolved_interval: clamped.interval,
            final_interval: apply_profile_and_bias(clamped.interval, profile, bias),
            min_floor_applied: clamped.min_floor_applied,
            max_cap_applied: clamped.max_cap_applied,
        }
    }

    async fn run_duration(
        &self,
        requested: RequestedInput,
        options: &WaitOptions,
    ) -> Result<WaitOutcome, WaitError> {
        let profile = self.profiles.resolve(options.profile.as_deref());
        let context = self.context.snapshot(options.wifi.as_deref());
        let mut session = self.session(options, profile, context);
        session.start();

        let decision = self.decide_for(requested, options, profile, context);
        let planned = match to_duration(decision.final_interval) {
            Ok(planned) => planned,
            Err(e) => {
                session.stop();
                return Err(e);
            }
        };
        session.record(decision.factor, decision.final_interval);
        log_decision(&decision, options.verbose || profile.verbose);

        let started = Instant::now();
        let interrupted = sleep_or_cancel(planned, options.cancel.as_ref()).await;
        let elapsed = started.elapsed();
        session.stop();

        let expected = decision.final_interval;
        if interrupted {
            self.record(profile.name, LearningSample::failure(expected, elapsed.as_secs_f64()))
                .await;
            return Err(WaitError::Interrupted {
                profile: profile.name.to_string(),
                elapsed,
            });
        }
        self.record(profile.name, LearningSample::success(expected, elapsed.as_secs_f64()))
            .await;

        Ok(self.outcome(WaitResult::Waited(expected), elapsed, decision, options, &session))
    }

    async fn run_condition(
        &self,
        mut condition: Box<dyn Detector>,
        timeout: f64,
        options: &WaitOptions,
    ) -> Result<WaitOutcome, WaitError> {
        let profile = self.profiles.resolve(options.profile.as_deref());
        let context = self.context.snapshot(options.wifi.as_deref());
        let mut session = self.session(options, profile, context);
        session.start();

        let decision =
            self.decide_for(RequestedInput::Condition { timeout }, options, profile, context);
        log_decision(&decision, options.verbose || profile.verbose);
        let started = Instant::now();

        if timeout <= 0.0 {
            session.stop();
            return Ok(self.outcome(
                WaitResult::Condition(false),
                Duration::ZERO,
                decision,
                options,
                &session,
            ));
        }

        // Unrepresentable timeouts (infinite, overflowing) poll forever.
        let deadline = Duration::try_from_secs_f64(timeout)
            .ok()
            .and_then(|budget| started.checked_add(budget));
        let poll = match to_duration(decision.final_interval) {
            Ok(poll) => poll,
            Err(e) => {
                session.stop();
                return Err(e);
            }
        };

        loop {
            if options.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Err(self.interrupted(profile, timeout, started, &mut session).await);
            }

            if condition.detect() {
                let elapsed = started.elapsed();
                session.stop();
                self.record(profile.name, LearningSample::success(1.0, 1.0)).await;
                debug!(profile = profile.name, elapsed = ?elapsed, "Condition met");
                return Ok(self.outcome(
                    WaitResult::Condition(true),
                    elapsed,
                    decision,
                    options,
                    &session,
                ));
            }

            let now = Instant::now();
            let sleep_for = match deadline {
                Some(deadline) if now >= deadline => {
                    let elapsed = started.elapsed();
                    session.stop();
                    self.record(
                        profile.name,
                        LearningSample::failure(timeout, elapsed.as_secs_f64()),
                    )
                    .await;
                    debug!(profile = profile.name, timeout, "Condition timed out");
                    return Ok(self.outcome(
                        WaitResult::Condition(false),
                        elapsed,
                        decision,
                        options,
                        &session,
                    ));
                }
                Some(deadline) => poll.min(deadline - now),
                None => poll,
            };

            session.record(decision.factor, sleep_for.as_secs_f64());
            if sleep_or_cancel(sleep_for, options.cancel.as_ref()).await {
                return Err(self.interrupted(profile, timeout, started, &mut session).await);
            }
        }
    }

    async fn interrupted(
        &self,
        profile: &ExecutionProfile,
        expected: f64,
        started: Instant,
        session: &mut TelemetrySession,
    ) -> WaitError {
        let elapsed = started.elapsed();
        session.stop();
        self.record(profile.name, LearningSample::failure(expected, elapsed.as_secs_f64()))
            .await;
        WaitError::Interrupted {
            profile: profile.name.to_string(),
            elapsed,
        }
    }

    fn session(
        &self,
        options: &WaitOptions,
        profile: &ExecutionProfile,
        context: ContextSnapshot,
    ) -> TelemetrySession {
        if !options.telemetry {
            return TelemetrySession::disabled();
        }
        TelemetrySession::new(true, profile.name, context)
            .with_subscriber(options.subscriber.clone())
            .with_usage_log(self.usage.clone())
    }

    /// Learning bookkeeping. Persistence faults are logged, never raised.
    ///
    /// File-backed stores write under their lock, so the update runs on the
    /// blocking pool.
    async fn record(&self, profile: &str, sample: LearningSample) {
        let learning = Arc::clone(&self.learning);
        let key = profile.to_string();
        let updated = tokio::task::spawn_blocking(move || learning.update(&key, &sample)).await;
        match updated {
            Ok(Ok(state)) => debug!(
                profile,
                bias = state.bias,
                samples = state.samples,
                backend = self.learning.backend_name(),
                "Learning updated"
            ),
            Ok(Err(e)) => warn!(
                profile,
                backend = self.learning.backend_name(),
                error = %e,
                "Failed to persist learning state"
            ),
            Err(e) => warn!(profile, error = %e, "Learning update task failed"),
        }
    }

    fn outcome(
        &self,
        result: WaitResult,
        elapsed: Duration,
        decision: WaitDecision,
        options: &WaitOptions,
        session: &TelemetrySession,
    ) -> WaitOutcome {
        let report = options.explain.then(|| ExplainReport::from_decision(&decision));
        WaitOutcome {
            result,
            elapsed,
            decision,
            report,
            telemetry: session.summary(),
        }
    }
}

impl std::fmt::Debug for WaitEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitEngine")
            .field("context", &self.context.provider_name())
            .field("learning", &self.learning.backend_name())
            .field("usage", &self.usage.is_some())
            .finish()
    }
}

/// Sleep unless cancelled first. Returns `true` when cancelled.
async fn sleep_or_cancel(duration: Duration, cancel: Option<&CancellationToken>) -> bool {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => true,
            () = tokio::time::sleep(duration) => false,
        },
        None => {
            tokio::time::sleep(duration).await;
            false
        }
    }
}

fn to_duration(seconds: f64) -> Result<Duration, WaitError> {
    Duration::try_from_secs_f64(seconds).map_err(|e| {
        WaitError::InvalidRequest(format!("interval of {seconds}s cannot be slept: {e}"))
    })
}

fn log_decision(decision: &WaitDecision, verbose: bool) {
    if verbose {
        info!(
            profile = %decision.profile,
            requested = %decision.requested,
            speed = decision.speed_value,
            factor = decision.factor,
            bias = decision.bias,
            interval = decision.final_interval,
            "Adaptive wait"
        );
    } else {
        debug!(
            profile = %decision.profile,
            requested = %decision.requested,
            speed = decision.speed_value,
            factor = decision.factor,
            bias = decision.bias,
            interval = decision.final_interval,
            "Adaptive wait"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticContext;
    use crate::telemetry::usage::NoopUsageLog;
    use crate::telemetry::TelemetryMessage;
    use crate::types::SpeedPreset;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    fn engine(cpu: f64, wifi: f64) -> (WaitEngine, Arc<InMemoryLearningStore>) {
        let store = Arc::new(InMemoryLearningStore::new());
        let engine = WaitEngine::new(
            Arc::new(StaticContext::new(cpu, wifi)),
            store.clone() as Arc<dyn LearningStore>,
        );
        (engine, store)
    }

    #[test]
    fn test_decide_perfect_context_caps_at_requested() {
        let (engine, _) = engine(10.0, 10.0);
        let options = WaitOptions::new().with_wifi("lab").with_speed(1.0);
        let decision = engine.decide(
            RequestedInput::Duration { seconds: 4.0 },
            &options,
            ContextSnapshot::new(10.0, Some(10.0)),
        );
        assert_eq!(decision.factor, 0.2);
        assert_eq!(decision.final_interval, 4.0);
        assert!(decision.max_cap_applied);
        assert_eq!(decision.profile, "auto");
    }

    #[test]
    fn test_decide_uses_profile_and_bias() {
        let (engine, store) = engine(5.0, 5.0);
        store
            .update("rpa", &LearningSample::success(1.0, 2.0))
            .unwrap();
        let bias = store.bias("rpa");

        let options = WaitOptions::new()
            .with_speed(SpeedPreset::Fast)
            .with_profile("rpa");
        let decision = engine.decide(RequestedInput::Auto, &options, ContextSnapshot::new(4.0, None));
        // factor = (10 - 4) / 3 = 2.0 → resolved 2.0, × 2.0 aggressiveness × bias
        assert_eq!(decision.resolved_interval, 2.0);
        assert_eq!(decision.bias, bias);
        assert_eq!(decision.final_interval, (4.0 * bias * 10_000.0).round() / 10_000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duration_wait_sleeps_final_interval_and_learns() {
        let (engine, store) = engine(5.0, 5.0);
        let options = WaitOptions::new().with_speed(SpeedPreset::Normal);

        let outcome = engine.wait(WaitRequest::duration(1.0), &options).await.unwrap();
        // risk 5 (cpu only) → factor 5 / 1.5 → raw 0.3
        assert_eq!(outcome.waited(), Some(0.3));
        assert!(outcome.elapsed >= Duration::from_millis(300));
        assert!(outcome.report.is_none());
        assert!(outcome.telemetry.is_none());

        let state = store.state("auto").unwrap();
        assert_eq!(state.samples, 1);
        assert_eq!(state.timeouts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_profile_books_under_default() {
        let (engine, store) = engine(5.0, 5.0);
        let options = WaitOptions::new().with_profile("warp-drive");
        let outcome = engine.wait(WaitRequest::Auto, &options).await.unwrap();
        assert_eq!(outcome.decision.profile, "default");
        assert!(store.state("default").is_some());
        assert!(store.state("warp-drive").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_duration_is_rejected_before_learning() {
        let (engine, store) = engine(5.0, 5.0);
        let err = engine
            .wait(WaitRequest::duration(-2.0), &WaitOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::InvalidRequest(_)));
        assert!(store.snapshot().profiles.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_condition_zero_timeout_never_evaluates() {
        let (engine, store) = engine(5.0, 5.0);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let request = WaitRequest::condition(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            },
            0.0,
        );

        let outcome = engine.wait(request, &WaitOptions::new()).await.unwrap();
        assert_eq!(outcome.condition_met(), Some(false));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(store.snapshot().profiles.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_condition_met_records_unit_sample() {
        let (engine, store) = engine(5.0, 5.0);
        let mut polls = 0;
        let request = WaitRequest::condition(
            move || {
                polls += 1;
                polls == 3
            },
            10.0,
        );

        let options = WaitOptions::new().with_profile("ci");
        let outcome = engine.wait(request, &options).await.unwrap();
        assert_eq!(outcome.condition_met(), Some(true));
        // ratio 1.0 keeps the bias at 1.0
        let state = store.state("ci").unwrap();
        assert_eq!(state.bias, 1.0);
        assert_eq!(state.samples, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_condition_timeout_returns_false_and_penalises() {
        let (engine, store) = engine(5.0, 5.0);
        let outcome = engine
            .wait(WaitRequest::condition(|| false, 0.2), &WaitOptions::new())
            .await
            .unwrap();
        assert_eq!(outcome.condition_met(), Some(false));
        assert!(outcome.elapsed >= Duration::from_millis(200));

        let state = store.state("auto").unwrap();
        assert_eq!(state.timeouts, 1);
        assert!(state.bias > 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nan_timeout_is_usage_error() {
        let (engine, _) = engine(5.0, 5.0);
        let err = engine
            .wait(WaitRequest::condition(|| true, f64::NAN), &WaitOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::InvalidRequest(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_duration_records_failure() {
        let (engine, store) = engine(5.0, 5.0);
        let token = CancellationToken::new();
        let options = WaitOptions::new().with_cancel(token.clone());

        let waiter = {
            let engine = engine.clone();
            tokio::spawn(async move { engine.wait(WaitRequest::duration(60.0), &options).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();

        let err = waiter.await.unwrap().unwrap_err();
        assert!(err.is_interrupted());
        let state = store.state("auto").unwrap();
        assert_eq!(state.timeouts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explain_and_telemetry_attached() {
        let (engine, _) = engine(3.0, 7.0);
        let engine = engine.with_usage_log(Arc::new(NoopUsageLog));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let options = WaitOptions::new()
            .with_wifi("office")
            .with_explain(true)
            .with_telemetry(true)
            .with_subscriber(Arc::new(tx));

        let outcome = engine.wait(WaitRequest::duration(2.0), &options).await.unwrap();
        let report = outcome.report.unwrap();
        assert_eq!(report.wifi_score, Some(7.0));
        assert_eq!(report.final_interval, outcome.decision.final_interval);

        let summary = outcome.telemetry.unwrap();
        assert_eq!(summary.adjustments, 1);
        assert_eq!(summary.profile, "auto");

        let first = rx.recv().await.unwrap();
        assert!(matches!(first, TelemetryMessage::Event(_)));
        let last = rx.recv().await.unwrap();
        assert!(matches!(last, TelemetryMessage::Stop(_)));
    }

    #[derive(Default)]
    struct CountingContext(AtomicUsize);

    impl ContextProvider for CountingContext {
        fn snapshot(&self, _wifi_hint: Option<&str>) -> ContextSnapshot {
            self.0.fetch_add(1, Ordering::SeqCst);
            ContextSnapshot::new(5.0, None)
        }

        fn provider_name(&self) -> &'static str {
            "Counting"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_duration_rejected_before_sampling() {
        let context = Arc::new(CountingContext::default());
        let engine = WaitEngine::new(
            context.clone() as Arc<dyn ContextProvider>,
            Arc::new(InMemoryLearningStore::new()),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let options = WaitOptions::new()
            .with_speed(0.1)
            .with_telemetry(true)
            .with_subscriber(Arc::new(tx));

        let err = engine
            .wait(WaitRequest::duration(1e30), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::InvalidRequest(_)));
        assert_eq!(context.0.load(Ordering::SeqCst), 0);

        drop(options);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsleepable_interval_still_stops_telemetry() {
        // a vanishing speed makes the auto interval overflow `Duration`
        let (engine, store) = engine(5.0, 5.0);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let options = WaitOptions::new()
            .with_speed(1e-300)
            .with_telemetry(true)
            .with_subscriber(Arc::new(tx));

        let err = engine.wait(WaitRequest::Auto, &options).await.unwrap_err();
        assert!(matches!(err, WaitError::InvalidRequest(_)));
        drop(options);

        let message = rx.recv().await.unwrap();
        assert!(matches!(message, TelemetryMessage::Stop(ref s) if s.adjustments == 0));
        assert!(rx.recv().await.is_none());
        assert!(store.snapshot().profiles.is_empty());
    }
}
