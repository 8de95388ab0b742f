//! Per-sensor simulation loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, info_span, trace, Instrument};

use telesim_core::domain::{Reading, ReadingId, SensorSnapshot};
use telesim_core::events::SimulationEvent;
use telesim_core::ports::{EventEmitter, ReadingSink};
use telesim_telemetry::metrics::{reason, MetricsRecorder};

use crate::{chaos, synth};

/// `type` carried by the `reading_error` event of a manual injection.
pub const INJECTION_ERROR_TYPE: &str = "injection";

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Collaborators shared by every simulation loop.
#[derive(Clone)]
pub struct TaskContext {
    pub sink: Arc<dyn ReadingSink>,
    pub emitter: Arc<dyn EventEmitter>,
    pub metrics: Arc<MetricsRecorder>,
}

/// Handle to one running loop. Only the registry holds these.
///
/// Dropping the handle closes the cancellation channel, which ends the loop
/// just like an explicit [`SimulationTask::cancel`].
pub(crate) struct SimulationTask {
    inject_error: Arc<AtomicBool>,
    cancel: oneshot::Sender<()>,
}

impl SimulationTask {
    /// Spawns the loop onto the current Tokio runtime.
    pub(crate) fn spawn(snapshot: SensorSnapshot, context: TaskContext) -> Self {
        let (cancel, cancelled) = oneshot::channel();
        let inject_error = Arc::new(AtomicBool::new(false));
        let span = info_span!("simulation", sensor_id = %snapshot.sensor_id);

        tokio::spawn(
            run(snapshot, inject_error.clone(), cancelled, context).instrument(span),
        );

        Self {
            inject_error,
            cancel,
        }
    }

    /// Arms the one-shot error for the next tick.
    pub(crate) fn request_error(&self) {
        self.inject_error.store(true, Ordering::Release);
    }

    /// Signals the loop without waiting for it to observe the signal.
    pub(crate) fn cancel(self) {
        // Err means the loop already exited.
        let _ = self.cancel.send(());
    }
}

async fn run(
    snapshot: SensorSnapshot,
    inject_error: Arc<AtomicBool>,
    mut cancelled: oneshot::Receiver<()>,
    context: TaskContext,
) {
    let period = snapshot.sampling_interval().max(MIN_INTERVAL);
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!(period_ms = period.as_millis() as u64, "simulation loop started");

    loop {
        tokio::select! {
            biased;
            _ = &mut cancelled => break,
            _ = ticker.tick() => {}
        }
        tick(&snapshot, &inject_error, &context).await;
    }

    drop(ticker);
    debug!("simulation loop stopped");
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Injected,
    SimulatedFault,
    PersistFailed,
    Published(ReadingId),
}

pub(crate) async fn tick(
    snapshot: &SensorSnapshot,
    inject_error: &AtomicBool,
    context: &TaskContext,
) -> TickOutcome {
    if inject_error.swap(false, Ordering::AcqRel) {
        context.metrics.record_reading_error(reason::INJECTION);
        let event = SimulationEvent::reading_error(&snapshot.sensor_id, INJECTION_ERROR_TYPE);
        if let Err(e) = context.emitter.publish(event).await {
            debug!(error = %e, "reading_error event not published");
        }
        return TickOutcome::Injected;
    }

    if chaos::fault_roll(snapshot.error_probability) {
        context.metrics.record_reading_error(reason::SIMULATED_FAULT);
        trace!("simulated fault, cycle skipped");
        return TickOutcome::SimulatedFault;
    }

    let (value, unit) = synth::generate(snapshot.sensor_type);
    let reading = Reading::new(
        snapshot.sensor_id.clone(),
        snapshot.device_id.clone(),
        snapshot.sensor_type,
        value,
        unit,
        Utc::now(),
    );

    let reading_id = match context.sink.save(reading).await {
        Ok(id) => id,
        Err(e) => {
            context.metrics.record_reading_error(reason::PERSISTENCE);
            debug!(error = %e, "reading not persisted, cycle skipped");
            return TickOutcome::PersistFailed;
        }
    };
    context
        .metrics
        .record_reading(snapshot.sensor_type.as_str(), snapshot.device_id.as_str());
    if let Some(breach) = snapshot.thresholds.exceeds(value) {
        context
            .metrics
            .record_breach(snapshot.sensor_id.as_str(), breach.as_str());
        info!(value, bound = breach.as_str(), "reading outside thresholds");
    }

    let event = SimulationEvent::reading_published(&snapshot.sensor_id, reading_id);
    if let Err(e) = context.emitter.publish(event).await {
        debug!(error = %e, "reading_published event not published");
    }
    TickOutcome::Published(reading_id)
}
