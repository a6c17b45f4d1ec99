//! RecognitionLoop - Frame-by-Frame Orchestration
//!
//! ## Responsibilities
//!
//! - Pull frames from the capture source, one worker, no frame overlap
//! - Run detection and OCR, normalize candidates, apply the length gate
//! - Toggle registered plates (entrada <-> salida) through the registry
//! - Fire the barrier actuator without waiting on it
//! - Enforce the per-plate cooldown between passes
//!
//! ## Failure model
//!
//! - Capture failure: fatal, loop returns the error to the operator
//! - Unusable OCR text / unregistered plate: normal outcomes, next candidate
//! - Durable append failure: this candidate is dropped, loop continues
//! - Actuator failure: logged inside the spawned task, never joins the loop

use crate::actuator::ActuatorClient;
use crate::cooldown::CooldownTracker;
use crate::error::Result;
use crate::normalizer::normalize;
use crate::registry::PlateRegistry;
use crate::vision::{FrameSource, OcrEngine, PlateDetector};
use std::sync::Arc;
use std::time::Instant;

/// Counters reported when the loop stops
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopStats {
    /// Frames pulled from the source
    pub frames: u64,
    /// Candidates that passed normalization and the length gate
    pub candidates: u64,
    /// Records appended (toggles performed)
    pub toggles: u64,
    /// Candidates rejected because the plate is not registered
    pub unregistered: u64,
    /// Candidates skipped inside a cooldown window
    pub suppressed: u64,
}

/// RecognitionLoop instance
///
/// Owns the registry and the cooldown tracker outright; there is exactly
/// one writer, so neither needs a lock.
pub struct RecognitionLoop<S, D, O> {
    source: S,
    detector: D,
    ocr: O,
    registry: PlateRegistry,
    cooldown: CooldownTracker,
    actuator: Option<Arc<ActuatorClient>>,
    min_plate_len: usize,
    stats: LoopStats,
}

impl<S, D, O> RecognitionLoop<S, D, O>
where
    S: FrameSource,
    D: PlateDetector,
    O: OcrEngine,
{
    pub fn new(
        source: S,
        detector: D,
        ocr: O,
        registry: PlateRegistry,
        cooldown: CooldownTracker,
        actuator: Option<Arc<ActuatorClient>>,
        min_plate_len: usize,
    ) -> Self {
        Self {
            source,
            detector,
            ocr,
            registry,
            cooldown,
            actuator,
            min_plate_len,
            stats: LoopStats::default(),
        }
    }

    /// Run until the source ends (clean stop) or the device fails (error).
    /// Returns the loop counters either way a clean stop happens.
    pub async fn run(mut self) -> Result<LoopStats> {
        tracing::info!(min_plate_len = self.min_plate_len, "Recognition loop started");

        loop {
            let frame = match self.source.grab() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("Capture source ended, stopping");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Capture device failed, terminating loop");
                    return Err(e);
                }
            };
            self.stats.frames += 1;

            for region in self.detector.detect(&frame) {
                let Some(raw) = self.ocr.recognize(&frame, &region) else {
                    continue;
                };
                self.process_candidate(&raw).await;
            }
        }

        tracing::info!(
            frames = self.stats.frames,
            candidates = self.stats.candidates,
            toggles = self.stats.toggles,
            unregistered = self.stats.unregistered,
            suppressed = self.stats.suppressed,
            "Recognition loop stopped"
        );
        Ok(self.stats)
    }

    /// One OCR candidate through the gate decision
    async fn process_candidate(&mut self, raw: &str) {
        let plate = normalize(raw);
        tracing::debug!(raw = %raw.trim(), plate = %plate, "OCR candidate");

        if plate.len() < self.min_plate_len {
            return;
        }
        self.stats.candidates += 1;

        let now = Instant::now();
        if self.cooldown.should_suppress(&plate, now) {
            self.stats.suppressed += 1;
            tracing::debug!(plate = %plate, "Cooling down, skipped");
            return;
        }

        let Some(prior) = self.registry.lookup(&plate) else {
            self.stats.unregistered += 1;
            tracing::info!(plate = %plate, "Plate not registered, no actuation");
            return;
        };

        let event = prior.event.opposite();
        // Owner travels forward unchanged from the plate's first record
        let owner = prior.owner.clone();

        let record = match self.registry.append(&plate, event, &owner) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(
                    plate = %plate,
                    error = %e,
                    "Durable append failed, candidate dropped"
                );
                return;
            }
        };
        self.stats.toggles += 1;

        if let Some(actuator) = &self.actuator {
            let actuator = actuator.clone();
            tokio::spawn(async move {
                if let Err(e) = actuator.trigger(record.event).await {
                    tracing::error!(
                        event = %record.event,
                        error = %e,
                        "Barrier actuation failed (pipeline unaffected)"
                    );
                }
            });
        }

        self.cooldown.record_trigger(&plate, now);
    }
}
