use std::time::Instant;

use tracing::info;

/// Pipeline stages reported to a [`ProgressObserver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Escape-time field generation.
    Field,
    /// Simplified top surface.
    Surface,
    /// Perimeter walls and base fan.
    Skirts,
}

/// Hooks called at stage boundaries.
///
/// Both methods default to no-ops; `()` is the silent observer.
pub trait ProgressObserver {
    fn stage_started(&mut self, _stage: Stage) {}

    /// `triangles` is the number emitted by the stage, `0` for [`Stage::Field`].
    fn stage_finished(&mut self, _stage: Stage, _triangles: usize) {}
}

impl ProgressObserver for () {}

/// Logs each stage boundary with its elapsed time.
#[derive(Debug, Default)]
pub struct TracingProgress {
    started: Option<Instant>,
}

impl ProgressObserver for TracingProgress {
    fn stage_started(&mut self, stage: Stage) {
        info!("starting {stage:?}");
        self.started = Some(Instant::now());
    }

    fn stage_finished(&mut self, stage: Stage, triangles: usize) {
        let elapsed = self.started.take().map(|t| t.elapsed()).unwrap_or_default();
        match stage {
            Stage::Field => info!("finished {stage:?} in {elapsed:?}"),
            _ => info!("finished {stage:?}: {triangles} triangles in {elapsed:?}"),
        }
    }
}

/// Records every callback, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingProgress {
    pub events: Vec<(Stage, Option<usize>)>,
}

#[cfg(test)]
impl ProgressObserver for RecordingProgress {
    fn stage_started(&mut self, stage: Stage) {
        self.events.push((stage, None));
    }

    fn stage_finished(&mut self, stage: Stage, triangles: usize) {
        self.events.push((stage, Some(triangles)));
    }
}
