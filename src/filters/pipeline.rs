//! Debounced filter-selection pipeline.
//!
//! Widgets push changes in through the `handle_*` methods. Each change marks
//! the pipeline pending, applies the mutation, schedules the pending flag to
//! settle on the next runtime turn and (re)arms the debounce timer. When the
//! quiet window elapses the current snapshot is compared with the last one
//! handed to the consumer and emitted only if it differs.

use super::{
    models::{FilterBounds, FilterDefaults, FilterDimension, FilterSnapshot, Range},
    scheduler::{Scheduler, TaskHandle},
};
use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tracing::{debug, trace};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Receives every settled snapshot that differs from the previous emission.
pub type FilterConsumer = Arc<dyn Fn(FilterSnapshot) + Send + Sync>;

struct PipelineState {
    current: FilterSnapshot,
    defaults: FilterDefaults,
    bounds: Option<FilterBounds>,
    pending: bool,
    last_emitted: String,
    debounce_timer: Option<TaskHandle>,
    settle_timer: Option<TaskHandle>,
    /// Bumped on every arm; a firing timer with an older value is stale.
    generation: u64,
    disposed: bool,
}

struct Inner {
    state: Mutex<PipelineState>,
    scheduler: Arc<dyn Scheduler>,
    consumer: FilterConsumer,
    debounce: Duration,
}

pub struct FilterPipeline {
    inner: Arc<Inner>,
}

impl FilterPipeline {
    pub fn new(
        defaults: FilterDefaults,
        debounce: Duration,
        scheduler: Arc<dyn Scheduler>,
        consumer: FilterConsumer,
    ) -> Self {
        let current = FilterSnapshot::with_defaults(defaults);
        let last_emitted = current.canonical();
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(PipelineState {
                    current,
                    defaults,
                    bounds: None,
                    pending: false,
                    last_emitted,
                    debounce_timer: None,
                    settle_timer: None,
                    generation: 0,
                    disposed: false,
                }),
                scheduler,
                consumer,
                debounce,
            }),
        }
    }

    /// Replaces the selected values of one dimension.
    pub fn handle_selection_change<I, S>(&self, dimension: FilterDimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.inner.change(|state| {
            *state.current.values_mut(dimension) = values;
        });
    }

    pub fn handle_price_range_change(&self, min: f64, max: f64) {
        self.inner.change(|state| {
            state.current.price_range = Range::new(min, max);
        });
    }

    pub fn handle_case_size_range_change(&self, min: f64, max: f64) {
        self.inner.change(|state| {
            state.current.case_size_range = Range::new(min, max);
        });
    }

    /// Clears every selection and resets the ranges to the known bounds, or
    /// to the defaults when no bounds were applied.
    pub fn handle_clear_filters(&self) {
        self.inner.change(|state| {
            let reset_to = state.bounds.map(FilterDefaults::from).unwrap_or(state.defaults);
            state.current.reset(reset_to);
        });
    }

    /// Records server-provided bounds and moves both ranges onto them.
    pub fn apply_bounds(&self, bounds: FilterBounds) {
        self.inner.change(|state| {
            let bounds = FilterBounds {
                price_range: Range::new(bounds.price_range.min, bounds.price_range.max),
                case_size_range: Range::new(bounds.case_size_range.min, bounds.case_size_range.max),
            };
            state.bounds = Some(bounds);
            state.current.price_range = bounds.price_range;
            state.current.case_size_range = bounds.case_size_range;
        });
    }

    /// Current, possibly unsettled, local state.
    pub fn snapshot(&self) -> FilterSnapshot {
        self.inner.lock().current.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.lock().pending
    }

    /// Cancels outstanding timers. No emission happens afterwards.
    pub fn dispose(&self) {
        let mut state = self.inner.lock();
        if state.disposed {
            return;
        }
        state.disposed = true;
        for timer in [state.debounce_timer.take(), state.settle_timer.take()]
            .into_iter()
            .flatten()
        {
            timer.cancel();
        }
        debug!("filter pipeline disposed");
    }
}

impl Drop for FilterPipeline {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn change<F>(self: &Arc<Self>, mutate: F)
    where
        F: FnOnce(&mut PipelineState),
    {
        let mut state = self.lock();
        if state.disposed {
            return;
        }
        state.pending = true;
        mutate(&mut *state);

        let weak = Arc::downgrade(self);
        let settle = self.scheduler.schedule(
            Duration::ZERO,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let mut state = inner.lock();
                    state.pending = false;
                    state.settle_timer = None;
                }
            }),
        );
        if let Some(previous) = state.settle_timer.replace(settle) {
            previous.cancel();
        }

        self.arm_debounce(&mut state);
    }

    fn arm_debounce(self: &Arc<Self>, state: &mut PipelineState) {
        if let Some(previous) = state.debounce_timer.take() {
            previous.cancel();
        }
        state.generation += 1;
        let generation = state.generation;
        let weak: Weak<Self> = Arc::downgrade(self);
        state.debounce_timer = Some(self.scheduler.schedule(
            self.debounce,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.fire(generation);
                }
            }),
        ));
    }

    fn fire(self: &Arc<Self>, generation: u64) {
        let snapshot = {
            let mut state = self.lock();
            if state.disposed || state.generation != generation {
                return;
            }
            state.debounce_timer = None;

            if state.pending {
                trace!("filters still settling, re-arming debounce");
                self.arm_debounce(&mut state);
                return;
            }

            let canonical = state.current.canonical();
            if canonical == state.last_emitted {
                trace!("filter snapshot unchanged, emission suppressed");
                return;
            }
            state.last_emitted = canonical;
            state.current.clone()
        };

        debug!(filters = ?snapshot, "emitting filter snapshot");
        (self.consumer)(snapshot);
    }
}
