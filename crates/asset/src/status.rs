//! Load state of a single asset and of an all-or-nothing asset array.
//!
//! A [`LoadableAsset`] starts pending and moves exactly once to a terminal
//! state. The payload is only reachable through the `Loaded` state.

use std::fmt;

/// Observable status of an asset. `code()` gives the numeric form used by
/// status observers: 0 pending, 1 loaded, -1 failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetStatus {
    NotLoaded,
    Loaded,
    Failed,
}

impl AssetStatus {
    pub fn code(self) -> i8 {
        match self {
            AssetStatus::NotLoaded => 0,
            AssetStatus::Loaded => 1,
            AssetStatus::Failed => -1,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != AssetStatus::NotLoaded
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetStatus::NotLoaded => f.write_str("not loaded"),
            AssetStatus::Loaded => f.write_str("loaded"),
            AssetStatus::Failed => f.write_str("failed"),
        }
    }
}

pub type StatusObserver = Box<dyn FnMut(AssetStatus)>;

enum AssetState<T> {
    Pending,
    Loaded(T),
    Failed(String),
}

pub struct LoadableAsset<T> {
    state: AssetState<T>,
    observer: Option<StatusObserver>,
}

impl<T> LoadableAsset<T> {
    pub fn pending() -> Self {
        Self {
            state: AssetState::Pending,
            observer: None,
        }
    }

    pub fn status(&self) -> AssetStatus {
        match self.state {
            AssetState::Pending => AssetStatus::NotLoaded,
            AssetState::Loaded(_) => AssetStatus::Loaded,
            AssetState::Failed(_) => AssetStatus::Failed,
        }
    }

    pub fn payload(&self) -> Option<&T> {
        match &self.state {
            AssetState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Reason recorded for a failed load.
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            AssetState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Register the status observer, replacing any previous one. If the
    /// asset already reached a terminal state, the observer runs right away.
    pub fn on_status_changed(&mut self, observer: impl FnMut(AssetStatus) + 'static) {
        let mut observer: StatusObserver = Box::new(observer);
        let status = self.status();
        if status.is_terminal() {
            observer(status);
        }
        self.observer = Some(observer);
    }

    /// Move to the terminal state for `result`. Returns the new status, or
    /// `None` if the asset had already settled.
    pub(crate) fn resolve(&mut self, result: Result<T, String>) -> Option<AssetStatus> {
        if !matches!(self.state, AssetState::Pending) {
            return None;
        }
        self.state = match result {
            Ok(value) => AssetState::Loaded(value),
            Err(reason) => AssetState::Failed(reason),
        };
        let status = self.status();
        if let Some(observer) = self.observer.as_mut() {
            observer(status);
        }
        Some(status)
    }
}

impl<T> Default for LoadableAsset<T> {
    fn default() -> Self {
        Self::pending()
    }
}

impl<T> fmt::Debug for LoadableAsset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadableAsset")
            .field("status", &self.status())
            .field("failure", &self.failure())
            .finish_non_exhaustive()
    }
}

/// A fixed-size group of assets loaded in parallel.
///
/// Elements may complete in any order; payloads keep request order. The
/// aggregate becomes `Loaded` once every element succeeded. The first
/// element failure fails the aggregate immediately; later completions are
/// still counted but no longer change it.
pub struct ArrayAsset<T> {
    slots: Vec<Option<T>>,
    completed: usize,
    succeeded: usize,
    aggregate: LoadableAsset<Vec<T>>,
}

impl<T> ArrayAsset<T> {
    pub fn new(len: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(len).collect(),
            completed: 0,
            succeeded: 0,
            aggregate: LoadableAsset::pending(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Elements that finished, successfully or not.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn status(&self) -> AssetStatus {
        self.aggregate.status()
    }

    pub fn payload(&self) -> Option<&[T]> {
        self.aggregate.payload().map(Vec::as_slice)
    }

    pub fn failure(&self) -> Option<&str> {
        self.aggregate.failure()
    }

    pub fn on_status_changed(&mut self, observer: impl FnMut(AssetStatus) + 'static) {
        self.aggregate.on_status_changed(observer);
    }

    /// Record element `index`. Returns the aggregate status if it changed.
    pub(crate) fn record(&mut self, index: usize, result: Result<T, String>) -> Option<AssetStatus> {
        let Some(slot) = self.slots.get_mut(index) else {
            log::warn!("Ignoring completion for out-of-range element {index}");
            return None;
        };
        self.completed += 1;

        match result {
            Ok(value) => {
                if self.aggregate.status().is_terminal() {
                    return None;
                }
                if slot.replace(value).is_none() {
                    self.succeeded += 1;
                }
                if self.succeeded < self.slots.len() {
                    return None;
                }
                let values = self.slots.iter_mut().filter_map(Option::take).collect();
                self.aggregate.resolve(Ok(values))
            }
            Err(reason) => self
                .aggregate
                .resolve(Err(format!("element {index}: {reason}"))),
        }
    }
}

impl<T> fmt::Debug for ArrayAsset<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayAsset")
            .field("len", &self.len())
            .field("completed", &self.completed)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
