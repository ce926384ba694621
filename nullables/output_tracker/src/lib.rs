use std::sync::{Arc, Mutex, Weak};

/// Emits events to every tracker that is still alive.
/// Trackers are held weakly, so dropping a tracker stops the recording.
pub struct OutputListenerMt<T: Clone> {
    trackers: Mutex<Vec<Weak<OutputTrackerMt<T>>>>,
}

impl<T: Clone> OutputListenerMt<T> {
    pub fn new() -> Self {
        Self {
            trackers: Mutex::new(Vec::new()),
        }
    }

    pub fn track(&self) -> Arc<OutputTrackerMt<T>> {
        let tracker = Arc::new(OutputTrackerMt::new());
        self.trackers.lock().unwrap().push(Arc::downgrade(&tracker));
        tracker
    }

    pub fn emit(&self, event: T) {
        let mut trackers = self.trackers.lock().unwrap();
        trackers.retain(|t| t.strong_count() > 0);
        for tracker in trackers.iter().filter_map(Weak::upgrade) {
            tracker.add(event.clone());
        }
    }

    pub fn tracker_count(&self) -> usize {
        self.trackers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.strong_count() > 0)
            .count()
    }
}

impl<T: Clone> Default for OutputListenerMt<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OutputTrackerMt<T: Clone> {
    output: Mutex<Vec<T>>,
}

impl<T: Clone> OutputTrackerMt<T> {
    fn new() -> Self {
        Self {
            output: Mutex::new(Vec::new()),
        }
    }

    fn add(&self, event: T) {
        self.output.lock().unwrap().push(event);
    }

    pub fn output(&self) -> Vec<T> {
        self.output.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.output.lock().unwrap().clear();
    }
}
