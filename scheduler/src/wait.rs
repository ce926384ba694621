use std::time::Duration;

/// Blocks the calling thread for `duration`.
/// The scheduler itself never calls this; it is a helper for callers and tests.
pub fn wait_for_duration(duration: Duration) {
    std::thread::sleep(duration);
}
