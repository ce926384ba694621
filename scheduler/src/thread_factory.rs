use metronome_output_tracker::{OutputListenerMt, OutputTrackerMt};
use std::{
    any::Any,
    io,
    sync::{Arc, Mutex},
    thread,
};

type ThreadBody = Box<dyn FnOnce() + Send>;

/// Spawns the clock thread.
///
/// A nulled factory does not start a thread. It hands the thread body to the
/// spawn tracker instead, so a test can run the clock loop on its own thread.
#[derive(Default)]
pub struct ThreadFactory {
    spawn_listener: OutputListenerMt<SpawnEvent>,
    is_nulled: bool,
}

impl ThreadFactory {
    pub fn new_null() -> Self {
        Self {
            spawn_listener: OutputListenerMt::new(),
            is_nulled: true,
        }
    }

    pub fn track_spawns(&self) -> Arc<OutputTrackerMt<SpawnEvent>> {
        self.spawn_listener.track()
    }

    pub fn spawn<F>(&self, name: impl Into<String>, f: F) -> io::Result<JoinHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();

        if self.is_nulled {
            let body: ThreadBody = Box::new(f);
            self.spawn_listener.emit(SpawnEvent {
                thread_name: name,
                body: Arc::new(Mutex::new(Some(body))),
            });
            return Ok(JoinHandle::new_null());
        }

        let handle = thread::Builder::new().name(name.clone()).spawn(f)?;
        self.spawn_listener.emit(SpawnEvent {
            thread_name: name,
            body: Arc::new(Mutex::new(None)),
        });

        Ok(JoinHandle {
            strategy: JoinHandleStrategy::Real(handle),
        })
    }
}

pub struct JoinHandle {
    strategy: JoinHandleStrategy,
}

impl JoinHandle {
    pub fn new_null() -> Self {
        Self {
            strategy: JoinHandleStrategy::Nulled,
        }
    }

    pub fn join(self) -> Result<(), Box<dyn Any + Send + 'static>> {
        match self.strategy {
            JoinHandleStrategy::Real(handle) => handle.join(),
            JoinHandleStrategy::Nulled => Ok(()),
        }
    }
}

enum JoinHandleStrategy {
    Real(thread::JoinHandle<()>),
    Nulled,
}

#[derive(Clone)]
pub struct SpawnEvent {
    pub thread_name: String,
    body: Arc<Mutex<Option<ThreadBody>>>,
}

impl SpawnEvent {
    /// Runs the body of a thread that was spawned by a nulled factory
    pub fn run(&self) {
        let Some(body) = self.body.lock().unwrap().take() else {
            panic!("No thread body to run");
        };
        body();
    }
}
