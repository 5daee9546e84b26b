use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use patrol::{Inspection, WatchPoint};

/// One recorded call of the inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionCall {
    pub name: String,
    pub path: PathBuf,
    pub dry_run: bool,
}

/// A fake inspection that:
/// - records every call, in order
/// - optionally sleeps, fails or panics for chosen watch points
/// - notices if one watch point is ever inspected twice at the same time
#[derive(Debug, Clone, Default)]
pub struct RecordingInspection {
    calls: Arc<Mutex<Vec<InspectionCall>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    panicking: Arc<Mutex<HashSet<String>>>,
    in_flight: Arc<Mutex<HashMap<String, usize>>>,
    overlapped: Arc<AtomicBool>,
    delay: Option<Duration>,
}

impl RecordingInspection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call blocks for `delay` before returning.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Calls for the watch point named `name` return an error.
    pub fn fail_for(self, name: &str) -> Self {
        self.failing.lock().unwrap().insert(name.to_string());
        self
    }

    /// Calls for the watch point named `name` panic.
    pub fn panic_for(self, name: &str) -> Self {
        self.panicking.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<InspectionCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.name == name).count()
    }

    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// True if any watch point was inspected concurrently with itself.
    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

impl Inspection for RecordingInspection {
    fn inspect(&self, watch_point: &WatchPoint, dry_run: bool) -> anyhow::Result<()> {
        let name = watch_point.name().to_string();

        {
            let mut in_flight = self.in_flight.lock().unwrap();
            let n = in_flight.entry(name.clone()).or_insert(0);
            *n += 1;
            if *n > 1 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
        }

        self.calls.lock().unwrap().push(InspectionCall {
            name: name.clone(),
            path: watch_point.path().to_path_buf(),
            dry_run,
        });

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        {
            let mut in_flight = self.in_flight.lock().unwrap();
            if let Some(n) = in_flight.get_mut(&name) {
                *n -= 1;
            }
        }

        if self.panicking.lock().unwrap().contains(&name) {
            panic!("inspection of {name} panicked on purpose");
        }
        if self.failing.lock().unwrap().contains(&name) {
            anyhow::bail!("inspection of {name} failed on purpose");
        }
        Ok(())
    }
}
