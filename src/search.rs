use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::info;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::atom::{AtomLibrary, Value};
use crate::enumerate::{Enumerator, PruneRules};
use crate::error::Result;
use crate::node::{FuncNode, NodeJson};
use crate::pool::RankedPool;
use crate::status::{BestEntry, Status};
use crate::suitability::Suitability;
use crate::target::Target;

/// Configuration of a search task.
///
/// `http_*` describe the status endpoint an external front end may expose;
/// the core carries them but never opens a socket itself.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Maximum depth of enumerated trees.
    pub max_depth: usize,
    /// Bound on the ranked pool of best candidates.
    pub max_best: usize,
    /// Where the front end persists the search state, if anywhere.
    pub save_path: Option<PathBuf>,
    pub http_enabled: bool,
    pub http_host: String,
    pub http_port: u16,
    /// Which equivalence classes the enumerator collapses.
    pub prune: PruneRules,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            max_depth: 3,
            max_best: 32,
            save_path: None,
            http_enabled: false,
            http_host: "localhost".to_string(),
            http_port: 8080,
            prune: PruneRules::ALL,
        }
    }
}

/// HTTP endpoint details are deployment configuration, not search identity.
impl PartialEq for Settings {
    fn eq(&self, other: &Self) -> bool {
        self.max_depth == other.max_depth
            && self.max_best == other.max_best
            && self.save_path == other.save_path
    }
}

/// Mutable search state; always behind the driver mutex.
#[derive(Debug)]
struct SearchState<T> {
    cursor: Enumerator<T>,
    count: u64,
    best: RankedPool<T>,
    started: Option<Instant>,
}

struct Shared<T> {
    state: Mutex<SearchState<T>>,
    done: AtomicBool,
    stop: AtomicBool,
}

/// Drives the exhaustive search: steps the enumerator, offers every candidate
/// to the ranked pool, and publishes progress.
///
/// One background worker at most. The driver moves `Idle -> Running` on
/// [`run`](SearchTask::run), `Running -> Cancelled` on
/// [`stop`](SearchTask::stop), and `Running -> Completed` when the
/// enumeration exhausts; [`from_json`](SearchTask::from_json) restores a
/// saved task back to `Idle` (a completed task stays completed: running it
/// again exits immediately).
pub struct SearchTask<T: Value> {
    settings: Settings,
    atoms: Arc<AtomLibrary<T>>,
    target: Arc<dyn Target<T>>,
    shared: Arc<Shared<T>>,
    worker: Option<JoinHandle<()>>,
}

impl<T: Value> SearchTask<T> {
    /// The atoms and the target are shared with the worker and must describe
    /// vectors of the same width.
    pub fn new(settings: Settings, atoms: Arc<AtomLibrary<T>>, target: Arc<dyn Target<T>>) -> Self {
        assert!(atoms.nullary_len() > 0, "the arity-0 bucket must not be empty");
        debug_assert_eq!(atoms.width(), target.values().len());
        let cursor = Enumerator::new(settings.prune);
        SearchTask {
            settings,
            atoms,
            target,
            shared: Arc::new(Shared {
                state: Mutex::new(SearchState {
                    cursor,
                    count: 0,
                    best: RankedPool::new(),
                    started: None,
                }),
                done: AtomicBool::new(false),
                stop: AtomicBool::new(false),
            }),
            worker: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Advance one candidate and offer it to the pool. Returns `false` when
    /// the enumeration is exhausted. Safe to call concurrently with a
    /// running worker, though normally used instead of one.
    pub fn step(&self) -> bool {
        let mut state = self.lock_state();
        Self::step_locked(
            &mut state,
            &self.atoms,
            self.target.as_ref(),
            self.settings.max_depth,
            self.settings.max_best,
        )
    }

    fn step_locked(
        state: &mut SearchState<T>,
        atoms: &AtomLibrary<T>,
        target: &dyn Target<T>,
        max_depth: usize,
        max_best: usize,
    ) -> bool {
        if state.started.is_none() {
            state.started = Some(Instant::now());
        }
        if !state.cursor.advance(atoms, max_depth) {
            return false;
        }
        state.best.try_admit(state.cursor.cursor_mut(), max_best, atoms, target);
        state.count += 1;
        true
    }

    /// Spawn the background worker. A no-op if one is already running; a
    /// worker over a completed enumeration exits immediately.
    pub fn run(&mut self) {
        if self.worker.is_some() {
            return;
        }
        self.shared.stop.store(false, Ordering::SeqCst);
        self.lock_state().started = Some(Instant::now());

        let shared = Arc::clone(&self.shared);
        let atoms = Arc::clone(&self.atoms);
        let target = Arc::clone(&self.target);
        let max_depth = self.settings.max_depth;
        let max_best = self.settings.max_best;

        let handle = std::thread::Builder::new()
            .name("symsynth-search".to_string())
            .spawn(move || {
                info!("search worker started");
                while !shared.stop.load(Ordering::SeqCst) && !shared.done.load(Ordering::SeqCst) {
                    let mut state = shared.state.lock().expect("search state mutex poisoned");
                    if !Self::step_locked(&mut state, &atoms, target.as_ref(), max_depth, max_best) {
                        shared.done.store(true, Ordering::SeqCst);
                        info!("search worker finished: enumeration exhausted");
                    }
                }
                info!("search worker exiting");
            })
            .expect("failed to spawn search worker");
        self.worker = Some(handle);
    }

    /// Request cooperative cancellation and join the worker. The cursor and
    /// pool stay valid for inspection and re-serialization.
    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            handle.join().expect("search worker panicked");
        }
    }

    /// Whether the enumeration has run to completion.
    pub fn done(&self) -> bool {
        self.shared.done.load(Ordering::SeqCst)
    }

    /// Snapshot copy of the pool, best first.
    pub fn best(&self) -> Vec<FuncNode<T>> {
        self.lock_state().best.entries().to_vec()
    }

    /// Consistent progress snapshot, computed under the mutex.
    pub fn status(&self) -> Status {
        let mut state = self.lock_state();
        let state = &mut *state;

        let serial_number = state.cursor.cursor().serial_number(&self.atoms);
        let max_serial_number = self.atoms.tree_count(self.settings.max_depth);
        let done_fraction = match (serial_number.to_f64(), max_serial_number.to_f64()) {
            (Some(sn), Some(max)) if max > 0.0 => (sn / max).clamp(0.0, 1.0),
            _ => 0.0,
        };

        let elapsed = state.started.map(|t| t.elapsed()).unwrap_or_default();
        let millis = (elapsed.as_millis() as u64).max(1);
        let iterations_per_second = state.count.saturating_mul(1000) / millis;
        let serials_per_second = &serial_number * 1000u32 / millis;
        let remaining_estimate = if serials_per_second.is_zero() {
            None
        } else {
            let remaining = (&max_serial_number - &serial_number) / &serials_per_second;
            remaining.to_u64().map(Duration::from_secs)
        };

        let current_repr = state.cursor.cursor().repr(&self.atoms);
        let best_entries = state
            .best
            .entries_mut()
            .iter_mut()
            .map(|entry| {
                let suitability = Suitability::of(entry, &self.atoms, self.target.as_ref());
                let positions = self.target.match_positions(entry.evaluate(&self.atoms, false));
                BestEntry {
                    suitability,
                    repr: entry.repr(&self.atoms),
                    match_positions: positions.to_string(),
                }
            })
            .collect();

        Status {
            serial_number,
            max_serial_number,
            done_fraction,
            elapsed,
            remaining_estimate,
            iterations_per_second,
            serials_per_second,
            iteration_count: state.count,
            current_repr,
            best_entries,
        }
    }

    /// Serialize the resumable state (settings, counters, cursor, pool) to a
    /// JSON string. File handling belongs to the caller.
    pub fn to_json(&self) -> Result<String> {
        let state = self.lock_state();
        let snapshot = StateJson {
            settings: SettingsJson {
                max_best: self.settings.max_best as u64,
                max_depth: self.settings.max_depth as u64,
            },
            count: state.count,
            done: self.shared.done.load(Ordering::SeqCst),
            suit_threshold: state.best.threshold(),
            current_fn: state.cursor.cursor().to_json(&self.atoms),
            best: state
                .best
                .entries()
                .iter()
                .map(|e| e.to_json(&self.atoms))
                .collect(),
        };
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// Restore a task serialized by [`to_json`](Self::to_json). The input is
    /// parsed and validated completely before anything is committed, so a
    /// failed load leaves the task unchanged. The task returns to `Idle`;
    /// the loaded `done` flag is preserved.
    ///
    /// The worker must not be running (stop it first).
    pub fn from_json(&mut self, text: &str) -> Result<()> {
        assert!(self.worker.is_none(), "cannot load state into a running search");

        let snapshot: StateJson = serde_json::from_str(text)?;
        let cursor = FuncNode::from_json(&self.atoms, &snapshot.current_fn)?;
        let mut best = Vec::with_capacity(snapshot.best.len());
        for node in &snapshot.best {
            best.push(FuncNode::from_json(&self.atoms, node)?);
        }

        self.settings.max_best = snapshot.settings.max_best as usize;
        self.settings.max_depth = snapshot.settings.max_depth as usize;
        {
            let mut state = self.lock_state();
            state.cursor = Enumerator::with_cursor(cursor, self.settings.prune);
            state.count = snapshot.count;
            state.best = RankedPool::from_parts(best, snapshot.suit_threshold);
            state.started = None;
        }
        self.shared.done.store(snapshot.done, Ordering::SeqCst);
        Ok(())
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SearchState<T>> {
        self.shared.state.lock().expect("search state mutex poisoned")
    }
}

impl<T: Value> Drop for SearchTask<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Field-wise logical equality: settings, shared collaborators, progress,
/// cursor, and pool. Worker handles and timestamps do not participate.
impl<T: Value> PartialEq for SearchTask<T> {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.settings != other.settings
            || !Arc::ptr_eq(&self.atoms, &other.atoms)
            || !Arc::ptr_eq(&self.target, &other.target)
            || self.done() != other.done()
        {
            return false;
        }
        let a = self.lock_state();
        let b = other.lock_state();
        a.count == b.count && a.cursor == b.cursor && a.best == b.best
    }
}

/// Wire form of the resumable search state.
#[derive(Debug, Serialize, Deserialize)]
struct StateJson {
    settings: SettingsJson,
    count: u64,
    done: bool,
    suit_threshold: Suitability,
    current_fn: NodeJson,
    best: Vec<NodeJson>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsJson {
    max_best: u64,
    max_depth: u64,
}
