/// Task payload and handle types.
///
/// A task's payload lives behind a shared read/write slot. The setup closure
/// and the execute closure are the only writers; every other task (and the
/// caller, after the frame ran) only ever gets read access. Sibling tasks
/// therefore cannot share mutable state through the graph.

use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::atomic::AtomicUsize;

// ===== TASK DATA =====

/// Shared read handle to a task's payload.
///
/// Cloning is cheap (Arc). Dependent tasks capture a clone in their execute
/// closure and call `read()` once their input has completed; the scheduler
/// guarantees the producer finished writing before any dependent starts.
pub struct TaskData<P> {
    slot: Arc<RwLock<P>>,
}

impl<P> TaskData<P> {
    pub(crate) fn new(payload: P) -> Self {
        Self {
            slot: Arc::new(RwLock::new(payload)),
        }
    }

    /// Read the payload.
    ///
    /// Valid at any time, but only meaningful once the owning task completed
    /// (dependents) or the whole graph ran (caller).
    pub fn read(&self) -> RwLockReadGuard<'_, P> {
        match self.slot.read() {
            Ok(guard) => guard,
            // A faulted frame may leave the slot poisoned; the payload
            // itself is still readable for diagnostics.
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Write access, used only by the task runner for the execute closure.
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, P> {
        match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<P> Clone for TaskData<P> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

// ===== TASK HANDLE =====

/// Handle to a task added to a TaskGraph.
///
/// Used to declare dependency edges (`TaskBuilder::add_input`) and to read
/// the task's payload after it completed. Handles are frame-scoped: they die
/// with the graph they came from.
pub struct TaskHandle<P> {
    pub(crate) index: usize,
    data: TaskData<P>,
}

impl<P> TaskHandle<P> {
    pub(crate) fn new(index: usize, data: TaskData<P>) -> Self {
        Self { index, data }
    }

    /// Get a shared read handle to this task's payload.
    pub fn data(&self) -> TaskData<P> {
        self.data.clone()
    }

    /// Read this task's payload (see `TaskData::read`).
    pub fn read(&self) -> RwLockReadGuard<'_, P> {
        self.data.read()
    }
}

impl<P> Clone for TaskHandle<P> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            data: self.data.clone(),
        }
    }
}

// ===== TASK BUILDER =====

/// Passed to a task's setup closure to declare inputs and a debug label.
///
/// Inputs must be handles of tasks already added to the same graph, which
/// makes the graph acyclic by construction.
pub struct TaskBuilder {
    pub(crate) inputs: Vec<usize>,
    pub(crate) label: Option<String>,
}

impl TaskBuilder {
    pub(crate) fn new() -> Self {
        Self {
            inputs: Vec::new(),
            label: None,
        }
    }

    /// Declare an existing task as an input of the task being added.
    ///
    /// The new task's execute closure will not start until the input's
    /// execute closure has returned.
    pub fn add_input<P>(&mut self, input: &TaskHandle<P>) {
        self.inputs.push(input.index);
    }

    /// Attach an optional debug label, surfaced to the logging/profiling
    /// layer when the task runs.
    pub fn set_debug_label(&mut self, label: &str) {
        self.label = Some(label.to_string());
    }
}

// ===== TASK NODE =====

/// Type-erased execute closure, bound to its payload slot at add time.
pub(crate) type TaskBody<'env> = Box<dyn FnOnce() + Send + 'env>;

/// Internal per-task scheduling state.
pub(crate) struct TaskNode<'env> {
    /// Execute closure; taken exactly once when the task is run
    pub(crate) body: Mutex<Option<TaskBody<'env>>>,
    /// Number of declared inputs that have not completed yet
    pub(crate) pending: AtomicUsize,
    /// Indices of tasks that declared this task as an input
    pub(crate) dependents: Vec<usize>,
    /// Optional debug label for tracing
    pub(crate) label: Option<String>,
}
