/// Per-frame dependency DAG and its parallel executor.
///
/// `add()` builds the graph: the setup closure runs synchronously at call
/// time and declares input edges; the execute closure runs on a worker once
/// every declared input completed. `execute()` consumes the graph, schedules
/// it over the worker pool, and returns when the whole frame ran (or the
/// frame failed).
///
/// Scheduling is dataflow-driven: every node carries an atomic count of
/// unfinished inputs; completing a node decrements its dependents and spawns
/// the ones that reach zero. Tasks without an edge between them have no
/// ordering guarantee.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use crate::engine_trace;
use crate::error::{Error, Result};
use super::task::{TaskBody, TaskBuilder, TaskData, TaskHandle, TaskNode};
use super::task_pool::TaskPool;

// ===== TASK GRAPH =====

/// A frame's task graph. Acyclic by construction: a task can only declare
/// inputs that already exist.
pub struct TaskGraph<'env> {
    nodes: Vec<TaskNode<'env>>,
}

impl<'env> TaskGraph<'env> {
    /// Create an empty graph for the current frame.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of tasks added so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a task.
    ///
    /// `setup` runs immediately on the calling thread; it may declare input
    /// edges through the builder and populate payload fields that the
    /// execute closure (and any dependent task holding this task's
    /// `TaskData`) will see. `execute` runs on a worker once all declared
    /// inputs completed, with exclusive access to the payload.
    pub fn add<P, S, E>(&mut self, payload: P, setup: S, execute: E) -> TaskHandle<P>
    where
        P: Send + Sync + 'env,
        S: FnOnce(&mut TaskBuilder, &mut P),
        E: FnOnce(&mut P) + Send + 'env,
    {
        let index = self.nodes.len();

        let mut payload = payload;
        let mut builder = TaskBuilder::new();
        setup(&mut builder, &mut payload);

        let data = TaskData::new(payload);
        let body_data = data.clone();
        let body: TaskBody<'env> = Box::new(move || {
            let mut payload = body_data.write();
            execute(&mut payload);
        });

        let mut pending = 0usize;
        for &input in &builder.inputs {
            // Handles can only name tasks added earlier to this graph.
            debug_assert!(input < index, "task input must precede the task");
            self.nodes[input].dependents.push(index);
            pending += 1;
        }

        self.nodes.push(TaskNode {
            body: Mutex::new(Some(body)),
            pending: AtomicUsize::new(pending),
            dependents: Vec::new(),
            label: builder.label,
        });

        TaskHandle::new(index, data)
    }

    /// Execute the graph on the worker pool, blocking until the frame ran.
    ///
    /// If any execute body faults, the frame is marked failed: dependents of
    /// the faulted task never start, tasks not yet started are dropped, and
    /// the caller receives a single aggregated `Error::FrameFailed`. There
    /// is no partial-result path.
    pub fn execute(self, pool: &TaskPool) -> Result<()> {
        if self.nodes.is_empty() {
            return Ok(());
        }

        let nodes = self.nodes;
        let failure = FrameFailure::new();

        {
            let nodes = &nodes;
            let failure = &failure;
            pool.install(move || {
                rayon::scope(|scope| {
                    for index in 0..nodes.len() {
                        if nodes[index].pending.load(Ordering::Acquire) == 0 {
                            scope.spawn(move |scope| run_task(nodes, index, scope, failure));
                        }
                    }
                });
            });
        }

        failure.into_result()
    }
}

impl<'env> Default for TaskGraph<'env> {
    fn default() -> Self {
        Self::new()
    }
}

// ===== EXECUTOR =====

/// Run one task, then schedule every dependent whose inputs all completed.
fn run_task<'env, 'scope>(
    nodes: &'scope [TaskNode<'env>],
    index: usize,
    scope: &rayon::Scope<'scope>,
    failure: &'scope FrameFailure,
) where
    'env: 'scope,
{
    let node = &nodes[index];

    // Fail-fast: once the frame failed, remaining work is dropped.
    if failure.is_failed() {
        return;
    }

    let body = {
        let mut slot = match node.body.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.take()
    };
    let Some(body) = body else {
        return;
    };

    let started = Instant::now();
    if let Some(label) = node.label.as_deref() {
        engine_trace!("nova3d::TaskGraph", "task '{}' started", label);
    }

    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(body)) {
        failure.record(node.label.as_deref(), payload);
        return;
    }

    if let Some(label) = node.label.as_deref() {
        engine_trace!(
            "nova3d::TaskGraph",
            "task '{}' finished in {:.3} ms",
            label,
            started.elapsed().as_secs_f64() * 1e3
        );
    }

    for &dependent in &node.dependents {
        if nodes[dependent].pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            scope.spawn(move |scope| run_task(nodes, dependent, scope, failure));
        }
    }
}

// ===== FRAME FAILURE =====

/// Aggregates execute-body faults for the whole frame.
struct FrameFailure {
    failed: AtomicBool,
    messages: Mutex<Vec<String>>,
}

impl FrameFailure {
    fn new() -> Self {
        Self {
            failed: AtomicBool::new(false),
            messages: Mutex::new(Vec::new()),
        }
    }

    fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    fn record(&self, label: Option<&str>, payload: Box<dyn Any + Send>) {
        self.failed.store(true, Ordering::Release);

        let reason = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "task body faulted".to_string()
        };

        let message = match label {
            Some(label) => format!("task '{}': {}", label, reason),
            None => reason,
        };

        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
    }

    fn into_result(self) -> Result<()> {
        if !self.failed.load(Ordering::Acquire) {
            return Ok(());
        }

        let messages = match self.messages.into_inner() {
            Ok(messages) => messages,
            Err(poisoned) => poisoned.into_inner(),
        };

        Err(Error::FrameFailed(messages.join("; ")))
    }
}

#[cfg(test)]
#[path = "task_graph_tests.rs"]
mod tests;
