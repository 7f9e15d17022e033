/// Nova3D Engine - Singleton manager for engine subsystems
///
/// This module provides global singleton management for the worker task pool
/// and the logging backend. It uses thread-safe static storage with RwLock
/// for safe concurrent access.
///
/// Structural scene mutation never goes through the Engine: registries are
/// owned values, mutated on the main/update thread and read by worker tasks.

use std::sync::{OnceLock, RwLock, Arc};
use std::time::SystemTime;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::task_graph::TaskPool;

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding all engine singletons
struct EngineState {
    /// Worker pool singleton used to execute per-frame task graphs
    task_pool: RwLock<Option<Arc<TaskPool>>>,
}

impl EngineState {
    /// Create a new empty engine state
    fn new() -> Self {
        Self {
            task_pool: RwLock::new(None),
        }
    }
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// Manages the lifecycle of engine subsystems (task pool, logger)
/// using a singleton pattern with thread-safe access.
///
/// # Example
///
/// ```no_run
/// use nova_scene_engine::nova3d::Engine;
///
/// // Initialize engine
/// Engine::initialize()?;
///
/// // Create the worker pool singleton (4 workers)
/// Engine::create_task_pool(4)?;
///
/// // Access the pool globally
/// let pool = Engine::task_pool()?;
///
/// // Cleanup
/// Engine::shutdown();
/// # Ok::<(), nova_scene_engine::nova3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Helper to log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("nova3d::Engine", "Initialization failed: {}", msg);
            }
            _ => {
                crate::engine_error!("nova3d::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    /// Initialize the engine
    ///
    /// This must be called once at application startup before creating any subsystems.
    ///
    /// # Errors
    ///
    /// Currently always succeeds, but returns Result for future extensibility.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Shutdown the entire engine and destroy all singletons
    ///
    /// This should be called at application shutdown. After calling this,
    /// you must call `initialize()` again before creating new subsystems.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut pool) = state.task_pool.write() {
                *pool = None;
            }
        }
    }

    // ===== TASK POOL API =====

    /// Create and register the worker pool singleton
    ///
    /// # Arguments
    ///
    /// * `worker_count` - Number of worker threads (0 = one per logical core)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - A task pool already exists
    /// - The underlying thread pool fails to build
    pub fn create_task_pool(worker_count: usize) -> Result<()> {
        let state = ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))?;

        let pool = Arc::new(TaskPool::new(worker_count)?);

        let mut lock = state.task_pool.write()
            .map_err(|_| Self::log_and_return_error(
                Error::InitializationFailed("TaskPool lock poisoned".to_string())
            ))?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(
                Error::InitializationFailed("TaskPool already exists. Call Engine::destroy_task_pool() first.".to_string())
            ));
        }

        *lock = Some(Arc::clone(&pool));

        crate::engine_info!("nova3d::Engine",
            "TaskPool singleton created with {} workers", pool.worker_count());

        Ok(())
    }

    /// Get the worker pool singleton
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - The task pool has not been created
    pub fn task_pool() -> Result<Arc<TaskPool>> {
        let state = ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))?;

        let lock = state.task_pool.read()
            .map_err(|_| Self::log_and_return_error(
                Error::InitializationFailed("TaskPool lock poisoned".to_string())
            ))?;

        lock.clone()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("TaskPool not created. Call Engine::create_task_pool() first.".to_string())
            ))
    }

    /// Destroy the worker pool singleton
    ///
    /// Removes the singleton, allowing a new one to be created.
    /// Existing references remain valid until dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized
    pub fn destroy_task_pool() -> Result<()> {
        let state = ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Engine not initialized".to_string())
            ))?;

        let mut lock = state.task_pool.write()
            .map_err(|_| Self::log_and_return_error(
                Error::InitializationFailed("TaskPool lock poisoned".to_string())
            ))?;

        *lock = None;

        crate::engine_info!("nova3d::Engine", "TaskPool singleton destroyed");

        Ok(())
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut pool) = state.task_pool.write() {
                *pool = None;
            }
        }
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replace the default logger with a custom implementation
    /// (file logger, profiler forwarding, etc.)
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by the engine_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
