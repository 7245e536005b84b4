//! Command processor - queues submitted commands, executes them on a
//! dedicated thread and collects their replies
//!
//! Callers submit command text from any thread. The worker thread runs
//! execution passes over the whole execution queue until stopped. Commands
//! report results by posting replies, which callers collect with
//! [`CommandProcessor::drain_replies`].

use std::cell::RefCell;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, ReentrantMutex, RwLock};
use tracing::{debug, error, info, info_span, warn};

use crate::command::{Command, CommandContext, CommandReply, ReplyStatus};
use crate::element::{ElementParser, XmlElementParser};
use crate::error::ProcessorError;
use crate::factory::CommandFactory;
use crate::queue::{self, ActiveCommand, ExecutionQueue, PendingCommand, ReplyQueue};
use crate::registry::CommandRegistry;
use crate::state_machine::{
    is_valid_transition, TransitionResult, WorkerEvent, WorkerLifecycle, WorkerState,
};
use crate::{commands, timing};

/// Configuration for a command processor
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// How long the worker waits for new commands after an empty pass
    pub idle_poll_interval: Duration,
    /// Upper bound between liveness checks while `stop()` waits
    pub stop_poll_interval: Duration,
    /// Name given to the worker thread
    pub thread_name: String,
    /// Span every processor event is recorded in
    pub span: tracing::Span,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            idle_poll_interval: Duration::from_millis(timing::IDLE_POLL_INTERVAL_MS),
            stop_poll_interval: Duration::from_millis(timing::STOP_POLL_INTERVAL_MS),
            thread_name: timing::WORKER_THREAD_NAME.into(),
            span: info_span!("command_processor"),
        }
    }
}

/// Queues guarded by the shared reentrant lock.
///
/// A command step runs while the pass holds the lock and may call back into
/// the processor on the same thread, so each queue sits in its own `RefCell`
/// and no borrow is held across a step.
#[derive(Default)]
struct Queues {
    active: RefCell<ExecutionQueue>,
    replies: RefCell<ReplyQueue>,
}

/// Requested/actual liveness of the worker thread
#[derive(Debug, Default)]
struct Liveness {
    requested: bool,
    running: bool,
    lifecycle: WorkerLifecycle,
}

impl Liveness {
    fn transition(&mut self, event: WorkerEvent) {
        let from = self.lifecycle.state();
        match self.lifecycle.process_event(event) {
            TransitionResult::Success(to) if from != to => {
                debug_assert!(is_valid_transition(from, to));
                debug!(%from, %to, "Worker state changed");
            }
            TransitionResult::Success(_) => {}
            TransitionResult::Invalid { from, event } => {
                warn!(%from, ?event, "Ignoring invalid worker transition");
            }
        }
    }
}

struct Inner {
    config: ProcessorConfig,
    registry: RwLock<CommandRegistry>,
    parser: Box<dyn ElementParser>,
    queues: ReentrantMutex<Queues>,
    liveness: Mutex<Liveness>,
    /// Wakes the worker on new work or stop, and `stop()` on worker exit
    signal: Condvar,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn handle(self: &Arc<Self>) -> ProcessorHandle {
        ProcessorHandle {
            inner: Arc::downgrade(self),
        }
    }

    fn register_command(&self, command: Arc<dyn Command>) -> Result<(), ProcessorError> {
        self.registry.write().register(command)
    }

    fn registered_command_names(&self) -> Vec<String> {
        self.registry.read().names()
    }

    fn command_descriptions(&self) -> Vec<(String, &'static str)> {
        self.registry.read().descriptions()
    }

    fn submit(self: &Arc<Self>, client_id: u32, text: &str) -> Result<(), ProcessorError> {
        if text.is_empty() {
            error!(client_id, "Command string is undefined");
            return Err(ProcessorError::EmptyInput);
        }

        let prepared = {
            let registry = self.registry.read();
            CommandFactory::new(&registry, self.parser.as_ref()).create(text)?
        };

        debug!(client_id, name = %prepared.name, "Command queued");
        let active = ActiveCommand::new(prepared, CommandContext::new(client_id, self.handle()));
        {
            let queues = self.queues.lock();
            queues.active.borrow_mut().push(active);
        }
        self.signal.notify_all();
        Ok(())
    }

    fn post_reply(&self, reply: CommandReply) {
        let queues = self.queues.lock();
        queues.replies.borrow_mut().post(reply);
    }

    fn drain_replies(&self) -> Vec<CommandReply> {
        let queues = self.queues.lock();
        let replies = queues.replies.borrow_mut().drain();
        replies
    }

    fn execute_pass(&self) -> usize {
        let queues = self.queues.lock();
        if queues.active.borrow().is_empty() {
            return 0;
        }

        let mut batch = queues.active.borrow_mut().take_batch();
        let executed = queue::run_batch(&mut batch);
        queues.active.borrow_mut().restore(batch);
        executed
    }

    fn pending_count(&self) -> usize {
        let queues = self.queues.lock();
        let count = queues.active.borrow().len();
        count
    }

    fn pending_commands(&self) -> Vec<PendingCommand> {
        let queues = self.queues.lock();
        let snapshot = queues.active.borrow().snapshot();
        snapshot
    }
}

/// Resets liveness when the worker thread leaves its body, including on panic
struct WorkerExitGuard<'a> {
    inner: &'a Inner,
}

impl Drop for WorkerExitGuard<'_> {
    fn drop(&mut self) {
        let mut live = self.inner.liveness.lock();
        live.requested = false;
        live.running = false;
        live.transition(WorkerEvent::ThreadExited);
        drop(live);
        self.inner.signal.notify_all();

        if thread::panicking() {
            error!("Command execution thread panicked");
        } else {
            info!("Command execution thread exited");
        }
    }
}

/// Record that the worker thread is up and arm its exit guard
fn enter_running(inner: &Inner) -> WorkerExitGuard<'_> {
    let mut live = inner.liveness.lock();
    live.running = true;
    live.transition(WorkerEvent::ThreadStarted);
    WorkerExitGuard { inner }
}

fn worker_loop(inner: Arc<Inner>) {
    let span = inner.config.span.clone();
    let _enter = span.enter();

    let _guard = enter_running(&inner);
    info!("Command execution thread started");

    // Execute commands until a stop is requested
    while inner.liveness.lock().requested {
        if inner.execute_pass() > 0 {
            continue;
        }

        // Submitted since the pass looked; run it without waiting
        if inner.pending_count() > 0 {
            continue;
        }

        // Nothing queued, wait for a submission or a stop request
        let mut live = inner.liveness.lock();
        if live.requested {
            inner
                .signal
                .wait_for(&mut live, inner.config.idle_poll_interval);
        }
    }
}

/// Accepts command text, executes commands on a background thread and
/// queues their replies
pub struct CommandProcessor {
    inner: Arc<Inner>,
}

impl CommandProcessor {
    /// Create a processor with an empty registry and the XML parser
    pub fn new(config: ProcessorConfig) -> Self {
        Self::with_parser(config, Box::new(XmlElementParser))
    }

    /// Create a processor with an empty registry and a custom parser
    pub fn with_parser(config: ProcessorConfig, parser: Box<dyn ElementParser>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                registry: RwLock::new(CommandRegistry::new()),
                parser,
                queues: ReentrantMutex::new(Queues::default()),
                liveness: Mutex::new(Liveness::default()),
                signal: Condvar::new(),
                worker: Mutex::new(None),
            }),
        }
    }

    /// Create a processor with the built-in commands registered
    pub fn with_default_commands(config: ProcessorConfig) -> Result<Self, ProcessorError> {
        let processor = Self::new(config);
        for command in commands::default_commands() {
            processor.register_command(command)?;
        }
        Ok(processor)
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.inner.config
    }

    /// Non-owning handle for use from command steps and other components
    pub fn handle(&self) -> ProcessorHandle {
        self.inner.handle()
    }

    /// Register a prototype under all of its names
    pub fn register_command(&self, command: Arc<dyn Command>) -> Result<(), ProcessorError> {
        let _enter = self.inner.config.span.enter();
        self.inner.register_command(command)
    }

    /// Names of all registered commands, sorted
    pub fn registered_command_names(&self) -> Vec<String> {
        self.inner.registered_command_names()
    }

    /// Spawn the command execution thread.
    ///
    /// Returns without waiting for the thread to begin. Does nothing if a
    /// worker thread is already assigned.
    pub fn start(&self) -> Result<(), ProcessorError> {
        let _enter = self.inner.config.span.enter();
        let mut worker = self.inner.worker.lock();

        match worker.as_ref().map(JoinHandle::is_finished) {
            Some(false) => {
                debug!("Command execution thread already running");
                return Ok(());
            }
            Some(true) => {
                // Worker died without a stop request; reap it
                if let Some(handle) = worker.take() {
                    if handle.join().is_err() {
                        warn!("Previous command execution thread panicked");
                    }
                }
            }
            None => {}
        }

        {
            let mut live = self.inner.liveness.lock();
            live.requested = true;
            live.transition(WorkerEvent::StartRequested);
        }

        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(self.inner.config.thread_name.clone())
            .spawn(move || worker_loop(inner));

        match spawned {
            Ok(handle) => {
                *worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                error!("Failed to spawn command execution thread: {}", e);
                let mut live = self.inner.liveness.lock();
                live.requested = false;
                live.transition(WorkerEvent::ThreadExited);
                Err(ProcessorError::Spawn(e))
            }
        }
    }

    /// Stop the command execution thread and wait until it has exited.
    ///
    /// Commands still in the queue stay there. Does nothing if the thread was
    /// never started.
    pub fn stop(&self) {
        let _enter = self.inner.config.span.enter();

        let mut worker = self.inner.worker.lock();
        let Some(handle) = worker.take() else {
            return;
        };

        {
            let mut live = self.inner.liveness.lock();
            if live.requested {
                live.requested = false;
                live.transition(WorkerEvent::StopRequested);
            }
            self.inner.signal.notify_all();

            while live.running {
                self.inner
                    .signal
                    .wait_for(&mut live, self.inner.config.stop_poll_interval);
            }
        }

        if handle.join().is_err() {
            warn!("Command execution thread panicked before stopping");
        }
        info!("Command execution thread stopped");
    }

    /// Whether the worker thread is actually running its loop
    pub fn is_running(&self) -> bool {
        self.inner.liveness.lock().running
    }

    /// Current lifecycle state of the worker thread
    pub fn state(&self) -> WorkerState {
        self.inner.liveness.lock().lifecycle.state()
    }

    /// Parse `text` into a command and append it to the execution queue
    pub fn submit(&self, client_id: u32, text: &str) -> Result<(), ProcessorError> {
        let _enter = self.inner.config.span.enter();
        self.inner.submit(client_id, text)
    }

    /// Step every queued command once and retire the completed ones.
    ///
    /// Returns the number of commands stepped. The worker thread calls this
    /// in a loop; it is public so a host can drive the queue by hand.
    pub fn execute_pass(&self) -> usize {
        let _enter = self.inner.config.span.enter();
        self.inner.execute_pass()
    }

    /// Append a reply for a client
    pub fn post_reply(&self, client_id: u32, status: ReplyStatus, payload: impl Into<String>) {
        let _enter = self.inner.config.span.enter();
        self.inner
            .post_reply(CommandReply::new(client_id, status, payload));
    }

    /// Take every queued reply in post order
    pub fn drain_replies(&self) -> Vec<CommandReply> {
        let _enter = self.inner.config.span.enter();
        self.inner.drain_replies()
    }

    /// Number of commands in the execution queue
    pub fn pending_count(&self) -> usize {
        self.inner.pending_count()
    }

    /// Snapshot of the commands in the execution queue
    pub fn pending_commands(&self) -> Vec<PendingCommand> {
        self.inner.pending_commands()
    }
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new(ProcessorConfig::default())
    }
}

impl Drop for CommandProcessor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Non-owning reference to a processor
///
/// Commands receive one through their [`CommandContext`]. Every operation
/// fails softly once the processor has been dropped.
#[derive(Debug, Clone)]
pub struct ProcessorHandle {
    inner: Weak<Inner>,
}

impl ProcessorHandle {
    /// A handle that is not attached to any processor
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    /// Whether the processor still exists
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Append a reply. Returns false if the processor is gone.
    pub fn post_reply(&self, client_id: u32, status: ReplyStatus, payload: impl Into<String>) -> bool {
        match self.inner.upgrade() {
            Some(inner) => {
                inner.post_reply(CommandReply::new(client_id, status, payload));
                true
            }
            None => false,
        }
    }

    /// Submit another command on behalf of a client
    pub fn submit(&self, client_id: u32, text: &str) -> Result<(), ProcessorError> {
        let inner = self.inner.upgrade().ok_or(ProcessorError::Closed)?;
        inner.submit(client_id, text)
    }

    /// Registered names with their descriptions, sorted by name
    pub fn command_descriptions(&self) -> Option<Vec<(String, &'static str)>> {
        self.inner.upgrade().map(|i| i.command_descriptions())
    }

    /// Names of all registered commands, sorted
    pub fn registered_command_names(&self) -> Option<Vec<String>> {
        self.inner.upgrade().map(|i| i.registered_command_names())
    }

    /// Number of commands in the execution queue
    pub fn pending_count(&self) -> Option<usize> {
        self.inner.upgrade().map(|i| i.pending_count())
    }
}

impl std::fmt::Debug for CommandProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandProcessor")
            .field("state", &self.state())
            .field("pending", &self.pending_count())
            .finish()
    }
}
