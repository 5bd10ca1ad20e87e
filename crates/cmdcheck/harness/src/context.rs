//! Per-run state: id allocation, environment construction, cancellation

use crate::environment::{InMemoryToolEnvironment, ToolEnvironment};
use chrono::{DateTime, Utc};
use cmdcheck_types::TestId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Cooperative cancellation flag shared between the pool and running tasks
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Sequential test id counter. Only reachable through `&mut RunContext`.
#[derive(Debug, Default)]
pub struct TestIdAllocator {
    last: u64,
}

impl TestIdAllocator {
    pub fn next_id(&mut self) -> TestId {
        self.last += 1;
        TestId(self.last)
    }

    /// Number of ids handed out so far
    pub fn allocated(&self) -> u64 {
        self.last
    }
}

/// Builds a fresh tool environment for a worker
pub type EnvironmentFactory = Arc<dyn Fn() -> Box<dyn ToolEnvironment> + Send + Sync>;

/// Container for state that is otherwise global to a run
pub struct RunContext {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    ids: TestIdAllocator,
    environment_factory: EnvironmentFactory,
    cancellation: CancellationToken,
}

impl RunContext {
    /// Context backed by [`InMemoryToolEnvironment`]
    pub fn new() -> Self {
        Self::with_environment_factory(Arc::new(|| {
            Box::new(InMemoryToolEnvironment::new()) as Box<dyn ToolEnvironment>
        }))
    }

    pub fn with_environment_factory(environment_factory: EnvironmentFactory) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            ids: TestIdAllocator::default(),
            environment_factory,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Allocate the next test id
    pub fn next_test_id(&mut self) -> TestId {
        self.ids.next_id()
    }

    pub fn allocated_ids(&self) -> u64 {
        self.ids.allocated()
    }

    /// Build a new, independent tool environment
    pub fn new_environment(&self) -> Box<dyn ToolEnvironment> {
        (self.environment_factory)()
    }

    /// Run-wide cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
