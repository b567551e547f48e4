/// A unit of work for the [`ConcurrencySubsystem`](crate::concurrency::ConcurrencySubsystem).
///
/// A task is consumed by [`run`](Task::run): once queued it always runs to completion exactly
/// once. Higher priorities are started first.
pub trait Task: Send + 'static {
    fn priority(&self) -> u64 {
        0
    }

    fn run(self: Box<Self>);
}

/// Adapts a closure into a [`Task`].
pub struct FnTask<F> {
    priority: u64,
    f: F,
}

impl<F> FnTask<F>
where
    F: FnOnce() + Send + 'static,
{
    pub fn new(priority: u64, f: F) -> Self {
        Self { priority, f }
    }
}

impl<F> Task for FnTask<F>
where
    F: FnOnce() + Send + 'static,
{
    fn priority(&self) -> u64 {
        self.priority
    }

    fn run(self: Box<Self>) {
        (self.f)()
    }
}
