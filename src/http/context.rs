// crates.io
use tokio::{runtime::Handle, sync::mpsc};
// self
use crate::_prelude::*;

/// Deferred completion work.
pub type CompletionTask = Box<dyn FnOnce() + Send>;

/// Execution context a completion callback must run on.
pub trait CompletionContext
where
	Self: Send + Sync,
{
	/// Schedules `task` on this context.
	fn dispatch(&self, task: CompletionTask);
}
impl CompletionContext for Handle {
	fn dispatch(&self, task: CompletionTask) {
		self.spawn(async move { task() });
	}
}

/// Context of the calling Tokio runtime, if there is one.
pub fn current_context() -> Option<Arc<dyn CompletionContext>> {
	Handle::try_current().ok().map(|handle| Arc::new(handle) as Arc<dyn CompletionContext>)
}

/// Creates a queue whose tasks run only when the paired [`ContextRunner`] drains them.
///
/// Use it for context-affine consumers (a UI loop, a single-threaded actor): hand the
/// [`ContextQueue`] to [`crate::http::RequestHandle::deliver_on`] and drive the runner from the
/// owning thread.
pub fn context_queue() -> (ContextQueue, ContextRunner) {
	let (sender, receiver) = mpsc::unbounded_channel();

	(ContextQueue(sender), ContextRunner(receiver))
}

/// Sending side of [`context_queue`].
#[derive(Clone, Debug)]
pub struct ContextQueue(mpsc::UnboundedSender<CompletionTask>);
impl CompletionContext for ContextQueue {
	fn dispatch(&self, task: CompletionTask) {
		if self.0.send(task).is_err() {
			crate::obs::debug_event!("completion dropped because its context runner is gone");
		}
	}
}

/// Receiving side of [`context_queue`]; runs tasks on the thread that drives it.
#[derive(Debug)]
pub struct ContextRunner(mpsc::UnboundedReceiver<CompletionTask>);
impl ContextRunner {
	/// Runs every queued task without waiting; returns how many ran.
	pub fn run_pending(&mut self) -> usize {
		let mut ran = 0;

		while let Ok(task) = self.0.try_recv() {
			task();

			ran += 1;
		}

		ran
	}

	/// Waits for the next task and runs it; `false` once every queue handle is gone.
	pub async fn run_next(&mut self) -> bool {
		match self.0.recv().await {
			Some(task) => {
				task();

				true
			},
			None => false,
		}
	}
}
