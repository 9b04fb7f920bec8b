// std
use std::{
	sync::atomic::{AtomicBool, Ordering},
	task::{Context, Poll},
};
// crates.io
use tokio::{runtime::Handle, sync::oneshot};
use tokio_util::sync::CancellationToken;
// self
use crate::{_prelude::*, http::CompletionContext, obs::debug_event};

/// Cancellable handle to an operation running on a background task.
///
/// Awaiting the handle yields the operation's outcome exactly once. Cancelling before the
/// operation has produced its outcome drops the running operation and makes the outcome
/// [`Error::Cancelled`]; cancelling afterwards is a no-op. Dropping a handle that has not
/// produced its outcome cancels the operation.
#[derive(Debug)]
pub struct RequestHandle<T> {
	receiver: oneshot::Receiver<Result<T>>,
	canceller: RequestCanceller,
	runtime: Option<Handle>,
	finished: bool,
}
impl<T> RequestHandle<T>
where
	T: 'static + Send,
{
	/// Runs `operation` on a Tokio task.
	pub(crate) fn spawn<F>(operation: F) -> Self
	where
		F: 'static + Send + Future<Output = Result<T>>,
	{
		let canceller = RequestCanceller::new(CancellationToken::new());
		let (sender, receiver) = oneshot::channel();

		let Ok(runtime) = Handle::try_current() else {
			let _ = sender.send(Err(Error::invalid_argument("requests must be started inside a Tokio runtime")));

			canceller.settle();

			return Self { receiver, canceller, runtime: None, finished: false };
		};

		let cancelled = canceller.token.clone();
		let settled = canceller.settled.clone();
		let task = async move {
			let outcome = tokio::select! {
				biased;
				_ = cancelled.cancelled() => {
					debug_event!("operation cancelled before completion");

					Err(Error::Cancelled)
				},
				outcome = operation => outcome,
			};

			settled.store(true, Ordering::Release);

			let _ = sender.send(outcome);
		};

		runtime.spawn(task);

		Self { receiver, canceller, runtime: Some(runtime), finished: false }
	}

	/// Delivers the outcome to `callback` on `context`.
	///
	/// The callback runs exactly once. The waiter runs on the runtime the operation was started
	/// on, so this may be called from a thread without one. If the returned canceller fires before
	/// the callback runs, the callback receives [`Error::Cancelled`].
	pub fn deliver_on<F>(mut self, context: Arc<dyn CompletionContext>, callback: F) -> RequestCanceller
	where
		F: 'static + Send + FnOnce(Result<T>),
	{
		let canceller = RequestCanceller::new(self.canceller.token.clone());
		let guard = canceller.clone();
		let Some(runtime) = self.runtime.clone().or_else(|| Handle::try_current().ok()) else {
			let outcome = self.receiver.try_recv().unwrap_or_else(|_| {
				Err(Error::invalid_argument("completion delivery requires a Tokio runtime"))
			});

			self.finished = true;

			context.dispatch(Box::new(move || guard.complete(outcome, callback)));

			return canceller;
		};
		let waiter = async move {
			let outcome = self.await;

			context.dispatch(Box::new(move || guard.complete(outcome, callback)));
		};

		runtime.spawn(waiter);

		canceller
	}
}
impl<T> RequestHandle<T> {
	/// Cancels the operation. A no-op once the operation has produced its outcome.
	pub fn cancel(&self) {
		if !self.finished {
			self.canceller.cancel();
		}
	}

	/// Returns `true` once cancellation took effect.
	pub fn is_cancelled(&self) -> bool {
		self.canceller.is_cancelled()
	}

	/// Detached canceller for this operation.
	pub fn canceller(&self) -> RequestCanceller {
		self.canceller.clone()
	}
}
impl<T> Future for RequestHandle<T> {
	type Output = Result<T>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		if self.finished || self.canceller.is_cancelled() {
			self.finished = true;

			return Poll::Ready(Err(Error::Cancelled));
		}

		match Pin::new(&mut self.receiver).poll(cx) {
			Poll::Ready(outcome) => {
				self.finished = true;

				Poll::Ready(outcome.unwrap_or(Err(Error::Cancelled)))
			},
			Poll::Pending => Poll::Pending,
		}
	}
}
impl<T> Drop for RequestHandle<T> {
	fn drop(&mut self) {
		if !self.finished {
			self.canceller.cancel();
		}
	}
}

/// Cancels an operation independently of its [`RequestHandle`].
///
/// Cancelling after the outcome it guards was produced is a no-op.
#[derive(Clone, Debug)]
pub struct RequestCanceller {
	token: CancellationToken,
	settled: Arc<AtomicBool>,
}
impl RequestCanceller {
	fn new(token: CancellationToken) -> Self {
		Self { token, settled: Arc::new(AtomicBool::new(false)) }
	}

	fn settle(&self) {
		self.settled.store(true, Ordering::Release);
	}

	fn complete<T, F>(&self, outcome: Result<T>, callback: F)
	where
		F: FnOnce(Result<T>),
	{
		self.settle();

		callback(if self.is_cancelled() { Err(Error::Cancelled) } else { outcome });
	}

	/// Requests cancellation.
	pub fn cancel(&self) {
		if !self.settled.load(Ordering::Acquire) {
			self.token.cancel();
		}
	}

	/// Returns `true` once cancellation took effect.
	pub fn is_cancelled(&self) -> bool {
		self.token.is_cancelled()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicBool, Ordering};
	// self
	use super::*;
	use crate::http::context_queue;

	#[tokio::test]
	async fn outcome_is_delivered_once() {
		let handle = RequestHandle::spawn(async { Ok(7) });

		assert_eq!(handle.await.expect("Operation should succeed."), 7);
	}

	#[tokio::test]
	async fn cancel_wins_over_pending_work() {
		let finished = Arc::new(AtomicBool::new(false));
		let flag = finished.clone();
		let handle = RequestHandle::spawn(async move {
			tokio::time::sleep(std::time::Duration::from_secs(30)).await;
			flag.store(true, Ordering::SeqCst);

			Ok(())
		});

		handle.cancel();

		assert!(handle.await.expect_err("Cancelled handle should fail.").is_cancelled());
		assert!(!finished.load(Ordering::SeqCst));
	}

	#[tokio::test]
	async fn cancel_after_completion_is_a_no_op() {
		let handle = RequestHandle::spawn(async { Ok(5) });

		tokio::time::sleep(std::time::Duration::from_millis(50)).await;
		handle.cancel();

		assert!(!handle.is_cancelled());
		assert_eq!(handle.await.expect("Finished operation should keep its outcome."), 5);
	}

	#[test]
	fn delivery_from_a_thread_without_runtime_uses_the_starting_runtime() {
		let runtime = tokio::runtime::Builder::new_multi_thread()
			.worker_threads(1)
			.enable_all()
			.build()
			.expect("Runtime should build.");
		let handle = runtime.block_on(async { RequestHandle::spawn(async { Ok(3) }) });
		let (queue, mut runner) = context_queue();
		let calls = Arc::new(Mutex::new(Vec::new()));
		let sink = calls.clone();

		assert!(Handle::try_current().is_err());

		handle.deliver_on(Arc::new(queue), move |outcome| sink.lock().push(outcome.ok()));

		assert!(runtime.block_on(runner.run_next()));
		assert_eq!(runner.run_pending(), 0);
		assert_eq!(*calls.lock(), vec![Some(3)]);
	}

	#[test]
	fn delivery_without_any_runtime_still_reports_once() {
		let handle = RequestHandle::spawn(async { Ok(()) });
		let (queue, mut runner) = context_queue();
		let calls = Arc::new(Mutex::new(Vec::new()));
		let sink = calls.clone();

		handle.deliver_on(Arc::new(queue), move |outcome| {
			sink.lock().push(matches!(outcome, Err(Error::InvalidArgument { .. })))
		});

		assert_eq!(runner.run_pending(), 1);
		assert_eq!(*calls.lock(), vec![true]);
	}

	#[tokio::test]
	async fn cancelled_delivery_reports_cancellation() {
		let (queue, mut runner) = context_queue();
		let seen = Arc::new(Mutex::new(None));
		let sink = seen.clone();
		let canceller = RequestHandle::spawn(async { Ok("done") })
			.deliver_on(Arc::new(queue), move |outcome| *sink.lock() = Some(outcome.map_err(|e| e.is_cancelled())));

		canceller.cancel();

		assert!(runner.run_next().await);
		assert_eq!(*seen.lock(), Some(Err(true)));
	}

	#[tokio::test]
	async fn delivery_runs_on_the_given_context() {
		let (queue, mut runner) = context_queue();
		let seen = Arc::new(Mutex::new(None));
		let sink = seen.clone();

		RequestHandle::spawn(async { Ok(1) })
			.deliver_on(Arc::new(queue), move |outcome| *sink.lock() = outcome.ok());

		assert!(runner.run_next().await);
		assert_eq!(*seen.lock(), Some(1));
	}
}
