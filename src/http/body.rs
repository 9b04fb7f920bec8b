// std
use std::{
	io::Error as IoError,
	sync::atomic::{AtomicBool, AtomicU64, Ordering},
};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures_util::{Stream, StreamExt, TryStreamExt, stream};
// self
use crate::_prelude::*;

const PROGRESS_CHUNK: usize = 64 * 1024;

/// Upload progress callback receiving `(bytes_sent, bytes_total)`.
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Boxed byte stream used for streamed uploads.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, IoError>> + Send>>;

/// Request payload: an in-memory buffer or a stream of declared length.
pub enum RequestBody {
	/// In-memory payload; replayable.
	Bytes(Bytes),
	/// Streamed payload; consumed by the first attempt.
	Stream {
		/// Source of the bytes.
		stream: ByteStream,
		/// Exact number of bytes the stream yields.
		length: u64,
	},
}
impl RequestBody {
	/// Wraps a stream that yields exactly `length` bytes.
	pub fn stream<S>(stream: S, length: u64) -> Self
	where
		S: 'static + Send + Stream<Item = Result<Bytes, IoError>>,
	{
		Self::Stream { stream: Box::pin(stream), length }
	}

	/// Declared payload length.
	pub fn length(&self) -> u64 {
		match self {
			RequestBody::Bytes(bytes) => bytes.len() as u64,
			RequestBody::Stream { length, .. } => *length,
		}
	}

	/// Returns `true` when the body can be sent again after a challenge.
	pub fn is_replayable(&self) -> bool {
		matches!(self, RequestBody::Bytes(_))
	}

	pub(crate) fn replay(&self) -> Option<RequestBody> {
		match self {
			RequestBody::Bytes(bytes) => Some(RequestBody::Bytes(bytes.clone())),
			RequestBody::Stream { .. } => None,
		}
	}

	/// Surrounds the payload with `prefix` and `suffix`.
	pub(crate) fn framed(self, prefix: impl Into<Bytes>, suffix: impl Into<Bytes>) -> Self {
		let prefix = prefix.into();
		let suffix = suffix.into();

		match self {
			RequestBody::Bytes(bytes) => {
				let mut framed = Vec::with_capacity(prefix.len() + bytes.len() + suffix.len());

				framed.extend_from_slice(&prefix);
				framed.extend_from_slice(&bytes);
				framed.extend_from_slice(&suffix);

				RequestBody::Bytes(framed.into())
			},
			RequestBody::Stream { stream, length } => {
				let length = length + prefix.len() as u64 + suffix.len() as u64;
				let framed = stream::once(async move { Ok::<_, IoError>(prefix) })
					.chain(stream)
					.chain(stream::once(async move { Ok(suffix) }));

				RequestBody::stream(framed, length)
			},
		}
	}

	/// Base64-encodes the payload (standard alphabet, padded).
	pub(crate) fn base64_encoded(self) -> Self {
		match self {
			RequestBody::Bytes(bytes) => RequestBody::Bytes(STANDARD.encode(&bytes).into()),
			RequestBody::Stream { stream, length } => {
				let encoded_length = length.div_ceil(3) * 4;

				RequestBody::stream(Base64Stream::encode(stream), encoded_length)
			},
		}
	}

	pub(crate) fn into_transfer(self, reporter: Option<&ProgressReporter>) -> reqwest::Body {
		let Some(reporter) = reporter.cloned() else {
			return match self {
				RequestBody::Bytes(bytes) => reqwest::Body::from(bytes),
				RequestBody::Stream { stream, .. } => reqwest::Body::wrap_stream(stream),
			};
		};
		let source: ByteStream = match self {
			RequestBody::Bytes(bytes) => {
				let chunks = (0..bytes.len())
					.step_by(PROGRESS_CHUNK)
					.map(|start| Ok::<_, IoError>(bytes.slice(start..(start + PROGRESS_CHUNK).min(bytes.len()))))
					.collect::<Vec<_>>();

				Box::pin(stream::iter(chunks))
			},
			RequestBody::Stream { stream, .. } => stream,
		};
		let mut sent = 0_u64;

		reqwest::Body::wrap_stream(source.inspect_ok(move |chunk| {
			sent += chunk.len() as u64;

			reporter.report(sent);
		}))
	}
}
impl Debug for RequestBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			RequestBody::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
			RequestBody::Stream { length, .. } =>
				f.debug_struct("Stream").field("length", length).finish_non_exhaustive(),
		}
	}
}
impl From<Bytes> for RequestBody {
	fn from(bytes: Bytes) -> Self {
		Self::Bytes(bytes)
	}
}
impl From<Vec<u8>> for RequestBody {
	fn from(bytes: Vec<u8>) -> Self {
		Self::Bytes(bytes.into())
	}
}
impl From<String> for RequestBody {
	fn from(text: String) -> Self {
		Self::Bytes(text.into())
	}
}
impl From<&'static str> for RequestBody {
	fn from(text: &'static str) -> Self {
		Self::Bytes(Bytes::from_static(text.as_bytes()))
	}
}

struct Base64Stream {
	source: ByteStream,
	carry: Vec<u8>,
	finished: bool,
}
impl Base64Stream {
	fn encode(source: ByteStream) -> impl Stream<Item = Result<Bytes, IoError>> {
		stream::unfold(Self { source, carry: Vec::new(), finished: false }, |mut state| async move {
			if state.finished {
				return None;
			}

			loop {
				match state.source.next().await {
					Some(Ok(chunk)) => {
						state.carry.extend_from_slice(&chunk);

						let aligned = state.carry.len() - state.carry.len() % 3;

						if aligned == 0 {
							continue;
						}

						let rest = state.carry.split_off(aligned);
						let encoded = STANDARD.encode(&state.carry);

						state.carry = rest;

						return Some((Ok(Bytes::from(encoded)), state));
					},
					Some(Err(e)) => {
						state.finished = true;

						return Some((Err(e), state));
					},
					None => {
						state.finished = true;

						let tail = std::mem::take(&mut state.carry);

						return Some((Ok(Bytes::from(STANDARD.encode(tail))), state));
					},
				}
			}
		})
	}
}

/// Reports monotonically increasing upload progress until closed.
#[derive(Clone)]
pub(crate) struct ProgressReporter(Arc<ProgressState>);
impl ProgressReporter {
	pub(crate) fn new(callback: ProgressCallback, total: u64) -> Self {
		Self(Arc::new(ProgressState {
			callback,
			total,
			sent: AtomicU64::new(0),
			closed: AtomicBool::new(false),
		}))
	}

	/// Closes the reporter when the returned guard drops.
	pub(crate) fn guard(&self) -> ProgressGuard {
		ProgressGuard(self.0.clone())
	}

	fn report(&self, sent: u64) {
		if self.0.closed.load(Ordering::Acquire) {
			return;
		}

		let previous = self.0.sent.fetch_max(sent, Ordering::AcqRel);

		if sent > previous {
			(self.0.callback)(sent, self.0.total);
		}
	}
}

struct ProgressState {
	callback: ProgressCallback,
	total: u64,
	sent: AtomicU64,
	closed: AtomicBool,
}

pub(crate) struct ProgressGuard(Arc<ProgressState>);
impl Drop for ProgressGuard {
	fn drop(&mut self) {
		self.0.closed.store(true, Ordering::Release);
	}
}
