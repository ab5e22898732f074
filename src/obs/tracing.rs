// self
use crate::{_prelude::*, obs::CredentialOp};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// Span wrapper used around resolution and fetch operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a span tagged with the operation and call-site stage.
	pub fn new(op: CredentialOp, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth2_adc.credentials", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> OpSpanGuard {
		#[cfg(feature = "tracing")]
		{
			OpSpanGuard { _guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			OpSpanGuard {}
		}
	}

	/// Instruments a future without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`OpSpan::entered`].
pub struct OpSpanGuard {
	#[cfg(feature = "tracing")]
	_guard: tracing::span::EnteredSpan,
}
impl Debug for OpSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OpSpanGuard(..)")
	}
}

/// Emits a debug event naming a checked credentials path.
pub(crate) fn checked_path(op: CredentialOp, path: &Path, found: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(op = op.as_str(), path = %path.display(), found, "checked credentials path");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (op, path, found);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn span_guard_exists_without_tracing() {
		let _guard = OpSpan::new(CredentialOp::ResolveEnvironment, "test").entered();

		checked_path(CredentialOp::ResolveEnvironment, Path::new("/tmp/key.json"), false);
	}

	#[tokio::test]
	async fn instrument_preserves_output() {
		let span = OpSpan::new(CredentialOp::FetchToken, "instrument_preserves_output");

		assert_eq!(span.instrument(async { 7 }).await, 7);
	}
}
