use jobmatch_config::LlmProviderConfig;
use jobmatch_domain::kind::IndexKind;

use crate::{ArbitrationProvider, BoxFuture};

/// Conservative front for an [`ArbitrationProvider`]: any provider error reads as "different".
#[derive(Clone, Copy)]
pub struct Arbitration<'a> {
	provider: &'a dyn ArbitrationProvider,
	cfg: &'a LlmProviderConfig,
}
impl<'a> Arbitration<'a> {
	pub fn new(provider: &'a dyn ArbitrationProvider, cfg: &'a LlmProviderConfig) -> Self {
		Self { provider, cfg }
	}

	pub async fn is_same(&self, subject: IndexKind, a: &str, b: &str) -> bool {
		match self.provider.is_same(self.cfg, subject, a, b).await {
			Ok(same) => {
				tracing::debug!(subject = subject.as_str(), same, "Arbitration decided.");

				same
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					subject = subject.as_str(),
					"Arbitration failed. Treating the records as different."
				);

				false
			},
		}
	}
}

/// Offline arbiter: two texts are the same when they match after dropping whitespace and case.
pub struct LexicalArbiter;
impl ArbitrationProvider for LexicalArbiter {
	fn is_same<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_subject: IndexKind,
		a: &'a str,
		b: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<bool>> {
		let same = compact(a) == compact(b);

		Box::pin(async move { Ok(same) })
	}
}

fn compact(text: &str) -> String {
	text.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn compact_ignores_spacing_and_case() {
		assert_eq!(compact(" Naver  Corp "), compact("navercorp"));
		assert_ne!(compact("Naver Corp"), compact("Naver Cloud"));
	}
}
