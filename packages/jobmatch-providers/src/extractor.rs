use color_eyre::{Result, eyre};
use serde_json::Value;

use jobmatch_domain::posting::ExtractedPosting;

const MAX_ATTEMPTS: usize = 3;
const SYSTEM_PROMPT: &str = "You extract structured data from job postings. Respond with a single \
JSON object and nothing else. Keys: company_name (string), job_title (string), main_tasks \
(string[]), requirements (string[]), preferred (string[]), tech_stacks (string[]), summary \
(string), start_date (YYYY-MM-DD or null), end_date (YYYY-MM-DD or null), evaluation_criteria \
([{\"name\": string, \"description\": string}]). Copy names exactly as written in the posting.";

/// Extracts a posting record from raw page text, retrying when the model returns unusable JSON.
pub async fn extract_posting(
	cfg: &jobmatch_config::LlmProviderConfig,
	raw_text: &str,
) -> Result<ExtractedPosting> {
	let client = crate::client(cfg.timeout_ms)?;
	let messages = vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": raw_text }),
	];
	let mut last_err = None;

	for attempt in 1..=MAX_ATTEMPTS {
		let json = crate::chat_completion(cfg, &client, &messages).await?;

		match parse_posting(json) {
			Ok(posting) => return Ok(posting),
			Err(err) => {
				tracing::warn!(error = %err, attempt, "Extractor returned an unusable posting.");

				last_err = Some(err);
			},
		}
	}

	Err(last_err.unwrap_or_else(|| eyre::eyre!("Extractor produced no response.")))
}

fn parse_posting(json: Value) -> Result<ExtractedPosting> {
	let value = match crate::choice_content(&json) {
		Some(content) => serde_json::from_str::<Value>(strip_code_fence(content))
			.map_err(|_| eyre::eyre!("Extractor content is not valid JSON."))?,
		None if json.is_object() => json,
		None => return Err(eyre::eyre!("Extractor response is missing JSON content.")),
	};
	let posting: ExtractedPosting = serde_json::from_value(value)
		.map_err(|err| eyre::eyre!("Extractor JSON does not match the posting shape: {err}."))?;

	posting.validate()?;

	Ok(posting)
}

fn strip_code_fence(content: &str) -> &str {
	let trimmed = content.trim();
	let Some(inner) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let inner = inner.strip_prefix("json").unwrap_or(inner);

	inner.strip_suffix("```").unwrap_or(inner).trim()
}
