//! Yes/no equivalence judgments from a chat model.

use color_eyre::{Result, eyre};
use serde_json::Value;

use jobmatch_domain::kind::IndexKind;

const SYSTEM_PROMPT: &str = "You decide whether two records denote the same real-world entity. \
Answer with exactly one word: YES or NO.";

/// Asks the model whether `a` and `b` denote the same entity of type `subject`.
///
/// Any answer other than a leading YES or NO is an error; callers decide how to degrade.
pub async fn is_same(
	cfg: &jobmatch_config::LlmProviderConfig,
	subject: IndexKind,
	a: &str,
	b: &str,
) -> Result<bool> {
	let client = crate::client(cfg.timeout_ms)?;
	let messages = vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": build_prompt(subject, a, b) }),
	];
	let json = crate::chat_completion(cfg, &client, &messages).await?;
	let answer = parse_answer(&json)?;

	tracing::debug!(subject = subject.as_str(), answer, "Arbitration answered.");

	Ok(answer)
}

fn build_prompt(subject: IndexKind, a: &str, b: &str) -> String {
	match subject {
		IndexKind::Company => format!(
			"Do these two company names refer to the same company?\n\n\
Company A: {a}\nCompany B: {b}\n\n\
Treat abbreviations, transliterations between scripts and differences in legal form \
(Inc., Corp., Co., Ltd.) as the same company. Sister companies and subsidiaries are different.\n\
Examples:\n- \"Kakao\" vs \"카카오\" -> YES\n- \"NAVER\" vs \"Naver Corp.\" -> YES\n\
- \"Samsung Electronics\" vs \"Samsung SDI\" -> NO\n\nAnswer:"
		),
		IndexKind::Skill => format!(
			"Do these two skill names refer to the same technology?\n\n\
Skill A: {a}\nSkill B: {b}\n\n\
Treat abbreviations, casing and version suffixes as the same technology.\n\
Examples:\n- \"JavaScript\" vs \"Javascript\" -> YES\n- \"React.js\" vs \"React\" -> YES\n\
- \"Python3\" vs \"Python\" -> YES\n- \"Vue\" vs \"React\" -> NO\n\
- \"Docker\" vs \"Kubernetes\" -> NO\n\nAnswer:"
		),
		IndexKind::Job => format!(
			"Do these two job postings describe the same job opening?\n\n\
[Posting A]\n{a}\n\n[Posting B]\n{b}\n\n\
Treat the same position at the same company with slightly different wording as the same \
posting. Different seniority, team or location is a different posting.\n\nAnswer:"
		),
	}
}

fn parse_answer(json: &Value) -> Result<bool> {
	let content = crate::choice_content(json)
		.ok_or_else(|| eyre::eyre!("Arbiter response is missing message content."))?;
	let word: String = content
		.trim()
		.chars()
		.take_while(|c| c.is_alphabetic())
		.collect::<String>()
		.to_uppercase();

	match word.as_str() {
		"YES" => Ok(true),
		"NO" => Ok(false),
		_ => Err(eyre::eyre!("Arbiter answered neither YES nor NO: {content:?}.")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn response(content: &str) -> Value {
		serde_json::json!({ "choices": [{ "message": { "content": content } }] })
	}

	#[test]
	fn parses_yes_and_no() {
		assert!(parse_answer(&response("YES")).expect("parse failed"));
		assert!(parse_answer(&response(" yes.\n")).expect("parse failed"));
		assert!(!parse_answer(&response("No")).expect("parse failed"));
	}

	#[test]
	fn rejects_hedged_answers() {
		assert!(parse_answer(&response("Probably")).is_err());
		assert!(parse_answer(&response("NOPE")).is_err());
		assert!(parse_answer(&serde_json::json!({ "choices": [] })).is_err());
	}

	#[test]
	fn prompts_embed_both_sides() {
		let prompt = build_prompt(IndexKind::Skill, "React.js", "React");

		assert!(prompt.contains("Skill A: React.js"));
		assert!(prompt.contains("Skill B: React"));
	}
}
