//! Content hashes used for exact-duplicate detection.

use sha2::{Digest, Sha256};

/// Separates fields and task entries inside the hashed material.
const DELIMITER: char = '\u{1f}';

/// Deterministic digest over the normalized core fields of a posting.
///
/// Company and title lose all whitespace and case. Tasks are trimmed, lowercased, stripped of
/// empties and sorted, so the digest does not depend on task order.
pub fn fingerprint<S>(company_name: &str, job_title: &str, main_tasks: &[S]) -> String
where
	S: AsRef<str>,
{
	let mut tasks: Vec<String> = main_tasks
		.iter()
		.map(|task| task.as_ref().trim().to_lowercase())
		.filter(|task| !task.is_empty())
		.collect();

	tasks.sort();

	let mut material = String::new();

	material.push_str(&squash(company_name));
	material.push(DELIMITER);
	material.push_str(&squash(job_title));
	material.push(DELIMITER);
	material.push_str(&tasks.join(&DELIMITER.to_string()));

	sha256_hex(material.as_bytes())
}

/// SHA-256 of the source URL exactly as observed.
pub fn url_hash(url: &str) -> String {
	sha256_hex(url.as_bytes())
}

fn squash(value: &str) -> String {
	value.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect()
}

fn sha256_hex(bytes: &[u8]) -> String {
	let mut hasher = Sha256::new();

	hasher.update(bytes);

	hex::encode(hasher.finalize())
}
