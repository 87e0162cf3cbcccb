use unicode_normalization::UnicodeNormalization;

/// Lookup key for canonical names and aliases.
///
/// NFKC folds compatibility forms (full-width Latin, ligatures), whitespace runs collapse to a
/// single space and the result is lowercased.
pub fn normalize_name(input: &str) -> String {
	let folded: String = input.nfkc().collect();

	folded.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Trimmed display form of a raw name, or `None` when nothing is left.
pub fn clean_name(input: &str) -> Option<String> {
	let cleaned = input.split_whitespace().collect::<Vec<_>>().join(" ");

	if cleaned.is_empty() { None } else { Some(cleaned) }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn collapses_case_and_whitespace() {
		assert_eq!(normalize_name("  IBM \t Korea "), "ibm korea");
	}

	#[test]
	fn folds_full_width_forms() {
		assert_eq!(normalize_name("ＡＷＳ"), "aws");
	}

	#[test]
	fn clean_name_rejects_blank_input() {
		assert_eq!(clean_name("   "), None);
		assert_eq!(clean_name(" React  Native "), Some("React Native".to_string()));
	}
}
