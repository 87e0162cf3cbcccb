//! Structured posting record produced by the extractor.

use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::{Error, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPosting {
	pub company_name: String,
	pub job_title: String,
	#[serde(default)]
	pub main_tasks: Vec<String>,
	#[serde(default)]
	pub requirements: Vec<String>,
	#[serde(default)]
	pub preferred: Vec<String>,
	#[serde(default)]
	pub tech_stacks: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub summary: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub start_date: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub end_date: Option<String>,
	#[serde(default)]
	pub evaluation_criteria: Vec<EvaluationCriteriaItem>,
}
impl ExtractedPosting {
	pub fn validate(&self) -> Result<()> {
		if self.company_name.trim().is_empty() {
			return Err(Error::InvalidPosting {
				message: "company_name must be non-empty.".to_string(),
			});
		}
		if self.job_title.trim().is_empty() {
			return Err(Error::InvalidPosting {
				message: "job_title must be non-empty.".to_string(),
			});
		}
		if self.evaluation_criteria.iter().any(|item| item.name.trim().is_empty()) {
			return Err(Error::InvalidPosting {
				message: "evaluation_criteria entries must have a non-empty name.".to_string(),
			});
		}

		Ok(())
	}

	pub fn fingerprint(&self) -> String {
		crate::fingerprint::fingerprint(
			&self.company_name,
			&self.job_title,
			self.main_tasks.as_slice(),
		)
	}

	/// Canonical serialized content fed to the similarity index.
	pub fn index_text(&self) -> String {
		// Plain data with string keys; serialization cannot fail.
		serde_json::to_string(self).unwrap_or_default()
	}

	/// Short rendering handed to arbitration.
	pub fn arbitration_summary(&self) -> String {
		let tasks = if self.main_tasks.is_empty() {
			"N/A".to_string()
		} else {
			self.main_tasks.join("; ")
		};

		format!("Company: {}\nTitle: {}\nTasks: {}", self.company_name, self.job_title, tasks)
	}

	pub fn start_date(&self) -> Option<Date> {
		parse_date(self.start_date.as_deref())
	}

	pub fn end_date(&self) -> Option<Date> {
		parse_date(self.end_date.as_deref())
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationCriteriaItem {
	pub name: String,
	pub description: String,
}

/// Parses an ISO `YYYY-MM-DD` date. Anything else is dropped.
pub fn parse_date(raw: Option<&str>) -> Option<Date> {
	let raw = raw?.trim();

	if raw.is_empty() {
		return None;
	}

	match Date::parse(raw, format_description!("[year]-[month]-[day]")) {
		Ok(date) => Some(date),
		Err(err) => {
			tracing::debug!(error = %err, raw, "Ignoring unparseable posting date.");

			None
		},
	}
}

#[cfg(test)]
mod tests {
	use time::Month;

	use super::*;

	fn posting() -> ExtractedPosting {
		ExtractedPosting {
			company_name: "Acme".to_string(),
			job_title: "Backend Engineer".to_string(),
			main_tasks: vec!["API".to_string(), "DB".to_string()],
			..Default::default()
		}
	}

	#[test]
	fn blank_company_is_rejected() {
		let mut data = posting();

		data.company_name = "  ".to_string();

		let err = data.validate().expect_err("Expected invalid posting.");

		assert!(err.to_string().contains("company_name must be non-empty."));
	}

	#[test]
	fn unnamed_criteria_are_rejected() {
		let mut data = posting();

		data.evaluation_criteria =
			vec![EvaluationCriteriaItem { name: String::new(), description: "x".to_string() }];

		assert!(data.validate().is_err());
	}

	#[test]
	fn dates_parse_leniently() {
		let mut data = posting();

		data.start_date = Some("2024-03-01".to_string());
		data.end_date = Some("until filled".to_string());

		let start = data.start_date().expect("Expected a start date.");

		assert_eq!((start.year(), start.month(), start.day()), (2024, Month::March, 1));
		assert_eq!(data.end_date(), None);
	}

	#[test]
	fn deserializes_with_missing_optional_fields() {
		let data: ExtractedPosting =
			serde_json::from_str(r#"{"company_name":"Acme","job_title":"Engineer"}"#)
				.expect("Failed to parse posting.");

		assert!(data.main_tasks.is_empty());
		assert!(data.evaluation_criteria.is_empty());
		assert!(data.validate().is_ok());
	}

	#[test]
	fn summary_lists_tasks() {
		let summary = posting().arbitration_summary();

		assert_eq!(summary, "Company: Acme\nTitle: Backend Engineer\nTasks: API; DB");
	}
}
