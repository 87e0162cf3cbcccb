use serde::{Deserialize, Serialize};

/// Entities resolved through alias tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
	Company,
	Skill,
}
impl EntityKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Company => "company",
			Self::Skill => "skill",
		}
	}
}

/// Record types stored in the similarity index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
	Company,
	Skill,
	Job,
}
impl IndexKind {
	pub const ALL: [Self; 3] = [Self::Company, Self::Skill, Self::Job];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Company => "company",
			Self::Skill => "skill",
			Self::Job => "job",
		}
	}
}
impl From<EntityKind> for IndexKind {
	fn from(kind: EntityKind) -> Self {
		match kind {
			EntityKind::Company => Self::Company,
			EntityKind::Skill => Self::Skill,
		}
	}
}
