use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub resolution: Resolution,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// One collection per indexed entity type. All three share `vector_dim`.
#[derive(Clone, Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub vector_dim: u32,
	pub company_collection: String,
	pub skill_collection: String,
	pub job_collection: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub arbiter: LlmProviderConfig,
	pub extractor: LlmProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	#[serde(default)]
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}
impl LlmProviderConfig {
	pub fn is_mock(&self) -> bool {
		self.provider_id == "mock"
	}
}

/// Similarity thresholds per entity type.
///
/// Scores at or above `high` are accepted outright. Scores in `[medium, high)` go to arbitration.
/// Anything below `medium` is treated as a different entity.
#[derive(Clone, Debug, Deserialize)]
pub struct Resolution {
	#[serde(default = "default_company_thresholds")]
	pub company: Thresholds,
	#[serde(default = "default_skill_thresholds")]
	pub skill: Thresholds,
	#[serde(default = "default_job_thresholds")]
	pub job: Thresholds,
}
impl Default for Resolution {
	fn default() -> Self {
		Self {
			company: default_company_thresholds(),
			skill: default_skill_thresholds(),
			job: default_job_thresholds(),
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct Thresholds {
	pub high: f32,
	pub medium: f32,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_company_thresholds() -> Thresholds {
	Thresholds { high: 0.85, medium: 0.70 }
}

fn default_skill_thresholds() -> Thresholds {
	Thresholds { high: 0.85, medium: 0.50 }
}

fn default_job_thresholds() -> Thresholds {
	Thresholds { high: 0.85, medium: 0.75 }
}
