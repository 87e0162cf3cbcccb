mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, Providers, Qdrant, Resolution,
	Service, Storage, Thresholds,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	let mut seen = HashSet::new();

	for (label, name) in [
		("company_collection", &cfg.storage.qdrant.company_collection),
		("skill_collection", &cfg.storage.qdrant.skill_collection),
		("job_collection", &cfg.storage.qdrant.job_collection),
	] {
		if name.is_empty() {
			return Err(Error::Validation {
				message: format!("storage.qdrant.{label} must be non-empty."),
			});
		}
		if !seen.insert(name.as_str()) {
			return Err(Error::Validation {
				message: format!("storage.qdrant.{label} must not reuse another collection name."),
			});
		}
	}

	for (label, key, mockable) in [
		("embedding", &cfg.providers.embedding.api_key, false),
		("arbiter", &cfg.providers.arbiter.api_key, cfg.providers.arbiter.is_mock()),
		("extractor", &cfg.providers.extractor.api_key, false),
	] {
		if !mockable && key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	for (label, provider) in
		[("arbiter", &cfg.providers.arbiter), ("extractor", &cfg.providers.extractor)]
	{
		if !provider.temperature.is_finite() || provider.temperature < 0.0 {
			return Err(Error::Validation {
				message: format!(
					"providers.{label}.temperature must be a finite number, zero or greater."
				),
			});
		}
	}

	for (label, thresholds) in [
		("company", &cfg.resolution.company),
		("skill", &cfg.resolution.skill),
		("job", &cfg.resolution.job),
	] {
		validate_thresholds(label, thresholds)?;
	}

	Ok(())
}

fn validate_thresholds(label: &str, thresholds: &Thresholds) -> Result<()> {
	if !thresholds.high.is_finite() || !thresholds.medium.is_finite() {
		return Err(Error::Validation {
			message: format!("resolution.{label} thresholds must be finite numbers."),
		});
	}
	if !(0.0..=1.0).contains(&thresholds.high) || !(0.0..=1.0).contains(&thresholds.medium) {
		return Err(Error::Validation {
			message: format!("resolution.{label} thresholds must be in the range 0.0-1.0."),
		});
	}
	if thresholds.medium > thresholds.high {
		return Err(Error::Validation {
			message: format!("resolution.{label}.medium must be less than or equal to high."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let qdrant = &mut cfg.storage.qdrant;

	for name in
		[&mut qdrant.company_collection, &mut qdrant.skill_collection, &mut qdrant.job_collection]
	{
		*name = name.trim().to_string();
	}

	cfg.service.log_level = cfg.service.log_level.trim().to_string();

	if cfg.service.log_level.is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
