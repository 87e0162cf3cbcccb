//! Raw company/skill names to canonical entity ids.
//!
//! Resolution order is alias lookup, top-1 similarity search, then arbitration for the middle
//! band. A new entity is created only when nothing qualifies.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, IndexHit, IndexQuery, IndexRecord, Result, SimilarityIndex, UnitOfWork,
	arbitration::Arbitration, store::EntityRef,
};
use jobmatch_config::Thresholds;
use jobmatch_domain::{
	kind::{EntityKind, IndexKind},
	name::{clean_name, normalize_name},
	tier::{self, MatchTier},
};

#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
	pub entity_id: Uuid,
	/// Canonical stored name.
	pub name: String,
	pub path: ResolutionPath,
}
impl Resolution {
	pub fn is_created(&self) -> bool {
		matches!(self.path, ResolutionPath::Created)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResolutionPath {
	/// Exact hit on the canonical name or a learned alias.
	Alias,
	/// Similarity at or above the high threshold.
	Matched { score: f32 },
	/// Middle band, affirmed by arbitration.
	Arbitrated { score: f32 },
	Created,
}

pub struct EntityNormalizer<'a> {
	kind: EntityKind,
	thresholds: Thresholds,
	index: &'a dyn SimilarityIndex,
	arbitration: Arbitration<'a>,
}
impl<'a> EntityNormalizer<'a> {
	pub fn new(
		kind: EntityKind,
		thresholds: Thresholds,
		index: &'a dyn SimilarityIndex,
		arbitration: Arbitration<'a>,
	) -> Self {
		Self { kind, thresholds, index, arbitration }
	}

	pub fn kind(&self) -> EntityKind {
		self.kind
	}

	pub async fn resolve(&self, uow: &mut dyn UnitOfWork, raw_name: &str) -> Result<Resolution> {
		let Some(name) = clean_name(raw_name) else {
			return Err(Error::InvalidInput {
				message: format!("{} name must be non-empty.", self.kind.as_str()),
			});
		};
		let name_norm = normalize_name(&name);
		let now = OffsetDateTime::now_utc();

		if let Some(entity) = uow.find_entity_by_alias(self.kind, &name_norm).await? {
			tracing::debug!(
				kind = self.kind.as_str(),
				entity_id = %entity.entity_id,
				"Resolved by alias."
			);

			return Ok(Resolution {
				entity_id: entity.entity_id,
				name: entity.name,
				path: ResolutionPath::Alias,
			});
		}

		let Some(hit) = self.top_candidate(&name).await else {
			return self.create(uow, &name, &name_norm, now).await;
		};
		let tier = tier::classify(hit.score, &self.thresholds);

		if tier == MatchTier::Low {
			tracing::debug!(
				kind = self.kind.as_str(),
				score = hit.score,
				"Nearest candidate is below the middle band."
			);

			return self.create(uow, &name, &name_norm, now).await;
		}

		let Some(entity) = uow.get_entity(self.kind, hit.entity_id).await? else {
			tracing::warn!(
				kind = self.kind.as_str(),
				entity_id = %hit.entity_id,
				"Index returned an entity missing from the store. Creating a new entity."
			);

			return self.create(uow, &name, &name_norm, now).await;
		};
		let path = if tier == MatchTier::High {
			ResolutionPath::Matched { score: hit.score }
		} else if self.arbitration.is_same(self.kind.into(), &name, &entity.name).await {
			ResolutionPath::Arbitrated { score: hit.score }
		} else {
			tracing::debug!(
				kind = self.kind.as_str(),
				score = hit.score,
				"Arbitration denied the candidate."
			);

			return self.create(uow, &name, &name_norm, now).await;
		};

		tracing::info!(
			kind = self.kind.as_str(),
			entity_id = %entity.entity_id,
			score = hit.score,
			arbitrated = matches!(path, ResolutionPath::Arbitrated { .. }),
			"Resolved by similarity."
		);

		self.learn_alias(uow, &entity, &name, &name_norm, now).await;

		Ok(Resolution { entity_id: entity.entity_id, name: entity.name, path })
	}

	/// Resolves names one after another on the same unit of work. Blank names are skipped.
	pub async fn resolve_batch(
		&self,
		uow: &mut dyn UnitOfWork,
		raw_names: &[String],
	) -> Result<Vec<Resolution>> {
		let mut resolved = Vec::with_capacity(raw_names.len());

		for raw_name in raw_names {
			if clean_name(raw_name).is_none() {
				continue;
			}

			resolved.push(self.resolve(uow, raw_name).await?);
		}

		Ok(resolved)
	}

	async fn top_candidate(&self, name: &str) -> Option<IndexHit> {
		let query = IndexQuery { kind: self.kind.into(), text: name, company_id: None, top_k: 1 };

		match self.index.search(query).await {
			Ok(hits) => hits.into_iter().next(),
			Err(err) => {
				tracing::warn!(
					error = %err,
					kind = self.kind.as_str(),
					"Similarity search failed. Skipping fuzzy matching."
				);

				None
			},
		}
	}

	async fn create(
		&self,
		uow: &mut dyn UnitOfWork,
		name: &str,
		name_norm: &str,
		now: OffsetDateTime,
	) -> Result<Resolution> {
		let entity = uow.create_entity(self.kind, name, name_norm, now).await?;

		tracing::info!(kind = self.kind.as_str(), entity_id = %entity.entity_id, "Created entity.");

		self.index_text(entity.entity_id, &entity.name).await;

		Ok(Resolution {
			entity_id: entity.entity_id,
			name: entity.name,
			path: ResolutionPath::Created,
		})
	}

	async fn learn_alias(
		&self,
		uow: &mut dyn UnitOfWork,
		entity: &EntityRef,
		name: &str,
		name_norm: &str,
		now: OffsetDateTime,
	) {
		// The alias lookup already missed, so only the canonical spelling is known here. An index
		// point for this spelling may outlive a rolled-back alias row.
		if name_norm == normalize_name(&entity.name) {
			return;
		}

		match uow.learn_alias(self.kind, entity.entity_id, name, name_norm, now).await {
			Ok(()) => {
				tracing::info!(
					kind = self.kind.as_str(),
					entity_id = %entity.entity_id,
					alias = name,
					"Learned alias."
				);

				self.index_text(entity.entity_id, name).await;
			},
			Err(err) => tracing::warn!(
				error = %err,
				kind = self.kind.as_str(),
				entity_id = %entity.entity_id,
				"Failed to persist learned alias. Keeping the resolved entity."
			),
		}
	}

	async fn index_text(&self, entity_id: Uuid, text: &str) {
		let record = IndexRecord {
			kind: IndexKind::from(self.kind),
			entity_id,
			text: text.to_string(),
			company_id: None,
			job_post_id: None,
		};

		if let Err(err) = self.index.upsert(&record).await {
			tracing::warn!(
				error = %err,
				kind = self.kind.as_str(),
				entity_id = %entity_id,
				"Failed to index entity text."
			);
		}
	}
}
