use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
	DuplicateChecker, EntityNormalizer, Error, IndexRecord, JobMatchService, JobRegistration,
	MatchVia, PostingSource, Result, UnitOfWork, arbitration::Arbitration,
	registration::{self, EnsuredEntities},
};
use jobmatch_domain::{kind::EntityKind, posting::ExtractedPosting};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestRequest {
	pub source_url: String,
	pub posting: ExtractedPosting,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
	pub job_master_id: Uuid,
	pub job_post_id: Uuid,
	/// True when the posting landed on a job that already existed.
	pub is_existing: bool,
	pub matched_by: Option<MatchVia>,
}

enum Outcome {
	/// Nothing was written; the unit of work is rolled back.
	Unchanged(IngestResponse),
	Written { response: IngestResponse, pending_index: Option<IndexRecord> },
}

impl JobMatchService {
	pub fn company_normalizer(&self) -> EntityNormalizer<'_> {
		EntityNormalizer::new(
			EntityKind::Company,
			self.cfg.resolution.company,
			self.index.as_ref(),
			self.arbitration(),
		)
	}

	pub fn skill_normalizer(&self) -> EntityNormalizer<'_> {
		EntityNormalizer::new(
			EntityKind::Skill,
			self.cfg.resolution.skill,
			self.index.as_ref(),
			self.arbitration(),
		)
	}

	pub fn duplicate_checker(&self) -> DuplicateChecker<'_> {
		DuplicateChecker::new(self.cfg.resolution.job, self.index.as_ref(), self.arbitration())
	}

	pub fn registration(&self) -> JobRegistration<'_> {
		JobRegistration::new(self.company_normalizer(), self.skill_normalizer())
	}

	/// Resolves one extracted posting to a job, creating records only when nothing matches.
	///
	/// All relational writes share one unit of work that commits once. The job index record is
	/// written after the commit and never fails the call.
	pub async fn ingest(&self, req: IngestRequest) -> Result<IngestResponse> {
		let source_url = req.source_url.trim();

		if source_url.is_empty() {
			return Err(Error::InvalidInput {
				message: "source_url must be non-empty.".to_string(),
			});
		}

		req.posting.validate()?;

		let mut uow = self.store.begin().await?;
		let outcome = self.ingest_in(uow.as_mut(), source_url, &req.posting).await;

		match outcome {
			Ok(Outcome::Unchanged(response)) => {
				uow.rollback().await?;

				Ok(response)
			},
			Ok(Outcome::Written { response, pending_index }) => {
				uow.commit().await?;

				if let Some(record) = pending_index {
					registration::flush_index(self.index.as_ref(), &record).await;
				}

				Ok(response)
			},
			Err(err) => {
				if let Err(rollback_err) = uow.rollback().await {
					tracing::warn!(error = %rollback_err, "Failed to roll back ingestion.");
				}

				Err(err)
			},
		}
	}

	/// Runs the extractor on raw page text, then ingests the result.
	pub async fn ingest_text(&self, source_url: &str, raw_text: &str) -> Result<IngestResponse> {
		if raw_text.trim().is_empty() {
			return Err(Error::InvalidInput { message: "raw_text must be non-empty.".to_string() });
		}

		let posting = self
			.providers
			.extractor
			.extract(&self.cfg.providers.extractor, raw_text)
			.await
			.map_err(|err| Error::Extraction { message: err.to_string() })?;

		self.ingest(IngestRequest { source_url: source_url.to_string(), posting }).await
	}

	fn arbitration(&self) -> Arbitration<'_> {
		Arbitration::new(self.providers.arbiter.as_ref(), &self.cfg.providers.arbiter)
	}

	async fn ingest_in(
		&self,
		uow: &mut dyn UnitOfWork,
		source_url: &str,
		posting: &ExtractedPosting,
	) -> Result<Outcome> {
		let checker = self.duplicate_checker();
		let registration = self.registration();

		if let Some(found) = checker.check_url(uow, source_url).await? {
			return Ok(Outcome::Unchanged(IngestResponse {
				job_master_id: found.job_master_id,
				job_post_id: found.job_post_id,
				is_existing: true,
				matched_by: Some(MatchVia::Url),
			}));
		}
		if let Some(found) = checker.check_fingerprint(uow, &posting.fingerprint()).await? {
			// The matched post already carries the canonical content, and it is indexed.
			let source =
				PostingSource { source_url, raw: posting, index_text: &found.index_text };
			let linked = registration.link_existing(uow, found.job_master_id, source).await?;

			return Ok(Outcome::Written {
				response: existing(linked.job_master_id, linked.job_post_id, MatchVia::Fingerprint),
				pending_index: None,
			});
		}

		let ensured = registration.ensure_entities(uow, posting).await?;
		let EnsuredEntities { company, posting: canonical, .. } = &ensured;
		let company_id = (!company.is_created()).then_some(company.entity_id);

		if let Some(found) = checker.check_semantic(uow, company_id, canonical).await? {
			let index_text = canonical.index_text();
			let source = PostingSource { source_url, raw: posting, index_text: &index_text };
			let linked = registration.link_existing(uow, found.job_master_id, source).await?;

			return Ok(Outcome::Written {
				response: existing(linked.job_master_id, linked.job_post_id, MatchVia::Semantic),
				pending_index: Some(linked.pending_index),
			});
		}

		let registered = registration.register_new(uow, &ensured, source_url, posting).await?;

		Ok(Outcome::Written {
			response: IngestResponse {
				job_master_id: registered.job_master_id,
				job_post_id: registered.job_post_id,
				is_existing: false,
				matched_by: None,
			},
			pending_index: Some(registered.pending_index),
		})
	}
}

fn existing(job_master_id: Uuid, job_post_id: Uuid, via: MatchVia) -> IngestResponse {
	IngestResponse { job_master_id, job_post_id, is_existing: true, matched_by: Some(via) }
}
