//! Posting-to-job matching, cheapest check first.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
	IndexHit, IndexQuery, Result, SimilarityIndex, UnitOfWork, arbitration::Arbitration,
	store::PostingMatch,
};
use jobmatch_config::Thresholds;
use jobmatch_domain::{
	kind::IndexKind,
	posting::ExtractedPosting,
	tier::{self, MatchTier},
};

/// Which check linked a posting to an existing job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchVia {
	Url,
	Fingerprint,
	Semantic,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SemanticMatch {
	pub job_master_id: Uuid,
	pub score: f32,
	pub arbitrated: bool,
}

pub struct DuplicateChecker<'a> {
	thresholds: Thresholds,
	index: &'a dyn SimilarityIndex,
	arbitration: Arbitration<'a>,
}
impl<'a> DuplicateChecker<'a> {
	pub fn new(
		thresholds: Thresholds,
		index: &'a dyn SimilarityIndex,
		arbitration: Arbitration<'a>,
	) -> Self {
		Self { thresholds, index, arbitration }
	}

	pub async fn check_url(
		&self,
		uow: &mut dyn UnitOfWork,
		source_url: &str,
	) -> Result<Option<PostingMatch>> {
		let found = uow.find_posting_by_url(source_url).await?;

		if let Some(found) = &found {
			tracing::debug!(job_master_id = %found.job_master_id, "Posting URL already known.");
		}

		Ok(found)
	}

	/// Oldest post with the same content fingerprint.
	pub async fn check_fingerprint(
		&self,
		uow: &mut dyn UnitOfWork,
		fingerprint_hash: &str,
	) -> Result<Option<PostingMatch>> {
		let found = uow.find_posting_by_fingerprint(fingerprint_hash).await?;

		if let Some(found) = &found {
			tracing::debug!(job_master_id = %found.job_master_id, "Posting fingerprint matched.");
		}

		Ok(found)
	}

	/// Nearest indexed job of the same company.
	///
	/// `company_id` is `None` for a company created in this pass, which cannot own duplicates.
	/// Index failures degrade to "no match".
	pub async fn check_semantic(
		&self,
		uow: &mut dyn UnitOfWork,
		company_id: Option<Uuid>,
		posting: &ExtractedPosting,
	) -> Result<Option<SemanticMatch>> {
		let Some(company_id) = company_id else {
			return Ok(None);
		};
		let query_text = posting.index_text();
		let query = IndexQuery {
			kind: IndexKind::Job,
			text: &query_text,
			company_id: Some(company_id),
			top_k: 1,
		};
		let hit = match self.index.search(query).await {
			Ok(hits) => hits.into_iter().next(),
			Err(err) => {
				tracing::warn!(
					error = %err,
					company_id = %company_id,
					"Job similarity search failed. Treating the posting as new."
				);

				None
			},
		};
		let Some(hit) = hit else {
			return Ok(None);
		};
		let tier = tier::classify(hit.score, &self.thresholds);

		tracing::debug!(score = hit.score, ?tier, "Nearest job candidate.");

		if tier == MatchTier::Low {
			return Ok(None);
		}

		let Some(master) = uow.get_job_master(hit.entity_id).await? else {
			tracing::warn!(
				job_master_id = %hit.entity_id,
				"Index returned a job missing from the store. Treating the posting as new."
			);

			return Ok(None);
		};

		if master.company_id != company_id {
			tracing::warn!(
				job_master_id = %master.job_master_id,
				"Index returned a job owned by another company. Treating the posting as new."
			);

			return Ok(None);
		}
		if tier == MatchTier::High {
			return Ok(Some(SemanticMatch {
				job_master_id: master.job_master_id,
				score: hit.score,
				arbitrated: false,
			}));
		}

		let same = self
			.arbitration
			.is_same(IndexKind::Job, &posting.arbitration_summary(), &stored_summary(&hit))
			.await;

		Ok(same.then_some(SemanticMatch {
			job_master_id: master.job_master_id,
			score: hit.score,
			arbitrated: true,
		}))
	}
}

/// Arbitration view of an indexed job: its summary when the text is a posting record, else the
/// raw text.
fn stored_summary(hit: &IndexHit) -> String {
	match serde_json::from_str::<ExtractedPosting>(&hit.text) {
		Ok(posting) => posting.arbitration_summary(),
		Err(_) => hit.text.clone(),
	}
}
