//! Creates or links job records for one posting inside the caller's unit of work.
//!
//! Index writes are returned as pending records and flushed after the commit, so the relational
//! store never waits on the index.

use std::collections::HashSet;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, IndexRecord, Result, SimilarityIndex, UnitOfWork,
	normalizer::{EntityNormalizer, Resolution},
	store::{NewJobMasterRecord, NewJobPostRecord},
};
use jobmatch_domain::{fingerprint, kind::IndexKind, posting::ExtractedPosting};

const SOURCE_TYPE: &str = "crawler";
const MASTER_STATUS_OPEN: &str = "Open";
const RECRUITMENT_OPEN: &str = "Open";
const REGISTRATION_ACTIVE: &str = "Active";

/// Resolved entities plus the posting rewritten to their canonical names.
#[derive(Clone, Debug)]
pub struct EnsuredEntities {
	pub company: Resolution,
	pub skills: Vec<Resolution>,
	/// Distinct skill ids in first-seen order.
	pub skill_ids: Vec<Uuid>,
	pub posting: ExtractedPosting,
}

/// One observation of a posting as it is about to be stored.
#[derive(Clone, Copy, Debug)]
pub struct PostingSource<'a> {
	pub source_url: &'a str,
	/// Fields exactly as extracted; the fingerprint is taken from these.
	pub raw: &'a ExtractedPosting,
	/// Content with canonical entity names; this is what gets indexed.
	pub index_text: &'a str,
}

#[derive(Clone, Debug)]
pub struct Registered {
	pub job_master_id: Uuid,
	pub job_post_id: Uuid,
	/// Index record for this observation, to be written once the unit of work commits.
	pub pending_index: IndexRecord,
}

pub struct JobRegistration<'a> {
	companies: EntityNormalizer<'a>,
	skills: EntityNormalizer<'a>,
}
impl<'a> JobRegistration<'a> {
	pub fn new(companies: EntityNormalizer<'a>, skills: EntityNormalizer<'a>) -> Self {
		Self { companies, skills }
	}

	pub async fn ensure_entities(
		&self,
		uow: &mut dyn UnitOfWork,
		posting: &ExtractedPosting,
	) -> Result<EnsuredEntities> {
		let company = self.companies.resolve(uow, &posting.company_name).await?;
		let skills = self.skills.resolve_batch(uow, &posting.tech_stacks).await?;
		let mut seen = HashSet::new();
		let mut skill_ids = Vec::new();
		let mut skill_names = Vec::new();

		for skill in &skills {
			if seen.insert(skill.entity_id) {
				skill_ids.push(skill.entity_id);
				skill_names.push(skill.name.clone());
			}
		}

		let mut canonical = posting.clone();

		canonical.company_name = company.name.clone();
		canonical.tech_stacks = skill_names;

		Ok(EnsuredEntities { company, skills, skill_ids, posting: canonical })
	}

	pub async fn register_new(
		&self,
		uow: &mut dyn UnitOfWork,
		ensured: &EnsuredEntities,
		source_url: &str,
		raw: &ExtractedPosting,
	) -> Result<Registered> {
		let now = OffsetDateTime::now_utc();
		let canonical = &ensured.posting;
		let company_id = ensured.company.entity_id;
		let master = NewJobMasterRecord {
			job_master_id: Uuid::new_v4(),
			company_id,
			title: canonical.job_title.trim().to_string(),
			main_tasks: canonical.main_tasks.clone(),
			summary: canonical.summary.clone(),
			evaluation_criteria: canonical.evaluation_criteria.clone(),
			status: MASTER_STATUS_OPEN.to_string(),
			start_date: canonical.start_date(),
			end_date: canonical.end_date(),
			now,
		};

		uow.create_job_master(&master).await?;

		for skill_id in &ensured.skill_ids {
			uow.link_skill(master.job_master_id, *skill_id, now).await?;
		}

		let index_text = canonical.index_text();
		let source = PostingSource { source_url, raw, index_text: &index_text };
		let registered = create_post(uow, master.job_master_id, company_id, source, now).await?;

		tracing::info!(
			job_master_id = %registered.job_master_id,
			job_post_id = %registered.job_post_id,
			skills = ensured.skill_ids.len(),
			"Registered new job."
		);

		Ok(registered)
	}

	/// Adds an observation under an existing master and refreshes its `last_seen_at`.
	pub async fn link_existing(
		&self,
		uow: &mut dyn UnitOfWork,
		job_master_id: Uuid,
		source: PostingSource<'_>,
	) -> Result<Registered> {
		let Some(master) = uow.get_job_master(job_master_id).await? else {
			return Err(Error::NotFound { message: format!("Job master {job_master_id}.") });
		};
		let now = OffsetDateTime::now_utc();
		let registered =
			create_post(uow, master.job_master_id, master.company_id, source, now).await?;

		uow.touch_job_master(master.job_master_id, now).await?;

		tracing::info!(
			job_master_id = %registered.job_master_id,
			job_post_id = %registered.job_post_id,
			"Linked posting to existing job."
		);

		Ok(registered)
	}
}

/// Best-effort write of a pending job record. The relational store stays authoritative.
pub async fn flush_index(index: &dyn SimilarityIndex, record: &IndexRecord) {
	if let Err(err) = index.upsert(record).await {
		tracing::warn!(
			error = %err,
			job_master_id = %record.entity_id,
			"Failed to index job posting. A rebuild will restore it."
		);
	}
}

async fn create_post(
	uow: &mut dyn UnitOfWork,
	job_master_id: Uuid,
	company_id: Uuid,
	source: PostingSource<'_>,
	now: OffsetDateTime,
) -> Result<Registered> {
	let PostingSource { source_url, raw, index_text } = source;
	let raw_fields = serde_json::to_value(raw).map_err(|err| Error::InvalidInput {
		message: format!("Posting fields are not serializable: {err}"),
	})?;
	let post = NewJobPostRecord {
		job_post_id: Uuid::new_v4(),
		job_master_id,
		company_id,
		source_type: SOURCE_TYPE.to_string(),
		source_url: source_url.to_string(),
		source_url_hash: fingerprint::url_hash(source_url),
		fingerprint_hash: raw.fingerprint(),
		raw_company_name: raw.company_name.clone(),
		raw_job_title: raw.job_title.clone(),
		raw_fields,
		index_text: index_text.to_string(),
		recruitment_status: RECRUITMENT_OPEN.to_string(),
		registration_status: REGISTRATION_ACTIVE.to_string(),
		start_date: raw.start_date(),
		end_date: raw.end_date(),
		now,
	};

	uow.create_job_post(&post).await?;

	Ok(Registered {
		job_master_id,
		job_post_id: post.job_post_id,
		pending_index: IndexRecord {
			kind: IndexKind::Job,
			entity_id: job_master_id,
			text: index_text.to_string(),
			company_id: Some(company_id),
			job_post_id: Some(post.job_post_id),
		},
	})
}
