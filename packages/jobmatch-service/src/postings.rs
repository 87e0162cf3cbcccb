use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, JobMatchService, Result};
use jobmatch_domain::{kind::IndexKind, posting::EvaluationCriteriaItem};

/// A stored job post with its master, company and linked skills.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobPostingView {
	pub job_post_id: Uuid,
	pub job_master_id: Uuid,
	pub company_id: Uuid,
	pub company_name: String,
	pub title: String,
	pub main_tasks: Vec<String>,
	pub summary: Option<String>,
	pub evaluation_criteria: Vec<EvaluationCriteriaItem>,
	pub skills: Vec<String>,
	pub status: String,
	pub source_url: String,
	pub fingerprint_hash: String,
	pub raw_fields: Value,
	pub recruitment_status: String,
	pub registration_status: String,
	/// ISO `YYYY-MM-DD`.
	pub start_date: Option<String>,
	/// ISO `YYYY-MM-DD`.
	pub end_date: Option<String>,
	#[serde(with = "time::serde::rfc3339")]
	pub last_seen_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResponse {
	pub job_post_id: Uuid,
	pub job_master_id: Uuid,
	/// True when the post was the master's last observation and the master went with it.
	pub job_master_deleted: bool,
}

impl JobMatchService {
	pub async fn get_job_posting(&self, job_post_id: Uuid) -> Result<JobPostingView> {
		let mut uow = self.store.begin().await?;
		let loaded = uow.load_posting(job_post_id).await;

		uow.rollback().await?;

		loaded?.ok_or_else(|| Error::NotFound { message: format!("Job post {job_post_id}.") })
	}

	pub async fn delete_job_post(&self, job_post_id: Uuid) -> Result<DeleteResponse> {
		let mut uow = self.store.begin().await?;
		let Some(job_master_id) = uow.delete_job_post(job_post_id).await? else {
			uow.rollback().await?;

			return Err(Error::NotFound { message: format!("Job post {job_post_id}.") });
		};
		let remaining = uow.count_job_posts(job_master_id).await?;
		let job_master_deleted =
			if remaining == 0 { uow.delete_job_master(job_master_id).await? } else { false };

		uow.commit().await?;

		let removed = if job_master_deleted {
			self.index.remove(IndexKind::Job, job_master_id).await
		} else {
			self.index.remove_job_post(job_post_id).await
		};

		if let Err(err) = removed {
			tracing::warn!(
				error = %err,
				job_post_id = %job_post_id,
				job_master_id = %job_master_id,
				"Failed to remove deleted job content from the index."
			);
		}

		tracing::info!(
			job_post_id = %job_post_id,
			job_master_id = %job_master_id,
			job_master_deleted,
			"Deleted job post."
		);

		Ok(DeleteResponse { job_post_id, job_master_id, job_master_deleted })
	}
}
