use sqlx::{PgConnection, types::Json};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	error::conflict_on_unique,
	models::{
		Company, JobIndexSource, JobMaster, JobPost, JobPostingWithRelations, NewJobMaster,
		NewJobPost, PostingMatchRow,
	},
};

const POSTING_MATCH_SELECT: &str = "\
SELECT
	p.job_post_id,
	p.job_master_id,
	m.company_id,
	c.name AS company_name,
	m.title AS job_title,
	p.index_text
FROM job_posts p
JOIN job_masters m ON m.job_master_id = p.job_master_id
JOIN companies c ON c.company_id = m.company_id
WHERE p.deleted_at IS NULL
	AND m.deleted_at IS NULL
	AND c.deleted_at IS NULL";

pub async fn insert_job_master(
	executor: &mut PgConnection,
	master: &NewJobMaster<'_>,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO job_masters (
	job_master_id,
	company_id,
	title,
	main_tasks,
	summary,
	evaluation_criteria,
	status,
	start_date,
	end_date,
	last_seen_at,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10, $10)",
	)
	.bind(master.job_master_id)
	.bind(master.company_id)
	.bind(master.title)
	.bind(Json(master.main_tasks))
	.bind(master.summary)
	.bind(Json(master.evaluation_criteria))
	.bind(master.status)
	.bind(master.start_date)
	.bind(master.end_date)
	.bind(master.now)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

pub async fn link_skill(
	executor: &mut PgConnection,
	job_master_id: Uuid,
	skill_id: Uuid,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO job_master_skills (job_master_id, skill_id, created_at)
VALUES ($1, $2, $3)
ON CONFLICT (job_master_id, skill_id) DO NOTHING",
	)
	.bind(job_master_id)
	.bind(skill_id)
	.bind(now)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

pub async fn insert_job_post(executor: &mut PgConnection, post: &NewJobPost<'_>) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO job_posts (
	job_post_id,
	job_master_id,
	company_id,
	source_type,
	source_url,
	source_url_hash,
	fingerprint_hash,
	raw_company_name,
	raw_job_title,
	raw_fields,
	index_text,
	recruitment_status,
	registration_status,
	start_date,
	end_date,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)",
	)
	.bind(post.job_post_id)
	.bind(post.job_master_id)
	.bind(post.company_id)
	.bind(post.source_type)
	.bind(post.source_url)
	.bind(post.source_url_hash)
	.bind(post.fingerprint_hash)
	.bind(post.raw_company_name)
	.bind(post.raw_job_title)
	.bind(post.raw_fields)
	.bind(post.index_text)
	.bind(post.recruitment_status)
	.bind(post.registration_status)
	.bind(post.start_date)
	.bind(post.end_date)
	.bind(post.now)
	.execute(&mut *executor)
	.await
	.map_err(|err| {
		conflict_on_unique(err, || format!("Job post for {:?} already exists.", post.source_url))
	})?;

	Ok(())
}

pub async fn find_posting_by_url(
	executor: &mut PgConnection,
	source_url: &str,
) -> Result<Option<PostingMatchRow>> {
	let url_hash = jobmatch_domain::fingerprint::url_hash(source_url);
	let sql = format!(
		"{POSTING_MATCH_SELECT}
	AND p.source_url_hash = $1
	AND p.source_url = $2
LIMIT 1"
	);
	let row = sqlx::query_as::<_, PostingMatchRow>(&sql)
		.bind(url_hash)
		.bind(source_url)
		.fetch_optional(&mut *executor)
		.await?;

	Ok(row)
}

/// Oldest live posting carrying `fingerprint_hash`.
pub async fn find_posting_by_fingerprint(
	executor: &mut PgConnection,
	fingerprint_hash: &str,
) -> Result<Option<PostingMatchRow>> {
	let sql = format!(
		"{POSTING_MATCH_SELECT}
	AND p.fingerprint_hash = $1
ORDER BY p.created_at ASC, p.job_post_id ASC
LIMIT 1"
	);
	let row = sqlx::query_as::<_, PostingMatchRow>(&sql)
		.bind(fingerprint_hash)
		.fetch_optional(&mut *executor)
		.await?;

	Ok(row)
}

pub async fn get_job_master(
	executor: &mut PgConnection,
	job_master_id: Uuid,
) -> Result<Option<JobMaster>> {
	let row = sqlx::query_as::<_, JobMaster>(
		"\
SELECT
	job_master_id,
	company_id,
	title,
	main_tasks,
	summary,
	evaluation_criteria,
	status,
	start_date,
	end_date,
	last_seen_at,
	created_at,
	updated_at,
	deleted_at
FROM job_masters
WHERE job_master_id = $1
	AND deleted_at IS NULL",
	)
	.bind(job_master_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn touch_job_master(
	executor: &mut PgConnection,
	job_master_id: Uuid,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE job_masters
SET last_seen_at = $2, updated_at = $2
WHERE job_master_id = $1",
	)
	.bind(job_master_id)
	.bind(now)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

pub async fn get_job_post(
	executor: &mut PgConnection,
	job_post_id: Uuid,
) -> Result<Option<JobPost>> {
	let row = sqlx::query_as::<_, JobPost>(
		"\
SELECT
	job_post_id,
	job_master_id,
	company_id,
	source_type,
	source_url,
	source_url_hash,
	fingerprint_hash,
	raw_company_name,
	raw_job_title,
	raw_fields,
	index_text,
	recruitment_status,
	registration_status,
	start_date,
	end_date,
	created_at,
	updated_at,
	deleted_at
FROM job_posts
WHERE job_post_id = $1
	AND deleted_at IS NULL",
	)
	.bind(job_post_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn get_company(executor: &mut PgConnection, company_id: Uuid) -> Result<Option<Company>> {
	let row = sqlx::query_as::<_, Company>(
		"\
SELECT company_id, name, name_norm, domain, created_at, updated_at, deleted_at
FROM companies
WHERE company_id = $1",
	)
	.bind(company_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}

pub async fn list_skill_names(
	executor: &mut PgConnection,
	job_master_id: Uuid,
) -> Result<Vec<String>> {
	let rows: Vec<String> = sqlx::query_scalar(
		"\
SELECT s.name
FROM job_master_skills l
JOIN skills s ON s.skill_id = l.skill_id
WHERE l.job_master_id = $1
	AND s.deleted_at IS NULL
ORDER BY s.name",
	)
	.bind(job_master_id)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}

pub async fn load_posting(
	executor: &mut PgConnection,
	job_post_id: Uuid,
) -> Result<Option<JobPostingWithRelations>> {
	let Some(job_post) = get_job_post(&mut *executor, job_post_id).await? else {
		return Ok(None);
	};
	let Some(job_master) = get_job_master(&mut *executor, job_post.job_master_id).await? else {
		return Ok(None);
	};
	let Some(company) = get_company(&mut *executor, job_master.company_id).await? else {
		return Ok(None);
	};
	let skills = list_skill_names(&mut *executor, job_master.job_master_id).await?;

	Ok(Some(JobPostingWithRelations { job_post, job_master, company, skills }))
}

/// Removes a job post and returns its master id, or `None` when no such post exists.
pub async fn delete_job_post(
	executor: &mut PgConnection,
	job_post_id: Uuid,
) -> Result<Option<Uuid>> {
	let job_master_id: Option<Uuid> = sqlx::query_scalar(
		"\
DELETE FROM job_posts
WHERE job_post_id = $1
RETURNING job_master_id",
	)
	.bind(job_post_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(job_master_id)
}

pub async fn count_job_posts(executor: &mut PgConnection, job_master_id: Uuid) -> Result<i64> {
	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM job_posts WHERE job_master_id = $1")
		.bind(job_master_id)
		.fetch_one(&mut *executor)
		.await?;

	Ok(count)
}

/// Deletes a job master. Posts and skill links go with it through `ON DELETE CASCADE`.
pub async fn delete_job_master(executor: &mut PgConnection, job_master_id: Uuid) -> Result<bool> {
	let result = sqlx::query("DELETE FROM job_masters WHERE job_master_id = $1")
		.bind(job_master_id)
		.execute(&mut *executor)
		.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn list_job_index_sources(executor: &mut PgConnection) -> Result<Vec<JobIndexSource>> {
	let rows = sqlx::query_as::<_, JobIndexSource>(
		"\
SELECT p.job_post_id, p.job_master_id, m.company_id, p.index_text
FROM job_posts p
JOIN job_masters m ON m.job_master_id = p.job_master_id
WHERE p.deleted_at IS NULL
	AND m.deleted_at IS NULL
ORDER BY p.created_at ASC, p.job_post_id ASC",
	)
	.fetch_all(&mut *executor)
	.await?;

	Ok(rows)
}
