use serde_json::Value;
use sqlx::types::Json;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use jobmatch_domain::posting::EvaluationCriteriaItem;

/// Id and canonical name of a company or skill.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct EntityRow {
	pub entity_id: Uuid,
	pub name: String,
}

#[derive(Debug, sqlx::FromRow)]
pub struct Company {
	pub company_id: Uuid,
	pub name: String,
	pub name_norm: String,
	pub domain: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct EntityAlias {
	pub alias_id: Uuid,
	pub owner_id: Uuid,
	pub alias: String,
	pub alias_norm: String,
	pub source: String,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct JobMaster {
	pub job_master_id: Uuid,
	pub company_id: Uuid,
	pub title: String,
	pub main_tasks: Json<Vec<String>>,
	pub summary: Option<String>,
	pub evaluation_criteria: Json<Vec<EvaluationCriteriaItem>>,
	pub status: String,
	pub start_date: Option<Date>,
	pub end_date: Option<Date>,
	pub last_seen_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct JobPost {
	pub job_post_id: Uuid,
	pub job_master_id: Uuid,
	pub company_id: Uuid,
	pub source_type: String,
	pub source_url: String,
	pub source_url_hash: String,
	pub fingerprint_hash: String,
	pub raw_company_name: String,
	pub raw_job_title: String,
	pub raw_fields: Value,
	pub index_text: String,
	pub recruitment_status: String,
	pub registration_status: String,
	pub start_date: Option<Date>,
	pub end_date: Option<Date>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}

/// Slim join of a job post with its live master and company, used by duplicate lookups.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct PostingMatchRow {
	pub job_post_id: Uuid,
	pub job_master_id: Uuid,
	pub company_id: Uuid,
	pub company_name: String,
	pub job_title: String,
	pub index_text: String,
}

#[derive(Debug)]
pub struct JobPostingWithRelations {
	pub job_post: JobPost,
	pub job_master: JobMaster,
	pub company: Company,
	pub skills: Vec<String>,
}

/// Index source row for a job post: its canonical content plus owning ids.
#[derive(Debug, sqlx::FromRow)]
pub struct JobIndexSource {
	pub job_post_id: Uuid,
	pub job_master_id: Uuid,
	pub company_id: Uuid,
	pub index_text: String,
}

pub struct NewJobMaster<'a> {
	pub job_master_id: Uuid,
	pub company_id: Uuid,
	pub title: &'a str,
	pub main_tasks: &'a [String],
	pub summary: Option<&'a str>,
	pub evaluation_criteria: &'a [EvaluationCriteriaItem],
	pub status: &'a str,
	pub start_date: Option<Date>,
	pub end_date: Option<Date>,
	pub now: OffsetDateTime,
}

pub struct NewJobPost<'a> {
	pub job_post_id: Uuid,
	pub job_master_id: Uuid,
	pub company_id: Uuid,
	pub source_type: &'a str,
	pub source_url: &'a str,
	pub source_url_hash: &'a str,
	pub fingerprint_hash: &'a str,
	pub raw_company_name: &'a str,
	pub raw_job_title: &'a str,
	pub raw_fields: &'a Value,
	pub index_text: &'a str,
	pub recruitment_status: &'a str,
	pub registration_status: &'a str,
	pub start_date: Option<Date>,
	pub end_date: Option<Date>,
	pub now: OffsetDateTime,
}
