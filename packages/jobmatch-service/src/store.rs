//! Relational store seam: one unit of work per posting, backed by a Postgres transaction.

use serde_json::Value;
use sqlx::{Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{BoxFuture, Error, IndexRecord, JobPostingView, Result};
use jobmatch_domain::{
	kind::{EntityKind, IndexKind},
	posting::EvaluationCriteriaItem,
};
use jobmatch_storage::{
	db::Db,
	entities, jobs,
	models::{EntityRow, JobPostingWithRelations, NewJobMaster, NewJobPost, PostingMatchRow},
};

const LEARNED_ALIAS_SOURCE: &str = "learned";

pub trait Store
where
	Self: Send + Sync,
{
	fn begin(&self) -> BoxFuture<'_, Result<Box<dyn UnitOfWork>>>;

	fn ensure_schema(&self) -> BoxFuture<'_, Result<()>>;
}

/// Every read and write for one posting goes through a single unit of work.
///
/// Calls are awaited one at a time; the underlying connection accepts one statement in flight.
pub trait UnitOfWork
where
	Self: Send,
{
	/// Canonical name first, then learned aliases. Soft-deleted entities never match.
	fn find_entity_by_alias<'a>(
		&'a mut self,
		kind: EntityKind,
		alias_norm: &'a str,
	) -> BoxFuture<'a, Result<Option<EntityRef>>>;

	fn get_entity<'a>(
		&'a mut self,
		kind: EntityKind,
		entity_id: Uuid,
	) -> BoxFuture<'a, Result<Option<EntityRef>>>;

	/// Returns the existing live row when another writer created the same `name_norm` first.
	fn create_entity<'a>(
		&'a mut self,
		kind: EntityKind,
		name: &'a str,
		name_norm: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<EntityRef>>;

	/// Savepoint-scoped: a failure here leaves the rest of the unit of work usable.
	fn learn_alias<'a>(
		&'a mut self,
		kind: EntityKind,
		owner_id: Uuid,
		alias: &'a str,
		alias_norm: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>>;

	fn find_posting_by_url<'a>(
		&'a mut self,
		source_url: &'a str,
	) -> BoxFuture<'a, Result<Option<PostingMatch>>>;

	fn find_posting_by_fingerprint<'a>(
		&'a mut self,
		fingerprint_hash: &'a str,
	) -> BoxFuture<'a, Result<Option<PostingMatch>>>;

	fn get_job_master(
		&mut self,
		job_master_id: Uuid,
	) -> BoxFuture<'_, Result<Option<JobMasterRef>>>;

	fn create_job_master<'a>(
		&'a mut self,
		master: &'a NewJobMasterRecord,
	) -> BoxFuture<'a, Result<()>>;

	fn link_skill(
		&mut self,
		job_master_id: Uuid,
		skill_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'_, Result<()>>;

	fn create_job_post<'a>(&'a mut self, post: &'a NewJobPostRecord) -> BoxFuture<'a, Result<()>>;

	fn touch_job_master(
		&mut self,
		job_master_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'_, Result<()>>;

	fn load_posting(&mut self, job_post_id: Uuid) -> BoxFuture<'_, Result<Option<JobPostingView>>>;

	/// Returns the owning master of the removed post.
	fn delete_job_post(&mut self, job_post_id: Uuid) -> BoxFuture<'_, Result<Option<Uuid>>>;

	fn count_job_posts(&mut self, job_master_id: Uuid) -> BoxFuture<'_, Result<i64>>;

	fn delete_job_master(&mut self, job_master_id: Uuid) -> BoxFuture<'_, Result<bool>>;

	/// Canonical names and aliases of every live entity, one row per text.
	fn list_entity_texts(&mut self, kind: EntityKind) -> BoxFuture<'_, Result<Vec<EntityRef>>>;

	/// Index records for every live job post.
	fn list_job_records(&mut self) -> BoxFuture<'_, Result<Vec<IndexRecord>>>;

	fn commit(self: Box<Self>) -> BoxFuture<'static, Result<()>>;

	fn rollback(self: Box<Self>) -> BoxFuture<'static, Result<()>>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityRef {
	pub entity_id: Uuid,
	pub name: String,
}
impl From<EntityRow> for EntityRef {
	fn from(row: EntityRow) -> Self {
		Self { entity_id: row.entity_id, name: row.name }
	}
}

/// An existing post together with its master and company.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostingMatch {
	pub job_post_id: Uuid,
	pub job_master_id: Uuid,
	pub company_id: Uuid,
	pub company_name: String,
	pub job_title: String,
	/// Canonical content stored for the post.
	pub index_text: String,
}
impl From<PostingMatchRow> for PostingMatch {
	fn from(row: PostingMatchRow) -> Self {
		Self {
			job_post_id: row.job_post_id,
			job_master_id: row.job_master_id,
			company_id: row.company_id,
			company_name: row.company_name,
			job_title: row.job_title,
			index_text: row.index_text,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobMasterRef {
	pub job_master_id: Uuid,
	pub company_id: Uuid,
	pub title: String,
}

#[derive(Clone, Debug)]
pub struct NewJobMasterRecord {
	pub job_master_id: Uuid,
	pub company_id: Uuid,
	pub title: String,
	pub main_tasks: Vec<String>,
	pub summary: Option<String>,
	pub evaluation_criteria: Vec<EvaluationCriteriaItem>,
	pub status: String,
	pub start_date: Option<Date>,
	pub end_date: Option<Date>,
	pub now: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct NewJobPostRecord {
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
	pub now: OffsetDateTime,
}

pub struct PgStore {
	db: Db,
}
impl PgStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}

impl Store for PgStore {
	fn begin(&self) -> BoxFuture<'_, Result<Box<dyn UnitOfWork>>> {
		Box::pin(async move {
			let tx = self.db.pool.begin().await?;

			Ok(Box::new(PgUnitOfWork { tx }) as Box<dyn UnitOfWork>)
		})
	}

	fn ensure_schema(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(self.db.ensure_schema().await?) })
	}
}

struct PgUnitOfWork {
	tx: Transaction<'static, Postgres>,
}
impl UnitOfWork for PgUnitOfWork {
	fn find_entity_by_alias<'a>(
		&'a mut self,
		kind: EntityKind,
		alias_norm: &'a str,
	) -> BoxFuture<'a, Result<Option<EntityRef>>> {
		Box::pin(async move {
			let row = entities::find_by_alias(&mut *self.tx, kind, alias_norm).await?;

			Ok(row.map(EntityRef::from))
		})
	}

	fn get_entity<'a>(
		&'a mut self,
		kind: EntityKind,
		entity_id: Uuid,
	) -> BoxFuture<'a, Result<Option<EntityRef>>> {
		Box::pin(async move {
			let row = entities::get_by_id(&mut *self.tx, kind, entity_id).await?;

			Ok(row.map(EntityRef::from))
		})
	}

	fn create_entity<'a>(
		&'a mut self,
		kind: EntityKind,
		name: &'a str,
		name_norm: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<EntityRef>> {
		Box::pin(async move {
			let row = entities::insert(&mut *self.tx, kind, name, name_norm, now).await?;

			Ok(row.into())
		})
	}

	fn learn_alias<'a>(
		&'a mut self,
		kind: EntityKind,
		owner_id: Uuid,
		alias: &'a str,
		alias_norm: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut savepoint = sqlx::Acquire::begin(&mut self.tx).await?;
			let inserted = entities::insert_alias(
				&mut *savepoint,
				kind,
				owner_id,
				alias,
				alias_norm,
				LEARNED_ALIAS_SOURCE,
				now,
			)
			.await;

			match inserted {
				Ok(_) => {
					savepoint.commit().await?;

					Ok(())
				},
				Err(err) => {
					savepoint.rollback().await?;

					Err(err.into())
				},
			}
		})
	}

	fn find_posting_by_url<'a>(
		&'a mut self,
		source_url: &'a str,
	) -> BoxFuture<'a, Result<Option<PostingMatch>>> {
		Box::pin(async move {
			let row = jobs::find_posting_by_url(&mut *self.tx, source_url).await?;

			Ok(row.map(PostingMatch::from))
		})
	}

	fn find_posting_by_fingerprint<'a>(
		&'a mut self,
		fingerprint_hash: &'a str,
	) -> BoxFuture<'a, Result<Option<PostingMatch>>> {
		Box::pin(async move {
			let row = jobs::find_posting_by_fingerprint(&mut *self.tx, fingerprint_hash).await?;

			Ok(row.map(PostingMatch::from))
		})
	}

	fn get_job_master(
		&mut self,
		job_master_id: Uuid,
	) -> BoxFuture<'_, Result<Option<JobMasterRef>>> {
		Box::pin(async move {
			let master = jobs::get_job_master(&mut *self.tx, job_master_id).await?;

			Ok(master.map(|master| JobMasterRef {
				job_master_id: master.job_master_id,
				company_id: master.company_id,
				title: master.title,
			}))
		})
	}

	fn create_job_master<'a>(
		&'a mut self,
		master: &'a NewJobMasterRecord,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let row = NewJobMaster {
				job_master_id: master.job_master_id,
				company_id: master.company_id,
				title: &master.title,
				main_tasks: &master.main_tasks,
				summary: master.summary.as_deref(),
				evaluation_criteria: &master.evaluation_criteria,
				status: &master.status,
				start_date: master.start_date,
				end_date: master.end_date,
				now: master.now,
			};

			Ok(jobs::insert_job_master(&mut *self.tx, &row).await?)
		})
	}

	fn link_skill(
		&mut self,
		job_master_id: Uuid,
		skill_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			Ok(jobs::link_skill(&mut *self.tx, job_master_id, skill_id, now).await?)
		})
	}

	fn create_job_post<'a>(&'a mut self, post: &'a NewJobPostRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let row = NewJobPost {
				job_post_id: post.job_post_id,
				job_master_id: post.job_master_id,
				company_id: post.company_id,
				source_type: &post.source_type,
				source_url: &post.source_url,
				source_url_hash: &post.source_url_hash,
				fingerprint_hash: &post.fingerprint_hash,
				raw_company_name: &post.raw_company_name,
				raw_job_title: &post.raw_job_title,
				raw_fields: &post.raw_fields,
				index_text: &post.index_text,
				recruitment_status: &post.recruitment_status,
				registration_status: &post.registration_status,
				start_date: post.start_date,
				end_date: post.end_date,
				now: post.now,
			};

			Ok(jobs::insert_job_post(&mut *self.tx, &row).await?)
		})
	}

	fn touch_job_master(
		&mut self,
		job_master_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			Ok(jobs::touch_job_master(&mut *self.tx, job_master_id, now).await?)
		})
	}

	fn load_posting(&mut self, job_post_id: Uuid) -> BoxFuture<'_, Result<Option<JobPostingView>>> {
		Box::pin(async move {
			let posting = jobs::load_posting(&mut *self.tx, job_post_id).await?;

			Ok(posting.map(posting_view))
		})
	}

	fn delete_job_post(&mut self, job_post_id: Uuid) -> BoxFuture<'_, Result<Option<Uuid>>> {
		Box::pin(async move { Ok(jobs::delete_job_post(&mut *self.tx, job_post_id).await?) })
	}

	fn count_job_posts(&mut self, job_master_id: Uuid) -> BoxFuture<'_, Result<i64>> {
		Box::pin(async move { Ok(jobs::count_job_posts(&mut *self.tx, job_master_id).await?) })
	}

	fn delete_job_master(&mut self, job_master_id: Uuid) -> BoxFuture<'_, Result<bool>> {
		Box::pin(async move {
			Ok(jobs::delete_job_master(&mut *self.tx, job_master_id).await?)
		})
	}

	fn list_entity_texts(&mut self, kind: EntityKind) -> BoxFuture<'_, Result<Vec<EntityRef>>> {
		Box::pin(async move {
			let rows = entities::list_index_texts(&mut *self.tx, kind).await?;

			Ok(rows.into_iter().map(EntityRef::from).collect())
		})
	}

	fn list_job_records(&mut self) -> BoxFuture<'_, Result<Vec<IndexRecord>>> {
		Box::pin(async move {
			let rows = jobs::list_job_index_sources(&mut *self.tx).await?;

			Ok(rows
				.into_iter()
				.map(|row| IndexRecord {
					kind: IndexKind::Job,
					entity_id: row.job_master_id,
					text: row.index_text,
					company_id: Some(row.company_id),
					job_post_id: Some(row.job_post_id),
				})
				.collect())
		})
	}

	fn commit(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
		Box::pin(async move { self.tx.commit().await.map_err(Error::from) })
	}

	fn rollback(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
		Box::pin(async move { self.tx.rollback().await.map_err(Error::from) })
	}
}

fn posting_view(posting: JobPostingWithRelations) -> JobPostingView {
	let JobPostingWithRelations { job_post, job_master, company, skills } = posting;

	JobPostingView {
		job_post_id: job_post.job_post_id,
		job_master_id: job_master.job_master_id,
		company_id: company.company_id,
		company_name: company.name,
		title: job_master.title,
		main_tasks: job_master.main_tasks.0,
		summary: job_master.summary,
		evaluation_criteria: job_master.evaluation_criteria.0,
		skills,
		status: job_master.status,
		source_url: job_post.source_url,
		fingerprint_hash: job_post.fingerprint_hash,
		raw_fields: job_post.raw_fields,
		recruitment_status: job_post.recruitment_status,
		registration_status: job_post.registration_status,
		start_date: job_post.start_date.map(|date| date.to_string()),
		end_date: job_post.end_date.map(|date| date.to_string()),
		last_seen_at: job_master.last_seen_at,
		created_at: job_post.created_at,
	}
}
