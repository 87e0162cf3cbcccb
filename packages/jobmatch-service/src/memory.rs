//! In-memory stand-ins for the store, the similarity index and the arbiter.
//!
//! A unit of work edits a private copy of the state and publishes it on commit, so rollback and
//! dropped units leave no trace.

use std::sync::{
	Arc, Mutex, MutexGuard, PoisonError,
	atomic::{AtomicBool, AtomicUsize, Ordering},
};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	ArbitrationProvider, BoxFuture, Error, IndexHit, IndexQuery, IndexRecord, JobPostingView,
	Result, SimilarityIndex, Store, UnitOfWork,
	store::{EntityRef, JobMasterRef, NewJobMasterRecord, NewJobPostRecord, PostingMatch},
};
use jobmatch_config::LlmProviderConfig;
use jobmatch_domain::{
	fingerprint,
	kind::{EntityKind, IndexKind},
	name::normalize_name,
};

type Scorer = dyn Fn(IndexKind, &str, &str) -> f32 + Send + Sync;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryCounts {
	pub companies: usize,
	pub skills: usize,
	pub company_aliases: usize,
	pub skill_aliases: usize,
	pub job_masters: usize,
	pub job_posts: usize,
	pub skill_links: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
	Same,
	Different,
	Fail,
}

#[derive(Clone, Debug)]
struct EntityEntry {
	entity_id: Uuid,
	name: String,
	name_norm: String,
}

#[derive(Clone, Debug)]
struct AliasEntry {
	owner_id: Uuid,
	alias: String,
	alias_norm: String,
}

#[derive(Clone, Debug)]
struct MasterEntry {
	record: NewJobMasterRecord,
	last_seen_at: OffsetDateTime,
}

#[derive(Clone, Debug, Default)]
struct MemoryState {
	companies: Vec<EntityEntry>,
	skills: Vec<EntityEntry>,
	company_aliases: Vec<AliasEntry>,
	skill_aliases: Vec<AliasEntry>,
	masters: Vec<MasterEntry>,
	skill_links: Vec<(Uuid, Uuid)>,
	posts: Vec<NewJobPostRecord>,
}
impl MemoryState {
	fn entities(&self, kind: EntityKind) -> &Vec<EntityEntry> {
		match kind {
			EntityKind::Company => &self.companies,
			EntityKind::Skill => &self.skills,
		}
	}

	fn entities_mut(&mut self, kind: EntityKind) -> &mut Vec<EntityEntry> {
		match kind {
			EntityKind::Company => &mut self.companies,
			EntityKind::Skill => &mut self.skills,
		}
	}

	fn aliases(&self, kind: EntityKind) -> &Vec<AliasEntry> {
		match kind {
			EntityKind::Company => &self.company_aliases,
			EntityKind::Skill => &self.skill_aliases,
		}
	}

	fn aliases_mut(&mut self, kind: EntityKind) -> &mut Vec<AliasEntry> {
		match kind {
			EntityKind::Company => &mut self.company_aliases,
			EntityKind::Skill => &mut self.skill_aliases,
		}
	}

	fn entity(&self, kind: EntityKind, entity_id: Uuid) -> Option<EntityRef> {
		self.entities(kind)
			.iter()
			.find(|entry| entry.entity_id == entity_id)
			.map(|entry| EntityRef { entity_id: entry.entity_id, name: entry.name.clone() })
	}

	fn insert_entity(&mut self, kind: EntityKind, name: &str, name_norm: &str) -> EntityRef {
		if let Some(entry) = self.entities(kind).iter().find(|entry| entry.name_norm == name_norm) {
			return EntityRef { entity_id: entry.entity_id, name: entry.name.clone() };
		}

		let entry = EntityEntry {
			entity_id: Uuid::new_v4(),
			name: name.to_string(),
			name_norm: name_norm.to_string(),
		};
		let entity = EntityRef { entity_id: entry.entity_id, name: entry.name.clone() };

		self.entities_mut(kind).push(entry);

		entity
	}

	fn insert_alias(
		&mut self,
		kind: EntityKind,
		owner_id: Uuid,
		alias: &str,
		alias_norm: &str,
	) -> Result<()> {
		if self.entity(kind, owner_id).is_none() {
			return Err(Error::Storage {
				message: format!("{} {owner_id} does not exist.", kind.as_str()),
			});
		}
		if self
			.aliases(kind)
			.iter()
			.any(|alias| alias.owner_id == owner_id && alias.alias_norm == alias_norm)
		{
			return Err(Error::Conflict {
				message: format!("Alias {alias_norm:?} already exists."),
			});
		}

		self.aliases_mut(kind).push(AliasEntry {
			owner_id,
			alias: alias.to_string(),
			alias_norm: alias_norm.to_string(),
		});

		Ok(())
	}

	fn posting_match(&self, post: &NewJobPostRecord) -> Option<PostingMatch> {
		let master = self.master(post.job_master_id)?;
		let company = self.entity(EntityKind::Company, master.record.company_id)?;

		Some(PostingMatch {
			job_post_id: post.job_post_id,
			job_master_id: master.record.job_master_id,
			company_id: company.entity_id,
			company_name: company.name,
			job_title: master.record.title.clone(),
			index_text: post.index_text.clone(),
		})
	}

	fn master(&self, job_master_id: Uuid) -> Option<&MasterEntry> {
		self.masters.iter().find(|master| master.record.job_master_id == job_master_id)
	}
}

/// Shared state plus failure switches. Clones observe the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
	state: Arc<Mutex<MemoryState>>,
	fail_alias_writes: Arc<AtomicBool>,
	fail_job_post_writes: Arc<AtomicBool>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn seed_company(&self, name: &str) -> Uuid {
		self.lock().insert_entity(EntityKind::Company, name, &normalize_name(name)).entity_id
	}

	pub fn seed_skill(&self, name: &str) -> Uuid {
		self.lock().insert_entity(EntityKind::Skill, name, &normalize_name(name)).entity_id
	}

	pub fn seed_alias(&self, kind: EntityKind, owner_id: Uuid, alias: &str) -> Result<()> {
		self.lock().insert_alias(kind, owner_id, alias, &normalize_name(alias))
	}

	/// Drops an entity without touching the index, to simulate index/store drift.
	pub fn remove_entity(&self, kind: EntityKind, entity_id: Uuid) {
		let mut state = self.lock();

		state.entities_mut(kind).retain(|entry| entry.entity_id != entity_id);
		state.aliases_mut(kind).retain(|alias| alias.owner_id != entity_id);
	}

	pub fn fail_alias_writes(&self, fail: bool) {
		self.fail_alias_writes.store(fail, Ordering::SeqCst);
	}

	pub fn fail_job_post_writes(&self, fail: bool) {
		self.fail_job_post_writes.store(fail, Ordering::SeqCst);
	}

	pub fn counts(&self) -> MemoryCounts {
		let state = self.lock();

		MemoryCounts {
			companies: state.companies.len(),
			skills: state.skills.len(),
			company_aliases: state.company_aliases.len(),
			skill_aliases: state.skill_aliases.len(),
			job_masters: state.masters.len(),
			job_posts: state.posts.len(),
			skill_links: state.skill_links.len(),
		}
	}

	pub fn company_name(&self, company_id: Uuid) -> Option<String> {
		self.lock().entity(EntityKind::Company, company_id).map(|entity| entity.name)
	}

	fn lock(&self) -> MutexGuard<'_, MemoryState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl Store for MemoryStore {
	fn begin(&self) -> BoxFuture<'_, Result<Box<dyn UnitOfWork>>> {
		let working = self.lock().clone();
		let uow = MemoryUnitOfWork {
			shared: self.state.clone(),
			working,
			fail_alias_writes: self.fail_alias_writes.load(Ordering::SeqCst),
			fail_job_post_writes: self.fail_job_post_writes.load(Ordering::SeqCst),
		};

		Box::pin(async move { Ok(Box::new(uow) as Box<dyn UnitOfWork>) })
	}

	fn ensure_schema(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async { Ok(()) })
	}
}

struct MemoryUnitOfWork {
	shared: Arc<Mutex<MemoryState>>,
	working: MemoryState,
	fail_alias_writes: bool,
	fail_job_post_writes: bool,
}
impl UnitOfWork for MemoryUnitOfWork {
	fn find_entity_by_alias<'a>(
		&'a mut self,
		kind: EntityKind,
		alias_norm: &'a str,
	) -> BoxFuture<'a, Result<Option<EntityRef>>> {
		let state = &self.working;
		let owner_id = state
			.entities(kind)
			.iter()
			.find(|entry| entry.name_norm == alias_norm)
			.map(|entry| entry.entity_id)
			.or_else(|| {
				state
					.aliases(kind)
					.iter()
					.find(|alias| alias.alias_norm == alias_norm)
					.map(|alias| alias.owner_id)
			});
		let found = owner_id.and_then(|owner_id| state.entity(kind, owner_id));

		Box::pin(async move { Ok(found) })
	}

	fn get_entity<'a>(
		&'a mut self,
		kind: EntityKind,
		entity_id: Uuid,
	) -> BoxFuture<'a, Result<Option<EntityRef>>> {
		let found = self.working.entity(kind, entity_id);

		Box::pin(async move { Ok(found) })
	}

	fn create_entity<'a>(
		&'a mut self,
		kind: EntityKind,
		name: &'a str,
		name_norm: &'a str,
		_now: OffsetDateTime,
	) -> BoxFuture<'a, Result<EntityRef>> {
		let entity = self.working.insert_entity(kind, name, name_norm);

		Box::pin(async move { Ok(entity) })
	}

	fn learn_alias<'a>(
		&'a mut self,
		kind: EntityKind,
		owner_id: Uuid,
		alias: &'a str,
		alias_norm: &'a str,
		_now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		let result = if self.fail_alias_writes {
			Err(Error::Storage { message: "Alias writes are disabled.".to_string() })
		} else {
			self.working.insert_alias(kind, owner_id, alias, alias_norm)
		};

		Box::pin(async move { result })
	}

	fn find_posting_by_url<'a>(
		&'a mut self,
		source_url: &'a str,
	) -> BoxFuture<'a, Result<Option<PostingMatch>>> {
		let url_hash = fingerprint::url_hash(source_url);
		let found = self
			.working
			.posts
			.iter()
			.filter(|post| post.source_url_hash == url_hash && post.source_url == source_url)
			.find_map(|post| self.working.posting_match(post));

		Box::pin(async move { Ok(found) })
	}

	fn find_posting_by_fingerprint<'a>(
		&'a mut self,
		fingerprint_hash: &'a str,
	) -> BoxFuture<'a, Result<Option<PostingMatch>>> {
		let found = self
			.working
			.posts
			.iter()
			.filter(|post| post.fingerprint_hash == fingerprint_hash)
			.find_map(|post| self.working.posting_match(post));

		Box::pin(async move { Ok(found) })
	}

	fn get_job_master(
		&mut self,
		job_master_id: Uuid,
	) -> BoxFuture<'_, Result<Option<JobMasterRef>>> {
		let found = self.working.master(job_master_id).map(|master| JobMasterRef {
			job_master_id: master.record.job_master_id,
			company_id: master.record.company_id,
			title: master.record.title.clone(),
		});

		Box::pin(async move { Ok(found) })
	}

	fn create_job_master<'a>(
		&'a mut self,
		master: &'a NewJobMasterRecord,
	) -> BoxFuture<'a, Result<()>> {
		let result = if self.working.entity(EntityKind::Company, master.company_id).is_none() {
			Err(Error::Storage {
				message: "Job master references a missing company.".to_string(),
			})
		} else {
			let entry = MasterEntry { record: master.clone(), last_seen_at: master.now };

			self.working.masters.push(entry);

			Ok(())
		};

		Box::pin(async move { result })
	}

	fn link_skill(
		&mut self,
		job_master_id: Uuid,
		skill_id: Uuid,
		_now: OffsetDateTime,
	) -> BoxFuture<'_, Result<()>> {
		let link = (job_master_id, skill_id);

		if !self.working.skill_links.contains(&link) {
			self.working.skill_links.push(link);
		}

		Box::pin(async { Ok(()) })
	}

	fn create_job_post<'a>(&'a mut self, post: &'a NewJobPostRecord) -> BoxFuture<'a, Result<()>> {
		let result = if self.fail_job_post_writes {
			Err(Error::Storage { message: "Job post writes are disabled.".to_string() })
		} else if self.working.posts.iter().any(|existing| existing.source_url == post.source_url)
		{
			Err(Error::Conflict { message: format!("Source URL {} exists.", post.source_url) })
		} else if self.working.master(post.job_master_id).is_none() {
			Err(Error::Storage { message: "Job post references a missing master.".to_string() })
		} else {
			self.working.posts.push(post.clone());

			Ok(())
		};

		Box::pin(async move { result })
	}

	fn touch_job_master(
		&mut self,
		job_master_id: Uuid,
		now: OffsetDateTime,
	) -> BoxFuture<'_, Result<()>> {
		if let Some(master) = self
			.working
			.masters
			.iter_mut()
			.find(|master| master.record.job_master_id == job_master_id)
		{
			master.last_seen_at = now;
		}

		Box::pin(async { Ok(()) })
	}

	fn load_posting(&mut self, job_post_id: Uuid) -> BoxFuture<'_, Result<Option<JobPostingView>>> {
		let state = &self.working;
		let view = state.posts.iter().find(|post| post.job_post_id == job_post_id).and_then(|post| {
			let master = state.master(post.job_master_id)?;
			let company = state.entity(EntityKind::Company, master.record.company_id)?;
			let skills = state
				.skill_links
				.iter()
				.filter(|(master_id, _)| *master_id == master.record.job_master_id)
				.filter_map(|(_, skill_id)| state.entity(EntityKind::Skill, *skill_id))
				.map(|skill| skill.name)
				.collect();

			Some(JobPostingView {
				job_post_id: post.job_post_id,
				job_master_id: master.record.job_master_id,
				company_id: company.entity_id,
				company_name: company.name,
				title: master.record.title.clone(),
				main_tasks: master.record.main_tasks.clone(),
				summary: master.record.summary.clone(),
				evaluation_criteria: master.record.evaluation_criteria.clone(),
				skills,
				status: master.record.status.clone(),
				source_url: post.source_url.clone(),
				fingerprint_hash: post.fingerprint_hash.clone(),
				raw_fields: post.raw_fields.clone(),
				recruitment_status: post.recruitment_status.clone(),
				registration_status: post.registration_status.clone(),
				start_date: post.start_date.map(|date| date.to_string()),
				end_date: post.end_date.map(|date| date.to_string()),
				last_seen_at: master.last_seen_at,
				created_at: post.now,
			})
		});

		Box::pin(async move { Ok(view) })
	}

	fn delete_job_post(&mut self, job_post_id: Uuid) -> BoxFuture<'_, Result<Option<Uuid>>> {
		let position = self.working.posts.iter().position(|post| post.job_post_id == job_post_id);
		let job_master_id =
			position.map(|position| self.working.posts.remove(position).job_master_id);

		Box::pin(async move { Ok(job_master_id) })
	}

	fn count_job_posts(&mut self, job_master_id: Uuid) -> BoxFuture<'_, Result<i64>> {
		let count =
			self.working.posts.iter().filter(|post| post.job_master_id == job_master_id).count();

		Box::pin(async move { Ok(count as i64) })
	}

	fn delete_job_master(&mut self, job_master_id: Uuid) -> BoxFuture<'_, Result<bool>> {
		let before = self.working.masters.len();

		self.working.masters.retain(|master| master.record.job_master_id != job_master_id);
		self.working.skill_links.retain(|(master_id, _)| *master_id != job_master_id);
		self.working.posts.retain(|post| post.job_master_id != job_master_id);

		let deleted = self.working.masters.len() < before;

		Box::pin(async move { Ok(deleted) })
	}

	fn list_entity_texts(&mut self, kind: EntityKind) -> BoxFuture<'_, Result<Vec<EntityRef>>> {
		let state = &self.working;
		let names = state
			.entities(kind)
			.iter()
			.map(|entry| EntityRef { entity_id: entry.entity_id, name: entry.name.clone() });
		let aliases = state
			.aliases(kind)
			.iter()
			.map(|alias| EntityRef { entity_id: alias.owner_id, name: alias.alias.clone() });
		let rows = names.chain(aliases).collect();

		Box::pin(async move { Ok(rows) })
	}

	fn list_job_records(&mut self) -> BoxFuture<'_, Result<Vec<IndexRecord>>> {
		let records = self
			.working
			.posts
			.iter()
			.map(|post| IndexRecord {
				kind: IndexKind::Job,
				entity_id: post.job_master_id,
				text: post.index_text.clone(),
				company_id: Some(post.company_id),
				job_post_id: Some(post.job_post_id),
			})
			.collect();

		Box::pin(async move { Ok(records) })
	}

	fn commit(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
		let Self { shared, working, .. } = *self;

		*shared.lock().unwrap_or_else(PoisonError::into_inner) = working;

		Box::pin(async { Ok(()) })
	}

	fn rollback(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
		Box::pin(async { Ok(()) })
	}
}

/// Text-only similarity index with a pluggable scorer.
///
/// The default scorer is Jaro-Winkler over normalized names.
pub struct MemoryIndex {
	records: Mutex<Vec<IndexRecord>>,
	scorer: Box<Scorer>,
	searches: AtomicUsize,
	upserts: AtomicUsize,
	fail_search: AtomicBool,
	fail_upsert: AtomicBool,
}
impl MemoryIndex {
	pub fn new() -> Self {
		Self::with_scorer(|_, query, text| {
			strsim::jaro_winkler(&normalize_name(query), &normalize_name(text)) as f32
		})
	}

	pub fn with_scorer<F>(scorer: F) -> Self
	where
		F: Fn(IndexKind, &str, &str) -> f32 + Send + Sync + 'static,
	{
		Self {
			records: Mutex::default(),
			scorer: Box::new(scorer),
			searches: AtomicUsize::new(0),
			upserts: AtomicUsize::new(0),
			fail_search: AtomicBool::new(false),
			fail_upsert: AtomicBool::new(false),
		}
	}

	pub fn searches(&self) -> usize {
		self.searches.load(Ordering::SeqCst)
	}

	pub fn upserts(&self) -> usize {
		self.upserts.load(Ordering::SeqCst)
	}

	pub fn records(&self) -> Vec<IndexRecord> {
		self.lock().clone()
	}

	pub fn records_of(&self, kind: IndexKind) -> Vec<IndexRecord> {
		self.lock().iter().filter(|record| record.kind == kind).cloned().collect()
	}

	pub fn fail_search(&self, fail: bool) {
		self.fail_search.store(fail, Ordering::SeqCst);
	}

	pub fn fail_upsert(&self, fail: bool) {
		self.fail_upsert.store(fail, Ordering::SeqCst);
	}

	fn lock(&self) -> MutexGuard<'_, Vec<IndexRecord>> {
		self.records.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl Default for MemoryIndex {
	fn default() -> Self {
		Self::new()
	}
}

impl SimilarityIndex for MemoryIndex {
	fn upsert<'a>(&'a self, record: &'a IndexRecord) -> BoxFuture<'a, Result<()>> {
		self.upserts.fetch_add(1, Ordering::SeqCst);

		let result = if self.fail_upsert.load(Ordering::SeqCst) {
			Err(Error::Index { message: "Index writes are disabled.".to_string() })
		} else {
			let mut records = self.lock();

			if !records.contains(record) {
				records.push(record.clone());
			}

			Ok(())
		};

		Box::pin(async move { result })
	}

	fn search<'a>(&'a self, query: IndexQuery<'a>) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		self.searches.fetch_add(1, Ordering::SeqCst);

		let result = if self.fail_search.load(Ordering::SeqCst) {
			Err(Error::Index { message: "Index is unreachable.".to_string() })
		} else {
			let records = self.lock();
			let mut hits: Vec<IndexHit> = records
				.iter()
				.filter(|record| record.kind == query.kind)
				.filter(|record| query.company_id.is_none_or(|id| record.company_id == Some(id)))
				.map(|record| IndexHit {
					entity_id: record.entity_id,
					text: record.text.clone(),
					score: (self.scorer)(query.kind, query.text, &record.text).clamp(0.0, 1.0),
				})
				.collect();

			hits.sort_by(|a, b| b.score.total_cmp(&a.score));
			hits.truncate(query.top_k as usize);

			Ok(hits)
		};

		Box::pin(async move { result })
	}

	fn remove(&self, kind: IndexKind, entity_id: Uuid) -> BoxFuture<'_, Result<()>> {
		self.lock().retain(|record| record.kind != kind || record.entity_id != entity_id);

		Box::pin(async { Ok(()) })
	}

	fn remove_job_post(&self, job_post_id: Uuid) -> BoxFuture<'_, Result<()>> {
		self.lock().retain(|record| record.job_post_id != Some(job_post_id));

		Box::pin(async { Ok(()) })
	}

	fn ensure_ready(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async { Ok(()) })
	}
}

/// Arbiter that answers with a fixed verdict and records every question.
pub struct ScriptedArbiter {
	verdict: Mutex<Verdict>,
	requests: Mutex<Vec<(IndexKind, String, String)>>,
}
impl ScriptedArbiter {
	pub fn new(verdict: Verdict) -> Self {
		Self { verdict: Mutex::new(verdict), requests: Mutex::default() }
	}

	pub fn set_verdict(&self, verdict: Verdict) {
		*self.verdict.lock().unwrap_or_else(PoisonError::into_inner) = verdict;
	}

	pub fn calls(&self) -> usize {
		self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
	}

	pub fn requests(&self) -> Vec<(IndexKind, String, String)> {
		self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}
}

impl ArbitrationProvider for ScriptedArbiter {
	fn is_same<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		subject: IndexKind,
		a: &'a str,
		b: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<bool>> {
		self.requests.lock().unwrap_or_else(PoisonError::into_inner).push((
			subject,
			a.to_string(),
			b.to_string(),
		));

		let verdict = *self.verdict.lock().unwrap_or_else(PoisonError::into_inner);

		Box::pin(async move {
			match verdict {
				Verdict::Same => Ok(true),
				Verdict::Different => Ok(false),
				Verdict::Fail => Err(color_eyre::eyre::eyre!("Arbiter is unavailable.")),
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn rolled_back_work_is_invisible() {
		let store = MemoryStore::new();
		let mut uow = store.begin().await.expect("begin");

		uow.create_entity(EntityKind::Company, "Acme", "acme", OffsetDateTime::now_utc())
			.await
			.expect("create");
		uow.rollback().await.expect("rollback");

		assert_eq!(store.counts().companies, 0);
	}

	#[tokio::test]
	async fn committed_work_is_published() {
		let store = MemoryStore::new();
		let mut uow = store.begin().await.expect("begin");

		uow.create_entity(EntityKind::Company, "Acme", "acme", OffsetDateTime::now_utc())
			.await
			.expect("create");
		uow.commit().await.expect("commit");

		assert_eq!(store.counts().companies, 1);
	}

	#[tokio::test]
	async fn duplicate_alias_is_a_conflict() {
		let store = MemoryStore::new();
		let acme = store.seed_company("Acme");

		store.seed_alias(EntityKind::Company, acme, "Acme Corp").expect("seed alias");

		let err = store.seed_alias(EntityKind::Company, acme, " acme  corp ");

		assert!(matches!(err, Err(Error::Conflict { .. })));
	}

	#[tokio::test]
	async fn search_filters_by_company_and_orders_by_score() {
		let index = MemoryIndex::with_scorer(|_, _, text| if text == "near" { 0.9 } else { 0.4 });
		let company = Uuid::new_v4();

		let texts = [("far", Some(company)), ("near", Some(company)), ("near", None)];

		for (text, company_id) in texts {
			let record = IndexRecord {
				kind: IndexKind::Job,
				entity_id: Uuid::new_v4(),
				text: text.to_string(),
				company_id,
				job_post_id: None,
			};

			index.upsert(&record).await.expect("upsert");
		}

		let query =
			IndexQuery { kind: IndexKind::Job, text: "q", company_id: Some(company), top_k: 5 };
		let hits = index.search(query).await.expect("search");

		assert_eq!(hits.len(), 2);
		assert_eq!(hits[0].text, "near");
		assert!(hits[0].score > hits[1].score);
	}
}
