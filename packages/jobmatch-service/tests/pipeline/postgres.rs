use std::sync::Arc;

use sqlx::PgPool;

use jobmatch_domain::{kind::EntityKind, name::normalize_name};
use jobmatch_service::{
	JobMatchService, MatchVia, PgStore, Providers, Store,
	memory::{MemoryIndex, ScriptedArbiter, Verdict},
};
use jobmatch_storage::{db::Db, entities};
use jobmatch_testkit::TestDatabase;

use super::{StaticExtractor, UnusedEmbedding, job_scorer, posting, request, test_config};

struct PgHarness {
	test_db: TestDatabase,
	pool: PgPool,
	service: JobMatchService,
}

async fn setup(test_name: &str, index: MemoryIndex) -> Option<PgHarness> {
	let Some(base_dsn) = jobmatch_testkit::env_dsn() else {
		eprintln!("Skipping {test_name}; set JOBMATCH_PG_DSN to run this test.");

		return None;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = Db::connect(&test_db.postgres_config()).await.expect("Failed to connect to Postgres.");
	let pool = db.pool.clone();
	let providers = Providers::new(
		Arc::new(UnusedEmbedding),
		Arc::new(ScriptedArbiter::new(Verdict::Different)),
		Arc::new(StaticExtractor { posting: None }),
	);
	let service =
		JobMatchService::new(test_config(), Arc::new(PgStore::new(db)), Arc::new(index), providers);

	service.init().await.expect("Failed to initialize service.");

	Some(PgHarness { test_db, pool, service })
}

async fn count(pool: &PgPool, table: &str) -> i64 {
	sqlx::query_scalar(&format!("SELECT count(*) FROM {table}"))
		.fetch_one(pool)
		.await
		.expect("Failed to count rows.")
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set JOBMATCH_PG_DSN to run."]
async fn ingestion_paths_share_one_master() {
	let Some(h) = setup("ingestion_paths_share_one_master", job_scorer(0.90)).await else {
		return;
	};
	let original = posting("Acme", "Backend Engineer", &["API", "DB"], &["Rust"]);
	let first = h
		.service
		.ingest(request("https://a.example/1", original.clone()))
		.await
		.expect("Failed to ingest.");
	let retry = h
		.service
		.ingest(request("https://a.example/1", original))
		.await
		.expect("Failed to re-ingest.");

	assert_eq!(retry.matched_by, Some(MatchVia::Url));
	assert_eq!(retry.job_post_id, first.job_post_id);

	let reordered = posting("ACME", "backend engineer", &["DB", "API"], &[]);
	let repost = h
		.service
		.ingest(request("https://b.example/1", reordered))
		.await
		.expect("Failed to ingest repost.");

	assert_eq!(repost.matched_by, Some(MatchVia::Fingerprint));
	assert_eq!(repost.job_master_id, first.job_master_id);

	let view = h.service.get_job_posting(first.job_post_id).await.expect("Failed to load.");
	let mut conn = h.pool.acquire().await.expect("Failed to acquire connection.");

	entities::insert_alias(
		&mut conn,
		EntityKind::Company,
		view.company_id,
		"Acme Corp",
		&normalize_name("Acme Corp"),
		"manual",
		view.created_at,
	)
	.await
	.expect("Failed to seed alias.");
	drop(conn);

	let reworded = posting("Acme Corp", "Backend Engineer", &["Build HTTP APIs"], &["rust"]);
	let semantic = h
		.service
		.ingest(request("https://c.example/1", reworded))
		.await
		.expect("Failed to ingest reworded posting.");

	assert_eq!(semantic.matched_by, Some(MatchVia::Semantic));
	assert_eq!(semantic.job_master_id, first.job_master_id);
	assert_eq!(count(&h.pool, "companies").await, 1);
	assert_eq!(count(&h.pool, "skills").await, 1);
	assert_eq!(count(&h.pool, "job_masters").await, 1);
	assert_eq!(count(&h.pool, "job_posts").await, 3);

	for job_post_id in [repost.job_post_id, semantic.job_post_id] {
		let deleted = h.service.delete_job_post(job_post_id).await.expect("Failed to delete.");

		assert!(!deleted.job_master_deleted);
	}

	let last = h.service.delete_job_post(first.job_post_id).await.expect("Failed to delete.");

	assert!(last.job_master_deleted);
	assert_eq!(count(&h.pool, "job_masters").await, 0);
	assert_eq!(count(&h.pool, "job_master_skills").await, 0);

	h.test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set JOBMATCH_PG_DSN to run."]
async fn rolled_back_unit_of_work_leaves_no_rows() {
	let Some(h) = setup("rolled_back_unit_of_work_leaves_no_rows", MemoryIndex::new()).await else {
		return;
	};
	let mut uow = h.service.store.begin().await.expect("Failed to begin unit of work.");
	let created = h
		.service
		.company_normalizer()
		.resolve(uow.as_mut(), "Globex")
		.await
		.expect("Failed to resolve company.");

	assert!(created.is_created());

	uow.rollback().await.expect("Failed to roll back.");

	assert_eq!(count(&h.pool, "companies").await, 0);

	h.test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set JOBMATCH_PG_DSN to run."]
async fn learned_alias_survives_commit() {
	let Some(h) = setup("learned_alias_survives_commit", MemoryIndex::with_scorer(|_, _, _| 0.9))
		.await
	else {
		return;
	};
	let mut uow = h.service.store.begin().await.expect("Failed to begin unit of work.");
	let normalizer = h.service.company_normalizer();
	let acme = normalizer.resolve(uow.as_mut(), "Acme").await.expect("Failed to create.");
	let variant =
		normalizer.resolve(uow.as_mut(), "Acme Holdings").await.expect("Failed to match.");

	uow.commit().await.expect("Failed to commit.");

	assert_eq!(variant.entity_id, acme.entity_id);
	assert_eq!(count(&h.pool, "company_aliases").await, 1);

	h.test_db.cleanup().await.expect("Failed to cleanup test database.");
}
