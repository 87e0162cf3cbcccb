use uuid::Uuid;

use jobmatch_domain::kind::{EntityKind, IndexKind};
use jobmatch_service::{Error, RebuildReport};

use super::{harness, job_scorer, posting, request};

#[tokio::test]
async fn deleting_the_last_post_removes_the_job() {
	let h = harness(job_scorer(0.0));
	let tasks = ["Build APIs", "Run database migrations"];
	let first = h
		.service
		.ingest(request("https://a.example/1", posting("Acme", "Backend Engineer", &tasks, &[])))
		.await
		.expect("Failed to ingest.");
	let repost = h
		.service
		.ingest(request("https://b.example/1", posting("acme", "Backend engineer", &tasks, &[])))
		.await
		.expect("Failed to ingest repost.");

	assert_eq!(repost.job_master_id, first.job_master_id);

	let kept = h.service.delete_job_post(repost.job_post_id).await.expect("Failed to delete.");

	assert!(!kept.job_master_deleted);
	assert_eq!(h.store.counts().job_masters, 1);
	assert_eq!(h.index.records_of(IndexKind::Job).len(), 1);

	let gone = h.service.delete_job_post(first.job_post_id).await.expect("Failed to delete.");

	assert!(gone.job_master_deleted);
	assert_eq!(gone.job_master_id, first.job_master_id);

	let counts = h.store.counts();

	assert_eq!(counts.job_masters, 0);
	assert_eq!(counts.job_posts, 0);
	assert_eq!(counts.companies, 1);
	assert!(h.index.records_of(IndexKind::Job).is_empty());

	let missing = h.service.get_job_posting(first.job_post_id).await;

	assert!(matches!(missing, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn deleting_an_unknown_post_is_not_found() {
	let h = harness(job_scorer(0.0));
	let err = h.service.delete_job_post(Uuid::new_v4()).await;

	assert!(matches!(err, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn rebuild_restores_names_aliases_and_jobs() {
	let h = harness(job_scorer(0.0));
	let job = posting("Acme", "Backend Engineer", &["Build APIs"], &["Rust"]);
	let response =
		h.service.ingest(request("https://a.example/1", job)).await.expect("Failed to ingest.");
	let view = h.service.get_job_posting(response.job_post_id).await.expect("Failed to load.");

	h.store.seed_alias(EntityKind::Company, view.company_id, "Acme Corp").expect("Failed to seed.");

	let report = h.service.rebuild_index().await.expect("Failed to rebuild.");

	assert_eq!(report, RebuildReport { companies: 2, skills: 1, jobs: 1, failed: 0 });

	let companies = h.index.records_of(IndexKind::Company);

	assert_eq!(companies.len(), 2);
	assert!(companies.iter().all(|record| record.entity_id == view.company_id));
	assert!(companies.iter().any(|record| record.text == "Acme Corp"));
	assert_eq!(h.index.records_of(IndexKind::Job).len(), 1);
}

#[tokio::test]
async fn rebuild_counts_failed_writes() {
	let h = harness(job_scorer(0.0));
	let job = posting("Acme", "Backend Engineer", &["Build APIs"], &["Rust"]);

	h.service.ingest(request("https://a.example/1", job)).await.expect("Failed to ingest.");
	h.index.fail_upsert(true);

	let report = h.service.rebuild_index().await.expect("Failed to rebuild.");

	assert_eq!(report, RebuildReport { companies: 0, skills: 0, jobs: 0, failed: 3 });
}

#[tokio::test]
async fn rebuild_indexes_fingerprint_links_with_canonical_content() {
	let h = harness(job_scorer(0.0));
	let tasks = ["Build APIs", "Run database migrations"];
	let original = posting("Acme", "Backend Engineer", &tasks, &["Rust"]);
	let first = h
		.service
		.ingest(request("https://a.example/1", original))
		.await
		.expect("Failed to ingest.");
	let repost = h
		.service
		.ingest(request("https://b.example/1", posting("  ACME ", "Backend Engineer", &tasks, &[])))
		.await
		.expect("Failed to ingest repost.");

	assert_eq!(repost.job_master_id, first.job_master_id);

	let report = h.service.rebuild_index().await.expect("Failed to rebuild.");

	assert_eq!(report, RebuildReport { companies: 1, skills: 1, jobs: 2, failed: 0 });

	let jobs = h.index.records_of(IndexKind::Job);

	assert_eq!(jobs.len(), 2);
	assert!(jobs.iter().any(|record| record.job_post_id == Some(repost.job_post_id)));
	assert!(jobs.iter().all(|record| record.text == jobs[0].text));
	assert!(!jobs[0].text.contains("ACME"));
}

#[tokio::test]
async fn deleting_a_linked_post_drops_only_its_job_record() {
	let h = harness(job_scorer(0.90));
	let first = h
		.service
		.ingest(request("https://a.example/1", posting("Acme", "Backend Engineer", &["APIs"], &[])))
		.await
		.expect("Failed to ingest.");
	let reworded = posting("Acme", "Backend Engineer", &["Design HTTP APIs"], &[]);
	let linked = h
		.service
		.ingest(request("https://b.example/1", reworded))
		.await
		.expect("Failed to ingest reworded posting.");

	assert_eq!(linked.job_master_id, first.job_master_id);
	assert_eq!(h.index.records_of(IndexKind::Job).len(), 2);

	let deleted = h.service.delete_job_post(linked.job_post_id).await.expect("Failed to delete.");

	assert!(!deleted.job_master_deleted);

	let jobs = h.index.records_of(IndexKind::Job);

	assert_eq!(jobs.len(), 1);
	assert_eq!(jobs[0].job_post_id, Some(first.job_post_id));
}
