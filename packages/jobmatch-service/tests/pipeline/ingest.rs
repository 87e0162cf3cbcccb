use jobmatch_domain::kind::{EntityKind, IndexKind};
use jobmatch_service::{Error, MatchVia, memory::Verdict};

use super::{StaticExtractor, harness, harness_with_extractor, job_scorer, posting, request};

const URL_A: &str = "https://jobs.example.com/postings/1";
const URL_B: &str = "https://board.example.org/acme/backend";
const URL_C: &str = "https://careers.acme.example/openings/42";

fn posting_a() -> jobmatch_domain::posting::ExtractedPosting {
	posting(
		"Acme",
		"Backend Engineer",
		&["Build APIs", "Run database migrations"],
		&["Rust", "PostgreSQL"],
	)
}

#[tokio::test]
async fn fresh_posting_registers_a_new_job() {
	let h = harness(job_scorer(0.0));
	let response = h.service.ingest(request(URL_A, posting_a())).await.expect("Failed to ingest.");

	assert!(!response.is_existing);
	assert_eq!(response.matched_by, None);

	let counts = h.store.counts();

	assert_eq!(counts.companies, 1);
	assert_eq!(counts.skills, 2);
	assert_eq!(counts.job_masters, 1);
	assert_eq!(counts.job_posts, 1);
	assert_eq!(counts.skill_links, 2);

	let jobs = h.index.records_of(IndexKind::Job);

	assert_eq!(jobs.len(), 1);
	assert_eq!(jobs[0].entity_id, response.job_master_id);
	assert_eq!(jobs[0].job_post_id, Some(response.job_post_id));

	let view = h.service.get_job_posting(response.job_post_id).await.expect("Failed to load.");

	assert_eq!(view.company_name, "Acme");
	assert_eq!(view.title, "Backend Engineer");
	assert_eq!(view.source_url, URL_A);
	assert_eq!(view.skills.len(), 2);
	assert_eq!(view.fingerprint_hash, posting_a().fingerprint());
}

#[tokio::test]
async fn repeated_url_is_idempotent() {
	let h = harness(job_scorer(0.0));
	let first = h.service.ingest(request(URL_A, posting_a())).await.expect("Failed to ingest.");
	let again = h.service.ingest(request(URL_A, posting_a())).await.expect("Failed to re-ingest.");

	assert!(again.is_existing);
	assert_eq!(again.matched_by, Some(MatchVia::Url));
	assert_eq!(again.job_master_id, first.job_master_id);
	assert_eq!(again.job_post_id, first.job_post_id);
	assert_eq!(h.store.counts().job_masters, 1);
	assert_eq!(h.store.counts().job_posts, 1);
}

#[tokio::test]
async fn reformatted_repost_links_by_fingerprint() {
	let h = harness(job_scorer(0.0));
	let first = h.service.ingest(request(URL_A, posting_a())).await.expect("Failed to ingest.");
	let index_writes = h.index.upserts();
	let repost = posting(
		" ACME ",
		"backend   engineer",
		&["run database migrations  ", "", "Build APIs"],
		&["Rust", "PostgreSQL"],
	);
	let second = h.service.ingest(request(URL_B, repost)).await.expect("Failed to ingest repost.");

	assert!(second.is_existing);
	assert_eq!(second.matched_by, Some(MatchVia::Fingerprint));
	assert_eq!(second.job_master_id, first.job_master_id);
	assert_ne!(second.job_post_id, first.job_post_id);

	let counts = h.store.counts();

	assert_eq!(counts.job_masters, 1);
	assert_eq!(counts.job_posts, 2);
	assert_eq!(counts.companies, 1);
	assert_eq!(h.index.upserts(), index_writes);
	assert_eq!(h.arbiter.calls(), 0);
}

#[tokio::test]
async fn learned_alias_and_similar_content_link_semantically() {
	let h = harness(job_scorer(0.90));
	let first = h.service.ingest(request(URL_A, posting_a())).await.expect("Failed to ingest.");
	let view = h.service.get_job_posting(first.job_post_id).await.expect("Failed to load.");

	h.store.seed_alias(EntityKind::Company, view.company_id, "Acme Corp").expect("Failed to seed.");

	let reworded = posting(
		"Acme Corp",
		"Backend Engineer",
		&["Design and build HTTP APIs", "Own schema migrations"],
		&["rust"],
	);
	let second = h.service.ingest(request(URL_C, reworded)).await.expect("Failed to ingest.");

	assert!(second.is_existing);
	assert_eq!(second.matched_by, Some(MatchVia::Semantic));
	assert_eq!(second.job_master_id, first.job_master_id);
	assert_eq!(h.arbiter.calls(), 0);

	let counts = h.store.counts();

	assert_eq!(counts.companies, 1);
	assert_eq!(counts.job_masters, 1);
	assert_eq!(counts.job_posts, 2);

	let linked = h.service.get_job_posting(second.job_post_id).await.expect("Failed to load.");

	assert_eq!(linked.company_name, "Acme");
	assert_eq!(linked.raw_fields["company_name"], "Acme Corp");
	assert_eq!(h.index.records_of(IndexKind::Job).len(), 2);
}

#[tokio::test]
async fn middle_band_job_similarity_follows_arbitration() {
	let h = harness(job_scorer(0.80));
	let first = h.service.ingest(request(URL_A, posting_a())).await.expect("Failed to ingest.");
	let denied = posting("Acme", "Backend Engineer", &["Maintain billing services"], &[]);
	let separate = h.service.ingest(request(URL_B, denied)).await.expect("Failed to ingest.");

	assert!(!separate.is_existing);
	assert_ne!(separate.job_master_id, first.job_master_id);

	let requests = h.arbiter.requests();

	assert_eq!(requests.len(), 1);
	assert_eq!(requests[0].0, IndexKind::Job);
	assert!(requests[0].1.starts_with("Company: Acme\nTitle: Backend Engineer"));

	h.arbiter.set_verdict(Verdict::Same);

	let affirmed = posting("Acme", "Backend Engineer", &["Maintain payment services"], &[]);
	let linked = h.service.ingest(request(URL_C, affirmed)).await.expect("Failed to ingest.");

	assert_eq!(linked.matched_by, Some(MatchVia::Semantic));
	assert_eq!(h.store.counts().job_masters, 2);
}

#[tokio::test]
async fn newly_created_company_skips_semantic_matching() {
	let h = harness(job_scorer(0.99));

	h.service.ingest(request(URL_A, posting_a())).await.expect("Failed to ingest.");

	let other = posting("Globex", "Backend Engineer", &["Build APIs"], &[]);
	let response = h.service.ingest(request(URL_B, other)).await.expect("Failed to ingest.");

	assert!(!response.is_existing);
	assert_eq!(h.store.counts().job_masters, 2);
	assert_eq!(h.arbiter.calls(), 0);
}

#[tokio::test]
async fn index_outage_never_fails_ingestion() {
	let h = harness(job_scorer(0.99));

	h.index.fail_search(true);
	h.index.fail_upsert(true);

	let first = h.service.ingest(request(URL_A, posting_a())).await.expect("Failed to ingest.");
	let reworded = posting("Acme", "Backend Engineer", &["Ship HTTP APIs"], &["Rust"]);
	let second = h.service.ingest(request(URL_B, reworded)).await.expect("Failed to ingest.");

	assert!(!second.is_existing);
	assert_ne!(second.job_master_id, first.job_master_id);
	assert!(h.index.records().is_empty());

	let counts = h.store.counts();

	assert_eq!(counts.companies, 1);
	assert_eq!(counts.skills, 2);
	assert_eq!(counts.job_masters, 2);
}

#[tokio::test]
async fn persistence_failure_commits_nothing() {
	let h = harness(job_scorer(0.0));

	h.store.fail_job_post_writes(true);

	let err = h.service.ingest(request(URL_A, posting_a())).await;

	assert!(matches!(err, Err(Error::Storage { .. })));
	assert_eq!(h.store.counts(), Default::default());
	assert!(h.index.records_of(IndexKind::Job).is_empty());
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_any_write() {
	let h = harness(job_scorer(0.0));
	let blank_url = h.service.ingest(request("   ", posting_a())).await;
	let blank_company = posting(" ", "Backend Engineer", &["Build APIs"], &[]);
	let blank_company = h.service.ingest(request(URL_A, blank_company)).await;

	assert!(matches!(blank_url, Err(Error::InvalidInput { .. })));
	assert!(matches!(blank_company, Err(Error::InvalidInput { .. })));
	assert_eq!(h.store.counts(), Default::default());
	assert_eq!(h.index.searches(), 0);
}

#[tokio::test]
async fn raw_text_goes_through_the_extractor() {
	let extractor = StaticExtractor { posting: Some(posting_a()) };
	let h = harness_with_extractor(job_scorer(0.0), extractor);
	let response =
		h.service.ingest_text(URL_A, "Acme is hiring a backend engineer.").await.expect("ingest");

	assert!(!response.is_existing);
	assert_eq!(h.store.counts().job_posts, 1);

	let blank = h.service.ingest_text(URL_B, " \n ").await;

	assert!(matches!(blank, Err(Error::InvalidInput { .. })));
}

#[tokio::test]
async fn extractor_failure_is_reported_as_extraction_error() {
	let h = harness(job_scorer(0.0));
	let err = h.service.ingest_text(URL_A, "Acme is hiring a backend engineer.").await;

	assert!(matches!(err, Err(Error::Extraction { .. })));
	assert_eq!(h.store.counts(), Default::default());
}
