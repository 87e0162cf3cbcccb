use uuid::Uuid;

use jobmatch_domain::{
	kind::{EntityKind, IndexKind},
	name::normalize_name,
};
use jobmatch_service::{
	Error, IndexRecord, Resolution, ResolutionPath, SimilarityIndex, Store,
	memory::{MemoryIndex, Verdict},
};

use super::{Harness, harness, posting, request};

async fn seed_indexed_company(h: &Harness, name: &str) -> Uuid {
	let company_id = h.store.seed_company(name);
	let record = IndexRecord {
		kind: IndexKind::Company,
		entity_id: company_id,
		text: name.to_string(),
		company_id: None,
		job_post_id: None,
	};

	h.index.upsert(&record).await.expect("Failed to seed index.");

	company_id
}

async fn resolve_company(h: &Harness, raw_name: &str) -> Resolution {
	let mut uow = h.store.begin().await.expect("Failed to begin unit of work.");
	let resolution = h
		.service
		.company_normalizer()
		.resolve(uow.as_mut(), raw_name)
		.await
		.expect("Failed to resolve company.");

	uow.commit().await.expect("Failed to commit.");

	resolution
}

#[tokio::test]
async fn second_resolution_short_circuits_on_alias() {
	let h = harness(MemoryIndex::new());
	let first = resolve_company(&h, "IBM Korea").await;

	assert!(first.is_created());

	let searches = h.index.searches();
	let second = resolve_company(&h, "  ibm   KOREA ").await;

	assert_eq!(second.entity_id, first.entity_id);
	assert_eq!(second.path, ResolutionPath::Alias);
	assert_eq!(h.index.searches(), searches);
	assert_eq!(h.arbiter.calls(), 0);
	assert_eq!(h.store.counts().companies, 1);
}

#[tokio::test]
async fn score_at_high_threshold_matches_without_arbitration() {
	let h = harness(MemoryIndex::with_scorer(|_, _, _| 0.85));
	let acme = seed_indexed_company(&h, "Acme").await;
	let resolved = resolve_company(&h, "Acme Holdings").await;

	assert_eq!(resolved.entity_id, acme);
	assert_eq!(resolved.name, "Acme");
	assert!(matches!(resolved.path, ResolutionPath::Matched { .. }));
	assert_eq!(h.arbiter.calls(), 0);
	assert_eq!(h.store.counts().company_aliases, 1);

	let again = resolve_company(&h, "acme holdings").await;

	assert_eq!(again.entity_id, acme);
	assert_eq!(again.path, ResolutionPath::Alias);
}

#[tokio::test]
async fn score_just_below_high_threshold_goes_to_arbitration() {
	let h = harness(MemoryIndex::with_scorer(|_, _, _| 0.85 - f32::EPSILON));

	h.arbiter.set_verdict(Verdict::Same);

	let acme = seed_indexed_company(&h, "Acme").await;
	let resolved = resolve_company(&h, "Acme Holdings").await;

	assert_eq!(resolved.entity_id, acme);
	assert!(matches!(resolved.path, ResolutionPath::Arbitrated { .. }));
	assert_eq!(
		h.arbiter.requests(),
		vec![(IndexKind::Company, "Acme Holdings".to_string(), "Acme".to_string())]
	);
	assert_eq!(h.store.counts().company_aliases, 1);

	let searches = h.index.searches();
	let again = resolve_company(&h, "ACME holdings").await;

	assert_eq!(again.entity_id, acme);
	assert_eq!(again.path, ResolutionPath::Alias);
	assert_eq!(h.index.searches(), searches);
	assert_eq!(h.arbiter.calls(), 1);
}

#[tokio::test]
async fn spelling_indexed_by_a_rolled_back_ingest_is_still_learned() {
	let h = harness(MemoryIndex::with_scorer(|kind, query, text| match kind {
		IndexKind::Company if normalize_name(query) == normalize_name(text) => 1.0,
		IndexKind::Company => 0.9,
		_ => 0.0,
	}));
	let first = posting("Acme", "Backend Engineer", &["Build APIs"], &[]);

	h.service.ingest(request("https://a.example/1", first)).await.expect("Failed to ingest.");
	h.store.fail_job_post_writes(true);

	let variant = posting("Acme Corp", "Data Engineer", &["Run pipelines"], &[]);
	let failed = h.service.ingest(request("https://b.example/1", variant)).await;

	assert!(matches!(failed, Err(Error::Storage { .. })));
	assert_eq!(h.store.counts().company_aliases, 0);
	assert!(
		h.index.records_of(IndexKind::Company).iter().any(|record| record.text == "Acme Corp")
	);

	h.store.fail_job_post_writes(false);

	let matched = resolve_company(&h, "Acme Corp").await;

	assert_eq!(matched.name, "Acme");
	assert_eq!(matched.path, ResolutionPath::Matched { score: 1.0 });
	assert_eq!(h.store.counts().company_aliases, 1);

	let searches = h.index.searches();
	let again = resolve_company(&h, "Acme Corp").await;

	assert_eq!(again.entity_id, matched.entity_id);
	assert_eq!(again.path, ResolutionPath::Alias);
	assert_eq!(h.index.searches(), searches);
}

#[tokio::test]
async fn denied_or_failed_arbitration_creates_a_new_entity() {
	let h = harness(MemoryIndex::with_scorer(|_, _, _| 0.80));
	let acme = seed_indexed_company(&h, "Acme").await;
	let denied = resolve_company(&h, "Acme Labs").await;

	assert!(denied.is_created());
	assert_ne!(denied.entity_id, acme);

	h.arbiter.set_verdict(Verdict::Fail);

	let failed = resolve_company(&h, "Acme Studios").await;

	assert!(failed.is_created());
	assert_ne!(failed.entity_id, acme);
	assert_eq!(h.arbiter.calls(), 2);
	assert_eq!(h.store.counts().companies, 3);
	assert_eq!(h.store.counts().company_aliases, 0);
}

#[tokio::test]
async fn score_below_middle_band_creates_without_arbitration() {
	let h = harness(MemoryIndex::with_scorer(|_, _, _| 0.69));

	seed_indexed_company(&h, "Acme").await;

	let resolved = resolve_company(&h, "Initech").await;

	assert!(resolved.is_created());
	assert_eq!(h.arbiter.calls(), 0);
	assert_eq!(h.index.records_of(IndexKind::Company).len(), 2);
}

#[tokio::test]
async fn stale_index_hit_creates_a_new_entity() {
	let h = harness(MemoryIndex::with_scorer(|_, _, _| 0.95));
	let acme = seed_indexed_company(&h, "Acme").await;

	h.store.remove_entity(EntityKind::Company, acme);

	let resolved = resolve_company(&h, "Acme").await;

	assert!(resolved.is_created());
	assert_ne!(resolved.entity_id, acme);
	assert_eq!(h.store.counts().companies, 1);
}

#[tokio::test]
async fn alias_write_failure_does_not_abort_the_unit_of_work() {
	let h = harness(MemoryIndex::with_scorer(
		|_, query, _| if query == "Globex" { 0.0 } else { 0.9 },
	));
	let acme = seed_indexed_company(&h, "Acme").await;

	h.store.fail_alias_writes(true);

	let mut uow = h.store.begin().await.expect("Failed to begin unit of work.");
	let normalizer = h.service.company_normalizer();
	let matched =
		normalizer.resolve(uow.as_mut(), "Acme Holdings").await.expect("Failed to match.");
	let created = normalizer.resolve(uow.as_mut(), "Globex").await.expect("Failed to create.");

	uow.commit().await.expect("Failed to commit.");

	assert_eq!(matched.entity_id, acme);
	assert!(created.is_created());

	let counts = h.store.counts();

	assert_eq!(counts.companies, 2);
	assert_eq!(counts.company_aliases, 0);
}

#[tokio::test]
async fn index_failure_degrades_to_creation() {
	let h = harness(MemoryIndex::with_scorer(|_, _, _| 0.99));

	seed_indexed_company(&h, "Acme").await;
	h.index.fail_search(true);

	let resolved = resolve_company(&h, "Acme Corporation").await;

	assert!(resolved.is_created());
	assert_eq!(h.arbiter.calls(), 0);
}

#[tokio::test]
async fn blank_names_are_rejected_or_skipped() {
	let h = harness(MemoryIndex::new());
	let mut uow = h.store.begin().await.expect("Failed to begin unit of work.");
	let err = h.service.company_normalizer().resolve(uow.as_mut(), "  \t ").await;

	assert!(matches!(err, Err(Error::InvalidInput { .. })));

	let names = ["Rust".to_string(), "   ".to_string(), "rust".to_string(), "Go".to_string()];
	let skills = h
		.service
		.skill_normalizer()
		.resolve_batch(uow.as_mut(), &names)
		.await
		.expect("Failed to resolve skills.");

	uow.commit().await.expect("Failed to commit.");

	assert_eq!(skills.len(), 3);
	assert_eq!(skills[0].entity_id, skills[1].entity_id);
	assert_eq!(skills[1].path, ResolutionPath::Alias);
	assert_eq!(h.store.counts().skills, 2);
}
