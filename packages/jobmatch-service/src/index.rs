//! Similarity index seam and its Qdrant implementation.

use std::sync::Arc;

use qdrant_client::qdrant::ScoredPoint;
use uuid::Uuid;

use crate::{BoxFuture, EmbeddingProvider, Error, Result};
use jobmatch_config::EmbeddingProviderConfig;
use jobmatch_domain::kind::IndexKind;
use jobmatch_storage::qdrant::{self, IndexPoint, PAYLOAD_ENTITY_ID, PAYLOAD_TEXT, QdrantStore};

/// Nearest-neighbor search over embedded entity and job texts.
///
/// Ids returned here are hints: the index may lag the relational store or hold orphans.
pub trait SimilarityIndex
where
	Self: Send + Sync,
{
	fn upsert<'a>(&'a self, record: &'a IndexRecord) -> BoxFuture<'a, Result<()>>;

	/// Hits ordered by descending score, each score within `[0, 1]`.
	fn search<'a>(&'a self, query: IndexQuery<'a>) -> BoxFuture<'a, Result<Vec<IndexHit>>>;

	/// Drops every record of `kind` owned by `entity_id`.
	fn remove(&self, kind: IndexKind, entity_id: Uuid) -> BoxFuture<'_, Result<()>>;

	/// Drops the job records written for one observation.
	fn remove_job_post(&self, job_post_id: Uuid) -> BoxFuture<'_, Result<()>>;

	fn ensure_ready(&self) -> BoxFuture<'_, Result<()>>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct IndexRecord {
	pub kind: IndexKind,
	pub entity_id: Uuid,
	pub text: String,
	/// Owning company; set for job records.
	pub company_id: Option<Uuid>,
	/// Observation the text came from; set for job records.
	pub job_post_id: Option<Uuid>,
}

#[derive(Clone, Copy, Debug)]
pub struct IndexQuery<'a> {
	pub kind: IndexKind,
	pub text: &'a str,
	pub company_id: Option<Uuid>,
	pub top_k: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IndexHit {
	pub entity_id: Uuid,
	pub text: String,
	pub score: f32,
}

pub struct QdrantIndex {
	qdrant: QdrantStore,
	embedding: Arc<dyn EmbeddingProvider>,
	cfg: EmbeddingProviderConfig,
}
impl QdrantIndex {
	pub fn new(
		qdrant: QdrantStore,
		embedding: Arc<dyn EmbeddingProvider>,
		cfg: EmbeddingProviderConfig,
	) -> Self {
		Self { qdrant, embedding, cfg }
	}

	async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
		let vectors = self
			.embedding
			.embed(&self.cfg, &[text.to_string()])
			.await
			.map_err(|err| Error::Index { message: format!("Embedding failed: {err}") })?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(Error::Index {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.len() != self.qdrant.vector_dim as usize {
			return Err(Error::Index {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vector)
	}
}

impl SimilarityIndex for QdrantIndex {
	fn upsert<'a>(&'a self, record: &'a IndexRecord) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let vector = self.embed_one(&record.text).await?;
			let point = IndexPoint {
				kind: record.kind,
				entity_id: record.entity_id,
				text: &record.text,
				company_id: record.company_id,
				job_post_id: record.job_post_id,
				vector,
			};

			Ok(self.qdrant.upsert(point).await?)
		})
	}

	fn search<'a>(&'a self, query: IndexQuery<'a>) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move {
			let vector = self.embed_one(query.text).await?;
			let points = self
				.qdrant
				.search(query.kind, vector, query.company_id, u64::from(query.top_k))
				.await?;

			Ok(points.into_iter().filter_map(hit_from_point).collect())
		})
	}

	fn remove(&self, kind: IndexKind, entity_id: Uuid) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(self.qdrant.delete_entity(kind, entity_id).await?) })
	}

	fn remove_job_post(&self, job_post_id: Uuid) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(self.qdrant.delete_job_post(job_post_id).await?) })
	}

	fn ensure_ready(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(self.qdrant.ensure_collections().await?) })
	}
}

/// Points without a parseable `entity_id` are skipped. Cosine scores are clamped into `[0, 1]`.
fn hit_from_point(point: ScoredPoint) -> Option<IndexHit> {
	let entity_id = qdrant::payload_uuid(&point.payload, PAYLOAD_ENTITY_ID)?;
	let text = qdrant::payload_string(&point.payload, PAYLOAD_TEXT).unwrap_or_default();

	Some(IndexHit { entity_id, text, score: point.score.clamp(0.0, 1.0) })
}
