pub mod admin;
pub mod arbitration;
pub mod duplicate;
pub mod index;
pub mod ingest;
pub mod memory;
pub mod normalizer;
pub mod postings;
pub mod registration;
pub mod store;

mod error;

pub use admin::RebuildReport;
pub use arbitration::LexicalArbiter;
pub use duplicate::{DuplicateChecker, MatchVia, SemanticMatch};
pub use error::{Error, Result};
pub use index::{IndexHit, IndexQuery, IndexRecord, QdrantIndex, SimilarityIndex};
pub use ingest::{IngestRequest, IngestResponse};
pub use normalizer::{EntityNormalizer, Resolution, ResolutionPath};
pub use postings::{DeleteResponse, JobPostingView};
pub use registration::{EnsuredEntities, JobRegistration, PostingSource, Registered};
pub use store::{PgStore, Store, UnitOfWork};

use std::{future::Future, pin::Pin, sync::Arc};

use jobmatch_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use jobmatch_domain::{kind::IndexKind, posting::ExtractedPosting};
use jobmatch_providers::{arbiter, embedding, extractor};
use jobmatch_storage::{db::Db, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// Yes/no judge for records the similarity index cannot separate on score alone.
pub trait ArbitrationProvider
where
	Self: Send + Sync,
{
	fn is_same<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		subject: IndexKind,
		a: &'a str,
		b: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<bool>>;
}

pub trait ExtractorProvider
where
	Self: Send + Sync,
{
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		raw_text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ExtractedPosting>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub arbiter: Arc<dyn ArbitrationProvider>,
	pub extractor: Arc<dyn ExtractorProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		arbiter: Arc<dyn ArbitrationProvider>,
		extractor: Arc<dyn ExtractorProvider>,
	) -> Self {
		Self { embedding, arbiter, extractor }
	}

	/// HTTP-backed providers, except that a `mock` arbiter compares text lexically.
	pub fn for_config(cfg: &Config) -> Self {
		let mut providers = Self::default();

		if cfg.providers.arbiter.is_mock() {
			providers.arbiter = Arc::new(LexicalArbiter);
		}

		providers
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), arbiter: provider.clone(), extractor: provider }
	}
}

pub struct JobMatchService {
	pub cfg: Config,
	pub store: Arc<dyn Store>,
	pub index: Arc<dyn SimilarityIndex>,
	pub providers: Providers,
}
impl JobMatchService {
	pub fn new(
		cfg: Config,
		store: Arc<dyn Store>,
		index: Arc<dyn SimilarityIndex>,
		providers: Providers,
	) -> Self {
		Self { cfg, store, index, providers }
	}

	/// Wires the Postgres store and the Qdrant index described by `cfg`.
	pub async fn connect(cfg: Config) -> Result<Self> {
		let db = Db::connect(&cfg.storage.postgres).await?;
		let qdrant = QdrantStore::new(&cfg.storage.qdrant)?;
		let providers = Providers::for_config(&cfg);
		let index = QdrantIndex::new(
			qdrant,
			providers.embedding.clone(),
			cfg.providers.embedding.clone(),
		);

		Ok(Self::new(cfg, Arc::new(PgStore::new(db)), Arc::new(index), providers))
	}

	/// Creates the relational schema and the index collections when missing.
	pub async fn init(&self) -> Result<()> {
		self.store.ensure_schema().await?;
		self.index.ensure_ready().await?;

		tracing::info!("Schema and index collections are ready.");

		Ok(())
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl ArbitrationProvider for DefaultProviders {
	fn is_same<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		subject: IndexKind,
		a: &'a str,
		b: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<bool>> {
		Box::pin(arbiter::is_same(cfg, subject, a, b))
	}
}

impl ExtractorProvider for DefaultProviders {
	fn extract<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		raw_text: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<ExtractedPosting>> {
		Box::pin(extractor::extract_posting(cfg, raw_text))
	}
}
