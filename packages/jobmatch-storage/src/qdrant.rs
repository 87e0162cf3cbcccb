use std::collections::HashMap;

use qdrant_client::{
	Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
		Query, QueryPointsBuilder, ScoredPoint, UpsertPointsBuilder, Value, Vector,
		VectorParamsBuilder, VectorsConfigBuilder, value::Kind,
	},
};
use uuid::Uuid;

use jobmatch_domain::kind::IndexKind;

use crate::Result;

pub const DENSE_VECTOR_NAME: &str = "dense";

const POINT_NAMESPACE: Uuid = Uuid::from_u128(0x5f3a_9c1e_7b24_4d0a_9e61_2c8f_b4d7_0a13);

pub const PAYLOAD_KIND: &str = "kind";
pub const PAYLOAD_ENTITY_ID: &str = "entity_id";
pub const PAYLOAD_TEXT: &str = "text";
pub const PAYLOAD_COMPANY_ID: &str = "company_id";
pub const PAYLOAD_JOB_POST_ID: &str = "job_post_id";

/// One point: an entity's embedded text plus keyword payload used for filtering.
///
/// Several points may share an entity, one per learned spelling or job observation.
pub struct IndexPoint<'a> {
	pub kind: IndexKind,
	pub entity_id: Uuid,
	pub text: &'a str,
	pub company_id: Option<Uuid>,
	pub job_post_id: Option<Uuid>,
	pub vector: Vec<f32>,
}

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub company_collection: String,
	pub skill_collection: String,
	pub job_collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &jobmatch_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self {
			client,
			company_collection: cfg.company_collection.clone(),
			skill_collection: cfg.skill_collection.clone(),
			job_collection: cfg.job_collection.clone(),
			vector_dim: cfg.vector_dim,
		})
	}

	pub fn collection(&self, kind: IndexKind) -> &str {
		match kind {
			IndexKind::Company => &self.company_collection,
			IndexKind::Skill => &self.skill_collection,
			IndexKind::Job => &self.job_collection,
		}
	}

	/// Creates any missing collection. Existing collections are left as they are.
	pub async fn ensure_collections(&self) -> Result<()> {
		for kind in IndexKind::ALL {
			let name = self.collection(kind);

			if self.client.collection_exists(name).await? {
				continue;
			}

			let mut vectors_config = VectorsConfigBuilder::default();

			vectors_config.add_named_vector_params(
				DENSE_VECTOR_NAME,
				VectorParamsBuilder::new(self.vector_dim.into(), Distance::Cosine),
			);

			self.client
				.create_collection(
					CreateCollectionBuilder::new(name.to_string()).vectors_config(vectors_config),
				)
				.await?;
		}

		Ok(())
	}

	pub async fn upsert(&self, point: IndexPoint<'_>) -> Result<()> {
		let id = point_id(&point);
		let mut payload_map = HashMap::new();

		payload_map.insert(PAYLOAD_KIND.to_string(), Value::from(point.kind.as_str().to_string()));
		payload_map.insert(PAYLOAD_ENTITY_ID.to_string(), Value::from(point.entity_id.to_string()));
		payload_map.insert(PAYLOAD_TEXT.to_string(), Value::from(point.text.to_string()));

		if let Some(company_id) = point.company_id {
			payload_map.insert(PAYLOAD_COMPANY_ID.to_string(), Value::from(company_id.to_string()));
		}
		if let Some(job_post_id) = point.job_post_id {
			payload_map
				.insert(PAYLOAD_JOB_POST_ID.to_string(), Value::from(job_post_id.to_string()));
		}

		let mut vector_map = HashMap::new();

		vector_map.insert(DENSE_VECTOR_NAME.to_string(), Vector::from(point.vector));

		let collection = self.collection(point.kind).to_string();
		let record = PointStruct::new(id.to_string(), vector_map, Payload::from(payload_map));
		let upsert = UpsertPointsBuilder::new(collection, vec![record]).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	/// Nearest points of `kind`, optionally restricted to one company.
	pub async fn search(
		&self,
		kind: IndexKind,
		vector: Vec<f32>,
		company_id: Option<Uuid>,
		limit: u64,
	) -> Result<Vec<ScoredPoint>> {
		let mut search = QueryPointsBuilder::new(self.collection(kind).to_string())
			.query(Query::new_nearest(vector))
			.using(DENSE_VECTOR_NAME)
			.with_payload(true)
			.limit(limit);

		if let Some(company_id) = company_id {
			search = search.filter(Filter::must([Condition::matches(
				PAYLOAD_COMPANY_ID,
				company_id.to_string(),
			)]));
		}

		let response = self.client.query(search).await?;

		Ok(response.result)
	}

	/// Removes every point of `kind` whose payload `entity_id` matches.
	pub async fn delete_entity(&self, kind: IndexKind, entity_id: Uuid) -> Result<()> {
		self.delete_matching(kind, PAYLOAD_ENTITY_ID, entity_id).await
	}

	/// Removes the job points written for one observation.
	pub async fn delete_job_post(&self, job_post_id: Uuid) -> Result<()> {
		self.delete_matching(IndexKind::Job, PAYLOAD_JOB_POST_ID, job_post_id).await
	}

	async fn delete_matching(&self, kind: IndexKind, key: &str, id: Uuid) -> Result<()> {
		let filter = Filter::must([Condition::matches(key, id.to_string())]);
		let delete =
			DeletePointsBuilder::new(self.collection(kind).to_string()).points(filter).wait(true);

		self.client.delete_points(delete).await?;

		Ok(())
	}
}

/// Stable per (kind, entity, observation, text): re-indexing overwrites instead of duplicating.
fn point_id(point: &IndexPoint<'_>) -> Uuid {
	let job_post_id = point.job_post_id.map(|id| id.to_string()).unwrap_or_default();
	let key = format!("{}:{}:{job_post_id}:{}", point.kind.as_str(), point.entity_id, point.text);

	Uuid::new_v5(&POINT_NAMESPACE, key.as_bytes())
}

pub fn payload_uuid(payload: &HashMap<String, Value>, key: &str) -> Option<Uuid> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Uuid::parse_str(text).ok(),
		_ => None,
	}
}

pub fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}
