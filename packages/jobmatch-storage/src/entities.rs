//! Companies, skills and their learned aliases.
//!
//! Both entity types share one table layout, so every query is rendered from [`Tables`].

use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use jobmatch_domain::kind::EntityKind;

use crate::{
	Result,
	error::conflict_on_unique,
	models::{EntityAlias, EntityRow},
};

struct Tables {
	entity: &'static str,
	id: &'static str,
	aliases: &'static str,
}

fn tables(kind: EntityKind) -> Tables {
	match kind {
		EntityKind::Company =>
			Tables { entity: "companies", id: "company_id", aliases: "company_aliases" },
		EntityKind::Skill => Tables { entity: "skills", id: "skill_id", aliases: "skill_aliases" },
	}
}

/// Live entity whose canonical name normalizes to `name_norm`.
pub async fn find_by_name(
	executor: &mut PgConnection,
	kind: EntityKind,
	name_norm: &str,
) -> Result<Option<EntityRow>> {
	let Tables { entity, id, .. } = tables(kind);
	let sql = format!(
		"\
SELECT {id} AS entity_id, name
FROM {entity}
WHERE name_norm = $1
	AND deleted_at IS NULL"
	);
	let row = sqlx::query_as::<_, EntityRow>(&sql)
		.bind(name_norm)
		.fetch_optional(&mut *executor)
		.await?;

	Ok(row)
}

/// Exact lookup over canonical names first, then learned aliases.
pub async fn find_by_alias(
	executor: &mut PgConnection,
	kind: EntityKind,
	alias_norm: &str,
) -> Result<Option<EntityRow>> {
	if let Some(row) = find_by_name(&mut *executor, kind, alias_norm).await? {
		return Ok(Some(row));
	}

	let Tables { entity, id, aliases } = tables(kind);
	let sql = format!(
		"\
SELECT e.{id} AS entity_id, e.name
FROM {aliases} a
JOIN {entity} e ON e.{id} = a.{id}
WHERE a.alias_norm = $1
	AND e.deleted_at IS NULL
ORDER BY a.created_at ASC, a.alias_id ASC
LIMIT 1"
	);
	let row = sqlx::query_as::<_, EntityRow>(&sql)
		.bind(alias_norm)
		.fetch_optional(&mut *executor)
		.await?;

	Ok(row)
}

pub async fn get_by_id(
	executor: &mut PgConnection,
	kind: EntityKind,
	entity_id: Uuid,
) -> Result<Option<EntityRow>> {
	let Tables { entity, id, .. } = tables(kind);
	let sql = format!(
		"\
SELECT {id} AS entity_id, name
FROM {entity}
WHERE {id} = $1
	AND deleted_at IS NULL"
	);
	let row = sqlx::query_as::<_, EntityRow>(&sql)
		.bind(entity_id)
		.fetch_optional(&mut *executor)
		.await?;

	Ok(row)
}

/// Inserts a live entity, or returns the existing row when another writer won the race on
/// `name_norm`.
pub async fn insert(
	executor: &mut PgConnection,
	kind: EntityKind,
	name: &str,
	name_norm: &str,
	now: OffsetDateTime,
) -> Result<EntityRow> {
	let Tables { entity, id, .. } = tables(kind);
	let sql = format!(
		"\
INSERT INTO {entity} ({id}, name, name_norm, created_at, updated_at)
VALUES ($1, $2, $3, $4, $4)
ON CONFLICT (name_norm) WHERE deleted_at IS NULL
DO UPDATE SET name = {entity}.name
RETURNING {id} AS entity_id, name"
	);
	let row = sqlx::query_as::<_, EntityRow>(&sql)
		.bind(Uuid::new_v4())
		.bind(name)
		.bind(name_norm)
		.bind(now)
		.fetch_one(&mut *executor)
		.await?;

	Ok(row)
}

/// Records a learned alias. A duplicate `(owner, alias_norm)` pair is a [`crate::Error::Conflict`].
pub async fn insert_alias(
	executor: &mut PgConnection,
	kind: EntityKind,
	owner_id: Uuid,
	alias: &str,
	alias_norm: &str,
	source: &str,
	now: OffsetDateTime,
) -> Result<EntityAlias> {
	let Tables { id, aliases, .. } = tables(kind);
	let sql = format!(
		"\
INSERT INTO {aliases} (alias_id, {id}, alias, alias_norm, source, created_at)
VALUES ($1, $2, $3, $4, $5, $6)
RETURNING alias_id, {id} AS owner_id, alias, alias_norm, source, created_at"
	);
	let row = sqlx::query_as::<_, EntityAlias>(&sql)
		.bind(Uuid::new_v4())
		.bind(owner_id)
		.bind(alias)
		.bind(alias_norm)
		.bind(source)
		.bind(now)
		.fetch_one(&mut *executor)
		.await
		.map_err(|err| {
			conflict_on_unique(err, || {
				format!("{} alias {alias_norm:?} already exists for {owner_id}.", kind.as_str())
			})
		})?;

	Ok(row)
}

/// Every live canonical name and alias, as `(entity_id, text)` pairs for index backfill.
pub async fn list_index_texts(
	executor: &mut PgConnection,
	kind: EntityKind,
) -> Result<Vec<EntityRow>> {
	let Tables { entity, id, aliases } = tables(kind);
	let sql = format!(
		"\
SELECT {id} AS entity_id, name
FROM {entity}
WHERE deleted_at IS NULL
UNION ALL
SELECT a.{id} AS entity_id, a.alias AS name
FROM {aliases} a
JOIN {entity} e ON e.{id} = a.{id}
WHERE e.deleted_at IS NULL
ORDER BY entity_id, name"
	);
	let rows = sqlx::query_as::<_, EntityRow>(&sql).fetch_all(&mut *executor).await?;

	Ok(rows)
}
