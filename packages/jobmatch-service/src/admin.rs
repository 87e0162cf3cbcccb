use serde::{Deserialize, Serialize};

use crate::{IndexRecord, JobMatchService, Result};
use jobmatch_domain::kind::{EntityKind, IndexKind};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
	pub companies: u64,
	pub skills: u64,
	pub jobs: u64,
	pub failed: u64,
}

impl JobMatchService {
	/// Re-upserts every live name, alias and job observation from the relational store.
	///
	/// Per-record index failures are counted, not fatal.
	pub async fn rebuild_index(&self) -> Result<RebuildReport> {
		let mut uow = self.store.begin().await?;
		let companies = uow.list_entity_texts(EntityKind::Company).await?;
		let skills = uow.list_entity_texts(EntityKind::Skill).await?;
		let jobs = uow.list_job_records().await?;

		uow.rollback().await?;

		let mut report = RebuildReport::default();
		let entity_records = [(EntityKind::Company, companies), (EntityKind::Skill, skills)]
			.into_iter()
			.flat_map(|(kind, rows)| {
				rows.into_iter().map(move |row| IndexRecord {
					kind: IndexKind::from(kind),
					entity_id: row.entity_id,
					text: row.name,
					company_id: None,
					job_post_id: None,
				})
			});

		for record in entity_records.chain(jobs) {
			if let Err(err) = self.index.upsert(&record).await {
				tracing::warn!(
					error = %err,
					kind = record.kind.as_str(),
					entity_id = %record.entity_id,
					"Failed to rebuild index record."
				);

				report.failed += 1;

				continue;
			}

			match record.kind {
				IndexKind::Company => report.companies += 1,
				IndexKind::Skill => report.skills += 1,
				IndexKind::Job => report.jobs += 1,
			}
		}

		tracing::info!(
			companies = report.companies,
			skills = report.skills,
			jobs = report.jobs,
			failed = report.failed,
			"Rebuilt similarity index."
		);

		Ok(report)
	}
}
