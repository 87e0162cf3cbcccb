pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_companies.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_companies.sql")),
				"tables/002_company_aliases.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_company_aliases.sql")),
				"tables/003_skills.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_skills.sql")),
				"tables/004_skill_aliases.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_skill_aliases.sql")),
				"tables/005_job_masters.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_job_masters.sql")),
				"tables/006_job_master_skills.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_job_master_skills.sql")),
				"tables/007_job_posts.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_job_posts.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
