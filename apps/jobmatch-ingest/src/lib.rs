use std::{fs, path::PathBuf};

use clap::{
	Parser, Subcommand,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use jobmatch_config::Config;
use jobmatch_domain::posting::ExtractedPosting;
use jobmatch_service::{IngestRequest, JobMatchService};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(
	version = VERSION,
	rename_all = "kebab",
	styles = styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Create the relational schema and the index collections.
	Init,
	/// Ingest an already extracted posting from a JSON file.
	Ingest {
		#[arg(long, value_name = "URL")]
		url: String,
		#[arg(long, value_name = "FILE")]
		posting: PathBuf,
	},
	/// Extract a posting from raw page text, then ingest it.
	Extract {
		#[arg(long, value_name = "URL")]
		url: String,
		#[arg(long, value_name = "FILE")]
		text: PathBuf,
	},
	Show {
		#[arg(long, value_name = "UUID")]
		job_post_id: Uuid,
	},
	/// Delete one observation. The job goes with its last observation.
	Delete {
		#[arg(long, value_name = "UUID")]
		job_post_id: Uuid,
	},
	/// Re-index every stored name, alias and job observation.
	Reindex,
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = jobmatch_config::load(&args.config)?;

	init_tracing(&config)?;

	let service = JobMatchService::connect(config).await?;

	match args.command {
		Command::Init => {
			service.init().await?;

			tracing::info!("Storage and index are ready.");
		},
		Command::Ingest { url, posting } => {
			let raw = fs::read_to_string(&posting)
				.map_err(|err| eyre::eyre!("Failed to read {}: {err}", posting.display()))?;
			let posting: ExtractedPosting = serde_json::from_str(&raw)?;
			let response = service.ingest(IngestRequest { source_url: url, posting }).await?;

			print_json(&response)?;
		},
		Command::Extract { url, text } => {
			let raw_text = fs::read_to_string(&text)
				.map_err(|err| eyre::eyre!("Failed to read {}: {err}", text.display()))?;
			let response = service.ingest_text(&url, &raw_text).await?;

			print_json(&response)?;
		},
		Command::Show { job_post_id } => print_json(&service.get_job_posting(job_post_id).await?)?,
		Command::Delete { job_post_id } =>
			print_json(&service.delete_job_post(job_post_id).await?)?,
		Command::Reindex => print_json(&service.rebuild_index().await?)?,
	}

	Ok(())
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: serde::Serialize,
{
	println!("{}", serde_json::to_string_pretty(value)?);

	Ok(())
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}
