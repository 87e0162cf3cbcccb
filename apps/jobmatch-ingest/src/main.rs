use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = jobmatch_ingest::Args::parse();

	jobmatch_ingest::run(args).await
}
