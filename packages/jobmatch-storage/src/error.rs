#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error(transparent)]
	Qdrant(#[from] Box<qdrant_client::QdrantError>),
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}

const UNIQUE_VIOLATION: &str = "23505";

/// Maps a unique-constraint violation to [`Error::Conflict`], leaving other errors untouched.
pub(crate) fn conflict_on_unique(err: sqlx::Error, message: impl FnOnce() -> String) -> Error {
	let is_unique = err
		.as_database_error()
		.and_then(|db_err| db_err.code())
		.map(|code| code == UNIQUE_VIOLATION)
		.unwrap_or(false);

	if is_unique { Error::Conflict(message()) } else { Error::Sqlx(err) }
}
