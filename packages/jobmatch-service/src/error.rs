pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid input: {message}")]
	InvalidInput { message: String },
	#[error("Extraction failed: {message}")]
	Extraction { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Index error: {message}")]
	Index { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<jobmatch_storage::Error> for Error {
	fn from(err: jobmatch_storage::Error) -> Self {
		match err {
			jobmatch_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			jobmatch_storage::Error::Conflict(message) => Self::Conflict { message },
			jobmatch_storage::Error::Qdrant(inner) => Self::Index { message: inner.to_string() },
		}
	}
}

impl From<jobmatch_domain::Error> for Error {
	fn from(err: jobmatch_domain::Error) -> Self {
		match err {
			jobmatch_domain::Error::InvalidPosting { message } => Self::InvalidInput { message },
		}
	}
}
