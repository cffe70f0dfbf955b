use axum::{
	extract::rejection::JsonRejection,
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, HostelError>;

#[derive(Error, Debug)]
pub enum HostelError {
	/// The store could not be opened, reached, or a connection acquired.
	#[error("Database connection failed")]
	StoreUnavailable(#[source] sqlx::Error),

	#[error("{0}")]
	NotFound(String),

	/// Bed already occupied, student already allocated, room full.
	#[error("{0}")]
	Conflict(String),

	#[error("No vacant beds available")]
	Capacity,

	/// Write rejected by a unique, foreign key, not null or check constraint.
	#[error("Constraint violated: {0}")]
	ConstraintViolation(String),

	#[error("{0}")]
	InvalidInput(String),

	#[error("{0}")]
	Unauthorized(String),

	#[error("Internal store error")]
	Store(#[source] sqlx::Error),
}

impl HostelError {
	pub fn kind(&self) -> &'static str {
		match self {
			HostelError::StoreUnavailable(_) => "store_unavailable",
			HostelError::NotFound(_) => "not_found",
			HostelError::Conflict(_) => "conflict",
			HostelError::Capacity => "capacity",
			HostelError::ConstraintViolation(_) => "constraint_violation",
			HostelError::InvalidInput(_) => "invalid_input",
			HostelError::Unauthorized(_) => "unauthorized",
			HostelError::Store(_) => "store",
		}
	}

	pub fn status_code(&self) -> StatusCode {
		match self {
			HostelError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
			HostelError::NotFound(_) => StatusCode::NOT_FOUND,
			HostelError::Conflict(_)
			| HostelError::Capacity
			| HostelError::ConstraintViolation(_) => StatusCode::CONFLICT,
			HostelError::InvalidInput(_) => StatusCode::BAD_REQUEST,
			HostelError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
			HostelError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<sqlx::Error> for HostelError {
	fn from(err: sqlx::Error) -> Self {
		if let sqlx::Error::Database(db) = &err {
			if matches!(
				db.kind(),
				ErrorKind::UniqueViolation
					| ErrorKind::ForeignKeyViolation
					| ErrorKind::NotNullViolation
					| ErrorKind::CheckViolation
			) {
				return HostelError::ConstraintViolation(db.message().to_string());
			}
		}

		if is_busy(&err) {
			return HostelError::StoreUnavailable(err);
		}

		match err {
			sqlx::Error::PoolTimedOut
			| sqlx::Error::PoolClosed
			| sqlx::Error::WorkerCrashed
			| sqlx::Error::Io(_) => HostelError::StoreUnavailable(err),
			other => HostelError::Store(other),
		}
	}
}

/// Malformed or mistyped request bodies.
impl From<JsonRejection> for HostelError {
	fn from(rejection: JsonRejection) -> Self {
		HostelError::InvalidInput(rejection.body_text())
	}
}

/// SQLITE_BUSY and SQLITE_LOCKED with their extended codes. Writers wait for
/// the lock up to the busy timeout, so seeing one means the store stayed
/// locked for that long.
fn is_busy(err: &sqlx::Error) -> bool {
	match err {
		sqlx::Error::Database(db) => db
			.code()
			.is_some_and(|code| matches!(code.as_ref(), "5" | "6" | "261" | "262" | "517" | "773")),
		_ => false,
	}
}

#[derive(Serialize)]
struct ErrorBody<'a> {
	status: &'static str,
	kind: &'a str,
	message: String,
}

impl IntoResponse for HostelError {
	fn into_response(self) -> Response {
		match &self {
			HostelError::Store(e) => error!("store error: {e}"),
			HostelError::StoreUnavailable(e) => warn!("store unavailable: {e}"),
			_ => {}
		}

		let body = ErrorBody {
			status: "error",
			kind: self.kind(),
			message: self.to_string(),
		};

		(self.status_code(), Json(body)).into_response()
	}
}
