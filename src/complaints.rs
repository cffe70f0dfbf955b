use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
	error::{HostelError, Result},
	sql::Store,
	types::{ComplaintForm, ComplaintStatus, ComplaintStatusForm, RoomNo, Usn},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Complaint {
	pub complaint_id: i64,
	pub usn: Usn,
	pub room_no: RoomNo,
	#[serde(rename = "type")]
	pub kind: String,
	pub description: String,
	pub status: ComplaintStatus,
	pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OpenComplaint {
	pub complaint_id: i64,
	pub usn: Usn,
	pub student_name: String,
	pub department_name: String,
	pub year: i64,
	pub room_no: RoomNo,
	#[serde(rename = "type")]
	pub kind: String,
	pub description: String,
	pub status: ComplaintStatus,
	pub created_at: NaiveDateTime,
}

#[instrument(skip(store, form), fields(usn = %form.usn))]
pub async fn apply_complaint(store: &Store, form: ComplaintForm) -> Result<i64> {
	if form.kind.trim().is_empty() {
		return Err(HostelError::InvalidInput("type is required".to_string()));
	}

	let mut conn = store.acquire().await?;
	let done = sqlx::query(
		"INSERT INTO complaint (usn, room_no, type, description, status) VALUES (?, ?, ?, ?, ?)",
	)
	.bind(&form.usn)
	.bind(&form.room_no)
	.bind(&form.kind)
	.bind(&form.description)
	.bind(ComplaintStatus::Pending)
	.execute(&mut *conn)
	.await?;

	let complaint_id = done.last_insert_rowid();
	info!(complaint_id, "Complaint filed");
	Ok(complaint_id)
}

pub async fn student_complaints(store: &Store, usn: &str) -> Result<Vec<Complaint>> {
	let mut conn = store.acquire().await?;
	let complaints = sqlx::query_as(
		"SELECT complaint_id, usn, room_no, type AS kind, description, status, created_at
		FROM complaint
		WHERE usn = ?
		ORDER BY complaint_id DESC",
	)
	.bind(usn)
	.fetch_all(&mut *conn)
	.await?;
	Ok(complaints)
}

/// Everything not yet `Resolved`, newest first.
pub async fn unresolved_complaints(store: &Store) -> Result<Vec<OpenComplaint>> {
	let mut conn = store.acquire().await?;
	let complaints = sqlx::query_as(
		"SELECT c.complaint_id, c.usn, s.name AS student_name, s.department_name, s.year,
			c.room_no, c.type AS kind, c.description, c.status, c.created_at
		FROM complaint c
		JOIN student s ON c.usn = s.usn
		WHERE c.status != ?
		ORDER BY c.created_at DESC, c.complaint_id DESC",
	)
	.bind(ComplaintStatus::Resolved)
	.fetch_all(&mut *conn)
	.await?;
	Ok(complaints)
}

pub async fn active_complaint_count(store: &Store, usn: &str) -> Result<i64> {
	let mut conn = store.acquire().await?;
	let count = sqlx::query_scalar("SELECT COUNT(*) FROM complaint WHERE usn = ? AND status != ?")
		.bind(usn)
		.bind(ComplaintStatus::Resolved)
		.fetch_one(&mut *conn)
		.await?;
	Ok(count)
}

#[instrument(skip(store))]
pub async fn update_complaint_status(store: &Store, form: ComplaintStatusForm) -> Result<ComplaintStatus> {
	let status: ComplaintStatus = form.new_status.parse()?;

	let mut conn = store.acquire().await?;
	let done = sqlx::query("UPDATE complaint SET status = ? WHERE complaint_id = ?")
		.bind(status)
		.bind(form.complaint_id)
		.execute(&mut *conn)
		.await?;

	if done.rows_affected() == 0 {
		return Err(HostelError::NotFound(format!(
			"No complaint found with ID {}",
			form.complaint_id
		)));
	}
	info!(complaint_id = form.complaint_id, %status, "Complaint status changed");
	Ok(status)
}
