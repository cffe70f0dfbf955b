use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
	error::{HostelError, Result},
	sql::Store,
	types::{LeaveApproval, LeaveForm, LeaveStatusForm, RoomNo, Usn},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Leave {
	pub leave_id: i64,
	pub usn: Usn,
	pub room_no: RoomNo,
	pub from_date: NaiveDate,
	pub to_date: NaiveDate,
	pub reason: String,
	pub contact: String,
	pub warden_approval: LeaveApproval,
	pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PendingLeave {
	pub leave_id: i64,
	pub usn: Usn,
	pub student_name: String,
	pub department_name: String,
	pub year: i64,
	pub room_no: RoomNo,
	pub from_date: NaiveDate,
	pub to_date: NaiveDate,
	pub reason: String,
	pub contact: String,
	pub warden_approval: LeaveApproval,
	pub created_at: NaiveDateTime,
}

const LEAVE_COLUMNS: &str =
	"leave_id, usn, room_no, from_date, to_date, reason, contact, warden_approval, created_at";

const RECENT_LIMIT: i64 = 5;

/// Files a leave request awaiting the warden's decision. Returns its id.
#[instrument(skip(store, form), fields(usn = %form.usn))]
pub async fn apply_leave(store: &Store, form: LeaveForm) -> Result<i64> {
	if form.to_date < form.from_date {
		return Err(HostelError::InvalidInput(
			"to_date must not be before from_date".to_string(),
		));
	}

	let mut conn = store.acquire().await?;
	let done = sqlx::query(
		"INSERT INTO leave_request
			(usn, room_no, from_date, to_date, reason, contact, warden_approval)
		VALUES
			(?, ?, ?, ?, ?, ?, ?)",
	)
	.bind(&form.usn)
	.bind(&form.room_no)
	.bind(form.from_date)
	.bind(form.to_date)
	.bind(&form.reason)
	.bind(&form.contact)
	.bind(LeaveApproval::Pending)
	.execute(&mut *conn)
	.await?;

	let leave_id = done.last_insert_rowid();
	info!(leave_id, "Leave requested");
	Ok(leave_id)
}

pub async fn student_leaves(store: &Store, usn: &str) -> Result<Vec<Leave>> {
	let mut conn = store.acquire().await?;
	let leaves = sqlx::query_as(&format!(
		"SELECT {LEAVE_COLUMNS} FROM leave_request WHERE usn = ? ORDER BY leave_id DESC"
	))
	.bind(usn)
	.fetch_all(&mut *conn)
	.await?;
	Ok(leaves)
}

pub async fn recent_student_leaves(store: &Store, usn: &str) -> Result<Vec<Leave>> {
	let mut conn = store.acquire().await?;
	let leaves = sqlx::query_as(&format!(
		"SELECT {LEAVE_COLUMNS} FROM leave_request WHERE usn = ?
		ORDER BY created_at DESC, leave_id DESC
		LIMIT ?"
	))
	.bind(usn)
	.bind(RECENT_LIMIT)
	.fetch_all(&mut *conn)
	.await?;
	Ok(leaves)
}

pub async fn pending_leaves(store: &Store) -> Result<Vec<PendingLeave>> {
	let mut conn = store.acquire().await?;
	let leaves = sqlx::query_as(
		"SELECT l.leave_id, l.usn, s.name AS student_name, s.department_name, s.year,
			l.room_no, l.from_date, l.to_date, l.reason, l.contact, l.warden_approval, l.created_at
		FROM leave_request l
		JOIN student s ON l.usn = s.usn
		WHERE l.warden_approval = ?
		ORDER BY l.created_at DESC, l.leave_id DESC",
	)
	.bind(LeaveApproval::Pending)
	.fetch_all(&mut *conn)
	.await?;
	Ok(leaves)
}

#[instrument(skip(store))]
pub async fn update_leave_status(store: &Store, form: LeaveStatusForm) -> Result<LeaveApproval> {
	let status: LeaveApproval = form.new_status.parse()?;

	let mut conn = store.acquire().await?;
	let done = sqlx::query("UPDATE leave_request SET warden_approval = ? WHERE leave_id = ?")
		.bind(status)
		.bind(form.leave_id)
		.execute(&mut *conn)
		.await?;

	if done.rows_affected() == 0 {
		return Err(HostelError::NotFound(format!(
			"No leave found with ID {}",
			form.leave_id
		)));
	}
	info!(leave_id = form.leave_id, %status, "Leave decided");
	Ok(status)
}
