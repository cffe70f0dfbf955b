//! Read-only projections over students, rooms, beds and allocations.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
	error::{HostelError, Result},
	sql::{Conn, Store},
	types::{AllocationStatus, BedNo, ComplaintStatus, LeaveApproval, RoomNo, Usn},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StudentListing {
	pub usn: Usn,
	pub name: String,
	pub student_mobile: String,
	pub father_mobile: String,
	pub mother_mobile: String,
	pub email: String,
	pub room_no: Option<RoomNo>,
	pub bed_no: Option<BedNo>,
	pub room_allocation_status: AllocationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PendingStudent {
	pub usn: Usn,
	pub name: String,
	pub student_mobile: String,
	pub father_mobile: String,
	pub mother_mobile: String,
	pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StudentProfile {
	pub usn: Usn,
	pub name: String,
	pub email: String,
	pub student_mobile: String,
	pub father_mobile: String,
	pub mother_mobile: String,
	pub department_name: String,
	pub year: i64,
	pub blood_group: String,
	pub room_allocation_status: AllocationStatus,
	pub room_no: Option<RoomNo>,
	pub bed_no: Option<BedNo>,
	pub start_date: Option<NaiveDate>,
	pub end_date: Option<NaiveDate>,
	pub fees_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StudentRoom {
	pub room_no: RoomNo,
	pub no_of_tables: i64,
	pub no_of_chairs: i64,
	pub no_of_fans: i64,
	pub capacity: i64,
	pub occupied: i64,
	pub available: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Roommate {
	pub usn: Usn,
	pub name: String,
	pub department_name: String,
	pub year: i64,
	pub email: String,
	pub bed_no: BedNo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Roommates {
	pub room_no: RoomNo,
	pub count: usize,
	pub roommates: Vec<Roommate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DashboardSummary {
	pub total_students: i64,
	pub occupied_rooms: i64,
	pub vacant_rooms: i64,
	pub pending_complaints: i64,
	pub pending_leaves: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RecentComplaint {
	pub usn: Usn,
	pub name: Option<String>,
	pub room_no: RoomNo,
	#[serde(rename = "type")]
	pub kind: String,
	pub description: String,
	pub status: ComplaintStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RecentLeave {
	pub usn: Usn,
	pub name: Option<String>,
	pub room_no: RoomNo,
	pub from_date: NaiveDate,
	pub to_date: NaiveDate,
	pub reason: String,
	pub warden_approval: LeaveApproval,
}

const RECENT_LIMIT: i64 = 4;

pub async fn list_students(store: &Store) -> Result<Vec<StudentListing>> {
	let mut conn = store.acquire().await?;
	Ok(sqlx::query_as(
		"SELECT s.usn, s.name, s.student_mobile, s.father_mobile, s.mother_mobile, s.email,
			a.room_no, a.bed_no, s.room_allocation_status
		FROM student s
		LEFT JOIN allocation a ON s.usn = a.usn
		ORDER BY s.usn ASC",
	)
	.fetch_all(&mut *conn)
	.await?)
}

pub async fn pending_students(store: &Store) -> Result<Vec<PendingStudent>> {
	let mut conn = store.acquire().await?;
	Ok(sqlx::query_as(
		"SELECT usn, name, student_mobile, father_mobile, mother_mobile, email
		FROM student
		WHERE room_allocation_status = ?
		ORDER BY usn ASC",
	)
	.bind(AllocationStatus::Pending)
	.fetch_all(&mut *conn)
	.await?)
}

pub async fn student_profile(store: &Store, usn: &str) -> Result<StudentProfile> {
	let mut conn = store.acquire().await?;
	sqlx::query_as(
		"SELECT s.usn, s.name, s.email, s.student_mobile, s.father_mobile, s.mother_mobile,
			s.department_name, s.year, s.blood_group, s.room_allocation_status,
			a.room_no, a.bed_no, a.start_date, a.end_date, a.fees_amount
		FROM student s
		LEFT JOIN allocation a ON s.usn = a.usn
		WHERE s.usn = ?",
	)
	.bind(usn)
	.fetch_optional(&mut *conn)
	.await?
	.ok_or_else(|| HostelError::NotFound("Student not found".to_string()))
}

pub async fn student_room(store: &Store, usn: &str) -> Result<StudentRoom> {
	let mut conn = store.acquire().await?;
	let room_no = allocated_room(&mut conn, usn).await?;

	sqlx::query_as(
		"SELECT room_no, no_of_tables, no_of_chairs, no_of_fans,
			no_of_beds AS capacity,
			no_of_occupancy AS occupied,
			MAX(no_of_beds - no_of_occupancy, 0) AS available
		FROM room
		WHERE room_no = ?",
	)
	.bind(&room_no)
	.fetch_optional(&mut *conn)
	.await?
	.ok_or_else(|| HostelError::NotFound("Room not found".to_string()))
}

/// Everyone sharing the student's room, the student excluded.
pub async fn roommates(store: &Store, usn: &str) -> Result<Roommates> {
	let mut conn = store.acquire().await?;
	let room_no = allocated_room(&mut conn, usn).await?;

	let roommates: Vec<Roommate> = sqlx::query_as(
		"SELECT s.usn, s.name, s.department_name, s.year, s.email, a.bed_no
		FROM allocation a
		JOIN student s ON a.usn = s.usn
		WHERE a.room_no = ? AND a.usn != ?
		ORDER BY a.bed_no ASC",
	)
	.bind(&room_no)
	.bind(usn)
	.fetch_all(&mut *conn)
	.await?;

	Ok(Roommates {
		room_no,
		count: roommates.len(),
		roommates,
	})
}

pub async fn dashboard_summary(store: &Store) -> Result<DashboardSummary> {
	let mut conn = store.acquire().await?;
	Ok(sqlx::query_as(
		"SELECT
			(SELECT COUNT(*) FROM student) AS total_students,
			(SELECT COUNT(*) FROM room WHERE no_of_occupancy > 0) AS occupied_rooms,
			(SELECT COUNT(*) FROM room WHERE no_of_occupancy < no_of_beds) AS vacant_rooms,
			(SELECT COUNT(*) FROM complaint WHERE status != 'Resolved') AS pending_complaints,
			(SELECT COUNT(*) FROM leave_request WHERE warden_approval = 'Pending') AS pending_leaves",
	)
	.fetch_one(&mut *conn)
	.await?)
}

pub async fn recent_complaints(store: &Store) -> Result<Vec<RecentComplaint>> {
	let mut conn = store.acquire().await?;
	Ok(sqlx::query_as(
		"SELECT c.usn, s.name, c.room_no, c.type AS kind, c.description, c.status
		FROM complaint c
		LEFT JOIN student s ON c.usn = s.usn
		ORDER BY c.complaint_id DESC
		LIMIT ?",
	)
	.bind(RECENT_LIMIT)
	.fetch_all(&mut *conn)
	.await?)
}

pub async fn recent_leaves(store: &Store) -> Result<Vec<RecentLeave>> {
	let mut conn = store.acquire().await?;
	Ok(sqlx::query_as(
		"SELECT l.usn, s.name, l.room_no, l.from_date, l.to_date, l.reason, l.warden_approval
		FROM leave_request l
		LEFT JOIN student s ON l.usn = s.usn
		ORDER BY l.leave_id DESC
		LIMIT ?",
	)
	.bind(RECENT_LIMIT)
	.fetch_all(&mut *conn)
	.await?)
}

async fn allocated_room(conn: &mut Conn, usn: &str) -> Result<RoomNo> {
	sqlx::query_scalar::<_, RoomNo>("SELECT room_no FROM allocation WHERE usn = ?")
		.bind(usn)
		.fetch_optional(&mut **conn)
		.await?
		.ok_or_else(|| HostelError::NotFound("Student not allocated".to_string()))
}
