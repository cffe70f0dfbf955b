//! Rooms and their beds.
//!
//! A room's `no_of_occupancy` always equals the number of its beds with
//! `occupied_by` set. Only [`crate::allocation`] changes either side.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
	error::{HostelError, Result},
	sql::Store,
	types::{Bed, BedNo, NewRoomForm, Room, RoomNo, Usn},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
	pub room_no: RoomNo,
	pub beds: i64,
	pub tables: i64,
	pub chairs: i64,
	pub fans: i64,
	pub occupancy: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoomTotals {
	pub total_rooms: i64,
	pub total_beds: i64,
	pub occupied_beds: i64,
	pub vacant_beds: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomListing {
	pub summary: RoomTotals,
	pub rooms: Vec<Room>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RoomMember {
	pub usn: Usn,
	pub name: String,
	pub department_name: String,
	pub year: i64,
	pub bed_no: BedNo,
	pub start_date: Option<NaiveDate>,
	pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomDetails {
	pub room_no: RoomNo,
	pub total_beds: i64,
	pub tables: i64,
	pub chairs: i64,
	pub fans: i64,
	pub occupied_beds: i64,
	pub vacant_beds: i64,
	pub available_bed_numbers: Vec<BedNo>,
	pub members: Vec<RoomMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AvailableRoom {
	pub room_no: RoomNo,
	pub no_of_beds: i64,
	pub no_of_occupancy: i64,
	pub vacant_beds: i64,
	/// "occupied/capacity", e.g. "3/4".
	pub occupancy_status: String,
}

/// Upper bound on beds per room. Creation inserts every bed in one
/// transaction.
pub const MAX_BEDS_PER_ROOM: u32 = 64;

const ROOM_COLUMNS: &str = "room_no, no_of_beds, no_of_tables, no_of_chairs, no_of_fans,
	no_of_occupancy, MAX(no_of_beds - no_of_occupancy, 0) AS vacant_beds";

/// Creates the room and beds `1..=no_of_beds` in one transaction.
#[instrument(skip(store))]
pub async fn create_room(store: &Store, form: NewRoomForm) -> Result<RoomSummary> {
	let room_no = form.room_no.trim().to_string();
	if room_no.is_empty() {
		return Err(HostelError::InvalidInput("room_no is required".to_string()));
	}
	if form.no_of_beds > MAX_BEDS_PER_ROOM {
		return Err(HostelError::InvalidInput(format!(
			"no_of_beds must be at most {MAX_BEDS_PER_ROOM}"
		)));
	}

	let summary = RoomSummary {
		room_no,
		beds: i64::from(form.no_of_beds),
		tables: i64::from(form.no_of_tables),
		chairs: i64::from(form.no_of_chairs),
		fans: i64::from(form.no_of_fans),
		occupancy: 0,
	};

	let mut conn = store.acquire().await?;
	let mut tx = conn.begin_write().await?;

	sqlx::query(
		"INSERT INTO room
			(room_no, no_of_beds, no_of_tables, no_of_chairs, no_of_fans, no_of_occupancy)
		VALUES
			(?, ?, ?, ?, ?, 0)",
	)
	.bind(&summary.room_no)
	.bind(summary.beds)
	.bind(summary.tables)
	.bind(summary.chairs)
	.bind(summary.fans)
	.execute(&mut *tx)
	.await?;

	for bed_no in 1..=summary.beds {
		sqlx::query("INSERT INTO bed (room_no, bed_no, occupied_by) VALUES (?, ?, NULL)")
			.bind(&summary.room_no)
			.bind(bed_no)
			.execute(&mut *tx)
			.await?;
	}

	tx.commit().await?;
	info!(room_no = %summary.room_no, beds = summary.beds, "Room created");
	Ok(summary)
}

pub async fn list_rooms(store: &Store) -> Result<RoomListing> {
	let mut conn = store.acquire().await?;
	let rooms: Vec<Room> =
		sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM room ORDER BY room_no ASC"))
			.fetch_all(&mut *conn)
			.await?;

	let summary = rooms.iter().fold(RoomTotals::default(), |mut totals, room| {
		totals.total_rooms += 1;
		totals.total_beds += room.no_of_beds;
		totals.occupied_beds += room.no_of_occupancy;
		totals.vacant_beds += room.vacant_beds;
		totals
	});

	Ok(RoomListing { summary, rooms })
}

pub async fn room(store: &Store, room_no: &str) -> Result<Room> {
	let mut conn = store.acquire().await?;
	sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM room WHERE room_no = ?"))
		.bind(room_no)
		.fetch_optional(&mut *conn)
		.await?
		.ok_or_else(|| no_room(room_no))
}

pub async fn room_details(store: &Store, room_no: &str) -> Result<RoomDetails> {
	let mut conn = store.acquire().await?;

	let room: Room = sqlx::query_as(&format!("SELECT {ROOM_COLUMNS} FROM room WHERE room_no = ?"))
		.bind(room_no)
		.fetch_optional(&mut *conn)
		.await?
		.ok_or_else(|| no_room(room_no))?;

	let members: Vec<RoomMember> = sqlx::query_as(
		"SELECT s.usn, s.name, s.department_name, s.year, a.bed_no, a.start_date, a.end_date
		FROM allocation a
		JOIN student s ON a.usn = s.usn
		WHERE a.room_no = ?
		ORDER BY a.bed_no ASC",
	)
	.bind(room_no)
	.fetch_all(&mut *conn)
	.await?;

	let available_bed_numbers: Vec<BedNo> = sqlx::query_scalar(
		"SELECT bed_no FROM bed WHERE room_no = ? AND occupied_by IS NULL ORDER BY bed_no ASC",
	)
	.bind(room_no)
	.fetch_all(&mut *conn)
	.await?;

	Ok(RoomDetails {
		room_no: room.room_no,
		total_beds: room.no_of_beds,
		tables: room.no_of_tables,
		chairs: room.no_of_chairs,
		fans: room.no_of_fans,
		occupied_beds: room.no_of_occupancy,
		vacant_beds: room.vacant_beds,
		available_bed_numbers,
		members,
	})
}

pub async fn available_rooms(store: &Store) -> Result<Vec<AvailableRoom>> {
	let mut conn = store.acquire().await?;
	Ok(sqlx::query_as(
		"SELECT room_no, no_of_beds, no_of_occupancy,
			no_of_beds - no_of_occupancy AS vacant_beds,
			no_of_occupancy || '/' || no_of_beds AS occupancy_status
		FROM room
		WHERE no_of_beds - no_of_occupancy > 0
		ORDER BY room_no ASC",
	)
	.fetch_all(&mut *conn)
	.await?)
}

pub async fn beds(store: &Store, room_no: &str) -> Result<Vec<Bed>> {
	let mut conn = store.acquire().await?;
	Ok(
		sqlx::query_as("SELECT room_no, bed_no, occupied_by FROM bed WHERE room_no = ? ORDER BY bed_no ASC")
			.bind(room_no)
			.fetch_all(&mut *conn)
			.await?,
	)
}

fn no_room(room_no: &str) -> HostelError {
	HostelError::NotFound(format!("No room found with room_no {room_no}"))
}
