//! Bed allocation.
//!
//! This module is the only writer of `allocation`, `bed.occupied_by`,
//! `room.no_of_occupancy` and `student.room_allocation_status`. The four
//! writes for one allocation happen inside a single transaction, so either all
//! of them are visible or none are.
//!
//! Explicit and automatic allocation share [`allocate`]. Automatic allocation
//! used to issue its writes without opening a transaction first, which could
//! leave an allocation row behind without the matching occupancy update when a
//! later statement failed. Both paths now run the same transactional
//! procedure.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, info, instrument, warn};

use crate::{
	error::{HostelError, Result},
	sql::Store,
	types::{Allocation, AllocationForm, AllocationStatus, AutoAllocationForm, BedNo, RoomNo, Usn},
};

#[derive(Debug)]
enum Target {
	Bed { room_no: RoomNo, bed_no: BedNo },
	FirstVacant,
}

/// Assigns `form.usn` to the given bed.
#[instrument(skip(store))]
pub async fn allocate_explicit(store: &Store, form: AllocationForm) -> Result<Allocation> {
	let target = Target::Bed {
		room_no: form.room_no,
		bed_no: form.bed_no,
	};
	allocate(store, form.usn, target).await
}

/// Assigns `form.usn` to the first vacant bed ordered by room number then bed
/// number. Fails with [`HostelError::Capacity`] when every bed is taken.
#[instrument(skip(store))]
pub async fn allocate_auto(store: &Store, form: AutoAllocationForm) -> Result<Allocation> {
	allocate(store, form.usn, Target::FirstVacant).await
}

async fn allocate(store: &Store, usn: Usn, target: Target) -> Result<Allocation> {
	let mut conn = store.acquire().await?;
	let mut tx = conn.begin_write().await?;

	let outcome = assign(&mut *tx, usn, target).await;
	match outcome {
		Ok(allocation) => {
			tx.commit().await?;
			info!(
				usn = %allocation.usn,
				room_no = %allocation.room_no,
				bed_no = allocation.bed_no,
				"Bed allocated"
			);
			Ok(allocation)
		}
		Err(err) => {
			if let Err(rollback) = tx.rollback().await {
				warn!("Rollback failed: {rollback}");
			}
			debug!("Allocation abandoned: {err}");
			Err(err)
		}
	}
}

async fn assign(conn: &mut SqliteConnection, usn: Usn, target: Target) -> Result<Allocation> {
	let status: Option<AllocationStatus> =
		sqlx::query_scalar("SELECT room_allocation_status FROM student WHERE usn = ?")
			.bind(&usn)
			.fetch_optional(&mut *conn)
			.await?;

	match status {
		None => return Err(HostelError::NotFound(format!("Student {usn} not found"))),
		Some(AllocationStatus::Allocated) => {
			return Err(HostelError::Conflict(format!(
				"Student {usn} already has a bed"
			)))
		}
		Some(AllocationStatus::Pending) => {}
	}

	let (room_no, bed_no) = match target {
		Target::Bed { room_no, bed_no } => {
			check_vacant(conn, &room_no, bed_no).await?;
			(room_no, bed_no)
		}
		Target::FirstVacant => first_vacant_bed(conn).await?.ok_or(HostelError::Capacity)?,
	};

	sqlx::query("INSERT INTO allocation (usn, room_no, bed_no, start_date) VALUES (?, ?, ?, ?)")
		.bind(&usn)
		.bind(&room_no)
		.bind(bed_no)
		.bind(Utc::now().date_naive())
		.execute(&mut *conn)
		.await?;

	let room = sqlx::query(
		"UPDATE room SET no_of_occupancy = no_of_occupancy + 1
		WHERE room_no = ? AND no_of_occupancy < no_of_beds",
	)
	.bind(&room_no)
	.execute(&mut *conn)
	.await?;
	if room.rows_affected() == 0 {
		return Err(HostelError::Conflict(format!("Room {room_no} is full")));
	}

	let student = sqlx::query(
		"UPDATE student SET room_allocation_status = 'Allocated'
		WHERE usn = ? AND room_allocation_status = 'Pending'",
	)
	.bind(&usn)
	.execute(&mut *conn)
	.await?;
	if student.rows_affected() == 0 {
		return Err(HostelError::Conflict(format!(
			"Student {usn} already has a bed"
		)));
	}

	let bed = sqlx::query(
		"UPDATE bed SET occupied_by = ?
		WHERE room_no = ? AND bed_no = ? AND occupied_by IS NULL",
	)
	.bind(&usn)
	.bind(&room_no)
	.bind(bed_no)
	.execute(&mut *conn)
	.await?;
	if bed.rows_affected() == 0 {
		return Err(occupied(&room_no, bed_no));
	}

	Ok(Allocation { usn, room_no, bed_no })
}

async fn check_vacant(conn: &mut SqliteConnection, room_no: &str, bed_no: BedNo) -> Result<()> {
	let room: Option<i64> = sqlx::query_scalar("SELECT 1 FROM room WHERE room_no = ?")
		.bind(room_no)
		.fetch_optional(&mut *conn)
		.await?;
	if room.is_none() {
		return Err(HostelError::NotFound(format!("Room {room_no} not found")));
	}

	let occupant: Option<Option<Usn>> =
		sqlx::query_scalar("SELECT occupied_by FROM bed WHERE room_no = ? AND bed_no = ?")
			.bind(room_no)
			.bind(bed_no)
			.fetch_optional(&mut *conn)
			.await?;

	match occupant {
		None => Err(HostelError::NotFound(format!(
			"Bed {bed_no} not found in room {room_no}"
		))),
		Some(Some(_)) => Err(occupied(room_no, bed_no)),
		Some(None) => Ok(()),
	}
}

async fn first_vacant_bed(conn: &mut SqliteConnection) -> Result<Option<(RoomNo, BedNo)>> {
	Ok(sqlx::query_as::<_, (RoomNo, BedNo)>(
		"SELECT room_no, bed_no FROM bed
		WHERE occupied_by IS NULL
		ORDER BY room_no ASC, bed_no ASC
		LIMIT 1",
	)
	.fetch_optional(&mut *conn)
	.await?)
}

fn occupied(room_no: &str, bed_no: BedNo) -> HostelError {
	HostelError::Conflict(format!("Bed {bed_no} in room {room_no} is already occupied"))
}
