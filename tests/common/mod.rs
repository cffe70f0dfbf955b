#![allow(dead_code)]

use hostel::{
	accounts, inventory,
	types::{NewRoomForm, NewStudentForm},
	Config, Store,
};
use tempfile::TempDir;

/// Fresh store in a temporary directory. Keep the [`TempDir`] alive for the
/// whole test.
pub async fn create_store() -> (Store, TempDir) {
	let dir = TempDir::new().unwrap();
	let url = format!("sqlite://{}?mode=rwc", dir.path().join("hostel.db").display());
	let config = Config::from_lookup(move |key| match key {
		"DATABASE_URL" => Some(url.clone()),
		_ => None,
	})
	.unwrap();

	let store = Store::connect(&config).await.unwrap();
	store.apply_schema().await.unwrap();
	(store, dir)
}

pub fn student_form(usn: &str, name: &str) -> NewStudentForm {
	NewStudentForm {
		usn: usn.to_string(),
		name: name.to_string(),
		student_mobile: "9000000001".to_string(),
		father_mobile: "9000000002".to_string(),
		mother_mobile: "9000000003".to_string(),
		email: format!("{}@hostel.test", usn.to_lowercase()),
		department_name: "CSE".to_string(),
		year: 2,
		blood_group: "O+".to_string(),
	}
}

pub async fn register(store: &Store, usn: &str) {
	accounts::register_student(store, student_form(usn, &format!("Student {usn}")))
		.await
		.unwrap();
}

pub async fn add_room(store: &Store, room_no: &str, beds: u32) {
	inventory::create_room(
		store,
		NewRoomForm {
			room_no: room_no.to_string(),
			no_of_beds: beds,
			no_of_tables: beds,
			no_of_chairs: beds,
			no_of_fans: 1,
		},
	)
	.await
	.unwrap();
}

pub async fn exec(store: &Store, sql: &str) {
	let mut conn = store.acquire().await.unwrap();
	sqlx::query(sql).execute(&mut *conn).await.unwrap();
}

pub async fn add_warden(store: &Store, name: &str, email: &str, password: &str) {
	let mut conn = store.acquire().await.unwrap();
	sqlx::query("INSERT INTO warden (name, email, phone, password) VALUES (?, ?, '9111111111', ?)")
		.bind(name)
		.bind(email)
		.bind(password)
		.execute(&mut *conn)
		.await
		.unwrap();
}

/// Everything the allocation procedure may touch.
#[derive(Debug, PartialEq)]
pub struct Snapshot {
	pub allocations: Vec<(String, String, i64)>,
	pub beds: Vec<(String, i64, Option<String>)>,
	pub rooms: Vec<(String, i64)>,
	pub students: Vec<(String, String)>,
}

pub async fn snapshot(store: &Store) -> Snapshot {
	let mut conn = store.acquire().await.unwrap();
	let allocations: Vec<(String, String, i64)> = sqlx::query_as("SELECT usn, room_no, bed_no FROM allocation ORDER BY usn")
		.fetch_all(&mut *conn)
		.await
		.unwrap();
	let beds: Vec<(String, i64, Option<String>)> = sqlx::query_as("SELECT room_no, bed_no, occupied_by FROM bed ORDER BY room_no, bed_no")
		.fetch_all(&mut *conn)
		.await
		.unwrap();
	let rooms: Vec<(String, i64)> = sqlx::query_as("SELECT room_no, no_of_occupancy FROM room ORDER BY room_no")
		.fetch_all(&mut *conn)
		.await
		.unwrap();
	let students: Vec<(String, String)> = sqlx::query_as("SELECT usn, room_allocation_status FROM student ORDER BY usn")
		.fetch_all(&mut *conn)
		.await
		.unwrap();

	Snapshot {
		allocations,
		beds,
		rooms,
		students,
	}
}

/// Occupancy, capacity and allocation status agree with the bed and
/// allocation rows.
pub async fn assert_consistent(store: &Store) {
	let mut conn = store.acquire().await.unwrap();

	let miscounted: i64 = sqlx::query_scalar(
		"SELECT COUNT(*) FROM room r
		WHERE r.no_of_occupancy != (
			SELECT COUNT(*) FROM bed b WHERE b.room_no = r.room_no AND b.occupied_by IS NOT NULL
		)",
	)
	.fetch_one(&mut *conn)
	.await
	.unwrap();
	assert_eq!(miscounted, 0, "room occupancy out of step with beds");

	let overfull: i64 =
		sqlx::query_scalar("SELECT COUNT(*) FROM room WHERE no_of_occupancy > no_of_beds")
			.fetch_one(&mut *conn)
			.await
			.unwrap();
	assert_eq!(overfull, 0, "room over capacity");

	let status_mismatch: i64 = sqlx::query_scalar(
		"SELECT COUNT(*) FROM student s
		WHERE (s.room_allocation_status = 'Allocated')
			!= EXISTS (SELECT 1 FROM allocation a WHERE a.usn = s.usn)",
	)
	.fetch_one(&mut *conn)
	.await
	.unwrap();
	assert_eq!(status_mismatch, 0, "allocation status out of step with allocations");

	let stray: i64 = sqlx::query_scalar(
		"SELECT COUNT(*) FROM allocation a
		LEFT JOIN bed b ON a.room_no = b.room_no AND a.bed_no = b.bed_no
		WHERE b.occupied_by IS NULL OR b.occupied_by != a.usn",
	)
	.fetch_one(&mut *conn)
	.await
	.unwrap();
	assert_eq!(stray, 0, "allocation without matching bed occupant");

	let orphaned: i64 = sqlx::query_scalar(
		"SELECT COUNT(*) FROM bed b
		WHERE b.occupied_by IS NOT NULL
			AND NOT EXISTS (
				SELECT 1 FROM allocation a
				WHERE a.usn = b.occupied_by AND a.room_no = b.room_no AND a.bed_no = b.bed_no
			)",
	)
	.fetch_one(&mut *conn)
	.await
	.unwrap();
	assert_eq!(orphaned, 0, "occupied bed without allocation");
}
