use std::{
	ops::{Deref, DerefMut},
	str::FromStr,
};

use sqlx::{
	pool::PoolConnection,
	sqlite::{SqliteConnectOptions, SqlitePoolOptions},
	Sqlite, SqliteConnection, SqlitePool, Transaction,
};
use tracing::{debug, info};

use crate::{
	config::Config,
	error::{HostelError, Result},
};

/// Handle to the relational store. Cloning shares the underlying pool.
#[derive(Clone, Debug)]
pub struct Store {
	pool: SqlitePool,
}

impl Store {
	/// Opens the store. Any failure to open or reach it is reported as
	/// [`HostelError::StoreUnavailable`].
	pub async fn connect(config: &Config) -> Result<Store> {
		let options = SqliteConnectOptions::from_str(&config.database_url)
			.map_err(HostelError::StoreUnavailable)?
			.foreign_keys(true)
			.busy_timeout(config.acquire_timeout);

		let pool = SqlitePoolOptions::new()
			.max_connections(config.max_connections)
			.acquire_timeout(config.acquire_timeout)
			.connect_with(options)
			.await
			.map_err(HostelError::StoreUnavailable)?;

		info!(
			max_connections = config.max_connections,
			"Connected to store"
		);
		Ok(Store { pool })
	}

	/// One connection for one logical operation. It goes back to the pool when
	/// the returned [`Conn`] is dropped, on every exit path.
	pub async fn acquire(&self) -> Result<Conn> {
		self.pool
			.acquire()
			.await
			.map(Conn)
			.map_err(HostelError::StoreUnavailable)
	}

	pub async fn apply_schema(&self) -> Result<()> {
		let mut conn = self.acquire().await?;
		for statement in TABLE_SCHEMA {
			sqlx::query(statement).execute(&mut *conn).await?;
		}
		debug!(tables = TABLE_SCHEMA.len(), "Schema applied");
		Ok(())
	}

	pub async fn close(&self) {
		self.pool.close().await;
	}
}

pub struct Conn(PoolConnection<Sqlite>);

impl Conn {
	/// Starts a write transaction scoped to this connection. Dropping the
	/// returned transaction without committing rolls it back.
	///
	/// The write lock is taken by the first statement, before anything is
	/// read, which makes it behave like `BEGIN IMMEDIATE`: a competing writer
	/// waits out the busy timeout instead of failing on a stale snapshot.
	pub async fn begin_write(&mut self) -> Result<Transaction<'_, Sqlite>> {
		let mut tx = sqlx::Connection::begin(&mut *self.0).await?;
		sqlx::query(TAKE_WRITE_LOCK).execute(&mut *tx).await?;
		Ok(tx)
	}
}

// Touches no rows, so no triggers fire.
const TAKE_WRITE_LOCK: &str = "UPDATE room SET no_of_fans = no_of_fans WHERE 0";

impl Deref for Conn {
	type Target = SqliteConnection;

	fn deref(&self) -> &SqliteConnection {
		&self.0
	}
}

impl DerefMut for Conn {
	fn deref_mut(&mut self) -> &mut SqliteConnection {
		&mut self.0
	}
}

pub const TABLE_SCHEMA: &[&str] = &[
	r#"
CREATE TABLE IF NOT EXISTS student (
	usn TEXT NOT NULL PRIMARY KEY,
	name TEXT NOT NULL,
	student_mobile TEXT NOT NULL,
	father_mobile TEXT NOT NULL,
	mother_mobile TEXT NOT NULL,
	email TEXT NOT NULL UNIQUE,
	department_name TEXT NOT NULL,
	year INTEGER NOT NULL,
	blood_group TEXT NOT NULL,
	password TEXT NOT NULL,
	room_allocation_status TEXT NOT NULL DEFAULT 'Pending',
	CHECK(room_allocation_status IN ('Pending', 'Allocated'))
)"#,
	r#"
CREATE TABLE IF NOT EXISTS room (
	room_no TEXT NOT NULL PRIMARY KEY,
	no_of_beds INTEGER NOT NULL,
	no_of_tables INTEGER NOT NULL DEFAULT 0,
	no_of_chairs INTEGER NOT NULL DEFAULT 0,
	no_of_fans INTEGER NOT NULL DEFAULT 0,
	no_of_occupancy INTEGER NOT NULL DEFAULT 0,
	CHECK(no_of_beds >= 0),
	CHECK(no_of_occupancy >= 0 AND no_of_occupancy <= no_of_beds)
)"#,
	r#"
CREATE TABLE IF NOT EXISTS bed (
	room_no TEXT NOT NULL,
	bed_no INTEGER NOT NULL,
	occupied_by TEXT DEFAULT NULL UNIQUE,
	PRIMARY KEY(room_no, bed_no),
	FOREIGN KEY(room_no) REFERENCES room(room_no),
	FOREIGN KEY(occupied_by) REFERENCES student(usn)
)"#,
	r#"
CREATE TABLE IF NOT EXISTS allocation (
	usn TEXT NOT NULL PRIMARY KEY,
	room_no TEXT NOT NULL,
	bed_no INTEGER NOT NULL,
	start_date DATE DEFAULT NULL,
	end_date DATE DEFAULT NULL,
	fees_amount REAL DEFAULT NULL,
	UNIQUE(room_no, bed_no),
	FOREIGN KEY(usn) REFERENCES student(usn),
	FOREIGN KEY(room_no, bed_no) REFERENCES bed(room_no, bed_no)
)"#,
	r#"
CREATE TABLE IF NOT EXISTS fees (
	usn TEXT NOT NULL PRIMARY KEY,
	name TEXT NOT NULL,
	total_fee REAL NOT NULL DEFAULT 0,
	paid REAL NOT NULL DEFAULT 0,
	pending REAL GENERATED ALWAYS AS (total_fee - paid) VIRTUAL,
	status TEXT NOT NULL DEFAULT 'Pending',
	due_date DATE DEFAULT NULL,
	FOREIGN KEY(usn) REFERENCES student(usn)
)"#,
	r#"
CREATE TABLE IF NOT EXISTS leave_request (
	leave_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	usn TEXT NOT NULL,
	room_no TEXT NOT NULL,
	from_date DATE NOT NULL,
	to_date DATE NOT NULL,
	reason TEXT NOT NULL,
	contact TEXT NOT NULL,
	warden_approval TEXT NOT NULL DEFAULT 'Pending',
	created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
	FOREIGN KEY(usn) REFERENCES student(usn)
)"#,
	r#"
CREATE TABLE IF NOT EXISTS complaint (
	complaint_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	usn TEXT NOT NULL,
	room_no TEXT NOT NULL,
	type TEXT NOT NULL,
	description TEXT NOT NULL,
	status TEXT NOT NULL DEFAULT 'Pending',
	created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
	FOREIGN KEY(usn) REFERENCES student(usn)
)"#,
	r#"
CREATE TABLE IF NOT EXISTS notice (
	notice_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	title TEXT NOT NULL,
	description TEXT NOT NULL,
	date_posted DATE NOT NULL
)"#,
	r#"
CREATE TABLE IF NOT EXISTS warden (
	warden_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	name TEXT NOT NULL,
	email TEXT NOT NULL UNIQUE,
	phone TEXT NOT NULL,
	password TEXT NOT NULL
)"#,
];
