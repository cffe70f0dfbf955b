//! Student registration and logins. Passwords are stored and compared as
//! plain text.

use serde::Serialize;
use tracing::{info, instrument};

use crate::{
	error::{HostelError, Result},
	sql::Store,
	types::{AllocationStatus, ChangePasswordForm, FeeStatus, FormLogin, NewStudentForm, Usn},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registered {
	pub usn: Usn,
	pub default_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StudentAccount {
	pub usn: Usn,
	pub name: String,
	pub email: String,
	pub room_allocation_status: AllocationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Warden {
	pub id: i64,
	pub name: String,
	pub email: String,
	pub phone: String,
}

#[derive(sqlx::FromRow)]
struct StudentCredentials {
	usn: Usn,
	name: String,
	email: String,
	room_allocation_status: AllocationStatus,
	password: String,
}

#[derive(sqlx::FromRow)]
struct WardenCredentials {
	id: i64,
	name: String,
	email: String,
	phone: String,
	password: String,
}

/// Registers a student with status `Pending` and a zero balance fee record.
/// The default password is the usn.
#[instrument(skip(store, form), fields(usn = %form.usn))]
pub async fn register_student(store: &Store, form: NewStudentForm) -> Result<Registered> {
	if form.usn.trim().is_empty() {
		return Err(HostelError::InvalidInput("usn is required".to_string()));
	}

	let mut conn = store.acquire().await?;
	let mut tx = conn.begin_write().await?;

	sqlx::query(
		"INSERT INTO student
			(usn, name, student_mobile, father_mobile, mother_mobile, email,
			department_name, year, blood_group, password, room_allocation_status)
		VALUES
			(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
	)
	.bind(&form.usn)
	.bind(&form.name)
	.bind(&form.student_mobile)
	.bind(&form.father_mobile)
	.bind(&form.mother_mobile)
	.bind(&form.email)
	.bind(&form.department_name)
	.bind(form.year)
	.bind(&form.blood_group)
	.bind(&form.usn)
	.bind(AllocationStatus::Pending)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"INSERT INTO fees (usn, name, total_fee, paid, status, due_date)
		VALUES (?, ?, 0.0, 0.0, ?, NULL)",
	)
	.bind(&form.usn)
	.bind(&form.name)
	.bind(FeeStatus::Pending)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;
	info!("Student registered");

	Ok(Registered {
		default_password: form.usn.clone(),
		usn: form.usn,
	})
}

pub async fn student_login(store: &Store, form: FormLogin) -> Result<StudentAccount> {
	let mut conn = store.acquire().await?;
	let found: Option<StudentCredentials> = sqlx::query_as(
		"SELECT usn, name, email, room_allocation_status, password FROM student WHERE email = ?",
	)
	.bind(&form.email)
	.fetch_optional(&mut *conn)
	.await?;

	match found {
		Some(creds) if creds.password == form.password => Ok(StudentAccount {
			usn: creds.usn,
			name: creds.name,
			email: creds.email,
			room_allocation_status: creds.room_allocation_status,
		}),
		_ => Err(bad_login()),
	}
}

pub async fn warden_login(store: &Store, form: FormLogin) -> Result<Warden> {
	let mut conn = store.acquire().await?;
	let found: Option<WardenCredentials> = sqlx::query_as(
		"SELECT warden_id AS id, name, email, phone, password FROM warden WHERE email = ?",
	)
	.bind(&form.email)
	.fetch_optional(&mut *conn)
	.await?;

	match found {
		Some(creds) if creds.password == form.password => Ok(Warden {
			id: creds.id,
			name: creds.name,
			email: creds.email,
			phone: creds.phone,
		}),
		_ => Err(bad_login()),
	}
}

#[instrument(skip(store, form), fields(email = %form.email))]
pub async fn change_password(store: &Store, form: ChangePasswordForm) -> Result<()> {
	let mut conn = store.acquire().await?;
	let mut tx = conn.begin_write().await?;

	let current: Option<String> = sqlx::query_scalar("SELECT password FROM student WHERE email = ?")
		.bind(&form.email)
		.fetch_optional(&mut *tx)
		.await?;

	match current {
		None => return Err(HostelError::NotFound("Student not found".to_string())),
		Some(password) if password != form.old_password => {
			return Err(HostelError::Unauthorized("Old password incorrect".to_string()))
		}
		Some(_) => {}
	}

	sqlx::query("UPDATE student SET password = ? WHERE email = ?")
		.bind(&form.new_password)
		.bind(&form.email)
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;
	info!("Password changed");
	Ok(())
}

fn bad_login() -> HostelError {
	HostelError::Unauthorized("Invalid email or password".to_string())
}
