//! Hostel fee records, one per registered student.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
	error::{HostelError, Result},
	sql::Store,
	types::{FeeStatus, PaymentForm, Usn},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentUpdate {
	pub paid: f64,
	pub status: FeeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FeeSummary {
	pub total_students: i64,
	pub total_fee_to_collect: f64,
	pub total_collected: f64,
	pub total_pending: f64,
	pub students_paid: i64,
	pub students_unpaid: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FeeDetails {
	pub usn: Usn,
	pub name: String,
	pub total_fee: f64,
	pub paid: f64,
	pub pending: f64,
	pub status: FeeStatus,
	pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FeeListing {
	pub usn: Usn,
	pub name: String,
	pub department: Option<String>,
	pub year: Option<i64>,
	pub total_fee: f64,
	pub paid: f64,
	pub pending: f64,
	pub status: FeeStatus,
	pub due_date: Option<NaiveDate>,
}

/// Applies a payment to what has been paid so far. Overpayment is clamped to
/// the total and marks the fee as paid.
pub fn settle(total_fee: f64, paid: f64, payment: f64) -> PaymentUpdate {
	let paid = paid + payment;
	if paid >= total_fee {
		PaymentUpdate {
			paid: total_fee,
			status: FeeStatus::Paid,
		}
	} else if paid > 0.0 {
		PaymentUpdate {
			paid,
			status: FeeStatus::PartiallyPaid,
		}
	} else {
		PaymentUpdate {
			paid,
			status: FeeStatus::Pending,
		}
	}
}

/// Sets the same total fee on every record. Returns the number of records.
#[instrument(skip(store))]
pub async fn set_common_fee(store: &Store, total_fee: f64) -> Result<u64> {
	if !total_fee.is_finite() || total_fee < 0.0 {
		return Err(HostelError::InvalidInput(
			"total_fee must be a non-negative amount".to_string(),
		));
	}

	let mut conn = store.acquire().await?;
	let done = sqlx::query("UPDATE fees SET total_fee = ?")
		.bind(total_fee)
		.execute(&mut *conn)
		.await?;

	info!(records = done.rows_affected(), "Common fee updated");
	Ok(done.rows_affected())
}

#[instrument(skip(store))]
pub async fn set_due_date(store: &Store, due_date: NaiveDate) -> Result<u64> {
	let mut conn = store.acquire().await?;
	let done = sqlx::query("UPDATE fees SET due_date = ?")
		.bind(due_date)
		.execute(&mut *conn)
		.await?;

	info!(records = done.rows_affected(), "Due date updated");
	Ok(done.rows_affected())
}

#[instrument(skip(store))]
pub async fn record_payment(store: &Store, form: PaymentForm) -> Result<PaymentUpdate> {
	if !form.payment_amount.is_finite() || form.payment_amount < 0.0 {
		return Err(HostelError::InvalidInput(
			"payment_amount must be a non-negative amount".to_string(),
		));
	}

	let mut conn = store.acquire().await?;
	let mut tx = conn.begin_write().await?;

	let current: Option<(f64, f64)> = sqlx::query_as("SELECT total_fee, paid FROM fees WHERE usn = ?")
		.bind(&form.usn)
		.fetch_optional(&mut *tx)
		.await?;
	let (total_fee, paid) = current.ok_or_else(|| {
		HostelError::NotFound(format!("No fee record found for USN {}", form.usn))
	})?;

	let update = settle(total_fee, paid, form.payment_amount);
	sqlx::query("UPDATE fees SET paid = ?, status = ? WHERE usn = ?")
		.bind(update.paid)
		.bind(update.status)
		.bind(&form.usn)
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;
	info!(paid = update.paid, status = ?update.status, "Payment recorded");
	Ok(update)
}

pub async fn fee_summary(store: &Store) -> Result<FeeSummary> {
	let mut conn = store.acquire().await?;
	let summary = sqlx::query_as(
		"SELECT
			COUNT(*) AS total_students,
			COALESCE(SUM(total_fee), 0.0) AS total_fee_to_collect,
			COALESCE(SUM(paid), 0.0) AS total_collected,
			COALESCE(SUM(total_fee - paid), 0.0) AS total_pending,
			COALESCE(SUM(CASE WHEN status = 'Paid' THEN 1 ELSE 0 END), 0) AS students_paid,
			COALESCE(SUM(CASE WHEN status != 'Paid' THEN 1 ELSE 0 END), 0) AS students_unpaid
		FROM fees",
	)
	.fetch_one(&mut *conn)
	.await?;
	Ok(summary)
}

pub async fn student_fee(store: &Store, usn: &str) -> Result<FeeDetails> {
	let mut conn = store.acquire().await?;
	let details: Option<FeeDetails> = sqlx::query_as(
		"SELECT f.usn, COALESCE(s.name, f.name) AS name, f.total_fee, f.paid, f.pending,
			f.status, f.due_date
		FROM fees f
		LEFT JOIN student s ON f.usn = s.usn
		WHERE f.usn = ?",
	)
	.bind(usn)
	.fetch_optional(&mut *conn)
	.await?;

	details.ok_or_else(|| HostelError::NotFound(format!("No fee record found for student USN {usn}")))
}

pub async fn all_fees(store: &Store) -> Result<Vec<FeeListing>> {
	let mut conn = store.acquire().await?;
	let records = sqlx::query_as(
		"SELECT f.usn, COALESCE(s.name, f.name) AS name, s.department_name AS department, s.year,
			f.total_fee, f.paid, f.pending, f.status, f.due_date
		FROM fees f
		LEFT JOIN student s ON f.usn = s.usn
		ORDER BY s.year, s.department_name, f.usn",
	)
	.fetch_all(&mut *conn)
	.await?;
	Ok(records)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_payment() {
		let update = settle(50_000.0, 0.0, 20_000.0);
		assert_eq!(update.paid, 20_000.0);
		assert_eq!(update.status, FeeStatus::PartiallyPaid);
	}

	#[test]
	fn overpayment_clamps_to_total() {
		let update = settle(50_000.0, 40_000.0, 25_000.0);
		assert_eq!(update.paid, 50_000.0);
		assert_eq!(update.status, FeeStatus::Paid);
	}

	#[test]
	fn nothing_paid_stays_pending() {
		let update = settle(50_000.0, 0.0, 0.0);
		assert_eq!(update.paid, 0.0);
		assert_eq!(update.status, FeeStatus::Pending);
	}

	#[test]
	fn zero_fee_counts_as_paid() {
		assert_eq!(settle(0.0, 0.0, 0.0).status, FeeStatus::Paid);
	}
}
