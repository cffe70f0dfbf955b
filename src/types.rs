use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::HostelError;

pub type Usn = String;
pub type RoomNo = String;
pub type BedNo = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum AllocationStatus {
	Pending,
	Allocated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum LeaveApproval {
	Pending,
	Approved,
	Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ComplaintStatus {
	Pending,
	#[serde(rename = "In Progress")]
	#[sqlx(rename = "In Progress")]
	InProgress,
	Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum FeeStatus {
	Pending,
	#[serde(rename = "Partially Paid")]
	#[sqlx(rename = "Partially Paid")]
	PartiallyPaid,
	Paid,
}

/// A warden may only move a leave request out of `Pending`.
impl FromStr for LeaveApproval {
	type Err = HostelError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Approved" => Ok(LeaveApproval::Approved),
			"Rejected" => Ok(LeaveApproval::Rejected),
			_ => Err(HostelError::InvalidInput(
				"Invalid status, use Approved or Rejected".to_string(),
			)),
		}
	}
}

impl FromStr for ComplaintStatus {
	type Err = HostelError;
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"Pending" => Ok(ComplaintStatus::Pending),
			"In Progress" => Ok(ComplaintStatus::InProgress),
			"Resolved" => Ok(ComplaintStatus::Resolved),
			_ => Err(HostelError::InvalidInput(
				"Invalid status, use one of Pending, In Progress, Resolved".to_string(),
			)),
		}
	}
}

impl fmt::Display for LeaveApproval {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(match self {
			LeaveApproval::Pending => "Pending",
			LeaveApproval::Approved => "Approved",
			LeaveApproval::Rejected => "Rejected",
		})
	}
}

impl fmt::Display for ComplaintStatus {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(match self {
			ComplaintStatus::Pending => "Pending",
			ComplaintStatus::InProgress => "In Progress",
			ComplaintStatus::Resolved => "Resolved",
		})
	}
}

/// The binding of one student to one bed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Allocation {
	pub usn: Usn,
	pub room_no: RoomNo,
	pub bed_no: BedNo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Room {
	pub room_no: RoomNo,
	pub no_of_beds: i64,
	pub no_of_tables: i64,
	pub no_of_chairs: i64,
	pub no_of_fans: i64,
	pub no_of_occupancy: i64,
	pub vacant_beds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Bed {
	pub room_no: RoomNo,
	pub bed_no: BedNo,
	pub occupied_by: Option<Usn>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllocationForm {
	pub usn: Usn,
	pub room_no: RoomNo,
	pub bed_no: BedNo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoAllocationForm {
	pub usn: Usn,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoomForm {
	pub room_no: RoomNo,
	pub no_of_beds: u32,
	#[serde(default)]
	pub no_of_tables: u32,
	#[serde(default)]
	pub no_of_chairs: u32,
	#[serde(default)]
	pub no_of_fans: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomParam {
	pub room_no: RoomNo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsnParam {
	pub usn: Usn,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStudentForm {
	pub usn: Usn,
	pub name: String,
	pub student_mobile: String,
	pub father_mobile: String,
	pub mother_mobile: String,
	pub email: String,
	pub department_name: String,
	pub year: i64,
	pub blood_group: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FormLogin {
	pub email: String,
	pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChangePasswordForm {
	pub email: String,
	pub old_password: String,
	pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaveForm {
	pub usn: Usn,
	pub room_no: RoomNo,
	pub from_date: NaiveDate,
	pub to_date: NaiveDate,
	pub reason: String,
	pub contact: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaveStatusForm {
	pub leave_id: i64,
	pub new_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComplaintForm {
	pub usn: Usn,
	pub room_no: RoomNo,
	#[serde(rename = "type")]
	pub kind: String,
	pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComplaintStatusForm {
	pub complaint_id: i64,
	pub new_status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoticeForm {
	pub title: String,
	pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommonFeeForm {
	pub total_fee: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DueDateForm {
	pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentForm {
	pub usn: Usn,
	pub payment_amount: f64,
}
