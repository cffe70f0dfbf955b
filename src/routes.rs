//! HTTP handlers. Each one deserializes its payload, calls one operation and
//! wraps the outcome in the JSON envelope.

use std::sync::Arc;

use axum::{
	extract::{FromRequest, Path, State},
	routing::{get, post},
	Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
	accounts, allocation, complaints, directory,
	error::{HostelError, Result},
	fees::{self, FeeListing},
	inventory, leave, notices,
	reply::{Counted, Empty, Named, Reply},
	sql::Store,
	types::{
		AllocationForm, AutoAllocationForm, ChangePasswordForm, CommonFeeForm, ComplaintForm,
		ComplaintStatusForm, DueDateForm, FormLogin, LeaveForm, LeaveStatusForm, NewRoomForm,
		NewStudentForm, NoticeForm, PaymentForm, RoomParam, Usn, UsnParam,
	},
};

pub type SharedState = Arc<ServerState>;

pub struct ServerState {
	pub store: Store,
}

type Answer<T> = Result<Json<Reply<T>>>;

/// JSON body whose rejections are answered with the error envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(HostelError))]
struct Payload<T>(T);

pub fn router(store: Store) -> Router {
	let state: SharedState = Arc::new(ServerState { store });

	Router::new()
		.route("/warden-login", post(warden_login))
		.route("/student-login", post(student_login))
		.route("/student-change-password", post(change_password))
		.route("/add-student", post(add_student))
		.route("/students", get(students))
		.route("/pending-students", get(pending_students))
		.route("/student/:usn", get(student))
		.route("/student-room/:usn", get(student_room))
		.route("/roommates/:usn", get(roommates))
		.route("/add-room", post(add_room))
		.route("/rooms", get(rooms))
		.route("/room/details", post(room_details))
		.route("/available-rooms", get(available_rooms))
		.route("/allocate-room", post(allocate_room))
		.route("/auto-allocate", post(auto_allocate))
		.route("/apply-leave", post(apply_leave))
		.route("/student-leaves/:usn", get(student_leaves))
		.route("/student/recent-leaves", post(recent_student_leaves))
		.route("/leaves/pending", get(pending_leaves))
		.route("/leave/update-status", post(update_leave_status))
		.route("/apply-complaint", post(apply_complaint))
		.route("/student-complaints/:usn", get(student_complaints))
		.route("/complaints/unresolved", get(unresolved_complaints))
		.route("/complaint/update-status", post(update_complaint_status))
		.route("/complaint/active-count", post(active_complaint_count))
		.route("/notice/add", post(add_notice))
		.route("/notice/all", get(all_notices))
		.route("/fees/update-common-fee", post(update_common_fee))
		.route("/fees/update-due-date", post(update_due_date))
		.route("/fees/update-payment", post(update_payment))
		.route("/fees/summary", get(fee_summary))
		.route("/fees/student", post(student_fee))
		.route("/fees/all", get(all_fees))
		.route("/dashboard/summary", get(dashboard_summary))
		.route("/dashboard/recent-complaints", get(recent_complaints))
		.route("/dashboard/recent-leaves", get(recent_leaves))
		.layer(CorsLayer::permissive())
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

// accounts

async fn warden_login(State(stt): State<SharedState>, Payload(form): Payload<FormLogin>) -> Answer<Named<accounts::Warden>> {
	let warden = accounts::warden_login(&stt.store, form).await?;
	Ok(Reply::with_message(format!("Welcome {}!", warden.name), Named::new("warden", warden)))
}

async fn student_login(
	State(stt): State<SharedState>,
	Payload(form): Payload<FormLogin>,
) -> Answer<Named<accounts::StudentAccount>> {
	let student = accounts::student_login(&stt.store, form).await?;
	Ok(Reply::ok(Named::new("student", student)))
}

async fn change_password(State(stt): State<SharedState>, Payload(form): Payload<ChangePasswordForm>) -> Answer<Empty> {
	accounts::change_password(&stt.store, form).await?;
	Ok(Reply::message("Password updated successfully"))
}

async fn add_student(
	State(stt): State<SharedState>,
	Payload(form): Payload<NewStudentForm>,
) -> Answer<accounts::Registered> {
	let name = form.name.clone();
	let registered = accounts::register_student(&stt.store, form).await?;
	Ok(Reply::with_message(format!("Student {name} added successfully!"), registered))
}

// directory

async fn students(State(stt): State<SharedState>) -> Answer<Counted<directory::StudentListing>> {
	let students = directory::list_students(&stt.store).await?;
	Ok(Reply::ok(Counted::new("data", students)))
}

async fn pending_students(State(stt): State<SharedState>) -> Answer<Counted<directory::PendingStudent>> {
	let students = directory::pending_students(&stt.store).await?;
	Ok(Reply::ok(Counted::new("pending_students", students)))
}

async fn student(State(stt): State<SharedState>, Path(usn): Path<Usn>) -> Answer<Named<directory::StudentProfile>> {
	let profile = directory::student_profile(&stt.store, &usn).await?;
	Ok(Reply::ok(Named::new("student", profile)))
}

async fn student_room(State(stt): State<SharedState>, Path(usn): Path<Usn>) -> Answer<Named<directory::StudentRoom>> {
	let room = directory::student_room(&stt.store, &usn).await?;
	Ok(Reply::ok(Named::new("room_summary", room)))
}

async fn roommates(State(stt): State<SharedState>, Path(usn): Path<Usn>) -> Answer<directory::Roommates> {
	Ok(Reply::ok(directory::roommates(&stt.store, &usn).await?))
}

async fn dashboard_summary(State(stt): State<SharedState>) -> Answer<Named<directory::DashboardSummary>> {
	let summary = directory::dashboard_summary(&stt.store).await?;
	Ok(Reply::ok(Named::new("dashboard_summary", summary)))
}

async fn recent_complaints(State(stt): State<SharedState>) -> Answer<Named<Vec<directory::RecentComplaint>>> {
	let complaints = directory::recent_complaints(&stt.store).await?;
	Ok(Reply::ok(Named::new("recent_complaints", complaints)))
}

async fn recent_leaves(State(stt): State<SharedState>) -> Answer<Named<Vec<directory::RecentLeave>>> {
	let leaves = directory::recent_leaves(&stt.store).await?;
	Ok(Reply::ok(Named::new("recent_leaves", leaves)))
}

// inventory

async fn add_room(State(stt): State<SharedState>, Payload(form): Payload<NewRoomForm>) -> Answer<Named<inventory::RoomSummary>> {
	let room = inventory::create_room(&stt.store, form).await?;
	Ok(Reply::with_message(
		format!("Room {} added successfully with {} beds!", room.room_no, room.beds),
		Named::new("room_details", room),
	))
}

async fn rooms(State(stt): State<SharedState>) -> Answer<inventory::RoomListing> {
	Ok(Reply::ok(inventory::list_rooms(&stt.store).await?))
}

async fn room_details(State(stt): State<SharedState>, Payload(param): Payload<RoomParam>) -> Answer<Named<inventory::RoomDetails>> {
	let details = inventory::room_details(&stt.store, &param.room_no).await?;
	Ok(Reply::ok(Named::new("room_details", details)))
}

async fn available_rooms(State(stt): State<SharedState>) -> Answer<Counted<inventory::AvailableRoom>> {
	let rooms = inventory::available_rooms(&stt.store).await?;
	Ok(Reply::ok(Counted::new("available_rooms", rooms)))
}

// allocation

async fn allocate_room(
	State(stt): State<SharedState>,
	Payload(form): Payload<AllocationForm>,
) -> Answer<Named<crate::types::Allocation>> {
	let done = allocation::allocate_explicit(&stt.store, form).await?;
	Ok(Reply::with_message(
		format!(
			"Student {} allocated Room {}, Bed {} successfully!",
			done.usn, done.room_no, done.bed_no
		),
		Named::new("allocation", done),
	))
}

async fn auto_allocate(
	State(stt): State<SharedState>,
	Payload(form): Payload<AutoAllocationForm>,
) -> Answer<Named<crate::types::Allocation>> {
	let done = allocation::allocate_auto(&stt.store, form).await?;
	Ok(Reply::with_message(
		format!(
			"Auto allocated Student {} to Room {}, Bed {}",
			done.usn, done.room_no, done.bed_no
		),
		Named::new("allocation", done),
	))
}

// leave

async fn apply_leave(State(stt): State<SharedState>, Payload(form): Payload<LeaveForm>) -> Answer<Named<i64>> {
	let message = format!(
		"Leave request submitted successfully from {} to {}!",
		form.from_date, form.to_date
	);
	let leave_id = leave::apply_leave(&stt.store, form).await?;
	Ok(Reply::with_message(message, Named::new("leave_id", leave_id)))
}

async fn student_leaves(State(stt): State<SharedState>, Path(usn): Path<Usn>) -> Answer<Counted<leave::Leave>> {
	let leaves = leave::student_leaves(&stt.store, &usn).await?;
	Ok(Reply::ok(Counted::new("leaves", leaves)))
}

#[derive(Serialize)]
struct RecentStudentLeaves {
	usn: Usn,
	recent_leaves: Vec<leave::Leave>,
}

async fn recent_student_leaves(State(stt): State<SharedState>, Payload(param): Payload<UsnParam>) -> Answer<RecentStudentLeaves> {
	let recent_leaves = leave::recent_student_leaves(&stt.store, &param.usn).await?;
	Ok(Reply::ok(RecentStudentLeaves {
		usn: param.usn,
		recent_leaves,
	}))
}

async fn pending_leaves(State(stt): State<SharedState>) -> Answer<Counted<leave::PendingLeave>> {
	let leaves = leave::pending_leaves(&stt.store).await?;
	Ok(Reply::ok(Counted::new("pending_leaves", leaves)))
}

async fn update_leave_status(State(stt): State<SharedState>, Payload(form): Payload<LeaveStatusForm>) -> Answer<Empty> {
	let leave_id = form.leave_id;
	let status = leave::update_leave_status(&stt.store, form).await?;
	Ok(Reply::message(format!("Leave ID {leave_id} updated to {status}")))
}

// complaints

async fn apply_complaint(State(stt): State<SharedState>, Payload(form): Payload<ComplaintForm>) -> Answer<Named<i64>> {
	let message = format!("Complaint of type '{}' submitted successfully!", form.kind);
	let complaint_id = complaints::apply_complaint(&stt.store, form).await?;
	Ok(Reply::with_message(message, Named::new("complaint_id", complaint_id)))
}

async fn student_complaints(
	State(stt): State<SharedState>,
	Path(usn): Path<Usn>,
) -> Answer<Counted<complaints::Complaint>> {
	let found = complaints::student_complaints(&stt.store, &usn).await?;
	Ok(Reply::ok(Counted::new("complaints", found)))
}

async fn unresolved_complaints(State(stt): State<SharedState>) -> Answer<Counted<complaints::OpenComplaint>> {
	let found = complaints::unresolved_complaints(&stt.store).await?;
	Ok(Reply::ok(Counted::new("unresolved_complaints", found)))
}

async fn update_complaint_status(
	State(stt): State<SharedState>,
	Payload(form): Payload<ComplaintStatusForm>,
) -> Answer<Empty> {
	let complaint_id = form.complaint_id;
	let status = complaints::update_complaint_status(&stt.store, form).await?;
	Ok(Reply::message(format!("Complaint ID {complaint_id} updated to {status}")))
}

#[derive(Serialize)]
struct ActiveComplaints {
	usn: Usn,
	active_complaints: i64,
}

async fn active_complaint_count(State(stt): State<SharedState>, Payload(param): Payload<UsnParam>) -> Answer<ActiveComplaints> {
	let active_complaints = complaints::active_complaint_count(&stt.store, &param.usn).await?;
	Ok(Reply::ok(ActiveComplaints {
		usn: param.usn,
		active_complaints,
	}))
}

// notices

async fn add_notice(State(stt): State<SharedState>, Payload(form): Payload<NoticeForm>) -> Answer<Named<notices::Notice>> {
	let notice = notices::add_notice(&stt.store, form).await?;
	Ok(Reply::with_message("Notice added successfully", Named::new("notice", notice)))
}

async fn all_notices(State(stt): State<SharedState>) -> Answer<Counted<notices::Notice>> {
	let found = notices::all_notices(&stt.store).await?;
	Ok(Reply::ok(Counted::new("notices", found)))
}

// fees

async fn update_common_fee(State(stt): State<SharedState>, Payload(form): Payload<CommonFeeForm>) -> Answer<Named<u64>> {
	let updated = fees::set_common_fee(&stt.store, form.total_fee).await?;
	Ok(Reply::with_message(
		format!("Hostel fee updated to ₹{} for all students", form.total_fee),
		Named::new("updated", updated),
	))
}

async fn update_due_date(State(stt): State<SharedState>, Payload(form): Payload<DueDateForm>) -> Answer<Named<u64>> {
	let updated = fees::set_due_date(&stt.store, form.due_date).await?;
	Ok(Reply::with_message(
		format!("Due date updated to {} for all students", form.due_date),
		Named::new("updated", updated),
	))
}

async fn update_payment(State(stt): State<SharedState>, Payload(form): Payload<PaymentForm>) -> Answer<Named<fees::PaymentUpdate>> {
	let usn = form.usn.clone();
	let update = fees::record_payment(&stt.store, form).await?;
	Ok(Reply::with_message(format!("Payment updated for {usn}"), Named::new("updated", update)))
}

async fn fee_summary(State(stt): State<SharedState>) -> Answer<Named<fees::FeeSummary>> {
	let summary = fees::fee_summary(&stt.store).await?;
	Ok(Reply::ok(Named::new("summary", summary)))
}

async fn student_fee(State(stt): State<SharedState>, Payload(param): Payload<UsnParam>) -> Answer<Named<fees::FeeDetails>> {
	let details = fees::student_fee(&stt.store, &param.usn).await?;
	Ok(Reply::ok(Named::new("fee_details", details)))
}

#[derive(Serialize)]
struct FeeRecords {
	total_students: usize,
	fee_records: Vec<FeeListing>,
}

async fn all_fees(State(stt): State<SharedState>) -> Answer<FeeRecords> {
	let fee_records = fees::all_fees(&stt.store).await?;
	Ok(Reply::ok(FeeRecords {
		total_students: fee_records.len(),
		fee_records,
	}))
}
