use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::{
	error::{HostelError, Result},
	sql::Store,
	types::NoticeForm,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Notice {
	pub notice_id: i64,
	pub title: String,
	pub description: String,
	pub date_posted: NaiveDate,
}

/// Posts a notice dated today.
pub async fn add_notice(store: &Store, form: NoticeForm) -> Result<Notice> {
	if form.title.trim().is_empty() {
		return Err(HostelError::InvalidInput("title is required".to_string()));
	}

	let date_posted = Local::now().date_naive();
	let mut conn = store.acquire().await?;
	let done = sqlx::query("INSERT INTO notice (title, description, date_posted) VALUES (?, ?, ?)")
		.bind(&form.title)
		.bind(&form.description)
		.bind(date_posted)
		.execute(&mut *conn)
		.await?;

	let notice = Notice {
		notice_id: done.last_insert_rowid(),
		title: form.title,
		description: form.description,
		date_posted,
	};
	info!(notice_id = notice.notice_id, "Notice posted");
	Ok(notice)
}

pub async fn all_notices(store: &Store) -> Result<Vec<Notice>> {
	let mut conn = store.acquire().await?;
	let notices = sqlx::query_as(
		"SELECT notice_id, title, description, date_posted
		FROM notice
		ORDER BY date_posted DESC, notice_id DESC",
	)
	.fetch_all(&mut *conn)
	.await?;
	Ok(notices)
}
