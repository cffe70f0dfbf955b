use axum::Json;
use serde::{ser::SerializeMap, Serialize, Serializer};

/// Success envelope. Failures go through [`crate::error::HostelError`], so
/// callers always see a `status` discriminator next to the payload.
#[derive(Debug, Serialize)]
pub struct Reply<T> {
	status: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	message: Option<String>,
	#[serde(flatten)]
	data: T,
}

#[derive(Debug, Serialize)]
pub struct Empty {}

impl<T: Serialize> Reply<T> {
	pub fn ok(data: T) -> Json<Self> {
		Json(Reply {
			status: "success",
			message: None,
			data,
		})
	}

	pub fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
		Json(Reply {
			status: "success",
			message: Some(message.into()),
			data,
		})
	}
}

impl Reply<Empty> {
	pub fn message(message: impl Into<String>) -> Json<Self> {
		Reply::with_message(message, Empty {})
	}
}

/// Serializes as `{ <key>: value }`.
#[derive(Debug)]
pub struct Named<T> {
	key: &'static str,
	value: T,
}

impl<T> Named<T> {
	pub fn new(key: &'static str, value: T) -> Self {
		Named { key, value }
	}
}

impl<T: Serialize> Serialize for Named<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(1))?;
		map.serialize_entry(self.key, &self.value)?;
		map.end()
	}
}

/// Serializes as `{ "count": items.len(), <key>: items }`.
#[derive(Debug)]
pub struct Counted<T> {
	key: &'static str,
	items: Vec<T>,
}

impl<T> Counted<T> {
	pub fn new(key: &'static str, items: Vec<T>) -> Self {
		Counted { key, items }
	}
}

impl<T: Serialize> Serialize for Counted<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(2))?;
		map.serialize_entry("count", &self.items.len())?;
		map.serialize_entry(self.key, &self.items)?;
		map.end()
	}
}
