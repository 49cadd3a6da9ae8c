//! Shared fixtures: a guest record and a scripted repository with virtual latency.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use smallvec::smallvec;
use tokio_util::sync::CancellationToken;

use crate::normalize::normalize;
use crate::{Criteria, Entity, Repository, RepositoryError, SearchFields};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Guest {
	pub id: u32,
	pub name: String,
	pub phone: String,
	pub id_document: String,
	pub email: Option<String>,
}

impl Entity for Guest {
	type Id = u32;

	fn id(&self) -> u32 {
		self.id
	}

	fn search_fields(&self) -> SearchFields<'_> {
		let mut fields: SearchFields<'_> = smallvec![
			Cow::Borrowed(self.name.as_str()),
			Cow::Borrowed(self.phone.as_str()),
			Cow::Borrowed(self.id_document.as_str()),
		];
		if let Some(email) = &self.email {
			fields.push(Cow::Borrowed(email.as_str()));
		}
		fields
	}
}

pub(crate) fn guest(id: u32, name: &str, phone: &str, id_document: &str) -> Guest {
	Guest {
		id,
		name: name.to_owned(),
		phone: phone.to_owned(),
		id_document: id_document.to_owned(),
		email: None,
	}
}

pub(crate) fn roster() -> Vec<Guest> {
	vec![
		Guest {
			email: Some("an.nguyen@mail.vn".to_owned()),
			..guest(1, "Nguyễn Văn An", "0901234567", "079201001234")
		},
		guest(2, "Trần Thị Bình", "0902345678", "079201005678"),
		guest(3, "Đặng Minh Đức", "0913456789", "001099012345"),
		Guest {
			email: Some("hoang.le@mail.vn".to_owned()),
			..guest(4, "Lê Hoàng", "0934567890", "038199004321")
		},
	]
}

pub(crate) fn ids(rows: &[Guest]) -> Vec<u32> {
	rows.iter().map(|row| row.id).collect()
}

/// Repository answering from an in-memory roster after a per-criteria delay.
pub(crate) struct ScriptedRepository {
	rows: Mutex<Vec<Guest>>,
	all_latency: Duration,
	default_latency: Duration,
	latency: Mutex<HashMap<String, Duration>>,
	failures: Mutex<HashMap<String, RepositoryError>>,
	fail_all: Mutex<Option<RepositoryError>>,
	fetch_all_calls: AtomicUsize,
	filtered_calls: Mutex<Vec<Criteria>>,
}

impl ScriptedRepository {
	pub fn new(rows: Vec<Guest>) -> Self {
		Self {
			rows: Mutex::new(rows),
			all_latency: Duration::from_millis(50),
			default_latency: Duration::from_millis(50),
			latency: Mutex::new(HashMap::new()),
			failures: Mutex::new(HashMap::new()),
			fail_all: Mutex::new(None),
			fetch_all_calls: AtomicUsize::new(0),
			filtered_calls: Mutex::new(Vec::new()),
		}
	}

	pub fn with_all_latency(mut self, latency: Duration) -> Self {
		self.all_latency = latency;
		self
	}

	pub fn shared(self) -> Arc<Self> {
		Arc::new(self)
	}

	/// Delays filtered calls whose criteria value is `value`.
	pub fn delay(&self, value: &str, latency: Duration) {
		self.latency.lock().insert(value.to_owned(), latency);
	}

	/// Fails filtered calls whose criteria value is `value`.
	pub fn fail(&self, value: &str, err: RepositoryError) {
		self.failures.lock().insert(value.to_owned(), err);
	}

	pub fn fail_fetch_all(&self, err: Option<RepositoryError>) {
		*self.fail_all.lock() = err;
	}

	pub fn set_rows(&self, rows: Vec<Guest>) {
		*self.rows.lock() = rows;
	}

	pub fn fetch_all_calls(&self) -> usize {
		self.fetch_all_calls.load(Ordering::SeqCst)
	}

	pub fn filtered_calls(&self) -> Vec<Criteria> {
		self.filtered_calls.lock().clone()
	}

	pub fn network_calls(&self) -> usize {
		self.fetch_all_calls() + self.filtered_calls.lock().len()
	}

	fn matches(guest: &Guest, criteria: &Criteria) -> bool {
		match criteria {
			Criteria::IdDocument(digits) => guest.id_document.contains(digits.as_str()),
			Criteria::Phone(digits) => guest.phone.contains(digits.as_str()),
			Criteria::Name(name) => normalize(&guest.name).contains(&normalize(name)),
		}
	}
}

#[async_trait]
impl Repository<Guest> for ScriptedRepository {
	async fn fetch_all(&self) -> Result<Vec<Guest>, RepositoryError> {
		self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
		tokio::time::sleep(self.all_latency).await;
		if let Some(err) = self.fail_all.lock().clone() {
			return Err(err);
		}
		Ok(self.rows.lock().clone())
	}

	async fn fetch_filtered(&self, criteria: &Criteria, cancel: CancellationToken) -> Result<Vec<Guest>, RepositoryError> {
		self.filtered_calls.lock().push(criteria.clone());
		let latency = self.latency.lock().get(criteria.value()).copied().unwrap_or(self.default_latency);

		tokio::select! {
			biased;
			_ = cancel.cancelled() => return Err(RepositoryError::Cancelled),
			_ = tokio::time::sleep(latency) => {}
		}

		if let Some(err) = self.failures.lock().get(criteria.value()).cloned() {
			return Err(err);
		}
		Ok(self.rows.lock().iter().filter(|guest| Self::matches(guest, criteria)).cloned().collect())
	}
}
