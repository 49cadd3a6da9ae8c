//! Collaborator seams: the records a view lists and the repository that serves them.

use std::borrow::Cow;
use std::fmt::Debug;
use std::hash::Hash;

use async_trait::async_trait;
use smallvec::SmallVec;
use tokio_util::sync::CancellationToken;

use crate::RepositoryError;

/// Searchable field values of one record, in display order.
pub type SearchFields<'a> = SmallVec<[Cow<'a, str>; 6]>;

/// A record listed by a view.
///
/// The orchestrator only ever clones entities; fields are never mutated in place.
pub trait Entity: Clone + Send + Sync + 'static {
	/// Identity used to match updates and deletions.
	type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

	/// Returns this record's identity.
	fn id(&self) -> Self::Id;

	/// Returns the string or formatted numeric fields eligible for substring search.
	///
	/// Absent optional fields are simply omitted.
	fn search_fields(&self) -> SearchFields<'_>;
}

/// Server-side filter parameters derived from a classified query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Criteria {
	/// Identity-document number (digits only).
	IdDocument(String),
	/// Phone number fragment (digits only).
	Phone(String),
	/// Name fragment, as typed.
	Name(String),
}

impl Criteria {
	/// Returns the filter value.
	pub fn value(&self) -> &str {
		match self {
			Self::IdDocument(value) | Self::Phone(value) | Self::Name(value) => value,
		}
	}

	/// Returns the stable field label used in traces.
	pub const fn field(&self) -> &'static str {
		match self {
			Self::IdDocument(_) => "id_document",
			Self::Phone(_) => "phone",
			Self::Name(_) => "name",
		}
	}
}

/// Backend collaborator serving one entity type.
///
/// Timeouts are the implementation's concern and surface as
/// [`RepositoryError::Network`]. Implementations should return
/// [`RepositoryError::Cancelled`] when `cancel` fires mid-request.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync + 'static {
	/// Fetches the unfiltered list.
	async fn fetch_all(&self) -> Result<Vec<E>, RepositoryError>;

	/// Fetches the subset matching `criteria`.
	async fn fetch_filtered(&self, criteria: &Criteria, cancel: CancellationToken) -> Result<Vec<E>, RepositoryError>;
}
