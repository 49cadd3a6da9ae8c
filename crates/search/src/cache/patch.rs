use crate::Entity;

/// One mutation applied to a list without refetching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<E: Entity> {
	/// A record was created; it goes to the front.
	Insert(E),
	/// A record was edited; it replaces the row with the same id.
	Update(E),
	/// A record was deleted.
	Remove(E::Id),
}

impl<E: Entity> Patch<E> {
	/// Id of the affected record.
	pub fn id(&self) -> E::Id {
		match self {
			Self::Insert(entity) | Self::Update(entity) => entity.id(),
			Self::Remove(id) => id.clone(),
		}
	}

	/// Applies this patch to `rows`. Returns true when `rows` changed.
	///
	/// Every patch is idempotent: replaying it onto rows that already reflect
	/// it leaves them unchanged (an insert of a present id replaces in place).
	pub fn apply(&self, rows: &mut Vec<E>) -> bool {
		match self {
			Self::Insert(entity) => {
				let id = entity.id();
				match rows.iter_mut().find(|row| row.id() == id) {
					Some(row) => *row = entity.clone(),
					None => rows.insert(0, entity.clone()),
				}
				true
			}
			Self::Update(entity) => {
				let id = entity.id();
				match rows.iter_mut().find(|row| row.id() == id) {
					Some(row) => {
						*row = entity.clone();
						true
					}
					None => false,
				}
			}
			Self::Remove(id) => {
				let before = rows.len();
				rows.retain(|row| &row.id() != id);
				rows.len() != before
			}
		}
	}
}
