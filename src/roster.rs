use crate::x25519::GroupElement;

// member identities in tree order; append-only, so a member's index never changes
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Roster {
	members: Vec<GroupElement>,
}

impl Roster {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.members.len()
	}

	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	pub fn get(&self, idx: usize) -> Option<&GroupElement> {
		self.members.get(idx)
	}

	// returns the new member's idx
	pub fn add(&mut self, id: GroupElement) -> usize {
		self.members.push(id);

		self.members.len() - 1
	}

	pub fn ids(&self) -> &[GroupElement] {
		&self.members
	}
}

impl From<Vec<GroupElement>> for Roster {
	fn from(members: Vec<GroupElement>) -> Self {
		Self { members }
	}
}

impl FromIterator<GroupElement> for Roster {
	fn from_iter<I: IntoIterator<Item = GroupElement>>(iter: I) -> Self {
		Self {
			members: iter.into_iter().collect(),
		}
	}
}
