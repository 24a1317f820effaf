use std::collections::HashMap;

use crate::x25519::{GroupElement, KeyPair, Scalar};

// what one needs to fetch in order to include someone into a group while they're offline
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bundle {
	pub identity: GroupElement,
	pub prekey: GroupElement,
}

impl Bundle {
	pub fn new(identity: GroupElement, prekey: GroupElement) -> Self {
		Self { identity, prekey }
	}
}

// one-time pre-keys owned by an endpoint, keyed by their public halves
#[derive(Default, Debug)]
pub struct PreKeyTable {
	keys: HashMap<GroupElement, Scalar>,
}

impl PreKeyTable {
	pub fn new() -> Self {
		Self::default()
	}

	// generates and stores a fresh pre-key; the returned public half is to be published
	pub fn generate(&mut self) -> GroupElement {
		let KeyPair { private, public } = KeyPair::generate();

		self.keys.insert(public, private);

		public
	}

	pub fn insert(&mut self, kp: KeyPair) {
		self.keys.insert(kp.public, kp.private);
	}

	pub fn get(&self, public: &GroupElement) -> Option<&Scalar> {
		self.keys.get(public)
	}

	// removes a consumed key, so that it can never be used twice
	pub fn take(&mut self, public: &GroupElement) -> Option<Scalar> {
		self.keys.remove(public)
	}

	pub fn contains(&self, public: &GroupElement) -> bool {
		self.keys.contains_key(public)
	}

	pub fn len(&self) -> usize {
		self.keys.len()
	}

	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::PreKeyTable;
	use crate::x25519::{public_of, KeyPair};

	#[test]
	fn test_generate() {
		let mut table = PreKeyTable::new();
		let pk0 = table.generate();
		let pk1 = table.generate();

		assert_ne!(pk0, pk1);
		assert_eq!(table.len(), 2);
		assert_eq!(table.get(&pk0).map(public_of), Some(pk0));
		assert_eq!(table.get(&pk1).map(public_of), Some(pk1));
	}

	#[test]
	fn test_take_consumes() {
		let mut table = PreKeyTable::new();
		let kp = KeyPair::generate();
		let public = kp.public;

		table.insert(kp);

		assert!(table.contains(&public));
		assert!(table.take(&public).is_some());
		assert!(table.take(&public).is_none());
		assert!(table.is_empty());
	}
}
