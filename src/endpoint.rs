use crate::{
	envelope::Envelope,
	error::Error,
	group::GroupState,
	prekey::{Bundle, PreKeyTable},
	x25519::{GroupElement, KeyPair},
};

// a long-term identity together with the pre-keys it has handed out
#[derive(Debug)]
pub struct Endpoint {
	identity: KeyPair,
	prekeys: PreKeyTable,
}

impl Endpoint {
	pub fn new() -> Self {
		Self::with_identity(KeyPair::generate())
	}

	pub fn with_identity(identity: KeyPair) -> Self {
		Self {
			identity,
			prekeys: PreKeyTable::new(),
		}
	}

	pub fn identity(&self) -> &GroupElement {
		&self.identity.public
	}

	pub fn publish_prekey(&mut self) -> GroupElement {
		self.prekeys.generate()
	}

	// what others need to add this endpoint to a group
	pub fn bundle(&mut self) -> Bundle {
		Bundle::new(self.identity.public, self.publish_prekey())
	}

	pub fn prekeys(&self) -> &PreKeyTable {
		&self.prekeys
	}

	pub fn setup_group(&self, peers: &[Bundle]) -> Result<(GroupState, Vec<Envelope>), Error> {
		GroupState::setup(&self.identity, peers)
	}

	pub fn join(&mut self, setup: &Envelope) -> Result<GroupState, Error> {
		GroupState::join(setup, &self.identity, &mut self.prekeys)
	}
}

impl Default for Endpoint {
	fn default() -> Self {
		Self::new()
	}
}
