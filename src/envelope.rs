use crate::{
	error::Error,
	frontier::Frontier,
	hmac::{self, Tag},
	roster::Roster,
	serializable::{Deserializable, Serializable},
	x25519::{GroupElement, Scalar},
};

// sent to a new member only, mac-ed with the leaf secret the two of them share
#[derive(Clone, PartialEq, Debug)]
pub struct Setup {
	// recipient's leaf
	pub target: usize,
	// whoever performed the key exchange
	pub sender: usize,
	pub roster: Roster,
	// recipient's pre-key the exchange used
	pub prekey: GroupElement,
	// sender's exchange key
	pub exchange: GroupElement,
	pub copath: Vec<GroupElement>,
	pub frontier: Frontier,
	// stage secret to ratchet from; all zeroes for a fresh group
	pub seed: Scalar,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Update {
	pub sender: usize,
	// new publics along the sender's path, root excluded
	pub path: Vec<GroupElement>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Add {
	pub identity: GroupElement,
	// publics along the new member's path, root excluded
	pub path: Vec<GroupElement>,
	pub frontier: Frontier,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Payload {
	Setup(Setup),
	Update(Update),
	Add(Add),
}

impl Payload {
	pub fn kind(&self) -> &'static str {
		match self {
			Payload::Setup(_) => "setup",
			Payload::Update(_) => "update",
			Payload::Add(_) => "add",
		}
	}

	fn unexpected(self, expected: &'static str) -> Error {
		Error::UnexpectedPayload {
			expected,
			actual: self.kind(),
		}
	}

	pub fn into_setup(self) -> Result<Setup, Error> {
		match self {
			Payload::Setup(setup) => Ok(setup),
			other => Err(other.unexpected("setup")),
		}
	}

	pub fn into_update(self) -> Result<Update, Error> {
		match self {
			Payload::Update(update) => Ok(update),
			other => Err(other.unexpected("update")),
		}
	}

	pub fn into_add(self) -> Result<Add, Error> {
		match self {
			Payload::Add(add) => Ok(add),
			other => Err(other.unexpected("add")),
		}
	}
}

/// An encoded payload and a mac over it. The mac covers the payload's discriminant as well, so a
/// payload of one kind can't be replayed as another.
#[derive(Clone, PartialEq, Debug)]
pub struct Envelope {
	payload: Vec<u8>,
	tag: Tag,
}

impl Envelope {
	pub fn new(payload: Vec<u8>, tag: Tag) -> Self {
		Self { payload, tag }
	}

	pub fn seal(key: &Scalar, payload: &Payload) -> Self {
		let payload = payload.serialize();
		let tag = hmac::digest(key, &payload);

		Self { payload, tag }
	}

	pub fn payload(&self) -> &[u8] {
		&self.payload
	}

	pub fn tag(&self) -> &Tag {
		&self.tag
	}

	pub fn verify(&self, key: &Scalar) -> Result<(), Error> {
		if hmac::verify(&self.payload, key, &self.tag) {
			Ok(())
		} else {
			Err(Error::AuthenticationFailed)
		}
	}

	pub fn open(&self, key: &Scalar) -> Result<Payload, Error> {
		self.verify(key)?;
		self.decode()
	}

	// no authentication whatsoever; a setup's recipient has to peek in to learn which key to verify with
	pub fn decode(&self) -> Result<Payload, Error> {
		Ok(Payload::deserialize(&self.payload)?)
	}
}
