use std::{fmt, str::FromStr};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{hash, key::key};

key!(
	/// Private half of a key pair; also the secret of every key tree node, a mac key and a ratchet state.
	///
	/// Zeroized on drop, compared in constant time, never printed.
	#[derive(Clone, Zeroize, ZeroizeOnDrop)]
	Scalar,
	32
);

key!(
	/// Public counterpart of a `Scalar`. Printed and parsed as unpadded url-safe base64.
	#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
	GroupElement,
	32
);

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DecodeError {
	#[error("invalid base64: {0}")]
	Base64(#[from] base64::DecodeError),
	#[error("expected {} bytes, got {0}", GroupElement::SIZE)]
	WrongSize(usize),
}

impl Scalar {
	pub fn generate() -> Self {
		Self(rand::thread_rng().gen())
	}

	// the placeholder a fresh group's stage secret is ratcheted from
	pub fn zero() -> Self {
		Self([0u8; Self::SIZE])
	}
}

impl PartialEq for Scalar {
	fn eq(&self, other: &Self) -> bool {
		bool::from(self.0.ct_eq(&other.0))
	}
}

impl Eq for Scalar {}

impl fmt::Debug for Scalar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Scalar(***)")
	}
}

impl GroupElement {
	pub fn from_private(key: &Scalar) -> Self {
		Self(x25519_dalek::x25519(key.0, x25519_dalek::X25519_BASEPOINT_BYTES))
	}

	pub fn to_base64(&self) -> String {
		URL_SAFE_NO_PAD.encode(self.0)
	}
}

impl fmt::Display for GroupElement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_base64())
	}
}

impl fmt::Debug for GroupElement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "GroupElement({})", self.to_base64())
	}
}

impl FromStr for GroupElement {
	type Err = DecodeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let bytes = URL_SAFE_NO_PAD.decode(s)?;
		let len = bytes.len();

		Self::try_from(bytes).or(Err(DecodeError::WrongSize(len)))
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyPair {
	pub private: Scalar,
	pub public: GroupElement,
}

impl KeyPair {
	pub fn generate() -> Self {
		let private = Scalar::generate();
		let public = GroupElement::from_private(&private);

		Self { private, public }
	}
}

pub fn public_of(key: &Scalar) -> GroupElement {
	GroupElement::from_private(key)
}

pub fn dh(public: &GroupElement, private: &Scalar) -> GroupElement {
	GroupElement(x25519_dalek::x25519(private.0, public.0))
}

// collapses a dh output into a scalar; the ι of the tree construction
pub fn iota(element: &GroupElement) -> Scalar {
	hash::kdf(&[element.as_bytes()])
}
