use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::x25519::Scalar;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Tag(pub [u8; Self::SIZE]);

impl Tag {
	pub const SIZE: usize = 32;

	pub fn as_bytes(&self) -> &[u8; Self::SIZE] {
		&self.0
	}
}

impl From<&[u8; Tag::SIZE]> for Tag {
	fn from(slice: &[u8; Tag::SIZE]) -> Self {
		Self(*slice)
	}
}

impl TryFrom<Vec<u8>> for Tag {
	type Error = std::array::TryFromSliceError;

	fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
		let slice: [u8; Self::SIZE] = value.as_slice().try_into()?;

		Ok(Self(slice))
	}
}

fn keyed(key: &Scalar) -> HmacSha256 {
	HmacSha256::new_from_slice(key.as_bytes()).expect("hmac accepts keys of any size")
}

pub fn digest(key: &Scalar, msg: &[u8]) -> Tag {
	let mut mac = keyed(key);

	mac.update(msg);

	Tag(mac.finalize().into_bytes().into())
}

// constant time
pub fn verify(msg: &[u8], key: &Scalar, tag: &Tag) -> bool {
	let mut mac = keyed(key);

	mac.update(msg);

	mac.verify_slice(&tag.0).is_ok()
}
