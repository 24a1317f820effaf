use sha2::{Digest, Sha256};

use crate::x25519::Scalar;

// a single sha256 over the concatenated parts; parts are neither length-prefixed nor labelled
pub fn kdf(parts: &[&[u8]]) -> Scalar {
	let mut hasher = Sha256::new();

	for part in parts {
		hasher.update(part);
	}

	Scalar::new(hasher.finalize().into())
}
