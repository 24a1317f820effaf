// ik_a * EK_b || ek_a * IK_b || ek_a * EK_b; the responder swaps the first two

use crate::{
	hash,
	x25519::{dh, iota, public_of, GroupElement, Scalar},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Role {
	Initiator,
	Responder,
}

pub fn exchange(
	role: Role,
	identity: &Scalar,
	their_identity: &GroupElement,
	ephemeral: &Scalar,
	their_ephemeral: &GroupElement,
) -> Scalar {
	let mut i_ab = dh(their_ephemeral, identity);
	let mut i_ba = dh(their_identity, ephemeral);
	let e_ab = dh(their_ephemeral, ephemeral);

	if role == Role::Responder {
		std::mem::swap(&mut i_ab, &mut i_ba);
	}

	hash::kdf(&[i_ab.as_bytes(), i_ba.as_bytes(), e_ab.as_bytes()])
}

// the leaf a peer is going to occupy in the key tree
pub fn leaf_secret(
	role: Role,
	identity: &Scalar,
	their_identity: &GroupElement,
	ephemeral: &Scalar,
	their_ephemeral: &GroupElement,
) -> Scalar {
	iota(&public_of(&exchange(
		role,
		identity,
		their_identity,
		ephemeral,
		their_ephemeral,
	)))
}

#[cfg(test)]
mod tests {
	use super::{exchange, leaf_secret, Role};
	use crate::x25519::KeyPair;

	#[test]
	fn test_exchange_agrees() {
		let alice_ik = KeyPair::generate();
		let alice_ek = KeyPair::generate();
		let bob_ik = KeyPair::generate();
		let bob_ek = KeyPair::generate();

		let ab = exchange(
			Role::Initiator,
			&alice_ik.private,
			&bob_ik.public,
			&alice_ek.private,
			&bob_ek.public,
		);
		let ba = exchange(
			Role::Responder,
			&bob_ik.private,
			&alice_ik.public,
			&bob_ek.private,
			&alice_ek.public,
		);

		assert_eq!(ab, ba);
	}

	#[test]
	fn test_roles_are_not_interchangeable() {
		let alice_ik = KeyPair::generate();
		let alice_ek = KeyPair::generate();
		let bob_ik = KeyPair::generate();
		let bob_ek = KeyPair::generate();

		let ab = exchange(
			Role::Initiator,
			&alice_ik.private,
			&bob_ik.public,
			&alice_ek.private,
			&bob_ek.public,
		);
		let ba = exchange(
			Role::Initiator,
			&bob_ik.private,
			&alice_ik.public,
			&bob_ek.private,
			&alice_ek.public,
		);

		assert_ne!(ab, ba);
	}

	#[test]
	fn test_leaf_secret_agrees_and_differs_from_exchange() {
		let alice_ik = KeyPair::generate();
		let alice_ek = KeyPair::generate();
		let bob_ik = KeyPair::generate();
		let bob_ek = KeyPair::generate();

		let ab = leaf_secret(
			Role::Initiator,
			&alice_ik.private,
			&bob_ik.public,
			&alice_ek.private,
			&bob_ek.public,
		);
		let ba = leaf_secret(
			Role::Responder,
			&bob_ik.private,
			&alice_ik.public,
			&bob_ek.private,
			&alice_ek.public,
		);
		let raw = exchange(
			Role::Initiator,
			&alice_ik.private,
			&bob_ik.public,
			&alice_ek.private,
			&bob_ek.public,
		);

		assert_eq!(ab, ba);
		assert_ne!(ab, raw);
	}
}
