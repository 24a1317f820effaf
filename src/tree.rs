use std::ops::Deref;

use crate::{
	error::Error,
	treemath,
	x25519::{dh, iota, public_of, GroupElement, Scalar},
};

#[derive(Debug)]
pub(crate) struct Node {
	pub(crate) secret: Scalar,
	pub(crate) public: GroupElement,
	// number of leaves under this node
	pub(crate) size: usize,
	pub(crate) children: Option<Box<(Node, Node)>>,
}

impl Node {
	fn leaf(secret: Scalar) -> Self {
		Self {
			public: public_of(&secret),
			secret,
			size: 1,
			children: None,
		}
	}

	fn parent(left: Node, right: Node) -> Self {
		let secret = iota(&dh(&left.public, &right.secret));

		Self {
			public: public_of(&secret),
			secret,
			size: left.size + right.size,
			children: Some(Box::new((left, right))),
		}
	}

	fn build(leaves: &[Scalar]) -> Self {
		match leaves {
			[leaf] => Self::leaf(leaf.clone()),
			_ => {
				let m = treemath::split(leaves.len());

				Self::parent(Self::build(&leaves[..m]), Self::build(&leaves[m..]))
			}
		}
	}
}

// every parent holds ι(dh(pub(left), right)), so either child can compute it
#[derive(Debug)]
pub struct KeyTree {
	root: Node,
}

impl KeyTree {
	pub fn build(leaves: &[Scalar]) -> Result<Self, Error> {
		if leaves.is_empty() {
			Err(Error::EmptyRoster)
		} else {
			Ok(Self {
				root: Node::build(leaves),
			})
		}
	}

	pub fn size(&self) -> usize {
		self.root.size
	}

	pub fn root_secret(&self) -> &Scalar {
		&self.root.secret
	}

	pub fn root_public(&self) -> GroupElement {
		self.root.public
	}

	pub(crate) fn root(&self) -> &Node {
		&self.root
	}

	// public keys of the siblings along the path to `leaf`, root-first
	pub fn copath(&self, leaf: usize) -> Result<Vec<GroupElement>, Error> {
		if leaf >= self.size() {
			return Err(Error::IndexOutOfRange {
				index: leaf,
				size: self.size(),
			});
		}

		let mut copath = Vec::new();
		let mut node = &self.root;
		let mut leaf = leaf;

		while let Some((left, right)) = node.children.as_deref() {
			if leaf < left.size {
				copath.push(right.public);
				node = left;
			} else {
				copath.push(left.public);
				leaf -= left.size;
				node = right;
			}
		}

		Ok(copath)
	}
}

/// Node secrets along a leaf's path, root-first: the first one is the tree secret, the last one is
/// the leaf itself. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSecrets(Vec<Scalar>);

impl PathSecrets {
	pub fn root(&self) -> &Scalar {
		&self.0[0]
	}

	pub fn publics(&self) -> Vec<GroupElement> {
		self.0.iter().map(public_of).collect()
	}

	// what is sent to the others: every public except the root's, which nobody needs
	pub fn publics_below_root(&self) -> Vec<GroupElement> {
		self.0[1..].iter().map(public_of).collect()
	}
}

impl Deref for PathSecrets {
	type Target = [Scalar];

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

pub fn path_secrets(leaf_secret: &Scalar, copath: &[GroupElement]) -> PathSecrets {
	let mut secrets = Vec::with_capacity(copath.len() + 1);
	let mut current = leaf_secret.clone();

	for sibling in copath.iter().rev() {
		let parent = iota(&dh(sibling, &current));

		secrets.push(current);
		current = parent;
	}

	secrets.push(current);
	secrets.reverse();

	PathSecrets(secrets)
}

// same as path_secrets, but rejects copaths that can't belong to `leaf` in a tree of `size` leaves
pub fn checked_path_secrets(
	size: usize,
	leaf: usize,
	leaf_secret: &Scalar,
	copath: &[GroupElement],
) -> Result<PathSecrets, Error> {
	let expected = treemath::leaf_depth(size, leaf)?;

	if copath.len() != expected {
		Err(Error::MalformedCopath {
			expected,
			actual: copath.len(),
		})
	} else {
		Ok(path_secrets(leaf_secret, copath))
	}
}

// the tree secret alone, without collecting the intermediate nodes
pub fn root_secret(leaf_secret: &Scalar, copath: &[GroupElement]) -> Scalar {
	copath
		.iter()
		.rev()
		.fold(leaf_secret.clone(), |below, sibling| iota(&dh(sibling, &below)))
}

#[cfg(test)]
mod tests {
	use super::{checked_path_secrets, path_secrets, root_secret, KeyTree};
	use crate::{
		error::Error,
		treemath,
		x25519::{public_of, Scalar},
	};

	fn leaves(n: usize) -> Vec<Scalar> {
		(0..n).map(|_| Scalar::generate()).collect()
	}

	#[test]
	fn test_build_empty() {
		assert_eq!(KeyTree::build(&[]).err(), Some(Error::EmptyRoster));
	}

	#[test]
	fn test_single_leaf() {
		let leaves = leaves(1);
		let tree = KeyTree::build(&leaves).unwrap();

		assert_eq!(tree.size(), 1);
		assert_eq!(tree.root_secret(), &leaves[0]);
		assert!(tree.copath(0).unwrap().is_empty());
	}

	#[test]
	fn test_tree_and_path() {
		for n in 1..=17 {
			let leaves = leaves(n);
			let tree = KeyTree::build(&leaves).unwrap();

			assert_eq!(tree.size(), n);
			assert_eq!(tree.root_public(), public_of(tree.root_secret()));

			for (i, leaf) in leaves.iter().enumerate() {
				let copath = tree.copath(i).unwrap();
				let path = path_secrets(leaf, &copath);

				assert_eq!(copath.len(), treemath::leaf_depth(n, i).unwrap());
				assert_eq!(path.len(), copath.len() + 1);
				assert_eq!(path.root(), tree.root_secret(), "leaf {} of {}", i, n);
				assert_eq!(path.last(), Some(leaf));
				assert_eq!(&root_secret(leaf, &copath), tree.root_secret());
			}
		}
	}

	#[test]
	fn test_shape_is_left_filled() {
		let leaves = leaves(3);
		let tree = KeyTree::build(&leaves).unwrap();
		let left = KeyTree::build(&leaves[..2]).unwrap();

		// (0 1) | 2
		assert_eq!(tree.copath(2).unwrap(), vec![left.root_public()]);
		assert_eq!(
			tree.copath(0).unwrap(),
			vec![public_of(&leaves[2]), public_of(&leaves[1])]
		);
	}

	#[test]
	fn test_build_is_deterministic() {
		let leaves = leaves(11);

		assert_eq!(
			KeyTree::build(&leaves).unwrap().root_secret(),
			KeyTree::build(&leaves).unwrap().root_secret()
		);
	}

	#[test]
	fn test_copath_out_of_range() {
		let tree = KeyTree::build(&leaves(5)).unwrap();

		assert_eq!(
			tree.copath(5),
			Err(Error::IndexOutOfRange { index: 5, size: 5 })
		);
	}

	#[test]
	fn test_publics_below_root() {
		let leaves = leaves(6);
		let tree = KeyTree::build(&leaves).unwrap();
		let path = path_secrets(&leaves[3], &tree.copath(3).unwrap());
		let publics = path.publics();

		assert_eq!(publics[0], tree.root_public());
		assert_eq!(path.publics_below_root(), publics[1..].to_vec());
		assert_eq!(publics.last(), Some(&public_of(&leaves[3])));
	}

	#[test]
	fn test_checked_path_secrets() {
		let leaves = leaves(6);
		let tree = KeyTree::build(&leaves).unwrap();
		let mut copath = tree.copath(4).unwrap();

		assert_eq!(
			checked_path_secrets(6, 4, &leaves[4], &copath)
				.unwrap()
				.root(),
			tree.root_secret()
		);

		copath.pop();

		assert_eq!(
			checked_path_secrets(6, 4, &leaves[4], &copath),
			Err(Error::MalformedCopath {
				expected: 2,
				actual: 1
			})
		);
		assert_eq!(
			checked_path_secrets(6, 6, &leaves[4], &copath),
			Err(Error::IndexOutOfRange { index: 6, size: 6 })
		);
	}
}
