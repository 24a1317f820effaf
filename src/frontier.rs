// right spine of the key tree as the publics of its complete subtrees, largest first;
// appending works like incrementing a binary counter

use crate::{
	error::Error,
	tree::{KeyTree, Node},
	x25519::{dh, iota, public_of, GroupElement, Scalar},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Entry {
	// leaves in this complete subtree
	pub size: usize,
	pub public: GroupElement,
}

impl Entry {
	fn of(node: &Node) -> Self {
		Self {
			size: node.size,
			public: node.public,
		}
	}
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Frontier {
	entries: Vec<Entry>,
}

impl Frontier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_entries(entries: Vec<Entry>) -> Self {
		Self { entries }
	}

	pub fn from_tree(tree: &KeyTree) -> Self {
		let mut entries = Vec::new();
		let mut node = tree.root();

		loop {
			match node.children.as_deref() {
				Some((left, right)) if !node.size.is_power_of_two() => {
					entries.push(Entry::of(left));
					node = right;
				}
				_ => {
					entries.push(Entry::of(node));
					break;
				}
			}
		}

		Self { entries }
	}

	pub fn entries(&self) -> &[Entry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	// number of members covered
	pub fn size(&self) -> usize {
		self.entries.iter().map(|e| e.size).sum()
	}

	// strictly decreasing powers of two
	pub fn is_canonical(&self) -> bool {
		self.entries.iter().all(|e| e.size.is_power_of_two())
			&& self.entries.windows(2).all(|w| w[0].size > w[1].size)
	}

	// the copath of a leaf about to be appended
	pub fn to_copath(&self) -> Vec<GroupElement> {
		self.entries.iter().map(|e| e.public).collect()
	}

	// appends a leaf and returns the secret of the subtree it ended up merged into
	pub fn append(&mut self, leaf_secret: &Scalar) -> Scalar {
		let mut size = 1;
		let mut secret = leaf_secret.clone();

		while let Some(&last) = self.entries.last() {
			if last.size != size {
				break;
			}

			self.entries.pop();
			secret = iota(&dh(&last.public, &secret));
			size += last.size;
		}

		self.entries.push(Entry {
			size,
			public: public_of(&secret),
		});

		secret
	}

	// root-counted depth of the t-th entry; all but the last hang off the spine one level apart,
	// the last one is the spine's final right child and shares its parent with the one before
	fn depth_of(&self, t: usize) -> usize {
		if t + 1 < self.entries.len() {
			t + 1
		} else {
			self.entries.len() - 1
		}
	}

	// index of the entry containing `leaf`
	fn locate(&self, leaf: usize) -> Option<usize> {
		let mut first = 0;

		self.entries.iter().position(|e| {
			first += e.size;
			leaf < first
		})
	}

	// `leaf` rotated its key: `path` holds the new publics along its path, root-first
	pub fn refresh(&mut self, leaf: usize, path: &[GroupElement]) -> Result<(), Error> {
		let t = self.locate(leaf).ok_or(Error::IndexOutOfRange {
			index: leaf,
			size: self.size(),
		})?;
		let depth = self.depth_of(t);
		let public = path.get(depth).ok_or(Error::MalformedCopath {
			expected: depth + 1,
			actual: path.len(),
		})?;

		self.entries[t].public = *public;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::{Entry, Frontier};
	use crate::{
		error::Error,
		tree::{path_secrets, KeyTree},
		x25519::{public_of, Scalar},
	};

	fn leaves(n: usize) -> Vec<Scalar> {
		(0..n).map(|_| Scalar::generate()).collect()
	}

	fn sizes(f: &Frontier) -> Vec<usize> {
		f.entries().iter().map(|e| e.size).collect()
	}

	#[test]
	fn test_append_carries() {
		let mut f = Frontier::new();
		let expected = vec![
			vec![1],
			vec![2],
			vec![2, 1],
			vec![4],
			vec![4, 1],
			vec![4, 2],
			vec![4, 2, 1],
			vec![8],
			vec![8, 1],
		];

		for step in expected {
			f.append(&Scalar::generate());

			assert_eq!(sizes(&f), step);
			assert!(f.is_canonical());
		}
	}

	#[test]
	fn test_append_matches_tree() {
		let leaves = leaves(40);
		let mut f = Frontier::new();

		for step in 1..=leaves.len() {
			let secret = f.append(&leaves[step - 1]);
			let tree = KeyTree::build(&leaves[..step]).unwrap();

			assert_eq!(f, Frontier::from_tree(&tree), "step {}", step);
			assert_eq!(f.size(), step);

			if step.is_power_of_two() {
				assert_eq!(&secret, tree.root_secret());
			}
		}
	}

	#[test]
	fn test_to_copath_is_the_copath_of_the_next_leaf() {
		let leaves = leaves(23);

		for n in 1..leaves.len() {
			let before = Frontier::from_tree(&KeyTree::build(&leaves[..n]).unwrap());
			let after = KeyTree::build(&leaves[..n + 1]).unwrap();

			assert_eq!(before.to_copath(), after.copath(n).unwrap());
		}
	}

	#[test]
	fn test_refresh_follows_a_rotated_leaf() {
		for n in 1..=13 {
			let mut leaves = leaves(n);
			let mut f = Frontier::from_tree(&KeyTree::build(&leaves).unwrap());

			for i in 0..n {
				let copath = KeyTree::build(&leaves).unwrap().copath(i).unwrap();

				leaves[i] = Scalar::generate();

				let path = path_secrets(&leaves[i], &copath);

				f.refresh(i, &path.publics()).unwrap();

				assert_eq!(
					f,
					Frontier::from_tree(&KeyTree::build(&leaves).unwrap()),
					"leaf {} of {}",
					i,
					n
				);
			}
		}
	}

	#[test]
	fn test_refresh_rejects_bad_input() {
		let mut f = Frontier::from_tree(&KeyTree::build(&leaves(6)).unwrap());

		assert_eq!(
			f.refresh(6, &[]),
			Err(Error::IndexOutOfRange { index: 6, size: 6 })
		);
		assert_eq!(
			f.refresh(5, &[public_of(&Scalar::generate())]),
			Err(Error::MalformedCopath {
				expected: 2,
				actual: 1
			})
		);
	}

	#[test]
	fn test_is_canonical() {
		let g = public_of(&Scalar::generate());
		let entry = |size| Entry { size, public: g };

		assert!(Frontier::from_entries(vec![entry(8), entry(2), entry(1)]).is_canonical());
		assert!(Frontier::new().is_canonical());
		assert!(!Frontier::from_entries(vec![entry(2), entry(2)]).is_canonical());
		assert!(!Frontier::from_entries(vec![entry(1), entry(2)]).is_canonical());
		assert!(!Frontier::from_entries(vec![entry(3)]).is_canonical());
		assert!(!Frontier::from_entries(vec![entry(0)]).is_canonical());
	}

	#[test]
	fn test_single_leaf_frontier() {
		let leaf = Scalar::generate();
		let mut f = Frontier::new();

		f.append(&leaf);

		assert_eq!(
			f.entries(),
			&[Entry {
				size: 1,
				public: public_of(&leaf)
			}]
		);
		assert_eq!(f.to_copath(), vec![public_of(&leaf)]);
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(16))]

		#[test]
		fn test_append_equals_from_tree(seeds in prop::collection::vec(any::<[u8; 32]>(), 1..24)) {
			let leaves = seeds.into_iter().map(Scalar::new).collect::<Vec<_>>();
			let mut f = Frontier::new();

			for leaf in &leaves {
				f.append(leaf);
			}

			prop_assert_eq!(f, Frontier::from_tree(&KeyTree::build(&leaves).unwrap()));
		}
	}
}
