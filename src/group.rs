use tracing::{debug, trace, warn};

use crate::{
	envelope::{self, Envelope, Payload},
	error::Error,
	frontier::Frontier,
	hash,
	key_exchange::{leaf_secret, Role},
	prekey::{Bundle, PreKeyTable},
	roster::Roster,
	tree::{checked_path_secrets, path_secrets, root_secret, KeyTree},
	treemath::{divergence_depth, last_block, leaf_depth},
	x25519::{public_of, GroupElement, KeyPair, Scalar},
};

// stage = kdf(stage, tree)
pub fn derive_stage_secret(stage: &Scalar, tree_secret: &Scalar) -> Scalar {
	hash::kdf(&[stage.as_bytes(), tree_secret.as_bytes()])
}

#[derive(Clone, PartialEq, Debug)]
pub struct GroupState {
	index: usize,
	identity: KeyPair,
	leaf: Scalar,
	roster: Roster,
	copath: Vec<GroupElement>,
	tree_secret: Scalar,
	stage_secret: Scalar,
	frontier: Frontier,
}

impl GroupState {
	/// Creates a group of `identity` and `peers`, none of which has to be online. Returns the
	/// initiator's state and one setup envelope per peer, in `peers` order.
	pub fn setup(identity: &KeyPair, peers: &[Bundle]) -> Result<(Self, Vec<Envelope>), Error> {
		let leaf = Scalar::generate();
		let exchanges = peers
			.iter()
			.map(|peer| {
				let ek = KeyPair::generate();
				let secret = leaf_secret(
					Role::Initiator,
					&identity.private,
					&peer.identity,
					&ek.private,
					&peer.prekey,
				);

				(ek.public, secret)
			})
			.collect::<Vec<_>>();
		let leaves = std::iter::once(leaf.clone())
			.chain(exchanges.iter().map(|(_, secret)| secret.clone()))
			.collect::<Vec<_>>();
		let tree = KeyTree::build(&leaves)?;
		let roster = std::iter::once(identity.public)
			.chain(peers.iter().map(|peer| peer.identity))
			.collect::<Roster>();
		let frontier = Frontier::from_tree(&tree);
		let seed = Scalar::zero();

		let envelopes = peers
			.iter()
			.zip(exchanges.iter())
			.enumerate()
			.map(|(i, (peer, (exchange, secret)))| -> Result<Envelope, Error> {
				let setup = envelope::Setup {
					target: i + 1,
					sender: 0,
					roster: roster.clone(),
					prekey: peer.prekey,
					exchange: *exchange,
					copath: tree.copath(i + 1)?,
					frontier: frontier.clone(),
					seed: seed.clone(),
				};

				Ok(Envelope::seal(secret, &Payload::Setup(setup)))
			})
			.collect::<Result<Vec<_>, Error>>()?;

		let state = Self {
			index: 0,
			identity: identity.clone(),
			leaf,
			copath: tree.copath(0)?,
			tree_secret: tree.root_secret().clone(),
			stage_secret: derive_stage_secret(&seed, tree.root_secret()),
			roster,
			frontier,
		};

		debug!(size = state.size(), "group set up");

		Ok((state, envelopes))
	}

	/// Joins a group from a setup envelope, whether it comes from `setup` or from `add_peer`. The
	/// pre-key the envelope refers to is consumed only if joining succeeds.
	pub fn join(
		envelope: &Envelope,
		identity: &KeyPair,
		prekeys: &mut PreKeyTable,
	) -> Result<Self, Error> {
		Self::try_join(envelope, identity, prekeys)
			.inspect_err(|e| warn!(error = %e, "setup rejected"))
	}

	fn try_join(
		envelope: &Envelope,
		identity: &KeyPair,
		prekeys: &mut PreKeyTable,
	) -> Result<Self, Error> {
		let setup = envelope.decode()?.into_setup()?;
		let prekey = prekeys.get(&setup.prekey).ok_or(Error::UnknownPreKey)?;
		let sender = setup.roster.get(setup.sender).ok_or(Error::IndexOutOfRange {
			index: setup.sender,
			size: setup.roster.len(),
		})?;
		let leaf = leaf_secret(
			Role::Responder,
			&identity.private,
			sender,
			prekey,
			&setup.exchange,
		);

		envelope.verify(&leaf)?;

		if setup.roster.get(setup.target) != Some(&identity.public) {
			return Err(Error::NotInRoster(setup.target));
		}

		let size = setup.roster.len();

		if setup.frontier.size() != size || !setup.frontier.is_canonical() {
			return Err(Error::MalformedFrontier);
		}

		let path = checked_path_secrets(size, setup.target, &leaf, &setup.copath)?;
		let tree_secret = path.root().clone();

		prekeys.take(&setup.prekey);

		debug!(index = setup.target, size, sender = setup.sender, "joined");

		Ok(Self {
			index: setup.target,
			identity: identity.clone(),
			leaf,
			roster: setup.roster,
			copath: setup.copath,
			stage_secret: derive_stage_secret(&setup.seed, &tree_secret),
			tree_secret,
			frontier: setup.frontier,
		})
	}

	/// Rotates this member's leaf secret. The returned envelope is to be delivered to everyone else.
	pub fn update_key(&mut self) -> Result<Envelope, Error> {
		let leaf = Scalar::generate();
		let path = path_secrets(&leaf, &self.copath);
		let mut frontier = self.frontier.clone();

		frontier.refresh(self.index, &path.publics())?;

		let envelope = Envelope::seal(
			&self.stage_secret,
			&Payload::Update(envelope::Update {
				sender: self.index,
				path: path.publics_below_root(),
			}),
		);

		self.leaf = leaf;
		self.tree_secret = path.root().clone();
		self.frontier = frontier;
		self.ratchet();

		debug!(index = self.index, "key updated");

		Ok(envelope)
	}

	pub fn process_update(&mut self, envelope: &Envelope) -> Result<(), Error> {
		self.try_process_update(envelope)
			.inspect_err(|e| warn!(index = self.index, error = %e, "update rejected"))
	}

	fn try_process_update(&mut self, envelope: &Envelope) -> Result<(), Error> {
		let update = envelope.open(&self.stage_secret)?.into_update()?;
		let size = self.size();
		let depth = divergence_depth(size, self.index, update.sender)?;
		let expected = leaf_depth(size, update.sender)?;

		if update.path.len() != expected {
			return Err(Error::MalformedCopath {
				expected,
				actual: update.path.len(),
			});
		}

		let mut copath = self.copath.clone();

		copath[depth] = update.path[depth];

		let tree_secret = root_secret(&self.leaf, &copath);
		let mut frontier = self.frontier.clone();
		let publics = std::iter::once(public_of(&tree_secret))
			.chain(update.path.iter().copied())
			.collect::<Vec<_>>();

		frontier.refresh(update.sender, &publics)?;

		self.copath = copath;
		self.tree_secret = tree_secret;
		self.frontier = frontier;
		self.ratchet();

		trace!(index = self.index, sender = update.sender, depth, "update applied");

		Ok(())
	}

	/// Adds the owner of `bundle` as the next member. Returns a setup envelope for the joiner and an
	/// add envelope for everyone else; this state has already moved on when they are returned.
	pub fn add_peer(&mut self, bundle: &Bundle) -> Result<(Envelope, Envelope), Error> {
		let ek = KeyPair::generate();
		let leaf = leaf_secret(
			Role::Initiator,
			&self.identity.private,
			&bundle.identity,
			&ek.private,
			&bundle.prekey,
		);
		let copath = self.frontier.to_copath();
		let mut frontier = self.frontier.clone();

		frontier.append(&leaf);

		let path = path_secrets(&leaf, &copath).publics_below_root();
		let add = envelope::Add {
			identity: bundle.identity,
			path,
			frontier,
		};
		let add_envelope = Envelope::seal(&self.stage_secret, &Payload::Add(add.clone()));
		let seed = self.stage_secret.clone();

		self.apply_add(add)?;

		let setup = envelope::Setup {
			target: self.size() - 1,
			sender: self.index,
			roster: self.roster.clone(),
			prekey: bundle.prekey,
			exchange: ek.public,
			copath,
			frontier: self.frontier.clone(),
			seed,
		};

		Ok((Envelope::seal(&leaf, &Payload::Setup(setup)), add_envelope))
	}

	pub fn process_add(&mut self, envelope: &Envelope) -> Result<(), Error> {
		self.try_process_add(envelope)
			.inspect_err(|e| warn!(index = self.index, error = %e, "add rejected"))
	}

	fn try_process_add(&mut self, envelope: &Envelope) -> Result<(), Error> {
		let add = envelope.open(&self.stage_secret)?.into_add()?;

		self.apply_add(add)
	}

	// the new member's leaf pairs up with the smallest frontier entry; members inside that entry get
	// one level deeper, everyone else has a single copath slot changed
	fn apply_add(&mut self, add: envelope::Add) -> Result<(), Error> {
		let size = self.size();

		if add.path.len() != self.frontier.len() {
			return Err(Error::MalformedCopath {
				expected: self.frontier.len(),
				actual: add.path.len(),
			});
		}

		if add.frontier.size() != size + 1 || !add.frontier.is_canonical() {
			return Err(Error::MalformedFrontier);
		}

		let mut copath = self.copath.clone();

		if size - self.index <= last_block(size) {
			let at = copath.len() - size.trailing_zeros() as usize;
			let joiner = add.path.last().ok_or(Error::MalformedFrontier)?;

			copath.insert(at, *joiner);

			trace!(index = self.index, at, "copath extended");
		} else {
			let depth = divergence_depth(size + 1, self.index, size)?;

			copath[depth] = add.path[depth];

			trace!(index = self.index, depth, "copath patched");
		}

		self.tree_secret = root_secret(&self.leaf, &copath);
		self.copath = copath;
		self.roster.add(add.identity);
		self.frontier = add.frontier;
		self.ratchet();

		debug!(index = self.index, size = self.size(), "member added");

		Ok(())
	}

	fn ratchet(&mut self) {
		self.stage_secret = derive_stage_secret(&self.stage_secret, &self.tree_secret);
	}

	pub fn index(&self) -> usize {
		self.index
	}

	pub fn roster(&self) -> &Roster {
		&self.roster
	}

	pub fn copath(&self) -> &[GroupElement] {
		&self.copath
	}

	pub fn frontier(&self) -> &Frontier {
		&self.frontier
	}

	pub fn tree_secret(&self) -> &Scalar {
		&self.tree_secret
	}

	pub fn stage_secret(&self) -> &Scalar {
		&self.stage_secret
	}

	pub fn size(&self) -> usize {
		self.roster.len()
	}
}
