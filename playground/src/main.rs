pub mod mem_api;

use futures::future;
use mem_api::{Api, MemApi};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use treekeys::{
	impl_protobuf, Deserializable, Endpoint, Envelope, GroupElement, GroupState, Payload,
	Serializable,
};

pub const INITIAL_MEMBERS: usize = 6;
pub const JOINERS: usize = 5;
pub const PREKEYS_PER_ENDPOINT: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Api(#[from] mem_api::Error),
	#[error(transparent)]
	Group(#[from] treekeys::Error),
	#[error(transparent)]
	Wire(#[from] impl_protobuf::Error),
	#[error("not in a group yet")]
	NoGroup,
	#[error("members disagree on the stage secret")]
	Diverged,
}

pub struct Node {
	endpoint: Endpoint,
	group: Option<GroupState>,
}

impl Node {
	pub async fn new(api: &impl Api) -> Self {
		let mut endpoint = Endpoint::new();
		let prekeys = (0..PREKEYS_PER_ENDPOINT)
			.map(|_| endpoint.publish_prekey())
			.collect();

		api.publish(*endpoint.identity(), prekeys).await;

		Self {
			endpoint,
			group: None,
		}
	}

	pub fn identity(&self) -> GroupElement {
		*self.endpoint.identity()
	}

	fn group_mut(&mut self) -> Result<&mut GroupState, Error> {
		self.group.as_mut().ok_or(Error::NoGroup)
	}

	// fetches everyone's bundle, creates a group and sends out setups
	pub async fn create_group(
		&mut self,
		api: &impl Api,
		peers: &[GroupElement],
	) -> Result<(), Error> {
		let bundles = future::try_join_all(peers.iter().map(|peer| api.fetch_bundle(peer))).await?;
		let (group, setups) = self.endpoint.setup_group(&bundles)?;

		for (peer, setup) in peers.iter().zip(setups) {
			api.post(peer, setup.serialize()).await?;
		}

		info!(size = group.size(), "group created");

		self.group = Some(group);

		Ok(())
	}

	pub async fn update(&mut self, api: &impl Api) -> Result<(), Error> {
		let group = self.group_mut()?;
		let update = group.update_key()?.serialize();
		let me = group.index();
		let others = group
			.roster()
			.ids()
			.iter()
			.enumerate()
			.filter(|(idx, _)| *idx != me)
			.map(|(_, id)| *id)
			.collect::<Vec<_>>();

		for id in others {
			api.post(&id, update.clone()).await?;
		}

		Ok(())
	}

	pub async fn add(&mut self, api: &impl Api, joiner: &GroupElement) -> Result<(), Error> {
		let bundle = api.fetch_bundle(joiner).await?;
		let group = self.group_mut()?;
		let (setup, add) = group.add_peer(&bundle)?;
		let me = group.index();
		let add = add.serialize();
		let others = group
			.roster()
			.ids()
			.iter()
			.enumerate()
			.filter(|(idx, id)| *idx != me && *id != joiner)
			.map(|(_, id)| *id)
			.collect::<Vec<_>>();

		for id in others {
			api.post(&id, add.clone()).await?;
		}

		api.post(joiner, setup.serialize()).await?;

		Ok(())
	}

	// processes everything in the mailbox, in order
	pub async fn sync(&mut self, api: &impl Api) -> Result<(), Error> {
		for msg in api.drain(&self.identity()).await {
			self.handle(&Envelope::deserialize(&msg)?)?;
		}

		Ok(())
	}

	fn handle(&mut self, envelope: &Envelope) -> Result<(), Error> {
		match envelope.decode()? {
			Payload::Setup(_) => {
				let group = self.endpoint.join(envelope)?;

				debug!(index = group.index(), "joined");

				self.group = Some(group);
			}
			Payload::Update(_) => self.group_mut()?.process_update(envelope)?,
			Payload::Add(_) => self.group_mut()?.process_add(envelope)?,
		}

		Ok(())
	}
}

pub async fn sync_all(nodes: &mut [Node], api: &impl Api) -> Result<(), Error> {
	future::try_join_all(nodes.iter_mut().map(|node| node.sync(api))).await?;

	Ok(())
}

pub fn check_converged(nodes: &[Node]) -> Result<(), Error> {
	let groups = nodes
		.iter()
		.map(|node| node.group.as_ref().ok_or(Error::NoGroup))
		.collect::<Result<Vec<_>, _>>()?;

	let agree = |a: &GroupState, b: &GroupState| {
		a.stage_secret() == b.stage_secret() && a.frontier() == b.frontier()
	};

	if groups.windows(2).all(|w| agree(w[0], w[1])) {
		Ok(())
	} else {
		Err(Error::Diverged)
	}
}

// sets up a group, lets every member rotate its key, then grows the group one joiner at a time
pub async fn run(api: &impl Api, initial: usize, joiners: usize) -> Result<Vec<Node>, Error> {
	let mut nodes = future::join_all((0..initial + joiners).map(|_| Node::new(api))).await;
	let mut joining = nodes.split_off(initial);
	let peers = nodes[1..].iter().map(Node::identity).collect::<Vec<_>>();

	nodes[0].create_group(api, &peers).await?;
	sync_all(&mut nodes, api).await?;
	check_converged(&nodes)?;

	for idx in 0..nodes.len() {
		nodes[idx].update(api).await?;
		sync_all(&mut nodes, api).await?;
		check_converged(&nodes)?;
	}

	info!(size = nodes.len(), "every member updated");

	for joiner in joining.drain(..) {
		let adder = nodes.len() - 1;

		nodes[adder].add(api, &joiner.identity()).await?;
		nodes.push(joiner);
		sync_all(&mut nodes, api).await?;
		check_converged(&nodes)?;

		// the newcomer rotates right away
		nodes[adder + 1].update(api).await?;
		sync_all(&mut nodes, api).await?;
		check_converged(&nodes)?;
	}

	info!(size = nodes.len(), "converged");

	Ok(nodes)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	run(&MemApi::new(), INITIAL_MEMBERS, JOINERS).await?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::{
		check_converged,
		mem_api::{Api, MemApi},
		run, sync_all, Error, Node,
	};

	#[tokio::test]
	async fn test_normal_flow() -> Result<(), Error> {
		let nodes = run(&MemApi::new(), 3, 6).await?;

		assert_eq!(nodes.len(), 9);

		for (idx, node) in nodes.iter().enumerate() {
			let group = node.group.as_ref().unwrap();

			assert_eq!(group.index(), idx);
			assert_eq!(group.roster().get(idx), Some(node.endpoint.identity()));
		}

		Ok(())
	}

	#[tokio::test]
	async fn test_through_powers_of_two() -> Result<(), Error> {
		let nodes = run(&MemApi::new(), 2, 15).await?;

		assert_eq!(nodes[0].group.as_ref().unwrap().size(), 17);

		Ok(())
	}

	#[tokio::test]
	async fn test_out_of_prekeys() {
		let api = MemApi::new();
		let mut alice = Node::new(&api).await;
		let bob = Node::new(&api).await;
		let peers = vec![bob.identity(); super::PREKEYS_PER_ENDPOINT + 1];

		assert!(matches!(
			alice.create_group(&api, &peers).await,
			Err(Error::Api(_))
		));
	}

	#[tokio::test]
	async fn test_garbage_in_the_mailbox() {
		let api = MemApi::new();
		let mut alice = Node::new(&api).await;
		let bob = Node::new(&api).await;

		alice.create_group(&api, &[bob.identity()]).await.unwrap();
		api.post(&alice.identity(), vec![0xff; 3]).await.unwrap();

		assert!(matches!(alice.sync(&api).await, Err(Error::Wire(_))));
	}

	#[tokio::test]
	async fn test_setup_for_someone_else() -> Result<(), Error> {
		let api = MemApi::new();
		let mut alice = Node::new(&api).await;
		let mut bob = Node::new(&api).await;
		let mut eve = Node::new(&api).await;

		alice.create_group(&api, &[bob.identity()]).await?;

		let setup = api.drain(&bob.identity()).await.remove(0);

		api.post(&eve.identity(), setup.clone()).await?;
		api.post(&bob.identity(), setup).await?;

		assert!(matches!(
			eve.sync(&api).await,
			Err(Error::Group(treekeys::Error::UnknownPreKey))
		));
		assert!(eve.group.is_none());

		bob.sync(&api).await?;

		let mut nodes = vec![alice, bob];

		nodes[1].update(&api).await?;
		sync_all(&mut nodes, &api).await?;
		check_converged(&nodes)?;

		Ok(())
	}
}
