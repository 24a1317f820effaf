use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;
use treekeys::{Bundle, GroupElement};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
	#[error("identity {0} is not registered")]
	IdentityNotFound(GroupElement),
	#[error("{0} has no pre-keys left")]
	OutOfPreKeys(GroupElement),
}

// a directory of pre-keys plus a mailbox per identity
#[async_trait]
pub trait Api {
	async fn publish(&self, identity: GroupElement, prekeys: Vec<GroupElement>);
	// hands out a pre-key once and only once
	async fn fetch_bundle(&self, identity: &GroupElement) -> Result<Bundle, Error>;
	async fn post(&self, to: &GroupElement, msg: Vec<u8>) -> Result<(), Error>;
	// everything posted to `identity` so far, in posting order
	async fn drain(&self, identity: &GroupElement) -> Vec<Vec<u8>>;
}

#[derive(Clone, Default)]
pub struct MemApi {
	prekeys: Arc<Mutex<HashMap<GroupElement, Vec<GroupElement>>>>,
	mailboxes: Arc<Mutex<HashMap<GroupElement, Vec<Vec<u8>>>>>,
}

impl MemApi {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl Api for MemApi {
	async fn publish(&self, identity: GroupElement, prekeys: Vec<GroupElement>) {
		self.prekeys
			.lock()
			.await
			.entry(identity)
			.or_default()
			.extend(prekeys);
		self.mailboxes.lock().await.entry(identity).or_default();
	}

	async fn fetch_bundle(&self, identity: &GroupElement) -> Result<Bundle, Error> {
		let mut keys = self.prekeys.lock().await;
		let entry = keys
			.get_mut(identity)
			.ok_or(Error::IdentityNotFound(*identity))?;
		let prekey = entry.pop().ok_or(Error::OutOfPreKeys(*identity))?;

		Ok(Bundle::new(*identity, prekey))
	}

	async fn post(&self, to: &GroupElement, msg: Vec<u8>) -> Result<(), Error> {
		self.mailboxes
			.lock()
			.await
			.get_mut(to)
			.ok_or(Error::IdentityNotFound(*to))?
			.push(msg);

		Ok(())
	}

	async fn drain(&self, identity: &GroupElement) -> Vec<Vec<u8>> {
		self.mailboxes
			.lock()
			.await
			.get_mut(identity)
			.map(std::mem::take)
			.unwrap_or_default()
	}
}
