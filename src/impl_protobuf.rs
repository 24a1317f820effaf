include!(concat!(env!("OUT_DIR"), "/main.rs"));

use crate::{
	envelope, frontier, hmac,
	roster::Roster,
	serializable::{Deserializable, Serializable},
	x25519::{GroupElement, Scalar},
};
use prost::Message;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
	#[error("bad protobuf format")]
	BadFormat,
	#[error("wrong group element size")]
	WrongGroupElementSize,
	#[error("wrong scalar size")]
	WrongScalarSize,
	#[error("wrong tag size")]
	WrongTagSize,
	#[error("bad setup format")]
	BadSetupFormat,
	#[error("bad add format")]
	BadAddFormat,
	#[error("bad payload format")]
	BadPayloadFormat,
}

fn to_bytes(elements: &[GroupElement]) -> Vec<Vec<u8>> {
	elements.iter().map(|e| e.as_bytes().to_vec()).collect()
}

fn to_element(bytes: Vec<u8>) -> Result<GroupElement, Error> {
	GroupElement::try_from(bytes).or(Err(Error::WrongGroupElementSize))
}

fn to_elements(bytes: Vec<Vec<u8>>) -> Result<Vec<GroupElement>, Error> {
	bytes.into_iter().map(to_element).collect()
}

// Frontier
impl From<&frontier::Frontier> for Frontier {
	fn from(val: &frontier::Frontier) -> Self {
		Self {
			entries: val
				.entries()
				.iter()
				.map(|e| FrontierEntry {
					size: e.size as u32,
					public: e.public.as_bytes().to_vec(),
				})
				.collect(),
		}
	}
}

impl TryFrom<Frontier> for frontier::Frontier {
	type Error = Error;

	fn try_from(val: Frontier) -> Result<Self, Self::Error> {
		Ok(Self::from_entries(
			val.entries
				.into_iter()
				.map(|e| {
					Ok(frontier::Entry {
						size: e.size as usize,
						public: to_element(e.public)?,
					})
				})
				.collect::<Result<Vec<frontier::Entry>, Error>>()?,
		))
	}
}

// Setup
impl From<&envelope::Setup> for Setup {
	fn from(val: &envelope::Setup) -> Self {
		Self {
			target: val.target as u32,
			sender: val.sender as u32,
			roster: to_bytes(val.roster.ids()),
			prekey: val.prekey.as_bytes().to_vec(),
			exchange: val.exchange.as_bytes().to_vec(),
			copath: to_bytes(&val.copath),
			frontier: Some((&val.frontier).into()),
			seed: val.seed.as_bytes().to_vec(),
		}
	}
}

impl TryFrom<Setup> for envelope::Setup {
	type Error = Error;

	fn try_from(val: Setup) -> Result<Self, Self::Error> {
		Ok(Self {
			target: val.target as usize,
			sender: val.sender as usize,
			roster: Roster::from(to_elements(val.roster)?),
			prekey: to_element(val.prekey)?,
			exchange: to_element(val.exchange)?,
			copath: to_elements(val.copath)?,
			frontier: val.frontier.ok_or(Error::BadSetupFormat)?.try_into()?,
			seed: Scalar::try_from(val.seed).or(Err(Error::WrongScalarSize))?,
		})
	}
}

// Update
impl From<&envelope::Update> for Update {
	fn from(val: &envelope::Update) -> Self {
		Self {
			sender: val.sender as u32,
			path: to_bytes(&val.path),
		}
	}
}

impl TryFrom<Update> for envelope::Update {
	type Error = Error;

	fn try_from(val: Update) -> Result<Self, Self::Error> {
		Ok(Self {
			sender: val.sender as usize,
			path: to_elements(val.path)?,
		})
	}
}

// Add
impl From<&envelope::Add> for Add {
	fn from(val: &envelope::Add) -> Self {
		Self {
			identity: val.identity.as_bytes().to_vec(),
			path: to_bytes(&val.path),
			frontier: Some((&val.frontier).into()),
		}
	}
}

impl TryFrom<Add> for envelope::Add {
	type Error = Error;

	fn try_from(val: Add) -> Result<Self, Self::Error> {
		Ok(Self {
			identity: to_element(val.identity)?,
			path: to_elements(val.path)?,
			frontier: val.frontier.ok_or(Error::BadAddFormat)?.try_into()?,
		})
	}
}

// Payload
impl From<&envelope::Payload> for Payload {
	fn from(val: &envelope::Payload) -> Self {
		use payload::Variant;

		Self {
			variant: Some(match val {
				envelope::Payload::Setup(setup) => Variant::Setup(setup.into()),
				envelope::Payload::Update(update) => Variant::Update(update.into()),
				envelope::Payload::Add(add) => Variant::Add(add.into()),
			}),
		}
	}
}

impl TryFrom<Payload> for envelope::Payload {
	type Error = Error;

	fn try_from(val: Payload) -> Result<Self, Self::Error> {
		use payload::Variant;

		Ok(match val.variant.ok_or(Error::BadPayloadFormat)? {
			Variant::Setup(setup) => Self::Setup(setup.try_into()?),
			Variant::Update(update) => Self::Update(update.try_into()?),
			Variant::Add(add) => Self::Add(add.try_into()?),
		})
	}
}

impl Serializable for envelope::Payload {
	fn serialize(&self) -> Vec<u8> {
		Payload::from(self).encode_to_vec()
	}
}

impl Deserializable for envelope::Payload {
	type Error = Error;

	fn deserialize(buf: &[u8]) -> Result<Self, Self::Error> {
		Payload::decode(buf).or(Err(Error::BadFormat))?.try_into()
	}
}

// Envelope
impl From<&envelope::Envelope> for Envelope {
	fn from(val: &envelope::Envelope) -> Self {
		Self {
			payload: val.payload().to_vec(),
			tag: val.tag().as_bytes().to_vec(),
		}
	}
}

impl TryFrom<Envelope> for envelope::Envelope {
	type Error = Error;

	fn try_from(val: Envelope) -> Result<Self, Self::Error> {
		Ok(Self::new(
			val.payload,
			hmac::Tag::try_from(val.tag).or(Err(Error::WrongTagSize))?,
		))
	}
}

impl Serializable for envelope::Envelope {
	fn serialize(&self) -> Vec<u8> {
		Envelope::from(self).encode_to_vec()
	}
}

impl Deserializable for envelope::Envelope {
	type Error = Error;

	fn deserialize(buf: &[u8]) -> Result<Self, Self::Error> {
		Envelope::decode(buf).or(Err(Error::BadFormat))?.try_into()
	}
}
