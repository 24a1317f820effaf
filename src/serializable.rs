// byte encoding of whatever a transport has to carry, eg an Envelope
pub trait Serializable {
	fn serialize(&self) -> Vec<u8>;
}

pub trait Deserializable: Sized {
	type Error;

	fn deserialize(buf: &[u8]) -> Result<Self, Self::Error>;
}
