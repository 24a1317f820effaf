mod key;

pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod frontier;
pub mod group;
pub mod hash;
pub mod hmac;
pub mod impl_protobuf;
pub mod key_exchange;
pub mod prekey;
pub mod roster;
pub mod serializable;
pub mod tree;
pub mod treemath;
pub mod x25519;

pub use endpoint::Endpoint;
pub use envelope::{Envelope, Payload};
pub use error::Error;
pub use group::GroupState;
pub use prekey::{Bundle, PreKeyTable};
pub use serializable::{Deserializable, Serializable};
pub use x25519::{GroupElement, KeyPair, Scalar};
