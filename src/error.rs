use crate::impl_protobuf;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Error {
	#[error("a key tree needs at least one leaf")]
	EmptyRoster,
	#[error("index {index} is out of range for a tree of {size} leaves")]
	IndexOutOfRange { index: usize, size: usize },
	// divergence depth is undefined for a leaf and itself
	#[error("leaf {0} does not diverge from itself")]
	EqualIndices(usize),
	#[error("expected a path of {expected} nodes, got {actual}")]
	MalformedCopath { expected: usize, actual: usize },
	// frontier sizes are not a binary decomposition of the roster size
	#[error("frontier does not describe the group")]
	MalformedFrontier,
	// the setup refers to a pre-key that was either never published or is already consumed
	#[error("unknown pre-key")]
	UnknownPreKey,
	#[error("authentication failed")]
	AuthenticationFailed,
	#[error("malformed envelope: {0}")]
	MalformedEnvelope(#[from] impl_protobuf::Error),
	// a well-formed envelope of a kind this operation does not accept, eg an update passed to process_add
	#[error("expected a {expected} payload, got {actual}")]
	UnexpectedPayload {
		expected: &'static str,
		actual: &'static str,
	},
	// I received a setup, but my identity is not where it claims I am
	#[error("identity not found at roster index {0}")]
	NotInRoster(usize),
}
