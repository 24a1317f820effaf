// Accepts attributes, a type name and a size, outputs a fixed-size key type, eg Scalar, GroupElement
macro_rules! key {
	($(#[$meta: meta])* $type: ident, $size: expr) => {
		$(#[$meta])*
		pub struct $type([u8; $size]);

		impl $type {
			pub const SIZE: usize = $size;

			pub fn new(bytes: [u8; $size]) -> Self {
				Self(bytes)
			}

			pub fn as_bytes(&self) -> &[u8; $size] {
				&self.0
			}
		}

		impl From<&[u8; $size]> for $type {
			fn from(bytes: &[u8; $size]) -> Self {
				Self::new(*bytes)
			}
		}

		impl TryFrom<Vec<u8>> for $type {
			type Error = std::array::TryFromSliceError;

			fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
				let slice: [u8; $size] = value.as_slice().try_into()?;

				Ok(Self::new(slice))
			}
		}
	};
}

pub(crate) use key;
