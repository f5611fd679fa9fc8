//! Reading audio sources: decoding and scoped location access.

pub mod decode;
pub mod lease;

pub use decode::{DecodedAudio, decode_file};
pub use lease::{FileSystemAccess, Lease, LocationAccess};
