/// Running CRC-32 with scope flags, used by the model entities to fold
/// their identity-relevant bytes into a checksum.
pub mod checksum;
