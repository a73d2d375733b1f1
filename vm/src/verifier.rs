use ed25519_dalek::{PublicKey, Signature, Verifier};

/// Checks owner signatures over request hashes.
///
/// The engine never touches key material directly, so tests and embedders
/// can substitute their own oracle.
pub trait SignatureVerifier {
  fn verify(
    &self,
    public_key: &[u8; 32],
    hash: &[u8; 32],
    signature: &[u8; 64],
  ) -> bool;
}

/// Ed25519 verification of the 32-byte request hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519;

impl SignatureVerifier for Ed25519 {
  fn verify(
    &self,
    public_key: &[u8; 32],
    hash: &[u8; 32],
    signature: &[u8; 64],
  ) -> bool {
    let Ok(public_key) = PublicKey::from_bytes(public_key) else {
      return false;
    };
    if let Ok(signature) = Signature::try_from(&signature[..]) {
      return public_key.verify(hash, &signature).is_ok();
    }
    false
  }
}
