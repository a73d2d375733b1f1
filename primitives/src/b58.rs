use tycho_types::cell::{DynCell, HashBytes};

pub trait ToBase58String {
  fn to_b58(&self) -> String;
}

impl ToBase58String for HashBytes {
  fn to_b58(&self) -> String {
    bs58::encode(self.as_array()).into_string()
  }
}

/// Cells are identified by their representation hash.
impl ToBase58String for DynCell {
  fn to_b58(&self) -> String {
    self.repr_hash().to_b58()
  }
}
