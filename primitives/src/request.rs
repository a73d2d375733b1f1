use {
  crate::actions::ActionList,
  tycho_types::{
    cell::{Cell, CellBuilder, CellSlice, DynCell, HashBytes},
    error::Error,
  },
};

/// Size in bits of the owner signature closing a signed request.
pub const SIGNATURE_BITS: u16 = 512;

/// The 32-bit prefix of a request body selecting its authorization lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
  /// Owner request delivered as an external message.
  SignedExternal,

  /// Owner request relayed by another account in an internal message.
  SignedInternal,

  /// Unsigned request from an account on the delegate list.
  Delegate,
}

impl Tag {
  pub const fn code(self) -> u32 {
    match self {
      Tag::SignedExternal => 0x7369676e,
      Tag::SignedInternal => 0x73696e74,
      Tag::Delegate => 0x6578746e,
    }
  }

  pub const fn from_code(code: u32) -> Option<Tag> {
    match code {
      0x7369676e => Some(Tag::SignedExternal),
      0x73696e74 => Some(Tag::SignedInternal),
      0x6578746e => Some(Tag::Delegate),
      _ => None,
    }
  }
}

/// An owner request as it arrives, before any check has been made.
///
/// ```text
/// tag:uint32 identifier:uint32 valid_until:uint32 sequence:uint32
///   actions:ActionList signature:bits512
/// ```
///
/// The signature covers the hash of the body cell without its last 512
/// bits. The tag is part of the signed data, so a request signed for one
/// lane cannot be submitted through the other.
#[derive(Debug, Clone, Copy)]
pub struct SignedRequest<'a> {
  pub identifier: u32,
  pub valid_until: u32,
  pub sequence: u32,
  pub hash: HashBytes,
  pub signature: [u8; 64],

  /// Undecoded action list. It is only read once the request has been
  /// authorized.
  pub actions: CellSlice<'a>,
}

impl<'a> SignedRequest<'a> {
  /// Parses a full body, including the leading tag.
  pub fn parse(body: &'a DynCell) -> Result<Self, Error> {
    let mut payload = body.as_slice()?;
    let mut signature = [0u8; 64];
    payload
      .load_suffix(SIGNATURE_BITS, 0)?
      .load_raw(&mut signature, SIGNATURE_BITS)?;
    let hash = *CellBuilder::build_from(payload)?.repr_hash();

    payload.skip_first(32, 0)?;
    let identifier = payload.load_u32()?;
    let valid_until = payload.load_u32()?;
    let sequence = payload.load_u32()?;

    Ok(Self {
      identifier,
      valid_until,
      sequence,
      hash,
      signature,
      actions: payload,
    })
  }
}

/// Owner request waiting for its signature.
#[derive(Debug, Clone)]
pub struct UnsignedRequest {
  pub tag: Tag,
  pub identifier: u32,
  pub valid_until: u32,
  pub sequence: u32,
  pub actions: ActionList,
}

impl UnsignedRequest {
  fn payload(&self) -> Result<Cell, Error> {
    CellBuilder::build_from((
      self.tag.code(),
      self.identifier,
      self.valid_until,
      self.sequence,
      &self.actions,
    ))
  }

  /// The hash the owner has to sign.
  pub fn hash(&self) -> Result<HashBytes, Error> {
    Ok(*self.payload()?.repr_hash())
  }

  /// Produces the final body with `signature` appended.
  pub fn with_signature(&self, signature: &[u8; 64]) -> Result<Cell, Error> {
    let payload = self.payload()?;
    let mut builder = CellBuilder::new();
    builder.store_slice(payload.as_slice()?)?;
    builder.store_raw(signature, SIGNATURE_BITS)?;
    builder.build()
  }

  /// Signs the request with a signing callback and returns the body.
  pub fn sign(
    &self,
    signer: impl FnOnce(&[u8; 32]) -> [u8; 64],
  ) -> Result<Cell, Error> {
    let signature = signer(self.hash()?.as_array());
    self.with_signature(&signature)
  }
}

/// A request from a delegate.
///
/// ```text
/// tag:uint32 query_id:uint64 actions:ActionList
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DelegateRequest<'a> {
  /// Opaque correlation value chosen by the delegate.
  pub query_id: u64,
  pub actions: CellSlice<'a>,
}

impl<'a> DelegateRequest<'a> {
  pub fn parse(body: &'a DynCell) -> Result<Self, Error> {
    let mut slice = body.as_slice()?;
    slice.skip_first(32, 0)?;
    let query_id = slice.load_u64()?;
    Ok(Self {
      query_id,
      actions: slice,
    })
  }

  pub fn build(query_id: u64, actions: &ActionList) -> Result<Cell, Error> {
    CellBuilder::build_from((Tag::Delegate.code(), query_id, actions))
  }
}
