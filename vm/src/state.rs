use {
  std::collections::{BTreeMap, BTreeSet},
  tycho_types::{
    cell::{Cell, CellBuilder, DynCell, HashBytes, Load},
    dict::Dict,
    error::Error as CellError,
    models::StdAddr,
  },
};

/// The persistent record of an account.
///
/// It is created once when the account is instantiated and afterwards only
/// changes through [`StateDiff`]s produced by authorized requests.
///
/// On the ledger it is stored as a single cell:
///
/// ```text
/// signature_auth_enabled:Bool sequence:uint32 identifier:uint32
/// public_key:bits256 delegates:(HashmapE 256 Bool)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
  /// Whether requests signed by the owner key are honored.
  pub signature_auth_enabled: bool,

  /// Replay protection counter. Owner requests must carry exactly this
  /// value and it advances by one for every accepted owner request.
  pub sequence: u32,

  /// Scopes owner signatures to this account instance, so that a request
  /// signed for one account cannot be replayed against another account
  /// that happens to use the same key.
  pub identifier: u32,

  /// Ed25519 key of the owner.
  pub public_key: [u8; 32],

  /// Hashes of addresses allowed to issue unsigned requests. Delegates
  /// always live in the same workchain as the account itself, so the hash
  /// identifies them unambiguously.
  pub delegates: BTreeSet<HashBytes>,
}

impl AccountState {
  /// State of a freshly instantiated account: sequence zero, signature
  /// authorization enabled and no delegates.
  pub fn new(public_key: [u8; 32], identifier: u32) -> Self {
    Self {
      signature_auth_enabled: true,
      sequence: 0,
      identifier,
      public_key,
      delegates: BTreeSet::new(),
    }
  }

  pub fn to_cell(&self) -> Result<Cell, CellError> {
    CellBuilder::build_from((
      self.signature_auth_enabled,
      self.sequence,
      self.identifier,
      HashBytes(self.public_key),
      self.presence_markers()?,
    ))
  }

  pub fn from_cell(cell: &DynCell) -> Result<Self, CellError> {
    let mut slice = cell.as_slice()?;
    let signature_auth_enabled = slice.load_bit()?;
    let sequence = slice.load_u32()?;
    let identifier = slice.load_u32()?;
    let public_key = slice.load_u256()?;
    let delegates = Dict::<HashBytes, bool>::load_from(&mut slice)?;
    if !slice.is_empty() {
      return Err(CellError::InvalidData);
    }

    Ok(Self {
      signature_auth_enabled,
      sequence,
      identifier,
      public_key: public_key.0,
      // the presence marker carries no information, a stored
      // key alone makes the address a delegate.
      delegates: delegates.keys().collect::<Result<_, _>>()?,
    })
  }

  fn presence_markers(&self) -> Result<Dict<HashBytes, bool>, CellError> {
    let markers: BTreeMap<HashBytes, bool> =
      self.delegates.iter().map(|hash| (*hash, true)).collect();
    Dict::try_from_btree(&markers)
  }

  /// Applies a diff produced against this state.
  pub fn apply(&mut self, diff: StateDiff) {
    if let Some(sequence) = diff.sequence {
      self.sequence = sequence;
    }
    if let Some(enabled) = diff.signature_auth_enabled {
      self.signature_auth_enabled = enabled;
    }
    for hash in diff.removed {
      self.delegates.remove(&hash);
    }
    for hash in diff.added {
      self.delegates.insert(hash);
    }
  }

  pub fn seqno(&self) -> u32 {
    self.sequence
  }

  pub fn public_key(&self) -> &[u8; 32] {
    &self.public_key
  }

  pub fn subwallet_id(&self) -> u32 {
    self.identifier
  }

  pub fn is_signature_allowed(&self) -> bool {
    self.signature_auth_enabled
  }

  /// Full addresses of all delegates of an account living in `workchain`.
  pub fn delegates(&self, workchain: i8) -> impl Iterator<Item = StdAddr> + '_ {
    self
      .delegates
      .iter()
      .map(move |hash| StdAddr::new(workchain, *hash))
  }

  /// The delegate set exactly as it is persisted, `None` when empty.
  pub fn delegates_dict(&self) -> Result<Option<Cell>, CellError> {
    Ok(self.presence_markers()?.into_root())
  }
}

/// Represents a change to an [`AccountState`].
///
/// Every request produces at most two diffs: one that only advances the
/// sequence number and one with the effects of its commands. Depending on
/// the authorization lane they are applied to the account store separately
/// or merged and applied together, see the dispatcher for details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDiff {
  sequence: Option<u32>,
  signature_auth_enabled: Option<bool>,
  added: BTreeSet<HashBytes>,
  removed: BTreeSet<HashBytes>,
}

impl StateDiff {
  /// A diff that only moves the sequence number one step forward.
  ///
  /// Returns `None` once the counter is exhausted, such an account can no
  /// longer accept owner requests.
  pub fn advance_sequence(state: &AccountState) -> Option<StateDiff> {
    Some(StateDiff {
      sequence: Some(state.sequence.checked_add(1)?),
      ..Default::default()
    })
  }

  pub(crate) fn set_signature_auth(&mut self, enabled: bool) {
    self.signature_auth_enabled = Some(enabled);
  }

  /// Records a delegate insertion. Must not be called for a hash that is
  /// present in the base state, unless this diff removed it before.
  pub(crate) fn add_delegate(&mut self, hash: HashBytes) {
    if !self.removed.remove(&hash) {
      self.added.insert(hash);
    }
  }

  /// Records a delegate removal. Must only be called for a hash that is
  /// present in the base state or was added by this diff.
  pub(crate) fn remove_delegate(&mut self, hash: HashBytes) {
    if !self.added.remove(&hash) {
      self.removed.insert(hash);
    }
  }

  pub fn sequence(&self) -> Option<u32> {
    self.sequence
  }

  pub fn signature_auth_enabled(&self) -> Option<bool> {
    self.signature_auth_enabled
  }

  pub fn added(&self) -> impl Iterator<Item = &HashBytes> {
    self.added.iter()
  }

  pub fn removed(&self) -> impl Iterator<Item = &HashBytes> {
    self.removed.iter()
  }

  pub fn is_empty(&self) -> bool {
    self == &StateDiff::default()
  }

  /// Merges a diff with a newer diff.
  ///
  /// Applying the resulting diff is equivalent to applying
  /// the two merged diffs consecutively on any state.
  pub fn merge(self, newer: StateDiff) -> StateDiff {
    let mut merged = StateDiff {
      sequence: newer.sequence.or(self.sequence),
      signature_auth_enabled: newer
        .signature_auth_enabled
        .or(self.signature_auth_enabled),
      added: self.added,
      removed: self.removed,
    };
    for hash in newer.removed {
      merged.remove_delegate(hash);
    }
    for hash in newer.added {
      merged.add_delegate(hash);
    }
    merged
  }
}

/// Owner of the persistent account record.
///
/// The engine reads the current state through `get` and writes exclusively
/// through `apply`. An `apply` is durable once it returns, which is what
/// makes the early sequence commit of external requests irrevocable.
pub trait Store {
  fn get(&self) -> AccountState;
  fn apply(&mut self, diff: StateDiff);
}

#[derive(Debug, Clone)]
pub struct InMemoryStore {
  state: AccountState,
}

impl InMemoryStore {
  pub fn new(state: AccountState) -> Self {
    Self { state }
  }

  pub fn state(&self) -> &AccountState {
    &self.state
  }
}

impl Store for InMemoryStore {
  fn get(&self) -> AccountState {
    self.state.clone()
  }

  fn apply(&mut self, diff: StateDiff) {
    self.state.apply(diff);
  }
}
