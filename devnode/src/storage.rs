use {
  thiserror::Error,
  tycho_types::{boc::Boc, error::Error as CellError, models::StdAddr},
  warden_vm::{AccountState, StateDiff, Store},
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sled::Error),

  #[error("Account record is not a valid bag of cells: {0}")]
  Boc(#[from] tycho_types::boc::de::Error),

  #[error("Malformed account record: {0}")]
  Record(#[from] CellError),

  #[error("Account {0} does not exist")]
  AccountDoesNotExist(StdAddr),

  #[error("Account {0} already exists")]
  AccountAlreadyExists(StdAddr),
}

/// Persistent record of a single account.
///
/// The record is kept in its on-ledger cell form, serialized as a bag of
/// cells, under the text form of the account address. Every applied diff is
/// written through and flushed before `apply` returns.
pub struct OnDiskStore {
  tree: sled::Tree,
  key: String,
  state: AccountState,
}

impl OnDiskStore {
  /// Creates a new account record, failing if one is already present.
  pub fn create(
    db: &sled::Db,
    address: &StdAddr,
    state: AccountState,
  ) -> Result<Self, Error> {
    let tree = db.open_tree("accounts")?;
    let key = address.to_string();
    if tree.contains_key(&key)? {
      return Err(Error::AccountAlreadyExists(address.clone()));
    }

    let store = Self { tree, key, state };
    store.persist()?;
    Ok(store)
  }

  pub fn open(db: &sled::Db, address: &StdAddr) -> Result<Self, Error> {
    let tree = db.open_tree("accounts")?;
    let key = address.to_string();
    let bytes = tree
      .get(&key)?
      .ok_or_else(|| Error::AccountDoesNotExist(address.clone()))?;
    let cell = Boc::decode(&bytes)?;
    let state = AccountState::from_cell(cell.as_ref())?;
    Ok(Self { tree, key, state })
  }

  fn persist(&self) -> Result<(), Error> {
    let record = Boc::encode(self.state.to_cell()?);
    self.tree.insert(&self.key, record)?;
    self.tree.flush()?;
    Ok(())
  }
}

impl Store for OnDiskStore {
  fn get(&self) -> AccountState {
    self.state.clone()
  }

  fn apply(&mut self, diff: StateDiff) {
    self.state.apply(diff);
    self.persist().expect("db io error");
  }
}
