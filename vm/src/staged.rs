use {
  crate::{
    outcome::{Error, Lockout},
    state::{AccountState, StateDiff},
  },
  tycho_types::{cell::HashBytes, models::StdAddr},
};

/// A view of the account state with the not yet committed effects of the
/// commands executed so far layered on top of it.
///
/// Commands are checked against this view, so each one sees the effects of
/// every command before it in the same request. The base state stays
/// untouched until the accumulated diff is applied by the dispatcher.
pub struct Staged<'a> {
  base: &'a AccountState,
  workchain: i8,
  diff: StateDiff,
}

impl<'a> Staged<'a> {
  pub fn new(base: &'a AccountState, workchain: i8) -> Self {
    Self {
      base,
      workchain,
      diff: StateDiff::default(),
    }
  }

  pub fn is_delegate(&self, hash: &HashBytes) -> bool {
    if self.diff.added().any(|h| h == hash) {
      return true;
    }
    if self.diff.removed().any(|h| h == hash) {
      return false;
    }
    self.base.delegates.contains(hash)
  }

  pub fn delegate_count(&self) -> usize {
    self.base.delegates.len() + self.diff.added().count()
      - self.diff.removed().count()
  }

  pub fn signature_auth_enabled(&self) -> bool {
    self
      .diff
      .signature_auth_enabled()
      .unwrap_or(self.base.signature_auth_enabled)
  }

  fn check_scope(&self, address: &StdAddr) -> Result<(), Error> {
    match address.workchain == self.workchain {
      true => Ok(()),
      false => Err(Error::WrongScope),
    }
  }

  pub fn add_delegate(&mut self, address: &StdAddr) -> Result<(), Error> {
    self.check_scope(address)?;
    if self.is_delegate(&address.address) {
      return Err(Error::DuplicateDelegate);
    }
    self.diff.add_delegate(address.address);
    Ok(())
  }

  pub fn remove_delegate(&mut self, address: &StdAddr) -> Result<(), Error> {
    self.check_scope(address)?;
    if !self.is_delegate(&address.address) {
      return Err(Error::MissingDelegate);
    }
    if !self.signature_auth_enabled() && self.delegate_count() == 1 {
      return Err(Error::LockoutInvariantViolated(Lockout::RemoveLastDelegate));
    }
    self.diff.remove_delegate(address.address);
    Ok(())
  }

  pub fn set_signature_auth(&mut self, enabled: bool) -> Result<(), Error> {
    if self.signature_auth_enabled() == enabled {
      return Err(Error::ModeUnchanged);
    }
    if !enabled && self.delegate_count() == 0 {
      return Err(Error::LockoutInvariantViolated(
        Lockout::DisableWithoutDelegates,
      ));
    }
    self.diff.set_signature_auth(enabled);
    Ok(())
  }

  pub fn into_diff(self) -> StateDiff {
    self.diff
  }
}
