use {
  crate::{
    dispatch::Lane,
    outcome::{Error, OutboundMessage},
    staged::Staged,
    state::{AccountState, StateDiff},
  },
  tracing::debug,
  tycho_types::models::{OutAction, SendMsgFlags, StdAddr},
  warden_primitives::{ActionList, ManagementAction},
};

/// Effects of a fully executed action list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
  /// Changes to the account state made by management actions. Applying it
  /// is left to the caller, together with any sequence advancement.
  pub diff: StateDiff,

  /// Outbound messages in the order they were requested.
  pub transfers: Vec<OutboundMessage>,
}

/// Executes an authorized action list.
///
/// Transfers are validated first, then management actions are applied in
/// order against a staged view of `state`, so that each of them sees the
/// effects of the ones before it. The first failing action aborts the whole
/// list, in which case nothing from it must be committed.
pub fn execute(
  actions: &ActionList,
  lane: Lane,
  state: &AccountState,
  account: &StdAddr,
) -> Result<Execution, Error> {
  let transfers = collect_transfers(actions, lane)?;

  let mut staged = Staged::new(state, account.workchain);
  for action in &actions.management {
    debug!("executing {action:?} in {lane:?} lane");
    match action {
      ManagementAction::AddDelegate(address) => staged.add_delegate(address)?,
      ManagementAction::RemoveDelegate(address) => {
        staged.remove_delegate(address)?
      }
      ManagementAction::SetSignatureAuth(enabled) => {
        if lane != Lane::Delegate {
          return Err(Error::NotADelegateRequest);
        }
        staged.set_signature_auth(*enabled)?
      }
      ManagementAction::Unsupported(_) => {
        return Err(Error::UnsupportedCommand)
      }
    }
  }

  Ok(Execution {
    diff: staged.into_diff(),
    transfers,
  })
}

fn collect_transfers(
  actions: &ActionList,
  lane: Lane,
) -> Result<Vec<OutboundMessage>, Error> {
  actions
    .transfers
    .iter()
    .map(|action| match action {
      OutAction::SendMsg { mode, out_msg } => {
        if lane == Lane::OwnerExternal
          && !mode.contains(SendMsgFlags::IGNORE_ERROR)
        {
          return Err(Error::ModeRequiresIgnoreErrors);
        }
        Ok(OutboundMessage {
          mode: *mode,
          message: out_msg.inner().clone(),
        })
      }
      // code replacement and any other ledger action
      _ => Err(Error::UnsupportedCommand),
    })
    .collect()
}
