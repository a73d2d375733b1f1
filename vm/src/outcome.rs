use {
  thiserror::Error,
  tycho_types::{cell::Cell, error::Error as CellError, models::SendMsgFlags},
};

/// Which safety invariant a rejected command would have broken.
///
/// Both variants protect against the same terminal state: signature
/// authorization switched off while nobody is left on the delegate list,
/// which would make the account unreachable forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lockout {
  /// Disabling signature authorization while there are no delegates.
  DisableWithoutDelegates,

  /// Removing the last delegate while signature authorization is disabled.
  RemoveLastDelegate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("Signature authorization is disabled")]
  SignatureDisabled,

  #[error("Invalid sequence number, expected {expected} got {found}")]
  InvalidSequence { expected: u32, found: u32 },

  #[error("Request is signed for a different account identifier ({0})")]
  InvalidIdentifier(u32),

  #[error("Request signature does not match the owner key")]
  InvalidSignature,

  #[error("Request expired at {0}")]
  Expired(u32),

  #[error("Transfers requested by external messages must ignore errors")]
  ModeRequiresIgnoreErrors,

  #[error("Unrecognized operation {0:#010x}")]
  UnrecognizedOperation(u32),

  #[error("Address is already a delegate")]
  DuplicateDelegate,

  #[error("Address is not a delegate")]
  MissingDelegate,

  #[error("Unsupported command")]
  UnsupportedCommand,

  #[error("Command would lock the account out: {0:?}")]
  LockoutInvariantViolated(Lockout),

  #[error("Signature authorization mode is already set to this value")]
  ModeUnchanged,

  #[error("Delegates must be in the same workchain as the account")]
  WrongScope,

  #[error("Only delegates can change signature authorization mode")]
  NotADelegateRequest,

  #[error("Malformed action list: {0}")]
  MalformedActionList(#[from] CellError),

  #[error("Malformed request: {0}")]
  MalformedRequest(CellError),
}

impl Error {
  /// Numeric status code reported to the ledger for this error.
  pub fn exit_code(&self) -> i32 {
    match self {
      Error::MalformedRequest(_) => 9,
      Error::SignatureDisabled => 132,
      Error::InvalidSequence { .. } => 133,
      Error::InvalidIdentifier(_) => 134,
      Error::InvalidSignature => 135,
      Error::Expired(_) => 136,
      Error::ModeRequiresIgnoreErrors => 137,
      Error::UnrecognizedOperation(_) => 138,
      Error::DuplicateDelegate => 139,
      Error::MissingDelegate => 140,
      Error::UnsupportedCommand => 141,
      Error::LockoutInvariantViolated(Lockout::DisableWithoutDelegates) => 142,
      Error::ModeUnchanged => 143,
      Error::LockoutInvariantViolated(Lockout::RemoveLastDelegate) => 144,
      Error::WrongScope => 145,
      Error::NotADelegateRequest => 146,
      Error::MalformedActionList(_) => 147,
    }
  }
}

/// A transfer handed over to the ledger for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
  pub mode: SendMsgFlags,

  /// The relaxed message as the owner built it, never inspected here.
  pub message: Cell,
}

/// Terminal result of processing one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// The request was authorized and every command in it was applied.
  /// The listed transfers are emitted in the order they were requested.
  Executed(Vec<OutboundMessage>),

  /// Nothing happened. Used for deposits and for internal messages that
  /// failed authorization: any value they carried stays with the account.
  Ignored,

  /// An external message was not accepted. There is no transaction and the
  /// account state is untouched.
  Rejected(Error),

  /// An owner-external request passed authorization, its sequence number
  /// was committed, but the commands failed. Only the sequence advanced.
  Committed(Error),

  /// An internal request was authorized but failed while executing. It is
  /// rolled back entirely and the attached value goes back to the sender.
  Refused(Error),
}

impl Outcome {
  pub fn exit_code(&self) -> i32 {
    match self.error() {
      Some(error) => error.exit_code(),
      None => 0,
    }
  }

  pub fn error(&self) -> Option<&Error> {
    match self {
      Outcome::Executed(_) | Outcome::Ignored => None,
      Outcome::Rejected(e) | Outcome::Committed(e) | Outcome::Refused(e) => {
        Some(e)
      }
    }
  }

  /// Transfers emitted by this request, empty unless it was executed.
  pub fn transfers(&self) -> &[OutboundMessage] {
    match self {
      Outcome::Executed(transfers) => transfers,
      _ => &[],
    }
  }
}
