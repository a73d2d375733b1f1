use {
  crate::{
    execution::{execute, Execution},
    outcome::{Error, Outcome},
    state::{AccountState, StateDiff, Store},
    verifier::SignatureVerifier,
  },
  tracing::{debug, info, warn},
  tycho_types::{cell::Cell, error::Error as CellError, models::StdAddr},
  warden_primitives::{
    ActionList,
    DelegateRequest,
    SignedRequest,
    Tag,
    ToBase58String,
  },
};

/// The authorization path a request takes through the engine.
///
/// The lane decides which credentials are checked and, more importantly,
/// when the sequence number is committed and what is rolled back on
/// failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
  /// Signed by the owner, delivered as an external message. The sequence
  /// is committed before any action is decoded.
  OwnerExternal,

  /// Signed by the owner, relayed inside an internal message. All or
  /// nothing, including the sequence.
  OwnerInternal,

  /// Unsigned, sent by an account on the delegate list. All or nothing,
  /// no sequence involved.
  Delegate,
}

impl Lane {
  /// Picks the lane for a tag arriving through a given origin. Tags are
  /// bound to their origin, an owner-internal tag inside an external
  /// message is not recognized and neither is the reverse.
  pub fn classify(origin: &Origin, tag: Tag) -> Option<Lane> {
    match (origin, tag) {
      (Origin::External, Tag::SignedExternal) => Some(Lane::OwnerExternal),
      (Origin::Internal { .. }, Tag::SignedInternal) => {
        Some(Lane::OwnerInternal)
      }
      (Origin::Internal { .. }, Tag::Delegate) => Some(Lane::Delegate),
      _ => None,
    }
  }
}

/// Where an inbound message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
  /// From outside the ledger, carries no value and no sender.
  External,

  /// From another account.
  Internal { sender: StdAddr, bounced: bool },
}

#[derive(Debug, Clone)]
pub struct InboundMessage {
  pub origin: Origin,
  pub body: Cell,
}

/// Facts about the current transaction supplied by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
  /// Address of the account processing the message.
  pub address: StdAddr,

  /// Current unix time in seconds.
  pub now: u32,
}

/// Processes one inbound message against the account.
///
/// All state changes go through `store`. Depending on the lane and on how
/// far the request got, the store receives nothing, only the sequence
/// advancement, or the full set of changes.
pub fn process(
  message: &InboundMessage,
  env: &Environment,
  store: &mut impl Store,
  verifier: &impl SignatureVerifier,
) -> Outcome {
  if let Origin::Internal { bounced: true, .. } = message.origin {
    debug!("ignoring bounced message");
    return Outcome::Ignored;
  }

  let code = match message.body.as_slice().and_then(|s| s.get_u32(0)) {
    Ok(code) => code,
    Err(e) => {
      return match message.origin {
        Origin::External => {
          warn!("rejecting external message without a tag");
          Outcome::Rejected(Error::MalformedRequest(e))
        }
        Origin::Internal { .. } => {
          debug!("plain deposit");
          Outcome::Ignored
        }
      };
    }
  };

  let lane = Tag::from_code(code) //
    .and_then(|tag| Lane::classify(&message.origin, tag));
  let Some(lane) = lane else {
    return match message.origin {
      Origin::External => {
        warn!("rejecting unrecognized operation {code:#010x}");
        Outcome::Rejected(Error::UnrecognizedOperation(code))
      }
      Origin::Internal { .. } => {
        debug!("ignoring internal message with operation {code:#010x}");
        Outcome::Ignored
      }
    };
  };

  debug!("admitting request through {lane:?} lane");
  match (lane, &message.origin) {
    (Lane::OwnerExternal, _) => {
      owner_external(&message.body, env, store, verifier)
    }
    (Lane::OwnerInternal, _) => {
      owner_internal(&message.body, env, store, verifier)
    }
    (Lane::Delegate, Origin::Internal { sender, .. }) => {
      delegate(&message.body, sender, env, store)
    }
    (Lane::Delegate, Origin::External) => {
      Outcome::Rejected(Error::UnrecognizedOperation(code))
    }
  }
}

/// Checks the credentials of a signed request and returns the diff that
/// advances the sequence number past it.
fn admit(
  request: &SignedRequest<'_>,
  state: &AccountState,
  now: u32,
  verifier: &impl SignatureVerifier,
) -> Result<StateDiff, Error> {
  let hash = request.hash.as_array();
  if !verifier.verify(&state.public_key, hash, &request.signature) {
    return Err(Error::InvalidSignature);
  }

  if !state.signature_auth_enabled {
    return Err(Error::SignatureDisabled);
  }

  let invalid_sequence = Error::InvalidSequence {
    expected: state.sequence,
    found: request.sequence,
  };
  if request.sequence != state.sequence {
    return Err(invalid_sequence);
  }

  if request.identifier != state.identifier {
    return Err(Error::InvalidIdentifier(request.identifier));
  }

  if now >= request.valid_until {
    return Err(Error::Expired(request.valid_until));
  }

  // an exhausted counter can never be matched again
  StateDiff::advance_sequence(state).ok_or(invalid_sequence)
}

fn decode_and_execute(
  actions: Result<ActionList, CellError>,
  lane: Lane,
  state: &AccountState,
  env: &Environment,
) -> Result<Execution, Error> {
  execute(&actions?, lane, state, &env.address)
}

fn owner_external(
  body: &Cell,
  env: &Environment,
  store: &mut impl Store,
  verifier: &impl SignatureVerifier,
) -> Outcome {
  let request = match SignedRequest::parse(body.as_ref()) {
    Ok(request) => request,
    Err(e) => {
      warn!("rejecting malformed external request: {e}");
      return Outcome::Rejected(Error::MalformedRequest(e));
    }
  };

  let state = store.get();
  let advance = match admit(&request, &state, env.now, verifier) {
    Ok(diff) => diff,
    Err(e) => {
      warn!("rejecting external request: {e}");
      return Outcome::Rejected(e);
    }
  };

  // commit point, the sequence stays advanced from here on
  store.apply(advance);
  info!(
    "committed sequence {} for external request {}",
    request.sequence,
    request.hash.to_b58()
  );

  let state = store.get();
  let actions = ActionList::from_slice(request.actions);
  match decode_and_execute(actions, Lane::OwnerExternal, &state, env) {
    Ok(execution) => {
      info!(
        "external request executed with {} transfers",
        execution.transfers.len()
      );
      store.apply(execution.diff);
      Outcome::Executed(execution.transfers)
    }
    Err(e) => {
      warn!("external request failed after commit: {e}");
      Outcome::Committed(e)
    }
  }
}

fn owner_internal(
  body: &Cell,
  env: &Environment,
  store: &mut impl Store,
  verifier: &impl SignatureVerifier,
) -> Outcome {
  let request = match SignedRequest::parse(body.as_ref()) {
    Ok(request) if request.actions.size_bits() != 0 => request,
    Ok(_) => {
      debug!("ignoring signed internal request without actions");
      return Outcome::Ignored;
    }
    Err(e) => {
      debug!("ignoring malformed signed internal request: {e}");
      return Outcome::Ignored;
    }
  };

  let state = store.get();
  let advance = match admit(&request, &state, env.now, verifier) {
    Ok(diff) => diff,
    Err(e) => {
      warn!("ignoring unauthorized signed internal request: {e}");
      return Outcome::Ignored;
    }
  };

  let actions = ActionList::from_slice(request.actions);
  match decode_and_execute(actions, Lane::OwnerInternal, &state, env) {
    Ok(execution) => {
      store.apply(advance.merge(execution.diff));
      info!(
        "signed internal request {} executed with {} transfers",
        request.hash.to_b58(),
        execution.transfers.len()
      );
      Outcome::Executed(execution.transfers)
    }
    Err(e) => {
      warn!("refusing signed internal request: {e}");
      Outcome::Refused(e)
    }
  }
}

fn delegate(
  body: &Cell,
  sender: &StdAddr,
  env: &Environment,
  store: &mut impl Store,
) -> Outcome {
  let state = store.get();
  if sender.workchain != env.address.workchain
    || !state.delegates.contains(&sender.address)
  {
    debug!("ignoring delegate request from {sender}, not a delegate");
    return Outcome::Ignored;
  }

  let request = match DelegateRequest::parse(body.as_ref()) {
    Ok(request) => request,
    Err(e) => {
      warn!("refusing malformed request from delegate {sender}: {e}");
      return Outcome::Refused(Error::MalformedActionList(e));
    }
  };

  let actions = ActionList::from_slice(request.actions);
  match decode_and_execute(actions, Lane::Delegate, &state, env) {
    Ok(execution) => {
      store.apply(execution.diff);
      info!(
        "delegate {sender} request {} executed with {} transfers",
        request.query_id,
        execution.transfers.len()
      );
      Outcome::Executed(execution.transfers)
    }
    Err(e) => {
      warn!(
        "refusing request {} from delegate {sender}: {e}",
        request.query_id
      );
      Outcome::Refused(e)
    }
  }
}
