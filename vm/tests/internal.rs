use {
  common::{address, management, transfer, transfers, Wallet},
  ed25519_dalek::{Keypair, Signer},
  tycho_types::{
    cell::{Cell, CellBuilder, CellFamily, HashBytes, Lazy},
    error::Error as CellError,
    models::{OutAction, SendMsgFlags, StdAddr},
  },
  warden_primitives::{ActionList, ManagementAction, Tag, UnsignedRequest},
  warden_vm::{process, Ed25519, Error, InboundMessage, Origin, Outcome},
};

mod common;

#[test]
fn relayed_request_is_executed() -> anyhow::Result<()> {
  let mut wallet = Wallet::new();
  let relay = address(0x77);

  // internal requests may use any send mode
  let strict = OutAction::SendMsg {
    mode: SendMsgFlags::WITH_REMAINING_BALANCE,
    out_msg: Lazy::from_raw(Cell::empty_cell())?,
  };
  let outcome = wallet.send_internal(relay, ActionList {
    transfers: vec![transfer(address(1), 5), strict],
    management: vec![ManagementAction::AddDelegate(address(0xd1))],
  });

  assert_eq!(outcome.exit_code(), 0);
  assert_eq!(outcome.transfers().len(), 2);
  assert_eq!(
    outcome.transfers()[1].mode,
    SendMsgFlags::WITH_REMAINING_BALANCE
  );

  let state = wallet.state();
  assert_eq!(state.sequence, 1);
  assert!(state.delegates.contains(&address(0xd1).address));
  Ok(())
}

#[test]
fn wrong_signature_is_ignored() -> anyhow::Result<()> {
  let mut wallet = Wallet::new();
  let before = wallet.state();

  let stranger = Keypair::generate(&mut rand::thread_rng());
  let request = wallet.request(
    Tag::SignedInternal,
    transfers(vec![transfer(address(1), 1_000)]),
  );
  let body = request.sign(|hash| stranger.sign(hash).to_bytes())?;

  let outcome = wallet.internal(address(0x77), body);
  assert_eq!(outcome, Outcome::Ignored);
  assert_eq!(outcome.exit_code(), 0);
  assert!(outcome.transfers().is_empty());
  assert_eq!(wallet.state(), before);
  Ok(())
}

#[test]
fn failed_preconditions_are_ignored() -> anyhow::Result<()> {
  let mut wallet = Wallet::new();
  let before = wallet.state();
  let actions = transfers(vec![transfer(address(1), 1)]);

  let requests = [
    UnsignedRequest {
      valid_until: wallet.now - 1,
      ..wallet.request(Tag::SignedInternal, actions.clone())
    },
    UnsignedRequest {
      sequence: 3,
      ..wallet.request(Tag::SignedInternal, actions.clone())
    },
    UnsignedRequest {
      identifier: 0,
      ..wallet.request(Tag::SignedInternal, actions)
    },
  ];

  for request in &requests {
    let body = wallet.sign(request);
    assert_eq!(wallet.internal(address(0x77), body), Outcome::Ignored);
  }
  assert_eq!(wallet.state(), before);
  Ok(())
}

#[test]
fn failed_execution_is_rolled_back() -> anyhow::Result<()> {
  let mut wallet = Wallet::new();
  let before = wallet.state();

  let outcome = wallet.send_internal(address(0x77), ActionList {
    transfers: vec![transfer(address(1), 1)],
    management: vec![
      ManagementAction::AddDelegate(address(0xd1)),
      ManagementAction::AddDelegate(StdAddr::new(-1, HashBytes([0xd2; 32]))),
    ],
  });

  assert_eq!(outcome, Outcome::Refused(Error::WrongScope));
  assert_eq!(outcome.exit_code(), 145);
  assert!(outcome.transfers().is_empty());
  assert_eq!(wallet.state(), before);
  Ok(())
}

#[test]
fn malformed_action_list_is_refused() -> anyhow::Result<()> {
  let mut wallet = Wallet::new();
  let before = wallet.state();

  let mut actions = CellBuilder::new();
  actions.store_small_uint(0, 3)?;
  let body = wallet.sign_raw(Tag::SignedInternal, 0, &actions.build()?)?;

  assert_eq!(
    wallet.internal(address(0x77), body),
    Outcome::Refused(Error::MalformedActionList(CellError::InvalidData))
  );
  assert_eq!(wallet.state(), before);
  Ok(())
}

#[test]
fn owner_can_not_change_signature_mode() -> anyhow::Result<()> {
  let mut wallet = Wallet::with_delegates(&[address(0xd1)]);
  let outcome = wallet.send_internal(
    address(0x77),
    management(vec![ManagementAction::SetSignatureAuth(false)]),
  );
  assert_eq!(outcome, Outcome::Refused(Error::NotADelegateRequest));
  assert!(wallet.state().signature_auth_enabled);
  assert_eq!(wallet.state().sequence, 0);
  Ok(())
}

#[test]
fn executed_request_can_not_be_replayed() -> anyhow::Result<()> {
  let mut wallet = Wallet::new();
  let request = wallet.request(
    Tag::SignedInternal,
    transfers(vec![transfer(address(1), 1)]),
  );
  let body = wallet.sign(&request);

  assert_eq!(wallet.internal(address(0x77), body.clone()).transfers().len(), 1);
  assert_eq!(wallet.internal(address(0x77), body), Outcome::Ignored);
  assert_eq!(wallet.state().sequence, 1);
  Ok(())
}

#[test]
fn requests_are_bound_to_their_lane() -> anyhow::Result<()> {
  let mut wallet = Wallet::new();
  let request = wallet.request(
    Tag::SignedExternal,
    transfers(vec![transfer(address(1), 1)]),
  );
  let body = wallet.sign(&request);

  assert_eq!(wallet.internal(address(0x77), body.clone()), Outcome::Ignored);
  assert_eq!(wallet.external(body).transfers().len(), 1);
  Ok(())
}

#[test]
fn plain_transfers_are_deposits() -> anyhow::Result<()> {
  let mut wallet = Wallet::new();
  let before = wallet.state();

  let empty = Cell::empty_cell();
  assert_eq!(wallet.internal(address(1), empty), Outcome::Ignored);

  let mut comment = CellBuilder::new();
  comment.store_u32(0)?;
  comment.store_raw(b"thanks", 48)?;
  assert_eq!(wallet.internal(address(1), comment.build()?), Outcome::Ignored);

  let short = CellBuilder::build_from(0x7369u16)?;
  assert_eq!(wallet.internal(address(1), short), Outcome::Ignored);

  // a signed request that is too short to carry an action list
  let mut truncated = CellBuilder::new();
  truncated.store_u32(Tag::SignedInternal.code())?;
  truncated.store_raw(&[0; 12], 96)?;
  truncated.store_raw(&[0; 64], 512)?;
  assert_eq!(
    wallet.internal(address(1), truncated.build()?),
    Outcome::Ignored
  );

  assert_eq!(wallet.state(), before);
  Ok(())
}

#[test]
fn bounced_messages_are_ignored() -> anyhow::Result<()> {
  let mut wallet = Wallet::new();
  let request = wallet.request(
    Tag::SignedInternal,
    transfers(vec![transfer(address(1), 1)]),
  );
  let message = InboundMessage {
    origin: Origin::Internal {
      sender: address(0x77),
      bounced: true,
    },
    body: wallet.sign(&request),
  };

  let outcome = process(&message, &wallet.env(), &mut wallet.store, &Ed25519);
  assert_eq!(outcome, Outcome::Ignored);
  assert_eq!(wallet.state().sequence, 0);
  Ok(())
}
