#![allow(dead_code)]

use {
  ed25519_dalek::{Keypair, Signer},
  tycho_types::{
    cell::{Cell, CellBuilder, CellFamily, HashBytes, Lazy},
    error::Error as CellError,
    models::{
      CurrencyCollection,
      OutAction,
      OwnedRelaxedMessage,
      RelaxedIntMsgInfo,
      RelaxedMsgInfo,
      SendMsgFlags,
      StdAddr,
    },
  },
  warden_primitives::{
    ActionList,
    DelegateRequest,
    ManagementAction,
    Tag,
    UnsignedRequest,
  },
  warden_vm::{
    process,
    AccountState,
    Ed25519,
    Environment,
    InMemoryStore,
    InboundMessage,
    Origin,
    OutboundMessage,
    Outcome,
  },
};

pub const WORKCHAIN: i8 = 0;
pub const IDENTIFIER: u32 = 698983191;
pub const NOW: u32 = 1_700_000_000;

/// An account address in the same workchain as the test wallet.
pub fn address(byte: u8) -> StdAddr {
  StdAddr::new(WORKCHAIN, HashBytes([byte; 32]))
}

/// A relaxed internal message carrying `value` to `destination`.
pub fn message(destination: StdAddr, value: u128) -> OwnedRelaxedMessage {
  OwnedRelaxedMessage {
    info: RelaxedMsgInfo::Int(RelaxedIntMsgInfo {
      dst: destination.into(),
      value: CurrencyCollection::new(value),
      ..Default::default()
    }),
    init: None,
    body: Default::default(),
    layout: None,
  }
}

/// A transfer of `value` to `destination` that is allowed in every lane.
pub fn transfer(destination: StdAddr, value: u128) -> OutAction {
  OutAction::SendMsg {
    mode: SendMsgFlags::PAY_FEE_SEPARATELY | SendMsgFlags::IGNORE_ERROR,
    out_msg: Lazy::new(&message(destination, value)).unwrap(),
  }
}

/// What the engine hands to the ledger for a requested transfer.
pub fn outbound(action: &OutAction) -> OutboundMessage {
  match action {
    OutAction::SendMsg { mode, out_msg } => OutboundMessage {
      mode: *mode,
      message: out_msg.inner().clone(),
    },
    other => panic!("not a transfer: {other:?}"),
  }
}

pub fn management(actions: Vec<ManagementAction>) -> ActionList {
  ActionList {
    transfers: vec![],
    management: actions,
  }
}

pub fn transfers(actions: Vec<OutAction>) -> ActionList {
  ActionList {
    transfers: actions,
    management: vec![],
  }
}

/// A single-owner account together with the owner key and a clock.
pub struct Wallet {
  pub keypair: Keypair,
  pub address: StdAddr,
  pub store: InMemoryStore,
  pub now: u32,
}

impl Wallet {
  pub fn new() -> Self {
    let keypair = Keypair::generate(&mut rand::thread_rng());
    let state = AccountState::new(keypair.public.to_bytes(), IDENTIFIER);
    Self {
      keypair,
      address: address(0xaa),
      store: InMemoryStore::new(state),
      now: NOW,
    }
  }

  /// A wallet that already has the given delegates installed.
  pub fn with_delegates(delegates: &[StdAddr]) -> Self {
    let mut wallet = Self::new();
    let mut state = wallet.state();
    for delegate in delegates {
      state.delegates.insert(delegate.address);
    }
    wallet.store = InMemoryStore::new(state);
    wallet
  }

  pub fn state(&self) -> AccountState {
    self.store.state().clone()
  }

  pub fn env(&self) -> Environment {
    Environment {
      address: self.address.clone(),
      now: self.now,
    }
  }

  /// An owner request with the current sequence that stays valid for a
  /// minute.
  pub fn request(&self, tag: Tag, actions: ActionList) -> UnsignedRequest {
    UnsignedRequest {
      tag,
      identifier: IDENTIFIER,
      valid_until: self.now + 60,
      sequence: self.state().sequence,
      actions,
    }
  }

  pub fn sign(&self, request: &UnsignedRequest) -> Cell {
    request
      .sign(|hash| self.keypair.sign(hash).to_bytes())
      .unwrap()
  }

  /// Signs a request whose action list is given in its encoded form.
  pub fn sign_raw(
    &self,
    tag: Tag,
    sequence: u32,
    actions: &Cell,
  ) -> Result<Cell, CellError> {
    let mut payload = CellBuilder::new();
    payload.store_u32(tag.code())?;
    payload.store_u32(IDENTIFIER)?;
    payload.store_u32(self.now + 60)?;
    payload.store_u32(sequence)?;
    payload.store_slice(actions.as_slice()?)?;
    let payload = payload.build()?;

    let hash = payload.repr_hash().as_array();
    let signature = self.keypair.sign(hash).to_bytes();
    let mut body = CellBuilder::new();
    body.store_slice(payload.as_slice()?)?;
    body.store_raw(&signature, 512)?;
    body.build()
  }

  pub fn external(&mut self, body: Cell) -> Outcome {
    let message = InboundMessage {
      origin: Origin::External,
      body,
    };
    process(&message, &self.env(), &mut self.store, &Ed25519)
  }

  pub fn internal(&mut self, sender: StdAddr, body: Cell) -> Outcome {
    let message = InboundMessage {
      origin: Origin::Internal {
        sender,
        bounced: false,
      },
      body,
    };
    process(&message, &self.env(), &mut self.store, &Ed25519)
  }

  /// Signs and submits an owner request as an external message.
  pub fn send_external(&mut self, actions: ActionList) -> Outcome {
    let body = self.sign(&self.request(Tag::SignedExternal, actions));
    self.external(body)
  }

  /// Signs and submits an owner request relayed by `relay`.
  pub fn send_internal(
    &mut self,
    relay: StdAddr,
    actions: ActionList,
  ) -> Outcome {
    let body = self.sign(&self.request(Tag::SignedInternal, actions));
    self.internal(relay, body)
  }

  pub fn send_delegate(
    &mut self,
    sender: StdAddr,
    actions: ActionList,
  ) -> Outcome {
    let body = DelegateRequest::build(7, &actions).unwrap();
    self.internal(sender, body)
  }
}

/// A transfer chain with `count` links, built without any length checks.
pub fn raw_transfer_chain(count: usize) -> anyhow::Result<Cell> {
  let out_msg = CellBuilder::build_from(message(address(0x01), 1))?;
  let mode = SendMsgFlags::IGNORE_ERROR.bits();

  let mut link = Cell::empty_cell();
  for _ in 0..count {
    link = CellBuilder::build_from((
      link,
      OutAction::TAG_SEND_MSG,
      mode,
      out_msg.clone(),
    ))?;
  }
  Ok(CellBuilder::build_from((Some(link), false))?)
}
