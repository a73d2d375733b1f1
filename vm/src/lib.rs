mod dispatch;
mod execution;
mod outcome;
mod staged;
mod state;
mod verifier;

pub use {
  dispatch::{process, Environment, InboundMessage, Lane, Origin},
  execution::{execute, Execution},
  outcome::{Error, Lockout, Outcome, OutboundMessage},
  state::{AccountState, InMemoryStore, StateDiff, Store},
  verifier::{Ed25519, SignatureVerifier},
};
