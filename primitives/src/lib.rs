mod actions;
mod b58;
mod request;

pub use {
  actions::{ActionList, ManagementAction, MAX_TRANSFERS},
  b58::ToBase58String,
  request::{DelegateRequest, SignedRequest, Tag, UnsignedRequest},
};
