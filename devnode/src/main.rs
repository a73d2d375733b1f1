use {
  crate::{
    settings::{Command, SystemSettings},
    storage::OnDiskStore,
  },
  clap::Parser,
  std::path::Path,
  time::OffsetDateTime,
  tracing::{debug, info, subscriber::set_global_default},
  tracing_subscriber::{EnvFilter, FmtSubscriber},
  tycho_types::{
    boc::Boc,
    cell::Cell,
    models::{OwnedRelaxedMessage, RelaxedMsgInfo, StdAddr},
  },
  warden_primitives::ToBase58String,
  warden_vm::{
    process,
    AccountState,
    Ed25519,
    Environment,
    InboundMessage,
    Origin,
    Outcome,
    Store,
  },
};

mod settings;
mod storage;

fn init(
  db: &sled::Db,
  address: &StdAddr,
  public_key: &str,
  identifier: u32,
  seqno: u32,
) -> anyhow::Result<()> {
  let mut key = [0u8; 32];
  hex::decode_to_slice(public_key, &mut key)?;

  let mut state = AccountState::new(key, identifier);
  state.sequence = seqno;
  OnDiskStore::create(db, address, state)?;
  info!("created account {address}");
  show(db, address)
}

fn show(db: &sled::Db, address: &StdAddr) -> anyhow::Result<()> {
  let state = OnDiskStore::open(db, address)?.get();
  println!("address:           {address}");
  println!("seqno:             {}", state.seqno());
  println!("subwallet id:      {}", state.subwallet_id());
  println!("public key:        {}", hex::encode(state.public_key()));
  println!("signature allowed: {}", state.is_signature_allowed());
  for delegate in state.delegates(address.workchain) {
    println!("delegate:          {delegate}");
  }
  if let Some(dict) = state.delegates_dict()? {
    println!("delegates dict:    {}", dict.to_b58());
  }
  Ok(())
}

/// Reads a message body stored as a bag of cells, either raw or base64.
fn read_body(path: &Path) -> anyhow::Result<Cell> {
  let bytes = std::fs::read(path)?;
  match Boc::decode(&bytes) {
    Ok(cell) => Ok(cell),
    Err(e) => {
      debug!("body is not a binary bag of cells ({e}), trying base64");
      Ok(Boc::decode_base64(std::str::from_utf8(&bytes)?.trim())?)
    }
  }
}

fn submit(
  db: &sled::Db,
  address: &StdAddr,
  body: &Path,
  origin: Origin,
  now: Option<u32>,
) -> anyhow::Result<()> {
  let body = read_body(body)?;
  let now = match now {
    Some(now) => now,
    None => OffsetDateTime::now_utc().unix_timestamp().try_into()?,
  };

  let mut store = OnDiskStore::open(db, address)?;
  let env = Environment {
    address: address.clone(),
    now,
  };
  let message = InboundMessage { origin, body };
  let outcome = process(&message, &env, &mut store, &Ed25519);

  let status = match &outcome {
    Outcome::Executed(_) => "executed",
    Outcome::Ignored => "ignored",
    Outcome::Rejected(_) => "rejected",
    Outcome::Committed(_) => "committed with error",
    Outcome::Refused(_) => "refused",
  };
  println!("outcome:   {status}");
  println!("exit code: {}", outcome.exit_code());
  if let Some(error) = outcome.error() {
    println!("error:     {error}");
  }

  for transfer in outcome.transfers() {
    let mode = transfer.mode.bits();
    match transfer.message.parse::<OwnedRelaxedMessage>() {
      Ok(OwnedRelaxedMessage {
        info: RelaxedMsgInfo::Int(info),
        ..
      }) => println!(
        "transfer:  {} to {} (mode {mode})",
        info.value.tokens, info.dst
      ),
      _ => println!(
        "transfer:  message {} (mode {mode})",
        transfer.message.to_b58()
      ),
    }
  }
  println!("seqno:     {}", store.get().seqno());
  Ok(())
}

fn main() -> anyhow::Result<()> {
  // configure logging
  set_global_default(
    FmtSubscriber::builder()
      .with_env_filter(EnvFilter::from_default_env())
      .finish(),
  )?;

  // gather CLI parameters
  let settings = SystemSettings::parse();
  info!("startup settings: {settings:#?}");

  let db = sled::open(settings.data_dir())?;
  match settings.command() {
    Command::Init {
      address,
      public_key,
      identifier,
      seqno,
    } => init(&db, address, public_key, *identifier, *seqno),
    Command::Show { address } => show(&db, address),
    Command::Submit {
      address,
      body,
      external,
      sender,
      bounced,
      now,
    } => {
      let origin = match (external, sender) {
        (true, _) => Origin::External,
        (false, Some(sender)) => Origin::Internal {
          sender: sender.clone(),
          bounced: *bounced,
        },
        (false, None) => {
          anyhow::bail!("either --external or --sender is required")
        }
      };
      submit(&db, address, body, origin, *now)
    }
  }
}
