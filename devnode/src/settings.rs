use {
  clap::{Parser, Subcommand},
  std::path::PathBuf,
  tycho_types::models::StdAddr,
};

/// Warden Local Devnode
///
/// Hosts single-owner accounts in a local database and runs inbound
/// messages through the authorization engine, for dev, CI and test
/// scenarios.
#[derive(Debug, Parser)]
pub struct SystemSettings {
  /// Directory of the account database
  #[clap(long, short,
    default_value = ".warden",
    value_name = "PATH")]
  data_dir: PathBuf,

  #[clap(subcommand)]
  command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Create a new account record
  Init {
    /// Address of the account
    #[clap(long, short, value_name = "WC:HASH")]
    address: StdAddr,

    /// Hex encoded ed25519 public key of the owner
    #[clap(long, short, value_name = "HEX")]
    public_key: String,

    /// Account identifier the owner signs requests for
    #[clap(long, short, default_value = "698983191")]
    identifier: u32,

    /// Initial sequence number
    #[clap(long, default_value = "0")]
    seqno: u32,
  },

  /// Print the current state of an account
  Show {
    #[clap(long, short, value_name = "WC:HASH")]
    address: StdAddr,
  },

  /// Process one inbound message
  Submit {
    #[clap(long, short, value_name = "WC:HASH")]
    address: StdAddr,

    /// File with the message body as a bag of cells, binary or base64
    #[clap(long, short, value_name = "FILE")]
    body: PathBuf,

    /// Deliver the body as an external message
    #[clap(long, conflicts_with = "sender", required_unless_present = "sender")]
    external: bool,

    /// Deliver the body as an internal message from this account
    #[clap(long, short, value_name = "WC:HASH")]
    sender: Option<StdAddr>,

    /// Mark the internal message as bounced
    #[clap(long, requires = "sender")]
    bounced: bool,

    /// Unix time to process the message at, defaults to the wall clock
    #[clap(long, value_name = "SECONDS")]
    now: Option<u32>,
  },
}

impl SystemSettings {
  pub fn data_dir(&self) -> &PathBuf {
    &self.data_dir
  }

  pub fn command(&self) -> &Command {
    &self.command
  }
}
