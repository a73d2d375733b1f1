//! Decoding and encoding of the action list carried by every request.
//!
//! The list is split in two independent chains:
//!
//!   - transfers, stored as a linked list where every link references the
//!     link before it. The outermost link holds the last transfer, so the
//!     chain is walked tail-first and reversed at the end.
//!   - management actions, stored head-first with one action per cell. The
//!     first one is inlined into the list's own cell and every cell points
//!     to the next with an optional reference.
//!
//! ```text
//! transfers:(Maybe ^OutList) has_management:Bool
//!   [first:ManagementAction rest:(Maybe-by-refs ^ManagementChain)]
//! ```

use tycho_types::{
  cell::{
    Cell,
    CellBuilder,
    CellContext,
    CellFamily,
    CellSlice,
    DynCell,
    Load,
    Store,
  },
  error::Error,
  models::{OutAction, StdAddr},
};

/// Ledger limit on the number of outbound messages per transaction.
pub const MAX_TRANSFERS: usize = 255;

const ADD_DELEGATE_TAG: u8 = 0x02;
const REMOVE_DELEGATE_TAG: u8 = 0x03;
const SET_SIGNATURE_AUTH_TAG: u8 = 0x04;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagementAction {
  AddDelegate(StdAddr),
  RemoveDelegate(StdAddr),
  SetSignatureAuth(bool),

  /// A management action with a tag this engine does not implement. Its
  /// layout is unknown, so nothing after it can be decoded.
  Unsupported(u8),
}

#[derive(Debug, Clone, Default)]
pub struct ActionList {
  /// Transfers in the order the owner wants them emitted. Only
  /// [`OutAction::SendMsg`] and [`OutAction::SetCode`] may appear in a
  /// request, and the latter is recognized only to be refused.
  pub transfers: Vec<OutAction>,
  pub management: Vec<ManagementAction>,
}

impl PartialEq for ActionList {
  fn eq(&self, other: &Self) -> bool {
    self.management == other.management
      && self.transfers.len() == other.transfers.len()
      && self
        .transfers
        .iter()
        .zip(&other.transfers)
        .all(|(a, b)| same_action(a, b))
  }
}

fn same_action(a: &OutAction, b: &OutAction) -> bool {
  match (a, b) {
    (
      OutAction::SendMsg { mode, out_msg },
      OutAction::SendMsg {
        mode: other_mode,
        out_msg: other_msg,
      },
    ) => mode == other_mode && out_msg == other_msg,
    (
      OutAction::SetCode { new_code },
      OutAction::SetCode { new_code: other },
    ) => new_code == other,
    _ => false,
  }
}

impl ActionList {
  /// Decodes an action list occupying the whole slice.
  ///
  /// Decoding is strict: missing data, trailing bits or references and an
  /// oversized transfer chain are all errors.
  pub fn from_slice(mut slice: CellSlice<'_>) -> Result<Self, Error> {
    let transfers = match Option::<Cell>::load_from(&mut slice)? {
      Some(chain) => load_transfers(chain.as_ref())?,
      None => vec![],
    };

    let mut management = vec![];
    if slice.load_bit()? {
      load_management(slice, &mut management)?;
    } else {
      ensure_empty(&slice)?;
    }

    Ok(Self {
      transfers,
      management,
    })
  }

  pub fn from_cell(cell: &DynCell) -> Result<Self, Error> {
    Self::from_slice(cell.as_slice()?)
  }

  pub fn to_cell(&self) -> Result<Cell, Error> {
    CellBuilder::build_from(self)
  }
}

impl Store for ActionList {
  fn store_into(
    &self,
    builder: &mut CellBuilder,
    context: &dyn CellContext,
  ) -> Result<(), Error> {
    if self.transfers.len() > MAX_TRANSFERS {
      return Err(Error::InvalidData);
    }

    let chain = match self.transfers.is_empty() {
      true => None,
      false => Some(store_transfers(&self.transfers, context)?),
    };
    chain.store_into(builder, context)?;

    match self.management.split_first() {
      None => builder.store_bit_zero(),
      Some((first, rest)) => {
        builder.store_bit_one()?;
        store_management(first, builder, context)?;
        match rest.is_empty() {
          true => Ok(()),
          false => {
            builder.store_reference(store_management_chain(rest, context)?)
          }
        }
      }
    }
  }
}

fn ensure_empty(slice: &CellSlice<'_>) -> Result<(), Error> {
  match slice.is_empty() {
    true => Ok(()),
    false => Err(Error::InvalidData),
  }
}

fn load_transfers(head: &DynCell) -> Result<Vec<OutAction>, Error> {
  let mut transfers = vec![];
  let mut link = head;

  while !link.is_empty() {
    if transfers.len() == MAX_TRANSFERS {
      return Err(Error::InvalidData);
    }

    let mut slice = link.as_slice()?;
    let prev = slice.load_reference()?;
    let action = match OutAction::load_from(&mut slice)? {
      action @ (OutAction::SendMsg { .. } | OutAction::SetCode { .. }) => {
        action
      }
      _ => return Err(Error::InvalidTag),
    };
    ensure_empty(&slice)?;

    transfers.push(action);
    link = prev;
  }

  transfers.reverse();
  Ok(transfers)
}

fn store_transfers(
  transfers: &[OutAction],
  context: &dyn CellContext,
) -> Result<Cell, Error> {
  let mut link = Cell::empty_cell();
  for action in transfers {
    if !matches!(
      action,
      OutAction::SendMsg { .. } | OutAction::SetCode { .. }
    ) {
      return Err(Error::InvalidTag);
    }
    link = CellBuilder::build_from_ext((link, action), context)?;
  }
  Ok(link)
}

fn load_address(slice: &mut CellSlice<'_>) -> Result<StdAddr, Error> {
  let address = StdAddr::load_from(slice)?;
  match address.anycast {
    None => Ok(address),
    Some(_) => Err(Error::InvalidData),
  }
}

fn load_management(
  mut slice: CellSlice<'_>,
  actions: &mut Vec<ManagementAction>,
) -> Result<(), Error> {
  loop {
    let action = match slice.load_u8()? {
      ADD_DELEGATE_TAG => {
        ManagementAction::AddDelegate(load_address(&mut slice)?)
      }
      REMOVE_DELEGATE_TAG => {
        ManagementAction::RemoveDelegate(load_address(&mut slice)?)
      }
      SET_SIGNATURE_AUTH_TAG => {
        ManagementAction::SetSignatureAuth(slice.load_bit()?)
      }
      tag => {
        actions.push(ManagementAction::Unsupported(tag));
        return Ok(());
      }
    };
    actions.push(action);

    if !slice.is_data_empty() || slice.size_refs() > 1 {
      return Err(Error::InvalidData);
    }

    match slice.size_refs() {
      0 => return Ok(()),
      _ => slice = slice.load_reference_as_slice()?,
    }
  }
}

fn store_management(
  action: &ManagementAction,
  builder: &mut CellBuilder,
  context: &dyn CellContext,
) -> Result<(), Error> {
  match action {
    ManagementAction::AddDelegate(address) => {
      builder.store_u8(ADD_DELEGATE_TAG)?;
      address.store_into(builder, context)
    }
    ManagementAction::RemoveDelegate(address) => {
      builder.store_u8(REMOVE_DELEGATE_TAG)?;
      address.store_into(builder, context)
    }
    ManagementAction::SetSignatureAuth(enabled) => {
      builder.store_u8(SET_SIGNATURE_AUTH_TAG)?;
      builder.store_bit(*enabled)
    }
    ManagementAction::Unsupported(tag) => builder.store_u8(*tag),
  }
}

fn store_management_chain(
  actions: &[ManagementAction],
  context: &dyn CellContext,
) -> Result<Cell, Error> {
  let mut next: Option<Cell> = None;
  for action in actions.iter().rev() {
    let mut builder = CellBuilder::new();
    store_management(action, &mut builder, context)?;
    if let Some(cell) = next {
      builder.store_reference(cell)?;
    }
    next = Some(builder.build_ext(context)?);
  }
  next.ok_or(Error::InvalidData)
}
