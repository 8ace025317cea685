//! Per-owner audio emission proxies.
//!
//! Every owner keeps a [`ProxyTable`] of lightweight emission points, each
//! bound 1:1 to a backend object and placed at an offset from the owner.
//! Control operations are routed either to one proxy or, with
//! [`ProxyId::ALL`], to every proxy of the owner.

mod operation;
mod table;

pub use operation::ControlOperation;
pub use table::{OwnerView, ProxyEntry, ProxyTable};

/// Longest backend object name, in bytes.
pub const MAX_OBJECT_NAME_LENGTH: usize = 256;

/// Identifier of a proxy, unique within its owner.
///
/// Ids are issued in increasing order starting at [`ProxyId::DEFAULT`] and
/// are never reused by the same owner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(pub u32);

impl ProxyId {
    /// No proxy. Returned when a proxy could not be created.
    pub const INVALID: ProxyId = ProxyId(0);
    /// Dispatch target meaning every proxy of the owner. Same value as [`ProxyId::INVALID`].
    pub const ALL: ProxyId = ProxyId::INVALID;
    /// Id of the implicit proxy created when an owner registers.
    ///
    /// An owner that leaves the listener role gets a new implicit proxy with a
    /// fresh id; [`ProxyTable::default_proxy_id`] always names the current one.
    pub const DEFAULT: ProxyId = ProxyId(1);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl std::fmt::Display for ProxyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProxyId({})", self.0)
    }
}
