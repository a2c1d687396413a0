//! Strongly-typed identifiers for the topic/partition model.
//!
//! Broker node ids are signed 32-bit values as on the Kafka wire, with a
//! reserved `-1` meaning "no broker". Partition selection is a tagged
//! value so the unassigned sentinel cannot be mixed up with a real
//! partition index anywhere above the wire layer.

use std::fmt;

/// Wire sentinel for "no partition" / "no leader" (`-1`).
///
/// Kept only at the wire boundary; in-memory code uses [`PartitionSel`]
/// and [`BrokerId::NONE`].
pub const PARTITION_UA: i32 = -1;

/// Unique identifier for a broker node, as reported by cluster metadata.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct BrokerId(i32);

impl BrokerId {
    /// The "no broker" sentinel (`-1`), used when a partition has no
    /// leader.
    pub const NONE: Self = Self(-1);

    /// Creates a broker id from a raw node id.
    #[inline]
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw node id.
    #[inline]
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Returns true if this is the "no broker" sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Debug for BrokerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "broker({})", self.0)
    }
}

impl fmt::Display for BrokerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for BrokerId {
    fn from(value: i32) -> Self {
        Self::new(value)
    }
}

impl From<BrokerId> for i32 {
    fn from(id: BrokerId) -> Self {
        id.get()
    }
}

/// Selects a partition within a topic: either a concrete partition index
/// or the distinguished unassigned slot.
///
/// The unassigned slot holds messages whose target partition is not yet
/// resolvable (no metadata yet, or the requested partition is not
/// currently known). On the wire it is encoded as [`PARTITION_UA`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionSel {
    /// A concrete partition index (non-negative).
    Real(i32),
    /// The unassigned holding slot.
    Unassigned,
}

impl PartitionSel {
    /// Decodes a wire partition id; any negative value means unassigned.
    #[inline]
    #[must_use]
    pub const fn from_wire(raw: i32) -> Self {
        if raw < 0 {
            Self::Unassigned
        } else {
            Self::Real(raw)
        }
    }

    /// Encodes this selector as a wire partition id.
    #[inline]
    #[must_use]
    pub const fn to_wire(self) -> i32 {
        match self {
            Self::Real(partition) => partition,
            Self::Unassigned => PARTITION_UA,
        }
    }

    /// Returns the concrete partition index, if any.
    #[inline]
    #[must_use]
    pub const fn index(self) -> Option<i32> {
        match self {
            Self::Real(partition) => Some(partition),
            Self::Unassigned => None,
        }
    }

    /// Returns true for the unassigned slot.
    #[inline]
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        matches!(self, Self::Unassigned)
    }
}

impl fmt::Debug for PartitionSel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(partition) => write!(f, "partition({partition})"),
            Self::Unassigned => write!(f, "partition(UA)"),
        }
    }
}

impl fmt::Display for PartitionSel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(partition) => write!(f, "{partition}"),
            Self::Unassigned => write!(f, "UA"),
        }
    }
}
