//! Identifier newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a persisted message row.
///
/// Assigned by the store in strictly increasing order, so `id` comparisons
/// define insertion order. Also doubles as a window-start pointer, where
/// [`MessageId::ORIGIN`] means "from the beginning of history".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(i64);

impl MessageId {
    /// Pointer value before any message exists: the window covers everything.
    pub const ORIGIN: MessageId = MessageId(0);

    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::MessageId;

    #[test]
    fn ordering_matches_raw_ids() {
        assert!(MessageId::new(1) < MessageId::new(2));
        assert!(MessageId::ORIGIN < MessageId::new(1));
    }

    #[test]
    fn origin_is_zero() {
        assert_eq!(MessageId::ORIGIN.as_i64(), 0);
    }
}
