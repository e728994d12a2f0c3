//! Set-once decision flags.
//!
//! Every cacheability decision starts out undecided and may be flagged
//! exactly once; later attempts are ignored, so the first validator to
//! decide wins.

/// Tri-state flag: undecided, `true` or `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decision(Option<bool>);

impl Decision {
    /// An undecided flag.
    pub const fn unset() -> Self {
        Self(None)
    }

    /// Records `value` if nothing was recorded yet.
    ///
    /// Returns `true` if this call made the decision.
    pub fn flag(&mut self, value: bool) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(value);
        true
    }

    pub fn get(self) -> Option<bool> {
        self.0
    }

    pub fn is_set(self) -> bool {
        self.0.is_some()
    }

    /// Undecided counts as `false`.
    pub fn is_true(self) -> bool {
        self.0 == Some(true)
    }
}

/// Mutable decision state handed to validators.
///
/// Holds the resolved policy switches (read-only for validators) and the
/// three decision flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    store_private: bool,
    store_no_store: bool,
    ignore_no_last_mod: bool,
    retrievable: Decision,
    storable: Decision,
    private: Decision,
}

impl Verdict {
    pub fn new(store_private: bool, store_no_store: bool, ignore_no_last_mod: bool) -> Self {
        Self {
            store_private,
            store_no_store,
            ignore_no_last_mod,
            ..Self::default()
        }
    }

    pub fn store_private(&self) -> bool {
        self.store_private
    }

    pub fn store_no_store(&self) -> bool {
        self.store_no_store
    }

    pub fn ignore_no_last_mod(&self) -> bool {
        self.ignore_no_last_mod
    }

    pub fn flag_retrievable(&mut self, value: bool) {
        self.retrievable.flag(value);
    }

    pub fn flag_storable(&mut self, value: bool) {
        self.storable.flag(value);
    }

    pub fn flag_private(&mut self, value: bool) {
        self.private.flag(value);
    }

    pub fn retrievable(&self) -> Decision {
        self.retrievable
    }

    pub fn storable(&self) -> Decision {
        self.storable
    }

    pub fn private(&self) -> Decision {
        self.private
    }
}
