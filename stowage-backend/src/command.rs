//! Commands a [`Backend`](crate::Backend) executes against a single key.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// One store command.
///
/// Hash fields and string values are opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sets the given fields of a hash, creating it if needed.
    HashSet(Vec<(String, Bytes)>),
    /// Replaces the key with a string value and clears its expiry.
    Set(Bytes),
    /// Appends to a string value, creating it if needed.
    Append(Bytes),
    /// Adds to the integer stored in a string value, starting from zero.
    IncrBy(i64),
    /// Expires the key at an absolute time.
    ExpireAt(DateTime<Utc>),
    /// Expires the key after a relative duration.
    Expire(Duration),
    /// Removes the key.
    Delete,
}

/// Ordered list of commands applied atomically to one key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    commands: Vec<Command>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn hash_set(self, fields: Vec<(String, Bytes)>) -> Self {
        self.push(Command::HashSet(fields))
    }

    pub fn expire_at(self, at: DateTime<Utc>) -> Self {
        self.push(Command::ExpireAt(at))
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl From<Command> for Batch {
    fn from(command: Command) -> Self {
        Self {
            commands: vec![command],
        }
    }
}

impl IntoIterator for Batch {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}
