//! Iteration cursor — a mutation-tolerant walk over a [`CallbackRegistry`].
//!
//! The cursor holds no borrow of the registry between steps, so the callback
//! it just yielded is free to add, remove, or fire the same hook again. Each
//! step re-reads the registry:
//!
//! - buckets are visited in ascending priority; the next bucket is looked up
//!   after the current one is finished, so priorities added above the
//!   current one during the walk are visited and lower ones are not;
//! - on entering a bucket the cursor pins it and records its length, so
//!   entries appended to the bucket being walked wait for the next fire;
//! - tombstoned entries are skipped.

use hookhub_core::types::Priority;

use super::definitions::CallbackEntry;
use super::registry::CallbackRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// No bucket entered yet.
    Start,
    /// Walking the bucket at `priority`; `end` is its length on entry.
    Within {
        priority: Priority,
        index: usize,
        end: usize,
    },
    /// Finished the bucket at this priority.
    After(Priority),
    /// Exhausted or closed.
    Done,
}

/// A single in-progress walk over one registry.
#[derive(Debug)]
pub struct IterationCursor {
    generation: u64,
    position: Position,
    closed: bool,
}

impl IterationCursor {
    pub(super) fn new(generation: u64) -> Self {
        Self {
            generation,
            position: Position::Start,
            closed: false,
        }
    }

    /// Registry generation this cursor was opened at.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Priority of the bucket currently being walked.
    pub fn current_priority(&self) -> Option<Priority> {
        match self.position {
            Position::Within { priority, .. } => Some(priority),
            _ => None,
        }
    }

    /// Returns whether the cursor has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Advances to the next live entry.
    ///
    /// `registry` must be the registry that produced this cursor. Returns
    /// `None` once every bucket has been walked; the cursor closes itself at
    /// that point.
    pub fn next(&mut self, registry: &mut CallbackRegistry) -> Option<CallbackEntry> {
        loop {
            match self.position {
                Position::Done => return None,
                Position::Within {
                    priority,
                    index,
                    end,
                } => {
                    if index < end {
                        self.position = Position::Within {
                            priority,
                            index: index + 1,
                            end,
                        };
                        if let Some(entry) = registry.live_entry(priority, index) {
                            return Some(entry.clone());
                        }
                        continue;
                    }
                    registry.unpin(priority);
                    self.position = Position::After(priority);
                }
                Position::Start | Position::After(_) => {
                    let after = match self.position {
                        Position::After(priority) => Some(priority),
                        _ => None,
                    };
                    let Some(priority) = registry.next_priority(after) else {
                        self.close(registry);
                        return None;
                    };
                    self.position = match registry.pin(priority) {
                        Some(end) => Position::Within {
                            priority,
                            index: 0,
                            end,
                        },
                        None => Position::After(priority),
                    };
                }
            }
        }
    }

    /// Releases the cursor's pin and its slot in the registry.
    ///
    /// Idempotent; deferred removals in the bucket being walked happen here
    /// if no other cursor still holds it.
    pub fn close(&mut self, registry: &mut CallbackRegistry) {
        if self.closed {
            return;
        }
        if let Position::Within { priority, .. } = self.position {
            registry.unpin(priority);
        }
        registry.release_cursor();
        self.position = Position::Done;
        self.closed = true;
    }
}
