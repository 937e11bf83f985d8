//! Circular core memory with an optional write-observer hook.
//!
//! [`Memory`] owns the fixed-size array of [`CompleteInstruction`]s that make
//! up the simulated core. All mutation goes through a small set of methods
//! (rather than direct indexing) so that every write -- whole-cell or
//! single-field -- can be reported to a single subscribed observer, as used
//! by external tools such as a core visualizer.

use std::sync::Mutex;

use redcode::CompleteInstruction;

use crate::CoreAddr;

/// Callback invoked after a write to a core cell.
///
/// Receives the index written, the prior cell contents, and the new cell
/// contents.
pub type WriteObserver =
    dyn FnMut(usize, CompleteInstruction, CompleteInstruction) + Send;

/// Fixed-size circular array of [`CompleteInstruction`]s.
///
/// Reads are plain array indexing (via [`core::ops::Index`]). Writes go
/// through [`Memory::write`] or one of the partial-field helpers so that an
/// attached observer is always notified, holding a core-wide lock for the
/// duration of the notification so it observes a consistent cell.
pub struct Memory {
    /// The cells that make up the core.
    cells: Vec<CompleteInstruction>,
    /// Single-slot write observer, locked across the notification call.
    observer: Mutex<Option<Box<WriteObserver>>>,
}

impl Memory {
    /// Creates a core of `size` cells, each initialized to
    /// `CompleteInstruction::default()` (`DAT.F #0, #0`).
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![CompleteInstruction::default(); size],
            observer: Mutex::new(None),
        }
    }

    /// Creates a core of `size` cells, each initialized to `fill`.
    #[must_use]
    pub fn filled(size: usize, fill: CompleteInstruction) -> Self {
        Self {
            cells: vec![fill; size],
            observer: Mutex::new(None),
        }
    }

    /// Number of cells in this core.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if this core has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reads the cell at `idx`.
    #[must_use]
    pub fn read(&self, idx: usize) -> CompleteInstruction {
        self.cells[idx]
    }

    /// Replaces the cell at `idx`, and notifies any observer.
    pub fn write(&mut self, idx: usize, new: CompleteInstruction) {
        let old = self.cells[idx];
        self.cells[idx] = new;
        self.notify(idx, old, new);
    }

    /// Replaces only the A-field of the cell at `idx`, and notifies any
    /// observer with the whole before/after cells.
    pub fn write_a_field(&mut self, idx: usize, value: CoreAddr) {
        let old = self.cells[idx];
        let mut new = old;
        new.a_field = value;
        self.cells[idx] = new;
        self.notify(idx, old, new);
    }

    /// Replaces only the B-field of the cell at `idx`, and notifies any
    /// observer with the whole before/after cells.
    pub fn write_b_field(&mut self, idx: usize, value: CoreAddr) {
        let old = self.cells[idx];
        let mut new = old;
        new.b_field = value;
        self.cells[idx] = new;
        self.notify(idx, old, new);
    }

    /// Replaces both the A-field and B-field of the cell at `idx` in one
    /// notified write.
    pub fn write_fields(&mut self, idx: usize, a: CoreAddr, b: CoreAddr) {
        let old = self.cells[idx];
        let mut new = old;
        new.a_field = a;
        new.b_field = b;
        self.cells[idx] = new;
        self.notify(idx, old, new);
    }

    /// Subscribes `callback` as the core's write observer, replacing any
    /// previous subscription.
    ///
    /// # Panics
    ///
    /// Panics if the observer lock is poisoned (a previous notification
    /// callback panicked while holding it).
    pub fn on_write(
        &self,
        callback: impl FnMut(usize, CompleteInstruction, CompleteInstruction)
            + Send
            + 'static,
    ) {
        let mut slot = self.observer.lock().expect("observer lock poisoned");
        *slot = Some(Box::new(callback));
    }

    /// Removes any subscribed write observer.
    ///
    /// # Panics
    ///
    /// Panics if the observer lock is poisoned.
    pub fn clear_observer(&self) {
        let mut slot = self.observer.lock().expect("observer lock poisoned");
        *slot = None;
    }

    /// Notifies the observer, if any, holding the lock for the duration of
    /// the callback so the observer always sees a consistent cell.
    ///
    /// # Panics
    ///
    /// Panics if the observer lock is poisoned.
    fn notify(
        &self,
        idx: usize,
        old: CompleteInstruction,
        new: CompleteInstruction,
    ) {
        let mut slot = self.observer.lock().expect("observer lock poisoned");
        if let Some(callback) = slot.as_mut() {
            callback(idx, old, new);
        }
    }
}

impl core::ops::Index<usize> for Memory {
    type Output = CompleteInstruction;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.cells[idx]
    }
}

impl Clone for Memory {
    /// Clones the cell contents. The clone starts with no subscribed
    /// observer, since observers are not meaningfully shareable.
    fn clone(&self) -> Self {
        Self {
            cells: self.cells.clone(),
            observer: Mutex::new(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use coverage_helper::test;
    use redcode::{AddrMode, Instruction, Modifier, Opcode};

    use super::*;

    #[test]
    fn circular_addressing_invariant() {
        let mem = Memory::new(10);
        assert_eq!(mem.read(0), mem.read(0));
        assert_eq!(mem.len(), 10);
    }

    #[test]
    fn write_replaces_whole_cell() {
        let mut mem = Memory::new(4);
        let instr = CompleteInstruction {
            instr: Instruction {
                opcode: Opcode::Mov,
                modifier: Modifier::I,
                a_addr_mode: AddrMode::Direct,
                b_addr_mode: AddrMode::Direct,
            },
            a_field: 1,
            b_field: 2,
        };
        mem.write(1, instr);
        assert_eq!(mem.read(1), instr);
        assert_eq!(mem.read(0), CompleteInstruction::default());
    }

    #[test]
    fn partial_writes_leave_other_field_untouched() {
        let mut mem = Memory::new(2);
        mem.write_fields(0, 5, 9);
        mem.write_a_field(0, 42);
        let cell = mem.read(0);
        assert_eq!(cell.a_field, 42);
        assert_eq!(cell.b_field, 9);
    }

    #[test]
    fn observer_receives_old_and_new_values() {
        let mut mem = Memory::new(2);
        let seen: Arc<StdMutex<Vec<(usize, CoreAddr, CoreAddr)>>> =
            Arc::new(StdMutex::new(vec![]));
        let seen_clone = Arc::clone(&seen);
        mem.on_write(move |idx, old, new| {
            seen_clone
                .lock()
                .expect("test lock poisoned")
                .push((idx, old.a_field, new.a_field));
        });
        mem.write_a_field(1, 7);
        let recorded = seen.lock().expect("test lock poisoned");
        assert_eq!(recorded.as_slice(), &[(1, 0, 7)]);
    }

    #[test]
    fn clearing_observer_stops_notifications() {
        let mut mem = Memory::new(2);
        let calls = Arc::new(StdMutex::new(0_u32));
        let calls_clone = Arc::clone(&calls);
        mem.on_write(move |_, _, _| {
            *calls_clone.lock().expect("test lock poisoned") += 1;
        });
        mem.clear_observer();
        mem.write_a_field(0, 3);
        assert_eq!(*calls.lock().expect("test lock poisoned"), 0);
    }
}
