use std::collections::HashSet;

use corewar_engine::{
    emulators::generic_emulator, BytecodeInstructionIdentifier, CoreAddr,
    EmulatorCore,
};

use crate::{config::MarsProperties, error::MarsError};

/// Identifies one warrior loaded into a [`Mars`] instance.
///
/// Stable for the lifetime of the battle, including after the warrior dies;
/// [`Mars::warrior_info`] and [`Mars::pspace_read`]/[`Mars::pspace_write`]
/// continue to accept it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WarriorId(u64);

/// Metadata about a loaded warrior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WarriorInfo {
    /// This warrior's id.
    pub id: WarriorId,
    /// Address its program was loaded at.
    pub base: CoreAddr,
    /// Number of instructions in its program.
    pub length: u32,
    /// Parsed from a `;name` header comment, if present.
    pub name: Option<String>,
    /// Parsed from a `;author` header comment, if present.
    pub author: Option<String>,
}

/// Result of running a battle to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    /// Warriors still alive when `run` stopped. Exactly one means a clean
    /// win; more than one (with `cycles_run == max_cycles`) means a draw;
    /// zero means every remaining warrior died on the same final cycle.
    pub survivors: Vec<WarriorId>,
    /// Number of rounds actually executed.
    pub cycles_run: u64,
}

/// Default warrior capacity for [`Mars::new`].
///
/// [`corewar_engine::EmulatorCore`] fixes its warrior capacity at
/// construction time; this is a generous default for the common case of
/// small multi-warrior battles. Use [`Mars::with_capacity`] for larger ones.
const DEFAULT_MAX_WARRIORS: u64 = 64;

/// Ties [`redcode_parser`]'s assembler and [`corewar_engine`]'s emulator into
/// a full battle: warrior placement on load, and a round-robin scheduler
/// matching the ICWS'94 fairness rule (every live warrior advances exactly
/// one thread per cycle).
pub struct Mars {
    /// Low-level core, process queues, and P-space storage.
    emulator: generic_emulator::Emulator,
    /// Battle configuration this instance was built with.
    config: MarsProperties,
    /// Warriors still alive, in load order. Dead warriors are removed here
    /// by [`Mars::cycle`] but remain addressable for pspace access.
    warriors: Vec<WarriorInfo>,
    /// Next id to hand out; monotonically increasing even as warriors die.
    next_id: u64,
    /// Warrior capacity this instance was built with.
    max_warriors: u64,
    /// `(pin, warrior_id)` pairs registered so far, reapplied in full every
    /// time a new pinned warrior is loaded (see [`Mars::load`]).
    pspace_map: Vec<(u64, u64)>,
}

impl Mars {
    /// Builds a `Mars` with room for [`DEFAULT_MAX_WARRIORS`] warriors.
    ///
    /// # Errors
    ///
    /// Returns a [`MarsError`] if `config` describes a core too large for
    /// the underlying emulator to represent.
    pub fn new(config: MarsProperties) -> Result<Self, MarsError> {
        Self::with_capacity(config, DEFAULT_MAX_WARRIORS)
    }

    /// Builds a `Mars` with room for up to `max_warriors` simultaneously
    /// loaded warriors.
    ///
    /// # Errors
    ///
    /// Returns a [`MarsError`] if `config` describes a core too large for
    /// the underlying emulator to represent.
    pub fn with_capacity(
        config: MarsProperties,
        max_warriors: u64,
    ) -> Result<Self, MarsError> {
        let emulator = generic_emulator::Emulator::new(
            u64::from(config.core_size),
            u64::from(config.pspace_size()),
            max_warriors,
            config.max_processes,
        )?;
        Ok(Self {
            emulator,
            config,
            warriors: Vec::new(),
            next_id: 0,
            max_warriors,
            pspace_map: Vec::new(),
        })
    }

    /// Assembles `source`, normalizes it against this instance's configured
    /// `core_size`, and loads it, collapsing the
    /// assemble → normalize → load pipeline into one call.
    ///
    /// # Errors
    ///
    /// Returns [`MarsError::AssembleFailed`] if `source` doesn't assemble, or
    /// any error [`Mars::load`] can return.
    pub fn assemble_and_load(
        &mut self,
        source: &str,
    ) -> Result<WarriorId, MarsError> {
        let builtins = self.config.assembler_constants();
        let relaxed = redcode_parser::assemble(source, &builtins)
            .map_err(MarsError::AssembleFailed)?;
        let warrior = relaxed.normalize(self.config.core_size);
        self.load(&warrior)
    }

    /// Places `warrior`'s program into the core at the next non-overlapping
    /// slot (`loaded_count × (max_length + min_distance)`) and registers a
    /// single thread at its start offset.
    ///
    /// # Errors
    ///
    /// Returns [`MarsError::WarriorTooLong`] if the program exceeds
    /// `max_length`, [`MarsError::TooManyWarriors`] if this instance's
    /// warrior capacity is already full, or any emulator error encountered
    /// while writing the program into core.
    pub fn load(
        &mut self,
        warrior: &redcode::Warrior,
    ) -> Result<WarriorId, MarsError> {
        let length = u32::try_from(warrior.code.len())
            .map_err(|_err| MarsError::WarriorTooLong)?;
        if length > self.config.max_length {
            return Err(MarsError::WarriorTooLong);
        }
        if self.next_id >= self.max_warriors {
            return Err(MarsError::TooManyWarriors);
        }

        let id = self.next_id;
        let spacing = u64::from(self.config.max_length)
            .saturating_add(u64::from(self.config.min_distance));
        let base = modulo_core(id.saturating_mul(spacing), self.config.core_size);

        for (offset, instr) in warrior.code.iter().enumerate() {
            let offset = CoreAddr::try_from(offset)
                .map_err(|_err| MarsError::WarriorTooLong)?;
            let addr = add_mod(base, offset, self.config.core_size);
            let bytecode = self.emulator.rc_to_bytecode(instr.instr);
            self.emulator
                .write_core(addr, bytecode, instr.a_field, instr.b_field)?;
        }

        let start_pc = add_mod(base, warrior.start, self.config.core_size);
        self.emulator.replace_process_queue(id, &[start_pc])?;

        if let Some(pin) = warrior.pin {
            let pin_value = u64::try_from(pin).unwrap_or_default();
            self.pspace_map.push((pin_value, id));
            self.emulator.initialize_pspace(&self.pspace_map)?;
        }

        self.next_id = self.next_id.saturating_add(1);
        self.warriors.push(WarriorInfo {
            id: WarriorId(id),
            base,
            length,
            name: warrior.name.clone(),
            author: warrior.author.clone(),
        });
        Ok(WarriorId(id))
    }

    /// Advances one round: every currently live warrior executes exactly one
    /// instruction, in load order. Returns the warriors that died this
    /// round, which are then removed from [`Mars::active_warriors`].
    ///
    /// # Errors
    ///
    /// Returns a [`MarsError`] if the underlying emulator reports one.
    pub fn cycle(&mut self) -> Result<Vec<WarriorId>, MarsError> {
        let active_before: HashSet<u64> =
            self.emulator.active_warrior_set().into_iter().collect();
        let ids: Vec<u64> = self.warriors.iter().map(|info| info.id.0).collect();
        for id in ids {
            if active_before.contains(&id) {
                self.emulator.step(id)?;
            }
        }
        let active_after: HashSet<u64> =
            self.emulator.active_warrior_set().into_iter().collect();

        let mut died = Vec::new();
        self.warriors.retain(|info| {
            let was_active = active_before.contains(&info.id.0);
            let still_active = active_after.contains(&info.id.0);
            if was_active && !still_active {
                died.push(info.id);
                false
            } else {
                true
            }
        });
        Ok(died)
    }

    /// Repeats [`Mars::cycle`] until either one warrior remains or
    /// `max_cycles` rounds have elapsed.
    ///
    /// # Errors
    ///
    /// Returns a [`MarsError`] if the underlying emulator reports one.
    pub fn run(&mut self) -> Result<RunOutcome, MarsError> {
        let mut cycles_run = 0_u64;
        while self.warriors.len() > 1 && cycles_run < self.config.max_cycles {
            self.cycle()?;
            cycles_run = cycles_run.saturating_add(1);
        }
        Ok(RunOutcome {
            survivors: self.warriors.iter().map(|info| info.id).collect(),
            cycles_run,
        })
    }

    /// Warriors still alive, in load order.
    #[must_use]
    pub fn active_warriors(&self) -> Vec<WarriorId> {
        self.warriors.iter().map(|info| info.id).collect()
    }

    /// Metadata for a loaded warrior, live or dead.
    #[must_use]
    pub fn warrior_info(&self, id: WarriorId) -> Option<&WarriorInfo> {
        self.warriors.iter().find(|info| info.id == id)
    }

    /// Returns `warrior_id`'s thread queue, oldest thread first. Empty for a
    /// warrior that has died.
    ///
    /// # Errors
    ///
    /// Returns a [`MarsError`] if the underlying emulator reports one.
    pub fn thread_queue(
        &self,
        warrior_id: WarriorId,
    ) -> Result<Vec<CoreAddr>, MarsError> {
        Ok(self.emulator.read_process_queue(warrior_id.0)?)
    }

    /// Reads the instruction currently stored at `addr`.
    ///
    /// # Errors
    ///
    /// Returns a [`MarsError`] if the underlying emulator reports one.
    pub fn read(
        &self,
        addr: CoreAddr,
    ) -> Result<redcode::CompleteInstruction, MarsError> {
        let (bytecode, a_field, b_field) = self.emulator.read_core(addr)?;
        let instr = self.emulator.bytecode_to_rc(bytecode)?;
        Ok(redcode::CompleteInstruction {
            instr,
            a_field,
            b_field,
        })
    }

    /// Reads `warrior_id`'s P-space at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`MarsError::UnknownWarrior`] if `warrior_id` was never
    /// loaded, or any emulator error.
    pub fn pspace_read(
        &self,
        warrior_id: WarriorId,
        addr: CoreAddr,
    ) -> Result<CoreAddr, MarsError> {
        if warrior_id.0 >= self.next_id {
            return Err(MarsError::UnknownWarrior);
        }
        Ok(self.emulator.read_pspace(warrior_id.0, addr)?)
    }

    /// Writes `value` into `warrior_id`'s P-space at `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`MarsError::UnknownWarrior`] if `warrior_id` was never
    /// loaded, or any emulator error.
    pub fn pspace_write(
        &mut self,
        warrior_id: WarriorId,
        addr: CoreAddr,
        value: CoreAddr,
    ) -> Result<(), MarsError> {
        if warrior_id.0 >= self.next_id {
            return Err(MarsError::UnknownWarrior);
        }
        self.emulator.write_pspace(warrior_id.0, addr, value)?;
        Ok(())
    }

    /// Subscribes `callback` to every write the emulator makes to the core,
    /// replacing any previously subscribed observer. See
    /// [`corewar_engine::EmulatorCore::on_write`].
    pub fn on_write(
        &self,
        callback: impl FnMut(
                CoreAddr,
                (BytecodeInstructionIdentifier, CoreAddr, CoreAddr),
                (BytecodeInstructionIdentifier, CoreAddr, CoreAddr),
            ) + Send
            + 'static,
    ) {
        self.emulator.on_write(callback);
    }
}

/// Adds `offset` to `base`, wrapping modulo `core_size`.
fn add_mod(base: CoreAddr, offset: CoreAddr, core_size: u32) -> CoreAddr {
    modulo_core(u64::from(base).saturating_add(u64::from(offset)), core_size)
}

/// Reduces `value` modulo `core_size`, as a [`CoreAddr`].
fn modulo_core(value: u64, core_size: u32) -> CoreAddr {
    if core_size == 0 {
        0
    } else {
        CoreAddr::try_from(value % u64::from(core_size)).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use super::*;

    fn imp_warrior() -> redcode::Warrior {
        let relaxed =
            redcode_parser::assemble("MOV 0, 1", &[]).expect("should assemble");
        relaxed.normalize(8000_u32)
    }

    #[test]
    fn loading_a_warrior_assigns_sequential_ids() {
        let mut mars = Mars::new(MarsProperties::default()).expect("should build");
        let first = mars.load(&imp_warrior()).expect("should load");
        let second = mars.load(&imp_warrior()).expect("should load");
        assert_ne!(first, second);
        assert_eq!(mars.active_warriors(), vec![first, second]);
    }

    #[test]
    fn loading_beyond_capacity_fails() {
        let mut mars = Mars::with_capacity(MarsProperties::default(), 1)
            .expect("should build");
        mars.load(&imp_warrior()).expect("should load");
        let err = mars.load(&imp_warrior()).expect_err("should fail");
        assert_eq!(err, MarsError::TooManyWarriors);
    }

    #[test]
    fn pspace_round_trips_through_a_pinned_warrior() {
        let mut mars = Mars::new(MarsProperties::default()).expect("should build");
        let mut pinned = imp_warrior();
        pinned.pin = Some(7);
        let warrior = mars.load(&pinned).expect("should load");

        mars.pspace_write(warrior, 3, 42).expect("should write");
        assert_eq!(
            mars.pspace_read(warrior, 3).expect("should read"),
            42
        );
    }

    #[test]
    fn pspace_access_with_an_unissued_id_is_rejected() {
        let mars = Mars::new(MarsProperties::default()).expect("should build");
        let bogus = WarriorId(0);
        let err = mars.pspace_read(bogus, 0).expect_err("should fail");
        assert_eq!(err, MarsError::UnknownWarrior);
    }

    #[test]
    fn imp_survives_many_cycles() {
        let mut mars = Mars::new(MarsProperties::default()).expect("should build");
        let imp = mars
            .assemble_and_load(";name Imp\nMOV 0, 1\n")
            .expect("should assemble and load");
        for _ in 0..7991 {
            mars.cycle().expect("should cycle");
        }
        assert_eq!(mars.active_warriors(), vec![imp]);
    }

    #[test]
    fn dwarf_vs_imp_eventually_ends() {
        let mut mars = Mars::new(MarsProperties::default()).expect("should build");
        mars.assemble_and_load(";name Imp\nMOV 0, 1\n")
            .expect("should assemble and load");
        mars.assemble_and_load(
            "loop:  ADD.AB #4, 3\n       MOV.I  2, @2\n       JMP    -2\n       DAT    #0, #0\n",
        )
        .expect("should assemble and load");
        let outcome = mars.run().expect("should run");
        assert!(outcome.cycles_run <= MarsProperties::default().max_cycles);
    }
}
