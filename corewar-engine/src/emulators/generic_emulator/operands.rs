use redcode::{AddrMode, Instruction};

use super::offset;
use crate::{
    emulator_core::{EmulatorError, EmulatorResult},
    CoreAddr, Memory,
};

/// Loaded at the start of a cycle, not touched by later core modifications
#[derive(Copy, Clone, Debug)]
pub struct RegisterValues {
    /// The PC and the content of the instruction it points to
    pub current: RegisterValue,

    /// The A target and A values
    pub a: RegisterValue,

    /// The B target and B values
    pub b: RegisterValue,
}

/// A core index (e.g. PC or field target) and contents
#[derive(Copy, Clone, Debug)]
pub struct RegisterValue {
    /// Core index for the instruction that occupies this register
    pub idx: CoreAddr,
    /// Decoded instruction
    pub instr: Instruction,
    /// A field for the instruction in this register
    pub a_field: CoreAddr,
    /// B field for the instruction in this register
    pub b_field: CoreAddr,
}

// TODO(jespy) Break up this function into simpler components, and enable this
// lint for each
#[allow(
    clippy::indexing_slicing,
    reason = "Removing indexing adds redundant logic for error handling and \
              to satisfy the borrow checker"
)]
/// Evaluate the A and B operands according to the operand modifier
///
/// Because `PostIncrement` may modify the core core, the values in
/// [`RegisterValue`] are not guaranteed to match the in-core values.  
///
/// # Errors
///
/// Returns [`EmulatorError::InternalError`] in exceptional circumstances.
/// Typically this is the result of invalid parameters, or core corruption where
/// field values exceed `core_size - 1`.
pub fn evaluate(
    pc: CoreAddr,
    core: &mut Memory,
) -> EmulatorResult<RegisterValues> {
    let size = core.len();

    // Cache a copy of the current instruction before any writes to the core
    let pc_idx = usize::try_from(pc).or(Err(EmulatorError::InternalError(
        "unable to convert pc into usize",
    )))?;
    if pc_idx >= size {
        return Err(EmulatorError::InternalError("pc larger than core size"));
    }
    let cur = core.read(pc_idx);

    // The index into the core pointed to by the a_field of the current
    // instruction.  This is used lots of places.
    //  - This is used as the target if the mode is Direct
    //  - One of the fields in the instruction pointed to by this is used as as
    //    the target if the mode is Indirect
    //  - If mode is any sort of predecrement or postincrement, one of the
    //    fields in the instruction this points to is modified.
    let a_indirect_index_value = add(cur.a_field, pc, size)?;
    let a_indirect_index = usize::try_from(a_indirect_index_value).or(Err(
        EmulatorError::InternalError("unable to convert core field into usize"),
    ))?;

    // The index into the core pointed to by the b_field of the current
    // instruction.  This is used lots of places.
    //  - This is used as the target if the mode is Direct
    //  - One of the fields in the instruction pointed to by this is used as as
    //    the target if the mode is Indirect
    //  - If mode is any sort of predecrement or postincrement, one of the
    //    fields in the instruction this points to is modified.
    let b_indirect_index_value = add(cur.b_field, pc, size)?;
    let b_indirect_index = usize::try_from(b_indirect_index_value).or(Err(
        EmulatorError::InternalError("unable to convert core field into usize"),
    ))?;

    // Predecrement runs for both operands before either operand resolves or
    // reads. See http://www.koth.org/info/icws94.html#5.3.5 -- order matters
    // whenever the B operand's predecrement touches the cell the A operand
    // targets (or vice versa).
    match cur.instr.a_addr_mode {
        AddrMode::PredecA => {
            let new_val = decremented(core[a_indirect_index].a_field, size)?;
            core.write_a_field(a_indirect_index, new_val);
        }
        AddrMode::PredecB => {
            let new_val = decremented(core[a_indirect_index].b_field, size)?;
            core.write_b_field(a_indirect_index, new_val);
        }
        _ => {}
    };
    match cur.instr.b_addr_mode {
        AddrMode::PredecA => {
            let new_val = decremented(core[b_indirect_index].a_field, size)?;
            core.write_a_field(b_indirect_index, new_val);
        }
        AddrMode::PredecB => {
            let new_val = decremented(core[b_indirect_index].b_field, size)?;
            core.write_b_field(b_indirect_index, new_val);
        }
        _ => {}
    };

    // Resolve the A operand's target index, then the B operand's, both
    // against the post-predecrement core.
    let a_target: CoreAddr = match cur.instr.a_addr_mode {
        AddrMode::Immediate => pc,
        AddrMode::Direct => add(cur.a_field, pc, size)?,
        AddrMode::IndirectA | AddrMode::PredecA | AddrMode::PostincA => {
            add(a_indirect_index_value, core[a_indirect_index].a_field, size)?
        }
        AddrMode::IndirectB | AddrMode::PredecB | AddrMode::PostincB => {
            add(a_indirect_index_value, core[a_indirect_index].b_field, size)?
        }
    };
    let a_target_idx = usize::try_from(a_target).or(Err(
        EmulatorError::InternalError("unable to convert core field into usize"),
    ))?;
    let b_target: CoreAddr = match cur.instr.b_addr_mode {
        AddrMode::Immediate => pc,
        AddrMode::Direct => add(cur.b_field, pc, size)?,
        AddrMode::IndirectA | AddrMode::PredecA | AddrMode::PostincA => {
            add(b_indirect_index_value, core[b_indirect_index].a_field, size)?
        }
        AddrMode::IndirectB | AddrMode::PredecB | AddrMode::PostincB => {
            add(b_indirect_index_value, core[b_indirect_index].b_field, size)?
        }
    };
    let b_target_idx = usize::try_from(b_target).or(Err(
        EmulatorError::InternalError("unable to convert core field into usize"),
    ))?;

    // Postincrement runs for both operands next, still ahead of either read.
    match cur.instr.a_addr_mode {
        AddrMode::PostincA => {
            let new_val = incremented(core[a_indirect_index].a_field, size)?;
            core.write_a_field(a_indirect_index, new_val);
        }
        AddrMode::PostincB => {
            let new_val = incremented(core[a_indirect_index].b_field, size)?;
            core.write_b_field(a_indirect_index, new_val);
        }
        _ => {}
    };
    match cur.instr.b_addr_mode {
        AddrMode::PostincA => {
            let new_val = incremented(core[b_indirect_index].a_field, size)?;
            core.write_a_field(b_indirect_index, new_val);
        }
        AddrMode::PostincB => {
            let new_val = incremented(core[b_indirect_index].b_field, size)?;
            core.write_b_field(b_indirect_index, new_val);
        }
        _ => {}
    };

    // Read through both effective addresses last, after every predecrement
    // and postincrement has been applied.
    let a_instr = core.read(a_target_idx);
    let b_instr = core.read(b_target_idx);

    Ok(RegisterValues {
        current: RegisterValue {
            idx: validate(pc, size)?,
            instr: cur.instr,
            a_field: validate(cur.a_field, size)?,
            b_field: validate(cur.b_field, size)?,
        },
        a: RegisterValue {
            idx: validate(a_target, size)?,
            instr: a_instr.instr,
            a_field: validate(a_instr.a_field, size)?,
            b_field: validate(a_instr.b_field, size)?,
        },
        b: RegisterValue {
            idx: validate(b_target, size)?,
            instr: b_instr.instr,
            a_field: validate(b_instr.a_field, size)?,
            b_field: validate(b_instr.b_field, size)?,
        },
    })
}

/// Returns `val` plus one, modulo core size
fn incremented(val: CoreAddr, size: usize) -> EmulatorResult<CoreAddr> {
    let Ok(size) = CoreAddr::try_from(size) else {
        return Err(EmulatorError::InternalError(
            "core size too large to be converted into CoreAddr u32",
        ))
    };
    super::offset(val, 1, size)
}

/// Returns `val` minus one, modulo core size
fn decremented(val: CoreAddr, size: usize) -> EmulatorResult<CoreAddr> {
    let Ok(size) = CoreAddr::try_from(size) else {
        return Err(EmulatorError::InternalError(
            "core size too large to be converted into CoreAddr u32",
        ))
    };
    super::offset(val, -1, size)
}

/// Add two values modulo core size
fn add(lhs: CoreAddr, rhs: CoreAddr, size: usize) -> EmulatorResult<CoreAddr> {
    let Ok(size) = CoreAddr::try_from(size) else {
        return Err(EmulatorError::InternalError(
            "core size too large to be converted into CoreAddr u32",
        ))
    };
    offset(lhs, rhs.into(), size)
}

/// Verify that a core value is valid relative to the core size
fn validate(val: CoreAddr, size: usize) -> EmulatorResult<CoreAddr> {
    let Ok(size) = CoreAddr::try_from(size) else {
        return Err(EmulatorError::InternalError(
            "core size too large to be converted into CoreAddr u32",
        ))
    };
    if val < (size as CoreAddr) {
        Ok(val)
    } else {
        Err(EmulatorError::InternalError(
            "Invalid core value greater than core size",
        ))
    }
}
