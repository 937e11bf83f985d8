//! # mars
//!
//! `mars` is the embedder-facing Memory Array Redcode Simulator: it ties
//! together [`redcode_parser`]'s assembler, [`corewar_engine`]'s emulator,
//! and a battle-level scheduler into the API an external driver (CLI,
//! tournament runner, evolver) actually needs.
//!
//! [`corewar_engine::EmulatorCore`] only emulates instructions in a
//! preconfigured core; it has no notion of where warriors are loaded or how
//! a battle ends. [`Mars`] adds that layer: [`MarsProperties`] configuration,
//! warrior placement on load, and a round-robin `cycle`/`run` scheduler.
//!
//! ```rust
//! use mars::{Mars, MarsProperties};
//!
//! let mut mars = Mars::new(MarsProperties::default()).unwrap();
//! let imp = mars.assemble_and_load(";name Imp\nMOV 0, 1\n").unwrap();
//! let dwarf = mars.assemble_and_load(
//!     "loop:  ADD.AB #4, 3\n       MOV.I  2, @2\n       JMP    -2\n       DAT    #0, #0\n",
//! ).unwrap();
//! let _ = (imp, dwarf);
//! let outcome = mars.run().unwrap();
//! assert!(!outcome.survivors.is_empty());
//! ```

// Make clippy as annoying as possible
#![deny(
    // All typically enabled warnings are converted into errors
    // includes correctness, suspicious, style, complexity, and perf
    clippy::all,
    // Error on cargo lints
    clippy::cargo,
)]
#![warn(
    // Warn on pedantic and in-development nursery lints
    clippy::pedantic,
    clippy::nursery,
    // Lints from "restriction" group - enforce a consistent if arbitrary style
    clippy::alloc_instead_of_core,
    clippy::arithmetic_side_effects,
    clippy::unnecessary_cast,
    clippy::as_underscore,
    clippy::assertions_on_result_states,
    clippy::clone_on_ref_ptr,
    clippy::create_dir,
    clippy::dbg_macro,
    clippy::decimal_literal_representation,
    clippy::default_numeric_fallback,
    clippy::deref_by_slicing,
    clippy::empty_drop,
    clippy::empty_structs_with_brackets,
    clippy::exit,
    clippy::expect_used,
    clippy::filetype_is_file,
    clippy::float_arithmetic,
    clippy::fn_to_numeric_cast_any,
    clippy::format_push_string,
    clippy::get_unwrap,
    clippy::if_then_some_else_none,
    clippy::indexing_slicing,
    clippy::large_include_file,
    clippy::let_underscore_must_use,
    clippy::lossy_float_literal,
    clippy::map_err_ignore,
    clippy::mem_forget,
    clippy::missing_docs_in_private_items,
    clippy::missing_enforced_import_renames,
    clippy::mixed_read_write_in_expression,
    clippy::mod_module_files,
    clippy::multiple_inherent_impl,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::partial_pub_fields,
    clippy::pattern_type_mismatch,
    clippy::print_stderr,
    clippy::print_stdout,
    clippy::rc_buffer,
    clippy::rc_mutex,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_name_method,
    clippy::unseparated_literal_suffix,
    clippy::shadow_unrelated,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::str_to_string,
    clippy::string_slice,
    clippy::string_to_string,
    clippy::suspicious_xor_used_as_pow,
    clippy::todo,
    clippy::try_err,
    clippy::undocumented_unsafe_blocks,
    clippy::unimplemented,
    clippy::unnecessary_safety_comment,
    clippy::unnecessary_safety_doc,
    clippy::unnecessary_self_imports,
    clippy::unneeded_field_pattern,
    clippy::unreachable,
    clippy::unwrap_in_result,
    clippy::unwrap_used,
    clippy::use_debug,
    clippy::verbose_file_reads,
)]
#![allow(
    clippy::needless_pass_by_value,
    reason = "Internal Compiler Error bug workaround: https://github.com/rust-lang/rust-clippy/issues/10344"
)]

mod config;
pub use config::MarsProperties;

mod error;
pub use error::MarsError;

mod scheduler;
pub use scheduler::{Mars, RunOutcome, WarriorId, WarriorInfo};
