//! End-to-end battle scenarios run against the public `mars`/`redcode-parser`
//! API, matching the canonical Core War examples (Dwarf, Imp, and the
//! individual-opcode traces they're built from).

use mars::{Mars, MarsProperties};

#[test]
fn imp_propagates_and_survives_a_full_lap_of_the_core() {
    let mut mars = Mars::new(MarsProperties::default()).expect("should build");
    let imp = mars
        .assemble_and_load(";name Imp\nMOV 0, 1\n")
        .expect("should assemble and load");
    let base = mars.warrior_info(imp).expect("should be loaded").base;
    let original = mars.read(base).expect("should read");

    mars.cycle().expect("should cycle");
    assert_eq!(mars.read(base + 1).expect("should read"), original);

    for _ in 0..7990 {
        mars.cycle().expect("should cycle");
    }

    // After 7991 total steps the thread has walked 7991 cells forward,
    // copying the original instruction ahead of itself at each one.
    assert_eq!(mars.read(base + 7991).expect("should read"), original);
    assert_eq!(mars.active_warriors(), vec![imp]);
}

#[test]
fn dwarf_bombs_core_at_an_increasing_offset_each_lap() {
    let mut mars = Mars::new(MarsProperties::default()).expect("should build");
    let dwarf = mars
        .assemble_and_load(
            "loop:  ADD.AB #4, 3\n       MOV.I  2, @2\n       JMP    -2\n       DAT    #0, #0\n",
        )
        .expect("should assemble and load");
    let base = mars.warrior_info(dwarf).expect("should be loaded").base;

    mars.cycle().expect("should cycle"); // ADD.AB #4, 3
    let bomb = mars.read(base + 3).expect("should read");
    assert_eq!(bomb.instr.opcode, redcode::Opcode::Dat);
    assert_eq!(bomb.a_field, 0);
    assert_eq!(bomb.b_field, 4);

    mars.cycle().expect("should cycle"); // MOV.I 2, @2
    let thrown = mars.read(base + 7).expect("should read");
    assert_eq!(thrown.instr.opcode, redcode::Opcode::Dat);
    assert_eq!(thrown.a_field, 0);
    assert_eq!(thrown.b_field, 4);

    mars.cycle().expect("should cycle"); // JMP -2, back to the ADD
    assert_eq!(mars.thread_queue(dwarf).expect("should read"), vec![base]);

    mars.cycle().expect("should cycle"); // ADD.AB #4, 3 again
    mars.cycle().expect("should cycle"); // MOV.I 2, @2 again
    let second_bomb = mars.read(base + 11).expect("should read");
    assert_eq!(second_bomb.instr.opcode, redcode::Opcode::Dat);
    assert_eq!(second_bomb.a_field, 0);
    assert_eq!(second_bomb.b_field, 8);
}

#[test]
fn jmz_branches_when_the_b_operand_is_zero() {
    let mut mars = Mars::new(MarsProperties::default()).expect("should build");
    let warrior = mars
        .assemble_and_load("JMZ 5, #0\n")
        .expect("should assemble and load");
    let base = mars.warrior_info(warrior).expect("should be loaded").base;

    mars.cycle().expect("should cycle");
    assert_eq!(
        mars.thread_queue(warrior).expect("should read"),
        vec![base + 5]
    );
}

#[test]
fn jmz_falls_through_when_the_b_operand_is_nonzero() {
    let mut mars = Mars::new(MarsProperties::default()).expect("should build");
    let warrior = mars
        .assemble_and_load("JMZ 5, #1\n")
        .expect("should assemble and load");
    let base = mars.warrior_info(warrior).expect("should be loaded").base;

    mars.cycle().expect("should cycle");
    assert_eq!(
        mars.thread_queue(warrior).expect("should read"),
        vec![base + 1]
    );
}

#[test]
fn djn_decrements_before_testing_and_branches_once_it_wraps_negative() {
    let mut mars = Mars::new(MarsProperties::default()).expect("should build");
    let warrior = mars
        .assemble_and_load("DJN 5, #1\nJMP -1\n")
        .expect("should assemble and load");
    let base = mars.warrior_info(warrior).expect("should be loaded").base;

    mars.cycle().expect("should cycle"); // DJN decrements #1 to #0, no branch
    assert_eq!(
        mars.thread_queue(warrior).expect("should read"),
        vec![base + 1]
    );
    assert_eq!(mars.read(base).expect("should read").b_field, 0);

    mars.cycle().expect("should cycle"); // JMP -1, back to the DJN
    mars.cycle().expect("should cycle"); // DJN decrements #0 to -1, branches
    assert_eq!(
        mars.thread_queue(warrior).expect("should read"),
        vec![base + 5]
    );
}

#[test]
fn spl_enqueues_the_next_instruction_before_the_new_thread() {
    let mut mars = Mars::new(MarsProperties::default()).expect("should build");
    let warrior = mars
        .assemble_and_load("SPL 5\nSPL -1\n")
        .expect("should assemble and load");
    let base = mars.warrior_info(warrior).expect("should be loaded").base;

    mars.cycle().expect("should cycle");
    assert_eq!(
        mars.thread_queue(warrior).expect("should read"),
        vec![base + 1, base + 5]
    );

    mars.cycle().expect("should cycle");
    assert_eq!(
        mars.thread_queue(warrior).expect("should read"),
        vec![base + 5, base + 2, base]
    );
}

#[test]
fn mov_reads_the_a_operand_only_after_both_operands_predecrement() {
    // `MOV.B *1, <1` at cell 0: the A operand indirects through cell 1's
    // a_field (which is 0, so A's effective target is cell 1 itself), and
    // the B operand predecrements cell 1's b_field before targeting the cell
    // that value now points to. Both operands' indirect index is cell 1, so
    // whichever predecrement runs first determines the B-field MOV.B reads
    // off the A operand. Per spec, B's predecrement must land before A is
    // read, so the value MOV.B copies is the post-decrement one (99), not
    // the stale pre-decrement one (100).
    let mut mars = Mars::new(MarsProperties::default()).expect("should build");
    let warrior = mars
        .assemble_and_load("MOV.B *1, <1\nDAT #0, #100\n")
        .expect("should assemble and load");
    let base = mars.warrior_info(warrior).expect("should be loaded").base;

    mars.cycle().expect("should cycle");

    assert_eq!(mars.read(base + 1).expect("should read").b_field, 99);
    assert_eq!(mars.read(base + 100).expect("should read").b_field, 99);
}

#[test]
fn assembler_resolves_a_self_referencing_label_to_relative_offsets() {
    let relaxed = redcode_parser::assemble("imp MOV imp, imp+1\n", &[])
        .expect("should assemble");
    let warrior = relaxed.normalize(8000_u32);

    assert_eq!(warrior.code.len(), 1);
    let instr = warrior.code[0];
    assert_eq!(instr.instr.opcode, redcode::Opcode::Mov);
    assert_eq!(instr.instr.modifier, redcode::Modifier::I);
    assert_eq!(instr.instr.a_addr_mode, redcode::AddrMode::Direct);
    assert_eq!(instr.a_field, 0);
    assert_eq!(instr.instr.b_addr_mode, redcode::AddrMode::Direct);
    assert_eq!(instr.b_field, 1);
}

#[test]
fn assembler_resolves_dwarf_labels_to_the_same_load_lines_as_numeric_offsets() {
    let source = "
        loop:   ADD.AB  #4, bomb
                MOV.I   bomb, @bomb
                JMP     loop
        bomb:   DAT     #0, #0
    ";
    let relaxed = redcode_parser::assemble(source, &[]).expect("should assemble");
    let fields: Vec<(i64, i64)> = relaxed
        .code
        .iter()
        .map(|instr| (instr.a_field, instr.b_field))
        .collect();
    assert_eq!(fields, vec![(4, 3), (2, 2), (-2, 0), (0, 0)]);
}
