//! MIR builder and textual dump tests.

use indexmap::IndexMap;
use sablec_par::parse_source;
use sablec_sem::{Primitive, ScopeTree, TypeChecker, TypeStore};
use sablec_util::{Handler, Symbol};

use crate::builder::ModuleBuilder;
use crate::ebb::{Ebb, FluidBlock};
use crate::error::LowerError;
use crate::instr::{CmpMode, InstrOp};

fn lower(source: &str) -> (TypeStore, IndexMap<Symbol, Ebb>) {
    let handler = Handler::new();
    let (ast, module) = parse_source(source, &handler);
    assert!(!handler.has_errors(), "{:?}", handler.diagnostics());

    let (mut tree, root) = ScopeTree::build_module(&ast, &module, &handler);
    assert!(!handler.has_errors(), "{:?}", handler.diagnostics());

    let mut tcx = TypeStore::new();
    TypeChecker::new(&ast, &mut tree, &mut tcx)
        .check_module(root)
        .expect("typecheck should succeed");

    let functions = ModuleBuilder::new(&ast, &tree, &mut tcx)
        .lower(root)
        .expect("lowering should succeed");
    (tcx, functions)
}

fn single_dump(source: &str) -> String {
    let (tcx, functions) = lower(source);
    assert_eq!(functions.len(), 1);
    functions[0].display(&tcx).to_string()
}

#[test]
fn test_constant_return() {
    let dump = single_dump("def f() -> int:\n    return 1\n");
    assert_eq!(dump, "b0<>:\n    v0 = iconst.64 1\n    return v0\n");
}

#[test]
fn test_parameter_addition() {
    let dump = single_dump("def f(x: int, y: int) -> int:\n    return x + y\n");
    assert_eq!(
        dump,
        "b0<>:\n    v0 = usevar x\n    v1 = usevar y\n    v2 = iadd v0 v1\n    return v2\n"
    );
}

#[test]
fn test_compare_chain_seals_boolean() {
    let dump = single_dump("def f() -> bool:\n    return 1 == 1\n");
    assert_eq!(
        dump,
        "b0<>:\n\
         \x20   v0 = iconst.64 1\n\
         \x20   v1 = iconst.64 1\n\
         \x20   v2 = intcmp eq v0 v1\n\
         \x20   v3 = bint.I64 v2\n\
         \x20   v4 = bool_const v3\n\
         \x20   return v4\n"
    );
}

#[test]
fn test_annotated_local_binds_variable() {
    let (tcx, functions) =
        lower("def f(x: int) -> int:\n    y: int = x + 1\n    return y\n");
    let ebb = &functions[0];

    let dump = ebb.display(&tcx).to_string();
    assert_eq!(
        dump,
        "b0<>:\n\
         \x20   v0 = usevar x\n\
         \x20   v1 = iconst.64 1\n\
         \x20   v2 = iadd v0 v1\n\
         \x20   y = v2\n\
         \x20   v3 = usevar y\n\
         \x20   return v3\n"
    );

    let y_ty = ebb.variables[&Symbol::intern("y")];
    assert_eq!(tcx.reconstruct(y_ty), "I64");
}

#[test]
fn test_if_block_layout() {
    let dump = single_dump("def f(b: bool) -> int:\n    if b: return 1\n    return 0\n");
    assert_eq!(
        dump,
        "b0<>:\n\
         \x20   v0 = usevar b\n\
         \x20   v1 = bint.I64 v0\n\
         \x20   v2 = iconst.64 1\n\
         \x20   branchintcmp eq v1 v2 b1\n\
         \x20   jump b2\n\
         b1<>:\n\
         \x20   v3 = iconst.64 1\n\
         \x20   return v3\n\
         b2<>:\n\
         \x20   v4 = iconst.64 0\n\
         \x20   return v4\n"
    );
}

#[test]
fn test_if_else_arms_join() {
    let (tcx, functions) = lower(
        "def f(b: bool) -> int:\n    x: int = 0\n    if b:\n        pass\n    else:\n        pass\n    return x\n",
    );
    let ebb = &functions[0];

    // entry, then-arm, else-arm, join
    assert_eq!(ebb.blocks.len(), 4);
    for block in ebb.blocks.iter() {
        assert!(block.is_terminated(), "{}", ebb.display(&tcx));
    }

    // both arms jump to the join block
    let jumps = ebb
        .blocks
        .iter()
        .flat_map(|block| &block.body)
        .filter(|instr| matches!(instr.op, InstrOp::Jump { .. }))
        .count();
    assert_eq!(jumps, 3, "{}", ebb.display(&tcx));
}

#[test]
fn test_elif_chain_nests() {
    let (tcx, functions) = lower(
        "def f(b: bool) -> int:\n    if b:\n        return 1\n    elif b:\n        return 2\n    else:\n        return 3\n    return 0\n",
    );
    let ebb = &functions[0];

    for block in ebb.blocks.iter() {
        assert!(block.is_terminated(), "{}", ebb.display(&tcx));
    }

    let returns = ebb
        .blocks
        .iter()
        .flat_map(|block| &block.body)
        .filter(|instr| matches!(instr.op, InstrOp::Return { .. }))
        .count();
    assert_eq!(returns, 4, "{}", ebb.display(&tcx));
}

#[test]
fn test_while_loops_back_to_header() {
    let (tcx, functions) = lower(
        "def f(x: int) -> int:\n    while x > 0:\n        pass\n    return x\n",
    );
    let ebb = &functions[0];
    let dump = ebb.display(&tcx).to_string();

    // entry jumps into the header; the body jumps back to it
    let header_jumps = ebb
        .blocks
        .iter()
        .flat_map(|block| &block.body)
        .filter(|instr| matches!(instr.op, InstrOp::Jump { target } if target.0 == 1))
        .count();
    assert_eq!(header_jumps, 2, "{}", dump);

    let branches = ebb
        .blocks
        .iter()
        .flat_map(|block| &block.body)
        .filter(|instr| {
            matches!(
                instr.op,
                InstrOp::BranchIntCmp {
                    mode: CmpMode::Eq,
                    ..
                }
            )
        })
        .count();
    assert_eq!(branches, 1, "{}", dump);
}

#[test]
fn test_call_carries_argument_operands() {
    let (tcx, functions) = lower(
        "def g(x: int) -> int:\n    return x\n\ndef f() -> int:\n    g(7)\n    return 0\n",
    );
    let ebb = &functions[&Symbol::intern("f")];
    let dump = ebb.display(&tcx).to_string();

    assert_eq!(ebb.funcs.len(), 1);
    assert_eq!(ebb.funcs[crate::instr::FuncRef(0)], Symbol::intern("g"));
    assert!(dump.contains("call fn0 v0"), "{}", dump);
}

#[test]
fn test_call_argument_type_mismatch_fails() {
    let handler = Handler::new();
    let source = "def g(x: int) -> int:\n    return x\n\ndef f() -> int:\n    g(True)\n    return 0\n";
    let (ast, module) = parse_source(source, &handler);
    let (mut tree, root) = ScopeTree::build_module(&ast, &module, &handler);

    let mut tcx = TypeStore::new();
    TypeChecker::new(&ast, &mut tree, &mut tcx)
        .check_module(root)
        .expect("typecheck should succeed");

    let err = ModuleBuilder::new(&ast, &tree, &mut tcx)
        .lower(root)
        .expect_err("boolean argument must not unify with int parameter");
    assert!(
        matches!(err, LowerError::Type(_)),
        "{:?}",
        err
    );
}

#[test]
fn test_pass_only_body_gets_implicit_return() {
    let dump = single_dump("def f():\n    pass\n");
    assert_eq!(dump, "b0<>:\n    nop\n    return\n");
}

#[test]
fn test_string_constant_lowering() {
    let (tcx, functions) = lower("def f() -> int:\n    \"note\"\n    return 0\n");
    let dump = functions[0].display(&tcx).to_string();
    assert!(dump.contains("str_const \"note\""), "{}", dump);
}

#[test]
fn test_every_block_is_terminated() {
    let (_, functions) = lower(
        "def f(b: bool, c: bool) -> int:\n    if b:\n        if c:\n            return 2\n        return 1\n    return 0\n",
    );
    for ebb in functions.values() {
        for block in ebb.blocks.iter() {
            assert!(block.is_terminated());
        }
    }
}

#[test]
fn test_fluid_block_assign_typechecks() {
    let mut tcx = TypeStore::new();
    let i64_ty = tcx.primitive(Primitive::I64);
    let bool_ty = tcx.primitive(Primitive::Bool);

    let mut fluid = FluidBlock::new();
    fluid.clean_block();
    let value = fluid.int_const(1, 64, true, i64_ty);

    let err = fluid
        .assign(&tcx, Symbol::intern("flag"), value, bool_ty)
        .expect_err("I64 value must not bind a Bool variable");
    assert!(matches!(err, LowerError::TypeMismatch { .. }), "{:?}", err);

    fluid
        .assign(&tcx, Symbol::intern("n"), value, i64_ty)
        .expect("matching types bind");
}

#[test]
fn test_fluid_block_return_typechecks() {
    let mut tcx = TypeStore::new();
    let i64_ty = tcx.primitive(Primitive::I64);
    let bool_ty = tcx.primitive(Primitive::Bool);

    let mut fluid = FluidBlock::new();
    fluid.returns = Some(i64_ty);
    fluid.clean_block();

    let value = fluid.bool_const(true, bool_ty);
    let err = fluid
        .return_(&tcx, Some(value))
        .expect_err("Bool must not return from an I64 function");
    assert!(matches!(err, LowerError::TypeMismatch { .. }), "{:?}", err);
}

#[test]
fn test_finalize_rejects_unterminated_blocks() {
    let mut tcx = TypeStore::new();
    let i64_ty = tcx.primitive(Primitive::I64);

    let mut fluid = FluidBlock::new();
    fluid.returns = Some(i64_ty);
    fluid.clean_block();
    fluid.nop();

    let err = fluid.finalize().expect_err("nop is not a terminator");
    assert!(
        matches!(err, LowerError::UnterminatedBlock { block: 0 }),
        "{:?}",
        err
    );
}

#[test]
fn test_finalize_requires_return_type() {
    let fluid = FluidBlock::new();
    let err = fluid.finalize().expect_err("no return type recorded");
    assert!(matches!(err, LowerError::MissingReturnType), "{:?}", err);
}

#[test]
fn test_ssa_values_are_dense_per_function() {
    let (_, functions) = lower(
        "def f() -> int:\n    return 1\n\ndef g() -> int:\n    return 2\n",
    );

    for ebb in functions.values() {
        let mut defined = Vec::new();
        for block in ebb.blocks.iter() {
            for instr in &block.body {
                if let Some(crate::instr::Ret::Ssa(value)) = &instr.ret {
                    defined.push(value.0);
                }
            }
        }
        defined.sort_unstable();
        let expected: Vec<u32> = (0..defined.len() as u32).collect();
        assert_eq!(defined, expected);
    }
}
