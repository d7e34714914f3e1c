//! End-to-end compilation tests against the textual MIR dump and the
//! inferred type environment.

use sablec_drv::{compile_module, compile_source, CompileError, SourceInput};
use sablec_util::Symbol;

fn dump_of(unit: &sablec_drv::CompilationUnit, module: &str, function: &str) -> String {
    let bundle = &unit.modules()[module];
    let ebb = &bundle.functions[&Symbol::intern(function)];
    ebb.display(unit.type_ctx()).to_string()
}

#[test]
fn test_constant_return_function() {
    let unit = compile_source("def f() -> int:\n    return 1\n").expect("should compile");

    assert_eq!(
        dump_of(&unit, "__main__", "f"),
        "b0<>:\n    v0 = iconst.64 1\n    return v0\n"
    );

    let func = unit.get_function("__main__.f").expect("f exists");
    let type_id = func.type_id.expect("signature computed");
    assert_eq!(unit.type_ctx().reconstruct(type_id), "Callable[Unknown, I64]");
}

#[test]
fn test_two_parameter_addition() {
    let unit =
        compile_source("def f(x: int, y: int) -> int:\n    return x + y\n").expect("should compile");

    assert_eq!(
        dump_of(&unit, "__main__", "f"),
        "b0<>:\n    v0 = usevar x\n    v1 = usevar y\n    v2 = iadd v0 v1\n    return v2\n"
    );

    let func = unit.get_function("__main__.f").expect("f exists");
    let type_id = func.type_id.expect("signature computed");
    assert_eq!(unit.type_ctx().reconstruct(type_id), "Callable[I64, I64]");
}

#[test]
fn test_comparison_chains_through_integers() {
    let unit = compile_source("def f() -> bool:\n    return 1 == 1\n").expect("should compile");

    assert_eq!(
        dump_of(&unit, "__main__", "f"),
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
fn test_annotated_local_round_trips_through_usevar() {
    let unit = compile_source("def f(x: int) -> int:\n    y: int = x + 1\n    return y\n")
        .expect("should compile");

    let dump = dump_of(&unit, "__main__", "f");
    assert!(dump.contains("y = v2"), "{}", dump);
    assert!(dump.contains("v3 = usevar y"), "{}", dump);

    let bundle = &unit.modules()["__main__"];
    let ebb = &bundle.functions[&Symbol::intern("f")];
    let y_ty = ebb.variables[&Symbol::intern("y")];
    assert_eq!(unit.type_ctx().reconstruct(y_ty), "I64");
}

#[test]
fn test_conditional_block_layout() {
    let unit = compile_source("def f(b: bool) -> int:\n    if b: return 1\n    return 0\n")
        .expect("should compile");

    assert_eq!(
        dump_of(&unit, "__main__", "f"),
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
fn test_bare_assignment_is_a_batched_diagnostic() {
    let err = compile_source("x = 1\n").expect_err("bare assignment must not compile");

    match &err {
        CompileError::Invalid(diagnostics) => {
            assert!(
                diagnostics
                    .iter()
                    .any(|d| d.message.contains("Regular assignment is not supported")),
                "{:?}",
                diagnostics
            );
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn test_class_definition_is_rejected() {
    let err = compile_source("class C:\n    pass\n").expect_err("classes must not compile");
    assert!(
        err.diagnostics()
            .iter()
            .any(|d| d.message.contains("Classes are not supported")),
        "{:?}",
        err
    );
}

#[test]
fn test_validation_batches_multiple_rejections() {
    let err = compile_source("x = 1\ny = 2\n").expect_err("should fail validation");

    match &err {
        CompileError::Invalid(diagnostics) => assert_eq!(diagnostics.len(), 2),
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn test_syntax_error_is_a_parse_failure() {
    let err = compile_source("def f(:\n    pass\n").expect_err("should fail to parse");
    assert!(matches!(err, CompileError::Parse(_)), "{:?}", err);
    assert!(!err.diagnostics().is_empty());
}

#[test]
fn test_return_type_mismatch_fails_fast() {
    let err = compile_source("def f() -> bool:\n    return 1\n").expect_err("should fail typecheck");
    assert!(matches!(err, CompileError::Type(_)), "{:?}", err);
}

#[test]
fn test_shadowed_binding_is_rejected() {
    let err = compile_source(
        "def f() -> int:\n    x: int = 1\n    x: bool = True\n    return x\n",
    )
    .expect_err("shadowing must not compile");
    assert!(matches!(err, CompileError::Type(_)), "{:?}", err);
}

#[test]
fn test_while_loop_compiles() {
    let unit = compile_source(
        "def f(x: int) -> int:\n    while x > 0:\n        pass\n    return x\n",
    )
    .expect("should compile");

    let dump = dump_of(&unit, "__main__", "f");
    assert!(dump.contains("branchintcmp eq"), "{}", dump);
    assert!(dump.contains("jump b1"), "{}", dump);
}

#[test]
fn test_call_between_functions() {
    let unit = compile_source(
        "def g(x: int) -> int:\n    return x\n\ndef f() -> int:\n    g(3)\n    return 0\n",
    )
    .expect("should compile");

    let dump = dump_of(&unit, "__main__", "f");
    assert!(dump.contains("call fn0 v0"), "{}", dump);

    let g = unit.get_function("__main__.g").expect("g exists");
    assert_eq!(
        unit.type_ctx().reconstruct(g.type_id.expect("signature")),
        "Callable[I64, I64]"
    );
}

#[test]
fn test_module_name_is_configurable() {
    let unit = compile_module("def f() -> int:\n    return 1\n", "lib").expect("should compile");

    assert!(unit.modules().contains_key("lib"));
    assert!(unit.get_function("lib.f").is_some());
    assert!(unit.get_function("__main__.f").is_none());
}

#[test]
fn test_reader_input() {
    let reader: Box<dyn std::io::Read> =
        Box::new(std::io::Cursor::new(b"def f() -> int:\n    return 1\n".to_vec()));
    let unit = compile_source(SourceInput::Reader(reader)).expect("should compile");
    assert!(unit.get_function("__main__.f").is_some());
}

#[test]
fn test_size_of_resolved_types() {
    let unit = compile_source("def f(x: int) -> int:\n    return x\n").expect("should compile");

    let func = unit.get_function("__main__.f").expect("f exists");
    let type_id = func.type_id.expect("signature computed");

    let tcx = unit.type_ctx();
    match tcx.get(type_id) {
        sablec_sem::TypeInfo::Callable { parameters, output } => {
            assert_eq!(unit.size_of(*parameters), Some(8));
            assert_eq!(unit.size_of(*output), Some(8));
        }
        other => panic!("expected callable, got {:?}", other),
    }
}

#[test]
fn test_every_function_in_module_is_lowered() {
    let unit = compile_source(
        "def a() -> int:\n    return 1\n\ndef b() -> int:\n    return 2\n\ndef c() -> int:\n    return 3\n",
    )
    .expect("should compile");

    let bundle = &unit.modules()["__main__"];
    let names: Vec<&str> = bundle.functions.keys().map(|s| s.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}
