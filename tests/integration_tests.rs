//! Java-- 编译器集成测试
//!
//! 通过 `Compiler` 公共接口驱动完整流水线：源代码 → 语义检查 → IR → Jasmin

use jmmc::error::JmmError;
use jmmc::semantic::Report;
use jmmc::Compiler;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 编译源代码，返回 (IR, 汇编)
fn compile_jmm(source: &str) -> (String, String) {
    init_logger();
    match Compiler::default().compile(source) {
        Ok(output) => (output.ir, output.assembly),
        Err(JmmError::Semantic(reports)) => panic!("unexpected diagnostics: {:#?}", reports),
        Err(err) => panic!("compilation failed: {}", err),
    }
}

/// 期望语义检查失败，返回诊断列表
fn compile_expect_error(source: &str) -> Vec<Report> {
    init_logger();
    match Compiler::default().compile(source) {
        Err(JmmError::Semantic(reports)) => reports,
        Err(err) => panic!("expected semantic errors, got {}", err),
        Ok(_) => panic!("expected compilation to fail, but it succeeded"),
    }
}

/// 截取某个方法的汇编行，去掉缩进
fn method_lines(assembly: &str, header: &str) -> Vec<String> {
    let start = assembly
        .find(header)
        .unwrap_or_else(|| panic!("method {} not found in\n{}", header, assembly));
    assembly[start..]
        .lines()
        .take_while(|l| *l != ".end method")
        .map(|l| l.trim().to_string())
        .collect()
}

fn limit(lines: &[String], kind: &str) -> usize {
    let prefix = format!(".limit {} ", kind);
    lines
        .iter()
        .find_map(|l| l.strip_prefix(&prefix))
        .and_then(|n| n.parse().ok())
        .unwrap_or_else(|| panic!("missing .limit {}", kind))
}

const COUNTER: &str = r#"
import io;

class Counter {
    int total;

    public int sum(int[] values) {
        int i;
        int acc;
        i = 0;
        acc = 0;
        while (i < values.length) {
            acc = acc + values[i];
            i = i + 1;
        }
        total = acc;
        return acc;
    }

    public static void main(String[] args) {
        Counter c;
        int[] data;
        data = new int[3];
        data[0] = 4;
        c = new Counter();
        io.println(c.sum(data));
    }
}
"#;

#[test]
fn test_minimal_program_end_to_end() {
    let source = "class Main { public static void main(String[] args) { int a; a = 1; } }";
    let compiler = Compiler::default();

    let semantics = compiler.analyze(source).unwrap();
    assert!(semantics.reports.is_empty());
    let table = &semantics.table;
    assert!(table.fields().is_empty());
    assert_eq!(table.methods().len(), 1);
    assert_eq!(table.return_type("main").unwrap().name, "static void");
    let locals = table.local_variables("main").unwrap();
    assert_eq!(locals.len(), 1);
    assert_eq!(locals[0].name, "a");
    assert!(locals[0].ty.is_int() && !locals[0].ty.is_array);

    let (ir, assembly) = compile_jmm(source);
    let assignments: Vec<&str> = ir.lines().map(str::trim).filter(|l| l.contains(":=")).collect();
    assert_eq!(assignments, vec!["a.i32 :=.i32 1.i32;"]);

    let main = method_lines(&assembly, ".method public static main([Ljava/lang/String;)V");
    assert!(limit(&main, "locals") >= 2);
    assert_eq!(main.iter().filter(|l| l.starts_with("istore")).count(), 1);
    assert!(main.contains(&"istore_1".to_string()));
}

#[test]
fn test_block_comments_and_tmp_named_local() {
    let source = r#"
/** 计数 */
class A {
    public int f(int x) {
        int tmp0; /* 保留
                     的名字 */
        tmp0 = 7;
        x = x * 2 + tmp0;
        return x;
    }
}
"#;
    let (ir, _) = compile_jmm(source);
    let assignments: Vec<&str> = ir.lines().map(str::trim).filter(|l| l.contains(":=")).collect();
    assert_eq!(
        assignments,
        vec![
            "tmp0.i32 :=.i32 7.i32;",
            "tmp1.i32 :=.i32 x.i32 *.i32 2.i32;",
            "x.i32 :=.i32 tmp1.i32 +.i32 tmp0.i32;",
        ]
    );
}

#[test]
fn test_incompatible_assignment_reports_once() {
    let reports = compile_expect_error(
        "class Main { public static void main(String[] args) { int x; x = true; } }",
    );
    assert_eq!(reports.len(), 1);
    assert!(reports[0].message.contains("boolean"));
    assert!(reports[0].message.contains("int"));
}

#[test]
fn test_boolean_array_index_reports_once() {
    let reports = compile_expect_error(
        "class A { public int f(int[] a) { return a[true]; } }",
    );
    assert_eq!(reports.len(), 1);
    assert!(reports[0].message.contains("Invalid array index type: boolean"));
}

#[test]
fn test_undeclared_method_on_local_variable() {
    let reports = compile_expect_error(
        "class A { public int f() { A a; a = new A(); a.foo(); return 0; } }",
    );
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].message, "Method foo is not declared");
}

#[test]
fn test_undeclared_method_allowed_with_superclass_or_import() {
    compile_jmm("class A extends B { public int f() { A a; a = new A(); a.foo(); return 0; } }");
    compile_jmm("import Lib; class A { public int f() { Lib.foo(); return 0; } }");
}

#[test]
fn test_analysis_is_deterministic() {
    let compiler = Compiler::default();
    let first = compiler.analyze(COUNTER).unwrap();
    let second = compiler.analyze(COUNTER).unwrap();
    assert!(first.reports.is_empty());
    assert_eq!(first.reports, second.reports);
}

#[test]
fn test_constant_folding() {
    let (ir, assembly) = compile_jmm("class A { public int f() { return 2 + 3 * 4; } }");
    assert!(ir.contains("ret.i32 14.i32;"));
    assert!(!ir.contains("tmp"));
    let f = method_lines(&assembly, ".method public f()I");
    assert!(f.contains(&"bipush 14".to_string()));
}

#[test]
fn test_stack_limit_matches_hand_trace() {
    let (_, assembly) = compile_jmm(
        "class A { \
         public int g(int a, int b, int c) { return a; } \
         public int f(int a, int b, int c) { return this.g(a, b, c); } }",
    );
    // aload_0, iload_1, iload_2, iload_3 同时在栈上
    let f = method_lines(&assembly, ".method public f(III)I");
    assert_eq!(limit(&f, "stack"), 4);
    assert_eq!(limit(&f, "locals"), 5);

    let g = method_lines(&assembly, ".method public g(III)I");
    assert_eq!(limit(&g, "stack"), 1);
}

#[test]
fn test_increment_peephole() {
    let (ir, assembly) = compile_jmm(
        "class A { public int f() { int i; i = 0; i = i + 1; return i; } }",
    );
    assert!(ir.contains("i.i32 :=.i32 i.i32 +.i32 1.i32;"));
    let f = method_lines(&assembly, ".method public f()I");
    assert_eq!(f.iter().filter(|l| l.starts_with("iinc")).count(), 1);
    assert!(f.contains(&"iinc 1 1".to_string()));
    assert!(!f.contains(&"iadd".to_string()));
}

#[test]
fn test_loop_with_fields_and_arrays() {
    let (ir, assembly) = compile_jmm(COUNTER);

    assert!(ir.contains("Loop0:"));
    assert!(ir.contains("if (!.bool tmp1.bool) goto EndLoop0;"));
    assert!(ir.contains("acc.i32 :=.i32 acc.i32 +.i32 values[i.i32].i32;"));
    assert!(ir.contains("putfield(this, total.i32, acc.i32).V;"));

    let sum = method_lines(&assembly, ".method public sum([I)I");
    assert_eq!(limit(&sum, "stack"), 3);
    assert_eq!(limit(&sum, "locals"), 6);
    for expected in [
        "Loop0:",
        "arraylength",
        "iflt ComparisonThen0",
        "ifeq EndLoop0",
        "iaload",
        "iinc 2 1",
        "goto Loop0",
        "EndLoop0:",
        "putfield Counter/total I",
        "ireturn",
    ] {
        assert!(sum.contains(&expected.to_string()), "missing {} in {:#?}", expected, sum);
    }
}

#[test]
fn test_objects_and_static_calls() {
    let (_, assembly) = compile_jmm(COUNTER);
    let main = method_lines(&assembly, ".method public static main([Ljava/lang/String;)V");
    for expected in [
        "newarray int",
        "iastore",
        "new Counter",
        "invokespecial Counter/<init>()V",
        "invokevirtual Counter/sum([I)I",
        "invokestatic io/println(I)V",
        "return",
    ] {
        assert!(main.contains(&expected.to_string()), "missing {} in {:#?}", expected, main);
    }
    // 有返回值的调用都在赋值右侧，不需要 pop
    assert!(!main.contains(&"pop".to_string()));
}

#[test]
fn test_class_header_and_constructor() {
    let (ir, assembly) = compile_jmm(
        "import java.util.ArrayList; class A extends ArrayList { int x; public int f() { return x; } }",
    );
    assert!(ir.contains("public A extends ArrayList {"));
    assert!(ir.contains(".construct A().V {"));
    assert!(assembly.starts_with(".class public A\n.super java/util/ArrayList\n"));
    assert!(assembly.contains(".field private x I"));
    assert!(assembly.contains("invokespecial java/util/ArrayList/<init>()V"));
    assert!(assembly.contains("getfield A/x I"));
}

#[test]
fn test_ignored_call_result_is_popped() {
    let (_, assembly) = compile_jmm(
        "class A { public int g() { return 1; } public int f() { this.g(); return 0; } }",
    );
    let f = method_lines(&assembly, ".method public f()I");
    let call = f.iter().position(|l| l == "invokevirtual A/g()I").unwrap();
    assert_eq!(f[call + 1], "pop");
}

#[test]
fn test_conditionals_and_not() {
    let (ir, assembly) = compile_jmm(
        "class A { public boolean f(boolean b, int x) { boolean r; \
         if (!b && x < 10) { r = true; } else { r = false; } return r; } }",
    );
    assert!(ir.contains("Else0:"));
    assert!(ir.contains("EndIf0:"));
    let f = method_lines(&assembly, ".method public f(ZI)Z");
    assert!(f.contains(&"ifne NotThen0".to_string()));
    assert!(f.contains(&"iflt ComparisonThen1".to_string()));
    assert!(f.contains(&"iflt ComparisonThen2".to_string()));
    assert!(f.contains(&"ifeq Else0".to_string()));
}

#[test]
fn test_ir_text_reassembles_identically() {
    let output = Compiler::default().compile(COUNTER).unwrap();
    assert_eq!(jmmc::assemble(&output.ir).unwrap(), output.assembly);
}

#[test]
fn test_static_context_errors() {
    let reports = compile_expect_error(
        "class A { int x; public static void main(String[] args) { int y; y = x; this.foo(); } }",
    );
    assert!(reports.iter().any(|r| r.message.contains("static context")));
    assert!(reports.iter().any(|r| r.message.contains("this")));
}

#[test]
fn test_wrong_argument_count() {
    let reports = compile_expect_error(
        "class A { public int g(int a) { return a; } public int f() { return this.g(1, 2); } }",
    );
    assert!(reports.iter().any(|r| r.message == "Wrong number of arguments for method 'g'"));
}

#[test]
fn test_return_in_main_is_error() {
    let reports = compile_expect_error(
        "class A { public static void main(String[] args) { return; } }",
    );
    assert_eq!(reports.len(), 1);
}

#[test]
fn test_lexer_and_parser_errors() {
    let compiler = Compiler::default();
    assert!(matches!(compiler.compile("class A { # }"), Err(JmmError::Lexer { .. })));
    assert!(matches!(
        compiler.compile("class A { public int f() { return 1 } }"),
        Err(JmmError::Parser { .. })
    ));
}
