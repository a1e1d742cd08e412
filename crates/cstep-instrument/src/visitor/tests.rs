use super::*;
use crate::event::NotificationRecord;
use crate::options::InstrumentOptions;
use crate::pass::Pass;

/// Hooks without prelude or type report, so outputs stay short.
fn bare() -> InstrumentOptions {
    InstrumentOptions {
        emit_prelude: false,
        emit_type_events: false,
        ..InstrumentOptions::default()
    }
}

fn run_with(source: &str, options: InstrumentOptions) -> (String, Vec<NotificationRecord>) {
    let parse = cstep_cparse::parse_translation_unit(source).unwrap();
    let mut pass = Pass::new(source, parse, options).unwrap();
    let plan = pass.plan().unwrap();
    let root = pass.apply(&plan).unwrap();
    let output = pass.tree.stringify(root);
    (output, pass.state.events.records().unwrap())
}

fn run(source: &str) -> (String, Vec<NotificationRecord>) {
    run_with(source, bare())
}

fn actions(records: &[NotificationRecord]) -> Vec<Action> {
    records.iter().map(|r| r.action).collect()
}

mod expressions {
    use super::*;

    #[test]
    fn returned_parameter() {
        let (output, records) = run("int f(int a) { return a; }");
        assert_eq!(
            output,
            "int f(int a) { int temp0; int temp1; return (notify_1(1, &a), temp1 = (temp0 = a, notify_1(2, &temp0), temp0), notify_1(3, &temp1), temp1); }"
        );
        assert_eq!(
            actions(&records),
            vec![Action::Invocation, Action::Par, Action::Stat, Action::Eval, Action::Return]
        );
    }

    #[test]
    fn void_call_reports_only_the_statement() {
        let (output, records) = run("void g(void); void f(void) { g(); }");
        assert_eq!(output, "void g(void); void f(void) { (notify_0(1), g()); }");
        assert_eq!(actions(&records), vec![Action::Invocation, Action::Stat]);
    }

    #[test]
    fn call_arguments_are_captured_but_constants_are_not() {
        let (output, records) = run("int g(int, int); void f(int x) { g(x, 2); }");
        assert!(output.contains("g((temp0 = x, notify_1(2, &temp0), temp0), 2)"), "{}", output);
        let evals = records.iter().filter(|r| r.action == Action::Eval).count();
        // `x` and the call itself
        assert_eq!(evals, 2);
    }

    #[test]
    fn assignment_reports_value_and_store() {
        let (_, records) = run("void f(void) { int x; x = 3; }");
        let assign = records.iter().find(|r| r.action == Action::Assign).unwrap();
        assert_eq!(assign.identifier.as_deref(), Some("x"));
        assert_eq!(assign.data_type.as_deref(), Some("int"));
        let eval = records.iter().find(|r| r.action == Action::Eval).unwrap();
        assert_eq!(eval.notify_id, assign.notify_id);
    }

    #[test]
    fn assignment_target_is_not_captured() {
        let (output, _) = run("void f(int *p, int i) { p[i] = 1; }");
        assert!(output.contains("[(temp"), "index is captured: {}", output);
        assert!(!output.contains("= p[i]"), "lvalue stays in place: {}", output);
    }

    #[test]
    fn increment_reports_the_variable() {
        let (_, records) = run("void f(void) { int i = 0; i++; }");
        let assign = records.iter().find(|r| r.action == Action::Assign).unwrap();
        assert_eq!(assign.identifier.as_deref(), Some("i"));
    }

    #[test]
    fn impure_targets_skip_the_store() {
        let (_, records) = run("int *g(void); void f(void) { *g() = 1; }");
        assert!(!records.iter().any(|r| r.action == Action::Assign));
    }

    #[test]
    fn string_literals_are_left_alone() {
        let (output, _) = run("int puts(const char *); void f(void) { puts(\"hi\"); }");
        assert!(output.contains("puts(\"hi\")"), "{}", output);
    }
}

mod statements {
    use super::*;

    #[test]
    fn jump_becomes_a_block() {
        let (output, _) = run("void f(void) { while (1) break; }");
        assert!(output.contains("{ notify_0("), "{}", output);
        assert!(output.contains("break; }"), "{}", output);
    }

    #[test]
    fn jump_before_else_loses_its_semicolon() {
        let (output, _) = run("void f(int x) { while (x) { if (x) break; else x--; } }");
        assert!(output.contains("break; } else"), "{}", output);
        assert!(!output.contains("break; }; else"), "{}", output);
    }

    #[test]
    fn every_statement_reports_stat() {
        let (_, records) = run("void f(int x) { x = 1; x = 2; if (x) x = 3; }");
        let stats = records.iter().filter(|r| r.action == Action::Stat).count();
        assert_eq!(stats, 4);
    }

    #[test]
    fn for_header_parts_are_reported() {
        let (output, records) = run("void f(void) { int i; for (i = 0; i < 3; i++) ; }");
        let stats = records.iter().filter(|r| r.action == Action::Stat).count();
        // declaration, init, condition, increment
        assert_eq!(stats, 4);
        assert!(output.starts_with("void f(void) { int temp"), "{}", output);
    }

    #[test]
    fn for_declaration_is_scoped_to_the_loop() {
        let source = "void f(void) { for (int i = 0; i < 3; i++) ; }";
        let (_, records) = run(source);
        let decl = records.iter().find(|r| r.action == Action::Decl).unwrap();
        let scope = decl.scope.unwrap();
        assert_eq!(&source[scope.start_index..scope.end_index], "for (int i = 0; i < 3; i++) ;");
    }

    #[test]
    fn case_values_stay_constant() {
        let (output, _) = run("void f(int x) { switch (x) { case 1: x = 2; break; default: break; } }");
        assert!(output.contains("case 1:"), "{}", output);
    }

    #[test]
    fn void_return_has_no_return_event() {
        let (_, records) = run("void f(void) { return; }");
        assert!(!records.iter().any(|r| r.action == Action::Return));
    }
}

mod declarations {
    use super::*;

    #[test]
    fn local_declaration_reads_back() {
        let (output, records) = run("void f(void) { int a = 5; }");
        assert_eq!(output, "void f(void) { int a = (notify_0(1), 5), temp0 = (notify_1(2, &a), a); }");
        assert_eq!(actions(&records), vec![Action::Invocation, Action::Stat, Action::Decl]);
    }

    #[test]
    fn pointer_read_back_uses_the_declarator() {
        let (output, _) = run("void f(int *q) { int *p = q; }");
        assert!(output.contains(", *temp"), "{}", output);
    }

    #[test]
    fn array_initializer_is_not_wrapped() {
        let (output, records) = run("void f(int x) { int a[2] = {x, 1}; }");
        assert!(output.contains("{(temp0 = x, "), "{}", output);
        assert!(records.iter().any(|r| r.action == Action::Decl));
    }

    #[test]
    fn static_locals_pass_through() {
        let source = "void f(void) { static int n = 0; n++; }";
        let (output, records) = run(source);
        assert!(output.contains("static int n = 0;"), "{}", output);
        assert!(!records.iter().any(|r| r.action == Action::Decl));
    }

    #[test]
    fn globals_and_prototypes_pass_through() {
        let (output, records) = run("int g = 1; int h(int);");
        assert_eq!(output, "int g = 1; int h(int);");
        assert!(records.is_empty());
    }

    #[test]
    fn parameters_are_scoped_to_the_body() {
        let source = "int f(int a, int b) { return a; }";
        let (_, records) = run(source);
        let pars: Vec<_> = records.iter().filter(|r| r.action == Action::Par).collect();
        assert_eq!(pars.len(), 2);
        let scope = pars[0].scope.unwrap();
        assert_eq!(&source[scope.start_index..scope.end_index], "{ return a; }");
    }

    #[test]
    fn entry_events_before_a_loop_get_their_own_call() {
        let (output, records) = run("void f(int n) { while (n) n--; }");
        let invocation = records.iter().find(|r| r.action == Action::Invocation).unwrap();
        let stat = records.iter().find(|r| r.action == Action::Stat).unwrap();
        assert!(invocation.notify_id < stat.notify_id);
        assert!(output.starts_with("void f(int n) { int temp0;"), "{}", output);
    }

    #[test]
    fn main_reports_types() {
        let options = InstrumentOptions {
            emit_prelude: false,
            ..InstrumentOptions::default()
        };
        let (output, records) = run_with("int main(void) { int a = 1; return a; }", options);
        assert!(output.contains("= sizeof(int);"), "{}", output);
        let types: Vec<_> = records.iter().filter(|r| r.action == Action::Type).collect();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].identifier.as_deref(), Some("int"));
        assert_eq!(types[0].node_id, None);
    }

    #[test]
    fn prelude_declares_hooks() {
        let (output, _) = run_with("int x;", InstrumentOptions::default());
        assert!(output.starts_with("void notify_0(int ref);\n"), "{}", output);
        assert!(output.ends_with("int x;"));
    }
}
