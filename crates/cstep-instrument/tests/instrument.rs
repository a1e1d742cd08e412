//! End-to-end checks of instrumented programs and their metadata.

use std::collections::BTreeMap;

use regex::Regex;

use cstep_cparse::ParseTree;
use cstep_instrument::{
    instrument, instrument_source, Action, InstrumentError, InstrumentOptions, Instrumented, NotificationRecord,
};

const CORPUS: &[&str] = &[
    "int main(){ int a = 5; return a + 1; }\n",
    "void foo(void) {}\nint main(void) { foo(); return 0; }\n",
    r#"int main(void) {
    int i, total = 0;
    for (i = 0; i < 3; i++) {
        int t = i * 2;
        total += t;
    }
    return total;
}
"#,
    r#"struct point { int x; int y; };

int dot(const struct point *a, const struct point *b) {
    return a->x * b->x + a->y * b->y;
}

int main(void) {
    struct point p = {1, 2};
    struct point q;
    q.x = 3;
    q.y = p.x > 0 ? 4 : -4;
    int d = dot(&p, &q);
    if (d > 10)
        d = 10;
    else if (d < 0)
        return 1;
    return d;
}
"#,
    r#"int fib(int n) {
    int prev = 0, cur = 1;
    while (n-- > 0) {
        int next = prev + cur;
        prev = cur;
        cur = next;
        if (cur > 1000) break; else continue;
    }
    return prev;
}

int main(void) {
    int values[4];
    int k = 0;
    do {
        values[k] = fib(k);
        k++;
    } while (k < 4);
    switch (values[3]) {
    case 2:
        k = 0;
        break;
    default:
        k = 1;
    }
    return k;
}
"#,
];

fn bare() -> InstrumentOptions {
    InstrumentOptions {
        emit_prelude: false,
        emit_type_events: false,
        ..InstrumentOptions::default()
    }
}

fn run(source: &str) -> Instrumented {
    instrument_source("test.c", source, &bare()).unwrap()
}

fn calls(output: &str) -> Vec<(usize, u32, usize)> {
    let re = Regex::new(r"notify_(\d+)\((\d+)((?:, &[^,)]+)*)\)").unwrap();
    re.captures_iter(output)
        .map(|c| {
            let arity = c[1].parse().unwrap();
            let reference = c[2].parse().unwrap();
            let parameters = c[3].matches(", &").count();
            (arity, reference, parameters)
        })
        .collect()
}

fn parameters(record: &NotificationRecord) -> usize {
    match record.action {
        Action::Stat | Action::Invocation => 0,
        _ => 1,
    }
}

fn text<'a>(source: &'a str, result: &Instrumented, record: &NotificationRecord) -> &'a str {
    let node = result.metadata.node(record.node_id.unwrap()).unwrap();
    &source[node.range.start_index..node.range.end_index]
}

#[test]
fn declared_then_evaluated_then_returned() {
    let source = CORPUS[0];
    let result = run(source);
    let events: Vec<_> = result
        .metadata
        .notifications
        .iter()
        .filter(|r| !matches!(r.action, Action::Stat | Action::Invocation))
        .collect();
    let actions: Vec<_> = events.iter().map(|r| r.action).collect();
    assert_eq!(actions, vec![Action::Decl, Action::Eval, Action::Eval, Action::Return]);
    assert_eq!(events[0].identifier.as_deref(), Some("a"));
    assert_eq!(text(source, &result, events[1]), "a");
    assert_eq!(text(source, &result, events[2]), "a + 1");
    assert_eq!(events[3].data_type.as_deref(), Some("int"));
}

#[test]
fn void_call_is_a_statement_without_a_value() {
    let source = CORPUS[1];
    let result = run(source);
    let call = result.metadata.nodes.iter().find(|n| n.kind == "CallExpr").unwrap();
    let about_call: Vec<_> = result
        .metadata
        .notifications
        .iter()
        .filter(|r| r.node_id == Some(call.id))
        .map(|r| r.action)
        .collect();
    assert_eq!(about_call, vec![Action::Stat]);
}

#[test]
fn loop_increment_and_body_declaration() {
    let source = CORPUS[2];
    let result = run(source);
    let records = &result.metadata.notifications;
    let increment = records
        .iter()
        .find(|r| r.action == Action::Assign && r.node_id.is_some() && text(source, &result, r) == "i++")
        .unwrap();
    let eval = records
        .iter()
        .find(|r| r.action == Action::Eval && r.node_id == increment.node_id)
        .unwrap();
    assert_eq!(eval.notify_id, increment.notify_id);
    assert_eq!(increment.identifier.as_deref(), Some("i"));

    let t = records
        .iter()
        .find(|r| r.action == Action::Decl && r.identifier.as_deref() == Some("t"))
        .unwrap();
    let scope = t.scope.unwrap();
    let body = &source[scope.start_index..scope.end_index];
    assert!(body.starts_with("{\n        int t"), "{}", body);
    assert!(body.ends_with('}'));
}

#[test]
fn calls_match_their_events() {
    for source in CORPUS {
        let result = run(source);
        let mut expected: BTreeMap<u32, usize> = BTreeMap::new();
        for record in &result.metadata.notifications {
            *expected.entry(record.notify_id).or_default() += parameters(record);
        }
        let found = calls(&result.source);
        assert_eq!(found.len(), expected.len(), "one call per reference in {}", result.source);
        for (arity, reference, count) in found {
            assert_eq!(arity, count, "arity of reference {}", reference);
            assert_eq!(expected.get(&reference), Some(&count), "parameters of reference {}", reference);
        }
    }
}

#[test]
fn references_increase_through_the_output() {
    for source in CORPUS {
        let result = run(source);
        let references: Vec<u32> = calls(&result.source).into_iter().map(|(_, r, _)| r).collect();
        assert!(
            references.windows(2).all(|w| w[0] < w[1]),
            "references out of order: {:?}",
            references
        );
        assert_eq!(references.first(), Some(&1));
    }
}

#[test]
fn output_parses_again() {
    for source in CORPUS {
        let options = InstrumentOptions::default();
        let result = instrument_source("test.c", source, &options).unwrap();
        cstep_cparse::parse_translation_unit(&result.source)
            .unwrap_or_else(|e| panic!("{}\n{}", e, result.source));
    }
}

#[test]
fn shadowed_names_resolve_to_the_innermost_scope() {
    let source = "int main(void) {\n    int x = 1;\n    {\n        int x = 2;\n        x = 3;\n    }\n    return x;\n}\n";
    let result = run(source);
    let records = &result.metadata.notifications;
    let decls: Vec<_> = records
        .iter()
        .filter(|r| r.action == Action::Decl && r.identifier.as_deref() == Some("x"))
        .collect();
    assert_eq!(decls.len(), 2);
    let assign = records.iter().find(|r| r.action == Action::Assign).unwrap();
    let at = result.metadata.node(assign.node_id.unwrap()).unwrap().range.start_index;
    let innermost = decls
        .iter()
        .filter(|d| {
            let scope = d.scope.unwrap();
            scope.start_index <= at && at < scope.end_index
        })
        .min_by_key(|d| {
            let scope = d.scope.unwrap();
            scope.end_index - scope.start_index
        })
        .unwrap();
    let declared = result.metadata.node(innermost.node_id.unwrap()).unwrap();
    assert_eq!(&source[declared.range.start_index..declared.range.end_index], "int x = 2");
}

#[test]
fn passes_are_deterministic() {
    let a = run(CORPUS[4]);
    let b = run(CORPUS[4]);
    assert_eq!(a.source, b.source);
    assert_eq!(a.metadata, b.metadata);
}

#[test]
fn narrow_hooks_are_rejected() {
    let options = InstrumentOptions {
        max_notify_arity: 1,
        ..bare()
    };
    let err = instrument_source("test.c", "int f(int a, int b) { return a + b; }", &options).unwrap_err();
    assert!(matches!(
        err,
        cstep_instrument::InstrumentError::TooManyNotifyParameters { count: 2, max: 1 }
    ));
}

#[test]
fn syntax_errors_fail_the_build() {
    let err = instrument_source("test.c", "int main( { return 0; }", &bare()).unwrap_err();
    assert!(err.is_build_failure());
}

#[test]
fn loop_counter_is_scoped_to_the_function_body() {
    let source = "int main(){ int i; for(i=0;i<3;i++) ; }";
    let result = run(source);
    let records = &result.metadata.notifications;
    let decl = records
        .iter()
        .find(|r| r.action == Action::Decl && r.identifier.as_deref() == Some("i"))
        .unwrap();
    let scope = decl.scope.unwrap();
    assert_eq!(&source[scope.start_index..scope.end_index], "{ int i; for(i=0;i<3;i++) ; }");

    let assigned: Vec<_> = records
        .iter()
        .filter(|r| r.action == Action::Assign)
        .map(|r| text(source, &result, r))
        .collect();
    assert_eq!(assigned, vec!["i=0", "i++"]);
    cstep_cparse::parse_translation_unit(&result.source).unwrap();
}

#[test]
fn untyped_reference_aborts_the_file() {
    let source = "int main(void) { int a = 1; return a; }\n";
    let parse = cstep_cparse::parse_translation_unit(source).unwrap();
    let mut json: serde_json::Value = serde_json::from_str(&parse.to_json().unwrap()).unwrap();
    let mut blanked = 0;
    for node in json["nodes"].as_array_mut().unwrap() {
        if node["kind"] == "DeclRefExpr" {
            node.as_object_mut().unwrap().remove("type_spelling");
            blanked += 1;
        }
    }
    assert_eq!(blanked, 1);
    let untyped = ParseTree::from_json(&json.to_string()).unwrap();

    let result = instrument("test.c", source, untyped, &bare());
    match result {
        Err(InstrumentError::MissingType { kind, .. }) => assert_eq!(kind, "DeclRefExpr"),
        Err(other) => panic!("unexpected error {}", other),
        Ok(output) => panic!("instrumented without a type:\n{}", output.source),
    }
}
