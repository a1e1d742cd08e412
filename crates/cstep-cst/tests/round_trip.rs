//! Round-trip and structural checks over a corpus of C programs.

use rayon::prelude::*;

use cstep_cparse::parse_translation_unit;
use cstep_cst::{check_round_trip, SourceTree, SourceValue};

const CORPUS: &[&str] = &[
    "",
    "int main(void) { return 0; }\n",
    "#include <stdio.h>\n\nint main() {\n    printf(\"hello, world\\n\");\n    return 0;\n}\n",
    r#"/* factorial */
#define N 5
int fact(int n) {
    if (n <= 1)
        return 1;   // base case
    return n * fact(n - 1);
}

int main(void) {
    int i, total = 0;
    for (i = 0; i < N; i++) {
        total += fact(i);
    }
    return total;
}
"#,
    r#"typedef struct point {
    int x;
    int y;
} point_t;

static int origin_distance(const point_t *p) {
    return p->x * p->x + p->y * p->y;
}

int main(void) {
    point_t pts[3] = {{1, 2}, {3, 4}, {5, 6}};
    int best = -1;
    unsigned long n = sizeof(pts) / sizeof(pts[0]);
    for (unsigned long k = 0; k < n; ++k) {
        int d = origin_distance(&pts[k]);
        best = d > best ? d : best;
    }
    return best;
}
"#,
    r#"enum mode { IDLE, RUN = 4, STOP };

int step(enum mode m, int value) {
    switch (m) {
    case IDLE:
        break;
    case RUN:
        value <<= 1;
        /* fall through */
    default:
        value--;
    }
    do {
        value /= 2;
    } while (value > 10);
    while (value < 0) value += 3;
    return value;
}
"#,
    "char *greet(char *out) {\n\tout[0] = 'h'; out[1] = '\\0';\n\treturn out;\n}\n",
    "double avg(int *xs, int n) { double s = 0.0; int i = 0; while (i < n) s += xs[i++]; return n ? s / n : 0.0; }",
    "int counter;\nvoid bump(void) { counter = counter + 1; }\nint main(void) { bump(); bump(); return counter; }\n",
    "int f(int a) {\r\n  return a;\r\n}\r\n",
];

fn build(source: &str) -> SourceTree {
    let parse = parse_translation_unit(source).unwrap();
    SourceTree::build(source, parse).unwrap()
}

#[test]
fn every_program_round_trips() {
    CORPUS.par_iter().for_each(|source| {
        let tree = build(source);
        assert_eq!(tree.stringify(tree.root()), *source);
        check_round_trip(&tree).unwrap();
    });
}

#[test]
fn every_node_reproduces_its_span() {
    for source in CORPUS {
        let tree = build(source);
        for node in tree.original_nodes() {
            assert_eq!(
                Some(tree.stringify(node).as_str()),
                tree.source_text(node),
                "node {} ({})",
                tree.node_id(node),
                tree.kind_name(node)
            );
        }
    }
}

#[test]
fn token_ids_are_unique_and_ordered() {
    for source in CORPUS {
        let tree = build(source);
        let mut tokens: Vec<_> = tree
            .original_nodes()
            .flat_map(|n| tree.tokens(n).map(|t| (t.span.start, t.id)).collect::<Vec<_>>())
            .collect();
        tokens.sort();
        for pair in tokens.windows(2) {
            assert_ne!(pair[0].1, pair[1].1);
            assert!(pair[0].0 < pair[1].0);
        }
    }
}

#[test]
fn text_gaps_are_never_adjacent() {
    for source in CORPUS {
        let tree = build(source);
        for node in tree.original_nodes() {
            let values = &tree.node(node).values;
            for pair in values.windows(2) {
                let both_text = matches!(pair, [SourceValue::Text(_), SourceValue::Text(_)]);
                assert!(!both_text, "adjacent gaps in {}", tree.kind_name(node));
            }
        }
    }
}

#[test]
fn builds_are_reproducible() {
    let source = CORPUS[4];
    let first = build(source);
    let second = build(source);
    let ids = |tree: &SourceTree| -> Vec<_> { tree.original_nodes().map(|h| tree.node_id(h)).collect() };
    assert_eq!(ids(&first), ids(&second));
}
