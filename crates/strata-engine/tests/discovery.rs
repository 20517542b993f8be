use pretty_assertions::assert_eq;
use rstest::rstest;
use strata_engine::{
    Metadata, NodeId, SectionKey, SectionTree, StyledText, decode_path, discover, encode_path,
};
use strata_syntax::TextFormat;

fn run(input: &str, format: TextFormat) -> Metadata {
    let mut text = StyledText::new(input);
    discover(&mut text).with_text_format(format).perform()
}

fn outline(meta: &Metadata) -> String {
    let Some(tree) = meta.tree() else {
        return String::new();
    };
    let mut out = String::new();
    for id in tree.iter_depth_first(tree.root()).skip(1) {
        let node = tree.node(id);
        let depth = tree.path_of(id).len();
        out.push_str(&format!(
            "{}{} [{}..{}) line {}\n",
            "  ".repeat(depth - 1),
            node.key().map(ToString::to_string).unwrap_or_default(),
            node.start,
            node.stop,
            node.line_number,
        ));
    }
    out
}

fn keys(tree: &SectionTree, id: NodeId) -> Vec<String> {
    tree.node(id)
        .children()
        .iter()
        .filter_map(|child| tree.node(*child).key().map(ToString::to_string))
        .collect()
}

const SAMPLES: &[(&str, TextFormat)] = &[
    ("# A\n## B\n## C\n# D\n", TextFormat::Markdown),
    ("{a: 1, b: {c: 2}}", TextFormat::Json),
    ("{a: [1, (2, 3}, b: <x>y</x>}", TextFormat::Unknown),
    ("<root>\n  <item>1</item>\n  <item>2</item>\n</root>\n", TextFormat::Xml),
    ("# Notes\n\n{\n  \"k\": [1,\n    2]\n}\n\n# More\n(x, y)\n", TextFormat::Unknown),
    ("--- a/f\n+++ b/f\n@@ -1 +1 @@\n-a\n+b\n", TextFormat::Diff),
];

#[test]
fn trees_are_well_formed() {
    for (input, format) in SAMPLES {
        let meta = run(input, *format);
        let Some(tree) = meta.tree() else {
            continue;
        };
        assert!(tree.node(tree.root()).parent().is_none());

        for id in tree.iter_depth_first(tree.root()) {
            let node = tree.node(id);
            assert!(node.start <= node.stop, "{input:?}: {node:?}");
            for child in node.children() {
                let child_node = tree.node(*child);
                assert_eq!(child_node.parent(), Some(id));
                assert!(
                    node.span().encloses(child_node.span()),
                    "{input:?}: {child_node:?} escapes {node:?}"
                );
            }
            for (_, named) in node.named_children() {
                assert!(node.children().contains(&named));
            }
        }
        for iv in meta.intervals() {
            assert!(iv.start <= iv.stop);
        }
    }
}

#[test]
fn every_reachable_path_round_trips() {
    for (input, format) in SAMPLES {
        let meta = run(input, *format);
        let Some(tree) = meta.tree() else {
            continue;
        };
        for id in tree.iter_depth_first(tree.root()) {
            let path = tree.path_of(id);
            let encoded = encode_path(&path);
            assert_eq!(decode_path(&encoded), Ok(path.clone()));
            assert!(meta.lookup_path(&path).is_some(), "{encoded}");
        }
    }
}

#[test]
fn discovery_is_deterministic() {
    for (input, format) in SAMPLES {
        assert_eq!(run(input, *format), run(input, *format));
    }
}

#[test]
fn heading_nesting() {
    let meta = run("# A\n## B\n## C\n# D\n", TextFormat::Markdown);
    insta::assert_snapshot!(outline(&meta), @r"
    A [0..14) line 0
      B [4..9) line 1
      C [9..14) line 2
    D [14..18) line 3
    ");
}

#[test]
fn quoted_headings_are_ignored() {
    let meta = run("# Real\n\n```\n# Fake\n```\n\n> # Quoted\n", TextFormat::Markdown);
    let tree = meta.tree().unwrap();
    assert_eq!(keys(tree, tree.root()), vec!["Real"]);
    assert!(meta.lookup_path(&["Fake".into()]).is_none());
    assert!(meta.lookup_path(&["Real".into(), "Quoted".into()]).is_none());
}

#[test]
fn brace_nesting() {
    let meta = run("{a: 1, b: {c: 2}}", TextFormat::Json);
    let tree = meta.tree().unwrap();
    let root = tree.root();

    assert_eq!(keys(tree, root), vec!["a", "b"]);
    let b = tree.lookup_child(root, &"b".into()).unwrap();
    assert_eq!(keys(tree, b), vec!["c"]);
}

#[test]
fn json_outline() {
    let input = "{\n  \"name\": \"strata\",\n  \"tags\": [\"a\", \"b\"],\n  \"deps\": {\n    \"log\": \"0.4\"\n  }\n}";
    let meta = run(input, TextFormat::Json);
    insta::assert_snapshot!(outline(&meta), @r"
    name [4..20) line 1
    tags [32..42) line 2
    deps [54..76) line 3
      log [60..72) line 4
    ");
}

#[test]
fn diff_outline() {
    let input = "--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1,2 +1,2 @@ fn main\n-old\n+new\n";
    let meta = run(input, TextFormat::Diff);
    insta::assert_snapshot!(outline(&meta), @r"
    src/lib.rs [23..68) line 1
      @@ -1,2 +1,2 @@ fn main [34..68) line 2
    ");
}

#[test]
fn garbage_is_bounded() {
    let mut input = "\u{0} ".repeat(100_000);
    input.push_str("{\"late\": 1}");

    let meta = run(&input, TextFormat::Json);
    assert!(meta.tree().is_none());
    assert!(meta.intervals().is_empty());
}

#[rstest]
#[case::top_level("(just one line, no newline)")]
#[case::inside_a_list("[\n(just one line, no newline)\n]")]
fn single_line_groups_collapse(#[case] input: &str) {
    let meta = run(input, TextFormat::Unknown);
    let tree = meta.tree().unwrap();

    let group = tree
        .iter_depth_first(tree.root())
        .find(|id| tree.node(*id).start == input.find('(').unwrap())
        .unwrap();
    assert!(tree.node(group).is_leaf());
    assert_eq!(tree.node(group).named_children().count(), 0);
}

#[test]
fn multi_line_groups_keep_their_children() {
    let meta = run("[\n(a,\n b)\n]", TextFormat::Unknown);
    let tree = meta.tree().unwrap();
    let paren = tree.node(tree.root()).children()[0];
    assert_eq!(keys(tree, paren), vec!["0", "1"]);
}

#[test]
fn lone_group_becomes_the_root() {
    let input = "{\n  \"a\": 1\n}";
    let meta = run(input, TextFormat::Json);
    let root = meta.root().unwrap();

    assert_eq!((root.start, root.stop), (0, input.len()));
    assert!(root.key().is_none());
    assert!(meta.lookup_path(&["a".into()]).is_some());
    assert_eq!(meta.intervals().len(), 1);
}

#[test]
fn intervals_mirror_the_tree() {
    for (input, format) in SAMPLES {
        let meta = run(input, *format);
        let Some(tree) = meta.tree() else {
            assert!(meta.intervals().is_empty());
            continue;
        };
        let from_tree: Vec<SectionKey> = tree
            .iter_depth_first(tree.root())
            .filter_map(|id| tree.node(id).key().cloned())
            .collect();
        let listed: Vec<SectionKey> = meta.intervals().iter().map(|iv| iv.key.clone()).collect();
        assert_eq!(listed, from_tree);
    }
}

#[test]
fn brace_sections_graft_under_headings() {
    let input = "# Notes\n\n{\n  \"k\": [1,\n    2]\n}\n\n# More\n(x, y)\n";
    let meta = run(input, TextFormat::Unknown);
    let tree = meta.tree().unwrap();
    let root = tree.root();

    assert_eq!(keys(tree, root), vec!["Notes", "More"]);
    let notes = tree.lookup_child(root, &"Notes".into()).unwrap();
    assert_eq!(keys(tree, notes), vec!["0"]);
    assert!(meta.lookup_path(&["Notes".into(), 0.into(), "k".into()]).is_some());
    let more = tree.lookup_child(root, &"More".into()).unwrap();
    assert_eq!(keys(tree, more), vec!["0"]);
}
