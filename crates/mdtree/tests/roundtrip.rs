use mdtree::{serialize, Deserialized, Error, MarkdownDeserializer, MarkdownSerializer, Node};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn parse(markdown: &str) -> Node {
    init();
    MarkdownDeserializer::new()
        .parse(markdown)
        .unwrap()
        .expect("non-empty document")
        .document
}

fn round_trip(markdown: &str) -> String {
    serialize(&parse(markdown)).unwrap()
}

/// Serializing, parsing and serializing again must not change the output
fn assert_stable(markdown: &str) -> String {
    let first = round_trip(markdown);
    let second = round_trip(&first);
    assert_eq!(first, second, "unstable round trip for {markdown:?}");
    first
}

#[test]
fn bold_and_emphasis_round_trip() {
    let doc = parse("**bold** and _em_");
    let p = &doc.content[0];
    assert_eq!(p.content.len(), 3);
    assert_eq!(p.content[0].text_str(), "bold");
    assert_eq!(p.content[0].marks[0].type_name, "bold");
    assert_eq!(p.content[1].text_str(), " and ");
    assert!(p.content[1].marks.is_empty());
    assert_eq!(p.content[2].text_str(), "em");
    assert_eq!(p.content[2].marks[0].type_name, "italic");

    assert_eq!(serialize(&doc).unwrap(), "**bold** and _em_");
}

#[test]
fn script_is_stripped() {
    let doc = parse("Hello <script>alert('x')</script> world");
    assert_eq!(doc.text_content(), "Hello world");
    assert!(doc.descendants().all(|n| n.type_name != "script"));
}

#[test]
fn markdown_that_is_already_canonical_survives() {
    for input in [
        "# Title\n\nSome _text_ with `code`.",
        "- one\n- two\n  - nested",
        "- a\n\n- b",
        " 8. a\n 9. b\n10. c",
        "> quoted\n>\n> more",
        "```rust\nfn main() {}\n```",
        "| a | b |\n| --- | --- |\n| 1 | 2 |",
        "[site](https://x.io \"T\") and <https://y.io>",
        "a\\\nb",
        "![alt](pic.png)",
        "~~gone~~",
        "a\n\n---\n\nb",
        "1\\. not a list \\*x\\*",
    ] {
        assert_eq!(assert_stable(input), input);
    }
}

#[test]
fn ordered_list_markers_realigned() {
    assert_eq!(assert_stable("8. a\n9. b\n10. c"), " 8. a\n 9. b\n10. c");
}

#[test]
fn multiline_quote_becomes_prefixed_quote() {
    assert_eq!(assert_stable(">>>\nquoted\n>>>"), "> quoted");
}

#[test]
fn emphasis_styles_normalized() {
    assert_eq!(assert_stable("*em* __strong__"), "_em_ **strong**");
}

#[test]
fn source_survives_sanitization() {
    init();
    let source = "<img src=x onerror=alert(1)> text\n";
    let parsed = MarkdownDeserializer::new().parse(source).unwrap().unwrap();
    assert_eq!(parsed.source.as_deref(), Some(source));
    assert!(parsed
        .document
        .descendants()
        .all(|n| n.attrs.keys().all(|k| k != "onerror")));
}

#[test]
fn unknown_node_fails_serialization() {
    let parsed = Deserialized {
        document: Node::with_content("doc", vec![Node::new("mystery")]),
        source: None,
    };
    let err = parsed.to_markdown(&MarkdownSerializer::new()).unwrap_err();
    assert!(matches!(err, Error::Core(_)));
}

#[test]
fn pipe_in_table_code_span_survives() {
    let input = "| h |\n| --- |\n| `x\\|y` |";
    assert_eq!(assert_stable(input), input);

    let doc = parse(input);
    let code = doc
        .descendants()
        .find(|n| n.marks.iter().any(|m| m.type_name == "code"))
        .expect("code run");
    assert_eq!(code.text_str(), "x|y");
}

#[test]
fn consecutive_hard_breaks_survive() {
    let input = "x\\\n\\\ny";
    assert_eq!(assert_stable(input), input);

    let doc = parse(input);
    let kinds: Vec<&str> = doc.content[0]
        .content
        .iter()
        .map(|n| n.type_name.as_str())
        .collect();
    assert_eq!(kinds, ["text", "hard_break", "hard_break", "text"]);
}

#[test]
fn link_with_space_in_href_keeps_link() {
    let output = assert_stable("[https://x.io/a b](<https://x.io/a b>)");
    assert!(output.starts_with("[https://x.io/a b]("));
    assert!(parse(&output)
        .descendants()
        .any(|n| n.marks.iter().any(|m| m.type_name == "link")));
}

#[test]
fn bare_ordered_marker_stays_text() {
    assert_eq!(assert_stable("1\\."), "1\\.");
    assert_eq!(parse("1\\.").content[0].type_name, "paragraph");
}
