use mdtree_core::{serialize, Node};
use proptest::prelude::*;

fn ordered_list(start: i64, count: usize) -> Node {
    let items = (0..count)
        .map(|i| {
            Node::with_content(
                "list_item",
                vec![Node::with_content("paragraph", vec![Node::text(&format!("item {i}"))])],
            )
        })
        .collect();
    Node::with_content(
        "doc",
        vec![Node::with_content("ordered_list", items).with_attr("start", start)],
    )
}

proptest! {
    #[test]
    fn ordered_markers_share_one_width(start in 0i64..100_000, count in 1usize..30) {
        let markdown = serialize(&ordered_list(start, count)).unwrap();
        let lines: Vec<&str> = markdown.lines().collect();
        prop_assert_eq!(lines.len(), count);

        let width = (start + count as i64 - 1).to_string().len();
        for (i, line) in lines.iter().enumerate() {
            let expected = format!("{:>width$}. item {i}", start + i as i64);
            prop_assert_eq!(*line, expected.as_str());
        }
    }

    #[test]
    fn plain_text_survives_without_markers(words in prop::collection::vec("[a-z]{1,8}", 1..12)) {
        let sentence = words.join(" ");
        let doc = Node::with_content(
            "doc",
            vec![Node::with_content("paragraph", vec![Node::text(&sentence)])],
        );
        prop_assert_eq!(serialize(&doc).unwrap(), sentence);
    }
}

#[test]
fn ordered_list_after_bullet_list_is_separated() {
    let bullet = Node::with_content(
        "bullet_list",
        vec![Node::with_content("list_item", vec![Node::with_content("paragraph", vec![Node::text("a")])])],
    );
    let mut list_doc = ordered_list(1, 1);
    let ordered = list_doc.content.remove(0);
    let doc = Node::with_content("doc", vec![bullet, ordered]);
    assert_eq!(serialize(&doc).unwrap(), "- a\n\n1. item 0");
}
