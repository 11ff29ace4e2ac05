//! Property tests for traversal balance and alternative selection.

use std::collections::HashMap;

use mimewalk::visitor::MimePrinter;
use mimewalk::{Headers, Part, Result, Visitor, content_type_of, select_preferred, walk};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Tree {
    Leaf(&'static str),
    Container(&'static str, Vec<Tree>),
}

fn tree() -> impl Strategy<Value = Tree> {
    let leaf = prop_oneof![
        Just("text/plain"),
        Just("text/html"),
        Just("image/png"),
        Just("application/pdf"),
    ]
    .prop_map(Tree::Leaf);

    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            prop_oneof![Just("mixed"), Just("alternative"), Just("related")],
            prop::collection::vec(inner, 1..5),
        )
            .prop_map(|(sub_type, children)| Tree::Container(sub_type, children))
    })
}

/// Renders a tree as `(Content-Type value, body)` with a unique boundary per
/// container.
fn render(tree: &Tree, next_id: &mut usize) -> (String, String) {
    match tree {
        Tree::Leaf(media_type) => {
            *next_id += 1;
            ((*media_type).to_string(), format!("leaf {next_id}"))
        }
        Tree::Container(sub_type, children) => {
            *next_id += 1;
            let boundary = format!("bnd{next_id}");
            let mut body = String::from("preamble\r\n");
            for child in children {
                let (content_type, child_body) = render(child, next_id);
                body.push_str(&format!(
                    "--{boundary}\r\nContent-Type: {content_type}\r\n\r\n{child_body}\r\n"
                ));
            }
            body.push_str(&format!("--{boundary}--\r\n"));
            (format!("multipart/{sub_type}; boundary=\"{boundary}\""), body)
        }
    }
}

/// Expected `(boundary, child count)` of every container, and the expected
/// plain-sibling flag of every leaf in document order.
fn expectations(
    tree: &Tree,
    inherited: bool,
    next_id: &mut usize,
    containers: &mut HashMap<String, usize>,
    leaf_flags: &mut Vec<bool>,
) {
    *next_id += 1;
    match tree {
        Tree::Leaf(_) => leaf_flags.push(inherited),
        Tree::Container(sub_type, children) => {
            containers.insert(format!("bnd{next_id}"), children.len());
            let has_plain_child = children
                .iter()
                .any(|child| matches!(child, Tree::Leaf("text/plain")))
                || (inherited && *sub_type == "related");
            for child in children {
                expectations(child, has_plain_child, next_id, containers, leaf_flags);
            }
        }
    }
}

#[derive(Default)]
struct Recorder {
    boundaries: HashMap<String, Vec<bool>>,
    leaf_flags: Vec<bool>,
}

impl Visitor for Recorder {
    fn accept(
        &mut self,
        _part: &[u8],
        headers: &Headers,
        has_plain_sibling: bool,
        is_first: bool,
        is_last: bool,
    ) -> Result<()> {
        let content_type = content_type_of(headers)?;
        if !content_type.is_multipart() {
            self.leaf_flags.push(has_plain_sibling);
        } else if !is_first {
            let boundary = content_type.boundary().unwrap_or_default().to_string();
            self.boundaries.entry(boundary).or_default().push(is_last);
        }
        Ok(())
    }
}

fn headers_for(content_type: &str) -> Headers {
    let mut headers = Headers::new();
    headers.add("Content-Type", content_type);
    headers
}

proptest! {
    #[test]
    fn prop_boundary_events_match_children(shape in tree()) {
        let (content_type, body) = render(&shape, &mut 0);
        let mut containers = HashMap::new();
        let mut leaf_flags = Vec::new();
        expectations(&shape, false, &mut 0, &mut containers, &mut leaf_flags);

        let mut recorder = Recorder::default();
        walk(body.as_bytes(), &headers_for(&content_type), &mut recorder).unwrap();

        prop_assert_eq!(recorder.boundaries.len(), containers.len());
        for (boundary, children) in &containers {
            let flags = &recorder.boundaries[boundary];
            prop_assert_eq!(flags.len(), *children);
            prop_assert!(flags[..children - 1].iter().all(|last| !last));
            prop_assert!(flags[children - 1]);
        }
        prop_assert_eq!(recorder.leaf_flags, leaf_flags);
    }

    #[test]
    fn prop_printer_stack_balances(shape in tree()) {
        let (content_type, body) = render(&shape, &mut 0);
        let mut printer = MimePrinter::new();
        walk(body.as_bytes(), &headers_for(&content_type), &mut printer).unwrap();

        prop_assert_eq!(printer.depth(), 0);
        let transcript = printer.transcript();
        let mut containers = HashMap::new();
        expectations(&shape, false, &mut 0, &mut containers, &mut Vec::new());
        for (boundary, children) in &containers {
            let closing = format!("\n--{boundary}--\n");
            let delimiter = format!("\n--{boundary}\n");
            prop_assert_eq!(transcript.matches(closing.as_str()).count(), 1);
            prop_assert_eq!(transcript.matches(delimiter.as_str()).count(), *children);
        }
    }

    #[test]
    fn prop_alternative_prefers_multipart(order in Just(vec![
        "multipart/mixed; boundary=x",
        "text/html",
        "text/plain",
    ]).prop_shuffle()) {
        let children: Vec<Part> = order
            .iter()
            .map(|content_type| Part::new(headers_for(content_type), Vec::new()))
            .collect();
        let chosen = select_preferred(&children).unwrap();
        prop_assert!(chosen.content_type().unwrap().is_multipart());
    }

    #[test]
    fn prop_alternative_prefers_html(html_first in any::<bool>()) {
        let mut order = vec!["text/plain", "text/html"];
        if html_first {
            order.reverse();
        }
        let children: Vec<Part> = order
            .iter()
            .map(|content_type| Part::new(headers_for(content_type), Vec::new()))
            .collect();
        let chosen = select_preferred(&children).unwrap();
        prop_assert_eq!(chosen.content_type().unwrap().media_type(), "text/html");
    }
}
