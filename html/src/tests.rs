use super::*;
use crate::attributes;
use pretty_assertions::assert_eq;

/// Compact rendering of a subtree, skipping whitespace-only text
fn outline(doc: &Document, id: NodeId) -> String {
    let node = doc.get(id).unwrap();
    match &node.node_type {
        DOMNodeType::Text(t) => format!("{:?}", t.trim()),
        DOMNodeType::Element(elt) => {
            let attrs: String = elt
                .attributes
                .iter()
                .map(|(k, v)| format!("[{}={}]", k, v))
                .collect();
            let children: Vec<String> = node
                .children
                .iter()
                .filter(|c| match &doc.get(**c).unwrap().node_type {
                    DOMNodeType::Text(t) => !t.trim().is_empty(),
                    DOMNodeType::Element(_) => true,
                })
                .map(|c| outline(doc, *c))
                .collect();
            format!("{}{}({})", elt.tag_name, attrs, children.join(" "))
        }
    }
}

#[test]
fn test_document() {
    let i = r#"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8"/>
        <title>The minimal, valid HTML5 document</title>
    </head>
    <body>
        <!-- User-visible content goes in the body -->
        <p>Some paragraph</p>
        Some untagged text
    </body>
</html>"#;
    let doc = parse(i).unwrap();
    let root = doc.root().unwrap();
    assert_eq!(
        outline(&doc, root),
        concat!(
            r#"html[lang=en](head(meta[charset=utf-8]() title("The minimal, valid HTML5 document")) "#,
            r#"body(p("Some paragraph") "Some untagged text"))"#
        )
    );
}

#[test]
fn test_node_parse() {
    let mut target = Document::new();
    let html = target.create_element("html", DOMAttributes::empty());
    let div = target.create_element("div", attributes!("class" => "nothing"));
    let h1 = target.create_element("h1", DOMAttributes::empty());
    target.append_child(html, div);
    target.append_child(div, h1);
    target.set_root(Some(html));
    assert_eq!(
        parse(r#"<html><div class=nothing><h1></h1></div></html>"#).unwrap(),
        target
    );

    let mut target = Document::new();
    let html = target.create_element("html", DOMAttributes::empty());
    let h1 = target.create_element("h1", DOMAttributes::empty());
    let text = target.create_text("Hello, world");
    target.append_child(html, h1);
    target.append_child(h1, text);
    target.set_root(Some(html));
    assert_eq!(parse(r#"<html><h1>Hello, world</h1></html>"#).unwrap(), target);
}

#[test]
fn test_void_elements() {
    let mut target = Document::new();
    let p = target.create_element("p", DOMAttributes::empty());
    let a = target.create_text("a");
    let br = target.create_element("br", DOMAttributes::empty());
    let b = target.create_text("b");
    let img = target.create_element("img", attributes!("src" => "x.png"));
    for child in [a, br, b, img] {
        target.append_child(p, child);
    }
    target.set_root(Some(p));
    assert_eq!(
        parse(r#"<p>a<br>b</br><img src="x.png"/></p>"#).unwrap(),
        target
    );
}

#[test]
fn test_raw_text_and_entities() {
    let doc = parse(r#"<div><script>if (a<b) { x = "&amp;"; }</script><a title="x &amp; y">&lt;tag&gt; &amp; more</a></div>"#).unwrap();
    assert_eq!(
        outline(&doc, doc.root().unwrap()),
        r#"div(script("if (a<b) { x = \"&amp;\"; }") a[title=x & y]("<tag> & more"))"#
    );
}

#[test]
fn test_stray_angle_bracket_is_text() {
    let mut target = Document::new();
    let p = target.create_element("p", DOMAttributes::empty());
    let text = target.create_text("a < b");
    target.append_child(p, text);
    target.set_root(Some(p));
    assert_eq!(parse("<p>a < b</p>").unwrap(), target);
}

#[test]
fn test_empty_document() {
    assert!(parse("").unwrap().is_empty());
    assert_eq!(parse("").unwrap().root(), None);
    assert_eq!(parse("  <!-- nothing -->\n").unwrap().root(), None);
    assert_eq!(parse("<!doctype html>").unwrap().root(), None);
}

#[test]
fn test_text_root() {
    let doc = parse("  hello &amp; bye ").unwrap();
    let root = doc.get(doc.root().unwrap()).unwrap();
    assert_eq!(root.node_type, DOMNodeType::Text("  hello & bye ".to_string()));
}

#[test]
fn test_parse_malformed() {
    assert_eq!(
        parse(r#"<html></closing><opening></html>"#),
        Err(ParseError::MismatchedTag {
            offset: 6,
            expected: "html".to_string(),
            found: "closing".to_string(),
        })
    );
    assert!(matches!(
        parse(r#"<---></--->"#),
        Err(ParseError::Syntax { .. })
    ));
    assert_eq!(
        parse("<p></p><p></p>"),
        Err(ParseError::TrailingContent { offset: 7 })
    );
    assert_eq!(
        parse("<div><p>text</p>"),
        Err(ParseError::UnclosedTag {
            name: "div".to_string()
        })
    );
    assert_eq!(
        parse("</p>"),
        Err(ParseError::UnexpectedCloseTag {
            offset: 0,
            name: "p".to_string()
        })
    );
    assert_eq!(
        parse("<p></p><!DOCTYPE html>"),
        Err(ParseError::Syntax { offset: 7 })
    );
    assert_eq!(
        parse("<style>p {}"),
        Err(ParseError::UnclosedTag {
            name: "style".to_string()
        })
    );
}

#[test]
fn test_nesting_limit() {
    let deep = "<b>".repeat(MAX_NESTING + 1);
    assert_eq!(parse(&deep), Err(ParseError::NestingTooDeep(MAX_NESTING)));

    let fits = format!("{}{}", "<b>".repeat(MAX_NESTING), "</b>".repeat(MAX_NESTING));
    assert!(parse(&fits).is_ok());
}

#[test]
fn test_cycles_are_representable() {
    let mut doc = Document::new();
    let a = doc.create_element("a", DOMAttributes::empty());
    let b = doc.create_element("b", DOMAttributes::empty());
    assert!(doc.append_child(a, b));
    assert!(doc.append_child(b, a));
    assert!(!doc.append_child(NodeId(7), a));
    assert_eq!(doc.get(b).unwrap().children, vec![a]);
}

#[test]
fn test_raw_text_close_tag_ignores_case() {
    let doc = parse("<div><SCRIPT>var x = 1;</SCRIPT><Style>p {}</STYLE></div>").unwrap();
    assert_eq!(
        outline(&doc, doc.root().unwrap()),
        r#"div(script("var x = 1;") style("p {}"))"#
    );

    let doc = parse("<script>a = '</scripts>';</script>").unwrap();
    assert_eq!(
        outline(&doc, doc.root().unwrap()),
        r#"script("a = '</scripts>';")"#
    );
}

#[test]
fn test_many_attributes_keep_first() {
    let attrs: DOMAttributes = (0..20_000)
        .map(|i| (format!("a{}", i), i.to_string()))
        .chain([("a3".to_string(), "again".to_string())])
        .collect();
    assert_eq!(attrs.len(), 20_000);
    assert_eq!(attrs.get("a3"), Some("3"));
    assert_eq!(attrs.iter().last(), Some(("a19999", "19999")));

    let markup: String = (0..5_000).map(|i| format!(" d{}=x", i)).collect();
    let doc = parse(&format!("<p{} d0=y></p>", markup)).unwrap();
    match &doc.get(doc.root().unwrap()).unwrap().node_type {
        DOMNodeType::Element(elt) => {
            assert_eq!(elt.attributes.len(), 5_000);
            assert_eq!(elt.attributes.get("d0"), Some("x"));
        }
        other => panic!("unexpected {:?}", other),
    }
}
