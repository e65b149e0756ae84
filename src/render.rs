//! Document tree → HTML serialization.

use crate::tree::{Element, Node, Root};
use std::collections::HashMap;
use std::rc::Rc;

/// Replaces the default serialization of one tag. Receives the element and
/// the already-rendered HTML of its children; returns the replacement HTML.
pub type ElementRenderer = Rc<dyn Fn(&Element, &str) -> String>;

/// Renderer overrides keyed by tag name.
pub type Renderers = HashMap<String, ElementRenderer>;

/// Serialize a filtered tree to HTML.
pub fn render_html(root: &Root, renderers: &Renderers) -> String {
    let mut out = String::new();
    for node in &root.children {
        render_node(node, renderers, &mut out);
    }
    out
}

fn render_node(node: &Node, renderers: &Renderers, out: &mut String) {
    match node {
        // Raw nodes are resolved by the filter pass; anything left over is
        // escaped like plain text.
        Node::Text(text) | Node::Raw(text) => escape_text(text, out),
        Node::Element(element) => render_element(element, renderers, out),
    }
}

fn render_element(element: &Element, renderers: &Renderers, out: &mut String) {
    let mut children_html = String::new();
    for child in &element.children {
        render_node(child, renderers, &mut children_html);
    }

    if let Some(renderer) = renderers.get(&element.tag) {
        out.push_str(&renderer(element, &children_html));
        return;
    }

    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    if is_void(&element.tag) {
        out.push_str("/>");
        return;
    }
    out.push('>');
    out.push_str(&children_html);
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn escape_text(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(children: Vec<Node>) -> Root {
        Root { children }
    }

    #[test]
    fn serializes_nested_elements() {
        let mut strong = Element::new("strong");
        strong.children.push(Node::Text("bold".into()));
        let mut p = Element::new("p");
        p.children.push(Node::Text("a ".into()));
        p.children.push(Node::Element(strong));
        let tree = root(vec![Node::Element(p)]);

        assert_eq!(
            render_html(&tree, &Renderers::new()),
            "<p>a <strong>bold</strong></p>"
        );
    }

    #[test]
    fn escapes_text_and_attribute_values() {
        let mut a = Element::new("a");
        a.set_attr("href", "/q?a=1&b=\"2\"");
        a.children.push(Node::Text("1 < 2 & 3 > 2".into()));
        let tree = root(vec![Node::Element(a)]);

        assert_eq!(
            render_html(&tree, &Renderers::new()),
            "<a href=\"/q?a=1&amp;b=&quot;2&quot;\">1 &lt; 2 &amp; 3 &gt; 2</a>"
        );
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let mut img = Element::new("img");
        img.set_attr("src", "/x.png");
        img.set_attr("alt", "");
        let tree = root(vec![Node::Element(img)]);

        assert_eq!(
            render_html(&tree, &Renderers::new()),
            "<img src=\"/x.png\" alt=\"\"/>"
        );
    }

    #[test]
    fn leftover_raw_nodes_are_escaped() {
        let tree = root(vec![Node::Raw("<script>x</script>".into())]);

        assert_eq!(
            render_html(&tree, &Renderers::new()),
            "&lt;script&gt;x&lt;/script&gt;"
        );
    }

    #[test]
    fn renderer_override_replaces_default_serialization() {
        let mut renderers = Renderers::new();
        renderers.insert(
            "a".to_string(),
            Rc::new(|element: &Element, children: &str| {
                format!(
                    "<a target=\"_blank\" href=\"{}\">{}</a>",
                    element.attr("href").unwrap_or(""),
                    children
                )
            }) as ElementRenderer,
        );
        let mut a = Element::new("a");
        a.set_attr("href", "/docs");
        a.children.push(Node::Text("docs".into()));
        let tree = root(vec![Node::Element(a)]);

        assert_eq!(
            render_html(&tree, &renderers),
            "<a target=\"_blank\" href=\"/docs\">docs</a>"
        );
    }
}
