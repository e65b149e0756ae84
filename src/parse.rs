//! Source → document tree conversion on top of the pulldown-cmark event
//! stream.
//!
//! Raw HTML events are carried into the tree as [`Node::Raw`] so the filter
//! pass can apply the configured raw-HTML policy; nothing is executed or
//! dropped here.

use crate::tree::{Element, Node, Root};
use pulldown_cmark::{
    Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};
use std::rc::Rc;

/// Parse-side plugin: maps the markdown event stream before tree conversion.
/// Plugins run in registration order, each receiving the previous output.
pub trait EventPlugin {
    fn map<'a>(&self, events: Vec<Event<'a>>) -> Vec<Event<'a>>;
}

/// Options forwarded to the tree-conversion stage.
#[derive(Clone, Debug)]
pub struct TreeOptions {
    /// Prefix for the class set on fenced code blocks, e.g. `language-rust`.
    pub code_class_prefix: String,
    /// Prefix for footnote definition ids and reference targets.
    pub footnote_id_prefix: String,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            code_class_prefix: "language-".to_string(),
            footnote_id_prefix: String::new(),
        }
    }
}

/// Markdown extensions enabled when the caller does not override them.
pub fn default_markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
}

/// Parse markdown source into a document tree. Synchronous and total:
/// malformed input is not an error, the parser is tolerant by design.
pub fn parse_document(
    source: &str,
    markdown_options: Options,
    event_plugins: &[Rc<dyn EventPlugin>],
    tree_options: &TreeOptions,
) -> Root {
    let mut events: Vec<Event> = Parser::new_ext(source, markdown_options).collect();
    for plugin in event_plugins {
        events = plugin.map(events);
    }

    let mut builder = TreeBuilder::new(tree_options);
    for event in events {
        builder.event(event);
    }
    builder.into_root()
}

enum Frame {
    Element {
        element: Element,
        /// Extra element wrapped around this one on close (`pre` around
        /// code blocks, `thead` around the header row).
        wrap: Option<&'static str>,
    },
    /// Children splice into the parent on close (html blocks, containers we
    /// do not map to an element).
    Transparent(Vec<Node>),
    /// Children are dropped (metadata blocks).
    Discard,
    /// Collects descendant text into the `alt` attribute of an `img`.
    Image {
        src: String,
        title: String,
        alt: String,
    },
}

impl Frame {
    fn element(element: Element) -> Self {
        Frame::Element {
            element,
            wrap: None,
        }
    }
}

struct TreeBuilder<'a> {
    options: &'a TreeOptions,
    stack: Vec<Frame>,
    root: Vec<Node>,
    table_aligns: Vec<Alignment>,
    cell_index: usize,
    in_table_head: bool,
}

impl<'a> TreeBuilder<'a> {
    fn new(options: &'a TreeOptions) -> Self {
        Self {
            options,
            stack: Vec::new(),
            root: Vec::new(),
            table_aligns: Vec::new(),
            cell_index: 0,
            in_table_head: false,
        }
    }

    fn event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(TagEnd::TableHead) => {
                self.close();
                self.in_table_head = false;
            }
            Event::End(TagEnd::TableCell) => {
                self.close();
                self.cell_index += 1;
            }
            Event::End(_) => self.close(),
            Event::Text(text) => self.attach(Node::Text(text.to_string())),
            Event::Code(code) => {
                let mut el = Element::new("code");
                el.children.push(Node::Text(code.to_string()));
                self.attach(Node::Element(el));
            }
            Event::InlineMath(math) => {
                let mut el = Element::new("span");
                el.set_attr("class", "math math-inline");
                el.children.push(Node::Text(math.to_string()));
                self.attach(Node::Element(el));
            }
            Event::DisplayMath(math) => {
                let mut el = Element::new("span");
                el.set_attr("class", "math math-display");
                el.children.push(Node::Text(math.to_string()));
                self.attach(Node::Element(el));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                self.attach(Node::Raw(html.to_string()));
            }
            Event::FootnoteReference(name) => {
                let mut link = Element::new("a");
                link.set_attr(
                    "href",
                    format!("#{}{}", self.options.footnote_id_prefix, name),
                );
                link.children.push(Node::Text(name.to_string()));
                let mut sup = Element::new("sup");
                sup.set_attr("class", "footnote-reference");
                sup.children.push(Node::Element(link));
                self.attach(Node::Element(sup));
            }
            Event::SoftBreak => self.attach(Node::Text("\n".to_string())),
            Event::HardBreak => self.attach(Node::Element(Element::new("br"))),
            Event::Rule => self.attach(Node::Element(Element::new("hr"))),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input");
                input.set_attr("type", "checkbox");
                input.set_attr("disabled", "");
                if checked {
                    input.set_attr("checked", "");
                }
                self.attach(Node::Element(input));
            }
        }
    }

    fn start(&mut self, tag: Tag) {
        let frame = match tag {
            Tag::Paragraph => Frame::element(Element::new("p")),
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                let mut el = Element::new(heading_tag(level));
                if let Some(id) = id {
                    el.set_attr("id", id.to_string());
                }
                if !classes.is_empty() {
                    el.set_attr(
                        "class",
                        classes
                            .iter()
                            .map(|class| class.to_string())
                            .collect::<Vec<_>>()
                            .join(" "),
                    );
                }
                for (name, value) in attrs {
                    el.set_attr(&name, value.map(|v| v.to_string()).unwrap_or_default());
                }
                Frame::element(el)
            }
            Tag::BlockQuote(_) => Frame::element(Element::new("blockquote")),
            Tag::CodeBlock(kind) => {
                let mut el = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind {
                    if let Some(lang) = info.split_whitespace().next() {
                        if !lang.is_empty() {
                            el.set_attr(
                                "class",
                                format!("{}{}", self.options.code_class_prefix, lang),
                            );
                        }
                    }
                }
                Frame::Element {
                    element: el,
                    wrap: Some("pre"),
                }
            }
            Tag::List(Some(start)) => {
                let mut el = Element::new("ol");
                if start != 1 {
                    el.set_attr("start", start.to_string());
                }
                Frame::element(el)
            }
            Tag::List(None) => Frame::element(Element::new("ul")),
            Tag::Item => Frame::element(Element::new("li")),
            Tag::FootnoteDefinition(name) => {
                let mut el = Element::new("div");
                el.set_attr("class", "footnote-definition");
                el.set_attr(
                    "id",
                    format!("{}{}", self.options.footnote_id_prefix, name),
                );
                let mut label = Element::new("sup");
                label.set_attr("class", "footnote-definition-label");
                label.children.push(Node::Text(name.to_string()));
                el.children.push(Node::Element(label));
                Frame::element(el)
            }
            Tag::Table(aligns) => {
                self.table_aligns = aligns;
                Frame::element(Element::new("table"))
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.cell_index = 0;
                Frame::Element {
                    element: Element::new("tr"),
                    wrap: Some("thead"),
                }
            }
            Tag::TableRow => {
                self.cell_index = 0;
                Frame::element(Element::new("tr"))
            }
            Tag::TableCell => {
                let tag = if self.in_table_head { "th" } else { "td" };
                let mut el = Element::new(tag);
                if let Some(style) = self
                    .table_aligns
                    .get(self.cell_index)
                    .and_then(|align| alignment_style(*align))
                {
                    el.set_attr("style", style);
                }
                Frame::element(el)
            }
            Tag::Emphasis => Frame::element(Element::new("em")),
            Tag::Strong => Frame::element(Element::new("strong")),
            Tag::Strikethrough => Frame::element(Element::new("del")),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut el = Element::new("a");
                el.set_attr("href", dest_url.to_string());
                if !title.is_empty() {
                    el.set_attr("title", title.to_string());
                }
                Frame::element(el)
            }
            Tag::Image {
                dest_url, title, ..
            } => Frame::Image {
                src: dest_url.to_string(),
                title: title.to_string(),
                alt: String::new(),
            },
            Tag::MetadataBlock(_) => Frame::Discard,
            Tag::HtmlBlock => Frame::Transparent(Vec::new()),
            _ => Frame::Transparent(Vec::new()),
        };
        self.stack.push(frame);
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Element { element, wrap } => {
                let node = match wrap {
                    Some(outer_tag) => {
                        let mut outer = Element::new(outer_tag);
                        outer.children.push(Node::Element(element));
                        Node::Element(outer)
                    }
                    None => Node::Element(element),
                };
                self.attach(node);
            }
            Frame::Transparent(children) => {
                for child in children {
                    self.attach(child);
                }
            }
            Frame::Discard => {}
            Frame::Image { src, title, alt } => {
                let mut el = Element::new("img");
                el.set_attr("src", src);
                el.set_attr("alt", alt);
                if !title.is_empty() {
                    el.set_attr("title", title);
                }
                self.attach(Node::Element(el));
            }
        }
    }

    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(Frame::Element { element, .. }) => element.children.push(node),
            Some(Frame::Transparent(children)) => children.push(node),
            Some(Frame::Discard) => {}
            Some(Frame::Image { alt, .. }) => collect_text(&node, alt),
            None => self.root.push(node),
        }
    }

    fn into_root(mut self) -> Root {
        while !self.stack.is_empty() {
            self.close();
        }
        Root {
            children: self.root,
        }
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

fn alignment_style(align: Alignment) -> Option<&'static str> {
    match align {
        Alignment::None => None,
        Alignment::Left => Some("text-align: left"),
        Alignment::Center => Some("text-align: center"),
        Alignment::Right => Some("text-align: right"),
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Raw(_) => {}
        Node::Element(element) => {
            for child in &element.children {
                collect_text(child, out);
            }
        }
    }
}
