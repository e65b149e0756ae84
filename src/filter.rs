//! Policy filtering applied to the document tree before rendering.
//!
//! One pre-order pass handles raw-HTML policy, URL-attribute rewriting, and
//! the element allow/deny/unwrap policy. Sibling vectors are walked with an
//! explicit cursor so structural edits (removal, unwrapping) can resume at
//! the same index.

use crate::tree::{Element, Node, Root};
use crate::url::{URL_ATTRIBUTES, default_url_transform};
use std::rc::Rc;

/// Decides whether an element is kept. Arguments: the element, its index in
/// the parent's children, and the parent tag (`None` when the parent is the
/// document root).
pub type ElementPredicate = Rc<dyn Fn(&Element, usize, Option<&str>) -> bool>;

/// Rewrites a URL-bearing attribute value. Arguments: the current value (or
/// empty string), the attribute name, and the element carrying it.
pub type UrlTransform = Rc<dyn Fn(&str, &str, &Element) -> String>;

/// Immutable policy inputs for one component instance.
///
/// When both `allowed_elements` and `disallowed_elements` are set, the
/// allow-list wins and the deny-list is never consulted. The predicate is
/// only reached by elements the lists did not already remove.
#[derive(Clone)]
pub struct FilterConfig {
    pub allowed_elements: Option<Vec<String>>,
    pub disallowed_elements: Option<Vec<String>>,
    pub allow_element: Option<ElementPredicate>,
    /// Splice a removed element's children into its place instead of
    /// dropping them with it.
    pub unwrap_disallowed: bool,
    /// Remove raw HTML nodes entirely instead of escaping them to text.
    pub skip_html: bool,
    pub url_transform: UrlTransform,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_elements: None,
            disallowed_elements: None,
            allow_element: None,
            unwrap_disallowed: false,
            skip_html: false,
            url_transform: default_url_transform(),
        }
    }
}

/// Run the filter pass over the whole tree, mutating it in place.
pub fn apply(root: &mut Root, config: &FilterConfig) {
    filter_children(&mut root.children, None, config);
}

fn filter_children(children: &mut Vec<Node>, parent_tag: Option<&str>, config: &FilterConfig) {
    let mut index = 0;
    while index < children.len() {
        if let Node::Raw(value) = &children[index] {
            if config.skip_html {
                children.remove(index);
            } else {
                let value = value.clone();
                children[index] = Node::Text(value);
            }
            // The next sibling (or the replacement text node) now occupies
            // this index.
            continue;
        }

        if let Node::Element(element) = &mut children[index] {
            rewrite_urls(element, &config.url_transform);
        }

        if let Node::Element(element) = &children[index] {
            let mut remove = if let Some(allowed) = &config.allowed_elements {
                !allowed.iter().any(|tag| *tag == element.tag)
            } else if let Some(disallowed) = &config.disallowed_elements {
                disallowed.iter().any(|tag| *tag == element.tag)
            } else {
                false
            };

            if !remove {
                if let Some(predicate) = &config.allow_element {
                    remove = !predicate(element, index, parent_tag);
                }
            }

            if remove {
                let removed = children.remove(index);
                if config.unwrap_disallowed {
                    if let Node::Element(removed) = removed {
                        children.splice(index..index, removed.children);
                    }
                }
                continue;
            }
        }

        if let Node::Element(element) = &mut children[index] {
            let Element { tag, children, .. } = element;
            filter_children(children, Some(tag.as_str()), config);
        }
        index += 1;
    }
}

/// Rewrite every URL-bearing attribute present on the element. Absent
/// attributes are untouched.
fn rewrite_urls(element: &mut Element, transform: &UrlTransform) {
    for &(name, tags) in URL_ATTRIBUTES {
        let applies = match tags {
            None => true,
            Some(tags) => tags.contains(&element.tag.as_str()),
        };
        if !applies {
            continue;
        }
        let Some(value) = element.attr(name).map(str::to_owned) else {
            continue;
        };
        let rewritten = transform(&value, name, element);
        element.set_attr(name, rewritten);
    }
}
