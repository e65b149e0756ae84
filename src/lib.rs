//! Markdown rendering component for Leptos.
//!
//! [`Markdown`] turns a reactive markdown source string into sanitized DOM
//! content: pulldown-cmark parses the source, the document tree passes
//! through optional plugin stages and a policy filter (URL sanitization,
//! element allow/deny lists, raw-HTML handling), and the result is mounted
//! into the component's container element. Overlapping asynchronous renders
//! are resolved by a staleness guard: only the latest update mounts.

pub mod component;
pub mod filter;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod tree;
pub mod url;

pub use component::Markdown;
pub use filter::{ElementPredicate, FilterConfig, UrlTransform};
pub use parse::{EventPlugin, TreeOptions, default_markdown_options};
pub use pipeline::{PipelineConfig, RenderPipeline, TreePlugin, render_to_string};
pub use render::{ElementRenderer, Renderers};
pub use tree::{Element, Node, Root};
pub use url::{URL_ATTRIBUTES, sanitize_url};
