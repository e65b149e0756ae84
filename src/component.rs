//! The `Markdown` Leptos component.

use crate::filter::{ElementPredicate, FilterConfig, UrlTransform};
use crate::parse::{EventPlugin, TreeOptions, default_markdown_options};
use crate::pipeline::{PipelineConfig, RenderPipeline, TreePlugin};
use crate::render::Renderers;
use crate::url::default_url_transform;
use leptos::prelude::*;
use leptos::task::spawn_local;
use pulldown_cmark::Options;
use std::rc::Rc;

/// Renders a reactive markdown source string as sanitized HTML.
///
/// Every change to `src` re-runs the parse → transform → filter pipeline and
/// replaces the content of the component's container `<div>`. Updates may
/// overlap when render-side plugins are asynchronous; only the most recently
/// issued update is ever mounted.
///
/// ```ignore
/// let src = RwSignal::new("# hello".to_string());
/// view! { <Markdown src=src/> }
/// ```
#[component]
pub fn Markdown(
    /// The markdown source text.
    #[prop(into)]
    src: Signal<String>,
    /// Tags to keep; everything else is removed. Takes priority over
    /// `disallowed_elements`.
    #[prop(optional)]
    allowed_elements: Option<Vec<String>>,
    /// Tags to remove.
    #[prop(optional)]
    disallowed_elements: Option<Vec<String>>,
    /// Custom per-element keep/remove decision, consulted after the lists.
    #[prop(optional)]
    allow_element: Option<ElementPredicate>,
    /// Per-tag renderer overrides.
    #[prop(optional)]
    components: Renderers,
    /// Parse-side plugins mapping the markdown event stream.
    #[prop(optional)]
    event_plugins: Vec<Rc<dyn EventPlugin>>,
    /// Render-side plugins transforming the document tree; may be async.
    #[prop(optional)]
    tree_plugins: Vec<Rc<dyn TreePlugin>>,
    /// Markdown extensions; defaults to tables, strikethrough, footnotes,
    /// and task lists.
    #[prop(optional)]
    markdown_options: Option<Options>,
    /// Options forwarded to the tree-conversion stage.
    #[prop(optional)]
    tree_options: TreeOptions,
    /// Remove raw HTML instead of displaying it as escaped text.
    #[prop(optional)]
    skip_html: bool,
    /// Splice the children of removed elements into their place.
    #[prop(optional)]
    unwrap_disallowed: bool,
    /// URL rewriter for URL-bearing attributes; defaults to the sanitizer.
    #[prop(optional)]
    url_transform: Option<UrlTransform>,
) -> impl IntoView {
    let filter = FilterConfig {
        allowed_elements,
        disallowed_elements,
        allow_element,
        unwrap_disallowed,
        skip_html,
        url_transform: url_transform.unwrap_or_else(default_url_transform),
    };
    let pipeline = RenderPipeline::new(PipelineConfig {
        markdown_options: markdown_options.unwrap_or_else(default_markdown_options),
        tree_options,
        event_plugins,
        tree_plugins,
        filter,
        renderers: components,
    });

    let html = RwSignal::new(String::new());

    Effect::new(move |_| {
        let update = src.with(|source| pipeline.update(source));
        spawn_local(async move {
            match update.await {
                Ok(Some(rendered)) => html.set(rendered),
                Ok(None) => {}
                Err(e) => log::error!("markdown transform failed: {e}"),
            }
        });
    });

    view! { <div class="markdown-view" inner_html=move || html.get()></div> }
}
