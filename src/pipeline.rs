//! The parse → transform → filter → render pipeline and its staleness guard.
//!
//! Parsing is synchronous; the render-side plugin stage may suspend for an
//! unbounded time. Overlapping runs are expected and are resolved purely by
//! a generation counter: each update bumps it, and a completion whose
//! captured generation no longer matches resolves to `Ok(None)` and commits
//! nothing. In-flight work is never cancelled, only its output discarded.

use crate::filter::{self, FilterConfig};
use crate::parse::{self, EventPlugin, TreeOptions, default_markdown_options};
use crate::render::{self, Renderers};
use crate::tree::Root;
use futures::future::LocalBoxFuture;
use pulldown_cmark::Options;
use std::cell::Cell;
use std::rc::Rc;

/// Render-side plugin: transforms the document tree after parsing and before
/// filtering. Stages run in registration order and may be asynchronous.
pub trait TreePlugin {
    fn transform<'a>(&'a self, root: &'a mut Root) -> LocalBoxFuture<'a, Result<(), String>>;
}

/// Configuration for one pipeline, fixed for its lifetime.
pub struct PipelineConfig {
    pub markdown_options: Options,
    pub tree_options: TreeOptions,
    pub event_plugins: Vec<Rc<dyn EventPlugin>>,
    pub tree_plugins: Vec<Rc<dyn TreePlugin>>,
    pub filter: FilterConfig,
    pub renderers: Renderers,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            markdown_options: default_markdown_options(),
            tree_options: TreeOptions::default(),
            event_plugins: Vec::new(),
            tree_plugins: Vec::new(),
            filter: FilterConfig::default(),
            renderers: Renderers::new(),
        }
    }
}

/// One pipeline per component instance. Single-threaded: the generation cell
/// is the only state shared between overlapping runs, and every read and
/// write of it happens within one event-loop turn.
pub struct RenderPipeline {
    config: PipelineConfig,
    generation: Rc<Cell<u64>>,
}

impl RenderPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            generation: Rc::new(Cell::new(0)),
        }
    }

    /// Start a render for the given source.
    ///
    /// The parse stage runs synchronously before this returns; the returned
    /// future runs the plugin stages and resolves to `Ok(Some(html))` if this
    /// update is still the latest, `Ok(None)` if it was superseded, or
    /// `Err` if a plugin stage failed.
    pub fn update(&self, source: &str) -> impl Future<Output = Result<Option<String>, String>> + 'static + use<> {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);

        let mut root = parse::parse_document(
            source,
            self.config.markdown_options,
            &self.config.event_plugins,
            &self.config.tree_options,
        );

        let latest = Rc::clone(&self.generation);
        let tree_plugins = self.config.tree_plugins.clone();
        let filter = self.config.filter.clone();
        let renderers = self.config.renderers.clone();
        async move {
            for plugin in &tree_plugins {
                plugin.transform(&mut root).await?;
            }

            if latest.get() != generation {
                log::debug!("discarding superseded markdown render (generation {generation})");
                return Ok(None);
            }

            filter::apply(&mut root, &filter);
            Ok(Some(render::render_html(&root, &renderers)))
        }
    }
}

/// One-shot markdown → HTML rendering with default options and no plugins.
pub fn render_to_string(source: &str) -> String {
    let mut root = parse::parse_document(
        source,
        default_markdown_options(),
        &[],
        &TreeOptions::default(),
    );
    filter::apply(&mut root, &FilterConfig::default());
    render::render_html(&root, &Renderers::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Suspends each run until the test fires the matching gate, in order.
    struct GatedPlugin {
        gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
    }

    impl TreePlugin for GatedPlugin {
        fn transform<'a>(&'a self, _root: &'a mut Root) -> LocalBoxFuture<'a, Result<(), String>> {
            let gate = self.gates.borrow_mut().pop_front();
            Box::pin(async move {
                if let Some(gate) = gate {
                    gate.await.map_err(|_| "gate dropped".to_string())?;
                }
                Ok(())
            })
        }
    }

    #[test]
    fn render_to_string_renders_markdown() {
        assert_eq!(
            render_to_string("hello **world**"),
            "<p>hello <strong>world</strong></p>"
        );
    }

    #[test]
    fn render_to_string_escapes_inline_html() {
        let html = render_to_string("<script>alert(\"xss\")</script>");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn render_to_string_neutralizes_unsafe_links() {
        let html = render_to_string("[click](javascript:alert$)");
        assert!(html.contains("href=\"\""), "unexpected html: {html}");
    }

    #[test]
    fn current_update_resolves_to_html() {
        let pipeline = RenderPipeline::new(PipelineConfig::default());
        let result = block_on(pipeline.update("*hi*"));
        assert_eq!(result, Ok(Some("<p><em>hi</em></p>".to_string())));
    }

    #[test]
    fn superseded_update_is_discarded() {
        let (fire_first, first_gate) = oneshot::channel();
        let (fire_second, second_gate) = oneshot::channel();
        let plugin = Rc::new(GatedPlugin {
            gates: RefCell::new(VecDeque::from([first_gate, second_gate])),
        });
        let pipeline = RenderPipeline::new(PipelineConfig {
            tree_plugins: vec![plugin],
            ..PipelineConfig::default()
        });

        // Both updates are issued before either transform completes; the
        // first completes only after the second was issued.
        let first = pipeline.update("first");
        let second = pipeline.update("second");
        fire_first.send(()).unwrap();
        fire_second.send(()).unwrap();

        assert_eq!(block_on(first), Ok(None));
        let html = block_on(second).unwrap().expect("latest update must mount");
        assert!(html.contains("second"));
    }

    #[test]
    fn plugin_failure_surfaces_as_error() {
        struct Failing;
        impl TreePlugin for Failing {
            fn transform<'a>(
                &'a self,
                _root: &'a mut Root,
            ) -> LocalBoxFuture<'a, Result<(), String>> {
                Box::pin(async { Err("stage failed".to_string()) })
            }
        }

        let pipeline = RenderPipeline::new(PipelineConfig {
            tree_plugins: vec![Rc::new(Failing)],
            ..PipelineConfig::default()
        });

        assert_eq!(
            block_on(pipeline.update("x")),
            Err("stage failed".to_string())
        );
    }

    #[test]
    fn tree_plugins_run_in_registration_order() {
        struct Tagger(&'static str);
        impl TreePlugin for Tagger {
            fn transform<'a>(
                &'a self,
                root: &'a mut Root,
            ) -> LocalBoxFuture<'a, Result<(), String>> {
                Box::pin(async move {
                    root.children
                        .push(crate::tree::Node::Text(self.0.to_string()));
                    Ok(())
                })
            }
        }

        let pipeline = RenderPipeline::new(PipelineConfig {
            tree_plugins: vec![Rc::new(Tagger("one")), Rc::new(Tagger("two"))],
            ..PipelineConfig::default()
        });

        let html = block_on(pipeline.update("")).unwrap().unwrap();
        assert_eq!(html, "onetwo");
    }
}
