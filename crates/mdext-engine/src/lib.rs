//! Token model, render context, and composable renderer dispatch.
//!
//! This crate is the core of the mdext markup layer:
//!
//! - [`Token`] / [`TokenKind`]: the immutable token tree consumed from an
//!   external tokenizer (see [`MarkupParser`])
//! - [`RenderContext`]: copy-on-write environment threaded through one
//!   recursive markup invocation, carrying the explicitly aliased
//!   [`DependencySet`]
//! - [`TokenRenderer`]: the uniform `render(dispatcher, token, ctx)`
//!   double-dispatch contract, with [`HtmlRenderer`] as the base
//! - [`compose`]: the extension composer building a dispatch table of
//!   [`RendererPart`]s keyed by (renderer, token, context) triples
//! - [`partition`]: the blockquote partitioner regrouping marker-headed
//!   child runs
//!
//! # Example
//!
//! ```
//! use mdext_engine::{HtmlRenderer, RenderContext, Token, TokenRenderer};
//!
//! let ctx = RenderContext::new("docs");
//! let token = Token::text("hello");
//! let html = HtmlRenderer.render(&HtmlRenderer, &token, &ctx);
//! assert_eq!(html, "hello");
//! ```

mod compose;
mod context;
mod renderer;
mod split;
mod token;

pub use compose::{DispatchKey, PartProvider, PartTriple, RendererPart, compose};
pub use context::{DependencySet, MARKDOWN_CONTEXT, RenderContext};
pub use renderer::{
    HTML_RENDERER, HtmlRenderer, TokenRenderer, error_comment, escape_html, render_all,
};
pub use split::{BlockquotePart, SplitToken, partition};
pub use token::{IncludeRef, SnippetRef, SourcePos, Token, TokenKind, TokenTag};

/// External tokenizer contract.
///
/// The markup layer never defines the markdown grammar; a parser is
/// supplied from outside and re-entered by the inclusion resolver for
/// included files.
pub trait MarkupParser: Send + Sync {
    /// Parse raw text into an immutable token tree.
    fn parse(&self, text: &str, ctx: &RenderContext) -> Vec<Token>;
}
