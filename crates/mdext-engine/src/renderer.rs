//! Renderer double-dispatch contract and the base HTML renderer.

use crate::context::RenderContext;
use crate::token::{Token, TokenKind};

/// Uniform render entry point implemented by every renderer.
///
/// `dispatcher` is the renderer the whole invocation started with,
/// usually the composed renderer built by [`compose`](crate::compose::compose),
/// and must be used for recursive child rendering so that extension parts see nested
/// tokens too. A renderer rendering its own children via `self` instead
/// of `dispatcher` would silently bypass the extension layer.
pub trait TokenRenderer: Send + Sync {
    /// Renderer type identifier (dispatch-key component).
    fn id(&self) -> &'static str;

    /// Render one token to an output fragment.
    fn render(&self, dispatcher: &dyn TokenRenderer, token: &Token, ctx: &RenderContext)
    -> String;
}

/// Render a token slice through `dispatcher`, concatenating the output.
pub fn render_all(
    dispatcher: &dyn TokenRenderer,
    tokens: &[Token],
    ctx: &RenderContext,
) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&dispatcher.render(dispatcher, token, ctx));
    }
    out
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a recoverable failure as an inline HTML comment.
///
/// Keeps the surrounding document well-formed: `--` sequences inside the
/// message are broken up so the comment cannot terminate early.
#[must_use]
pub fn error_comment(message: &str) -> String {
    let safe = message.replace("--", "- -");
    format!("<!-- {safe} -->")
}

/// Renderer type identifier of [`HtmlRenderer`].
pub const HTML_RENDERER: &str = "html";

/// Base HTML renderer dispatching over the closed token-kind set.
///
/// Documentation-specific kinds (includes, snippets, markers) have no
/// meaningful base rendering; they fall back to their escaped raw source
/// so output degrades visibly rather than silently when no extension
/// part claims them.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlRenderer;

impl TokenRenderer for HtmlRenderer {
    fn id(&self) -> &'static str {
        HTML_RENDERER
    }

    fn render(
        &self,
        dispatcher: &dyn TokenRenderer,
        token: &Token,
        ctx: &RenderContext,
    ) -> String {
        match &token.kind {
            TokenKind::Text(text) => escape_html(text),
            TokenKind::Raw(html) => html.clone(),
            TokenKind::Paragraph(children) => {
                format!("<p>{}</p>", render_all(dispatcher, children, ctx))
            }
            TokenKind::Heading { level, children } => {
                let level = (*level).clamp(1, 6);
                format!(
                    "<h{level}>{}</h{level}>",
                    render_all(dispatcher, children, ctx)
                )
            }
            TokenKind::Blockquote(children) => {
                format!(
                    "<blockquote>{}</blockquote>",
                    render_all(dispatcher, children, ctx)
                )
            }
            TokenKind::CodeFence { language, source } => match language {
                Some(lang) => format!(
                    r#"<pre><code class="language-{}">{}</code></pre>"#,
                    escape_html(lang),
                    escape_html(source)
                ),
                None => format!("<pre><code>{}</code></pre>", escape_html(source)),
            },
            // Doc-specific kinds without a claiming part degrade to their
            // escaped raw source.
            TokenKind::CodeSnippet(_)
            | TokenKind::Include(_)
            | TokenKind::SectionMarker { .. }
            | TokenKind::NoteMarker { .. }
            | TokenKind::VideoMarker { .. } => escape_html(&token.raw),
        }
    }
}
