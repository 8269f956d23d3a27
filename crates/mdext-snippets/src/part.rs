//! Renderer part for snippet tokens.

use std::sync::Arc;

use mdext_engine::{
    HTML_RENDERER, MARKDOWN_CONTEXT, PartTriple, RenderContext, RendererPart, Token, TokenKind,
    TokenRenderer, TokenTag, error_comment, escape_html,
};

use crate::extractor::SnippetExtractor;

/// Renders snippet tokens as highlighted code blocks.
pub struct SnippetPart {
    extractor: Arc<SnippetExtractor>,
}

impl SnippetPart {
    /// Create a part backed by the given extractor.
    #[must_use]
    pub fn new(extractor: Arc<SnippetExtractor>) -> Self {
        Self { extractor }
    }
}

impl RendererPart for SnippetPart {
    fn name(&self) -> &str {
        "snippet"
    }

    fn triple(&self) -> PartTriple {
        PartTriple::new(HTML_RENDERER, TokenTag::CodeSnippet, MARKDOWN_CONTEXT)
    }

    fn render(
        &self,
        _dispatcher: &dyn TokenRenderer,
        token: &Token,
        ctx: &RenderContext,
    ) -> String {
        let TokenKind::CodeSnippet(reference) = &token.kind else {
            return String::new();
        };
        match self.extractor.extract(reference, ctx) {
            Ok(snippet) => {
                let code = escape_html(&snippet.source);
                match snippet.language {
                    Some(lang) => format!(
                        r#"<pre><code class="lang-{}">{code}</code></pre>"#,
                        escape_html(&lang)
                    ),
                    None => format!("<pre><code>{code}</code></pre>"),
                }
            }
            Err(e) => {
                tracing::warn!("snippet \"{}\" failed: {e}", reference.path);
                error_comment(&e.to_string())
            }
        }
    }
}
