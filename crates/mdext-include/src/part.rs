//! Renderer part wiring the inclusion resolver into the composer.

use std::sync::Arc;

use mdext_engine::{
    HTML_RENDERER, MARKDOWN_CONTEXT, MarkupParser, PartTriple, RenderContext, RendererPart, Token,
    TokenKind, TokenRenderer, TokenTag,
};

use crate::resolver::IncludeResolver;

/// Renders inclusion tokens by recursing through the shared resolver.
///
/// Table cells force the inline variant regardless of how the directive
/// was written, since block output would break the table.
pub struct IncludePart {
    resolver: Arc<IncludeResolver>,
    parser: Arc<dyn MarkupParser>,
}

impl IncludePart {
    /// Create a part backed by the given resolver and tokenizer.
    #[must_use]
    pub fn new(resolver: Arc<IncludeResolver>, parser: Arc<dyn MarkupParser>) -> Self {
        Self { resolver, parser }
    }
}

impl RendererPart for IncludePart {
    fn name(&self) -> &str {
        "include"
    }

    fn triple(&self) -> PartTriple {
        PartTriple::new(HTML_RENDERER, TokenTag::Include, MARKDOWN_CONTEXT)
    }

    fn render(
        &self,
        dispatcher: &dyn TokenRenderer,
        token: &Token,
        ctx: &RenderContext,
    ) -> String {
        let TokenKind::Include(include) = &token.kind else {
            return String::new();
        };
        self.resolver
            .render(self.parser.as_ref(), dispatcher, include, ctx)
    }
}
