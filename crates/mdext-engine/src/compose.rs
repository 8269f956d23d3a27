//! Extension composer: open dispatch over (renderer, token, context) triples.
//!
//! Third parties add rendering behavior for specific token shapes without
//! touching the base renderer: each [`RendererPart`] declares the triple
//! it applies to, and [`compose`] builds a dispatch table keyed by that
//! triple, tried before the base renderer. Parts within one triple are
//! tried in registration order; the first whose `matches` returns true
//! wins, and unmatched triples delegate to the base renderer's own
//! dispatch.

use std::collections::HashMap;

use crate::context::RenderContext;
use crate::renderer::TokenRenderer;
use crate::token::{Token, TokenTag};

/// Exact dispatch key a part group is registered under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DispatchKey {
    /// Renderer type identifier (see [`TokenRenderer::id`]).
    pub renderer: &'static str,
    /// Token discriminant.
    pub token: TokenTag,
    /// Context type identifier (see [`RenderContext::kind`]).
    pub context: &'static str,
}

/// The triple a part declares, before validation.
///
/// A triple is valid only when all three identifiers are present and
/// non-empty; invalid triples drop their part at composition time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartTriple {
    /// Declared renderer type identifier.
    pub renderer: Option<&'static str>,
    /// Declared token discriminant.
    pub token: Option<TokenTag>,
    /// Declared context type identifier.
    pub context: Option<&'static str>,
}

impl PartTriple {
    /// Declare a complete triple.
    #[must_use]
    pub fn new(renderer: &'static str, token: TokenTag, context: &'static str) -> Self {
        Self {
            renderer: Some(renderer),
            token: Some(token),
            context: Some(context),
        }
    }

    /// Validate into a [`DispatchKey`]; `None` if any identifier is
    /// missing or empty.
    #[must_use]
    pub fn validate(&self) -> Option<DispatchKey> {
        let renderer = self.renderer.filter(|r| !r.is_empty())?;
        let context = self.context.filter(|c| !c.is_empty())?;
        let token = self.token?;
        Some(DispatchKey {
            renderer,
            token,
            context,
        })
    }
}

/// Pluggable render unit for one dispatch triple.
///
/// Supplied externally at composer build time and immutable thereafter.
/// Parts holding resources release them through `Drop`; the composed
/// renderer drops its parts before the base renderer.
pub trait RendererPart: Send + Sync {
    /// Part name, used in composition-time log messages.
    fn name(&self) -> &str;

    /// The (renderer, token, context) triple this part applies to.
    fn triple(&self) -> PartTriple;

    /// Whether this part wants to render the given token.
    ///
    /// Defaults to claiming everything reaching the part's triple.
    fn matches(
        &self,
        _dispatcher: &dyn TokenRenderer,
        _token: &Token,
        _ctx: &RenderContext,
    ) -> bool {
        true
    }

    /// Render the token.
    fn render(
        &self,
        dispatcher: &dyn TokenRenderer,
        token: &Token,
        ctx: &RenderContext,
    ) -> String;
}

/// Source of renderer parts, consulted once at composer build time.
pub trait PartProvider: Send + Sync {
    /// Yield zero or more parts for the given parameter map.
    fn parts(&self, parameters: &HashMap<String, String>) -> Vec<Box<dyn RendererPart>>;
}

/// Composite renderer produced by [`compose`].
///
/// Built once per engine configuration and stateless afterwards, so it is
/// safe for unsynchronized concurrent reads.
///
/// Field order matters: `groups` is declared before `base` so parts are
/// dropped before the base renderer.
struct ComposedRenderer {
    groups: HashMap<DispatchKey, Vec<Box<dyn RendererPart>>>,
    base: Box<dyn TokenRenderer>,
}

impl TokenRenderer for ComposedRenderer {
    fn id(&self) -> &'static str {
        self.base.id()
    }

    fn render(
        &self,
        dispatcher: &dyn TokenRenderer,
        token: &Token,
        ctx: &RenderContext,
    ) -> String {
        let key = DispatchKey {
            renderer: self.base.id(),
            token: token.kind.tag(),
            context: ctx.kind(),
        };
        if let Some(parts) = self.groups.get(&key) {
            for part in parts {
                if part.matches(dispatcher, token, ctx) {
                    return part.render(dispatcher, token, ctx);
                }
            }
        }
        self.base.render(dispatcher, token, ctx)
    }
}

/// Build a composite renderer from `base` and the parts yielded by
/// `providers`.
///
/// Parts with invalid triples are logged by name and ignored. When no
/// valid triple exists the base renderer is returned unchanged, without
/// wrapping. The result is substitutable everywhere the base renderer is
/// expected.
#[must_use]
pub fn compose(
    base: Box<dyn TokenRenderer>,
    providers: &[Box<dyn PartProvider>],
    parameters: &HashMap<String, String>,
) -> Box<dyn TokenRenderer> {
    let mut groups: HashMap<DispatchKey, Vec<Box<dyn RendererPart>>> = HashMap::new();

    for provider in providers {
        for part in provider.parts(parameters) {
            match part.triple().validate() {
                Some(key) => groups.entry(key).or_default().push(part),
                None => {
                    tracing::warn!(
                        "ignoring renderer part {:?}: invalid dispatch triple {:?}",
                        part.name(),
                        part.triple()
                    );
                }
            }
        }
    }

    if groups.is_empty() {
        return base;
    }
    Box::new(ComposedRenderer { groups, base })
}
