//! Blockquote partitioner.
//!
//! Regroups a blockquote's flat child sequence into semantically typed
//! runs: a new group starts at every marker token (section, note, video);
//! non-marker tokens append to the open group, opening a headingless
//! default group first when none is open.

use crate::compose::{PartTriple, RendererPart};
use crate::context::{MARKDOWN_CONTEXT, RenderContext};
use crate::renderer::{HTML_RENDERER, TokenRenderer, escape_html, render_all};
use crate::token::{Token, TokenKind, TokenTag};

/// A maximal run of blockquote children headed by at most one marker.
#[derive(Debug, PartialEq, Eq)]
pub struct SplitToken<'a> {
    /// The marker token heading the group; `None` for the default group.
    pub heading: Option<&'a Token>,
    /// The tokens belonging to the group, in order.
    pub inner: Vec<&'a Token>,
}

/// Partition `children` into marker-headed groups in one scan.
#[must_use]
pub fn partition(children: &[Token]) -> Vec<SplitToken<'_>> {
    let mut groups: Vec<SplitToken<'_>> = Vec::new();

    for token in children {
        if token.kind.is_marker() {
            groups.push(SplitToken {
                heading: Some(token),
                inner: Vec::new(),
            });
        } else {
            if groups.is_empty() {
                groups.push(SplitToken {
                    heading: None,
                    inner: Vec::new(),
                });
            }
            // Scan is left-to-right, so the open group is always last.
            if let Some(open) = groups.last_mut() {
                open.inner.push(token);
            }
        }
    }

    groups
}

/// Renderer part turning marker-headed blockquotes into typed containers.
///
/// Note groups become `<div class="KIND">`, section groups `<div ...>`
/// with the marker's literal attributes, video groups an iframe embed,
/// and the default group an ordinary blockquote.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockquotePart;

impl RendererPart for BlockquotePart {
    fn name(&self) -> &str {
        "blockquote"
    }

    fn triple(&self) -> PartTriple {
        PartTriple::new(HTML_RENDERER, TokenTag::Blockquote, MARKDOWN_CONTEXT)
    }

    fn render(
        &self,
        dispatcher: &dyn TokenRenderer,
        token: &Token,
        ctx: &RenderContext,
    ) -> String {
        let TokenKind::Blockquote(children) = &token.kind else {
            return String::new();
        };

        let mut out = String::new();
        for group in partition(children) {
            let body = render_group(dispatcher, &group.inner, ctx);
            match group.heading.map(|t| &t.kind) {
                Some(TokenKind::NoteMarker { kind }) => {
                    let class = escape_html(&kind.to_uppercase());
                    out.push_str(&format!(r#"<div class="{class}">{body}</div>"#));
                }
                Some(TokenKind::SectionMarker { attributes }) => {
                    let attributes = attributes.trim();
                    if attributes.is_empty() {
                        out.push_str(&format!("<div>{body}</div>"));
                    } else {
                        out.push_str(&format!("<div {attributes}>{body}</div>"));
                    }
                }
                Some(TokenKind::VideoMarker { link }) => {
                    out.push_str(&format!(
                        r#"<div class="embeddedvideo"><iframe src="{}" frameborder="0" allowfullscreen="true"></iframe></div>"#,
                        escape_html(link)
                    ));
                    out.push_str(&body);
                }
                _ => {
                    out.push_str(&format!("<blockquote>{body}</blockquote>"));
                }
            }
        }
        out
    }
}

fn render_group(
    dispatcher: &dyn TokenRenderer,
    tokens: &[&Token],
    ctx: &RenderContext,
) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(&dispatcher.render(dispatcher, token, ctx));
    }
    out
}
