//! Host surface types and their static hierarchy.
//!
//! A surface is a host type whose members can be intercepted. Surfaces form
//! a tree through [`SurfaceKind::parent`]; the tree replaces looking up
//! constructors by runtime name, so two surfaces can never collide.
//!
//! Attribute requirements are resolved by walking this tree upward, and the
//! walk stops at [`SurfaceKind::BASE`]: requirements declared above the base
//! element surface never apply to attributes.

use std::fmt;

/// A host surface type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum SurfaceKind {
    Window,
    Document,
    DomParser,
    Range,
    Node,
    Element,
    HtmlElement,
    HtmlAnchorElement,
    HtmlAreaElement,
    HtmlBaseElement,
    HtmlSourceElement,
    HtmlImageElement,
    HtmlTrackElement,
    HtmlMediaElement,
    HtmlAudioElement,
    HtmlVideoElement,
    HtmlInputElement,
    HtmlButtonElement,
    HtmlFrameElement,
    HtmlIFrameElement,
    HtmlLinkElement,
    HtmlObjectElement,
    HtmlEmbedElement,
    HtmlScriptElement,
    HtmlDivElement,
    SvgElement,
}

impl SurfaceKind {
    /// The base element surface where attribute lookups stop.
    pub const BASE: SurfaceKind = SurfaceKind::HtmlElement;

    /// Returns the direct parent of this surface, or `None` for a root.
    pub fn parent(self) -> Option<SurfaceKind> {
        use SurfaceKind::*;

        match self {
            Window | DomParser | Range | Node => None,
            Document | Element => Some(Node),
            HtmlElement | SvgElement => Some(Element),
            HtmlAudioElement | HtmlVideoElement => Some(HtmlMediaElement),
            HtmlAnchorElement | HtmlAreaElement | HtmlBaseElement | HtmlSourceElement
            | HtmlImageElement | HtmlTrackElement | HtmlMediaElement | HtmlInputElement
            | HtmlButtonElement | HtmlFrameElement | HtmlIFrameElement | HtmlLinkElement
            | HtmlObjectElement | HtmlEmbedElement | HtmlScriptElement | HtmlDivElement => {
                Some(HtmlElement)
            }
        }
    }

    /// Returns the host-facing type name.
    pub fn type_name(self) -> &'static str {
        use SurfaceKind::*;

        match self {
            Window => "Window",
            Document => "Document",
            DomParser => "DOMParser",
            Range => "Range",
            Node => "Node",
            Element => "Element",
            HtmlElement => "HTMLElement",
            HtmlAnchorElement => "HTMLAnchorElement",
            HtmlAreaElement => "HTMLAreaElement",
            HtmlBaseElement => "HTMLBaseElement",
            HtmlSourceElement => "HTMLSourceElement",
            HtmlImageElement => "HTMLImageElement",
            HtmlTrackElement => "HTMLTrackElement",
            HtmlMediaElement => "HTMLMediaElement",
            HtmlAudioElement => "HTMLAudioElement",
            HtmlVideoElement => "HTMLVideoElement",
            HtmlInputElement => "HTMLInputElement",
            HtmlButtonElement => "HTMLButtonElement",
            HtmlFrameElement => "HTMLFrameElement",
            HtmlIFrameElement => "HTMLIFrameElement",
            HtmlLinkElement => "HTMLLinkElement",
            HtmlObjectElement => "HTMLObjectElement",
            HtmlEmbedElement => "HTMLEmbedElement",
            HtmlScriptElement => "HTMLScriptElement",
            HtmlDivElement => "HTMLDivElement",
            SvgElement => "SVGElement",
        }
    }

    /// Iterates over this surface and then each ancestor up to the root.
    ///
    /// # Examples
    ///
    /// ```
    /// use sink_guard::SurfaceKind;
    ///
    /// let chain: Vec<_> = SurfaceKind::HtmlVideoElement.ancestors().collect();
    /// assert_eq!(
    ///     chain,
    ///     vec![
    ///         SurfaceKind::HtmlVideoElement,
    ///         SurfaceKind::HtmlMediaElement,
    ///         SurfaceKind::HtmlElement,
    ///         SurfaceKind::Element,
    ///         SurfaceKind::Node,
    ///     ]
    /// );
    /// ```
    pub fn ancestors(self) -> Ancestors {
        Ancestors {
            next: Some(self),
            stop_after_base: false,
        }
    }

    /// Iterates over the chain consulted when resolving an attribute.
    ///
    /// Identical to [`ancestors`](Self::ancestors), except that the walk ends
    /// after yielding [`SurfaceKind::BASE`] when the chain passes through it.
    pub fn attribute_lookup_chain(self) -> Ancestors {
        Ancestors {
            next: Some(self),
            stop_after_base: true,
        }
    }

    /// Returns `true` if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(self, other: SurfaceKind) -> bool {
        other.ancestors().skip(1).any(|kind| kind == self)
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Iterator over a surface's parent chain.
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<SurfaceKind>,
    stop_after_base: bool,
}

impl Iterator for Ancestors {
    type Item = SurfaceKind;

    fn next(&mut self) -> Option<SurfaceKind> {
        let current = self.next?;
        self.next = if self.stop_after_base && current == SurfaceKind::BASE {
            None
        } else {
            current.parent()
        };
        Some(current)
    }
}

/// A handle to a host object that receives intercepted calls.
///
/// The handle carries the object's surface type, which is what attribute
/// resolution and diagnostics need; object state stays with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    surface: SurfaceKind,
    id: u64,
}

impl ObjectRef {
    /// Creates a handle for object `id` of type `surface`.
    pub fn new(surface: SurfaceKind, id: u64) -> Self {
        Self { surface, id }
    }

    /// Returns the object's surface type.
    pub fn surface(&self) -> SurfaceKind {
        self.surface
    }

    /// Returns the host-assigned object id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.surface, self.id)
    }
}
