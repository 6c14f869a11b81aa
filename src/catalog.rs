//! Declarative table of sinks and the trusted kind each requires.
//!
//! The catalog has two views:
//! - **Property sinks**: surface → property → kind, used for setters and,
//!   through the reflecting attribute name and
//!   [`SinkCatalog::resolve_attribute`], for `setAttribute`.
//! - **Standalone sinks**: an ordered list of functions whose argument at a
//!   fixed position must be trusted.
//!
//! Every `on*` member of the base element surface is an inline event
//! handler and requires [`TrustedKind::Script`].

use std::collections::BTreeMap;

use crate::{SurfaceKind, TrustedKind};

/// Prefix shared by inline event handler member names.
pub const EVENT_HANDLER_PREFIX: &str = "on";

/// Whether a sink is a property setter or a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A property assignment.
    Setter,
    /// A function call.
    Function,
}

/// One sink: where it lives, and what it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDescriptor {
    /// Surface that defines the sink.
    pub surface: SurfaceKind,
    /// Member name on that surface.
    pub member: String,
    /// Kind the sink's value must have.
    pub required_kind: TrustedKind,
    /// Position of the value in the argument list; `0` for setters.
    pub argument_position: usize,
    /// Setter or function.
    pub member_kind: MemberKind,
}

impl SinkDescriptor {
    fn function(surface: SurfaceKind, member: &str, kind: TrustedKind, position: usize) -> Self {
        Self {
            surface,
            member: member.to_string(),
            required_kind: kind,
            argument_position: position,
            member_kind: MemberKind::Function,
        }
    }
}

/// Inline event handlers of the base element surface.
///
/// Hosts that expose more handlers contribute them through
/// [`SinkCatalog::derive_event_handlers`].
const STANDARD_EVENT_HANDLERS: &[&str] = &[
    "onabort", "onanimationcancel", "onanimationend", "onanimationiteration",
    "onanimationstart", "onauxclick", "onbeforeinput", "onbeforematch", "onbeforetoggle",
    "onblur", "oncancel", "oncanplay", "oncanplaythrough", "onchange", "onclick", "onclose",
    "oncontextlost", "oncontextmenu", "oncontextrestored", "oncopy", "oncuechange", "oncut",
    "ondblclick", "ondrag", "ondragend", "ondragenter", "ondragleave", "ondragover",
    "ondragstart", "ondrop", "ondurationchange", "onemptied", "onended", "onerror", "onfocus",
    "onformdata", "ongotpointercapture", "oninput", "oninvalid", "onkeydown", "onkeypress",
    "onkeyup", "onload", "onloadeddata", "onloadedmetadata", "onloadstart",
    "onlostpointercapture", "onmousedown", "onmouseenter", "onmouseleave", "onmousemove",
    "onmouseout", "onmouseover", "onmouseup", "onmousewheel", "onpaste", "onpause", "onplay",
    "onplaying", "onpointercancel", "onpointerdown", "onpointerenter", "onpointerleave",
    "onpointermove", "onpointerout", "onpointerover", "onpointerrawupdate", "onpointerup",
    "onprogress", "onratechange", "onreset", "onresize", "onscroll", "onscrollend",
    "onsecuritypolicyviolation", "onseeked", "onseeking", "onselect", "onselectionchange",
    "onselectstart", "onslotchange", "onstalled", "onsubmit", "onsuspend", "ontimeupdate",
    "ontoggle", "ontouchcancel", "ontouchend", "ontouchmove", "ontouchstart",
    "ontransitioncancel", "ontransitionend", "ontransitionrun", "ontransitionstart",
    "onvolumechange", "onwaiting", "onwebkitanimationend", "onwebkitanimationiteration",
    "onwebkitanimationstart", "onwebkittransitionend", "onwheel",
];

/// A property sink and the content attribute that reflects it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PropertySink {
    required_kind: TrustedKind,
    attribute: Option<String>,
}

/// The sink table consulted by the [`Enforcer`](crate::Enforcer).
///
/// Property sinks are keyed by property name, which is what gets wrapped.
/// Attribute lookups go through the content attribute name instead, which
/// may be spelled differently (`formaction` reflects `formAction`) or be
/// absent for properties with no attribute behind them.
///
/// # Examples
///
/// ```
/// use sink_guard::{SinkCatalog, SurfaceKind, TrustedKind};
///
/// let catalog = SinkCatalog::standard();
///
/// assert_eq!(
///     catalog.required_kind(SurfaceKind::HtmlScriptElement, "src"),
///     Some(TrustedKind::ScriptUrl)
/// );
/// assert_eq!(
///     catalog.required_kind(SurfaceKind::HtmlElement, "onclick"),
///     Some(TrustedKind::Script)
/// );
/// assert_eq!(
///     catalog.resolve_attribute(SurfaceKind::HtmlButtonElement, "formaction"),
///     Some(TrustedKind::Url)
/// );
/// assert_eq!(catalog.standalone_sinks().len(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SinkCatalog {
    properties: BTreeMap<SurfaceKind, BTreeMap<String, PropertySink>>,
    standalone: Vec<SinkDescriptor>,
}

impl SinkCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the catalog of markup, URL and script sinks.
    pub fn standard() -> Self {
        use SurfaceKind::*;
        use TrustedKind::{Html, Script, ScriptUrl, Url};

        let mut catalog = Self::new()
            .with_property(Element, "innerHTML", Html)
            .with_property(Element, "outerHTML", Html)
            .with_property(HtmlAnchorElement, "href", Url)
            .with_property(HtmlAreaElement, "href", Url)
            .with_property(HtmlBaseElement, "href", Url)
            .with_property(HtmlSourceElement, "src", Url)
            .with_property(HtmlImageElement, "src", Url)
            .with_property(HtmlTrackElement, "src", Url)
            .with_property(HtmlMediaElement, "src", Url)
            .with_property(HtmlInputElement, "src", Url)
            .with_reflected_property(HtmlInputElement, "formAction", "formaction", Url)
            .with_reflected_property(HtmlButtonElement, "formAction", "formaction", Url)
            .with_property(HtmlFrameElement, "src", Url)
            .with_property(HtmlIFrameElement, "src", Url)
            .with_property(HtmlIFrameElement, "srcdoc", Html)
            .with_property(HtmlLinkElement, "href", ScriptUrl)
            .with_property(HtmlObjectElement, "data", ScriptUrl)
            .with_reflected_property(HtmlObjectElement, "codeBase", "codebase", ScriptUrl)
            .with_property(HtmlEmbedElement, "src", ScriptUrl)
            .with_property(HtmlScriptElement, "src", ScriptUrl)
            .with_property(HtmlScriptElement, "text", Script)
            .with_unreflected_property(HtmlScriptElement, "textContent", Script)
            .with_unreflected_property(HtmlScriptElement, "innerText", Script)
            .with_standalone(Range, "createContextualFragment", Html, 0)
            .with_standalone(Element, "insertAdjacentHTML", Html, 1)
            .with_standalone(Document, "write", Html, 0)
            .with_standalone(Window, "open", Url, 0)
            .with_standalone(DomParser, "parseFromString", Html, 0);

        catalog.derive_event_handlers(STANDARD_EVENT_HANDLERS.iter().copied());
        catalog
    }

    /// Adds a property sink reflected by the attribute of the same name.
    pub fn with_property(self, surface: SurfaceKind, member: &str, kind: TrustedKind) -> Self {
        self.with_sink(surface, member, Some(member), kind)
    }

    /// Adds a property sink reflected by a differently spelled attribute.
    pub fn with_reflected_property(
        self,
        surface: SurfaceKind,
        member: &str,
        attribute: &str,
        kind: TrustedKind,
    ) -> Self {
        self.with_sink(surface, member, Some(attribute), kind)
    }

    /// Adds a property sink that no content attribute reflects.
    ///
    /// The setter is wrapped, but [`resolve_attribute`](Self::resolve_attribute)
    /// never matches it.
    pub fn with_unreflected_property(
        self,
        surface: SurfaceKind,
        member: &str,
        kind: TrustedKind,
    ) -> Self {
        self.with_sink(surface, member, None, kind)
    }

    /// Appends a standalone function sink.
    pub fn with_standalone(
        mut self,
        surface: SurfaceKind,
        member: &str,
        kind: TrustedKind,
        argument_position: usize,
    ) -> Self {
        self.standalone
            .push(SinkDescriptor::function(surface, member, kind, argument_position));
        self
    }

    /// Registers every event-handler-like name among `base_members` as a
    /// script sink on [`SurfaceKind::BASE`].
    ///
    /// Names already registered are left alone.
    pub fn derive_event_handlers<S>(&mut self, base_members: impl IntoIterator<Item = S>)
    where
        S: AsRef<str>,
    {
        let handlers = self.properties.entry(SurfaceKind::BASE).or_default();
        for name in base_members {
            let name = name.as_ref();
            if is_event_handler(name) && !handlers.contains_key(name) {
                handlers.insert(
                    name.to_string(),
                    PropertySink {
                        required_kind: TrustedKind::Script,
                        attribute: Some(name.to_string()),
                    },
                );
            }
        }
    }

    /// Returns the kind required by property `member` declared directly on
    /// `surface`.
    pub fn required_kind(&self, surface: SurfaceKind, member: &str) -> Option<TrustedKind> {
        self.properties
            .get(&surface)?
            .get(member)
            .map(|sink| sink.required_kind)
    }

    /// Resolves the kind required when `attribute` is set on an object of
    /// type `surface`.
    ///
    /// Walks [`SurfaceKind::attribute_lookup_chain`], comparing attribute
    /// names ASCII case-insensitively, and stops at the first declaration.
    /// Declarations above [`SurfaceKind::BASE`] are never reached for HTML
    /// elements; `None` means no contract applies.
    pub fn resolve_attribute(&self, surface: SurfaceKind, attribute: &str) -> Option<TrustedKind> {
        surface.attribute_lookup_chain().find_map(|kind| {
            self.properties.get(&kind)?.values().find_map(|sink| {
                sink.attribute
                    .as_deref()
                    .filter(|name| name.eq_ignore_ascii_case(attribute))
                    .map(|_| sink.required_kind)
            })
        })
    }

    /// Iterates over property sinks, by surface then property name.
    pub fn property_sinks(&self) -> impl Iterator<Item = SinkDescriptor> + '_ {
        self.properties.iter().flat_map(|(surface, members)| {
            members.iter().map(move |(member, sink)| SinkDescriptor {
                surface: *surface,
                member: member.clone(),
                required_kind: sink.required_kind,
                argument_position: 0,
                member_kind: MemberKind::Setter,
            })
        })
    }

    /// Returns the standalone function sinks in installation order.
    pub fn standalone_sinks(&self) -> &[SinkDescriptor] {
        &self.standalone
    }

    fn with_sink(
        mut self,
        surface: SurfaceKind,
        member: &str,
        attribute: Option<&str>,
        kind: TrustedKind,
    ) -> Self {
        self.properties.entry(surface).or_default().insert(
            member.to_string(),
            PropertySink {
                required_kind: kind,
                attribute: attribute.map(str::to_string),
            },
        );
        self
    }
}

/// Returns `true` if `member` names an inline event handler.
pub fn is_event_handler(member: &str) -> bool {
    member.starts_with(EVENT_HANDLER_PREFIX)
}
