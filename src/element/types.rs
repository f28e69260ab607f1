//! Element types - the declarative description a render produces.
//!
//! An [`Element`] names a host tag or a component, an optional key, and props.
//! A [`Child`] is anything that can sit in a child position: nothing, text,
//! one element, or a list.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::hooks::Hooks;

// =============================================================================
// Keys
// =============================================================================

/// Reconciliation identity among siblings.
pub type Key = Rc<str>;

// =============================================================================
// Components
// =============================================================================

/// A function-style stateful component.
///
/// Any `Fn(&mut Hooks) -> Result<Child>` is a component, so plain functions
/// and closures work directly. Structs implement it to carry props.
///
/// Component identity is the Rust type: two elements refer to the same
/// component when their component values have the same type. Every `fn` item
/// and every closure expression has its own type.
pub trait Component: 'static {
    /// Produce the child description for this render.
    fn render(&self, hooks: &mut Hooks<'_>) -> Result<Child>;

    /// Display name for diagnostics.
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

impl<F> Component for F
where
    F: Fn(&mut Hooks<'_>) -> Result<Child> + 'static,
{
    fn render(&self, hooks: &mut Hooks<'_>) -> Result<Child> {
        self(hooks)
    }
}

/// Identity of a component type.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
}

impl ComponentType {
    /// The identity of component type `C`.
    pub fn of<C: Component>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: short_type_name(std::any::type_name::<C>()),
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strip the module path, keeping generics intact.
///
/// Closures keep the path segment that encloses them, e.g.
/// `app::{{closure}}`, since `{{closure}}` alone names nothing.
fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    let Some(pos) = head.rfind("::") else {
        return full;
    };
    let mut start = pos + 2;
    while head[start..].starts_with("{{closure}}") {
        match head[..start - 2].rfind("::") {
            Some(pos) => start = pos + 2,
            None => return full,
        }
    }
    &full[start..]
}

// =============================================================================
// Element Type
// =============================================================================

/// What an element renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    /// A host element tag, e.g. `div`.
    Host(Rc<str>),
    /// A component.
    Component(ComponentType),
}

// =============================================================================
// Attribute Values
// =============================================================================

/// A host attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(Rc<str>),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.into())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value.into())
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value.into())
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Int(n) => write!(f, "{n}"),
            AttrValue::Float(n) => write!(f, "{n}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

// =============================================================================
// Props
// =============================================================================

/// Props of a host element: attributes plus children.
#[derive(Debug, Clone, Default)]
pub struct HostProps {
    pub attrs: BTreeMap<String, AttrValue>,
    pub children: Child,
}

impl HostProps {
    /// Attribute lookup.
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }
}

/// Props as stored on a fiber.
#[derive(Clone)]
pub enum Props {
    /// The root has no props; its element tree lives in its state.
    Root,
    /// Host element props.
    Host(Rc<HostProps>),
    /// Host text content.
    Text(Rc<str>),
    /// The component value itself carries the props.
    Component(Rc<dyn Component>),
}

impl Props {
    /// Host props, if these are host element props.
    pub fn as_host(&self) -> Option<&HostProps> {
        match self {
            Props::Host(props) => Some(props),
            _ => None,
        }
    }

    /// Text content, if these are text props.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Props::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether committing `next` over `self` needs a host update.
    ///
    /// Host attributes compare by value, text by content. Children never
    /// count; they are reconciled as fibers.
    pub fn host_changed(&self, next: &Props) -> bool {
        match (self, next) {
            (Props::Host(a), Props::Host(b)) => !Rc::ptr_eq(a, b) && a.attrs != b.attrs,
            (Props::Text(a), Props::Text(b)) => a != b,
            _ => false,
        }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Props::Root => f.write_str("Root"),
            Props::Host(props) => f.debug_map().entries(props.attrs.iter()).finish(),
            Props::Text(text) => write!(f, "{text:?}"),
            Props::Component(component) => write!(f, "<{}>", component.name()),
        }
    }
}

// =============================================================================
// Element
// =============================================================================

/// A description of one node in the desired tree.
#[derive(Clone)]
pub struct Element {
    pub(crate) element_type: ElementType,
    pub(crate) key: Option<Key>,
    pub(crate) props: Props,
}

impl Element {
    /// The element's type.
    pub fn element_type(&self) -> &ElementType {
        &self.element_type
    }

    /// The element's key.
    pub fn key_ref(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// The element's props.
    pub fn props(&self) -> &Props {
        &self.props
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Element");
        match &self.element_type {
            ElementType::Host(tag) => s.field("tag", tag),
            ElementType::Component(ty) => s.field("component", ty),
        };
        if let Some(key) = &self.key {
            s.field("key", key);
        }
        if let Props::Host(props) = &self.props {
            s.field("attrs", &props.attrs);
            s.field("children", &props.children);
        }
        s.finish()
    }
}

// =============================================================================
// Child
// =============================================================================

/// Anything that can appear in a child position.
#[derive(Clone, Default)]
pub enum Child {
    /// Nothing is rendered here.
    #[default]
    Empty,
    /// A text node. Numbers convert to text.
    Text(Rc<str>),
    /// A single element.
    Element(Element),
    /// Several siblings, reconciled by key or position.
    List(Vec<Child>),
}

impl Child {
    /// True for [`Child::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Child::Empty)
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Empty => f.write_str("Empty"),
            Child::Text(text) => write!(f, "{text:?}"),
            Child::Element(element) => fmt::Debug::fmt(element, f),
            Child::List(children) => f.debug_list().entries(children).finish(),
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(element)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.into())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text.into())
    }
}

impl From<Rc<str>> for Child {
    fn from(text: Rc<str>) -> Self {
        Child::Text(text)
    }
}

impl From<()> for Child {
    fn from(_: ()) -> Self {
        Child::Empty
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Child::Empty, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(items: Vec<T>) -> Self {
        Child::List(items.into_iter().map(Into::into).collect())
    }
}

macro_rules! number_child {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Text(value.to_string().into())
                }
            }
        )*
    };
}

number_child!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("my_app::ui::Counter"), "Counter");
        assert_eq!(short_type_name("Counter"), "Counter");
        assert_eq!(short_type_name("a::List<b::Item>"), "List<b::Item>");
    }

    #[test]
    fn test_short_type_name_of_closures() {
        assert_eq!(short_type_name("app::ui::{{closure}}"), "ui::{{closure}}");
        assert_eq!(short_type_name("app::{{closure}}::{{closure}}"), "app::{{closure}}::{{closure}}");
        assert_eq!(short_type_name("main::{{closure}}"), "main::{{closure}}");
    }

    #[test]
    fn test_closure_component_name_keeps_enclosing_fn() {
        fn name_of<F>(component: &F) -> &'static str
        where
            F: Fn(&mut Hooks<'_>) -> Result<Child> + 'static,
        {
            component.name()
        }
        let name = name_of(&|_: &mut Hooks<'_>| Ok(Child::Empty));
        assert!(name.ends_with("::{{closure}}"), "{name}");
        assert!(name.starts_with("test_closure_component_name_keeps_enclosing_fn::"), "{name}");
    }

    #[test]
    fn test_number_children_become_text() {
        match Child::from(42) {
            Child::Text(text) => assert_eq!(&*text, "42"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_option_and_vec_children() {
        assert!(Child::from(None::<&str>).is_empty());
        match Child::from(vec!["a", "b"]) {
            Child::List(items) => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_host_changed_ignores_children() {
        let mut a = HostProps::default();
        a.attrs.insert("id".into(), "x".into());
        let mut b = a.clone();
        b.children = Child::from("new");

        assert!(!Props::Host(Rc::new(a.clone())).host_changed(&Props::Host(Rc::new(b))));

        let mut c = a.clone();
        c.attrs.insert("id".into(), "y".into());
        assert!(Props::Host(Rc::new(a)).host_changed(&Props::Host(Rc::new(c))));
    }

    #[test]
    fn test_text_changed() {
        let a = Props::Text("a".into());
        assert!(a.host_changed(&Props::Text("b".into())));
        assert!(!a.host_changed(&Props::Text("a".into())));
    }
}
