//! Elements - the declarative tree that application code builds.
//!
//! This is a deliberately small factory: enough to describe host elements,
//! text, components, keys, and attributes. No refs, no JSX.
//!
//! # Example
//!
//! ```
//! use spark_fiber::{Child, Element};
//!
//! let list = Element::host("ul").children(
//!     ["a", "b", "c"]
//!         .iter()
//!         .map(|id| Element::host("li").key(id).child(*id)),
//! );
//!
//! let page: Child = Element::host("div")
//!     .attr("id", "main")
//!     .child("Items:")
//!     .child(list)
//!     .into();
//! ```

mod types;

pub use types::*;

use std::rc::Rc;

use crate::error::Result;
use crate::hooks::Hooks;

impl Element {
    /// A host element with the given tag and no attributes or children.
    pub fn host(tag: impl Into<Rc<str>>) -> Self {
        Self {
            element_type: ElementType::Host(tag.into()),
            key: None,
            props: Props::Host(Rc::new(HostProps::default())),
        }
    }

    /// A component element. The component value carries its props.
    pub fn component<C: Component>(component: C) -> Self {
        Self {
            element_type: ElementType::Component(ComponentType::of::<C>()),
            key: None,
            props: Props::Component(Rc::new(component)),
        }
    }

    /// A component element from a closure.
    ///
    /// Same as [`component`](Self::component), but the `Fn` bound lets the
    /// closure's argument and return types be inferred.
    pub fn function<F>(render: F) -> Self
    where
        F: Fn(&mut Hooks<'_>) -> Result<Child> + 'static,
    {
        Self::component(render)
    }

    /// Set the reconciliation key. Keys are compared as strings.
    pub fn key(mut self, key: impl ToString) -> Self {
        self.key = Some(key.to_string().into());
        self
    }

    /// Set a host attribute. Ignored (with a debug assertion) on components.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        match &mut self.props {
            Props::Host(props) => {
                Rc::make_mut(props).attrs.insert(name.into(), value.into());
            }
            _ => debug_assert!(false, "attributes only apply to host elements"),
        }
        self
    }

    /// Append one child. A single child stays single; a second one turns the
    /// children into a list.
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        match &mut self.props {
            Props::Host(props) => {
                let props = Rc::make_mut(props);
                let next = child.into();
                props.children = match std::mem::take(&mut props.children) {
                    Child::Empty => next,
                    Child::List(mut items) => {
                        items.push(next);
                        Child::List(items)
                    }
                    single => Child::List(vec![single, next]),
                };
            }
            _ => debug_assert!(false, "children only apply to host elements"),
        }
        self
    }

    /// Replace the children with a list.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Child>,
    {
        match &mut self.props {
            Props::Host(props) => {
                Rc::make_mut(props).children =
                    Child::List(children.into_iter().map(Into::into).collect());
            }
            _ => debug_assert!(false, "children only apply to host elements"),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_builder() {
        let el = Element::host("div").key(1).attr("id", "x").child("hi");
        assert_eq!(el.key_ref().map(|k| &**k), Some("1"));
        let props = el.props().as_host().unwrap();
        assert_eq!(props.attr("id"), Some(&AttrValue::from("x")));
        assert!(matches!(props.children, Child::Text(_)));
    }

    #[test]
    fn test_second_child_makes_list() {
        let el = Element::host("p").child("a").child("b").child("c");
        match &el.props().as_host().unwrap().children {
            Child::List(items) => assert_eq!(items.len(), 3),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_component_identity() {
        fn app(_: &mut Hooks<'_>) -> Result<Child> {
            Ok(Child::Empty)
        }
        fn other(_: &mut Hooks<'_>) -> Result<Child> {
            Ok(Child::Empty)
        }

        let a = Element::component(app);
        let b = Element::component(app);
        let c = Element::component(other);
        assert_eq!(a.element_type(), b.element_type());
        assert_ne!(a.element_type(), c.element_type());
    }
}
