//! Effect records and dependency lists.
//!
//! An effect hook keeps one [`EffectInstance`] for its whole lifetime. Each
//! render produces a fresh [`Effect`] record pointing at that instance, so
//! the cleanup returned by the last run survives re-renders that skip the
//! effect.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::types::HookFlags;

use super::state::Dispatch;

/// Cleanup returned by an effect.
pub type Cleanup = Box<dyn FnOnce()>;

/// Effect body. May return a cleanup to run before the next run or on unmount.
pub(crate) type EffectCallback = Box<dyn FnOnce() -> Option<Cleanup>>;

// =============================================================================
// Effect Instance
// =============================================================================

/// Destroy slot shared by every record of one effect hook.
#[derive(Default)]
pub(crate) struct EffectInstance {
    destroy: RefCell<Option<Cleanup>>,
}

// =============================================================================
// Effect
// =============================================================================

/// One effect record: the body to run and the deps it was declared with.
pub(crate) struct Effect {
    pub(crate) tags: HookFlags,
    create: RefCell<Option<EffectCallback>>,
    instance: Rc<EffectInstance>,
    pub(crate) deps: Option<Vec<Dep>>,
}

impl Effect {
    pub(crate) fn new(
        tags: HookFlags,
        create: EffectCallback,
        instance: Rc<EffectInstance>,
        deps: Option<Vec<Dep>>,
    ) -> Self {
        Self {
            tags,
            create: RefCell::new(Some(create)),
            instance,
            deps,
        }
    }

    pub(crate) fn instance(&self) -> &Rc<EffectInstance> {
        &self.instance
    }

    /// Whether this record was scheduled to run in its commit.
    #[inline]
    pub(crate) fn should_fire(&self) -> bool {
        self.tags.contains(HookFlags::PASSIVE | HookFlags::HAS_EFFECT)
    }

    /// Run the body once and keep whatever cleanup it returns.
    pub(crate) fn run_create(&self) {
        let create = self.create.borrow_mut().take();
        if let Some(create) = create {
            let destroy = create();
            *self.instance.destroy.borrow_mut() = destroy;
        }
    }

    /// Run and clear the stored cleanup, if any.
    pub(crate) fn run_destroy(&self) {
        let destroy = self.instance.destroy.borrow_mut().take();
        if let Some(destroy) = destroy {
            destroy();
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("tags", &self.tags)
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Dependencies
// =============================================================================

/// One entry of an effect dependency list.
///
/// Plain values (numbers, strings, bools) compare by value. Shared values
/// (`Rc`, dispatchers) compare by identity, so a new allocation with equal
/// contents still counts as a change. Floats compare by bit pattern: `NaN`
/// equals itself and `0.0` differs from `-0.0`.
#[derive(Clone)]
pub struct Dep(DepRepr);

#[derive(Clone)]
enum DepRepr {
    Value(Rc<dyn DepValue>),
    Shared(Rc<dyn Any>),
}

trait DepValue: fmt::Debug {
    fn eq_dyn(&self, other: &dyn Any) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: PartialEq + fmt::Debug + 'static> DepValue for T {
    fn eq_dyn(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| other == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Dep {
    /// Compare by value.
    pub fn value<T: PartialEq + fmt::Debug + 'static>(value: T) -> Self {
        Dep(DepRepr::Value(Rc::new(value)))
    }

    /// Compare by identity of the allocation.
    pub fn shared<T: 'static>(value: &Rc<T>) -> Self {
        let any: Rc<dyn Any> = value.clone();
        Dep(DepRepr::Shared(any))
    }

    /// Same-value comparison used to decide whether an effect re-runs.
    pub fn same(&self, other: &Dep) -> bool {
        match (&self.0, &other.0) {
            (DepRepr::Value(a), DepRepr::Value(b)) => a.eq_dyn(b.as_any()),
            (DepRepr::Shared(a), DepRepr::Shared(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            DepRepr::Value(value) => fmt::Debug::fmt(value, f),
            DepRepr::Shared(any) => write!(f, "Shared({:p})", Rc::as_ptr(any)),
        }
    }
}

macro_rules! value_dep {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Dep {
                fn from(value: $ty) -> Self {
                    Dep::value(value)
                }
            }
        )*
    };
}

value_dep!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, bool, char, String, &'static str);

impl From<f64> for Dep {
    fn from(value: f64) -> Self {
        Dep::value(FloatBits(value.to_bits()))
    }
}

impl From<f32> for Dep {
    fn from(value: f32) -> Self {
        Dep::from(f64::from(value))
    }
}

impl From<Rc<str>> for Dep {
    fn from(value: Rc<str>) -> Self {
        Dep::value(value.to_string())
    }
}

impl<T: 'static> From<Rc<T>> for Dep {
    fn from(value: Rc<T>) -> Self {
        Dep::shared(&value)
    }
}

impl<S: 'static> From<Dispatch<S>> for Dep {
    fn from(dispatch: Dispatch<S>) -> Self {
        dispatch.identity()
    }
}

impl<S: 'static> From<&Dispatch<S>> for Dep {
    fn from(dispatch: &Dispatch<S>) -> Self {
        dispatch.identity()
    }
}

#[derive(Debug, PartialEq)]
struct FloatBits(u64);

/// Whether two dependency lists are the same, element by element.
///
/// Lists of different length never match.
pub(crate) fn are_deps_equal(next: &[Dep], prev: &[Dep]) -> bool {
    next.len() == prev.len() && next.iter().zip(prev).all(|(a, b)| a.same(b))
}

/// Build an effect dependency list.
///
/// `deps![]` runs the effect once after mount. `deps![a, b]` re-runs it when
/// `a` or `b` changes. Pass `None` instead to run after every commit.
///
/// ```
/// use spark_fiber::{deps, Dep};
///
/// let count = 3;
/// let list: Option<Vec<Dep>> = deps![count, "label"];
/// assert_eq!(list.map(|d| d.len()), Some(2));
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        ::std::option::Option::Some(::std::vec::Vec::<$crate::Dep>::new())
    };
    ($($dep:expr),+ $(,)?) => {
        ::std::option::Option::Some(::std::vec![$($crate::Dep::from($dep)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_value_deps_compare_by_value() {
        assert!(Dep::from(1).same(&Dep::from(1)));
        assert!(!Dep::from(1).same(&Dep::from(2)));
        assert!(Dep::from(String::from("a")).same(&Dep::from(String::from("a"))));
        // Different types never match
        assert!(!Dep::from(1i32).same(&Dep::from(1i64)));
    }

    #[test]
    fn test_float_deps_follow_same_value() {
        assert!(Dep::from(f64::NAN).same(&Dep::from(f64::NAN)));
        assert!(!Dep::from(0.0).same(&Dep::from(-0.0)));
    }

    #[test]
    fn test_shared_deps_compare_by_identity() {
        let a = Rc::new(vec![1, 2]);
        let b = Rc::new(vec![1, 2]);
        assert!(Dep::from(a.clone()).same(&Dep::from(a.clone())));
        assert!(!Dep::from(a).same(&Dep::from(b)));
    }

    #[test]
    fn test_are_deps_equal_length_mismatch() {
        let one = deps![1].unwrap_or_default();
        let two = deps![1, 2].unwrap_or_default();
        assert!(!are_deps_equal(&one, &two));
        assert!(are_deps_equal(&two, &deps![1, 2].unwrap_or_default()));
        assert!(are_deps_equal(&[], &[]));
    }

    #[test]
    fn test_effect_create_then_destroy() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let instance = Rc::new(EffectInstance::default());

        let l = log.clone();
        let effect = Effect::new(
            HookFlags::PASSIVE | HookFlags::HAS_EFFECT,
            Box::new(move || {
                l.borrow_mut().push("create");
                let l = l.clone();
                Some(Box::new(move || l.borrow_mut().push("destroy")) as Cleanup)
            }),
            instance,
            None,
        );

        assert!(effect.should_fire());
        effect.run_create();
        // Body only runs once
        effect.run_create();
        effect.run_destroy();
        effect.run_destroy();
        assert_eq!(*log.borrow(), vec!["create", "destroy"]);
    }

    #[test]
    fn test_cleanup_survives_across_records() {
        let calls = Rc::new(Cell::new(0));
        let instance = Rc::new(EffectInstance::default());

        let c = calls.clone();
        let first = Effect::new(
            HookFlags::PASSIVE | HookFlags::HAS_EFFECT,
            Box::new(move || Some(Box::new(move || c.set(c.get() + 1)) as Cleanup)),
            instance.clone(),
            None,
        );
        first.run_create();

        // A later record that did not fire still reaches the same cleanup
        let second = Effect::new(HookFlags::PASSIVE, Box::new(|| None), instance, None);
        assert!(!second.should_fire());
        second.run_destroy();
        assert_eq!(calls.get(), 1);
    }
}
