//! Lifecycle hooks the pool invokes on the objects it manages

use std::fmt;
use std::sync::Arc;

/// Capability set a pool uses to create, prepare, check and dispose of objects.
///
/// Only [`make`](PooledObjectFactory::make) is required. The remaining hooks
/// default to no-ops, and `validate` defaults to accepting everything.
///
/// `validate` and `destroy` may be called from caller threads while the
/// coordinator is running other hooks, hence the `Send + Sync` bound.
pub trait PooledObjectFactory<T>: Send + Sync {
    /// Construct a new object
    fn make(&self) -> T;

    /// Prepare an idle object for a borrower
    fn activate(&self, _object: &mut T) {}

    /// Reset an object that is going back to idle
    fn passivate(&self, _object: &mut T) {}

    /// Check that an object is still usable
    fn validate(&self, _object: &T) -> bool {
        true
    }

    /// Dispose of an object that leaves the pool for good
    fn destroy(&self, _object: T) {}
}

pub(crate) type SharedFactory<T> = Arc<dyn PooledObjectFactory<T>>;

type MakeFn<T> = Box<dyn Fn() -> T + Send + Sync>;
type MutateFn<T> = Box<dyn Fn(&mut T) + Send + Sync>;
type ValidateFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type DestroyFn<T> = Box<dyn Fn(T) + Send + Sync>;

/// Closure-backed factory where every hook except `make` is optional.
///
/// # Examples
///
/// ```
/// use gompool::{DefaultPooledObjectFactory, PooledObjectFactory};
///
/// let factory = DefaultPooledObjectFactory::new(|| Vec::<u8>::with_capacity(64))
///     .on_passivate(|buf| buf.clear())
///     .on_validate(|buf| buf.capacity() >= 64);
///
/// let mut buf = factory.make();
/// buf.push(1);
/// factory.passivate(&mut buf);
/// assert!(buf.is_empty());
/// assert!(factory.validate(&buf));
/// ```
pub struct DefaultPooledObjectFactory<T> {
    make: MakeFn<T>,
    activate: Option<MutateFn<T>>,
    passivate: Option<MutateFn<T>>,
    validate: Option<ValidateFn<T>>,
    destroy: Option<DestroyFn<T>>,
}

impl<T> DefaultPooledObjectFactory<T> {
    pub fn new<F>(make: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            make: Box::new(make),
            activate: None,
            passivate: None,
            validate: None,
            destroy: None,
        }
    }

    pub fn on_activate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.activate = Some(Box::new(hook));
        self
    }

    pub fn on_passivate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.passivate = Some(Box::new(hook));
        self
    }

    pub fn on_validate<F>(mut self, hook: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.validate = Some(Box::new(hook));
        self
    }

    pub fn on_destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.destroy = Some(Box::new(hook));
        self
    }
}

impl<T> PooledObjectFactory<T> for DefaultPooledObjectFactory<T> {
    fn make(&self) -> T {
        (self.make)()
    }

    fn activate(&self, object: &mut T) {
        if let Some(hook) = &self.activate {
            hook(object);
        }
    }

    fn passivate(&self, object: &mut T) {
        if let Some(hook) = &self.passivate {
            hook(object);
        }
    }

    fn validate(&self, object: &T) -> bool {
        self.validate.as_ref().is_none_or(|hook| hook(object))
    }

    fn destroy(&self, object: T) {
        if let Some(hook) = &self.destroy {
            hook(object);
        }
    }
}

impl<T> fmt::Debug for DefaultPooledObjectFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultPooledObjectFactory")
            .field("activate", &self.activate.is_some())
            .field("passivate", &self.passivate.is_some())
            .field("validate", &self.validate.is_some())
            .field("destroy", &self.destroy.is_some())
            .finish_non_exhaustive()
    }
}
