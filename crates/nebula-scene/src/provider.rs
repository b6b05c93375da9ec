//! Property providers: the shared data stores read by loaders and renderers.
//!
//! A [`Provider`] is a bag of typed properties with a stable [`Uuid`]. Every
//! change to a property is announced on [`Provider::property_changed`].

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat4, Vec3, Vec4};
use rustc_hash::FxHashMap;
use uuid::Uuid;

use crate::signal::Signal;

/// A property value stored in a [`Provider`].
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

/// Conversion between Rust types and [`Value`].
pub trait PropertyValue: Sized {
    /// Extract `Self` from a value, or `None` on a type mismatch.
    fn from_value(value: &Value) -> Option<Self>;
    /// Wrap `self` in a value.
    fn into_value(self) -> Value;
}

macro_rules! property_value {
    ($ty:ty, $variant:ident) => {
        impl PropertyValue for $ty {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

property_value!(i32, Int);
property_value!(f32, Float);
property_value!(Vec3, Vec3);
property_value!(Vec4, Vec4);
property_value!(Mat4, Mat4);

/// Payload of [`Provider::property_changed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyChanged {
    /// Identifier of the provider that changed.
    pub provider: Uuid,
    /// Name of the property that was set or removed.
    pub name: String,
}

/// A typed property store with change notification.
#[derive(Debug)]
pub struct Provider {
    uuid: Uuid,
    values: RefCell<FxHashMap<String, Value>>,
    property_changed: Signal<PropertyChanged>,
}

impl Provider {
    /// Create an empty provider with a fresh random identifier.
    pub fn new() -> Rc<Self> {
        Self::with_uuid(Uuid::new_v4())
    }

    /// Create an empty provider with a caller-chosen identifier.
    pub fn with_uuid(uuid: Uuid) -> Rc<Self> {
        Rc::new(Self {
            uuid,
            values: RefCell::new(FxHashMap::default()),
            property_changed: Signal::new(),
        })
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }

    /// Read a property. Returns `None` when it is absent or of another type.
    pub fn get<T: PropertyValue>(&self, name: &str) -> Option<T> {
        self.values.borrow().get(name).and_then(T::from_value)
    }

    /// Write a property.
    ///
    /// Listeners are notified only when the stored value actually changes.
    pub fn set<T: PropertyValue>(&self, name: &str, value: T) {
        let value = value.into_value();
        {
            let mut values = self.values.borrow_mut();
            if values.get(name) == Some(&value) {
                return;
            }
            values.insert(name.to_owned(), value);
        }
        self.notify(name);
    }

    /// Remove a property. Returns `true` if it was present.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.values.borrow_mut().remove(name).is_some();
        if removed {
            self.notify(name);
        }
        removed
    }

    /// Signal fired after a property is set to a new value or removed.
    pub fn property_changed(&self) -> &Signal<PropertyChanged> {
        &self.property_changed
    }

    fn notify(&self, name: &str) {
        self.property_changed.emit(&PropertyChanged {
            provider: self.uuid,
            name: name.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_get_returns_typed_value() {
        let provider = Provider::new();
        provider.set("requiredLod", 2);
        provider.set("priority", 0.5_f32);

        assert_eq!(provider.get::<i32>("requiredLod"), Some(2));
        assert_eq!(provider.get::<f32>("priority"), Some(0.5));
        assert_eq!(provider.get::<f32>("requiredLod"), None);
        assert_eq!(provider.get::<i32>("missing"), None);
    }

    #[test]
    fn test_set_same_value_does_not_notify() {
        let provider = Provider::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = provider.property_changed().connect(move |_| h.set(h.get() + 1));

        provider.set("requiredLod", 1);
        provider.set("requiredLod", 1);
        provider.set("requiredLod", 3);

        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_notification_carries_name_and_uuid() {
        let provider = Provider::new();
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        let _sub = provider
            .property_changed()
            .connect(move |change| *s.borrow_mut() = Some(change.clone()));

        provider.set("viewport", Vec4::new(0.0, 0.0, 800.0, 600.0));

        let change = seen.borrow().clone().unwrap();
        assert_eq!(change.provider, provider.uuid());
        assert_eq!(change.name, "viewport");
    }

    #[test]
    fn test_remove_notifies_only_when_present() {
        let provider = Provider::new();
        provider.set("fov", 1.0_f32);
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let _sub = provider.property_changed().connect(move |_| h.set(h.get() + 1));

        assert!(provider.remove("fov"));
        assert!(!provider.remove("fov"));
        assert!(!provider.has_property("fov"));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_uuids_are_unique() {
        assert_ne!(Provider::new().uuid(), Provider::new().uuid());
    }
}
