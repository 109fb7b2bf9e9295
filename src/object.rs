use std::any::Any;
use std::sync::Arc;

#[cfg(debug_assertions)]
use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::gfx::gl::GlDeviceContext;
use crate::gfx::{Buffer, DeviceContext, RenderContext};
use crate::os::Window;
use crate::{Error, Result};

/// Identifies an abstract interface, the high 16 bits of a `ClassId`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum InterfaceId {
    Null = 0,
    Object = 0x0010,
    Window = 0x0020,
    RenderContext = 0x0030,
    DeviceContext = 0x0040,
    Buffer = 0x0050,
}

impl InterfaceId {
    pub const INVALID: InterfaceId = InterfaceId::Null;
}

/// Identifies a concrete backend, the low 16 bits of a `ClassId`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ImplementationId {
    Null = 0,
    Generic = 1,
    Win32,
    OpenGL,
    Wgl,
}

impl ImplementationId {
    pub const INVALID: ImplementationId = ImplementationId::Null;
}

/// Composite (interface << 16 | implementation) type identifier.
/// An id with a null implementation names the abstract interface itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub const fn new(interface: InterfaceId, implementation: ImplementationId) -> Self {
        ClassId(((interface as u32) << 16) | implementation as u32)
    }

    /// The id of an interface with the invalid implementation.
    pub const fn of_interface(interface: InterfaceId) -> Self {
        Self::new(interface, ImplementationId::INVALID)
    }

    pub const fn from_raw(raw: u32) -> Self {
        ClassId(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn interface_bits(self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub const fn implementation_bits(self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    pub const fn is_abstract(self) -> bool {
        self.implementation_bits() == ImplementationId::INVALID as u16
    }
}

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Class id in the high 32 bits, a process unique serial in the low 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Builds an id without registering it.
    pub const fn new(class_id: ClassId, serial: u32) -> Self {
        ObjectId(((class_id.raw() as u64) << 32) | serial as u64)
    }

    pub const fn class_id(self) -> ClassId {
        ClassId((self.0 >> 32) as u32)
    }

    pub const fn serial(self) -> u32 {
        self.0 as u32
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.class_id(), self.serial())
    }
}

struct ObjectRegistry {
    counter: u32,
    #[cfg(debug_assertions)]
    live: BTreeMap<u32, ClassId>,
}

static REGISTRY: Mutex<ObjectRegistry> = parking_lot::const_mutex(ObjectRegistry {
    counter: 0,
    #[cfg(debug_assertions)]
    live: BTreeMap::new(),
});

fn next_serial(counter: u32) -> Option<u32> {
    counter.checked_add(1)
}

/// Owns the registration of an object id: allocated on construction, erased on drop.
/// Every concrete object embeds one of these.
#[derive(Debug)]
pub struct ObjectIdentity {
    id: ObjectId,
}

impl ObjectIdentity {
    pub fn new(class_id: ClassId) -> Self {
        let mut registry = REGISTRY.lock();
        let serial = match next_serial(registry.counter) {
            Some(serial) => serial,
            None => {
                log::error!("object serials exhausted, {:?} reuses serial {}", class_id, u32::MAX);
                u32::MAX
            }
        };
        registry.counter = serial;
        #[cfg(debug_assertions)]
        registry.live.insert(serial, class_id);
        ObjectIdentity {
            id: ObjectId::new(class_id, serial),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }
}

impl Drop for ObjectIdentity {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        REGISTRY.lock().live.remove(&self.id.serial());
    }
}

/// Snapshot of every object currently alive, in construction order.
#[cfg(debug_assertions)]
pub fn live_objects() -> Vec<ObjectId> {
    REGISTRY
        .lock()
        .live
        .iter()
        .map(|(serial, class_id)| ObjectId::new(*class_id, *serial))
        .collect()
}

/// Returns true while the object with `id` has not been dropped.
#[cfg(debug_assertions)]
pub fn is_live(id: ObjectId) -> bool {
    REGISTRY.lock().live.get(&id.serial()) == Some(&id.class_id())
}

/// Base for every polymorphic blaze object.
///
/// `castable_ids` is the fixed conformance list of the concrete type: its own class id followed by
/// the abstract id of every interface it implements. The `into_*` conversions hand out the same
/// allocation typed as one of those interfaces; concrete types override only the ones they conform to.
pub trait Object: Any + Send + Sync {
    fn get_object_id(&self) -> ObjectId;

    fn get_dynamic_class_id(&self) -> ClassId {
        self.get_object_id().class_id()
    }

    fn castable_ids(&self) -> &'static [ClassId];

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    fn into_object(self: Arc<Self>) -> Arc<dyn Object>;

    fn into_window(self: Arc<Self>) -> Option<Arc<dyn Window>> {
        None
    }

    fn into_render_context(self: Arc<Self>) -> Option<Arc<dyn RenderContext>> {
        None
    }

    fn into_device_context(self: Arc<Self>) -> Option<Arc<dyn DeviceContext>> {
        None
    }

    fn into_gl_device_context(self: Arc<Self>) -> Option<Arc<dyn GlDeviceContext>> {
        None
    }

    fn into_buffer(self: Arc<Self>) -> Option<Arc<dyn Buffer>> {
        None
    }
}

pub const OBJECT_CLASS: ClassId = ClassId::of_interface(InterfaceId::Object);

/// Compile time class id of an interface or concrete type.
pub trait StaticClass {
    const CLASS_ID: ClassId;
}

/// Types which can be the target of a capability cast.
pub trait Cast: StaticClass {
    /// Re-types an object, only called after the class id check has passed.
    fn from_object(object: Arc<dyn Object>) -> Option<Arc<Self>>;
}

impl StaticClass for dyn Object {
    const CLASS_ID: ClassId = OBJECT_CLASS;
}

impl Cast for dyn Object {
    fn from_object(object: Arc<dyn Object>) -> Option<Arc<Self>> {
        Some(object)
    }
}

/// Returns the object itself if `class_id` is in its conformance list, `None` otherwise.
pub fn cast_to(object: &Arc<dyn Object>, class_id: ClassId) -> Option<Arc<dyn Object>> {
    if object.castable_ids().contains(&class_id) {
        Some(object.clone())
    } else {
        None
    }
}

/// Non failing typed cast, `None` when `T` is not supported by the dynamic type.
pub fn try_cast<T: Cast + ?Sized>(object: &Arc<dyn Object>) -> Option<Arc<T>> {
    cast_to(object, T::CLASS_ID).and_then(T::from_object)
}

/// Typed cast which reports `InvalidCast` when `T` is not supported by the dynamic type.
pub fn cast<T: Cast + ?Sized>(object: &Arc<dyn Object>) -> Result<Arc<T>> {
    try_cast::<T>(object).ok_or_else(|| {
        Error::invalid_cast(format!(
            "object {} cannot be cast to class {}",
            object.get_object_id(),
            T::CLASS_ID
        ))
    })
}

/// Capability casts callable on any shared object reference, eg. `Arc<dyn Window>`
pub trait CastExt {
    fn cast_to(&self, class_id: ClassId) -> Option<Arc<dyn Object>>;
    fn try_cast<T: Cast + ?Sized>(&self) -> Option<Arc<T>>;
    fn cast<T: Cast + ?Sized>(&self) -> Result<Arc<T>>;
}

impl<O: Object + ?Sized> CastExt for Arc<O> {
    fn cast_to(&self, class_id: ClassId) -> Option<Arc<dyn Object>> {
        cast_to(&self.clone().into_object(), class_id)
    }

    fn try_cast<T: Cast + ?Sized>(&self) -> Option<Arc<T>> {
        try_cast::<T>(&self.clone().into_object())
    }

    fn cast<T: Cast + ?Sized>(&self) -> Result<Arc<T>> {
        cast::<T>(&self.clone().into_object())
    }
}

/// Implements `StaticClass`, `Cast` and `Object` for a concrete type with an `identity: ObjectIdentity` field.
///
/// ```ignore
/// impl_object!(HeadlessWindow, HEADLESS_WINDOW_CLASS, [OBJECT_CLASS, WINDOW_CLASS, HEADLESS_WINDOW_CLASS],
///     into_window -> crate::os::Window);
/// ```
#[macro_export]
macro_rules! impl_object {
    ($ty:ty, $class_id:expr, [$($castable:expr),* $(,)?] $(, $into:ident -> $tr:path)* $(,)?) => {
        impl $crate::object::StaticClass for $ty {
            const CLASS_ID: $crate::object::ClassId = $class_id;
        }

        impl $crate::object::Cast for $ty {
            fn from_object(
                object: ::std::sync::Arc<dyn $crate::object::Object>,
            ) -> Option<::std::sync::Arc<Self>> {
                $crate::object::Object::into_any(object).downcast::<Self>().ok()
            }
        }

        impl $crate::object::Object for $ty {
            fn get_object_id(&self) -> $crate::object::ObjectId {
                self.identity.id()
            }

            fn castable_ids(&self) -> &'static [$crate::object::ClassId] {
                const CASTABLE_IDS: &[$crate::object::ClassId] = &[$($castable),*];
                CASTABLE_IDS
            }

            fn into_any(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn ::std::any::Any + Send + Sync> {
                self
            }

            fn into_object(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::sync::Arc<dyn $crate::object::Object> {
                self
            }

            $(
                fn $into(self: ::std::sync::Arc<Self>) -> Option<::std::sync::Arc<dyn $tr>> {
                    Some(self)
                }
            )*
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serials_stop_at_the_counter_limit() {
        assert_eq!(next_serial(0), Some(1));
        assert_eq!(next_serial(u32::MAX - 1), Some(u32::MAX));
        assert_eq!(next_serial(u32::MAX), None);
    }

    #[test]
    fn class_id_packs_interface_and_implementation() {
        let id = ClassId::new(InterfaceId::Window, ImplementationId::Win32);
        assert_eq!(id.raw(), 0x0020_0002);
        assert_eq!(id.interface_bits(), InterfaceId::Window as u16);
        assert_eq!(id.implementation_bits(), ImplementationId::Win32 as u16);
        assert!(!id.is_abstract());
        assert!(ClassId::of_interface(InterfaceId::Window).is_abstract());
    }

    #[test]
    fn object_id_packs_class_and_serial() {
        let class_id = ClassId::new(InterfaceId::Buffer, ImplementationId::OpenGL);
        let id = ObjectId::new(class_id, 42);
        assert_eq!(id.class_id(), class_id);
        assert_eq!(id.serial(), 42);
        assert_eq!(id.raw(), ((class_id.raw() as u64) << 32) | 42);
    }

    #[test]
    fn identities_are_strictly_increasing() {
        let class_id = ClassId::of_interface(InterfaceId::Object);
        let a = ObjectIdentity::new(class_id);
        let b = ObjectIdentity::new(class_id);
        assert!(b.id().serial() > a.id().serial());
        assert_eq!(a.id().class_id(), class_id);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn dropped_identity_leaves_registry() {
        let identity = ObjectIdentity::new(OBJECT_CLASS);
        let id = identity.id();
        assert!(is_live(id));
        drop(identity);
        assert!(!is_live(id));
        assert!(!live_objects().contains(&id));
    }
}
