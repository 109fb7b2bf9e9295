use std::sync::Arc;

use blaze::gfx::{Buffer, DeviceContext, RenderContext, BUFFER_CLASS, DEVICE_CONTEXT_CLASS};
use blaze::object::{
    ClassId, ImplementationId, InterfaceId, Object, ObjectIdentity, OBJECT_CLASS,
};
use blaze::os::headless::{HeadlessWindow, HEADLESS_WINDOW_CLASS};
use blaze::os::{Window, WindowApi, WindowCreateInfo, WINDOW_CLASS};
use blaze::{cast, cast_to, try_cast, CastExt, ResultCode, StaticClass};

const PLAIN_CLASS: ClassId = ClassId::new(InterfaceId::Object, ImplementationId::Generic);

struct Plain {
    identity: ObjectIdentity,
}

blaze::impl_object!(Plain, PLAIN_CLASS, [OBJECT_CLASS, PLAIN_CLASS]);

fn plain() -> Arc<dyn Object> {
    Arc::new(Plain {
        identity: ObjectIdentity::new(PLAIN_CLASS),
    })
}

fn headless_window() -> Arc<dyn Window> {
    blaze::os::create_window(&WindowCreateInfo {
        window_api: WindowApi::Headless,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn object_ids_carry_the_dynamic_class() {
    let object = plain();
    assert_eq!(object.get_object_id().class_id(), PLAIN_CLASS);
    assert_eq!(object.get_dynamic_class_id(), PLAIN_CLASS);
    assert_eq!(object.castable_ids(), &[OBJECT_CLASS, PLAIN_CLASS]);

    let window = headless_window();
    assert_eq!(window.get_dynamic_class_id(), HEADLESS_WINDOW_CLASS);
    assert_ne!(window.get_object_id(), object.get_object_id());
}

#[test]
fn cast_to_follows_the_conformance_list() {
    let object = plain();
    assert!(cast_to(&object, OBJECT_CLASS).is_some());
    assert!(cast_to(&object, PLAIN_CLASS).is_some());
    assert!(cast_to(&object, WINDOW_CLASS).is_none());
    assert!(cast_to(&object, ClassId::of_interface(InterfaceId::Null)).is_none());

    let window = headless_window().into_object();
    let same = cast_to(&window, WINDOW_CLASS).unwrap();
    assert_eq!(same.get_object_id(), window.get_object_id());
    assert!(Arc::ptr_eq(&same, &window));
    assert!(cast_to(&window, DEVICE_CONTEXT_CLASS).is_none());
    assert!(cast_to(&window, BUFFER_CLASS).is_none());
}

#[test]
fn typed_casts_between_interfaces_and_concrete_types() {
    let window = headless_window();
    let object = window.clone().into_object();

    let as_window = try_cast::<dyn Window>(&object).unwrap();
    assert_eq!(as_window.get_object_id(), window.get_object_id());

    let headless = window.try_cast::<HeadlessWindow>().unwrap();
    assert_eq!(headless.get_object_id(), window.get_object_id());
    assert_eq!(<HeadlessWindow as StaticClass>::CLASS_ID, HEADLESS_WINDOW_CLASS);

    assert!(window.try_cast::<dyn DeviceContext>().is_none());
    assert!(window.try_cast::<dyn RenderContext>().is_none());
    assert!(window.try_cast::<dyn Buffer>().is_none());
    assert!(window.try_cast::<Plain>().is_none());
    assert!(window.try_cast::<dyn Object>().is_some());
}

#[test]
fn failed_cast_is_invalid_cast() {
    let object = plain();
    let err = cast::<dyn Window>(&object).err().unwrap();
    assert_eq!(err.code(), ResultCode::InvalidCast);
    assert!(cast::<Plain>(&object).is_ok());
}

#[cfg(debug_assertions)]
#[test]
fn live_objects_track_drops() {
    let object = plain();
    let id = object.get_object_id();
    assert!(blaze::object::is_live(id));
    assert!(blaze::object::live_objects().contains(&id));

    let clone = object.clone();
    drop(object);
    assert!(blaze::object::is_live(id));
    drop(clone);
    assert!(!blaze::object::is_live(id));
}

#[test]
fn concurrent_identities_are_unique() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 1000;

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            std::thread::spawn(|| {
                let identities: Vec<ObjectIdentity> =
                    (0..PER_THREAD).map(|_| ObjectIdentity::new(PLAIN_CLASS)).collect();
                let ids: Vec<_> = identities.iter().map(|identity| identity.id()).collect();
                assert!(ids.windows(2).all(|pair| pair[0].serial() < pair[1].serial()));
                ids
            })
        })
        .collect();

    let mut all = std::collections::HashSet::new();
    for worker in workers {
        for id in worker.join().unwrap() {
            assert_eq!(id.class_id(), PLAIN_CLASS);
            all.insert(id);
        }
    }
    assert_eq!(all.len(), THREADS * PER_THREAD);
}
