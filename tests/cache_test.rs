// tests/cache_test.rs — Integration test: hot reload through the filesystem

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use hotloop::cache::{DynamicCodeCache, FileSystemProvider};
use hotloop::infra::config::EngineConfig;
use hotloop::infra::errors::HotloopError;
use hotloop::script::create_engine;
use pretty_assertions::assert_eq;
use uuid::Uuid;

fn fs_cache(root: &Path, reloads: Rc<RefCell<Vec<Uuid>>>) -> DynamicCodeCache<FileSystemProvider> {
    DynamicCodeCache::new(
        Rc::new(create_engine(&EngineConfig::default())),
        FileSystemProvider::new(vec![root.to_path_buf()]),
    )
    .with_reload_hook(move |instance| reloads.borrow_mut().push(instance.id()))
}

#[test]
fn test_edit_is_picked_up_and_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unit.rhai");
    std::fs::write(&path, "fn f() { 1 }").unwrap();

    let reloads = Rc::new(RefCell::new(Vec::new()));
    let mut cache = fs_cache(dir.path(), reloads.clone());
    let mut unit = cache.open("unit.rhai").unwrap();

    let first = cache.get_instance(&mut unit).unwrap();
    assert_eq!(first.call("f", ()).unwrap().as_int().unwrap(), 1);

    std::fs::write(&path, "fn f() { 2 }").unwrap();
    let second = cache.get_instance(&mut unit).unwrap();
    let third = cache.get_instance(&mut unit).unwrap();

    assert_eq!(second.call("f", ()).unwrap().as_int().unwrap(), 2);
    assert!(Rc::ptr_eq(&second, &third));
    assert_ne!(first.id(), second.id());
    assert_eq!(*reloads.borrow(), vec![first.id(), second.id()]);
    assert_eq!(unit.reload_count(), 2);
}

#[test]
fn test_whitespace_only_edit_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unit.rhai");
    std::fs::write(&path, "fn f() { 1 }").unwrap();

    let reloads = Rc::new(RefCell::new(Vec::new()));
    let mut cache = fs_cache(dir.path(), reloads.clone());
    let mut unit = cache.open("unit.rhai").unwrap();
    cache.get_instance(&mut unit).unwrap();

    std::fs::write(&path, "fn f() { 1 }\n").unwrap();
    cache.get_instance(&mut unit).unwrap();
    assert_eq!(reloads.borrow().len(), 2);
}

#[test]
fn test_broken_edit_keeps_everything_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unit.rhai");
    std::fs::write(&path, "fn f() { 1 }").unwrap();

    let reloads = Rc::new(RefCell::new(Vec::new()));
    let mut cache = fs_cache(dir.path(), reloads.clone());
    let mut unit = cache.open("unit.rhai").unwrap();
    let good = cache.get_instance(&mut unit).unwrap();
    let good_artifact = unit.artifact().unwrap().clone();

    std::fs::write(&path, "fn f() { ").unwrap();
    let err = cache.get_instance(&mut unit).unwrap_err();
    assert!(matches!(err, HotloopError::Compilation { .. }));

    assert_eq!(unit.last_loaded_text(), "fn f() { 1 }");
    assert!(Rc::ptr_eq(unit.instance().unwrap(), &good));
    assert!(Rc::ptr_eq(unit.artifact().unwrap(), &good_artifact));
    assert_eq!(reloads.borrow().len(), 1);

    // Restoring the old text is a cache hit, not a reload
    std::fs::write(&path, "fn f() { 1 }").unwrap();
    let again = cache.get_instance(&mut unit).unwrap();
    assert!(Rc::ptr_eq(&again, &good));
    assert_eq!(reloads.borrow().len(), 1);
}

#[test]
fn test_failing_constructor_keeps_old_instance() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unit.rhai");
    std::fs::write(&path, "fn init() { #{ n: 1 } }\nfn n() { this.n }").unwrap();

    let mut cache = fs_cache(dir.path(), Rc::new(RefCell::new(Vec::new())));
    let mut unit = cache.open("unit.rhai").unwrap();
    let good = cache.get_instance(&mut unit).unwrap();

    std::fs::write(&path, "fn init() { throw \"nope\"; }\nfn n() { 0 }").unwrap();
    let err = cache.get_instance(&mut unit).unwrap_err();
    assert!(matches!(err, HotloopError::Instantiation { .. }));
    assert!(Rc::ptr_eq(unit.instance().unwrap(), &good));
    assert_eq!(good.call("n", ()).unwrap().as_int().unwrap(), 1);
}

#[test]
fn test_unknown_resource_suggests_neighbours() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("report.rhai"), "1").unwrap();

    let cache = fs_cache(dir.path(), Rc::new(RefCell::new(Vec::new())));
    let err = cache.open("reprot.rhai").unwrap_err();
    assert!(err.to_string().contains("report.rhai"));
}

#[test]
fn test_deleted_source_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unit.rhai");
    std::fs::write(&path, "fn f() { 1 }").unwrap();

    let mut cache = fs_cache(dir.path(), Rc::new(RefCell::new(Vec::new())));
    let mut unit = cache.open("unit.rhai").unwrap();
    cache.get_instance(&mut unit).unwrap();

    std::fs::remove_file(&path).unwrap();
    assert!(matches!(
        cache.get_instance(&mut unit),
        Err(HotloopError::ResourceNotFound { .. })
    ));
    assert!(unit.instance().is_some());
}
