//! Filesystem-backed include cycles resolve to one shared module handle
//! instead of recursing forever.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use thriftrw::loader::Loader;

fn scratch_dir(label: &str) -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("thriftrw-integration-test-{label}-{id}"))
}

fn write_temp(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn two_way_include_cycle_resolves_to_one_module_each() {
    let dir = scratch_dir("two-way");
    fs::create_dir_all(&dir).unwrap();
    write_temp(
        &dir,
        "a.thrift",
        "include \"./b.thrift\"\nstruct OnlyInA { 1: required i32 x }",
    );
    let b = write_temp(
        &dir,
        "b.thrift",
        "include \"./a.thrift\"\nstruct OnlyInB { 1: required i32 y }",
    );

    let loader = Loader::new();
    let b_module = loader.load(&b).unwrap();
    let a_via_b = b_module.include("a").unwrap();
    let b_via_a = a_via_b.include("b").unwrap();
    assert!(Rc::ptr_eq(&b_module, &b_via_a));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn diamond_shaped_cycle_preserves_identity_across_every_path() {
    // a -> b, c ; b -> d ; c -> d ; d -> a
    let dir = scratch_dir("diamond");
    fs::create_dir_all(&dir).unwrap();
    let a = write_temp(
        &dir,
        "a.thrift",
        "include \"./b.thrift\"\ninclude \"./c.thrift\"\nstruct OnlyInA { 1: required i32 x }",
    );
    write_temp(
        &dir,
        "b.thrift",
        "include \"./d.thrift\"\nstruct OnlyInB { 1: required i32 x }",
    );
    write_temp(
        &dir,
        "c.thrift",
        "include \"./d.thrift\"\nstruct OnlyInC { 1: required i32 x }",
    );
    write_temp(
        &dir,
        "d.thrift",
        "include \"./a.thrift\"\nstruct OnlyInD { 1: required i32 x }",
    );

    let loader = Loader::new();
    let a_module = loader.load(&a).unwrap();
    let b_module = a_module.include("b").unwrap();
    let c_module = a_module.include("c").unwrap();
    let d_via_b = b_module.include("d").unwrap();
    let d_via_c = c_module.include("d").unwrap();
    assert!(Rc::ptr_eq(&d_via_b, &d_via_c));

    let a_via_d = d_via_b.include("a").unwrap();
    assert!(Rc::ptr_eq(&a_module, &a_via_d));

    fs::remove_dir_all(&dir).ok();
}
