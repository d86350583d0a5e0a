use std::fs;

use super::*;

#[test]
fn added_templates_load_by_name() {
    let loader = TemplateLoader::new(Vec::new(), true);
    loader.add("card.html", "<div></div>").unwrap();
    let template = loader.load("card.html").unwrap();
    assert_eq!(template.name(), Some("card.html"));
}

#[test]
fn missing_template_is_not_found() {
    let loader = TemplateLoader::new(Vec::new(), true);
    assert!(matches!(loader.load("nope.html"), Err(Error::TemplateNotFound(ref n)) if n == "nope.html"));
}

#[test]
fn searches_directories_in_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    fs::write(second.path().join("a.html"), "second").unwrap();
    fs::create_dir(first.path().join("nested")).unwrap();
    fs::write(first.path().join("nested/b.html"), "first").unwrap();
    fs::write(first.path().join("a.html"), "first").unwrap();

    let loader = TemplateLoader::new(vec![first.path().to_path_buf(), second.path().to_path_buf()], true);
    assert_eq!(loader.dirs(), [first.path().to_path_buf(), second.path().to_path_buf()]);
    assert_eq!(loader.load("a.html").unwrap().nodes().len(), 1);
    assert!(loader.load("nested/b.html").is_ok());
}

#[test]
fn added_templates_shadow_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.html"), "from disk").unwrap();
    let loader = TemplateLoader::new(vec![dir.path().to_path_buf()], true);
    loader.add("a.html", "{{ x }}").unwrap();
    assert!(matches!(loader.load("a.html").unwrap().nodes()[0], crate::template::Node::Variable(_)));
}

#[test]
fn rejects_names_escaping_the_directory() {
    let dir = tempfile::tempdir().unwrap();
    let loader = TemplateLoader::new(vec![dir.path().join("inner")], true);
    fs::create_dir(dir.path().join("inner")).unwrap();
    fs::write(dir.path().join("secret.html"), "x").unwrap();
    assert!(matches!(loader.load("../secret.html"), Err(Error::TemplateNotFound(_))));
    assert!(matches!(loader.load("/etc/passwd"), Err(Error::TemplateNotFound(_))));
}

#[test]
fn cached_files_are_reused() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.html"), "v1").unwrap();
    let loader = TemplateLoader::new(vec![dir.path().to_path_buf()], true);
    let first = loader.load("a.html").unwrap();
    fs::write(dir.path().join("a.html"), "v2 {{ x }}").unwrap();
    assert!(Arc::ptr_eq(&first, &loader.load("a.html").unwrap()));

    loader.clear_cache();
    assert_eq!(loader.load("a.html").unwrap().nodes().len(), 2);
}

#[test]
fn uncached_loader_rereads_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.html"), "v1").unwrap();
    let loader = TemplateLoader::new(vec![dir.path().to_path_buf()], false);
    let first = loader.load("a.html").unwrap();
    assert!(!Arc::ptr_eq(&first, &loader.load("a.html").unwrap()));
}

#[test]
fn inline_sources_compile_once_when_caching() {
    let loader = TemplateLoader::new(Vec::new(), true);
    let a = loader.inline("<p>{{ x }}</p>").unwrap();
    let b = loader.inline("<p>{{ x }}</p>").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn inline_cache_stops_growing_at_its_limit() {
    let loader = TemplateLoader::new(Vec::new(), true);
    for i in 0..INLINE_CACHE_LIMIT + 20 {
        loader.inline(&format!("<p>{i}</p>")).unwrap();
    }
    assert_eq!(loader.inline_cache_len(), INLINE_CACHE_LIMIT);

    loader.clear_cache();
    assert_eq!(loader.inline_cache_len(), 0);
}

#[test]
fn uncached_loader_keeps_no_inline_sources() {
    let loader = TemplateLoader::new(Vec::new(), false);
    loader.inline("<p></p>").unwrap();
    assert_eq!(loader.inline_cache_len(), 0);
}

#[test]
fn syntax_errors_surface_from_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.html"), "{% if %}").unwrap();
    let loader = TemplateLoader::new(vec![dir.path().to_path_buf()], true);
    assert!(matches!(loader.load("bad.html"), Err(Error::Syntax { .. })));
}
