use urlscope::engine::PatternEngine;
use urlscope::format::{clusters, Format};

fn mined_engine() -> PatternEngine {
    let mut engine = PatternEngine::new();
    engine.load("http://example.com/item123?page=4").unwrap();
    engine.load("http://example.com/item456?page=7").unwrap();
    engine
}

#[test]
fn clusters_carry_pattern_count_and_samples() {
    let engine = mined_engine();
    let (shape, root) = engine.process().next().unwrap();
    let out = clusters(shape, root);
    assert_eq!(out.len(), 1);
    let c = &out[0];
    assert_eq!(
        c.pattern,
        "/item[0-9]{3}[\\?][a-z][a-z][a-z][a-z]=[0-9]"
    );
    assert_eq!(c.count, 2);
    assert_eq!(
        c.samples,
        vec![
            "http://example.com/item123?page=4".to_string(),
            "http://example.com/item456?page=7".to_string(),
        ]
    );
}

#[test]
fn one_cluster_per_leaf() {
    let mut engine = PatternEngine::new();
    engine.load("http://example.com/a/x").unwrap();
    engine.load("http://example.com/b/y").unwrap();
    let (shape, root) = engine.process().next().unwrap();
    let out = clusters(shape, root);
    assert_eq!(out.len(), 2);
    let patterns: Vec<&str> = out.iter().map(|c| c.pattern.as_str()).collect();
    assert_eq!(patterns, vec!["/a/x", "/b/y"]);
    assert!(out.iter().all(|c| c.count == 1));
}

#[test]
fn pattern_format_is_one_line_per_cluster() {
    let engine = mined_engine();
    let (shape, root) = engine.process().next().unwrap();
    let out = clusters(shape, root);
    let lines = Format::Pattern.render(&out[0]);
    assert_eq!(lines, vec![out[0].pattern.clone()]);
}

#[test]
fn cluster_format_appends_tab_indented_samples() {
    let engine = mined_engine();
    let (shape, root) = engine.process().next().unwrap();
    let out = clusters(shape, root);
    let lines = Format::Cluster.render(&out[0]);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], out[0].pattern);
    assert_eq!(lines[1], "\thttp://example.com/item123?page=4");
    assert_eq!(lines[2], "\thttp://example.com/item456?page=7");
}

#[test]
fn json_format_emits_ptn_and_cnt() {
    let engine = mined_engine();
    let (shape, root) = engine.process().next().unwrap();
    let out = clusters(shape, root);
    let lines = Format::Json.render(&out[0]);
    assert_eq!(lines.len(), 1);
    let v: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(v["ptn"], out[0].pattern.as_str());
    assert_eq!(v["cnt"], 2);
}

#[test]
fn format_names_parse_case_insensitively() {
    assert_eq!(Format::parse("JSON"), Some(Format::Json));
    assert_eq!(Format::parse("pattern"), Some(Format::Pattern));
    assert_eq!(Format::parse("Cluster"), Some(Format::Cluster));
    assert_eq!(Format::parse("tree"), None);
}

#[test]
fn fragment_level_renders_after_hash() {
    let mut engine = PatternEngine::new();
    engine.load("http://example.com/docs#intro").unwrap();
    let (shape, root) = engine.process().next().unwrap();
    let out = clusters(shape, root);
    assert_eq!(out[0].pattern, "/docs#intro");
}
