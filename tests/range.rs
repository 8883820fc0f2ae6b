use anyhow::Result;
use serde_json::json;

use dust_helpers_rs::{register_helpers, Registry};

fn setup() -> Registry {
    let registry = Registry::new();
    register_helpers(&registry);
    registry
}

#[test]
fn count_only_starts_at_zero() -> Result<()> {
    let registry = setup();
    let out = registry.render_source("{@range n=3}a{$i}{/range}", json!({}))?;
    assert_eq!(out, "a0a1a2");
    Ok(())
}

#[test]
fn from_to_with_step() -> Result<()> {
    let registry = setup();
    let out = registry.render_source("{@range from=2 to=10 step=2}a{$i}{/range}", json!({}))?;
    assert_eq!(out, "a2a4a6a8");
    Ok(())
}

#[test]
fn repetition_count_is_ceiling_of_span_over_step() -> Result<()> {
    let registry = setup();
    for (from, to, step) in [(0, 10, 3), (1, 2, 5), (-4, 4, 2), (5, 6, 1)] {
        let source = format!("{{@range from={from} to={to} step={step}}}x{{/range}}");
        let out = registry.render_source(&source, json!({}))?;
        let expected = ((to - from) as f64 / step as f64).ceil() as usize;
        assert_eq!(out.len(), expected, "from={from} to={to} step={step}");
    }
    Ok(())
}

#[test]
fn n_is_offset_from_start() -> Result<()> {
    let registry = setup();
    let out = registry.render_source("{@range from=5 n=2}{$i} {/range}", json!({}))?;
    assert_eq!(out, "5 6 ");
    Ok(())
}

#[test]
fn params_resolve_from_context() -> Result<()> {
    let registry = setup();
    let out = registry.render_source(
        r#"{@range from=start to="{limit}"}{$i}{/range}"#,
        json!({ "start": "1", "limit": 4 }),
    )?;
    assert_eq!(out, "123");
    Ok(())
}

#[test]
fn body_sees_outer_context() -> Result<()> {
    let registry = setup();
    let out = registry.render_source("{@range n=2}{name}{$i}{/range}", json!({ "name": "x" }))?;
    assert_eq!(out, "x0x1");
    Ok(())
}

#[test]
fn empty_and_invalid_ranges_render_nothing() -> Result<()> {
    let registry = setup();
    let cases = [
        "{@range}a{/range}",
        "{@range from=1}a{/range}",
        "{@range from=10 to=2}a{/range}",
        "{@range n=0}a{/range}",
        "{@range to=3 step=0}a{/range}",
        "{@range n=3/}",
        r#"{@range n="many"}a{/range}"#,
    ];
    for source in cases {
        assert_eq!(registry.render_source(source, json!({}))?, "", "{source}");
    }
    Ok(())
}
