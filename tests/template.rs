use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use dust_helpers_rs::{
    register_helpers, Bodies, Chunk, Context, Level, Logger, MemorySink, Params, Registry, Template,
};

fn setup() -> Registry {
    let registry = Registry::new();
    register_helpers(&registry);
    registry
}

#[test]
fn references_are_escaped_unless_filtered() -> Result<()> {
    let registry = setup();
    let data = json!({ "html": "<b>&</b>" });
    assert_eq!(registry.render_source("{html}", data.clone())?, "&lt;b&gt;&amp;&lt;/b&gt;");
    assert_eq!(registry.render_source("{html|s}", data)?, "<b>&</b>");
    Ok(())
}

#[test]
fn sections_iterate_arrays_and_fall_back_to_else() -> Result<()> {
    let registry = setup();
    let source = "{#items}{.}{$idx}/{$len} {:else}none{/items}";
    assert_eq!(registry.render_source(source, json!({ "items": ["a", "b"] }))?, "a0/2 b1/2 ");
    assert_eq!(registry.render_source(source, json!({ "items": [] }))?, "none");
    assert_eq!(registry.render_source(source, json!({}))?, "none");
    Ok(())
}

#[test]
fn section_params_are_pushed_as_a_frame() -> Result<()> {
    let registry = setup();
    let out = registry.render_source(
        r#"{#person greeting="hi"}{greeting} {name}{/person}"#,
        json!({ "person": { "name": "Ann" } }),
    )?;
    assert_eq!(out, "hi Ann");
    Ok(())
}

#[test]
fn exists_and_not_exists() -> Result<()> {
    let registry = setup();
    let source = "{?flag}on{:else}off{/flag}|{^flag}missing{/flag}";
    assert_eq!(registry.render_source(source, json!({ "flag": 0 }))?, "on|");
    assert_eq!(registry.render_source(source, json!({ "flag": "" }))?, "off|missing");
    Ok(())
}

#[test]
fn helpers_compose_with_sections() -> Result<()> {
    let registry = setup();
    let source = concat!(
        "{#groups}",
        r#"{@contains arr=members key="role" value="admin"}{name}:{/contains}"#,
        "{/groups}"
    );
    let data = json!({
        "groups": [
            { "name": "ops", "members": [{ "role": "dev" }, { "role": "admin" }] },
            { "name": "dev", "members": [{ "role": "dev" }] }
        ]
    });
    assert_eq!(registry.render_source(source, data)?, "ops:");
    Ok(())
}

#[test]
fn custom_helper_can_render_else_body() -> Result<()> {
    let registry = setup();
    registry.register(
        "either",
        |chunk: Chunk, ctx: &Context, bodies: &Bodies<'_>, params: &Params| -> Result<Chunk> {
            let flag = params
                .tap("when", ctx)?
                .and_then(|value| value.as_bool())
                .unwrap_or(false);
            let body = if flag { bodies.block } else { bodies.else_block };
            match body {
                Some(body) => body.render(chunk, ctx),
                None => Ok(chunk),
            }
        },
    );
    let source = "{@either when=on}yes{:else}no{/either}";
    assert_eq!(registry.render_source(source, json!({ "on": true }))?, "yes");
    assert_eq!(registry.render_source(source, json!({ "on": false }))?, "no");
    Ok(())
}

#[test]
fn unknown_helper_is_logged_and_skipped() -> Result<()> {
    let registry = setup();
    let sink = Arc::new(MemorySink::new());
    registry.set_logger(Logger::new(Level::Warn, sink.clone()));
    let out = registry.render_source("a{@nope x=1}b{/nope}c", json!({}))?;
    assert_eq!(out, "ac");
    assert_eq!(sink.messages(), vec!["helper not found: nope".to_string()]);
    Ok(())
}

#[test]
fn parse_errors_surface_to_the_caller() {
    let registry = setup();
    let err = registry
        .render_source("{@iterate key=obj}{$key}{/range}", json!({}))
        .unwrap_err();
    assert!(err.to_string().contains("mismatched closing tag"), "{err}");
}

#[test]
fn parsed_template_renders_against_many_contexts() -> Result<()> {
    let registry = setup();
    let template = Template::parse("{@range n=count}*{/range}")?;
    assert_eq!(template.render(&registry.context(json!({ "count": 2 })))?, "**");
    assert_eq!(template.render(&registry.context(json!({ "count": 4 })))?, "****");
    Ok(())
}
