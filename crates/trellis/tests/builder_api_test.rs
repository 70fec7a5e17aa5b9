//! Integration tests for the LayoutBuilder API and the pipeline entry points.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde_json::json;

use trellis::{
    ComponentDescriptor, DataSources, LayoutBuilder, RepeatingGroupState, RepeatingGroups,
    TrellisError,
    config::{AppConfig, OnError, OutputConfig, OutputFormat, ResolveConfig},
    layout_as_hierarchy, nodes_in_layout, nodes_in_layouts, resolved_nodes_in_layout,
};

const GROUP_LAYOUT: &str = r#"[
    {"id": "g", "type": "Group", "maxCount": 5, "children": ["f"],
     "dataModelBindings": {"group": "M.L"}},
    {"id": "f", "type": "Input", "dataModelBindings": {"simpleBinding": "M.L.V"}}
]"#;

fn repeating(entries: &[(&str, i64)]) -> RepeatingGroups {
    entries
        .iter()
        .map(|(id, index)| (id.to_string(), RepeatingGroupState::new(*index)))
        .collect()
}

fn single_page(components: Vec<ComponentDescriptor>) -> IndexMap<String, Vec<ComponentDescriptor>> {
    IndexMap::from([("main".to_string(), components)])
}

#[test]
fn test_group_row_scenario() {
    let builder = LayoutBuilder::default();
    let layout = builder.parse(GROUP_LAYOUT).unwrap().into_components();
    let page = nodes_in_layout(&layout, &repeating(&[("g", 1)]));

    let group = page.find_by_id("g").unwrap();
    let children = group.children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].id(), "f-0");
    assert_eq!(children[1].id(), "f-1");
    assert_eq!(
        children[0].item().binding("simpleBinding"),
        Some("M.L[0].V")
    );
    assert_eq!(
        children[1].item().binding("simpleBinding"),
        Some("M.L[1].V")
    );
    assert_eq!(
        children[1].transpose_data_model("M.L.Other"),
        "M.L[1].Other"
    );

    // The caller's layout is left as authored
    assert_eq!(layout[1].id, "f");
    assert_eq!(layout[1].binding("simpleBinding"), Some("M.L.V"));
}

#[test]
fn test_group_free_layout_keeps_order() {
    let layout = vec![
        ComponentDescriptor::new("a", "Header"),
        ComponentDescriptor::new("b", "Input"),
        ComponentDescriptor::new("c", "Paragraph"),
    ];

    let tree = layout_as_hierarchy(&layout);
    let ids: Vec<_> = tree.iter().map(|item| item.id()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn test_find_all_instances_of_template() {
    let layout = vec![
        ComponentDescriptor::group("g", ["f"])
            .with_max_count(5)
            .with_binding("group", "M.L"),
        ComponentDescriptor::new("f", "Input").with_binding("simpleBinding", "M.L.V"),
    ];
    let page = nodes_in_layout(&layout, &repeating(&[("g", 2)]));

    let instances = page.find_all_by_id("f");
    let ids: HashSet<_> = instances.iter().map(|node| node.id()).collect();
    assert_eq!(instances.len(), 3);
    assert_eq!(ids.len(), 3);
    assert!(instances.iter().all(|node| node.item().base_component_id.as_deref() == Some("f")));
}

#[test]
fn test_hidden_group_hides_every_row() {
    let layout = vec![
        ComponentDescriptor::group("g", ["f", "h"])
            .with_max_count(5)
            .with_binding("group", "M.L")
            .with_hidden(true),
        ComponentDescriptor::new("f", "Input").with_binding("simpleBinding", "M.L.V"),
        ComponentDescriptor::new("h", "Paragraph"),
    ];
    let page = nodes_in_layout(&layout, &repeating(&[("g", 2)]));

    let descendants = page.find_by_id("g").unwrap().flat(false, None);
    assert_eq!(descendants.len(), 6);
    assert!(descendants.iter().all(|node| node.is_hidden(&HashSet::new())));
}

#[test]
fn test_transpose_is_stable() {
    let layout = vec![
        ComponentDescriptor::group("g", ["f"])
            .with_max_count(5)
            .with_binding("group", "Model.Group"),
        ComponentDescriptor::new("f", "Input").with_binding("simpleBinding", "Model.Group.Name"),
    ];
    let page = nodes_in_layout(&layout, &repeating(&[("g", 2)]));
    let field = page.find_by_id("f-2").unwrap();

    assert_eq!(field.transpose_data_model("Model.Group.Name"), "Model.Group[2].Name");
    assert_eq!(field.transpose_data_model("Model.Group[2].Name"), "Model.Group[2].Name");
    assert_eq!(field.transpose_data_model("Model.Group[0].Name"), "Model.Group[0].Name");
}

#[test]
fn test_resolve_hidden_in_nested_rows() {
    let layout = vec![
        ComponentDescriptor::group("outer", ["inner"])
            .with_max_count(9)
            .with_binding("group", "M.Items"),
        ComponentDescriptor::group("inner", ["field"])
            .with_max_count(9)
            .with_binding("group", "M.Items.Sub"),
        ComponentDescriptor::new("field", "Input")
            .with_binding("simpleBinding", "M.Items.Sub.Value")
            .with_hidden(json!(["equals", ["component", "field"], "secret"])),
    ];
    let sources = DataSources::with_form_data(json!({
        "M": {"Items": [{"Sub": [{"Value": "open"}, {"Value": "secret"}]}]}
    }));

    let page = resolved_nodes_in_layout(
        &layout,
        &repeating(&[("outer", 0), ("inner", 1)]),
        &sources,
        &ResolveConfig::default(),
    )
    .unwrap();

    let none = HashSet::new();
    assert!(!page.find_by_id("field-0-0").unwrap().is_hidden(&none));
    assert!(page.find_by_id("field-0-1").unwrap().is_hidden(&none));
}

#[test]
fn test_cross_page_lookup_prefers_current() {
    let mut layouts = IndexMap::new();
    layouts.insert(
        "first".to_string(),
        vec![ComponentDescriptor::new("name", "Input").with_binding("simpleBinding", "A")],
    );
    layouts.insert(
        "second".to_string(),
        vec![ComponentDescriptor::new("name", "Input").with_binding("simpleBinding", "B")],
    );

    let on_second = nodes_in_layouts(&layouts, "second", &RepeatingGroups::new());
    let found = on_second.find_component_by_id("name").unwrap();
    assert_eq!(on_second.page_name_of(found), Some("second"));

    let unknown_current = nodes_in_layouts(&layouts, "missing", &RepeatingGroups::new());
    let found = unknown_current.find_component_by_id("name").unwrap();
    assert_eq!(unknown_current.page_name_of(found), Some("first"));
    assert_eq!(unknown_current.find_all_components_by_id("name").len(), 2);
}

#[test]
fn test_builder_resolves_and_renders() {
    let layout = vec![
        ComponentDescriptor::new("intro", "Paragraph")
            .with_hidden(json!(["equals", ["dataModel", "Flags.Skip"], true])),
    ];
    let sources = DataSources::with_form_data(json!({"Flags": {"Skip": true}}));
    let config = AppConfig::new(
        ResolveConfig::default(),
        OutputConfig::new(OutputFormat::Json, true),
    );
    let builder = LayoutBuilder::new(config);

    let pages = builder
        .resolve_pages(&single_page(layout), "main", &RepeatingGroups::new(), &sources)
        .unwrap();
    let output = builder.render(&pages).unwrap();

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["main"][0]["hidden"], json!(true));
}

#[test]
fn test_builder_expression_failure() {
    let layout = vec![ComponentDescriptor::new("a", "Input").with_hidden(json!(["component", "b"]))];

    let strict = LayoutBuilder::default();
    let result = strict.resolve_pages(
        &single_page(layout.clone()),
        "main",
        &RepeatingGroups::new(),
        &DataSources::default(),
    );
    assert!(matches!(result, Err(TrellisError::Expression(_))));

    let lenient = LayoutBuilder::new(AppConfig::new(
        ResolveConfig::new(OnError::Default),
        OutputConfig::default(),
    ));
    let pages = lenient
        .resolve_pages(&single_page(layout), "main", &RepeatingGroups::new(), &DataSources::default())
        .unwrap();
    assert_eq!(
        pages.find_component_by_id("a").unwrap().item().hidden,
        Some(json!(false))
    );
}

#[test]
fn test_parse_error_keeps_source() {
    let builder = LayoutBuilder::default();
    let source = r#"[{"id": "a", "type": "Input"}, {"id": "a", "type": "Input"}]"#;

    match builder.parse(source) {
        Err(TrellisError::Parse { err, src }) => {
            assert_eq!(src, source);
            assert!(!err.diagnostics().is_empty());
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_render_tree() {
    let builder = LayoutBuilder::default();
    let layout = builder.parse(GROUP_LAYOUT).unwrap().into_components();
    let pages = builder.build_pages(&single_page(layout), "main", &repeating(&[("g", 0)]));

    assert_eq!(
        builder.render(&pages).unwrap(),
        "main *\n  g (Group)\n    [row 0]\n      f-0 (Input)\n"
    );
}
