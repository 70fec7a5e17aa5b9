//! Text renderings of built layout pages.

use std::fmt::Write as _;

use serde_json::{Map, Value};

use crate::{
    TrellisError,
    config::{OutputConfig, OutputFormat},
    structure::{LayoutPages, NodeRef},
};

/// Renders a page collection to a string.
pub trait Exporter {
    fn export(&self, pages: &LayoutPages) -> Result<String, TrellisError>;
}

/// Returns the exporter for the configured output format.
pub fn exporter_for(config: &OutputConfig) -> Box<dyn Exporter> {
    match config.format() {
        OutputFormat::Tree => Box::new(TreeExporter),
        OutputFormat::Flat => Box::new(FlatExporter {
            include_groups: config.include_groups(),
        }),
        OutputFormat::Json => Box::new(JsonExporter),
    }
}

/// Indented node tree. Repeating-group rows appear as `[row N]` lines.
pub struct TreeExporter;

impl TreeExporter {
    fn write_node(out: &mut String, node: NodeRef<'_>, depth: usize) {
        let indent = "  ".repeat(depth);
        write!(out, "{indent}{} ({})", node.id(), node.item().kind)
            .expect("Writing to String buffer is infallible");
        if node.item().is_hidden_literal() {
            out.push_str(" hidden");
        }
        out.push('\n');

        if node.is_repeating_group() {
            for row in node.rows() {
                writeln!(out, "{indent}  [row {}]", row.index())
                    .expect("Writing to String buffer is infallible");
                for child in node.children_in_row(row.index()) {
                    Self::write_node(out, child, depth + 2);
                }
            }
        } else {
            for child in node.children() {
                Self::write_node(out, child, depth + 1);
            }
        }
    }
}

impl Exporter for TreeExporter {
    fn export(&self, pages: &LayoutPages) -> Result<String, TrellisError> {
        let mut out = String::new();
        for (name, page) in pages.all() {
            let marker = if name == pages.current_name() { " *" } else { "" };
            writeln!(out, "{name}{marker}").expect("Writing to String buffer is infallible");
            for node in page.children() {
                Self::write_node(&mut out, node, 1);
            }
        }
        Ok(out)
    }
}

/// One node id per line in registration order, each group after its
/// descendants.
///
/// Pages are introduced by a `[name]` header when there is more than one.
pub struct FlatExporter {
    include_groups: bool,
}

impl Exporter for FlatExporter {
    fn export(&self, pages: &LayoutPages) -> Result<String, TrellisError> {
        let headers = pages.all().len() > 1;
        let mut out = String::new();
        for (name, page) in pages.all() {
            if headers {
                writeln!(out, "[{name}]").expect("Writing to String buffer is infallible");
            }
            for node in page.flat(self.include_groups) {
                out.push_str(node.id());
                out.push('\n');
            }
        }
        Ok(out)
    }
}

/// The expanded hierarchy of every page as a JSON object keyed by page name.
///
/// Non-repeating groups list their nodes under `childComponents`, repeating
/// groups under `rows`, each row with its `index`, `items` and, after
/// resolution, `groupExpressions`.
pub struct JsonExporter;

impl JsonExporter {
    fn node_value(node: NodeRef<'_>) -> Result<Value, TrellisError> {
        let mut value = serde_json::to_value(node.item())?;
        let Some(object) = value.as_object_mut() else {
            return Ok(value);
        };

        if node.is_repeating_group() {
            let mut rows = Vec::with_capacity(node.rows().len());
            for row in node.rows() {
                let items = node
                    .children_in_row(row.index())
                    .into_iter()
                    .map(Self::node_value)
                    .collect::<Result<Vec<_>, _>>()?;

                let mut entry = Map::new();
                entry.insert("index".to_string(), Value::from(row.index()));
                entry.insert("items".to_string(), Value::Array(items));
                if let Some(expressions) = row.group_expressions() {
                    entry.insert("groupExpressions".to_string(), expressions.clone());
                }
                rows.push(Value::Object(entry));
            }
            object.insert("rows".to_string(), Value::Array(rows));
        } else if node.is_group() {
            let children = node
                .children()
                .into_iter()
                .map(Self::node_value)
                .collect::<Result<Vec<_>, _>>()?;
            object.insert("childComponents".to_string(), Value::Array(children));
        }

        Ok(value)
    }
}

impl Exporter for JsonExporter {
    fn export(&self, pages: &LayoutPages) -> Result<String, TrellisError> {
        let mut root = Map::new();
        for (name, page) in pages.all() {
            let items = page
                .children()
                .map(Self::node_value)
                .collect::<Result<Vec<_>, _>>()?;
            root.insert(name.clone(), Value::Array(items));
        }

        let mut out = serde_json::to_string_pretty(&Value::Object(root))?;
        out.push('\n');
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;
    use trellis_core::{ComponentDescriptor, RepeatingGroupState, RepeatingGroups};

    use super::*;
    use crate::structure::nodes_in_layouts;

    fn pages() -> LayoutPages {
        let mut layouts = IndexMap::new();
        layouts.insert(
            "main".to_string(),
            vec![
                ComponentDescriptor::new("title", "Header"),
                ComponentDescriptor::group("g", ["f"])
                    .with_max_count(3)
                    .with_binding("group", "M.L"),
                ComponentDescriptor::new("f", "Input").with_binding("simpleBinding", "M.L.V"),
                ComponentDescriptor::group("panel", ["note"]).with_hidden(true),
                ComponentDescriptor::new("note", "Paragraph"),
            ],
        );
        let repeating = RepeatingGroups::from([("g".to_string(), RepeatingGroupState::new(1))]);
        nodes_in_layouts(&layouts, "main", &repeating)
    }

    #[test]
    fn test_tree_export() {
        let out = TreeExporter.export(&pages()).unwrap();

        let expected = "\
main *
  title (Header)
  g (Group)
    [row 0]
      f-0 (Input)
    [row 1]
      f-1 (Input)
  panel (Group) hidden
    note (Paragraph)
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_flat_export() {
        let with_groups = FlatExporter {
            include_groups: true,
        };
        let without_groups = FlatExporter {
            include_groups: false,
        };

        assert_eq!(
            with_groups.export(&pages()).unwrap(),
            "title\nf-0\nf-1\ng\nnote\npanel\n"
        );
        assert_eq!(
            without_groups.export(&pages()).unwrap(),
            "title\nf-0\nf-1\nnote\n"
        );
    }

    #[test]
    fn test_flat_export_multiple_pages() {
        let mut layouts = IndexMap::new();
        layouts.insert("a".to_string(), vec![ComponentDescriptor::new("x", "Input")]);
        layouts.insert("b".to_string(), vec![ComponentDescriptor::new("y", "Input")]);
        let pages = nodes_in_layouts(&layouts, "a", &RepeatingGroups::new());

        let out = FlatExporter {
            include_groups: true,
        }
        .export(&pages)
        .unwrap();
        assert_eq!(out, "[a]\nx\n[b]\ny\n");
    }

    #[test]
    fn test_json_export() {
        let out = JsonExporter.export(&pages()).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();

        let main = value["main"].as_array().unwrap();
        assert_eq!(main.len(), 3);
        assert_eq!(main[1]["rows"][1]["index"], json!(1));
        assert_eq!(main[1]["rows"][1]["items"][0]["id"], json!("f-1"));
        assert_eq!(
            main[1]["rows"][1]["items"][0]["dataModelBindings"]["simpleBinding"],
            json!("M.L[1].V")
        );
        assert!(main[1]["rows"][0].get("groupExpressions").is_none());
        assert_eq!(main[2]["childComponents"][0]["id"], json!("note"));
        assert!(main[0].get("childComponents").is_none());
    }

    #[test]
    fn test_exporter_for_format() {
        let config = OutputConfig::new(OutputFormat::Flat, false);
        let out = exporter_for(&config).export(&pages()).unwrap();
        assert_eq!(out, "title\nf-0\nf-1\nnote\n");
    }
}
