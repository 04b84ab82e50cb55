//! Text rendering of a form, for terminals.

use colored::Colorize;
use plume_keytree::{KeyId, KeyTree, RenderEntry, RenderState, WidgetKind};

/// Displayed keys of `tree`, one per line, indented by depth.
pub fn render_tree(tree: &KeyTree, render: &RenderState) -> String {
    let mut out = String::new();
    for tab in tree.tabs() {
        write_key(tree, render, *tab, 0, &mut out);
    }
    out
}

fn write_key(tree: &KeyTree, render: &RenderState, id: KeyId, depth: usize, out: &mut String) {
    let Some(entry) = render.get(id) else { return };
    if entry.is_hidden || entry.is_ghost {
        return;
    }
    let indent = "  ".repeat(depth);
    out.push_str(&format!("{indent}{}\n", describe(entry)));
    for child in tree.children(id) {
        write_key(tree, render, *child, depth + 1, out);
    }
}

fn describe(entry: &RenderEntry) -> String {
    let label = entry.label.clone().unwrap_or_default();
    match entry.widget {
        WidgetKind::TabPage => format!("[{}]", label).cyan().bold().to_string(),
        WidgetKind::GroupBox if entry.has_label => {
            let mut line = label.bold().to_string();
            if let Some(source) = &entry.current_source {
                line.push_str(&format!(" {}", format!("({source})").dimmed()));
            }
            line
        }
        WidgetKind::GroupBox => "·".dimmed().to_string(),
        WidgetKind::ToolButton => format!("+ {}", entry.help_text.clone().unwrap_or_default())
            .green()
            .to_string(),
        _ => {
            let value = entry
                .value
                .clone()
                .map(|v| v.normal().to_string())
                .unwrap_or_else(|| "∅".dimmed().to_string());
            let mut line = if entry.has_label {
                format!("{}: {value}", label.bold())
            } else {
                format!("- {value}")
            };
            if let Some(language) = &entry.language {
                line.push_str(&format!(" {}", format!("@{language}").yellow()));
            }
            if let Some(unit) = &entry.current_unit {
                line.push_str(&format!(" {}", unit.yellow()));
            }
            if let Some(source) = &entry.current_source {
                line.push_str(&format!(" {}", format!("({source})").dimmed()));
            }
            if entry.is_mandatory && entry.value.is_none() {
                line.push_str(&format!(" {}", "required".red()));
            }
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plume_keytree::TreeOptions;
    use plume_shape::ShapeCatalog;

    #[test]
    fn new_form_lists_mandatory_title() {
        colored::control::set_override(false);
        let catalog = ShapeCatalog::bundled().unwrap();
        let tree = KeyTree::build(&catalog, None, None, TreeOptions::default()).unwrap();
        let render = tree.render().unwrap();
        let text = render_tree(&tree, &render);
        assert!(text.starts_with("[Général]"));
        assert!(text.contains("Libellé: ∅ @fr required"));
        assert!(!text.contains("[Autres]"));
        assert!(text.ends_with('\n'));
        assert!(text.lines().nth(1).is_some_and(|l| l.starts_with("  ")));
    }
}
