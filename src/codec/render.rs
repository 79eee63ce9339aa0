use crate::document::Block;
use crate::error::MigrateError;
use toml::{Table, Value};

/// Renders a synthesized block in the usual sample-config layout:
///
/// ```text
/// [[processors.enum]]
///   [[processors.enum.mapping]]
///     field = "status"
/// ```
pub(crate) fn render_block(block: &Block, eol: &str) -> Result<String, MigrateError> {
    let path = vec![
        block.category().section().to_string(),
        block.type_name().to_string(),
    ];

    let mut out = String::new();
    out.push_str(&format!("[[{}]]{}", format_path(&path), eol));
    render_table(&mut out, &path, block.options(), 1, eol);

    // The output has to load again, check before handing it out
    if let Err(e) = toml::from_str::<Table>(&out) {
        return Err(MigrateError::Serialize {
            plugin: block.plugin_name(),
            message: e.message().to_string(),
        });
    }

    Ok(out)
}

fn render_table(out: &mut String, path: &[String], table: &Table, depth: usize, eol: &str) {
    let indent = "  ".repeat(depth);

    // Plain key/values first, a section header would capture them otherwise
    for (key, value) in table {
        if is_section(value) {
            continue;
        }
        out.push_str(&format!("{}{} = {}{}", indent, format_key(key), value, eol));
    }

    for (key, value) in table {
        let mut child = path.to_vec();
        child.push(key.clone());
        match value {
            Value::Table(t) => {
                out.push_str(&format!("{}[{}]{}", indent, format_path(&child), eol));
                render_table(out, &child, t, depth + 1, eol);
            }
            Value::Array(items) if is_table_array(items) => {
                for item in items {
                    if let Value::Table(t) = item {
                        out.push_str(&format!("{}[[{}]]{}", indent, format_path(&child), eol));
                        render_table(out, &child, t, depth + 1, eol);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_section(value: &Value) -> bool {
    match value {
        Value::Table(_) => true,
        Value::Array(items) => is_table_array(items),
        _ => false,
    }
}

fn is_table_array(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(Value::is_table)
}

fn format_path(path: &[String]) -> String {
    path.iter()
        .map(|k| format_key(k))
        .collect::<Vec<_>>()
        .join(".")
}

fn format_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        key.to_string()
    } else {
        Value::String(key.to_string()).to_string()
    }
}
