use anyhow::Result;
use shelfmark_core::schema::{self, FieldDef, FieldKind};

pub fn show_schema() -> Result<()> {
    for def in schema::entities() {
        println!("{} ({})", def.kind.name(), def.kind.table());
        for field in def.fields {
            println!("  {:<14} {:<8} {}", field.name, field.kind.name(), constraints(field));
        }
        if !def.ordering.is_empty() {
            println!("  ordered by {}", def.ordering.join(", "));
        }
        println!();
    }
    Ok(())
}

fn constraints(field: &FieldDef) -> String {
    let mut parts = Vec::new();
    if field.primary_key {
        parts.push("primary key".to_string());
    }
    if field.unique {
        parts.push("unique".to_string());
    }
    if field.nullable {
        parts.push("optional".to_string());
    }
    if let Some(len) = field.exact_length {
        parts.push(format!("exactly {} chars", len));
    } else if let Some(max) = field.max_length {
        parts.push(format!("max {} chars", max));
    }
    if let Some(relation) = field.relation {
        parts.push(format!(
            "-> {} (on delete {})",
            relation.target.slug(),
            relation.on_delete.as_sql()
        ));
    }
    if let FieldKind::Choice(choices) = field.kind {
        parts.push(format!("{} choices", choices.len()));
    }
    if let Some(default) = field.default {
        parts.push(format!("default {:?}", default));
    }
    if let Some(help) = field.help_text {
        parts.push(format!("({})", help));
    }
    parts.join(", ")
}
