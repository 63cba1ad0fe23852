use resxkit::{CultureKey, EntryView, ResourceEntity, ResourceManager};
use serde::Serialize;

fn truncate(value: &str, full: bool) -> String {
    if full || value.chars().count() <= 50 {
        value.to_string()
    } else {
        let head: String = value.chars().take(50).collect();
        format!("{}...", head)
    }
}

fn culture_label(culture: &CultureKey) -> String {
    match culture {
        CultureKey::Neutral => "neutral".to_string(),
        culture => culture.tag(),
    }
}

fn matches_filter(entity: &ResourceEntity, lang: Option<&CultureKey>) -> bool {
    lang.is_none_or(|lang| entity.language(lang).is_some())
}

/// Print every entity with its entries.
pub fn print_entities(manager: &ResourceManager, lang: Option<&CultureKey>, full: bool) -> usize {
    let entities: Vec<&ResourceEntity> = manager
        .entities()
        .filter(|e| matches_filter(e, lang))
        .collect();

    for (i, entity) in entities.iter().enumerate() {
        println!("\n=== Resource {} ===", i + 1);
        println!("Entity: {}", entity.identity());
        let cultures: Vec<String> = entity.cultures().map(culture_label).collect();
        println!("Languages: {}", cultures.join(", "));
        println!("Entries: {}", entity.len());

        for entry in entity.entries() {
            println!("\n  {}", entry.key());
            for culture in entity.cultures() {
                if lang.is_some_and(|l| l != culture) && !culture.is_neutral() {
                    continue;
                }
                let value = entry.value(culture).unwrap_or("<missing>");
                println!("    [{}] {}", culture_label(culture), truncate(value, full));
                if let Some(comment) = entry.comment(culture).filter(|c| !c.is_empty()) {
                    println!("      Comment: {}", truncate(comment, full));
                }
            }
        }
    }
    entities.len()
}

#[derive(Serialize)]
struct RuleFailureRow<'a> {
    entity: String,
    key: &'a str,
    culture: String,
    messages: Vec<&'a str>,
}

fn failures<'a>(entry: &EntryView<'a>) -> Vec<(CultureKey, &'a str)> {
    entry
        .entity()
        .cultures()
        .filter_map(|c| entry.rule_failure(c).map(|m| (c.clone(), m)))
        .collect()
}

/// Print rule violations. Returns the number of entries with at least one.
pub fn print_rule_failures(manager: &ResourceManager, json_output: bool) -> usize {
    let mut count = 0;
    let mut rows = Vec::new();
    for entity in manager.entities() {
        for entry in entity.entries().filter(EntryView::has_rule_failures) {
            count += 1;
            for (culture, message) in failures(&entry) {
                if json_output {
                    rows.push(RuleFailureRow {
                        entity: entity.identity().to_string(),
                        key: entry.key(),
                        culture: culture.tag(),
                        messages: message.lines().collect(),
                    });
                } else {
                    for line in message.lines() {
                        println!(
                            "{}: {} [{}] {}",
                            entity.identity(),
                            entry.key(),
                            culture_label(&culture),
                            line
                        );
                    }
                }
            }
        }
    }
    if json_output {
        println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
    }
    count
}

/// Print the code references of every entry; with `unused` only entries without any.
pub fn print_references(manager: &ResourceManager, unused: bool) -> usize {
    let mut printed = 0;
    for entity in manager.entities() {
        for entry in entity.entries() {
            let Some(references) = entry.code_references() else {
                continue;
            };
            if unused {
                if references.is_empty() {
                    println!("{}: {}", entity.identity(), entry.key());
                    printed += 1;
                }
                continue;
            }
            if references.is_empty() {
                continue;
            }
            printed += 1;
            println!("{}: {} ({})", entity.identity(), entry.key(), references.len());
            for reference in references {
                println!(
                    "    {}/{}:{}: {}",
                    reference.project_file.project_name(),
                    reference.project_file.relative_path(),
                    reference.line_number,
                    reference.line_segments.concat().trim()
                );
            }
        }
    }
    printed
}

/// Print cells that differ from the loaded snapshot.
pub fn print_snapshot_diff(manager: &ResourceManager) -> usize {
    let mut count = 0;
    for entity in manager.entities() {
        for entry in entity.entries() {
            for culture in entity.cultures() {
                if !entry.differs_from_snapshot(culture) {
                    continue;
                }
                count += 1;
                println!(
                    "{}: {} [{}] {:?} -> {:?}",
                    entity.identity(),
                    entry.key(),
                    culture_label(culture),
                    entry.snapshot_value(culture).unwrap_or_default(),
                    entry.value(culture).unwrap_or_default()
                );
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        let long = "ä".repeat(60);
        let short = truncate(&long, false);
        assert_eq!(short.chars().count(), 53);
        assert_eq!(truncate(&long, true), long);
        assert_eq!(truncate("short", false), "short");
    }
}
