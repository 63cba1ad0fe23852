use resxkit::{
    CultureKey, EntityIdentity, Error, ProjectFile, ResourceContext, ResourceEntity,
    TranslationState,
};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn resx(entries: &[(&str, &str)]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root>\n");
    for (key, value) in entries {
        out.push_str(&format!(
            "  <data name=\"{}\" xml:space=\"preserve\">\n    <value>{}</value>\n  </data>\n",
            key, value
        ));
    }
    out.push_str("</root>\n");
    out
}

fn write(root: &Path, name: &str, content: &str) -> ProjectFile {
    let path = root.join(name);
    fs::write(&path, content).unwrap();
    ProjectFile::new(path, "App", name)
}

fn identity() -> EntityIdentity {
    EntityIdentity::new("App", "Strings", "")
}

fn german() -> CultureKey {
    CultureKey::parse("de").unwrap()
}

fn keys(entity: &ResourceEntity) -> Vec<&str> {
    entity.entries().map(|e| e.key()).collect()
}

#[test]
fn test_update_keeps_surviving_entry_ids() {
    let dir = tempdir().unwrap();
    let neutral = write(
        dir.path(),
        "Strings.resx",
        &resx(&[("A", "a"), ("B", "b"), ("C", "c")]),
    );
    let mut entity = ResourceEntity::load(
        identity(),
        ResourceContext::default(),
        vec![(neutral.clone(), CultureKey::Neutral)],
    )
    .unwrap();
    let id_a = entity.entry_by_key("A").unwrap().id();
    let id_c = entity.entry_by_key("C").unwrap().id();

    fs::write(
        neutral.file_path(),
        resx(&[("A", "a"), ("C", "c2"), ("D", "d")]),
    )
    .unwrap();
    let changed = entity
        .update(vec![(neutral, CultureKey::Neutral)])
        .unwrap();

    assert!(changed);
    assert_eq!(keys(&entity), vec!["A", "C", "D"]);
    assert_eq!(entity.entry_by_key("A").unwrap().id(), id_a);
    assert_eq!(entity.entry_by_key("C").unwrap().id(), id_c);
    assert_eq!(
        entity.entry(id_c).unwrap().value(&CultureKey::Neutral),
        Some("c2")
    );
}

#[test]
fn test_unchanged_update_is_a_no_op() {
    let dir = tempdir().unwrap();
    let neutral = write(dir.path(), "Strings.resx", &resx(&[("A", "a")]));
    let mut entity = ResourceEntity::load(
        identity(),
        ResourceContext::default(),
        vec![(neutral.clone(), CultureKey::Neutral)],
    )
    .unwrap();
    entity.take_changes();

    assert!(!entity.update(vec![(neutral, CultureKey::Neutral)]).unwrap());
    assert!(entity.take_changes().is_empty());
}

#[test]
fn test_index_move_reorders_neutral_file() {
    let dir = tempdir().unwrap();
    let neutral = write(
        dir.path(),
        "Strings.resx",
        &resx(&[("A", "a"), ("B", "b"), ("C", "c")]),
    );
    let mut entity = ResourceEntity::load(
        identity(),
        ResourceContext::default(),
        vec![(neutral.clone(), CultureKey::Neutral)],
    )
    .unwrap();

    let id_c = entity.entry_by_key("C").unwrap().id();
    entity.set_index(id_c, 0.5).unwrap();
    assert_eq!(keys(&entity), vec!["A", "C", "B"]);
    let indices: Vec<f64> = entity.entries().map(|e| e.index()).collect();
    assert_eq!(indices, vec![0.0, 1.0, 2.0]);

    entity.save().unwrap();
    let text = fs::read_to_string(neutral.file_path()).unwrap();
    let a = text.find("name=\"A\"").unwrap();
    let b = text.find("name=\"B\"").unwrap();
    let c = text.find("name=\"C\"").unwrap();
    assert!(a < c && c < b);
}

#[test]
fn test_add_and_remove_entries() {
    let dir = tempdir().unwrap();
    let files = vec![
        (write(dir.path(), "Strings.resx", &resx(&[("A", "a")])), CultureKey::Neutral),
        (write(dir.path(), "Strings.de.resx", &resx(&[("A", "ä")])), german()),
    ];
    let mut entity = ResourceEntity::load(identity(), ResourceContext::default(), files).unwrap();

    let id = entity.add("New").unwrap().unwrap();
    assert_eq!(entity.entry(id).unwrap().index(), 1.0);
    assert_eq!(
        entity.entry(id).unwrap().value(&CultureKey::Neutral),
        Some("")
    );
    assert!(entity.add("A").is_err());

    let id_a = entity.entry_by_key("A").unwrap().id();
    assert!(entity.remove(id_a).unwrap());
    assert!(!entity.language(&german()).unwrap().contains_key("A"));
    assert_eq!(keys(&entity), vec!["New"]);
}

#[test]
fn test_edit_gate_rejects_without_partial_effect() {
    let dir = tempdir().unwrap();
    let files = vec![
        (write(dir.path(), "Strings.resx", &resx(&[("A", "a")])), CultureKey::Neutral),
        (write(dir.path(), "Strings.de.resx", &resx(&[("A", "ä")])), german()),
    ];
    let context = ResourceContext::default().with_edit_gate(
        |_: &EntityIdentity, culture: &CultureKey| !culture.same_language(&german()),
    );
    let mut entity = ResourceEntity::load(identity(), context, files).unwrap();
    let id = entity.entry_by_key("A").unwrap().id();

    let error = entity.set_value(id, &german(), Some("neu")).unwrap_err();
    assert!(error.is_edit_rejected());
    assert_eq!(entity.entry(id).unwrap().value(&german()), Some("ä"));

    assert!(entity.remove(id).unwrap_err().is_edit_rejected());
    assert!(entity.language(&CultureKey::Neutral).unwrap().contains_key("A"));

    let message = entity.rename_entry(id, "B").unwrap_err();
    assert_eq!(entity.entry(id).unwrap().validation_message(), Some(message.as_str()));
    assert_eq!(entity.entry(id).unwrap().key(), "A");
    assert!(!entity.has_changes());

    assert!(entity.set_value(id, &CultureKey::Neutral, Some("b")).unwrap());
    assert!(entity.has_changes());
}

#[test]
fn test_rename_collision_sets_validation_message() {
    let dir = tempdir().unwrap();
    let files = vec![(
        write(dir.path(), "Strings.resx", &resx(&[("A", "a"), ("B", "b")])),
        CultureKey::Neutral,
    )];
    let mut entity = ResourceEntity::load(identity(), ResourceContext::default(), files).unwrap();
    let id = entity.entry_by_key("A").unwrap().id();

    assert!(entity.rename_entry(id, "B").is_err());
    assert!(entity.entry(id).unwrap().validation_message().is_some());

    entity.rename_entry(id, "Renamed").unwrap();
    let entry = entity.entry(id).unwrap();
    assert_eq!(entry.key(), "Renamed");
    assert_eq!(entry.validation_message(), None);
    assert_eq!(entry.value(&CultureKey::Neutral), Some("a"));
}

#[test]
fn test_comment_tokens_round_trip() {
    let dir = tempdir().unwrap();
    let content = resx_with_comment("A", "Hello:", "Shown on the  start page");
    let neutral = write(dir.path(), "Strings.resx", &content);
    let mut entity = ResourceEntity::load(
        identity(),
        ResourceContext::default(),
        vec![(neutral.clone(), CultureKey::Neutral)],
    )
    .unwrap();
    let id = entity.entry_by_key("A").unwrap().id();

    entity.set_rule_muted(id, "PunctuationTail", true).unwrap();
    entity
        .set_translation_state(id, &CultureKey::Neutral, Some(TranslationState::Approved))
        .unwrap();
    entity.save().unwrap();

    let reloaded = ResourceEntity::load(
        identity(),
        ResourceContext::default(),
        vec![(neutral, CultureKey::Neutral)],
    )
    .unwrap();
    let entry = reloaded.entry_by_key("A").unwrap();
    assert!(entry.is_rule_muted("PunctuationTail"));
    assert_eq!(
        entry.translation_state(&CultureKey::Neutral),
        Some(TranslationState::Approved)
    );
    assert_eq!(
        entry.comment(&CultureKey::Neutral),
        Some("Shown on the  start page")
    );
}

#[test]
fn test_rule_failures_follow_edits() {
    let dir = tempdir().unwrap();
    let files = vec![
        (write(dir.path(), "Strings.resx", &resx(&[("A", "Hello:")])), CultureKey::Neutral),
        (write(dir.path(), "Strings.de.resx", &resx(&[("A", "Hallo.")])), german()),
    ];
    let mut entity = ResourceEntity::load(identity(), ResourceContext::default(), files).unwrap();
    let id = entity.entry_by_key("A").unwrap().id();

    let failure = entity.entry(id).unwrap().rule_failure(&german()).unwrap().to_string();
    assert!(failure.contains("\":\""));

    entity.set_value(id, &german(), Some("Hallo:")).unwrap();
    assert!(!entity.entry(id).unwrap().has_rule_failures());

    entity.set_value(id, &german(), Some("Hallo!")).unwrap();
    assert!(entity.entry(id).unwrap().has_rule_failures());
    entity.set_rule_muted(id, "PunctuationTail", true).unwrap();
    assert!(!entity.entry(id).unwrap().has_rule_failures());
}

#[test]
fn test_add_language_creates_file() {
    let dir = tempdir().unwrap();
    let files = vec![(
        write(dir.path(), "Strings.resx", &resx(&[("A", "a")])),
        CultureKey::Neutral,
    )];
    let mut entity = ResourceEntity::load(identity(), ResourceContext::default(), files).unwrap();

    let french = CultureKey::parse("fr-FR").unwrap();
    entity.add_language(french.clone()).unwrap();
    assert!(dir.path().join("Strings.fr-FR.resx").exists());
    assert_eq!(entity.cultures().count(), 2);

    let id = entity.entry_by_key("A").unwrap().id();
    entity.set_value(id, &french, Some("à")).unwrap();
    entity.save().unwrap();
    let text = fs::read_to_string(dir.path().join("Strings.fr-FR.resx")).unwrap();
    assert!(text.contains("<value>à</value>"));
}

#[test]
fn test_designer_regeneration_keeps_comments() {
    let dir = tempdir().unwrap();
    let neutral = write(
        dir.path(),
        "Form1.resx",
        &resx_with_comment("Title", "x", "keep me"),
    )
    .with_winforms_designer_resource(true);
    let mut entity = ResourceEntity::load(
        EntityIdentity::new("App", "Form1", ""),
        ResourceContext::default(),
        vec![(neutral.clone(), CultureKey::Neutral)],
    )
    .unwrap();

    fs::write(neutral.file_path(), resx(&[("Title", "y")])).unwrap();
    assert!(entity.update(vec![(neutral, CultureKey::Neutral)]).unwrap());

    let entry = entity.entry_by_key("Title").unwrap();
    assert_eq!(entry.value(&CultureKey::Neutral), Some("y"));
    assert_eq!(entry.comment(&CultureKey::Neutral), Some("keep me"));
}

#[test]
fn test_regenerated_plain_file_drops_comments() {
    let dir = tempdir().unwrap();
    let neutral = write(
        dir.path(),
        "Strings.resx",
        &resx_with_comment("Title", "x", "keep me"),
    );
    let mut entity = ResourceEntity::load(
        identity(),
        ResourceContext::default(),
        vec![(neutral.clone(), CultureKey::Neutral)],
    )
    .unwrap();

    fs::write(neutral.file_path(), resx(&[("Title", "y")])).unwrap();
    entity.update(vec![(neutral, CultureKey::Neutral)]).unwrap();

    let entry = entity.entry_by_key("Title").unwrap();
    assert_eq!(entry.comment(&CultureKey::Neutral), None);
}

#[test]
fn test_failed_save_keeps_changes_and_reports_path() {
    let dir = tempdir().unwrap();
    let neutral = write(dir.path(), "Strings.resx", &resx(&[("A", "a")]));
    let mut entity = ResourceEntity::load(
        identity(),
        ResourceContext::default(),
        vec![(neutral.clone(), CultureKey::Neutral)],
    )
    .unwrap();
    let id = entity.entry_by_key("A").unwrap().id();
    entity.set_value(id, &CultureKey::Neutral, Some("b")).unwrap();

    fs::remove_file(neutral.file_path()).unwrap();
    fs::create_dir(neutral.file_path()).unwrap();

    match entity.save() {
        Err(Error::Save { path, .. }) => assert_eq!(path, neutral.file_path()),
        other => panic!("expected a save error, got {:?}", other),
    }
    assert!(entity.has_changes());
}

fn resx_with_comment(key: &str, value: &str, comment: &str) -> String {
    indoc::formatdoc! {r#"
        <?xml version="1.0" encoding="utf-8"?>
        <root>
          <data name="{key}" xml:space="preserve">
            <value>{value}</value>
            <comment>{comment}</comment>
          </data>
        </root>
    "#}
}
