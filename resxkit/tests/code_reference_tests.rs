use resxkit::{
    CodeReferenceConfigItem, CodeReferenceTracker, Configuration, DefaultFileFilter, EntityIdentity,
    FileFilter, ProjectFile, ResourceContext, ResourceManager,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn write(root: &Path, name: &str, content: &str) -> ProjectFile {
    let path = root.join(name);
    fs::write(&path, content).unwrap();
    ProjectFile::new(path, "App", name)
}

fn manager(configuration: Configuration) -> ResourceManager {
    let filter: Arc<dyn FileFilter> = Arc::new(DefaultFileFilter::new(&configuration));
    ResourceManager::new(ResourceContext::new(configuration), filter)
}

fn resources(root: &Path) -> ProjectFile {
    write(
        root,
        "Resources.resx",
        "<root>\n  <data name=\"Hello\" xml:space=\"preserve\">\n    <value>Hello</value>\n  </data>\n</root>\n",
    )
}

fn scan(manager: &mut ResourceManager) {
    let mut tracker = CodeReferenceTracker::new();
    manager.find_code_references(&mut tracker);
    let results = tracker.wait().expect("scan finished");
    manager.apply_code_references(&results);
}

fn references(manager: &ResourceManager) -> Option<Vec<(String, usize, Vec<String>)>> {
    let entity = manager
        .entity(&EntityIdentity::new("App", "Resources", ""))
        .unwrap();
    let entry = entity.entry_by_key("Hello").unwrap();
    entry.code_references().map(|refs| {
        refs.iter()
            .map(|r| {
                (
                    r.project_file.relative_path().to_string(),
                    r.line_number,
                    r.line_segments.clone(),
                )
            })
            .collect()
    })
}

#[test]
fn test_literal_mode_finds_reference() {
    let dir = tempdir().unwrap();
    let configuration = Configuration::default()
        .with_code_references(vec![CodeReferenceConfigItem::new(".cs", "", true, "//")]);
    let mut manager = manager(configuration);
    manager.load(vec![
        resources(dir.path()),
        write(dir.path(), "Program.cs", "x = R.Hello;\n"),
    ]);

    scan(&mut manager);
    let found = references(&manager).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, "Program.cs");
    assert_eq!(found[0].1, 1);
    assert_eq!(found[0].2, vec!["x = R.", "Hello", ";"]);
}

#[test]
fn test_commented_reference_is_ignored() {
    let dir = tempdir().unwrap();
    let configuration = Configuration::default()
        .with_code_references(vec![CodeReferenceConfigItem::new(".cs", "", true, "//")]);
    let mut manager = manager(configuration);
    manager.load(vec![
        resources(dir.path()),
        write(dir.path(), "Program.cs", "// x = R.Hello;\n"),
    ]);

    scan(&mut manager);
    assert_eq!(references(&manager).unwrap().len(), 0);
}

#[test]
fn test_source_with_invalid_utf8_is_still_scanned() {
    let dir = tempdir().unwrap();
    let configuration = Configuration::default()
        .with_code_references(vec![CodeReferenceConfigItem::new(".cs", "", true, "//")]);
    let mut manager = manager(configuration);
    let path = dir.path().join("Program.cs");
    fs::write(&path, b"var x = GetString(\"Hello\"); // caf\xE9\n").unwrap();
    manager.load(vec![
        resources(dir.path()),
        ProjectFile::new(path, "App", "Program.cs"),
    ]);

    scan(&mut manager);
    let found = references(&manager).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].1, 1);
    assert_eq!(found[0].2[1], "Hello");
}

#[test]
fn test_default_patterns_match_csharp_and_xaml() {
    let dir = tempdir().unwrap();
    let mut manager = manager(Configuration::default());
    manager.load(vec![
        resources(dir.path()),
        write(
            dir.path(),
            "Program.cs",
            "class P {\n    string s = Resources.Hello;\n    string t = Hellox;\n}\n",
        ),
        write(
            dir.path(),
            "View.xaml",
            "<TextBlock Text=\"{x:Static p:Resources.Hello}\" />\n",
        ),
    ]);

    scan(&mut manager);
    let mut found = references(&manager).unwrap();
    found.sort();
    assert_eq!(found.len(), 2);
    assert_eq!((found[0].0.as_str(), found[0].1), ("Program.cs", 2));
    assert_eq!((found[1].0.as_str(), found[1].1), ("View.xaml", 1));
}

#[test]
fn test_excluded_files_are_not_scanned() {
    let dir = tempdir().unwrap();
    let mut configuration = Configuration::default()
        .with_code_references(vec![CodeReferenceConfigItem::new(".cs", "", true, "")]);
    configuration.file_exclusion_filter = Some(r"^obj/".to_string());
    let mut manager = manager(configuration);
    fs::create_dir_all(dir.path().join("obj")).unwrap();
    manager.load(vec![
        resources(dir.path()),
        write(dir.path(), "obj/Generated.cs", "Hello\n"),
    ]);

    scan(&mut manager);
    assert_eq!(references(&manager).unwrap().len(), 0);
}

#[test]
fn test_new_scan_clears_previous_results() {
    let dir = tempdir().unwrap();
    let configuration = Configuration::default()
        .with_code_references(vec![CodeReferenceConfigItem::new(".cs", "", true, "")]);
    let mut manager = manager(configuration);
    manager.load(vec![
        resources(dir.path()),
        write(dir.path(), "Program.cs", "Hello\n"),
    ]);
    scan(&mut manager);
    assert!(references(&manager).is_some());

    let mut tracker = CodeReferenceTracker::new();
    manager.find_code_references(&mut tracker);
    assert!(references(&manager).is_none());
    tracker.stop_find();
}
