//! Finds resource and source files below a root directory.
//!
//! Every file belongs to the project whose `*.csproj`/`*.vbproj`/`*.fsproj` sits in the
//! nearest ancestor directory; files outside any project belong to a project named after
//! the root directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use resxkit::{ProjectFile, ResourceFormat};
use tracing::{debug, warn};

const PROJECT_EXTENSIONS: [&str; 3] = ["csproj", "vbproj", "fsproj"];

fn build_exclusions(patterns: &[String]) -> Result<GlobSet, String> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .map_err(|e| format!("Invalid glob pattern '{}': {}", pat, e))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| format!("Failed to build glob set: {}", e))
}

fn walk(root: &Path) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .hidden(false)
        .ignore(true)
        .parents(true)
        .filter_entry(|e| e.file_name() != ".git")
        .build();

    let mut out = Vec::new();
    for dent in walker {
        let dent = match dent {
            Ok(d) => d,
            Err(e) => {
                warn!("skipping entry: {}", e);
                continue;
            }
        };
        if dent.file_type().is_some_and(|t| t.is_file()) {
            out.push(dent.into_path());
        }
    }
    out.sort();
    out
}

fn relative_string(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Directory → project name, for every directory holding a project file.
fn project_directories(files: &[PathBuf]) -> BTreeMap<PathBuf, String> {
    files
        .iter()
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| PROJECT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        })
        .filter_map(|p| {
            let name = p.file_stem()?.to_string_lossy().to_string();
            Some((p.parent()?.to_path_buf(), name))
        })
        .collect()
}

/// True if `path` is the resource of a form or control with code next to it.
fn is_winforms_designer_resource(path: &Path) -> bool {
    if ResourceFormat::from_path(path) != Some(ResourceFormat::Resx) {
        return false;
    }
    let Some(info) = ResourceFormat::Resx.parse_file_name(path, None) else {
        return false;
    };
    ["cs", "vb"]
        .iter()
        .any(|ext| info.directory.join(format!("{}.{}", info.base_name, ext)).is_file())
}

/// Walks `root` (honouring `.gitignore`) and describes every file not matched by `excludes`.
pub fn discover_files(root: &Path, excludes: &[String]) -> Result<Vec<ProjectFile>, String> {
    if !root.is_dir() {
        return Err(format!("Not a directory: {}", root.display()));
    }
    let exclusions = build_exclusions(excludes)?;
    let root_name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "root".to_string());

    let paths: Vec<PathBuf> = walk(root)
        .into_iter()
        .filter(|p| !exclusions.is_match(relative_string(p, root)))
        .collect();
    let projects = project_directories(&paths);
    debug!("found {} files in {} projects", paths.len(), projects.len());

    let files = paths
        .par_iter()
        .map(|path| {
            let project = path
                .ancestors()
                .skip(1)
                .take_while(|dir| dir.starts_with(root))
                .find_map(|dir| projects.get(dir).map(|name| (dir, name.as_str())));
            let (base, project_name) = project.unwrap_or((root, root_name.as_str()));
            ProjectFile::new(path, project_name, relative_string(path, base))
                .with_winforms_designer_resource(is_winforms_designer_resource(path))
        })
        .collect();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_assigns_projects_and_relative_paths() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/App/App.csproj");
        touch(root, "src/App/Properties/Resources.resx");
        touch(root, "src/App/Form1.cs");
        touch(root, "src/App/Form1.resx");
        touch(root, "src/App/Form1.de.resx");
        touch(root, "tools/Strings.resx");

        let files = discover_files(root, &[]).unwrap();
        let find = |suffix: &str| {
            files
                .iter()
                .find(|f| f.file_path().ends_with(suffix))
                .unwrap()
        };

        let resources = find("Properties/Resources.resx");
        assert_eq!(resources.project_name(), "App");
        assert_eq!(resources.relative_path(), "Properties/Resources.resx");
        assert!(!resources.is_winforms_designer_resource());

        assert!(find("Form1.resx").is_winforms_designer_resource());
        assert!(find("Form1.de.resx").is_winforms_designer_resource());

        let tool = find("tools/Strings.resx");
        assert_eq!(tool.relative_path(), "tools/Strings.resx");
        assert_ne!(tool.project_name(), "App");
    }

    #[test]
    fn test_excludes_globs() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "obj/Debug/Generated.cs");
        touch(dir.path(), "Program.cs");

        let files = discover_files(dir.path(), &["obj/**".to_string()]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path(), "Program.cs");
        assert!(discover_files(dir.path(), &["[".to_string()]).is_err());
    }
}
