//! Build orchestration: discovery, parallel transpilation, output.

use crate::cli::{BuildArgs, OutputFormat};
use crate::output::{BuildSummary, Formatter};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use source_map::Position;
use std::fs;
use sugo_bridge::{Transpiled, Transpiler};
use sugo_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticPresenter};
use thiserror::Error;
use walkdir::WalkDir;

/// Extension of sugo sources.
const SOURCE_EXTENSION: &str = "sugo";

/// Patterns that are never searched.
const DEFAULT_IGNORES: [&str; 3] = ["**/.git/**", "**/vendor/**", "**/node_modules/**"];

/// Orchestration errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// A path given on the command line does not exist.
    #[error("no such file or directory: {0}")]
    MissingPath(Utf8PathBuf),

    /// The working directory is not usable.
    #[error("cannot determine the working directory")]
    WorkingDirectory,
}

/// The result of building one file.
#[derive(Debug)]
pub struct FileReport {
    /// The path as displayed, relative to the working directory when possible.
    pub file: String,
    /// Diagnostics in original coordinates.
    pub diagnostics: Vec<Diagnostic>,
    /// The generated file, when written.
    pub emitted: Option<Utf8PathBuf>,
}

/// Returns the current directory as a UTF-8 path.
pub fn working_dir() -> Result<Utf8PathBuf, OrchestratorError> {
    std::env::current_dir()
        .ok()
        .and_then(|dir| Utf8PathBuf::try_from(dir).ok())
        .ok_or(OrchestratorError::WorkingDirectory)
}

/// Runs `sugo build`.
pub fn run(args: &BuildArgs, root: &Utf8Path) -> Result<BuildSummary, OrchestratorError> {
    let ignore_set = ignore_set(&args.ignore)?;
    let files = collect_files(root, &args.paths, &ignore_set)?;
    tracing::debug!(files = files.len(), "discovered sources");

    let formatter = Formatter::new(args.output, DiagnosticPresenter::default());
    let reports = build_files(&files, root, args.emit, formatter.presenter());

    let mut summary = BuildSummary {
        file_count: reports.len(),
        ..Default::default()
    };
    let mut all = Vec::new();
    for report in reports {
        summary.record(&report.diagnostics);
        if report.emitted.is_some() {
            summary.emitted_count += 1;
        }
        if args.output == OutputFormat::Json {
            all.extend(report.diagnostics);
        } else {
            print!("{}", formatter.format(&report.diagnostics));
        }
    }

    match args.output {
        OutputFormat::Json => println!("{}", formatter.format_json(&all)),
        OutputFormat::Human => println!("{}", summary.format()),
        OutputFormat::Machine => {}
    }
    Ok(summary)
}

/// Builds the ignore set from user patterns plus the defaults.
fn ignore_set(patterns: &[String]) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter().map(String::as_str).chain(DEFAULT_IGNORES) {
        let glob = Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))
}

/// Finds the sources named by `paths`, sorted and deduplicated.
///
/// Directories are searched recursively; ignore patterns match paths relative
/// to `root`. Files named explicitly are always included.
pub fn collect_files(
    root: &Utf8Path,
    paths: &[Utf8PathBuf],
    ignore: &GlobSet,
) -> Result<Vec<Utf8PathBuf>, OrchestratorError> {
    let mut files = Vec::new();
    for path in paths {
        let path = match path.as_str() {
            "." => root.to_path_buf(),
            _ if path.is_relative() => root.join(path),
            _ => path.clone(),
        };
        if path.is_file() {
            files.push(path);
            continue;
        }
        if !path.is_dir() {
            return Err(OrchestratorError::MissingPath(path));
        }
        files.extend(
            WalkDir::new(&path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
                .filter(|p| p.extension() == Some(SOURCE_EXTENSION))
                .filter(|p| {
                    let relative = p.strip_prefix(root).unwrap_or(p);
                    !ignore.is_match(relative.as_str())
                }),
        );
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Transpiles `files` in parallel, caching each source in the presenter.
pub fn build_files(
    files: &[Utf8PathBuf],
    root: &Utf8Path,
    emit: bool,
    presenter: &DiagnosticPresenter,
) -> Vec<FileReport> {
    files
        .par_iter()
        .map_init(Transpiler::default, |transpiler, path| {
            let file = path.strip_prefix(root).unwrap_or(path).to_string();
            build_file(transpiler, path, file, emit, presenter)
        })
        .collect()
}

fn build_file(
    transpiler: &Transpiler,
    path: &Utf8Path,
    file: String,
    emit: bool,
    presenter: &DiagnosticPresenter,
) -> FileReport {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            let diag = Diagnostic::new(
                DiagnosticCode::IoError,
                format!("failed to read file: {e}"),
                file.as_str(),
                Position::new(1, 1),
            );
            return FileReport {
                file,
                diagnostics: vec![diag],
                emitted: None,
            };
        }
    };
    let index = presenter.cache().insert(file.as_str(), &source);
    let source_name = path.file_name().unwrap_or(file.as_str());

    let transpiled = match transpiler.transpile(&source, source_name) {
        Ok(transpiled) => transpiled,
        Err(err) => {
            tracing::debug!(file = %file, error = %err, "transpile failed");
            return FileReport {
                diagnostics: Diagnostic::from_transpile_error(&file, &index, &err),
                file,
                emitted: None,
            };
        }
    };

    if !emit {
        return FileReport {
            file,
            diagnostics: Vec::new(),
            emitted: None,
        };
    }
    match write_artifacts(path, &source, &transpiled) {
        Ok(go_path) => FileReport {
            file,
            diagnostics: Vec::new(),
            emitted: Some(go_path),
        },
        Err((target, e)) => {
            let diag = Diagnostic::new(
                DiagnosticCode::IoError,
                format!("failed to write {target}: {e}"),
                file.as_str(),
                Position::new(1, 1),
            );
            FileReport {
                file,
                diagnostics: vec![diag],
                emitted: None,
            }
        }
    }
}

/// Writes `<name>.go` and `<name>.go.map` next to the source.
fn write_artifacts(
    path: &Utf8Path,
    source: &str,
    transpiled: &Transpiled,
) -> Result<Utf8PathBuf, (Utf8PathBuf, std::io::Error)> {
    let go_path = path.with_extension("go");
    let map_path = Utf8PathBuf::from(format!("{go_path}.map"));
    let file_name = go_path.file_name().unwrap_or_default().to_string();
    let map = transpiled.source_map_json(file_name, Some(source)).to_json_string();

    fs::write(&go_path, &transpiled.generated).map_err(|e| (go_path.clone(), e))?;
    fs::write(&map_path, map).map_err(|e| (map_path.clone(), e))?;
    tracing::debug!(path = %go_path, bytes = transpiled.generated.len(), "wrote");
    Ok(go_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VALID: &str = "package main\n\nfunc main() {\n\tlet x = 1\n\t_ = x\n}\n";
    const NON_EXHAUSTIVE: &str =
        "package main\n\nfunc show(v *int) {\n\tmatch v {\n\t\tSome(n) => use(n)\n\t}\n}\n";

    fn workspace() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        fs::create_dir_all(root.join("cmd")).unwrap();
        fs::create_dir_all(root.join("vendor/dep")).unwrap();
        fs::create_dir_all(root.join("gen")).unwrap();
        fs::write(root.join("cmd/main.sugo"), VALID).unwrap();
        fs::write(root.join("cmd/show.sugo"), NON_EXHAUSTIVE).unwrap();
        fs::write(root.join("cmd/plain.go"), "package main\n").unwrap();
        fs::write(root.join("vendor/dep/dep.sugo"), VALID).unwrap();
        fs::write(root.join("gen/out.sugo"), VALID).unwrap();
        (dir, root)
    }

    #[test]
    fn test_collect_files_applies_ignores() {
        let (_dir, root) = workspace();
        let ignore = ignore_set(&["gen/**".to_string()]).unwrap();
        let files = collect_files(&root, &[Utf8PathBuf::from(".")], &ignore).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(&root).unwrap().as_str())
            .collect();
        assert_eq!(relative, vec!["cmd/main.sugo", "cmd/show.sugo"]);
    }

    #[test]
    fn test_explicit_file_is_kept() {
        let (_dir, root) = workspace();
        let ignore = ignore_set(&[]).unwrap();
        let files = collect_files(
            &root,
            &[Utf8PathBuf::from("gen/out.sugo"), Utf8PathBuf::from("gen")],
            &ignore,
        )
        .unwrap();
        assert_eq!(files, vec![root.join("gen/out.sugo")]);
    }

    #[test]
    fn test_missing_path() {
        let (_dir, root) = workspace();
        let ignore = ignore_set(&[]).unwrap();
        assert!(matches!(
            collect_files(&root, &[Utf8PathBuf::from("nope")], &ignore),
            Err(OrchestratorError::MissingPath(_))
        ));
    }

    #[test]
    fn test_invalid_glob() {
        assert!(matches!(
            ignore_set(&["a[".to_string()]),
            Err(OrchestratorError::InvalidGlob(_))
        ));
    }

    #[test]
    fn test_build_reports_and_emits() {
        let (_dir, root) = workspace();
        let files = vec![root.join("cmd/main.sugo"), root.join("cmd/show.sugo")];
        let presenter = DiagnosticPresenter::default();

        let reports = build_files(&files, &root, true, &presenter);
        assert_eq!(reports.len(), 2);

        let ok = &reports[0];
        assert_eq!(ok.file, "cmd/main.sugo");
        assert!(ok.diagnostics.is_empty());
        assert_eq!(ok.emitted, Some(root.join("cmd/main.go")));
        let generated = fs::read_to_string(root.join("cmd/main.go")).unwrap();
        assert!(generated.contains("x := 1"));
        let map: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(root.join("cmd/main.go.map")).unwrap())
                .unwrap();
        assert_eq!(map["file"], "main.go");
        assert_eq!(map["sources"][0], "main.sugo");

        let failed = &reports[1];
        assert_eq!(failed.file, "cmd/show.sugo");
        assert_eq!(failed.emitted, None);
        assert_eq!(failed.diagnostics.len(), 1);
        assert_eq!(failed.diagnostics[0].code, DiagnosticCode::NonExhaustiveMatch);
        assert_eq!(failed.diagnostics[0].missing_cases, vec!["None".to_string()]);
        assert!(!root.join("cmd/show.go").exists());

        // The presenter can render snippets for every reported file.
        assert!(presenter.cache().get("cmd/show.sugo").is_some());
    }
}
