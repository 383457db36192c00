//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

/// Transpiler and language server proxy for sugared Go.
#[derive(Debug, Parser)]
#[command(name = "sugo")]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Transpile `.sugo` files and report diagnostics
    Build(BuildArgs),
    /// Run the language server proxy on stdin/stdout
    Lsp(LspArgs),
}

/// Arguments of `sugo build`.
#[derive(Debug, ClapArgs)]
pub struct BuildArgs {
    /// Files or directories to transpile
    #[arg(default_value = ".")]
    pub paths: Vec<Utf8PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Write `.go` and `.go.map` next to each source
    #[arg(long)]
    pub emit: bool,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Path to sugo.toml
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,
}

/// Arguments of `sugo lsp`.
#[derive(Debug, ClapArgs)]
pub struct LspArgs {
    /// Path to sugo.toml
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output with source snippets (default)
    #[default]
    Human,
    /// JSON output
    Json,
    /// Machine-readable (one line per diagnostic)
    Machine,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_defaults() {
        let args = Args::parse_from(["sugo", "build"]);
        let Command::Build(build) = args.command else {
            panic!("expected build");
        };
        assert_eq!(build.paths, vec![Utf8PathBuf::from(".")]);
        assert_eq!(build.output, OutputFormat::Human);
        assert!(!build.emit);
        assert!(build.ignore.is_empty());
    }

    #[test]
    fn test_build_options() {
        let args = Args::parse_from([
            "sugo", "build", "cmd", "pkg/a.sugo", "--output", "machine", "--emit", "--ignore",
            "**/gen/**",
        ]);
        let Command::Build(build) = args.command else {
            panic!("expected build");
        };
        assert_eq!(
            build.paths,
            vec![Utf8PathBuf::from("cmd"), Utf8PathBuf::from("pkg/a.sugo")]
        );
        assert_eq!(build.output, OutputFormat::Machine);
        assert!(build.emit);
        assert_eq!(build.ignore, vec!["**/gen/**".to_string()]);
    }

    #[test]
    fn test_lsp_config() {
        let args = Args::parse_from(["sugo", "lsp", "--config", "/w/sugo.toml"]);
        let Command::Lsp(lsp) = args.command else {
            panic!("expected lsp");
        };
        assert_eq!(lsp.config.as_deref().map(|p| p.as_str()), Some("/w/sugo.toml"));
    }

    #[test]
    fn test_unknown_output_is_rejected() {
        assert!(Args::try_parse_from(["sugo", "build", "--output", "xml"]).is_err());
    }
}
