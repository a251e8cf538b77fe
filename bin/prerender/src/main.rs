//! prerender CLI
//!
//! Renders every page of a site to static HTML through a server rendering
//! artifact.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for prerender.
#[derive(Parser)]
#[command(
    name = "prerender",
    version,
    about = "Render every page of a site to static HTML"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "prerender.toml")]
    config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Render the listed pages to static HTML
    Build {
        /// Server rendering artifact, invoked once per page
        #[arg(short, long)]
        renderer: PathBuf,
        /// Argument passed to the renderer before the page path (repeatable)
        #[arg(long = "renderer-arg", allow_hyphen_values = true)]
        renderer_args: Vec<String>,
        /// File listing the page paths, one per line
        #[arg(short, long, default_value = "paths.txt")]
        paths: PathBuf,
        /// Output directory (overrides the configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write documents without HTML minification
        #[arg(long)]
        no_minify: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    prerender::init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            renderer,
            renderer_args,
            paths,
            output,
            no_minify,
        } => {
            let options = prerender::cmd::build::BuildOptions {
                renderer: &renderer,
                renderer_args: &renderer_args,
                paths: &paths,
                output: output.as_deref(),
                no_minify,
            };
            prerender::cmd::build::run(&cli.config, &options)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_cli_build_command_parsing() {
        let args = ["prerender", "build", "--renderer", "server.bin"];
        let cli = Cli::parse_from(args);

        assert_eq!(cli.config, PathBuf::from("prerender.toml"));
        assert_eq!(cli.verbose, 0);

        match cli.command {
            Commands::Build {
                renderer,
                renderer_args,
                paths,
                output,
                no_minify,
            } => {
                assert_eq!(renderer, PathBuf::from("server.bin"));
                assert!(renderer_args.is_empty());
                assert_eq!(paths, PathBuf::from("paths.txt"));
                assert!(output.is_none());
                assert!(!no_minify);
            }
        }
    }

    #[test]
    fn test_cli_build_with_renderer_args() {
        let args = [
            "prerender",
            "build",
            "--renderer",
            "/usr/bin/node",
            "--renderer-arg",
            "server.js",
            "--renderer-arg",
            "--experimental-vm-modules",
            "--output",
            "dist",
            "--no-minify",
        ];
        let cli = Cli::parse_from(args);

        let Commands::Build {
            renderer_args,
            output,
            no_minify,
            ..
        } = cli.command;
        assert_eq!(renderer_args, vec!["server.js", "--experimental-vm-modules"]);
        assert_eq!(output, Some(PathBuf::from("dist")));
        assert!(no_minify);
    }

    #[test]
    fn test_cli_requires_renderer() {
        let result = Cli::try_parse_from(["prerender", "build"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbosity_flags() {
        let args = ["prerender", "-vvv", "build", "-r", "server.bin"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_cli_custom_config_path() {
        let args = ["prerender", "--config", "site.toml", "build", "-r", "server.bin"];
        let cli = Cli::parse_from(args);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
    }

    #[test]
    fn test_cli_paths_file() {
        let args = ["prerender", "build", "-r", "server.bin", "-p", "routes.txt"];
        let cli = Cli::parse_from(args);

        let Commands::Build { paths, .. } = cli.command;
        assert_eq!(paths, PathBuf::from("routes.txt"));
    }
}
