use clap::{Parser, Subcommand};
use docpipe::config::{self, BuildProfile};
use docpipe::exec::SystemRunner;
use docpipe::pipeline::Pipeline;
use docpipe::tasks::Task;
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, prelude::*};

fn version_string() -> &'static str {
    let on_tag = env!("DOCPIPE_ON_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("DOCPIPE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "docpipe")]
#[command(about = "Build pipeline and docs-version manager for a Jekyll documentation site")]
#[command(long_about = "\
Build pipeline and docs-version manager for a Jekyll documentation site

Project structure (paths configurable in docpipe.toml):

  .
  ├── VERSION                       # Latest released docs version
  ├── conf/                         # Jekyll configs (_config.yml, _dev.yml, _prod.yml, ...)
  ├── tools/bin/                    # Helper scripts (gen_defaults.js, toc.js, ...)
  └── www/
      ├── _data/toc/                # <lang>_<version>_manual.yml
      ├── docs/<lang>/dev/          # In-progress docs
      ├── docs/<lang>/<version>/    # Released docs
      └── static/
          ├── css-src/              # .less / .scss / .css sources
          └── plugins/app.js        # Plugin bundle entry point

Releasing docs:
  newversion   copy every language's dev docs to the next version, update VERSION
  snap         rebuild the current version from dev

Set DOCPIPE_LOG (e.g. DOCPIPE_LOG=debug) to control log output.

Run 'docpipe gen-config' to generate a documented docpipe.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Build for production
    #[arg(long, global = true)]
    prod: bool,

    /// Leave the docs out of the site build (dev only)
    #[arg(long, global = true)]
    nodocs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every preparation step, then build the site
    Build,
    /// Build the site without the preparation steps
    Jekyll,
    /// Rebuild the site and reload the dev server
    Regen,
    /// Build, then serve the output with live reload
    Serve,
    /// Serve, then rebuild whatever changes
    Watch,
    /// Ask a running dev server to reload
    Reload,
    /// Generate _defaults.yml and _version.yml
    Configs,
    /// Generate _defaults.yml
    Defaults,
    /// Generate _version.yml from the VERSION file
    Version,
    /// Generate the ToC and docs-versions data files
    Data,
    /// Generate the list of docs versions
    DocsVersions,
    /// Generate ToC files (production only)
    Toc,
    /// Download externally hosted docs
    Fetch,
    /// Compile every stylesheet
    Styles,
    /// Compile Less stylesheets
    Less,
    /// Copy plain CSS stylesheets
    Css,
    /// Compile Sass stylesheets
    Sass,
    /// Bundle the JavaScript plugins
    Plugins,
    /// Publish the dev docs as a new version
    Newversion {
        /// Version to publish (default: the one after VERSION)
        #[arg(long)]
        to: Option<String>,
    },
    /// Rebuild the current version from the dev docs
    Snap,
    /// Check the running dev server for broken links
    Checklinks,
    /// Lint HTML sources
    Lint,
    /// Turn bug references in blog posts into links
    LinkBugs,
    /// Remove generated files
    Clean,
    /// Print a stock docpipe.toml with all options documented
    GenConfig,
}

impl Command {
    fn task(&self) -> Option<Task> {
        Some(match self {
            Command::Build => Task::Build,
            Command::Jekyll => Task::Jekyll,
            Command::Regen => Task::Regen,
            Command::Serve => Task::Serve,
            Command::Watch => Task::Watch,
            Command::Reload => Task::Reload,
            Command::Configs => Task::Configs,
            Command::Defaults => Task::Defaults,
            Command::Version => Task::Version,
            Command::Data => Task::Data,
            Command::DocsVersions => Task::DocsVersions,
            Command::Toc => Task::Toc,
            Command::Fetch => Task::Fetch,
            Command::Styles => Task::Styles,
            Command::Less => Task::Less,
            Command::Css => Task::Css,
            Command::Sass => Task::Sass,
            Command::Plugins => Task::Plugins,
            Command::Newversion { .. } => Task::NewVersion,
            Command::Snap => Task::Snap,
            Command::Checklinks => Task::CheckLinks,
            Command::Lint => Task::Lint,
            Command::LinkBugs => Task::LinkBugs,
            Command::Clean => Task::Clean,
            Command::GenConfig => return None,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    initialize_tracing();

    let Some(task) = cli.command.task() else {
        print!("{}", config::stock_config_toml());
        return Ok(());
    };

    let config = config::load_config(&cli.root)?;
    let profile = BuildProfile::resolve(cli.prod, cli.nodocs, &config.build)?;
    tracing::debug!(root = %cli.root.display(), mode = %profile.mode, nodocs = profile.nodocs, "starting {task}");

    let target = match cli.command {
        Command::Newversion { to } => to,
        _ => None,
    };
    let mut pipeline =
        Pipeline::new(config, &cli.root, profile, SystemRunner).with_publish_target(target);
    pipeline.run(task)?;
    Ok(())
}

/// Log to stderr, filtered by `DOCPIPE_LOG` (default `info`).
fn initialize_tracing() {
    let filter = EnvFilter::try_from_env("DOCPIPE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);
    tracing_subscriber::registry().with(stderr_layer).init();
}
