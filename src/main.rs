//! CLI entry point for gcpath.
//!
//! Lists, draws, and resolves Google Cloud resource hierarchies. Every
//! command goes through the cache-first loader in the library; the binary
//! only parses arguments, prints results, and maps errors to exit codes.

use anyhow::{Context, Result, bail};
use clap::{
    Args, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use gcpath::display::{TreeOptions, create_cache_info_table, create_listing_table, render_tree};
use gcpath::io::ExitCode;
use gcpath::{
    Hierarchy, HierarchyCache, HierarchyError, LoadMode, LoadRequest, ResourceName, RestCloud,
    Settings, display::THEME, logging,
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Google Cloud resource hierarchy utility
#[derive(Parser)]
#[command(
    name = "gcpath",
    version = env!("CARGO_PKG_VERSION"),
    about = "Google Cloud resource hierarchy utility",
    long_about = "Translate between resource names (folders/123) and paths \
                  (//example.com/engineering/backend), list and draw hierarchies.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Load folders and projects with Cloud Asset queries
    #[arg(short = 'u', long, global = true, conflicts_with = "iterative")]
    bulk: bool,

    /// Load folders and projects by walking Resource Manager
    #[arg(short = 'U', long, global = true)]
    iterative: bool,

    /// Ignore the cached hierarchy and reload from the APIs
    #[arg(long, global = true)]
    refresh: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// List folders and projects by path
    #[command(
        about = "List folders and projects in your organizations",
        after_help = "Examples:\n  gcpath ls\n  gcpath ls example.com --long\n  gcpath ls --scope folders/123"
    )]
    Ls {
        /// Organization display names to keep (default: all)
        organizations: Vec<String>,

        /// Show resource names next to paths
        #[arg(short, long)]
        long: bool,

        /// Only direct children of each organization or of --scope
        #[arg(short = 'r', long)]
        no_recursive: bool,

        /// Only list this folder or organization and what lies below it
        #[arg(short, long, value_name = "RESOURCE_NAME")]
        scope: Option<String>,
    },

    /// Draw the hierarchy as a tree
    #[command(about = "Draw organizations, folders and projects as a tree")]
    Tree {
        /// Organization display names to keep (default: all)
        organizations: Vec<String>,

        /// Deepest level to draw (organization children are level 1)
        #[arg(short = 'L', long)]
        level: Option<usize>,

        /// Show resource names next to display names
        #[arg(short, long)]
        ids: bool,
    },

    /// Resolve paths to resource names
    #[command(
        name = "name",
        about = "Get the resource name of one or more paths",
        after_help = "Examples:\n  gcpath name //example.com/engineering\n  gcpath name //_/sandbox --id"
    )]
    Name {
        /// Paths such as //example.com/engineering/backend
        #[arg(required = true)]
        paths: Vec<String>,

        /// Print only the numeric id
        #[arg(long)]
        id: bool,
    },

    /// Resolve resource names to paths
    #[command(
        name = "path",
        about = "Get the path of one or more resource names",
        after_help = "Examples:\n  gcpath path folders/123\n  gcpath path projects/456 organizations/789"
    )]
    Path {
        /// Resource names such as folders/123
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Inspect or remove the hierarchy cache
    #[command(about = "Show or clear the cached hierarchy")]
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Write a default settings file
    #[command(about = "Create a settings.toml with default values")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show where the cache lives and what it holds
    Info(CacheInfoArgs),
    /// Delete the cache file
    Clear,
}

#[derive(Args)]
struct CacheInfoArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli) {
        report(&error);
        std::process::exit(ExitCode::from_anyhow(&error).into());
    }
}

fn report(error: &anyhow::Error) {
    eprintln!("{}", THEME.error_with_icon(&format!("{error:#}")));
    if let Some(hierarchy_error) = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<HierarchyError>())
    {
        for suggestion in hierarchy_error.recovery_suggestions() {
            eprintln!("  {}", THEME.apply(&THEME.dim, suggestion));
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Settings::load()?,
    };

    if cli.bulk {
        settings.loader.mode = LoadMode::Bulk;
    } else if cli.iterative {
        settings.loader.mode = LoadMode::Iterative;
    }
    settings.debug |= cli.debug;
    Ok(settings)
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Init { force } => {
            let path = cli.config.clone().unwrap_or_else(Settings::default_config_path);
            let created = Settings::init_config_file(&path, *force)
                .map_err(|e| HierarchyError::Config {
                    reason: e.to_string(),
                })?;
            println!("Created configuration file at: {}", created.display());
            println!("Edit this file to customize your settings.");
            return Ok(());
        }
        Commands::Config => {
            let settings = load_settings(&cli)?;
            println!("{}", THEME.apply(&THEME.header, "Current Configuration:"));
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
            return Ok(());
        }
        _ => {}
    }

    let settings = load_settings(&cli)?;
    logging::init(settings.debug);
    tracing::debug!("loader mode: {}", settings.loader.mode.as_str());

    let cache = HierarchyCache::from_config(&settings.cache);

    match cli.command {
        Commands::Ls {
            organizations,
            long,
            no_recursive,
            scope,
        } => {
            let mut request = LoadRequest::from_settings(&settings)
                .with_org_filter(organizations)
                .recursive(!no_recursive)
                .force_refresh(cli.refresh);
            let scope = scope.as_deref().map(ResourceName::parse).transpose()?;
            if let Some(target) = scope {
                request = request.with_target(target);
            }

            let hierarchy = load(&settings, &request, cache.as_ref())?;
            let entries = match scope {
                Some(target) => scoped_entries(&hierarchy, &target)?,
                None => hierarchy.entries()?,
            };

            if entries.is_empty() {
                print_empty_hint();
            } else if long {
                println!("{}", create_listing_table(&entries));
            } else {
                for (path, _) in &entries {
                    println!("{path}");
                }
            }
        }

        Commands::Tree {
            organizations,
            level,
            ids,
        } => {
            let request = LoadRequest::from_settings(&settings)
                .with_org_filter(organizations)
                .force_refresh(cli.refresh);
            let hierarchy = load(&settings, &request, cache.as_ref())?;

            if hierarchy.is_empty() {
                print_empty_hint();
            } else {
                let options = TreeOptions {
                    level,
                    show_ids: ids,
                };
                print!("{}", render_tree(&hierarchy, &THEME, options));
            }
        }

        Commands::Name { paths, id } => {
            let request = LoadRequest::from_settings(&settings).force_refresh(cli.refresh);
            let hierarchy = load(&settings, &request, cache.as_ref())?;

            for path in &paths {
                let name = hierarchy.resource_name_of(path)?;
                if id {
                    println!("{}", name.id());
                } else {
                    println!("{name}");
                }
            }
        }

        Commands::Path { names } => {
            let names = names
                .iter()
                .map(|raw| ResourceName::parse(raw))
                .collect::<Result<Vec<_>, _>>()?;

            // A cached full hierarchy answers without any API call
            let full_key = LoadRequest::from_settings(&settings).cache_key();
            let cached = cache
                .as_ref()
                .filter(|_| !cli.refresh)
                .and_then(|c| c.read(&full_key));

            let mut first_error = None;
            for name in &names {
                match resolve_path(&settings, cached.as_ref(), name) {
                    Ok(path) => println!("{path}"),
                    Err(e) if names.len() > 1 => {
                        eprintln!(
                            "{}",
                            THEME.error_with_icon(&format!("Error resolving {name}: {e:#}"))
                        );
                        first_error.get_or_insert(e);
                    }
                    Err(e) => return Err(e),
                }
            }
            if let Some(e) = first_error {
                return Err(e.context("some resource names could not be resolved"));
            }
        }

        Commands::Cache { action } => {
            let Some(cache) = cache else {
                bail!(HierarchyError::Config {
                    reason: "the cache is disabled (cache.enabled = false)".to_string(),
                });
            };
            match action {
                CacheAction::Info(args) => {
                    let info = cache.info();
                    if args.json {
                        println!("{}", serde_json::to_string_pretty(&info)?);
                    } else {
                        println!("{}", create_cache_info_table(&info));
                    }
                }
                CacheAction::Clear => {
                    if cache.clear()? {
                        println!("Removed {}", cache.path().display());
                    } else {
                        println!("No cache file at {}", cache.path().display());
                    }
                }
            }
        }

        Commands::Init { .. } | Commands::Config => {
            // Already handled above
            unreachable!()
        }
    }

    Ok(())
}

fn backend(settings: &Settings) -> Result<RestCloud> {
    RestCloud::new(&settings.api, settings.loader.page_size)
        .context("could not create the HTTP client")
}

fn load(
    settings: &Settings,
    request: &LoadRequest,
    cache: Option<&HierarchyCache>,
) -> Result<Hierarchy> {
    let backend = backend(settings)?;
    Ok(Hierarchy::load(request, &backend, cache)?)
}

/// Target and everything below it, sorted by path
fn scoped_entries(
    hierarchy: &Hierarchy,
    target: &ResourceName,
) -> Result<Vec<(String, ResourceName)>> {
    let mut names = vec![*target];
    names.extend(hierarchy.descendants_of(target)?.iter().map(|r| r.name()));

    let mut entries = names
        .into_iter()
        .map(|name| hierarchy.path_of(&name).map(|path| (path, name)))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}

/// Path of `name`, from the cached hierarchy when it knows the resource,
/// otherwise from a scoped fetch of just its ancestry
fn resolve_path(
    settings: &Settings,
    cached: Option<&Hierarchy>,
    name: &ResourceName,
) -> Result<String> {
    if let Some(hierarchy) = cached.filter(|h| h.contains(name)) {
        return Ok(hierarchy.path_of(name)?);
    }

    let request = LoadRequest::from_settings(settings)
        .with_target(*name)
        .recursive(false);
    let hierarchy = Hierarchy::fetch(&request, &backend(settings)?)?;
    Ok(hierarchy.path_of(name)?)
}

fn print_empty_hint() {
    println!(
        "{}",
        THEME.warning_with_icon("No organizations or projects found accessible to your account.")
    );
    println!(
        "{}",
        THEME.apply(
            &THEME.dim,
            "Hint: projects without an organization are shown under //_"
        )
    );
}
