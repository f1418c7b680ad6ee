//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Report, Result, eyre};
use curricle_catalog::{CatalogClient, FilterLine, GraphSelector, TopicFilter};
use curricle_core::{EnrichmentPipeline, matcher};
use curricle_shared::{
    AppConfig, CurricleError, Page, Scope, TopicId, TopicSummary, Unit, UnitTopic, article_url,
    init_config, load_config, load_credentials, resolve_scope,
};
use curricle_wiki::{MetadataClient, SearchClient};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Curricle: encyclopedia-backed syllabus management.
#[derive(Parser)]
#[command(
    name = "curricle",
    version,
    about = "Search encyclopedia topics and manage a department's units, topics, and links.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Institution URI slug (overrides the config file).
    #[arg(long = "inst", global = true, value_name = "URI")]
    pub institution: Option<String>,

    /// Department URI slug (overrides the config file).
    #[arg(long = "dept", global = true, value_name = "URI")]
    pub department: Option<String>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Search the encyclopedia and enrich hits with local catalog links.
    Search {
        /// Free-text query.
        query: String,

        /// Unit code to mark already-linked topics against.
        #[arg(short, long)]
        unit: Option<String>,
    },

    /// Suggest page titles for a partial query.
    Suggest {
        /// Start of a title.
        partial: String,
    },

    /// List the department's units.
    Units {
        /// Page number (1-based).
        #[arg(long, default_value_t = 1)]
        page: u64,
    },

    /// Inspect or change a unit.
    Unit {
        #[command(subcommand)]
        action: UnitAction,
    },

    /// List the department's topics.
    Topics {
        /// Page number (1-based).
        #[arg(long, default_value_t = 1)]
        page: u64,
    },

    /// Inspect or query topics.
    Topic {
        #[command(subcommand)]
        action: TopicAction,
    },

    /// Manage unit-topic links.
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Export a relationship graph as SVG.
    Graph {
        /// Graph one unit.
        #[arg(long, group = "target", value_name = "CODE")]
        unit: Option<String>,

        /// Graph one topic's neighbourhood.
        #[arg(long, group = "target", value_name = "ID")]
        topic: Option<i64>,

        /// Graph one category, by backend id.
        #[arg(long, group = "target", value_name = "ID")]
        category: Option<i64>,

        /// Write the SVG here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Working-scope helpers.
    Scope {
        #[command(subcommand)]
        action: ScopeAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Unit subcommands.
#[derive(Subcommand)]
pub(crate) enum UnitAction {
    /// Show one unit.
    Show {
        /// Unit code, e.g. COMP225.
        code: String,
    },
    /// List a unit's topic links.
    Topics {
        /// Unit code.
        code: String,

        /// Only links whose topic name starts with this prefix.
        #[arg(long = "match", value_name = "PREFIX")]
        prefix: Option<String>,
    },
    /// Create a unit.
    Add {
        /// Unit code.
        code: String,

        /// Unit name.
        name: String,

        /// Unit level (year).
        #[arg(long)]
        level: Option<i64>,
    },
    /// Overwrite a unit's code, name, and level.
    Update {
        /// Backend id of the unit.
        id: i64,

        #[arg(long)]
        code: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        level: Option<i64>,
    },
    /// Delete a unit and its topic links.
    Rm {
        /// Backend id of the unit.
        id: i64,
    },
}

/// Topic subcommands.
#[derive(Subcommand)]
pub(crate) enum TopicAction {
    /// Show one topic with its encyclopedia summary.
    Show {
        /// Backend id of the topic.
        id: i64,
    },
    /// Filter topics by teaching aspects and unit levels.
    Query {
        /// Include line, e.g. "taught,assessed:1,2" (repeatable; all must hold).
        #[arg(long = "include", value_name = "SPEC")]
        include: Vec<String>,

        /// Exclude line, same format (repeatable).
        #[arg(long = "exclude", value_name = "SPEC")]
        exclude: Vec<String>,

        /// Page number (1-based).
        #[arg(long, default_value_t = 1)]
        page: u64,
    },
}

/// Unit-topic link subcommands.
#[derive(Subcommand)]
pub(crate) enum LinkAction {
    /// Link a topic to a unit. The backend creates the topic on first use.
    Add {
        /// Unit code.
        unit_code: String,

        /// Topic name, usually an encyclopedia page title.
        topic_name: String,

        /// Make it a custom topic with this description (no encyclopedia page).
        #[arg(long)]
        description: Option<String>,

        /// Comma-separated keywords for a custom topic.
        #[arg(long)]
        keywords: Option<String>,
    },
    /// Edit a link's alias, teaching aspects, or context topics.
    Update {
        /// Backend id of the link.
        id: i64,

        /// Unit the link belongs to.
        #[arg(long)]
        unit: String,

        /// Display alias; pass an empty string to clear it.
        #[arg(long)]
        alias: Option<String>,

        #[arg(long, value_name = "BOOL")]
        taught: Option<bool>,

        #[arg(long, value_name = "BOOL")]
        assessed: Option<bool>,

        #[arg(long, value_name = "BOOL")]
        applied: Option<bool>,

        /// Context topic names from the same unit (repeatable, replaces all).
        #[arg(long = "context", value_name = "NAME")]
        contexts: Vec<String>,
    },
    /// Remove a link.
    Rm {
        /// Backend id of the link.
        id: i64,
    },
}

/// Scope subcommands.
#[derive(Subcommand)]
pub(crate) enum ScopeAction {
    /// List institutions with their departments.
    List,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    // Prefix directive: covers curricle_cli, curricle_wiki, and the rest.
    let filter = match cli.verbose {
        0 => "curricle=info",
        1 => "curricle=debug",
        _ => "curricle=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = load_config()?;
    let scope = resolve_scope(
        &config,
        cli.institution.as_deref(),
        cli.department.as_deref(),
    );

    match cli.command {
        Command::Search { query, unit } => {
            cmd_search(&config, scope?, &query, unit.as_deref()).await
        }
        Command::Suggest { partial } => cmd_suggest(&config, &partial).await,
        Command::Units { page } => cmd_units(&config, scope?, page).await,
        Command::Unit { action } => match action {
            UnitAction::Show { code } => cmd_unit_show(&config, scope?, &code).await,
            UnitAction::Topics { code, prefix } => {
                cmd_unit_topics(&config, scope?, &code, prefix.as_deref()).await
            }
            UnitAction::Add { code, name, level } => {
                cmd_unit_add(&config, scope?, &code, &name, level).await
            }
            UnitAction::Update {
                id,
                code,
                name,
                level,
            } => cmd_unit_update(&config, scope?, Unit { id, code, name, level }).await,
            UnitAction::Rm { id } => cmd_unit_rm(&config, scope?, id).await,
        },
        Command::Topics { page } => cmd_topics(&config, scope?, page).await,
        Command::Topic { action } => match action {
            TopicAction::Show { id } => cmd_topic_show(&config, scope?, id).await,
            TopicAction::Query {
                include,
                exclude,
                page,
            } => cmd_topic_query(&config, scope?, &include, &exclude, page).await,
        },
        Command::Link { action } => match action {
            LinkAction::Add {
                unit_code,
                topic_name,
                description,
                keywords,
            } => {
                cmd_link_add(
                    &config,
                    scope?,
                    &unit_code,
                    &topic_name,
                    description.as_deref(),
                    keywords.as_deref(),
                )
                .await
            }
            LinkAction::Update {
                id,
                unit,
                alias,
                taught,
                assessed,
                applied,
                contexts,
            } => {
                let edit = LinkEdit {
                    alias,
                    taught,
                    assessed,
                    applied,
                    contexts,
                };
                cmd_link_update(&config, scope?, id, &unit, edit).await
            }
            LinkAction::Rm { id } => cmd_link_rm(&config, scope?, id).await,
        },
        Command::Graph {
            unit,
            topic,
            category,
            out,
        } => cmd_graph(&config, scope?, unit, topic, category, out.as_deref()).await,
        Command::Scope { action } => match action {
            ScopeAction::List => cmd_scope_list(&config).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Client construction and error rendering
// ---------------------------------------------------------------------------

/// Map backend/remote failures to the short messages users act on;
/// anything else is reported as-is.
fn friendly(err: CurricleError) -> Report {
    match err.http_status() {
        Some(401) => eyre!("Not logged in."),
        Some(403) => eyre!("You are not authorised to do that."),
        Some(status) if status >= 500 => eyre!("Unknown server error, please try again."),
        _ => Report::new(err),
    }
}

fn wiki_api_url(config: &AppConfig) -> Result<Url> {
    Url::parse(&config.wikipedia.api_url).map_err(|e| {
        eyre!(
            "invalid wikipedia.api_url {:?}: {e}",
            config.wikipedia.api_url
        )
    })
}

fn search_client(config: &AppConfig) -> Result<SearchClient> {
    Ok(SearchClient::with_timeout(
        wiki_api_url(config)?,
        config.wikipedia.timeout_secs,
    )?)
}

fn metadata_client(config: &AppConfig) -> Result<MetadataClient> {
    Ok(MetadataClient::with_timeout(
        wiki_api_url(config)?,
        config.wikipedia.timeout_secs,
    )?)
}

fn backend_client(config: &AppConfig) -> Result<CatalogClient> {
    let base = Url::parse(&config.backend.base_url).map_err(|e| {
        eyre!("invalid backend.base_url {:?}: {e}", config.backend.base_url)
    })?;
    Ok(CatalogClient::new(base)?)
}

/// Log in with the credentials from the `[auth]` env vars. Writes need the
/// session cookie this leaves on the client.
async fn open_session(client: &CatalogClient, config: &AppConfig, scope: &Scope) -> Result<()> {
    let (user, pass) = load_credentials(config)?;
    client.login(&user, &pass, scope).await.map_err(friendly)
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner.set_message(message);
    spinner
}

fn page_count(total: u64, limit: u64) -> u64 {
    total.div_ceil(limit).max(1)
}

fn page_offset(page: u64, limit: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(limit)
}

// ---------------------------------------------------------------------------
// Search commands
// ---------------------------------------------------------------------------

async fn cmd_search(
    config: &AppConfig,
    scope: Scope,
    query: &str,
    unit: Option<&str>,
) -> Result<()> {
    let pipeline = EnrichmentPipeline::new(
        search_client(config)?,
        metadata_client(config)?,
        backend_client(config)?,
        scope,
    );

    let progress = spinner(format!("Searching for {query:?}"));
    let outcome = pipeline.search_enriched(query, unit).await;
    progress.finish_and_clear();
    let results = outcome.map_err(friendly)?;

    if results.is_empty() {
        println!("No results for {:?}.", results.query);
        if results.filtered_disambiguation > 0 {
            println!(
                "({} disambiguation page(s) filtered out.)",
                results.filtered_disambiguation
            );
        }
        return Ok(());
    }

    println!();
    for candidate in &results.candidates {
        let marker = if candidate.already_associated {
            "  [already linked]"
        } else {
            ""
        };
        println!("  {}{marker}", candidate.title);

        let blurb = if candidate.extract.is_empty() {
            &candidate.snippet
        } else {
            &candidate.extract
        };
        if !blurb.is_empty() {
            println!("    {blurb}");
        }
        if !candidate.associated_units.is_empty() {
            let units: Vec<&str> = candidate
                .associated_units
                .iter()
                .map(String::as_str)
                .collect();
            println!("    linked in: {}", units.join(", "));
        }
        println!("    {}", article_url(&candidate.title));
        println!();
    }

    println!("  {} result(s).", results.len());
    if results.filtered_disambiguation > 0 {
        println!(
            "  {} disambiguation page(s) filtered out.",
            results.filtered_disambiguation
        );
    }
    println!();

    Ok(())
}

async fn cmd_suggest(config: &AppConfig, partial: &str) -> Result<()> {
    let client = search_client(config)?;
    let suggestions = client.suggestions(partial).await.map_err(friendly)?;

    if suggestions.is_empty() {
        println!("No suggestions.");
        return Ok(());
    }
    for title in suggestions {
        println!("{title}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit commands
// ---------------------------------------------------------------------------

async fn cmd_units(config: &AppConfig, scope: Scope, page: u64) -> Result<()> {
    let client = backend_client(config)?;
    let limit = config.defaults.items_per_page.max(1);
    let offset = page_offset(page, limit);

    let units = client
        .fetch_units(&scope, limit, offset)
        .await
        .map_err(friendly)?;

    println!();
    for unit in &units.items {
        let level = unit
            .level
            .map_or_else(|| "-".to_string(), |l| l.to_string());
        println!(
            "  {:<10} level {:<3} {:>4} topic(s)  {}",
            unit.code, level, unit.num_topics, unit.name
        );
    }
    println!();
    println!(
        "  Page {page} of {} ({} units).",
        page_count(units.total, limit),
        units.total
    );
    println!();
    Ok(())
}

async fn cmd_unit_show(config: &AppConfig, scope: Scope, code: &str) -> Result<()> {
    let client = backend_client(config)?;
    let unit = client.fetch_unit(&scope, code).await.map_err(friendly)?;

    println!();
    println!("  Code:  {}", unit.code);
    println!("  Name:  {}", unit.name);
    match unit.level {
        Some(level) => println!("  Level: {level}"),
        None => println!("  Level: -"),
    }
    println!("  Id:    {}", unit.id);
    println!();
    Ok(())
}

async fn cmd_unit_topics(
    config: &AppConfig,
    scope: Scope,
    code: &str,
    prefix: Option<&str>,
) -> Result<()> {
    let client = backend_client(config)?;
    let links = client
        .fetch_unit_topics(&scope, code)
        .await
        .map_err(friendly)?;

    let shown: Vec<&UnitTopic> = match prefix {
        Some(prefix) => matcher::match_topics(&links, prefix),
        None => links.iter().collect(),
    };

    if shown.is_empty() {
        println!("No topics.");
        return Ok(());
    }

    println!();
    for link in shown {
        let mut aspects = Vec::new();
        if link.is_taught {
            aspects.push("taught");
        }
        if link.is_assessed {
            aspects.push("assessed");
        }
        if link.is_applied {
            aspects.push("applied");
        }
        let aspects = if aspects.is_empty() {
            "untagged".to_string()
        } else {
            aspects.join(", ")
        };

        println!("  #{:<5} {}  ({aspects})", link.id, link.display_name());
        if !link.contexts.is_empty() {
            let names: Vec<&str> = link.contexts.iter().map(|t| t.name.as_str()).collect();
            println!("         in context of: {}", names.join(", "));
        }
    }
    println!();
    Ok(())
}

async fn cmd_unit_add(
    config: &AppConfig,
    scope: Scope,
    code: &str,
    name: &str,
    level: Option<i64>,
) -> Result<()> {
    let client = backend_client(config)?;
    open_session(&client, config, &scope).await?;

    info!(code, name, "adding unit");
    let created = client
        .add_unit(&scope, code, name, level)
        .await
        .map_err(friendly)?;
    client.logout().await.map_err(friendly)?;

    if created {
        println!("Unit {code} created.");
    } else {
        println!("Unit {code} already exists.");
    }
    Ok(())
}

async fn cmd_unit_update(config: &AppConfig, scope: Scope, unit: Unit) -> Result<()> {
    let client = backend_client(config)?;
    open_session(&client, config, &scope).await?;

    client.update_unit(&scope, &unit).await.map_err(friendly)?;
    client.logout().await.map_err(friendly)?;

    println!("Unit {} updated.", unit.code);
    Ok(())
}

async fn cmd_unit_rm(config: &AppConfig, scope: Scope, id: i64) -> Result<()> {
    let client = backend_client(config)?;
    open_session(&client, config, &scope).await?;

    client.remove_unit(&scope, id).await.map_err(friendly)?;
    client.logout().await.map_err(friendly)?;

    println!("Unit #{id} removed.");
    Ok(())
}

// ---------------------------------------------------------------------------
// Topic commands
// ---------------------------------------------------------------------------

async fn cmd_topics(config: &AppConfig, scope: Scope, page: u64) -> Result<()> {
    let client = backend_client(config)?;
    let limit = config.defaults.items_per_page.max(1);
    let offset = page_offset(page, limit);

    let topics = client
        .fetch_topics(&scope, limit, offset)
        .await
        .map_err(friendly)?;
    print_topics_page(&topics, page, limit);
    Ok(())
}

async fn cmd_topic_show(config: &AppConfig, scope: Scope, id: i64) -> Result<()> {
    let client = backend_client(config)?;
    let topic = client
        .fetch_topic(&scope, TopicId(id))
        .await
        .map_err(friendly)?;

    println!();
    println!("  {}  (#{})", topic.name, topic.id);
    if !topic.categories.is_empty() {
        let names: Vec<&str> = topic.categories.iter().map(|c| c.short_name()).collect();
        println!("  Categories: {}", names.join(", "));
    }

    // Same summary the search view shows, fetched on demand.
    let metadata = metadata_client(config)?;
    match metadata.page_summary(&topic.name).await.map_err(friendly)? {
        Some(summary) => {
            println!();
            println!("  {}", summary.extract);
            println!("  {}", summary.url);
        }
        None => println!("  No encyclopedia page for this topic."),
    }
    println!();
    Ok(())
}

async fn cmd_topic_query(
    config: &AppConfig,
    scope: Scope,
    include: &[String],
    exclude: &[String],
    page: u64,
) -> Result<()> {
    let filter = TopicFilter {
        include: parse_filter_lines(include)?,
        exclude: parse_filter_lines(exclude)?,
    };

    let client = backend_client(config)?;
    let limit = config.defaults.items_per_page.max(1);
    let offset = page_offset(page, limit);

    let topics = client
        .query_topics(&scope, &filter, limit, offset)
        .await
        .map_err(friendly)?;
    print_topics_page(&topics, page, limit);
    Ok(())
}

fn parse_filter_lines(specs: &[String]) -> Result<Vec<FilterLine>> {
    specs
        .iter()
        .map(|spec| Ok(spec.parse::<FilterLine>()?))
        .collect()
}

fn print_topics_page(topics: &Page<TopicSummary>, page: u64, limit: u64) {
    if topics.items.is_empty() {
        println!("No topics.");
        return;
    }

    println!();
    for topic in &topics.items {
        if topic.unit_codes.is_empty() {
            println!("  #{:<5} {}", topic.id, topic.name);
        } else {
            println!(
                "  #{:<5} {}  [{}]",
                topic.id,
                topic.name,
                topic.unit_codes.join(", ")
            );
        }
    }
    println!();
    println!(
        "  Page {page} of {} ({} topics).",
        page_count(topics.total, limit),
        topics.total
    );
    println!();
}

// ---------------------------------------------------------------------------
// Link commands
// ---------------------------------------------------------------------------

async fn cmd_link_add(
    config: &AppConfig,
    scope: Scope,
    unit_code: &str,
    topic_name: &str,
    description: Option<&str>,
    keywords: Option<&str>,
) -> Result<()> {
    if keywords.is_some() && description.is_none() {
        return Err(eyre!("--keywords only applies to custom topics; add --description"));
    }

    let client = backend_client(config)?;
    open_session(&client, config, &scope).await?;

    info!(unit_code, topic_name, custom = description.is_some(), "linking topic");
    match description {
        Some(description) => {
            client
                .add_custom_topic(
                    &scope,
                    unit_code,
                    topic_name,
                    description,
                    keywords.unwrap_or(""),
                )
                .await
                .map_err(friendly)?;
        }
        None => {
            client
                .add_unit_topic(&scope, unit_code, topic_name)
                .await
                .map_err(friendly)?;
        }
    }
    client.logout().await.map_err(friendly)?;

    println!("Topic {topic_name:?} linked to {unit_code}.");
    Ok(())
}

/// Field edits for `link update`; unset fields keep their current value.
struct LinkEdit {
    alias: Option<String>,
    taught: Option<bool>,
    assessed: Option<bool>,
    applied: Option<bool>,
    contexts: Vec<String>,
}

async fn cmd_link_update(
    config: &AppConfig,
    scope: Scope,
    id: i64,
    unit: &str,
    edit: LinkEdit,
) -> Result<()> {
    let client = backend_client(config)?;
    let links = client
        .fetch_unit_topics(&scope, unit)
        .await
        .map_err(friendly)?;

    let mut link = links
        .iter()
        .find(|l| l.id == id)
        .cloned()
        .ok_or_else(|| eyre!("unit {unit} has no topic link #{id}"))?;

    if let Some(alias) = edit.alias {
        link.alias = if alias.is_empty() { None } else { Some(alias) };
    }
    if let Some(taught) = edit.taught {
        link.is_taught = taught;
    }
    if let Some(assessed) = edit.assessed {
        link.is_assessed = assessed;
    }
    if let Some(applied) = edit.applied {
        link.is_applied = applied;
    }
    if !edit.contexts.is_empty() {
        // Context topics are picked from the same unit's syllabus.
        link.contexts = edit
            .contexts
            .iter()
            .map(|name| {
                links
                    .iter()
                    .map(|l| &l.topic)
                    .find(|t| t.name.eq_ignore_ascii_case(name))
                    .cloned()
                    .ok_or_else(|| {
                        eyre!("unit {unit} has no topic named {name:?} to use as a context")
                    })
            })
            .collect::<Result<Vec<_>>>()?;
    }

    open_session(&client, config, &scope).await?;
    client
        .update_unit_topic(&scope, &link)
        .await
        .map_err(friendly)?;
    client.logout().await.map_err(friendly)?;

    println!("Link #{id} updated.");
    Ok(())
}

async fn cmd_link_rm(config: &AppConfig, scope: Scope, id: i64) -> Result<()> {
    let client = backend_client(config)?;
    open_session(&client, config, &scope).await?;

    client
        .remove_unit_topic(&scope, id)
        .await
        .map_err(friendly)?;
    client.logout().await.map_err(friendly)?;

    println!("Link #{id} removed.");
    Ok(())
}

// ---------------------------------------------------------------------------
// Graph, scope, and config commands
// ---------------------------------------------------------------------------

async fn cmd_graph(
    config: &AppConfig,
    scope: Scope,
    unit: Option<String>,
    topic: Option<i64>,
    category: Option<i64>,
    out: Option<&std::path::Path>,
) -> Result<()> {
    let selector = if let Some(code) = unit {
        GraphSelector::Unit(code)
    } else if let Some(id) = topic {
        GraphSelector::Topic(TopicId(id))
    } else if let Some(id) = category {
        GraphSelector::Category(id)
    } else {
        GraphSelector::Department
    };

    let client = backend_client(config)?;
    let progress = spinner("Rendering graph".to_string());
    let outcome = client.fetch_graph(&scope, &selector).await;
    progress.finish_and_clear();
    let svg = outcome.map_err(friendly)?;

    match out {
        Some(path) => {
            std::fs::write(path, &svg)
                .map_err(|e| eyre!("cannot write {}: {e}", path.display()))?;
            println!("Graph written to {}.", path.display());
        }
        None => println!("{svg}"),
    }
    Ok(())
}

async fn cmd_scope_list(config: &AppConfig) -> Result<()> {
    let client = backend_client(config)?;
    let grouped = client
        .fetch_departments_grouped()
        .await
        .map_err(friendly)?;

    println!();
    for group in grouped {
        println!("  {}  ({})", group.institution.name, group.institution.uri);
        for department in group.departments {
            println!("    {}  ({})", department.name, department.uri);
        }
    }
    println!();
    println!("  Select one with --inst/--dept or [backend] in the config file.");
    println!();
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
