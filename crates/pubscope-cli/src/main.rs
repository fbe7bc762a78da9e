use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pubscope_core::names::parse_name;
use pubscope_core::models::REFDATA_TYPE_KEY;
use pubscope_core::{
    AppConfig, AuthorRole, ExitCode, HistoryAction, HistoryEntry, PubRecord, Publication,
    RecordStore, init_library,
};
use pubscope_science::{
    BibContext, GrepOptions, ScienceConfig, ScienceError, classify, format_listing,
    format_search_results, grep, record_listing, search_index,
};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "bib",
    about = "Keep track of the literature you read",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format.
    /// Also enabled by setting PUBSCOPE_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty library.
    Init,

    /// List the publications matching some references.
    List {
        #[arg(required = true)]
        refs: Vec<String>,
    },

    /// Print information about a publication, learning it if necessary.
    Show { reference: String },

    /// Learn a publication from its DOI, bibcode or arXiv identifier.
    Learn { reference: String },

    /// Delete the record for a publication.
    Delete { reference: String },

    /// Give a publication a nickname.
    Nick { reference: String, nickname: String },

    /// Replace a publication's record with one read from a JSON file.
    Update { reference: String, file: PathBuf },

    /// List recently accessed publications.
    Recent {
        /// Show the last 100 instead of the last 10.
        #[arg(short = 'l')]
        long: bool,
    },

    /// Operate on groups of publications.
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },

    /// Show how a reference would be interpreted.
    Classify { token: String },

    /// List publications whose title or abstract matches a regular expression.
    Grep {
        /// Ignore case.
        #[arg(short = 'i')]
        ignore_case: bool,
        /// Treat the pattern as a fixed string.
        #[arg(short = 'f')]
        fixed: bool,
        /// Search the identifiers and refdata instead.
        #[arg(short = 'r')]
        refinfo: bool,
        pattern: String,
    },

    /// Query ADS by author surname and year, e.g. `bib rq williams 14 +ref`.
    Rq {
        /// Ask for up to 1000 results and print them all.
        #[arg(short = 'l')]
        large: bool,
        #[arg(required = true, allow_hyphen_values = true)]
        terms: Vec<String>,
    },

    /// Print the raw Crossref record for a DOI or a publication.
    DumpCrossref { reference: String },
}

#[derive(Subcommand)]
enum GroupAction {
    /// Add publications to a group.
    Add {
        group: String,
        #[arg(required = true)]
        refs: Vec<String>,
    },
    /// Remove publications from a group.
    Rm {
        group: String,
        #[arg(required = true)]
        refs: Vec<String>,
    },
    /// List the groups, or the publications in one group.
    List { group: Option<String> },
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    let out = Output {
        json: cli.json || std::env::var("PUBSCOPE_JSON").as_deref() == Ok("1"),
        start: Instant::now(),
    };

    let code = match run(cli.command, &out).await {
        Ok(()) => ExitCode::Success,
        Err(err) => report_error(&err, &out),
    };
    std::process::exit(code.code());
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PUBSCOPE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn,pubscope_science=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(command: Commands, out: &Output) -> Result<()> {
    let config = AppConfig::load()?;

    match command {
        Commands::Init => {
            let db_path = config.database_path();
            init_library(&db_path)?;
            if out.json {
                out.ok(json!({ "database": db_path }))?;
            } else {
                println!("Initialized library at {}", db_path.display());
            }
        }

        Commands::Classify { token } => {
            let kind = classify(&token);
            if out.json {
                out.ok(json!({ "kind": kind.name(), "value": kind.value() }))?;
            } else {
                println!("{kind}");
            }
        }

        Commands::List { refs } => {
            let ctx = open_context(config)?;
            let pubs = ctx
                .resolver()
                .locate_pubs(refs, true, false)
                .collect_all()
                .await?;
            print_listing(&ctx, &pubs, ctx.config().sort_by_year(), out)?;
        }

        Commands::Show { reference } => {
            let ctx = open_context(config)?;
            let publication = require_one(&ctx, &reference, true).await?;
            let record = ctx.db().export_record(publication.id)?;
            let history = ctx.db().history(publication.id)?;
            ctx.db().log_action(publication.id, HistoryAction::Visit)?;

            if out.json {
                out.ok(json!({ "id": publication.id, "record": record, "history": history }))?;
            } else {
                print_info(&ctx, &publication, &record)?;
                print_history(&history);
            }
        }

        Commands::Learn { reference } => {
            let ctx = open_context(config)?;
            let publication = require_one(&ctx, &reference, true).await?;
            let record = ctx.db().export_record(publication.id)?;

            if out.json {
                out.ok(json!({ "id": publication.id, "record": record }))?;
            } else {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }

        Commands::Delete { reference } => {
            let ctx = open_context(config)?;
            let publication = require_one(&ctx, &reference, false).await?;
            ctx.db().delete_publication(publication.id)?;

            if out.json {
                out.ok(json!({ "deleted": publication.id }))?;
            } else {
                println!("Deleted: {}", describe(&publication));
            }
        }

        Commands::Nick {
            reference,
            nickname,
        } => {
            let ctx = open_context(config)?;
            let publication = require_one(&ctx, &reference, false).await?;
            ctx.db().add_nickname(publication.id, &nickname)?;

            if out.json {
                out.ok(json!({ "id": publication.id, "nickname": nickname }))?;
            } else {
                println!("{nickname} → {}", describe(&publication));
            }
        }

        Commands::Update { reference, file } => {
            let ctx = open_context(config)?;
            let publication = require_one(&ctx, &reference, false).await?;

            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let record: PubRecord = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a valid record", file.display()))?;
            let updated = ctx
                .db()
                .replace_authors_and_nicknames(publication.id, record)?;

            if out.json {
                out.ok(json!({ "id": updated.id, "record": ctx.db().export_record(updated.id)? }))?;
            } else {
                println!("Updated: {}", describe(&updated));
            }
        }

        Commands::Recent { long } => {
            let ctx = open_context(config)?;
            let limit = if long { 100 } else { 10 };
            let pubs = ctx.db().recent(limit)?;
            print_listing(&ctx, &pubs, false, out)?;
        }

        Commands::Group { action } => {
            let ctx = open_context(config)?;
            run_group(&ctx, action, out).await?;
        }

        Commands::Grep {
            ignore_case,
            fixed,
            refinfo,
            pattern,
        } => {
            let ctx = open_context(config)?;
            let options = GrepOptions {
                ignore_case,
                fixed,
                refinfo,
            };
            let pubs = grep(ctx.db(), &pattern, options)?;
            print_listing(&ctx, &pubs, ctx.config().sort_by_year(), out)?;
        }

        Commands::Rq { large, terms } => {
            let ctx = open_context(config)?;
            let results = search_index(ctx.dispatcher().bib_index(), &terms, large).await?;

            if out.json {
                out.ok(json!({ "items": results.hits, "total": results.num_found }))?;
            } else {
                let width = ctx.config().listing.title_width;
                for line in format_search_results(&results, large, width) {
                    println!("{line}");
                }
            }
        }

        Commands::DumpCrossref { reference } => {
            let ctx = open_context(config)?;
            let doi = with_candidates(&ctx, ctx.resolver().require_doi(&reference).await)?;
            let xml = ctx.dispatcher().registry_record(&doi).await?;

            if out.json {
                out.ok(json!({ "doi": doi, "unixref": String::from_utf8_lossy(&xml) }))?;
            } else {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&xml)?;
                stdout.flush()?;
            }
        }
    }

    Ok(())
}

async fn run_group(ctx: &BibContext, action: GroupAction, out: &Output) -> Result<()> {
    match action {
        GroupAction::Add { group, refs } => {
            let pubs = ctx
                .resolver()
                .locate_pubs(refs, false, true)
                .collect_all()
                .await?;
            let ids: Vec<i64> = pubs.iter().map(|p| p.id).collect();
            let added = ctx.db().add_to_list(&group, &ids)?;

            if out.json {
                out.ok(json!({ "group": group, "added": added }))?;
            } else {
                println!("Added {added} publication(s) to {group}");
            }
        }

        GroupAction::Rm { group, refs } => {
            // Each reference is checked on its own: "smith.*" may match many
            // publications of which only one is in the group.
            let mut removed = 0;
            for reference in refs {
                let pubs = ctx
                    .resolver()
                    .locate_pubs([reference.as_str()], false, false)
                    .collect_all()
                    .await?;
                let ids: Vec<i64> = pubs.iter().map(|p| p.id).collect();
                let n = ctx.db().remove_from_list(&group, &ids)?;
                if n == 0 {
                    warn!("no entries in \"{group}\" matched \"{reference}\"");
                }
                removed += n;
            }

            if out.json {
                out.ok(json!({ "group": group, "removed": removed }))?;
            } else {
                println!("{}", removal_summary(removed, &group));
            }
        }

        GroupAction::List { group: None } => {
            let names = ctx.db().list_names()?;
            if out.json {
                out.ok(json!({ "groups": names }))?;
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }

        GroupAction::List { group: Some(group) } => {
            let pubs = ctx.db().list_members(&group)?;
            print_listing(ctx, &pubs, ctx.config().sort_by_year(), out)?;
        }
    }

    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────────

struct Output {
    json: bool,
    start: Instant,
}

impl Output {
    fn ok(&self, data: serde_json::Value) -> Result<()> {
        print_json(&json!({
            "status": "ok",
            "data": data,
            "meta": { "duration_ms": self.start.elapsed().as_millis() }
        }))
    }
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn open_context(config: AppConfig) -> Result<BibContext> {
    let science = ScienceConfig::load()?;
    Ok(BibContext::open(config, &science)?)
}

async fn require_one(ctx: &BibContext, reference: &str, autolearn: bool) -> Result<Publication> {
    with_candidates(ctx, ctx.resolver().require_one(reference, autolearn).await)
}

/// On ambiguity the candidates become the last listing, printed to stderr,
/// so the user can retry with `%N`.
fn with_candidates<T>(ctx: &BibContext, result: pubscope_science::Result<T>) -> Result<T> {
    match result {
        Err(ScienceError::AmbiguousMatch { token, candidates }) => {
            eprintln!("More than one publication matched \"{token}\":");
            let rows = record_listing(ctx.db(), &candidates, ctx.config().sort_by_year())?;
            for line in format_listing(&rows, ctx.config().listing.title_width) {
                eprintln!("{line}");
            }
            Err(ScienceError::AmbiguousMatch { token, candidates }.into())
        }
        other => Ok(other?),
    }
}

fn print_listing(
    ctx: &BibContext,
    pubs: &[Publication],
    sort_by_year: bool,
    out: &Output,
) -> Result<()> {
    let rows = record_listing(ctx.db(), pubs, sort_by_year)?;
    if out.json {
        return out.ok(json!({ "items": rows, "total": rows.len() }));
    }
    for line in format_listing(&rows, ctx.config().listing.title_width) {
        println!("{line}");
    }
    Ok(())
}

fn print_info(ctx: &BibContext, publication: &Publication, record: &PubRecord) -> Result<()> {
    let authors = ctx.db().authors(publication.id, AuthorRole::Author)?;
    let mut names: Vec<String> = authors
        .iter()
        .take(10)
        .map(|a| {
            let (given, surname) = parse_name(&a.name);
            if given.is_empty() {
                surname
            } else {
                format!("{given} {surname}")
            }
        })
        .collect();
    if authors.len() > 10 {
        names.push("...".to_string());
    }
    let authors = if names.is_empty() {
        "(no authors)".to_string()
    } else {
        names.join(", ")
    };
    let year = publication
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "no year".to_string());

    println!("{}", publication.title.as_deref().unwrap_or("(no title)"));
    println!("{authors} ({year})");

    if !record.nicknames.is_empty() {
        println!("nicknames: {}", record.nicknames.join(" "));
    }
    if let Some(arxiv) = &publication.arxiv {
        println!("arxiv: {arxiv}");
    }
    if let Some(bibcode) = &publication.bibcode {
        println!("bibcode: {bibcode}");
    }
    if let Some(doi) = &publication.doi {
        println!("DOI: {doi}");
    }
    if let Some(kind) = publication.ref_type() {
        println!("type: {kind}");
    }
    let mut refdata = publication.refdata.clone();
    refdata.remove(REFDATA_TYPE_KEY);
    if !refdata.is_empty() {
        println!("refdata: {}", serde_json::to_string(&refdata)?);
    }
    if let Some(abstract_text) = &publication.abstract_text {
        println!();
        println!("{abstract_text}");
    }
    Ok(())
}

fn print_history(history: &[HistoryEntry]) {
    if history.is_empty() {
        return;
    }
    println!();
    println!("history:");
    for entry in history {
        let action = match entry.action {
            HistoryAction::Visit => "visited",
        };
        println!("  {}  {action}", entry.date.format("%Y-%m-%d %H:%M"));
    }
}

fn removal_summary(removed: usize, group: &str) -> String {
    format!("Removed {removed} publication(s) from {group}")
}

fn describe(publication: &Publication) -> String {
    let nfas = publication.nfas.as_deref().unwrap_or("(no author)");
    let year = publication
        .year
        .map(|y| format!("{y:04}"))
        .unwrap_or_else(|| "????".to_string());
    let title = publication.title.as_deref().unwrap_or("(no title)");
    format!("{nfas}.{year}  {title}")
}

fn report_error(err: &anyhow::Error, out: &Output) -> ExitCode {
    let code = err
        .downcast_ref::<ScienceError>()
        .map(ScienceError::exit_code)
        .unwrap_or(ExitCode::GeneralError);

    if out.json {
        let kind = match code {
            ExitCode::NotFound => "not_found",
            ExitCode::Conflict => "ambiguous",
            _ => "error",
        };
        let _ = print_json(&json!({
            "status": "error",
            "error": kind,
            "message": format!("{err:#}"),
            "meta": { "duration_ms": out.start.elapsed().as_millis() }
        }));
    } else {
        eprintln!("error: {err:#}");
    }
    code
}
