use clap::{Args, Parser, Subcommand, ValueEnum};
use mc_app::{
    AppError, AppResult, CopyOptions, CopyProgressEvent, CopyRequest, CopyScope, CopySummary,
    Delimiter, LeadingColumn, MemoryStore, copy_from_text, copy_to_csv, copy_to_text,
    list_entities, list_models, load_options,
};
use mc_core::Selector;
use mc_paths::NamePolicy;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mc-cli")]
#[command(about = "modelcopy - copy model metadata and values between a store and text files", long_about = None)]
struct Cli {
    /// Store snapshot file
    #[arg(long, global = true, default_value = "store.json")]
    db: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a model, run, workset or task as JSON documents and CSV values
    ToText(CopyArgs),
    /// Import JSON documents and CSV values into the store
    FromText(CopyArgs),
    /// Export metadata as flat CSV tables, plus values
    ToCsv(CopyArgs),
    /// List models, or the runs, worksets and tasks of one model
    List {
        /// Model name or digest
        #[arg(short, long)]
        model: Option<String>,
    },
}

#[derive(Args)]
struct CopyArgs {
    /// Model name or digest
    #[arg(short, long)]
    model: String,
    #[arg(long, conflicts_with_all = ["set_id", "set_name", "task_id", "task_name"])]
    run_id: Option<i32>,
    #[arg(long, conflicts_with_all = ["set_id", "set_name", "task_id", "task_name"])]
    run_name: Option<String>,
    #[arg(long, conflicts_with_all = ["task_id", "task_name"])]
    set_id: Option<i32>,
    #[arg(long, conflicts_with_all = ["task_id", "task_name"])]
    set_name: Option<String>,
    #[arg(long)]
    task_id: Option<i32>,
    #[arg(long)]
    task_name: Option<String>,
    /// Base directory of the text form
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,
    /// YAML options file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write enum ids instead of enum codes
    #[arg(long)]
    use_enum_ids: bool,
    /// printf-style float format, e.g. %.15g
    #[arg(long)]
    float_format: Option<String>,
    /// Put entity ids into names: always, never or on-conflict
    #[arg(long)]
    id_policy: Option<String>,
    /// Start CSV files with a UTF-8 byte order mark
    #[arg(long)]
    bom: bool,
    /// Tab-separated values instead of commas
    #[arg(long)]
    tab: bool,
    /// Skip accumulator tables
    #[arg(long)]
    no_acc: bool,
    /// Skip microdata
    #[arg(long)]
    no_micro: bool,
    /// Flat export only: one file per parameter or table for all runs
    #[arg(long, value_enum)]
    all_in_one: Option<AllInOne>,
    /// Do not verify value digests on import
    #[arg(long)]
    no_digest_check: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum AllInOne {
    Id,
    Name,
}

fn selector(id: Option<i32>, name: Option<String>) -> Option<Selector> {
    (id.is_some() || name.is_some()).then_some(Selector { id, name })
}

impl CopyArgs {
    fn scope(&self) -> CopyScope {
        if let Some(sel) = selector(self.run_id, self.run_name.clone()) {
            CopyScope::Run(sel)
        } else if let Some(sel) = selector(self.set_id, self.set_name.clone()) {
            CopyScope::Workset(sel)
        } else if let Some(sel) = selector(self.task_id, self.task_name.clone()) {
            CopyScope::Task(sel)
        } else {
            CopyScope::Model
        }
    }

    fn options(&self) -> AppResult<CopyOptions> {
        let mut options = match &self.config {
            Some(path) => load_options(path)?,
            None => CopyOptions::default(),
        };
        options.use_enum_ids |= self.use_enum_ids;
        options.bom |= self.bom;
        options.no_accumulators |= self.no_acc;
        options.no_microdata |= self.no_micro;
        if self.no_digest_check {
            options.check_digest = false;
        }
        if self.tab {
            options.delimiter = Delimiter::Tab;
        }
        if let Some(format) = &self.float_format {
            options.float_format = format.clone();
        }
        if let Some(policy) = &self.id_policy {
            options.id_policy = policy.parse::<NamePolicy>()?;
        }
        if let Some(column) = self.all_in_one {
            options.all_in_one = Some(match column {
                AllInOne::Id => LeadingColumn::Id,
                AllInOne::Name => LeadingColumn::Name,
            });
        }
        // fail early on a bad format, before any file is touched
        options.cell_options(None)?;
        Ok(options)
    }

    fn request(&self) -> AppResult<CopyRequest<'_>> {
        Ok(CopyRequest {
            model: &self.model,
            scope: self.scope(),
            dir: self.dir.clone(),
            options: self.options()?,
        })
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ToText(args) => cmd_to_text(&cli.db, &args),
        Commands::FromText(args) => cmd_from_text(&cli.db, &args),
        Commands::ToCsv(args) => cmd_to_csv(&cli.db, &args),
        Commands::List { model } => cmd_list(&cli.db, model.as_deref()),
    }
}

fn open_existing(db: &Path) -> AppResult<MemoryStore> {
    if !db.exists() {
        return Err(AppError::NotFound(format!("store {}", db.display())));
    }
    MemoryStore::open(db)
}

fn cmd_to_text(db: &Path, args: &CopyArgs) -> AppResult<()> {
    let request = args.request()?;
    println!("Exporting {} of model {}", request.scope, request.model);
    let store = open_existing(db)?;
    let summary = copy_to_text(&store, &request, Some(&mut render_cli_progress))?;
    clear_progress_line();
    print_summary("Exported", &summary);
    Ok(())
}

fn cmd_from_text(db: &Path, args: &CopyArgs) -> AppResult<()> {
    let request = args.request()?;
    println!("Importing {} of model {}", request.scope, request.model);
    let mut store = MemoryStore::open(db)?;
    let summary = copy_from_text(&mut store, &request, Some(&mut render_cli_progress))?;
    clear_progress_line();
    store.save(db)?;
    print_summary("Imported", &summary);
    if summary.skipped > 0 {
        println!("  Skipped: {} runs already in store", summary.skipped);
    }
    Ok(())
}

fn cmd_to_csv(db: &Path, args: &CopyArgs) -> AppResult<()> {
    let request = args.request()?;
    println!("Exporting flat tables of model {}", request.model);
    let store = open_existing(db)?;
    let summary = copy_to_csv(&store, &request, Some(&mut render_cli_progress))?;
    clear_progress_line();
    print_summary("Exported", &summary);
    Ok(())
}

fn cmd_list(db: &Path, model: Option<&str>) -> AppResult<()> {
    let store = open_existing(db)?;
    let Some(model) = model else {
        let models = list_models(&store)?;
        if models.is_empty() {
            println!("No models found in {}", db.display());
        }
        for m in models {
            println!(
                "  {} {} ({}): {} runs, {} worksets, {} tasks",
                m.model_id, m.name, m.digest, m.runs, m.worksets, m.tasks
            );
        }
        return Ok(());
    };

    let entities = list_entities(&store, model)?;
    if entities.is_empty() {
        println!("Model {} has no runs, worksets or tasks", model);
    }
    for e in entities {
        if e.digest.is_empty() {
            println!("  {:<8} {:>6}  {}", e.kind, e.id, e.name);
        } else {
            println!("  {:<8} {:>6}  {}  ({})", e.kind, e.id, e.name, e.digest);
        }
    }
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: CopyProgressEvent) {
    let mut line = format!(
        "\r{} {:?}  elapsed={:.2}s",
        event.direction, event.stage, event.elapsed_wall_s
    );
    if let Some(msg) = &event.message {
        line.push_str(&format!("  {}", msg));
    }
    print!("{}", line);
    let _ = io::stdout().flush();
}

fn print_summary(verb: &str, summary: &CopySummary) {
    println!("✓ {} model {} at {}", verb, summary.model, summary.root.display());
    println!("  Runs:     {}", summary.runs);
    println!("  Worksets: {}", summary.worksets);
    println!("  Tasks:    {}", summary.tasks);
    println!("  Files:    {}", summary.files);
}
