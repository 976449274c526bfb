//! tracegrid - inspect and edit the persisted threads grid view.
//!
//! Usage:
//!   tracegrid show --records threads.json      # render the current page
//!   tracegrid show --filter 'status = active'  # only matching threads
//!   tracegrid export --rows t-1 t-2 -o out.csv # selected rows as CSV
//!   tracegrid columns --records threads.json   # list every column and its state
//!   tracegrid select first_message status      # choose visible columns
//!   tracegrid sort last_updated_at:desc        # replace sorting
//!   tracegrid page-size 50                     # change pagination
//!   tracegrid reset                            # back to defaults

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{Level, debug};
use tracing_subscriber::EnvFilter;

use tracegrid::config::GridConfig;
use tracegrid::filter::Filter;
use tracegrid::fmt::truncate;
use tracegrid::grid::{GridError, GridFrame, GridView, RowQuery, threads_view_defaults};
use tracegrid::provider::{JsonFileProvider, NameProvider};
use tracegrid::storage::{FileStore, ViewStateStore};
use tracegrid::view::{RowHeight, SortSpec, ViewState};

/// Widest rendered cell, in characters.
const MAX_CELL_CHARS: usize = 40;

/// Threads grid view configuration tool.
#[derive(Parser)]
#[command(name = "tracegrid", about = "Threads grid view configuration", version = tracegrid::VERSION)]
struct Args {
    /// Directory holding persisted view states.
    #[arg(long, default_value = ".tracegrid", env = "TRACEGRID_STATE_DIR")]
    state_dir: PathBuf,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is warn level.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the current page of the grid.
    Show {
        /// JSON dump of the threads endpoint.
        #[arg(long, env = "TRACEGRID_RECORDS")]
        records: PathBuf,
        /// Filter threads by id.
        #[arg(long)]
        search: Option<String>,
        /// Row filter, e.g. 'status = active' or 'feedback_scores[accuracy] >= 0.5'.
        #[arg(long = "filter")]
        filters: Vec<Filter>,
        /// Active thread id; prints the previous and next thread.
        #[arg(long)]
        active: Option<String>,
    },
    /// Write selected threads of the current page as CSV.
    Export {
        /// JSON dump of the threads endpoint.
        #[arg(long, env = "TRACEGRID_RECORDS")]
        records: PathBuf,
        /// Thread ids to export.
        #[arg(long, required = true, num_args = 1..)]
        rows: Vec<String>,
        /// Filter threads by id.
        #[arg(long)]
        search: Option<String>,
        /// Row filter, same syntax as for `show`.
        #[arg(long = "filter")]
        filters: Vec<Filter>,
        /// Output file (stdout when omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List all columns with their selection and pinning.
    Columns {
        /// JSON dump used to discover feedback score columns.
        #[arg(long, env = "TRACEGRID_RECORDS")]
        records: Option<PathBuf>,
    },
    /// Print the stored view state as JSON.
    State,
    /// Replace the selected columns.
    Select { ids: Vec<String> },
    /// Replace the column order.
    Order { ids: Vec<String> },
    /// Replace column widths (ID=PX).
    Width {
        #[arg(value_parser = parse_width)]
        widths: Vec<(String, u32)>,
    },
    /// Replace sorting (ID or ID:asc / ID:desc).
    Sort { specs: Vec<SortSpec> },
    /// Go to a page (1-based).
    Page { page: u32 },
    /// Change the page size.
    PageSize { size: u32 },
    /// Change the row height (small, medium, large).
    RowHeight { height: RowHeight },
    /// Restore the default view state.
    Reset,
}

fn parse_width(s: &str) -> Result<(String, u32), String> {
    let (id, px) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=PX, got '{}'", s))?;
    let px = px
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid width '{}': {}", px, e))?;
    Ok((id.trim().to_string(), px))
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Logs go to stderr so command output stays clean.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tracegrid={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_state(state: &ViewState) {
    match serde_json::to_string_pretty(state) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: cannot encode view state: {}", e),
    }
}

fn print_frame(frame: &GridFrame) {
    let widths: Vec<usize> = frame
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let cells = frame.rows.iter().map(|r| r.cells[i].chars().count());
            cells
                .chain(std::iter::once(c.label.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_CHARS)
        })
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", truncate(cell, *w), w = *w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(frame.columns.iter().map(|c| c.label.as_str()).collect()));
    for row in &frame.rows {
        println!("{}", line(row.cells.iter().map(String::as_str).collect()));
    }

    let w = frame.window;
    match w.row_range() {
        Some((start, end)) => println!(
            "\nRows {}-{} of {} (page {}/{})",
            start,
            end,
            w.total,
            w.page,
            w.page_count()
        ),
        None => println!("\nNo threads on page {} ({} total)", w.page, w.total),
    }
}

fn print_neighbours(frame: &GridFrame, active: &str) {
    let cursor = frame.cursor(Some(active));
    if cursor.active_id().is_none() {
        println!("Thread {} is not on this page", active);
        return;
    }
    println!(
        "Previous: {}  Next: {}",
        cursor.peek(-1).unwrap_or("-"),
        cursor.peek(1).unwrap_or("-")
    );
}

fn run(args: Args) -> Result<(), GridError> {
    let config = GridConfig::new(&args.state_dir);
    let mut store = FileStore::open(&config.state_dir)?.with_defaults(threads_view_defaults(&config)?);
    let mut grid = GridView::threads()?;
    debug!(state_dir = %config.state_dir.display(), "opened view store");

    match args.command {
        Command::Show {
            records,
            search,
            filters,
            active,
        } => {
            let provider = JsonFileProvider::from_path(&records)?;
            let query = RowQuery::new(search, filters);
            let frame = grid.refresh(&store, &provider, &provider, &query)?;
            print_frame(&frame);
            if let Some(active) = active {
                print_neighbours(&frame, &active);
            }
        }
        Command::Export {
            records,
            rows,
            search,
            filters,
            output,
        } => {
            let provider = JsonFileProvider::from_path(&records)?;
            let query = RowQuery::new(search, filters);
            let table = grid.export(&store, &provider, &provider, &query, &rows)?;
            match output {
                Some(path) => table.write_csv(BufWriter::new(File::create(&path)?))?,
                None => table.write_csv(io::stdout().lock())?,
            }
        }
        Command::Columns { records } => {
            let names = match records {
                Some(path) => JsonFileProvider::from_path(&path)?.names()?,
                None => Vec::new(),
            };
            let state = store.load(grid.key());
            let all = grid.descriptors(&names)?;
            for d in all.iter() {
                let flag = if grid.pinned().iter().any(|p| p == d.id()) {
                    "pinned"
                } else if state.is_selected(d.id()) {
                    "shown"
                } else {
                    "hidden"
                };
                println!(
                    "{:<32} {:<20} {:<17} {}",
                    d.id(),
                    d.label(),
                    d.semantic_type().name(),
                    flag
                );
            }
        }
        Command::State => print_state(&store.load(grid.key())),
        Command::Select { ids } => print_state(&grid.select_columns(&mut store, ids)?),
        Command::Order { ids } => print_state(&grid.set_column_order(&mut store, ids)?),
        Command::Width { widths } => {
            let widths: BTreeMap<String, u32> = widths.into_iter().collect();
            print_state(&grid.set_column_widths(&mut store, widths)?)
        }
        Command::Sort { specs } => print_state(&grid.set_sort(&mut store, specs)?),
        Command::Page { page } => print_state(&grid.set_page(&mut store, page)?),
        Command::PageSize { size } => print_state(&grid.set_page_size(&mut store, size)?),
        Command::RowHeight { height } => print_state(&grid.set_row_height(&mut store, height)?),
        Command::Reset => print_state(&grid.reset(&mut store)?),
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
