use std::process::ExitCode;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};

use dyntable::controller::Controller;
use dyntable::domain::{AppConfig, AppError};
use dyntable::grid::{CoercionPolicy, Grid, GridConfig};
use dyntable::logging::init_logging;
use dyntable::model::{Model, Status};
use dyntable::ui::TableUI;

/// A tui based dynamic data grid.
#[derive(Parser, Debug)]
#[command(name = "dyntable", version, about)]
struct Args {
    /// Start with an empty grid instead of the demo users
    #[arg(long)]
    empty: bool,

    /// Reject non-numeric input in number columns instead of storing 0
    #[arg(long)]
    strict_numbers: bool,

    /// Column offered by the filter picker
    #[arg(long, default_value = "status")]
    filter_column: String,

    /// Column toggled by the sort key
    #[arg(long, default_value = "age")]
    sort_column: String,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Widest a column is rendered, in characters
    #[arg(long, default_value_t = 24)]
    max_column_width: usize,

    /// Write logs to this file (~ and $VARS are expanded)
    #[arg(long)]
    log_file: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

impl From<&Args> for AppConfig {
    fn from(args: &Args) -> Self {
        let coercion = if args.strict_numbers {
            CoercionPolicy::Strict
        } else {
            CoercionPolicy::Lenient
        };
        AppConfig::default()
            .grid(GridConfig::default().coercion(coercion))
            .filter_column(args.filter_column.as_str())
            .sort_column(args.sort_column.as_str())
            .event_poll_time(args.poll_ms)
            .max_column_width(args.max_column_width)
            .start_empty(args.empty)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Err(e) => {
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(()) => ExitCode::SUCCESS,
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    init_logging(args.log_file.as_deref(), args.log_level)?;
    let config = AppConfig::from(args);
    info!("Starting dyntable with {config:?}");

    let grid = if config.start_empty {
        Grid::new(config.grid.clone())
    } else {
        Grid::demo(config.grid.clone())
    };

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &config, grid);
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, config: &AppConfig, grid: Grid) -> Result<(), AppError> {
    let size = terminal.size()?;
    let mut model = Model::init(config, grid, size.width.into(), size.height.into());
    let mut ui = TableUI::default();
    let controller = Controller::new(config);

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message);
    }

    info!("Bye");
    Ok(())
}
