use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tv_grid::controller::Controller;
use tv_grid::dataset::Dataset;
use tv_grid::domain::{GridConfig, GridError};
use tv_grid::export::SelectionPayload;
use tv_grid::grid::Grid;
use tv_grid::host::Host;
use tv_grid::loader::load_dataset;
use tv_grid::model::{Model, Status};
use tv_grid::ui::TableUI;
use tv_grid::view::{DEFAULT_PAGE_SIZE, SortDir, SortKey, ViewState};

const PREVIEW_ROWS: usize = 5;

#[derive(Parser, Debug)]
#[command(
    name = "tv-grid",
    version,
    about = "Sort, filter and page through a table, pick rows and send them to a host."
)]
struct Cli {
    /// Data file (csv, parquet, arrow) with columns id, item, qty, price. Sample data if omitted.
    file: Option<String>,

    /// Rows per page: 10, 30, 50 or 100
    #[arg(short = 'n', long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Initial sort column: id, item, qty, price or total
    #[arg(long, default_value_t = SortKey::Id)]
    sort: SortKey,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    /// Host endpoint: the selection is written to this file as one JSON line
    #[arg(long, env = "TV_GRID_SEND_TO")]
    send_to: Option<String>,

    #[arg(long, default_value = "tv-grid.log")]
    log_file: String,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Print the summary of a payload file and exit
    #[arg(long, value_name = "PAYLOAD")]
    preview: Option<String>,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(local_payloads) => {
            // Selections that never reached a host stay observable
            for payload in local_payloads {
                println!("{payload}");
            }
            ExitCode::SUCCESS
        }
    }
}

fn expand_path(path: &str) -> Result<PathBuf, GridError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| GridError::loading_failed(e.to_string()))
}

fn setup_logging(path: &Path) -> Result<(), GridError> {
    let file = File::create(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tv_grid=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn preview(path: &str) -> Result<(), GridError> {
    let content = fs::read_to_string(expand_path(path)?)?;
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let payload = SelectionPayload::from_json(line)?;
        println!("{}\n", payload.preview(PREVIEW_ROWS));
    }
    Ok(())
}

fn run(cli: Cli) -> Result<Vec<String>, GridError> {
    if let Some(path) = cli.preview.as_deref() {
        preview(path)?;
        return Ok(Vec::new());
    }

    let mut cfg = GridConfig::default()
        .with_event_poll_time(cli.poll_ms)
        .with_page_size(cli.page_size)
        .with_log_file(expand_path(&cli.log_file)?);
    if let Some(send_to) = cli.send_to.as_deref() {
        cfg = cfg.with_send_to(expand_path(send_to)?);
    }
    setup_logging(&cfg.log_file)?;
    info!("Starting tv-grid with {cfg:?}");

    let (name, dataset) = match cli.file.as_deref() {
        Some(file) => {
            let path = expand_path(file)?;
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("???")
                .to_string();
            (name, load_dataset(path)?)
        }
        None => ("sample".to_string(), Dataset::sample()),
    };

    let view = ViewState {
        sort_key: cli.sort,
        sort_dir: if cli.desc { SortDir::Desc } else { SortDir::Asc },
        ..ViewState::default()
    };
    let grid = Grid::new(dataset, view);
    let host = Host::detect(cfg.send_to.clone());
    let mut model = Model::init(name, grid, host, &cfg);
    let controller = Controller::new(&cfg);
    let mut ui = TableUI::new();

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &controller, &mut ui);
    ratatui::restore();
    result?;

    info!("Bye, {} rows selected", model.grid().selected_count());
    Ok(model.local_payloads().to_vec())
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    controller: &Controller,
    ui: &mut TableUI,
) -> Result<(), GridError> {
    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&*model, f))?;

        // Queue the next interaction and handle everything pending
        if let Some(message) = controller.handle_event(model)? {
            model.enqueue(message);
        }
        model.process_events()?;
    }
    Ok(())
}
