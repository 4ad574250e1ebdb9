use clap::Parser;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use trmnl_display::client::TrmnlClient;
use trmnl_display::config::{api_key_from_env, prompt_api_key, resolve_api_key, ConfigStore};
use trmnl_display::cycle::RefreshController;
use trmnl_display::lifecycle::{FatalError, PanelHandle, ShutdownListener, SleepOnDrop};
use trmnl_display::options::{version_line, AppOptions, Args};
use trmnl_epd::{Epd7in5V2, PinConfig, CLEAR_WHITE, EPD_7IN5_V2};

fn main() -> ExitCode {
    let args = Args::parse();
    if args.show_version {
        println!("{}", version_line());
        return ExitCode::SUCCESS;
    }
    let options = args.options();

    let level = if options.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(err) = run(options) {
        error!("{err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(options: AppOptions) -> Result<(), FatalError> {
    // signals are captured from here on and handled once the panel exists
    let listener = ShutdownListener::install().map_err(FatalError::Signals)?;
    let workdir = tempfile::Builder::new()
        .prefix("trmnl-display")
        .tempdir()
        .map_err(FatalError::Workdir)?;
    info!("Working directory {}", workdir.path().display());

    let device = Epd7in5V2::initialize(EPD_7IN5_V2, &PinConfig::default())
        .map_err(|err| FatalError::PanelInit(Box::new(err)))?;
    let panel = PanelHandle::new(device);
    let _sleep_on_exit = SleepOnDrop(panel.clone());
    listener
        .spawn_panel_shutdown(panel.clone(), workdir.path().to_path_buf())
        .map_err(FatalError::Signals)?;

    let store = ConfigStore::in_home()?;
    let api_key = resolve_api_key(&store, api_key_from_env(), prompt_api_key).map_err(FatalError::ApiKey)?;

    panel.clear(CLEAR_WHITE);
    let controller = RefreshController::new(TrmnlClient::new(api_key), panel, workdir.path(), options.render);
    controller.run_forever()
}
