use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use seacanvas::cli::{
    apply_args_to_config, chart_options_from_args_and_config, export_format, parse_series_spec,
};
use seacanvas::plot_view::default_export_name;
use seacanvas::{
    AppConfig, Args, Backend, ConfigManager, ExportFormat, ExportedFile, HttpBackend, LifecycleState,
    SelectedFile, Session, SessionEvent, APP_NAME,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, TryRecvError};
use tracing::{debug, info};

/// What the run is waiting for once the event queue drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Columns,
    Plot,
    Export,
}

fn output_dir(config: &AppConfig) -> PathBuf {
    config
        .export
        .output_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn save_into(file: &ExportedFile, dir: &Path) -> Result<()> {
    let path = file
        .save_into(dir)
        .wrap_err_with(|| format!("Failed to write {} into {}", file.file_name, dir.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Queue the form edits the arguments describe. Only valid once columns are known.
fn configure_events(args: &Args) -> Result<Vec<SessionEvent>> {
    let mut events = Vec::new();
    if let Some(x) = &args.x_column {
        events.push(SessionEvent::XColumnChanged(Some(x.clone())));
    }
    events.push(SessionEvent::YSelectionChanged(args.y_columns.clone()));
    for spec in &args.series {
        let spec = parse_series_spec(spec)?;
        if !args.y_columns.contains(&spec.column) {
            return Err(eyre!(
                "--series column '{}' is not selected with -y",
                spec.column
            ));
        }
        for edit in spec.edits {
            events.push(SessionEvent::SeriesEdited(spec.column.clone(), edit));
        }
    }
    events.push(SessionEvent::SubmitRequested);
    Ok(events)
}

fn check_columns<B: Backend>(session: &Session<B>, args: &Args) -> Result<()> {
    let registry = session.registry();
    for column in args.x_column.iter().chain(args.y_columns.iter()) {
        if !registry.contains(column) {
            return Err(eyre!(
                "Column '{}' not found. Available columns: {}",
                column,
                registry.columns().join(", ")
            ));
        }
    }
    Ok(())
}

fn run<B: Backend>(mut session: Session<B>, args: &Args, config: &AppConfig, path: &Path) -> Result<()> {
    let (tx, rx) = channel::<SessionEvent>();
    let file = SelectedFile::read(path).map_err(|e| {
        eyre!(seacanvas::user_message_from_io(&e, Some(path)))
    })?;
    tx.send(SessionEvent::FileChosen(file))?;
    let mut stage = Stage::Columns;

    loop {
        match rx.try_recv() {
            Ok(event) => {
                if let Some(next) = session.event(&event) {
                    tx.send(next)?;
                }
                continue;
            }
            Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        // Queue drained: surface errors, then move to the next stage.
        if let Some(err) = session.take_error() {
            return Err(err.into());
        }
        debug!(?stage, state = session.state().as_str(), "queue drained");

        match stage {
            Stage::Columns => {
                if args.list_columns {
                    for column in session.registry().columns() {
                        println!("{}", column);
                    }
                    break;
                }
                check_columns(&session, args)?;
                for event in configure_events(args)? {
                    tx.send(event)?;
                }
                stage = Stage::Plot;
            }
            Stage::Plot => {
                if session.state() != LifecycleState::PlotReady {
                    return Err(eyre!("No plot was produced"));
                }
                let image = session
                    .plot_view()
                    .decoded_image()
                    .ok_or_else(|| eyre!("No plot was produced"))?;
                if let Some(out) = &args.output {
                    write_file(out, image)?;
                }
                match export_format(args, config) {
                    Some(format) => {
                        tx.send(SessionEvent::ExportRequested {
                            format,
                            filename: args.filename.clone().unwrap_or_default(),
                        })?;
                        stage = Stage::Export;
                    }
                    None => {
                        if args.output.is_none() {
                            let png = ExportedFile {
                                file_name: format!(
                                    "{}.{}",
                                    default_export_name(chrono::Local::now()),
                                    ExportFormat::Png.extension()
                                ),
                                format: ExportFormat::Png,
                                bytes: image.to_vec(),
                            };
                            save_into(&png, &output_dir(config))?;
                        }
                        break;
                    }
                }
            }
            Stage::Export => {
                let exported = session
                    .take_export()
                    .ok_or_else(|| eyre!("Export produced no file"))?;
                save_into(&exported, &output_dir(config))?;
                break;
            }
        }
    }
    info!(transitions = session.transitions().count(), "session finished");
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        let path = manager.write_default_config(args.force)?;
        println!("Configuration written to {}", path.display());
        return Ok(Some(()));
    }
    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;

    let mut config = AppConfig::load(APP_NAME)?;
    apply_args_to_config(&args, &mut config);
    config.validate()?;
    let _ = seacanvas::logging::init_tracing(&config.debug.log_level);

    let Some(path) = args.path.clone() else {
        return Err(eyre!("A data file path is required"));
    };
    let backend = HttpBackend::new(config.backend.clone())?;
    let session = Session::new(backend, chart_options_from_args_and_config(&args, &config));

    if let Err(e) = run(session, &args, &config, &path) {
        eprintln!("Error: {}", seacanvas::user_message_from_report(&e));
        std::process::exit(1);
    }
    Ok(())
}
