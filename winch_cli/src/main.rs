mod assemble;
mod cli;
mod output;

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;

use cli::{Cli, Commands};
use winch_core::telemetry::TelemetrySink;
use winch_core::{record, runner};
use winch_traits::{Direction, MotorDriver, PositionStore};

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let text = fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("reading config {}", args.config.display()))?;
    let cfg = winch_config::load_toml(&text)
        .map_err(|e| eyre::eyre!("{e}"))
        .wrap_err_with(|| format!("parsing config {}", args.config.display()))?;
    cfg.validate().wrap_err("invalid configuration")?;

    init_tracing(&args, &cfg.logging);

    match args.cmd {
        Commands::Run { cycles } => run(&cfg, args.json, cycles),
        Commands::Status => status(&cfg, args.json),
        Commands::Clear => clear(&cfg, args.json),
        Commands::Smoke { seconds, duty } => smoke(&cfg, args.json, seconds, duty),
    }
}

fn init_tracing(args: &Cli, logging: &winch_config::Logging) {
    use tracing_subscriber::EnvFilter;

    let level = logging.level.as_deref().unwrap_or(&args.log_level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if let Some(file) = &logging.file {
        let path = std::path::Path::new(file);
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let name = path.file_name().unwrap_or_else(|| "winch.log".as_ref());
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = cli::FILE_GUARD.set(guard);
        builder.json().with_writer(writer).init();
    } else if args.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cfg: &winch_config::Config, json: bool, cycles: Option<u64>) -> eyre::Result<()> {
    let mut rig = assemble::build_rig(cfg)?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    })
    .wrap_err("installing ctrl-c handler")?;

    let mut sink: Box<dyn TelemetrySink> = if json {
        Box::new(output::JsonLinesSink::new(std::io::stdout()))
    } else {
        Box::new(output::TracingSink)
    };
    runner::run_loop(&mut rig.core, sink.as_mut(), &shutdown, cycles)
}

fn status(cfg: &winch_config::Config, json: bool) -> eyre::Result<()> {
    let mut store = assemble::position_store(cfg);
    let bytes = store.read().map_err(|e| eyre::eyre!("{e}"))?;
    let counts = record::decode(&bytes, cfg.channels.len());
    let targets = assemble::targets(cfg);

    if json {
        let obj = match &counts {
            Some(counts) => serde_json::json!({
                "initialized": true,
                "channels": cfg.channels.iter().zip(counts).zip(&targets).map(|((ch, count), target)| {
                    serde_json::json!({ "name": ch.name, "count": count, "target_steps": target })
                }).collect::<Vec<_>>(),
            }),
            None => serde_json::json!({ "initialized": false }),
        };
        println!("{obj}");
        return Ok(());
    }

    match counts {
        Some(counts) => {
            for ((ch, count), target) in cfg.channels.iter().zip(counts).zip(targets) {
                println!("{}: count {} (target {})", ch.name, count, target);
            }
        }
        None => println!("position record uninitialized"),
    }
    Ok(())
}

fn clear(cfg: &winch_config::Config, json: bool) -> eyre::Result<()> {
    let mut store = assemble::position_store(cfg);
    let zeros = vec![0i32; cfg.channels.len()];
    store
        .write(&record::encode(&zeros))
        .map_err(|e| eyre::eyre!("{e}"))
        .wrap_err("clearing position record")?;
    tracing::info!(path = %store.path().display(), "position record cleared");
    if json {
        println!("{}", serde_json::json!({ "cleared": cfg.channels.len() }));
    } else {
        println!("position record cleared ({} channels)", cfg.channels.len());
    }
    Ok(())
}

fn smoke(
    cfg: &winch_config::Config,
    json: bool,
    seconds: f64,
    duty: Option<f32>,
) -> eyre::Result<()> {
    let mut parts = assemble::build_parts(cfg)?;

    for (i, ch) in cfg.channels.iter().enumerate() {
        let duty = duty.unwrap_or(ch.duty);
        parts
            .driver
            .set_speed(i, duty)
            .map_err(|e| eyre::eyre!("{e}"))
            .wrap_err_with(|| format!("setting duty for {}", ch.name))?;
        parts
            .driver
            .run(i, Direction::Forward)
            .map_err(|e| eyre::eyre!("{e}"))
            .wrap_err_with(|| format!("starting {}", ch.name))?;
    }
    std::thread::sleep(Duration::from_secs_f64(seconds.max(0.0)));
    for (i, ch) in cfg.channels.iter().enumerate() {
        parts
            .driver
            .set_speed(i, 0.0)
            .map_err(|e| eyre::eyre!("{e}"))
            .wrap_err_with(|| format!("parking {}", ch.name))?;
    }

    if json {
        let channels: Vec<_> = cfg
            .channels
            .iter()
            .zip(&parts.encoders)
            .map(|(ch, enc)| {
                serde_json::json!({ "name": ch.name, "count": enc.snapshot().count })
            })
            .collect();
        println!("{}", serde_json::json!({ "channels": channels }));
    } else {
        for (ch, enc) in cfg.channels.iter().zip(&parts.encoders) {
            println!("{}: moved to count {}", ch.name, enc.snapshot().count);
        }
    }
    Ok(())
}
