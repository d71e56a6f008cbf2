use super::args::*;
use dbprobe_core::client::HttpQueryClient;
use dbprobe_core::config::{self, RunConfig};
use dbprobe_core::engine::{RunPolicy, Runner};
use dbprobe_core::errors::ConfigError;
use dbprobe_core::evaluator::Evaluator;
use dbprobe_core::report::{self, Report};
use dbprobe_core::stats::aggregate;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const TEST_FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    init_logging(&cli.log_level, cli.log_json);

    let res = match cli.cmd {
        Command::Run(args) => cmd_run(args).await,
        Command::List(args) => cmd_list(args),
        Command::Init(args) => cmd_init(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    };

    match res {
        Err(e) => {
            let config_msg = dbprobe_core::errors::as_config_error(&e).map(|ce| ce.to_string());
            match config_msg {
                Some(msg) => {
                    eprintln!("{}", msg);
                    Ok(exit_codes::CONFIG_ERROR)
                }
                None => Err(e),
            }
        }
        ok => ok,
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_writer(std::io::stderr);

    // a second init (tests calling dispatch twice) is harmless
    let _ = if json {
        builder
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .try_init()
    } else {
        builder.try_init()
    };
}

/// File, then environment, then flags.
fn resolve_config(args: &RunArgs) -> Result<RunConfig, ConfigError> {
    let mut cfg = match &args.config {
        Some(path) => config::load_config(path)?,
        None => RunConfig::default(),
    };
    cfg.apply_env();

    if let Some(url) = &args.url {
        cfg.target_url = url.clone();
    }
    if let Some(n) = args.concurrency {
        cfg.concurrency = n;
    }
    if let Some(t) = args.timeout {
        cfg.timeout_seconds = t;
    }
    if let Some(m) = args.method {
        cfg.method = m;
    }
    if !args.groups.is_empty() {
        cfg.groups = args.groups.clone();
    }
    if let Some(dir) = &args.out_dir {
        cfg.report.out_dir = dir.clone();
    }
    if let Some(prefix) = &args.prefix {
        cfg.report.prefix = prefix.clone();
    }
    if let Some(junit) = &args.junit {
        cfg.report.junit = Some(junit.clone());
    }
    if let Some(s) = args.slow_threshold {
        cfg.report.slow_threshold_seconds = s;
    }

    cfg.validate()?;
    Ok(cfg)
}

async fn cmd_run(args: RunArgs) -> anyhow::Result<i32> {
    let cfg = resolve_config(&args)?;
    let batches = cfg.catalog().batches_for(&cfg.groups)?;

    tracing::info!(
        event = "dbprobe.cli.run",
        url = %cfg.target_url,
        method = ?cfg.method,
        batches = batches.len(),
        concurrency = cfg.concurrency
    );

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if let Some(code) = watch_interrupts(stop, tokio::signal::ctrl_c).await {
                std::process::exit(code);
            }
        });
    }

    let client = Arc::new(HttpQueryClient::new(cfg.target_url.clone(), cfg.method));
    let runner = Runner::new(
        client,
        Evaluator::new(cfg.leakage.clone()),
        RunPolicy {
            timeout: cfg.timeout(),
        },
    )
    .with_stop_flag(stop);

    let mut artifacts = runner.run_batches(&batches, cfg.concurrency).await?;
    artifacts.info.target = Some(cfg.target_url.clone());

    let opts = cfg.report.options();
    let stats = aggregate(&artifacts.results);
    let report = Report::render(stats, &artifacts.results, &opts).with_run(artifacts.info);

    if !args.no_report {
        let path = report::json::write_report(&report, &cfg.report.out_dir, &cfg.report.prefix)?;
        eprintln!("report: {}", path.display());
    }
    if let Some(junit) = &cfg.report.junit {
        report::junit::write_junit(&cfg.report.prefix, &report.results, junit)?;
        eprintln!("junit: {}", junit.display());
    }

    report::console::print_summary(&report, &opts);

    let interrupted = report.run.as_ref().is_some_and(|r| r.interrupted);
    if report.statistics.failed > 0 || interrupted {
        Ok(exit_codes::TEST_FAILED)
    } else {
        Ok(exit_codes::OK)
    }
}

/// First interrupt stops dispatch and lets in-flight statements finish.
/// A second one returns the exit code to abort with immediately.
async fn watch_interrupts<F, Fut>(stop: Arc<AtomicBool>, mut next_signal: F) -> Option<i32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    next_signal().await.ok()?;
    eprintln!("interrupt received, finishing in-flight statements (press Ctrl-C again to abort)...");
    stop.store(true, Ordering::SeqCst);

    next_signal().await.ok()?;
    eprintln!("second interrupt, aborting");
    tracing::warn!(event = "dbprobe.run.aborted");
    Some(exit_codes::TEST_FAILED)
}

fn cmd_list(args: ListArgs) -> anyhow::Result<i32> {
    let cfg = match &args.config {
        Some(path) => config::load_config(path)?,
        None => RunConfig::default(),
    };
    let catalog = cfg.catalog();

    let groups: Vec<_> = match &args.group {
        Some(key) => {
            let g = catalog.group(key).ok_or_else(|| {
                ConfigError(format!("unknown test group '{}'", key))
            })?;
            vec![g]
        }
        None => catalog.groups().iter().collect(),
    };

    if args.format == "json" {
        let out: Vec<serde_json::Value> = groups
            .iter()
            .map(|g| {
                serde_json::json!({
                    "key": g.key,
                    "title": g.title,
                    "cases": g.cases,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(exit_codes::OK);
    }

    for g in groups {
        println!("{} ({} cases): {}", g.key, g.cases.len(), g.title);
        for tc in &g.cases {
            println!(
                "  {:<40} {:<15} {}",
                tc.name,
                tc.expected.as_str(),
                report::console::preview(&tc.sql, 60)
            );
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    if args.config.exists() {
        eprintln!("note: {} already exists", args.config.display());
        return Ok(exit_codes::OK);
    }
    if let Some(parent) = args.config.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    config::write_sample_config(&args.config)?;
    eprintln!("created {}", args.config.display());
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_second_interrupt_aborts() {
        let stop = Arc::new(AtomicBool::new(false));
        let code = watch_interrupts(stop.clone(), || std::future::ready(Ok(()))).await;
        assert_eq!(code, Some(exit_codes::TEST_FAILED));
        assert!(stop.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_single_interrupt_only_stops_dispatch() {
        let stop = Arc::new(AtomicBool::new(false));
        let mut calls = 0;
        let code = watch_interrupts(stop.clone(), || {
            calls += 1;
            let res = if calls == 1 {
                Ok(())
            } else {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "handler gone"))
            };
            std::future::ready(res)
        })
        .await;
        assert_eq!(code, None);
        assert!(stop.load(Ordering::SeqCst));
    }
}
