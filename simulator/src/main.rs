use anyhow::Context;
use clap::Parser;
use drivecore::pipeline::spawn;
use generator::profile::build_drive;
use generator::replay::drive_from_log;
use generator::Drive;
use gui_bridge::bridge::{gui_bind_address, serve};
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Drive-assistant telemetry driver")]
struct Args {
    /// Play the drive offline on a simulated clock and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 10)]
    window_len: usize,
    #[arg(long, default_value_t = 0.66)]
    threshold: f32,
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// JSON weights asset for the logistic scorer
    #[arg(long)]
    model: Option<PathBuf>,
    /// Constant classifier score for dry runs without a model
    #[arg(long)]
    fixed_score: Option<f32>,
    /// Replay a recorded session log instead of generating a drive
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Record a CSV session log while the drive plays
    #[arg(long, default_value_t = false)]
    record: bool,
    /// Stream the drive in real time behind the HTTP presentation bridge
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value_t = 9000)]
    port: u16,
}

fn load_drive(args: &Args, config: &WorkflowConfig) -> anyhow::Result<Drive> {
    let drive = match &args.replay {
        Some(path) => drive_from_log(path)?,
        None => build_drive(&config.generator)?,
    };
    anyhow::ensure!(!drive.is_empty(), "drive has no location updates");
    Ok(drive)
}

fn run_offline(runner: &Runner, drive: &Drive, record: bool) -> anyhow::Result<()> {
    let result = runner.execute(drive, record)?;

    let last_verdict = result
        .final_snapshot
        .verdict
        .map(|verdict| verdict.label())
        .unwrap_or("none");
    println!(
        "Offline run -> updates {}, normal {}, abnormal {}, rows {}, last verdict {}",
        result.updates, result.normal, result.abnormal, result.rows_written, last_verdict
    );

    let report = format!(
        "updates={} normal={} abnormal={} rows={} metrics={}\n",
        result.updates,
        result.normal,
        result.abnormal,
        result.rows_written,
        serde_json::to_string(&result.metrics)?
    );
    let report_path = runner
        .config()
        .pipeline
        .output_dir
        .join("offline_summary.log");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&report_path)
        .with_context(|| format!("opening report {}", report_path.display()))?;
    file.write_all(report.as_bytes())?;
    Ok(())
}

fn run_live(runner: &Runner, drive: Drive, record: bool, port: u16) -> anyhow::Result<()> {
    let state = runner.build_state()?;
    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for the live pipeline")?;

    runtime.block_on(async move {
        let (handle, task) = spawn(state);
        tokio::spawn(serve(handle.clone(), gui_bind_address(port)));

        if record {
            handle
                .start_recording()
                .await
                .context("starting recording")?;
        }

        let feeder = handle.clone();
        tokio::spawn(async move {
            let mut previous_ms = None;
            for (index, sample) in drive.speeds.iter().enumerate() {
                if let Some(previous) = previous_ms {
                    let gap = sample.timestamp_ms.saturating_sub(previous);
                    tokio::time::sleep(Duration::from_millis(gap)).await;
                }
                previous_ms = Some(sample.timestamp_ms);

                if let Some(gyro) = drive.gyro.get(index) {
                    if feeder.gyro(*gyro).await.is_err() {
                        break;
                    }
                }
                if feeder.location(*sample).await.is_err() {
                    break;
                }
            }
            info!("drive playback finished");
        });

        println!("Presentation bridge running on port {} (Ctrl+C to stop)...", port);
        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;

        if let Err(err) = handle.stop_recording().await {
            warn!("stopping recording: {}", err);
        }
        handle.shutdown().await.ok();
        let state = task.await.context("joining pipeline task")?;
        let metrics = state.metrics();
        println!(
            "Live run -> samples {}, classifications {}, rows {}",
            metrics.samples, metrics.classifications, metrics.rows_written
        );
        Ok::<(), anyhow::Error>(())
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(
            args.window_len,
            args.threshold,
            args.interval_ms,
            args.output_dir.clone(),
        )
    };
    if args.model.is_some() {
        workflow_config.model = args.model.clone();
    }
    if args.fixed_score.is_some() {
        workflow_config.fixed_score = args.fixed_score;
    }

    let runner = Runner::new(workflow_config.clone());
    let drive = load_drive(&args, &workflow_config)?;

    if args.offline || !args.serve {
        run_offline(&runner, &drive, args.record)?;
    }
    if args.serve {
        run_live(&runner, drive, args.record, args.port)?;
    }

    Ok(())
}
