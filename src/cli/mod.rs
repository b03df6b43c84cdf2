//! Command-line interface for the ceilometer plotter.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

use crate::config::parse_reference_time;
use crate::core::request::{MeasurementKind, PlotRequest, TimeWindow};
use crate::processors::selection::{select_files, OrderedFiles};
use crate::visualization::render_plot;
use crate::PlotConfig;

#[derive(Parser, Debug)]
#[command(name = "ceilometer-plots")]
#[command(about = "Make plots for ncas-ceilometer-3", version)]
pub struct Cli {
    /// netCDF files with data to be plotted; today's file at minimum
    #[arg(required = true)]
    files: Vec<String>,

    /// Directory the plots are written to
    #[arg(short, long, default_value = ".")]
    output_location: PathBuf,

    /// Plot aerosol backscatter for today
    #[arg(short = 'a', long)]
    aerosol_backscatter_today: bool,

    /// Plot cloud base height for today
    #[arg(short = 'c', long)]
    cloud_base_height_today: bool,

    /// Plot aerosol backscatter for the past 24 hours
    #[arg(long, alias = "a24")]
    aerosol_backscatter_last24: bool,

    /// Plot cloud base height for the past 24 hours
    #[arg(long, alias = "c24")]
    cloud_base_height_last24: bool,

    /// Plot aerosol backscatter for the past 48 hours
    #[arg(long, alias = "a48")]
    aerosol_backscatter_last48: bool,

    /// Plot cloud base height for the past 48 hours
    #[arg(long, alias = "c48")]
    cloud_base_height_last48: bool,

    /// Logo image drawn on every plot
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Instant the last24/last48 windows end at (RFC 3339), defaults to now
    #[arg(long, value_parser = parse_reference_time)]
    reference_time: Option<DateTime<Utc>>,

    /// Path to YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Requested plots, in a fixed order.
    pub fn requested(&self) -> Vec<PlotRequest> {
        PlotRequest::all()
            .into_iter()
            .filter(|request| self.is_requested(*request))
            .collect()
    }

    fn is_requested(&self, request: PlotRequest) -> bool {
        use MeasurementKind::*;
        use TimeWindow::*;

        match (request.kind, request.window) {
            (AerosolBackscatter, Today) => self.aerosol_backscatter_today,
            (AerosolBackscatter, Last24) => self.aerosol_backscatter_last24,
            (AerosolBackscatter, Last48) => self.aerosol_backscatter_last48,
            (CloudBaseHeight, Today) => self.cloud_base_height_today,
            (CloudBaseHeight, Last24) => self.cloud_base_height_last24,
            (CloudBaseHeight, Last48) => self.cloud_base_height_last48,
        }
    }
}

/// One plot with its inputs resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPlot {
    pub request: PlotRequest,
    /// Input files, oldest first.
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Resolve inputs and output path for every requested plot.
///
/// Fails on the first request without enough files, before anything is drawn.
pub fn plan_plots(cli: &Cli, ordered: &OrderedFiles) -> Result<Vec<PlannedPlot>> {
    cli.requested()
        .into_iter()
        .map(|request| {
            let inputs = ordered.files_for(request.kind, request.window)?;
            Ok(PlannedPlot {
                request,
                inputs,
                output: request.output_path(&cli.output_location),
            })
        })
        .collect()
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            let head: String = value.chars().take(36).collect();
            format!("{}...", head)
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PlotConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PlotConfig::default()
            }
        },
        None => PlotConfig::default(),
    };

    let start = Instant::now();
    match execute(&cli, config) {
        Ok(written) => {
            if written.is_empty() {
                warn!("No plots requested");
                return;
            }
            let outputs: Vec<String> = written.iter().map(|p| p.display().to_string()).collect();
            print_summary(
                "Plotting Complete",
                &[
                    ("Input files", cli.files.len().to_string()),
                    ("Plots written", written.len().to_string()),
                    ("Output location", cli.output_location.display().to_string()),
                    ("Output files", outputs.join(", ")),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

/// Validate inputs, then make every requested plot in turn.
///
/// Returns the paths of the PNG files written.
pub fn execute(cli: &Cli, mut config: PlotConfig) -> Result<Vec<PathBuf>> {
    let ordered = select_files(&cli.files, &config.files)?;
    let plan = plan_plots(cli, &ordered)?;
    if plan.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(logo) = &cli.logo {
        config.logo.path = logo.clone();
    }

    let reference = match cli.reference_time {
        Some(reference) => reference,
        None => config
            .reference_time()
            .context("invalid reference_time in config")?
            .unwrap_or_else(Utc::now),
    };
    info!("Reference time: {}", reference.to_rfc3339());

    std::fs::create_dir_all(&cli.output_location).with_context(|| {
        format!(
            "failed to create output location {}",
            cli.output_location.display()
        )
    })?;

    let mut written = Vec::with_capacity(plan.len());
    for planned in plan {
        println!("Making {}", planned.request.label());

        let spinner = create_spinner(&format!("Rendering {}...", planned.output.display()));
        let result = render_plot(
            planned.request,
            &planned.inputs,
            reference,
            &config,
            &cli.output_location,
        );
        spinner.finish_and_clear();

        let path = result.with_context(|| format!("failed to make {}", planned.request.label()))?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::selection::SelectionError;
    use std::path::Path;

    fn aerosol(date: &str) -> String {
        format!("ncas-ceilometer-3_cao_{}_aerosol-backscatter_v1.0.nc", date)
    }

    fn cloud(date: &str) -> String {
        format!("ncas-ceilometer-3_cao_{}_cloud-base_v1.0.nc", date)
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ceilometer-plots").chain(args.iter().copied()))
            .unwrap()
    }

    fn selection_error(err: &anyhow::Error) -> &SelectionError {
        err.downcast_ref::<SelectionError>()
            .expect("expected a selection error")
    }

    #[test]
    fn test_flags() {
        let cli = parse(&["-a", "-c", "--cloud-base-height-last48", "x.nc"]);

        assert_eq!(
            cli.requested(),
            vec![
                PlotRequest::new(MeasurementKind::AerosolBackscatter, TimeWindow::Today),
                PlotRequest::new(MeasurementKind::CloudBaseHeight, TimeWindow::Today),
                PlotRequest::new(MeasurementKind::CloudBaseHeight, TimeWindow::Last48),
            ]
        );
        assert_eq!(cli.output_location, PathBuf::from("."));
    }

    #[test]
    fn test_short_window_aliases() {
        let cli = parse(&["--a24", "--c24", "--a48", "--c48", "x.nc"]);

        let windows: Vec<TimeWindow> = cli.requested().iter().map(|r| r.window).collect();
        assert_eq!(
            windows,
            vec![TimeWindow::Last24, TimeWindow::Last48, TimeWindow::Last24, TimeWindow::Last48]
        );
    }

    #[test]
    fn test_files_required() {
        assert!(Cli::try_parse_from(["ceilometer-plots", "-a"]).is_err());
    }

    #[test]
    fn test_reference_time_flag() {
        let cli = parse(&["--reference-time", "2022-02-18T17:54:48+00:00", "x.nc"]);
        assert_eq!(cli.reference_time.map(|t| t.timestamp()), Some(1_645_206_888));

        assert!(Cli::try_parse_from(["ceilometer-plots", "--reference-time", "soon", "x.nc"]).is_err());
    }

    #[test]
    fn test_plan_last24_only() {
        let today = aerosol("20220218");
        let yesterday = aerosol("20220217");
        let cli = parse(&[
            "--aerosol-backscatter-last24",
            "-o",
            "/plots",
            &today,
            &yesterday,
        ]);
        let ordered = select_files(&cli.files, &PlotConfig::default().files).unwrap();

        let plan = plan_plots(&cli, &ordered).unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan[0].output,
            Path::new("/plots").join("plot_ncas-ceilometer-3_aerosol-backscatter_last24.png")
        );
        assert_eq!(plan[0].inputs, vec![PathBuf::from(&yesterday), PathBuf::from(&today)]);
    }

    #[test]
    fn test_duplicate_dates_fail_before_opening() {
        let first = format!("/a/{}", aerosol("20220218"));
        let second = format!("/b/{}", aerosol("20220218"));
        let third = aerosol("20220217");
        let cli = parse(&["-a", &first, &second, &third]);

        let err = execute(&cli, PlotConfig::default()).unwrap_err();

        assert!(matches!(
            selection_error(&err),
            SelectionError::DuplicateDate { dates, .. } if dates == &vec!["20220218".to_string()]
        ));
    }

    #[test]
    fn test_too_many_cloud_base_files() {
        let files: Vec<String> = ["20220215", "20220216", "20220217", "20220218"]
            .iter()
            .map(|d| cloud(d))
            .collect();
        let mut args = vec!["-c"];
        args.extend(files.iter().map(String::as_str));
        let cli = parse(&args);

        let err = execute(&cli, PlotConfig::default()).unwrap_err();

        assert!(matches!(
            selection_error(&err),
            SelectionError::TooManyFiles { count: 4, .. }
        ));
    }

    #[test]
    fn test_not_enough_files() {
        let today = cloud("20220218");
        let cli = parse(&["-c", "--cloud-base-height-last48", &today]);

        let err = execute(&cli, PlotConfig::default()).unwrap_err();

        assert!(matches!(
            selection_error(&err),
            SelectionError::NotEnoughFiles {
                needed: 3,
                available: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_no_plots_requested() {
        let cli = parse(&[&aerosol("20220218")]);
        let written = execute(&cli, PlotConfig::default()).unwrap();
        assert!(written.is_empty());
    }
}
