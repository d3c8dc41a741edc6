use bmi_core::config::DataConfig;
use bmi_core::*;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bmi")]
#[command(about = "BMI calculator and measurement history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum SexArg {
    Male,
    Female,
}

impl From<SexArg> for Sex {
    fn from(arg: SexArg) -> Self {
        match arg {
            SexArg::Male => Sex::Male,
            SexArg::Female => Sex::Female,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate health metrics and record the measurement
    Calc {
        /// Height in centimeters
        #[arg(long)]
        height: String,

        /// Weight in kilograms (`,` or `.` as decimal separator)
        #[arg(long)]
        weight: String,

        /// Age in years
        #[arg(long)]
        age: String,

        #[arg(long, value_enum, default_value = "male")]
        sex: SexArg,

        /// sedentary, light, moderate, active, or the factor itself
        #[arg(long, default_value = "sedentary")]
        activity: String,

        /// Dry run - show metrics without recording
        #[arg(long)]
        dry_run: bool,
    },

    /// List recorded measurements, newest first
    History {
        /// Show at most this many records
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one recorded measurement
    Show {
        id: u64,
    },

    /// Project the BMI history onto a chart canvas
    Chart {
        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,

        /// Print the projection as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the history to CSV
    Export {
        #[arg(long)]
        out: PathBuf,
    },

    /// Manage the measurement reminder
    Remind {
        #[command(subcommand)]
        action: RemindAction,
    },

    /// Print the effective configuration
    Config {
        /// Write it to the default config path
        #[arg(long)]
        write: bool,
    },
}

#[derive(Subcommand)]
enum RemindAction {
    /// Schedule (or reschedule) the periodic reminder
    Schedule {
        /// Days between reminders (defaults to config)
        #[arg(long)]
        every: Option<u32>,
    },
    /// Show the current schedule
    Status,
    /// Print the reminder if it is due
    Check,
    /// Remove the reminder
    Cancel,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    bmi_core::logging::init_for_verbosity(cli.verbose);

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Commands::Calc {
            height,
            weight,
            age,
            sex,
            activity,
            dry_run,
        } => cmd_calc(data_dir, height, weight, age, sex.into(), &activity, dry_run),
        Commands::History { limit } => cmd_history(data_dir, limit),
        Commands::Show { id } => cmd_show(data_dir, RecordId(id)),
        Commands::Chart {
            width,
            height,
            json,
        } => cmd_chart(
            data_dir,
            width.unwrap_or(config.chart.width),
            height.unwrap_or(config.chart.height),
            json,
        ),
        Commands::Export { out } => cmd_export(data_dir, out),
        Commands::Remind { action } => cmd_remind(data_dir, action, &config),
        Commands::Config { write } => cmd_config(&config, write),
    }
}

fn open_store(data_dir: &std::path::Path) -> JsonlStore {
    JsonlStore::new(DataConfig::records_path(data_dir))
}

fn cmd_calc(
    data_dir: PathBuf,
    height: String,
    weight: String,
    age: String,
    sex: Sex,
    activity: &str,
    dry_run: bool,
) -> Result<()> {
    let activity_factor = ActivityLevel::parse(activity).map(ActivityLevel::factor);
    let form = MeasurementForm {
        height,
        weight,
        age,
        sex,
        activity_factor,
    };

    let result = if dry_run {
        compute_from_form(&form).map(|(_, metrics)| (metrics, None))
    } else {
        let mut recorder = Recorder::new(open_store(&data_dir));
        recorder
            .record(&form, chrono::Utc::now())
            .map(|r| (r.metrics, Some(r.record.id)))
    };

    let (metrics, id) = match result {
        Ok(ok) => ok,
        Err(Error::InvalidInput(errors)) => {
            eprintln!("Invalid input:");
            for error in &errors.errors {
                eprintln!("  - {}", error);
            }
            return Err(Error::InvalidInput(errors));
        }
        Err(e) => return Err(e),
    };

    display_metrics(&metrics);

    match id {
        Some(id) => println!("\n✓ Measurement #{} recorded!", id),
        None => println!("\n[Dry run - not recording measurement]"),
    }
    Ok(())
}

fn cmd_history(data_dir: PathBuf, limit: Option<usize>) -> Result<()> {
    let records = open_store(&data_dir).records()?;
    if records.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    println!("Recent records:");
    for record in records.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "  #{:<4} {}  BMI {:>5.2}  {}",
            record.id,
            record.created_at.format("%d/%m/%Y %H:%M"),
            record.metrics.bmi,
            record.metrics.classification
        );
    }
    Ok(())
}

fn cmd_show(data_dir: PathBuf, id: RecordId) -> Result<()> {
    let record = open_store(&data_dir)
        .record_by_id(id)?
        .ok_or(Error::NotFound(id))?;

    println!("Record #{}", record.id);
    println!("  Date:      {}", record.created_at.format("%d/%m/%Y %H:%M"));
    println!("  Height:    {} cm", record.input.height_cm);
    println!("  Weight:    {} kg", record.input.weight_kg);
    println!("  Age:       {}", record.input.age_years);
    println!("  Sex:       {}", record.input.sex.label());
    println!(
        "  Activity:  {} (x{})",
        record.input.activity.label(),
        record.input.activity.factor()
    );
    println!();
    display_metrics(&record.metrics);
    Ok(())
}

fn cmd_chart(data_dir: PathBuf, width: f64, height: f64, json: bool) -> Result<()> {
    let recorder = Recorder::new(open_store(&data_dir));
    let projection = match recorder.chart(width, height) {
        Ok(projection) => projection,
        Err(Error::InsufficientData { .. }) => {
            println!("Add at least 2 records to see the chart.");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&projection)?);
        return Ok(());
    }

    println!(
        "BMI history ({}x{}, BMI {:.1}..{:.1})",
        projection.canvas_width, projection.canvas_height, projection.y_min, projection.y_max
    );
    println!("Reference lines:");
    for line in &projection.threshold_lines {
        println!("  BMI {:>4.1} at y={:.1}", line.value, line.pixel_y);
    }
    println!("Points:");
    for point in &projection.points {
        println!(
            "  ({:>7.1}, {:>6.1})  BMI {:>5.2}  {}",
            point.x,
            point.y,
            point.bmi,
            point.color.hex()
        );
    }
    Ok(())
}

fn cmd_export(data_dir: PathBuf, out: PathBuf) -> Result<()> {
    let records = open_store(&data_dir).records()?;
    let count = export_csv(&records, &out)?;
    println!("✓ Exported {} records", count);
    println!("  CSV: {}", out.display());
    Ok(())
}

fn cmd_remind(data_dir: PathBuf, action: RemindAction, config: &Config) -> Result<()> {
    let path = DataConfig::reminder_path(&data_dir);
    let now = chrono::Utc::now();

    match action {
        RemindAction::Schedule { every } => {
            let interval = every.unwrap_or(config.reminder.interval_days);
            let schedule = ReminderSchedule::schedule(&path, now, interval)?;
            println!("✓ Reminder scheduled every {} days", schedule.interval_days);
            println!("  Next: {}", schedule.next_due_at.format("%d/%m/%Y %H:%M"));
        }
        RemindAction::Status => match ReminderSchedule::load(&path)? {
            Some(schedule) => {
                println!("Reminder every {} days", schedule.interval_days);
                println!("  Next: {}", schedule.next_due_at.format("%d/%m/%Y %H:%M"));
            }
            None => println!("No reminder scheduled."),
        },
        RemindAction::Check => match ReminderSchedule::check(&path, now)? {
            Some(notice) => {
                println!("{}", notice.title);
                println!("{}", notice.body);
            }
            None => println!("Nothing due."),
        },
        RemindAction::Cancel => {
            if ReminderSchedule::cancel(&path)? {
                println!("✓ Reminder cancelled");
            } else {
                println!("No reminder scheduled.");
            }
        }
    }
    Ok(())
}

fn cmd_config(config: &Config, write: bool) -> Result<()> {
    println!("{}", config.to_toml()?);
    if write {
        let path = config.save()?;
        println!("✓ Saved to {}", path.display());
    }
    Ok(())
}

fn display_metrics(metrics: &HealthMetrics) {
    println!("╭─────────────────────────────────────────╮");
    println!("│  BMI {:.2}", metrics.bmi);
    println!("│  {}", metrics.classification);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Basal metabolic rate:  {:.0} kcal/day", metrics.bmr);
    println!("  Daily calorie needs:   {:.0} kcal/day", metrics.daily_calories);
    println!("  Ideal weight:          {:.1} kg", metrics.ideal_weight_kg);
}
