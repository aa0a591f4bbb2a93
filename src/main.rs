use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mizkit::progress::TracingProgress;
use mizkit::{Error, Mission, Miz, MizOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// mizkit - inspect and edit mission archives
#[derive(Parser)]
#[command(name = "mizkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file with session options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep the scratch directory after the session
    #[arg(long, global = true)]
    keep_scratch: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of the mission
    Info {
        miz: PathBuf,
    },

    /// Open and save without changes
    Roundtrip {
        miz: PathBuf,

        /// Destination (default: <name>_edited.miz next to the source)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Change weather fields
    SetWeather {
        miz: PathBuf,

        #[arg(long)]
        cloud_density: Option<i64>,

        /// Degrees Celsius
        #[arg(long, allow_hyphen_values = true)]
        temperature: Option<i64>,

        /// 0 none, 1 rain, 2 thunderstorm, 3 snow, 4 snowstorm
        #[arg(long)]
        precipitations: Option<i64>,

        /// mmHg
        #[arg(long)]
        qnh: Option<i64>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Change the mission start date
    SetTime {
        miz: PathBuf,

        /// "dd/mm/YYYY HH:MM:SS"
        #[arg(long)]
        date: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .without_time()
        .init();

    let options = load_options(cli.config.as_deref(), cli.keep_scratch)?;

    match cli.command {
        Commands::Info { miz } => cmd_info(&miz, options),
        Commands::Roundtrip { miz, output } => cmd_roundtrip(&miz, options, output.as_deref()),
        Commands::SetWeather {
            miz,
            cloud_density,
            temperature,
            precipitations,
            qnh,
            output,
        } => {
            let changes = WeatherChanges {
                cloud_density,
                temperature,
                precipitations,
                qnh,
            };
            cmd_set_weather(&miz, options, &changes, output.as_deref())
        }
        Commands::SetTime { miz, date, output } => {
            cmd_set_time(&miz, options, &date, output.as_deref())
        }
    }
}

fn load_options(config: Option<&Path>, keep_scratch: bool) -> Result<MizOptions> {
    let options = match config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str::<MizOptions>(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => MizOptions::default(),
    };
    Ok(if keep_scratch {
        options.keep_scratch_dir(true)
    } else {
        options
    })
}

/// Run `f` on the decoded mission inside a logged session.
fn with_mission<T>(
    path: &Path,
    options: MizOptions,
    f: impl FnOnce(&mut Miz, Mission) -> mizkit::Result<T>,
) -> Result<T> {
    Miz::new(path, options)
        .with_progress(Box::new(TracingProgress::default()))
        .run(|miz| {
            let mission = miz
                .mission()
                .cloned()
                .ok_or(Error::Usage("archive not decoded"))?;
            f(miz, mission)
        })
        .with_context(|| format!("processing {}", path.display()))
}

fn cmd_info(path: &Path, options: MizOptions) -> Result<()> {
    let summary = with_mission(path, options, |_, mission| summarize(&mission))?;
    print!("{summary}");
    Ok(())
}

fn summarize(mission: &Mission) -> mizkit::Result<String> {
    let weather = mission.weather();
    let mut out = String::new();
    out.push_str(&format!("sortie:      {}\n", mission.sortie()?));
    out.push_str(&format!("theatre:     {}\n", mission.theatre()?));
    out.push_str(&format!("start:       {}\n", mission.start_time_as_date()?));
    out.push_str(&format!(
        "weather:     {} °C, QNH {} mmHg, clouds {}/10, precipitations {}\n",
        weather.temperature()?,
        weather.qnh()?,
        weather.cloud_density()?,
        weather.precipitations()?,
    ));
    for coalition in mission.coalitions() {
        let groups = coalition.groups()?;
        let mut units = 0;
        for group in &groups {
            units += group.size()?;
        }
        out.push_str(&format!(
            "{:<12} {} groups, {} units\n",
            format!("{}:", coalition.side()),
            groups.len(),
            units
        ));
    }
    Ok(out)
}

fn cmd_roundtrip(path: &Path, options: MizOptions, output: Option<&Path>) -> Result<()> {
    let saved = with_mission(path, options, |miz, _| miz.save(output))?;
    println!("{}", saved.display());
    Ok(())
}

struct WeatherChanges {
    cloud_density: Option<i64>,
    temperature: Option<i64>,
    precipitations: Option<i64>,
    qnh: Option<i64>,
}

fn cmd_set_weather(
    path: &Path,
    options: MizOptions,
    changes: &WeatherChanges,
    output: Option<&Path>,
) -> Result<()> {
    let saved = with_mission(path, options, |miz, mission| {
        let weather = mission.weather();
        // Precipitation is checked against the cloud and temperature values, so it goes last.
        if let Some(density) = changes.cloud_density {
            weather.set_cloud_density(density)?;
        }
        if let Some(celsius) = changes.temperature {
            weather.set_temperature(celsius)?;
        }
        if let Some(code) = changes.precipitations {
            weather.set_precipitations(code)?;
        }
        if let Some(qnh) = changes.qnh {
            weather.set_qnh(qnh)?;
        }
        miz.save(output)
    })?;
    println!("{}", saved.display());
    Ok(())
}

fn cmd_set_time(path: &Path, options: MizOptions, date: &str, output: Option<&Path>) -> Result<()> {
    let saved = with_mission(path, options, |miz, mission| {
        mission.set_start_time_as_date(date)?;
        miz.save(output)
    })?;
    println!("{}", saved.display());
    Ok(())
}
