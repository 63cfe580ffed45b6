use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use objsync::{ApplyReport, Ensure, ObjectSyncer, Resource, ResourceConfig, DEFAULT_HOST};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "objsync")]
#[command(about = "Keep a local file in sync with a remote object, verified by MD5", long_about = None)]
#[command(version)]
struct Args {
    /// JSON resource file (fields: container, key, local_path, always_check_md5, ensure, host, scratch_dir)
    #[arg(
        short,
        long,
        conflicts_with_all = [
            "container", "key", "local_path", "host", "always_check_md5", "scratch_dir", "ensure",
        ]
    )]
    config: Option<PathBuf>,

    /// Bucket/container holding the object
    #[arg(long)]
    container: Option<String>,

    /// Path of the object within the container
    #[arg(long)]
    key: Option<String>,

    /// Local destination path
    #[arg(long)]
    local_path: Option<PathBuf>,

    /// Object store host [default: storage.googleapis.com]
    #[arg(long)]
    host: Option<String>,

    /// Compare against the remote MD5 on every check, not only on refresh
    #[arg(long)]
    always_check_md5: bool,

    /// Directory for scratch files (must be on the same filesystem as the target)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Desired state for `apply` [default: present]
    #[arg(long, value_enum)]
    ensure: Option<Ensure>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report whether the file is absent, stale or current
    Status {
        /// Print the state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download the file unless it is already in place
    Ensure,
    /// Remove the local file
    Absent,
    /// Re-check against the store and download on mismatch
    Refresh,
    /// Converge to the configured ensure state
    Apply,
}

fn load_config(args: &Args) -> anyhow::Result<ResourceConfig> {
    let mut config: ResourceConfig = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading resource file {:?}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing resource file {:?}", path))?
        }
        None => {
            let Some(local_path) = args.local_path.clone() else {
                bail!("either --config or --local-path must be given");
            };
            ResourceConfig {
                container: args.container.clone(),
                key: args.key.clone(),
                local_path,
                always_check_md5: args.always_check_md5,
                ensure: args.ensure.unwrap_or_default(),
                host: args.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
                scratch_dir: args.scratch_dir.clone(),
            }
        }
    };

    // Removing a file never needs to reach the store.
    if matches!(args.command, Command::Absent) {
        config.ensure = Ensure::Absent;
    }

    Ok(config)
}

fn progress_bar() -> indicatif::ProgressBar {
    if !atty::is(atty::Stream::Stderr) {
        return indicatif::ProgressBar::hidden();
    }

    let pb = indicatif::ProgressBar::new(0);
    if let Ok(style) = indicatif::ProgressStyle::default_bar().template(
        "{spinner:.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} | {bytes_per_sec}, ETA {eta}",
    ) {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    info!("Local path: {:?}", config.local_path);

    let mut syncer = ObjectSyncer::new()?.with_progress(progress_bar());
    if let Some(dir) = &config.scratch_dir {
        syncer = syncer.with_scratch_dir(dir);
    }
    let resource = Resource::with_syncer(config, syncer)?;

    match args.command {
        Command::Status { json } => {
            let state = resource.query_state().await?;
            if json {
                println!("{}", serde_json::to_string(&state)?);
            } else {
                println!("{:?}", state);
            }
        }
        Command::Ensure => {
            if resource.ensure_present().await? {
                info!("✅ Downloaded {:?}", resource.target().path());
            } else {
                info!("✅ {:?} already in place", resource.target().path());
            }
        }
        Command::Absent => {
            resource.ensure_absent().await?;
        }
        Command::Refresh => {
            if resource.force_refresh().await? {
                info!("✅ Refreshed {:?}", resource.target().path());
            } else {
                info!("✅ {:?} is current", resource.target().path());
            }
        }
        Command::Apply => match resource.apply().await? {
            ApplyReport::Unchanged => info!("Nothing to do"),
            ApplyReport::Downloaded => info!("✅ Downloaded {:?}", resource.target().path()),
            ApplyReport::Removed => info!("🗑️  Removed {:?}", resource.target().path()),
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("objsync={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("objsync").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_default_to_present() {
        let args = parse(&["--container", "b", "--key", "c", "--local-path", "a", "apply"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.ensure, Ensure::Present);
        assert_eq!(config.host, DEFAULT_HOST);
    }

    #[test]
    fn test_ensure_flag_sets_absent() {
        let args = parse(&["--local-path", "a", "--ensure", "absent", "apply"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.ensure, Ensure::Absent);
        assert!(Resource::new(config).is_ok());
    }

    #[test]
    fn test_config_file_rejects_overriding_flags() {
        for flag in [
            &["--host", "h"][..],
            &["--always-check-md5"][..],
            &["--scratch-dir", "d"][..],
            &["--ensure", "absent"][..],
        ] {
            let argv: Vec<&str> = ["objsync", "--config", "r.json"]
                .into_iter()
                .chain(flag.iter().copied())
                .chain(["status"])
                .collect();
            assert!(Args::try_parse_from(argv).is_err(), "{:?} was accepted", flag);
        }
    }

    #[tokio::test]
    async fn test_absent_command_needs_no_container_or_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("victim.txt");
        std::fs::write(&path, b"blah blah").unwrap();

        let args = parse(&["--local-path", path.to_str().unwrap(), "absent"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.ensure, Ensure::Absent);

        let resource = Resource::new(config).unwrap();
        assert!(resource.ensure_absent().await.unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_absent_command_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("resource.json");
        std::fs::write(&file, r#"{"local_path": "a"}"#).unwrap();

        let args = parse(&["--config", file.to_str().unwrap(), "absent"]);
        assert_eq!(load_config(&args).unwrap().ensure, Ensure::Absent);
    }
}
