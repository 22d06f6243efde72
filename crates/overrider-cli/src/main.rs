use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, NamedSource, Result};
use overrider_common::SourceId;
use overrider_driver::{Config, Driver, Target};
use overrider_tweak::{OverridePureVirtuals, StubStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "overrider")]
#[command(author, version, about = "Generate overrides for inherited pure virtual C++ methods")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report, for every class, whether pure virtual methods are left to override
    Check {
        /// Source files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List the methods a class still has to override
    List {
        /// Source file containing the class
        file: PathBuf,

        /// Class name (qualified or simple)
        #[arg(long)]
        class: String,
    },

    /// Insert the missing overrides into a class
    Apply {
        /// Source file containing the class
        file: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        /// Write the result back instead of printing it
        #[arg(long)]
        in_place: bool,

        /// Emit bodies that fail to compile until implemented
        #[arg(long)]
        stub_bodies: bool,

        /// Indentation for generated lines
        #[arg(long)]
        indent: Option<String>,

        /// Config file (default: overrider.toml next to the input)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Class name (qualified or simple)
    #[arg(long)]
    class: Option<String>,

    /// Byte offset inside the class header
    #[arg(long)]
    offset: Option<u32>,
}

impl TargetArgs {
    fn target(self) -> Target {
        match (self.class, self.offset) {
            (Some(class), _) => Target::Class(class),
            (None, Some(offset)) => Target::Offset(offset),
            (None, None) => unreachable!("clap group requires --class or --offset"),
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_env("OVERRIDER_LOG").unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Render the frontend's non-fatal diagnostics for one file.
fn report_diagnostics(driver: &Driver, id: SourceId) -> Result<()> {
    let source = driver.source(id)?;
    for diagnostic in driver.diagnostics(id)? {
        let report = miette::Report::new(diagnostic.clone()).with_source_code(NamedSource::new(
            source.path.display().to_string(),
            source.content.clone(),
        ));
        eprintln!("{report:?}");
    }
    Ok(())
}

fn load_config(file: &Path, explicit: Option<&Path>) -> Result<Config> {
    Ok(Config::for_input(file, explicit)?)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check { files } => {
            let mut driver = Driver::default();

            for file in &files {
                let id = driver.load_file(file)?;
                report_diagnostics(&driver, id)?;

                println!("{}:", file.display());
                for report in driver.check(id)? {
                    if report.available {
                        println!("  {}: {} pure virtual method(s) to override", report.class, report.remaining);
                    } else {
                        println!("  {}: nothing to override", report.class);
                    }
                }
            }
        }

        Commands::List { file, class } => {
            let mut driver = Driver::new(load_config(&file, None)?);
            let id = driver.load_file(&file)?;
            report_diagnostics(&driver, id)?;

            for obligation in driver.obligations(id, &Target::Class(class))? {
                println!("{obligation}");
            }
        }

        Commands::Apply {
            file,
            target,
            in_place,
            stub_bodies,
            indent,
            config,
        } => {
            let mut config = load_config(&file, config.as_deref())?;
            if stub_bodies {
                config.emit.style = StubStyle::UnimplementedBody;
            }
            if let Some(indent) = indent {
                config.emit.indent = indent;
            }

            let mut driver = Driver::new(config);
            let id = driver.load_file(&file)?;
            report_diagnostics(&driver, id)?;

            let target = target.target();
            if in_place {
                let path = driver.apply_in_place(id, OverridePureVirtuals::ID, &target)?;
                eprintln!("Updated {}", path.display());
            } else {
                let edited = driver.apply(id, OverridePureVirtuals::ID, &target)?;
                std::io::stdout()
                    .write_all(edited.as_bytes())
                    .into_diagnostic()?;
            }
        }
    }

    Ok(())
}
