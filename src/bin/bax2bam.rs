use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use bax2bam::converter::CommandTranscoder;
use bax2bam::domain::Mode;
use bax2bam::rewrite::{SystemClock, current_working_dir};
use bax2bam::runner::{ConversionRunner, RunReport};
use bax2bam::settings::{SettingsLoader, SettingsOverrides};

#[derive(Parser)]
#[command(name = "bax2bam")]
#[command(about = "Convert PacBio bax.h5 movies to BAM and rewrite the dataset XML")]
#[command(version, author)]
struct Cli {
    #[arg(required = true, help = "Input bax.h5 files of one movie, or a single HdfSubreadSet XML")]
    inputs: Vec<String>,

    #[arg(short = 'o', long, help = "Output filename prefix (default: movie name of the first input)")]
    output_prefix: Option<String>,

    #[arg(long, help = "Input HdfSubreadSet XML to rewrite alongside the conversion")]
    xml: Option<String>,

    #[arg(long, help = "Output dataset XML (default: <prefix>.dataset.xml)")]
    output_xml: Option<String>,

    #[arg(long, help = "Settings file (default: bax2bam.json when present)")]
    config: Option<String>,

    #[arg(long, env = "BAX2BAM_TRANSCODER", help = "Transcoder program, as a path or a name on PATH")]
    transcoder: Option<String>,

    #[arg(long, help = "Output subreads and scraps (default)")]
    subread: bool,

    #[arg(long, help = "Output HQ regions and LQ regions as scraps")]
    hqregion: bool,

    #[arg(long, help = "Output full polymerase reads")]
    polymeraseread: bool,

    #[arg(long, help = "Output CCS reads")]
    ccs: bool,

    #[arg(long, help = "Print the run report as JSON on stdout")]
    json: bool,
}

impl Cli {
    fn modes(&self) -> Vec<Mode> {
        [
            (self.hqregion, Mode::HqRegion),
            (self.polymeraseread, Mode::PolymeraseRead),
            (self.subread, Mode::Subread),
            (self.ccs, Mode::Ccs),
        ]
        .into_iter()
        .filter_map(|(selected, mode)| selected.then_some(mode))
        .collect()
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(report) => report.exit_code(),
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::from(2)
        }
    }
}

fn run() -> miette::Result<RunReport> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = SettingsOverrides {
        modes: cli.modes(),
        inputs: cli.inputs.clone(),
        output_prefix: cli.output_prefix.clone(),
        dataset_xml: cli.xml.clone(),
        output_xml: cli.output_xml.clone(),
        transcoder: cli.transcoder.clone(),
    };
    let settings = SettingsLoader::resolve(cli.config.as_deref(), overrides)?;

    let transcoder = CommandTranscoder::new(settings.transcoder.as_deref());
    let runner = ConversionRunner::new(transcoder, current_working_dir(), SystemClock);
    let report = runner.run(&settings);

    report.write_errors(&mut io::stderr()).into_diagnostic()?;
    if cli.json {
        print_json(&report).into_diagnostic()?;
    }
    Ok(report)
}

fn print_json(report: &RunReport) -> io::Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(io::Error::other)?;
    let mut stdout = io::stdout();
    stdout.write_all(json.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}
