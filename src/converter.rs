use std::path::{Path, PathBuf};
use std::process::Command;

use camino::Utf8PathBuf;
use tracing::{debug, info};

use crate::domain::{Mode, MovieFile};
use crate::error::Bax2BamError;
use crate::settings::Settings;

pub const DEFAULT_TRANSCODER: &str = "bax2bam-transcode";

pub trait Converter {
    fn mode(&self) -> Mode;
    fn run(&mut self) -> bool;
    fn errors(&self) -> &[String];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub mode: Mode,
    pub movie_name: String,
    pub inputs: Vec<Utf8PathBuf>,
    pub read_type: &'static str,
    pub output_bam: Utf8PathBuf,
    pub scraps_read_type: Option<&'static str>,
    pub scraps_bam: Option<Utf8PathBuf>,
}

pub trait ReadTranscoder: Send + Sync {
    fn transcode(&self, job: &ConversionJob) -> Result<(), Bax2BamError>;
}

impl<T: ReadTranscoder + ?Sized> ReadTranscoder for &T {
    fn transcode(&self, job: &ConversionJob) -> Result<(), Bax2BamError> {
        (**self).transcode(job)
    }
}

struct ConverterBase<'a> {
    mode: Mode,
    settings: &'a Settings,
    transcoder: &'a dyn ReadTranscoder,
    errors: Vec<String>,
}

impl<'a> ConverterBase<'a> {
    fn new(mode: Mode, settings: &'a Settings, transcoder: &'a dyn ReadTranscoder) -> Self {
        Self {
            mode,
            settings,
            transcoder,
            errors: Vec::new(),
        }
    }

    fn run(&mut self) -> bool {
        self.errors.clear();
        let Some(job) = self.build_job() else {
            return false;
        };

        info!(mode = %self.mode, movie = %job.movie_name, output = %job.output_bam, "converting movie");
        if let Err(err) = self.transcoder.transcode(&job) {
            self.errors.push(err.to_string());
            return false;
        }

        let expected = std::iter::once(&job.output_bam).chain(job.scraps_bam.as_ref());
        for output in expected {
            if !output.as_std_path().exists() {
                self.errors
                    .push(Bax2BamError::MissingOutput(output.to_string()).to_string());
            }
        }
        self.errors.is_empty()
    }

    fn build_job(&mut self) -> Option<ConversionJob> {
        let settings = self.settings;
        if settings.input_files.is_empty() {
            self.errors.push(Bax2BamError::NoInputs.to_string());
            return None;
        }

        let mut movies: Vec<MovieFile> = Vec::new();
        for input in &settings.input_files {
            let movie = match input.parse::<MovieFile>() {
                Ok(movie) => movie,
                Err(err) => {
                    self.errors.push(err.to_string());
                    continue;
                }
            };
            if !movie.path().as_std_path().exists() {
                self.errors
                    .push(Bax2BamError::InputNotFound(input.clone()).to_string());
            }
            if !self.mode.accepts(movie.kind()) {
                self.errors.push(
                    Bax2BamError::UnsupportedInput {
                        mode: self.mode.to_string(),
                        path: input.clone(),
                    }
                    .to_string(),
                );
            }
            if let Some(first) = movies.first() {
                if first.movie_name() != movie.movie_name() {
                    self.errors.push(
                        Bax2BamError::MixedMovies(
                            first.movie_name().to_string(),
                            movie.movie_name().to_string(),
                        )
                        .to_string(),
                    );
                }
            }
            movies.push(movie);
        }

        if !self.errors.is_empty() {
            return None;
        }

        let scraps_bam = match self.mode.scraps_read_type() {
            Some(_) => settings
                .scraps_bam_filename
                .as_deref()
                .filter(|name| !name.is_empty())
                .map(Utf8PathBuf::from),
            None => None,
        };

        Some(ConversionJob {
            mode: self.mode,
            movie_name: movies[0].movie_name().to_string(),
            inputs: movies.iter().map(|movie| movie.path().to_path_buf()).collect(),
            read_type: self.mode.read_type(),
            output_bam: Utf8PathBuf::from(&settings.output_bam_filename),
            scraps_read_type: scraps_bam.as_ref().and(self.mode.scraps_read_type()),
            scraps_bam,
        })
    }
}

// LQ regions go to scraps
pub struct HqRegionConverter<'a> {
    base: ConverterBase<'a>,
}

impl<'a> HqRegionConverter<'a> {
    pub fn new(settings: &'a Settings, transcoder: &'a dyn ReadTranscoder) -> Self {
        Self {
            base: ConverterBase::new(Mode::HqRegion, settings, transcoder),
        }
    }
}

pub struct PolymeraseReadConverter<'a> {
    base: ConverterBase<'a>,
}

impl<'a> PolymeraseReadConverter<'a> {
    pub fn new(settings: &'a Settings, transcoder: &'a dyn ReadTranscoder) -> Self {
        Self {
            base: ConverterBase::new(Mode::PolymeraseRead, settings, transcoder),
        }
    }
}

// adapters and filtered regions go to scraps
pub struct SubreadConverter<'a> {
    base: ConverterBase<'a>,
}

impl<'a> SubreadConverter<'a> {
    pub fn new(settings: &'a Settings, transcoder: &'a dyn ReadTranscoder) -> Self {
        Self {
            base: ConverterBase::new(Mode::Subread, settings, transcoder),
        }
    }
}

pub struct CcsConverter<'a> {
    base: ConverterBase<'a>,
}

impl<'a> CcsConverter<'a> {
    pub fn new(settings: &'a Settings, transcoder: &'a dyn ReadTranscoder) -> Self {
        Self {
            base: ConverterBase::new(Mode::Ccs, settings, transcoder),
        }
    }
}

macro_rules! impl_converter {
    ($($converter:ident),+) => {
        $(
            impl Converter for $converter<'_> {
                fn mode(&self) -> Mode {
                    self.base.mode
                }

                fn run(&mut self) -> bool {
                    self.base.run()
                }

                fn errors(&self) -> &[String] {
                    &self.base.errors
                }
            }
        )+
    };
}

impl_converter!(
    HqRegionConverter,
    PolymeraseReadConverter,
    SubreadConverter,
    CcsConverter
);

#[derive(Debug, Clone)]
pub struct CommandTranscoder {
    program: Option<PathBuf>,
    name: String,
}

impl CommandTranscoder {
    // `program` is a path or a name looked up on PATH
    pub fn new(program: Option<&str>) -> Self {
        let name = program.unwrap_or(DEFAULT_TRANSCODER).to_string();
        let candidate = Path::new(&name);
        let program = if candidate.components().count() > 1 {
            Some(candidate.to_path_buf()).filter(|path| path.exists())
        } else {
            find_in_path(&name)
        };
        Self { program, name }
    }

    pub fn program(&self) -> Option<&Path> {
        self.program.as_deref()
    }

    fn args(job: &ConversionJob) -> Vec<String> {
        let mut args = vec![
            "--mode".to_string(),
            job.mode.to_string(),
            "--read-type".to_string(),
            job.read_type.to_string(),
            "--movie".to_string(),
            job.movie_name.clone(),
            "--output".to_string(),
            job.output_bam.to_string(),
        ];
        if let (Some(scraps), Some(read_type)) = (&job.scraps_bam, job.scraps_read_type) {
            args.push("--scraps".to_string());
            args.push(scraps.to_string());
            args.push("--scraps-read-type".to_string());
            args.push(read_type.to_string());
        }
        args.extend(job.inputs.iter().map(|input| input.to_string()));
        args
    }
}

impl ReadTranscoder for CommandTranscoder {
    fn transcode(&self, job: &ConversionJob) -> Result<(), Bax2BamError> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| Bax2BamError::MissingTool(self.name.clone()))?;
        let args = Self::args(job);
        debug!(program = %program.display(), ?args, "running transcoder");
        let output = Command::new(program)
            .args(&args)
            .output()
            .map_err(|err| Bax2BamError::Transcode(err.to_string()))?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("command failed: {}", program.display())
        } else {
            stderr
        };
        Err(Bax2BamError::Transcode(message))
    }
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(mode: Mode) -> ConversionJob {
        ConversionJob {
            mode,
            movie_name: "movieA".to_string(),
            inputs: vec![
                Utf8PathBuf::from("movieA.1.bax.h5"),
                Utf8PathBuf::from("movieA.2.bax.h5"),
            ],
            read_type: mode.read_type(),
            output_bam: Utf8PathBuf::from("movieA.subreads.bam"),
            scraps_read_type: mode.scraps_read_type(),
            scraps_bam: mode.scraps_read_type().map(|_| Utf8PathBuf::from("movieA.scraps.bam")),
        }
    }

    #[test]
    fn command_args_include_scraps_when_present() {
        let args = CommandTranscoder::args(&job(Mode::Subread));
        assert_eq!(
            args,
            vec![
                "--mode",
                "subread",
                "--read-type",
                "SUBREAD",
                "--movie",
                "movieA",
                "--output",
                "movieA.subreads.bam",
                "--scraps",
                "movieA.scraps.bam",
                "--scraps-read-type",
                "SCRAP",
                "movieA.1.bax.h5",
                "movieA.2.bax.h5",
            ]
        );
    }

    #[test]
    fn command_args_without_scraps() {
        let args = CommandTranscoder::args(&job(Mode::Ccs));
        assert!(!args.iter().any(|arg| arg == "--scraps"));
        assert_eq!(args[3], "CCS");
    }

    #[test]
    fn missing_program_is_reported() {
        let transcoder = CommandTranscoder::new(Some("/nonexistent/dir/transcode"));
        assert!(transcoder.program().is_none());
        let err = transcoder.transcode(&job(Mode::Ccs)).unwrap_err();
        assert!(matches!(err, Bax2BamError::MissingTool(name) if name == "/nonexistent/dir/transcode"));
    }
}
