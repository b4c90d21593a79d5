use std::io::{self, Write};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::info;

use crate::converter::{
    CcsConverter, Converter, HqRegionConverter, PolymeraseReadConverter, ReadTranscoder,
    SubreadConverter,
};
use crate::domain::Mode;
use crate::error::Bax2BamError;
use crate::rewrite::{Clock, DescriptorRewriter, RunContext};
use crate::settings::Settings;

// conversion errors first, then rewrite errors
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub success: bool,
    pub errors: Vec<String>,
    pub dataset_xml: Option<Utf8PathBuf>,
}

impl RunReport {
    pub fn exit_code(&self) -> ExitCode {
        if self.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }

    pub fn write_errors(&self, out: &mut dyn Write) -> io::Result<()> {
        for error in &self.errors {
            writeln!(out, "ERROR: {error}")?;
        }
        Ok(())
    }
}

pub struct ConversionRunner<T: ReadTranscoder, C: Clock> {
    transcoder: T,
    working_dir: String,
    clock: C,
}

impl<T: ReadTranscoder, C: Clock> ConversionRunner<T, C> {
    pub fn new(transcoder: T, working_dir: impl Into<String>, clock: C) -> Self {
        Self {
            transcoder,
            working_dir: working_dir.into(),
            clock,
        }
    }

    pub fn run(&self, settings: &Settings) -> RunReport {
        let Some(mut converter) = self.select_converter(settings) else {
            return RunReport {
                success: false,
                errors: vec![Bax2BamError::UnknownMode.to_string()],
                dataset_xml: None,
            };
        };

        let mut success = converter.run();
        let mut errors = converter.errors().to_vec();
        let mut dataset_xml = None;

        if success {
            if let Some(input) = settings
                .dataset_xml_filename
                .as_deref()
                .filter(|name| !name.is_empty())
            {
                info!(input, "rewriting dataset XML");
                let context = RunContext::new(self.working_dir.clone(), self.clock.now());
                match DescriptorRewriter::new(&context).rewrite(settings) {
                    Ok(path) => dataset_xml = Some(path),
                    Err(rewrite_errors) => {
                        success = false;
                        errors.extend(rewrite_errors);
                    }
                }
            }
        }

        RunReport {
            success,
            errors,
            dataset_xml,
        }
    }

    fn select_converter<'a>(&'a self, settings: &'a Settings) -> Option<Box<dyn Converter + 'a>> {
        let transcoder: &'a dyn ReadTranscoder = &self.transcoder;
        let converter: Box<dyn Converter + 'a> = match settings.mode? {
            Mode::HqRegion => Box::new(HqRegionConverter::new(settings, transcoder)),
            Mode::PolymeraseRead => Box::new(PolymeraseReadConverter::new(settings, transcoder)),
            Mode::Subread => Box::new(SubreadConverter::new(settings, transcoder)),
            Mode::Ccs => Box::new(CcsConverter::new(settings, transcoder)),
        };
        Some(converter)
    }
}
