use std::sync::Mutex;

use camino::Utf8PathBuf;

use bax2bam::converter::{
    CcsConverter, ConversionJob, Converter, HqRegionConverter, PolymeraseReadConverter,
    ReadTranscoder, SubreadConverter,
};
use bax2bam::domain::Mode;
use bax2bam::error::Bax2BamError;
use bax2bam::settings::Settings;

/// Records jobs; writes outputs only when asked to.
#[derive(Default)]
struct RecordingTranscoder {
    write_outputs: bool,
    jobs: Mutex<Vec<ConversionJob>>,
}

impl RecordingTranscoder {
    fn writing() -> Self {
        Self {
            write_outputs: true,
            jobs: Mutex::new(Vec::new()),
        }
    }

    fn jobs(&self) -> Vec<ConversionJob> {
        self.jobs.lock().unwrap().clone()
    }
}

impl ReadTranscoder for RecordingTranscoder {
    fn transcode(&self, job: &ConversionJob) -> Result<(), Bax2BamError> {
        self.jobs.lock().unwrap().push(job.clone());
        if self.write_outputs {
            std::fs::write(job.output_bam.as_std_path(), b"BAM").unwrap();
            if let Some(scraps) = &job.scraps_bam {
                std::fs::write(scraps.as_std_path(), b"BAM").unwrap();
            }
        }
        Ok(())
    }
}

fn movie_dir(files: &[&str]) -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    for file in files {
        std::fs::write(dir.join(file).as_std_path(), b"HDF").unwrap();
    }
    (temp, dir)
}

fn settings(dir: &Utf8PathBuf, mode: Mode, inputs: &[&str]) -> Settings {
    let mut settings = Settings::with_outputs(Some(mode), dir.join("movieA").as_str());
    settings.input_files = inputs.iter().map(|file| dir.join(file).to_string()).collect();
    settings
}

#[test]
fn subread_job_carries_scraps() {
    let (_temp, dir) = movie_dir(&["movieA.1.bax.h5", "movieA.2.bax.h5"]);
    let settings = settings(&dir, Mode::Subread, &["movieA.1.bax.h5", "movieA.2.bax.h5"]);
    let transcoder = RecordingTranscoder::writing();

    let mut converter = SubreadConverter::new(&settings, &transcoder);
    assert_eq!(converter.mode(), Mode::Subread);
    assert!(converter.run(), "{:?}", converter.errors());

    let jobs = transcoder.jobs();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.movie_name, "movieA");
    assert_eq!(job.inputs.len(), 2);
    assert_eq!(job.read_type, "SUBREAD");
    assert_eq!(job.output_bam, dir.join("movieA.subreads.bam"));
    assert_eq!(job.scraps_bam, Some(dir.join("movieA.scraps.bam")));
    assert_eq!(job.scraps_read_type, Some("SCRAP"));
}

#[test]
fn hqregion_job_writes_lqregions_scraps() {
    let (_temp, dir) = movie_dir(&["movieA.1.bax.h5"]);
    let settings = settings(&dir, Mode::HqRegion, &["movieA.1.bax.h5"]);
    let transcoder = RecordingTranscoder::writing();

    let mut converter = HqRegionConverter::new(&settings, &transcoder);
    assert!(converter.run());
    let job = &transcoder.jobs()[0];
    assert_eq!(job.read_type, "HQREGION");
    assert_eq!(job.scraps_bam, Some(dir.join("movieA.lqregions.bam")));
}

#[test]
fn polymerase_job_has_no_scraps_even_if_configured() {
    let (_temp, dir) = movie_dir(&["movieA.1.bax.h5"]);
    let mut settings = settings(&dir, Mode::PolymeraseRead, &["movieA.1.bax.h5"]);
    settings.scraps_bam_filename = Some(dir.join("stray.bam").to_string());
    let transcoder = RecordingTranscoder::writing();

    let mut converter = PolymeraseReadConverter::new(&settings, &transcoder);
    assert!(converter.run());
    let job = &transcoder.jobs()[0];
    assert_eq!(job.read_type, "POLYMERASE");
    assert!(job.scraps_bam.is_none());
    assert!(job.scraps_read_type.is_none());
}

#[test]
fn ccs_accepts_ccs_h5() {
    let (_temp, dir) = movie_dir(&["movieA.ccs.h5"]);
    let settings = settings(&dir, Mode::Ccs, &["movieA.ccs.h5"]);
    let transcoder = RecordingTranscoder::writing();

    let mut converter = CcsConverter::new(&settings, &transcoder);
    assert!(converter.run(), "{:?}", converter.errors());
    assert_eq!(transcoder.jobs()[0].read_type, "CCS");
}

#[test]
fn subread_rejects_ccs_h5() {
    let (_temp, dir) = movie_dir(&["movieA.ccs.h5"]);
    let settings = settings(&dir, Mode::Subread, &["movieA.ccs.h5"]);
    let transcoder = RecordingTranscoder::writing();

    let mut converter = SubreadConverter::new(&settings, &transcoder);
    assert!(!converter.run());
    assert_eq!(converter.errors().len(), 1);
    assert!(converter.errors()[0].starts_with("unsupported input file for subread mode"));
    assert!(transcoder.jobs().is_empty());
}

#[test]
fn validation_collects_every_problem() {
    let (_temp, dir) = movie_dir(&["movieA.1.bax.h5"]);
    let settings = settings(
        &dir,
        Mode::Subread,
        &["movieA.1.bax.h5", "movieA.2.bax.h5", "movieB.1.bax.h5"],
    );
    let transcoder = RecordingTranscoder::writing();

    let mut converter = SubreadConverter::new(&settings, &transcoder);
    assert!(!converter.run());
    let errors = converter.errors();
    assert_eq!(errors.len(), 3);
    assert!(errors[0].starts_with("input file not found"));
    assert!(errors[1].starts_with("input file not found"));
    assert_eq!(
        errors[2],
        "input files come from different movies: movieA and movieB"
    );
}

#[test]
fn no_inputs_is_an_error() {
    let (_temp, dir) = movie_dir(&[]);
    let settings = settings(&dir, Mode::Ccs, &[]);
    let transcoder = RecordingTranscoder::writing();

    let mut converter = CcsConverter::new(&settings, &transcoder);
    assert!(!converter.run());
    assert_eq!(converter.errors().to_vec(), vec!["no input files".to_string()]);
}

#[test]
fn missing_output_after_transcode_is_reported() {
    let (_temp, dir) = movie_dir(&["movieA.1.bax.h5"]);
    let settings = settings(&dir, Mode::Subread, &["movieA.1.bax.h5"]);
    let transcoder = RecordingTranscoder::default();

    let mut converter = SubreadConverter::new(&settings, &transcoder);
    assert!(!converter.run());
    assert_eq!(converter.errors().len(), 2);
    assert!(converter.errors()[0].contains("movieA.subreads.bam"));
    assert!(converter.errors()[1].contains("movieA.scraps.bam"));
}
