use assert_matches::assert_matches;

use bax2bam::domain::{Mode, MovieFile, MovieFileKind, movie_name_of};
use bax2bam::error::Bax2BamError;

#[test]
fn parse_movie_files() {
    let bax: MovieFile = "m150819_153936_42161_c1_s1_p0.2.bax.h5".parse().unwrap();
    assert_eq!(bax.movie_name(), "m150819_153936_42161_c1_s1_p0");
    assert_eq!(bax.kind(), MovieFileKind::Bax);

    let bas: MovieFile = "/runs/m1.bas.h5".parse().unwrap();
    assert_eq!(bas.kind(), MovieFileKind::Bas);
    assert_eq!(bas.path().as_str(), "/runs/m1.bas.h5");

    let ccs: MovieFile = "m1.1.ccs.h5".parse().unwrap();
    assert_eq!(ccs.kind(), MovieFileKind::Ccs);
}

#[test]
fn parse_movie_file_invalid() {
    assert_matches!(
        "m1.1.bax.h5.bak".parse::<MovieFile>(),
        Err(Bax2BamError::InvalidMovieFile(_))
    );
    assert_matches!("/runs/".parse::<MovieFile>(), Err(Bax2BamError::InvalidMovieFile(_)));
}

#[test]
fn mode_input_acceptance() {
    assert!(Mode::Ccs.accepts(MovieFileKind::Ccs));
    assert!(Mode::Ccs.accepts(MovieFileKind::Bax));
    for mode in [Mode::HqRegion, Mode::PolymeraseRead, Mode::Subread] {
        assert!(mode.accepts(MovieFileKind::Bax));
        assert!(!mode.accepts(MovieFileKind::Ccs));
        assert!(!mode.accepts(MovieFileKind::Bas));
    }
}

#[test]
fn mode_outputs() {
    assert_eq!(Mode::Subread.output_suffix(), "subreads.bam");
    assert_eq!(Mode::Subread.scraps_suffix(), Some("scraps.bam"));
    assert_eq!(Mode::HqRegion.scraps_suffix(), Some("lqregions.bam"));
    assert_eq!(Mode::PolymeraseRead.scraps_suffix(), None);
    assert_eq!(Mode::Ccs.scraps_read_type(), None);
}

#[test]
fn mode_display_matches_settings_name() {
    for mode in Mode::ALL {
        assert_eq!(serde_json::to_string(&mode).unwrap(), format!("\"{mode}\""));
    }
}

#[test]
fn movie_name_of_paths() {
    assert_eq!(movie_name_of("/data/m1.1.bax.h5"), "m1");
    assert_eq!(movie_name_of("m1"), "m1");
}
