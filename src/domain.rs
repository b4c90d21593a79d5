use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Bax2BamError;

static MOVIE_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<movie>[^.]+)(?:\.(?P<part>\d+))?\.(?P<kind>bax|bas|ccs)\.h5$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[serde(alias = "hqregions")]
    HqRegion,
    #[serde(alias = "polymerase")]
    PolymeraseRead,
    #[serde(alias = "subreads")]
    Subread,
    Ccs,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::HqRegion, Mode::PolymeraseRead, Mode::Subread, Mode::Ccs];

    pub fn read_type(self) -> &'static str {
        match self {
            Mode::HqRegion => "HQREGION",
            Mode::PolymeraseRead => "POLYMERASE",
            Mode::Subread => "SUBREAD",
            Mode::Ccs => "CCS",
        }
    }

    pub fn scraps_read_type(self) -> Option<&'static str> {
        match self {
            Mode::HqRegion | Mode::Subread => Some("SCRAP"),
            Mode::PolymeraseRead | Mode::Ccs => None,
        }
    }

    pub fn output_suffix(self) -> &'static str {
        match self {
            Mode::HqRegion => "hqregions.bam",
            Mode::PolymeraseRead => "polymerase.bam",
            Mode::Subread => "subreads.bam",
            Mode::Ccs => "ccs.bam",
        }
    }

    pub fn scraps_suffix(self) -> Option<&'static str> {
        match self {
            Mode::HqRegion => Some("lqregions.bam"),
            Mode::Subread => Some("scraps.bam"),
            Mode::PolymeraseRead | Mode::Ccs => None,
        }
    }

    pub fn accepts(self, kind: MovieFileKind) -> bool {
        match self {
            Mode::Ccs => matches!(kind, MovieFileKind::Bax | MovieFileKind::Ccs),
            Mode::HqRegion | Mode::PolymeraseRead | Mode::Subread => kind == MovieFileKind::Bax,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::HqRegion => write!(f, "hqregion"),
            Mode::PolymeraseRead => write!(f, "polymeraseread"),
            Mode::Subread => write!(f, "subread"),
            Mode::Ccs => write!(f, "ccs"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieFileKind {
    Bax,
    Bas,
    Ccs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieFile {
    path: Utf8PathBuf,
    movie: String,
    kind: MovieFileKind,
}

impl MovieFile {
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn movie_name(&self) -> &str {
        &self.movie
    }

    pub fn kind(&self) -> MovieFileKind {
        self.kind
    }
}

impl FromStr for MovieFile {
    type Err = Bax2BamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let path = Utf8PathBuf::from(value.trim());
        let file_name = path
            .file_name()
            .ok_or_else(|| Bax2BamError::InvalidMovieFile(value.to_string()))?;
        let captures = MOVIE_FILE_RE
            .captures(file_name)
            .ok_or_else(|| Bax2BamError::InvalidMovieFile(value.to_string()))?;
        let kind = match &captures["kind"] {
            "bax" => MovieFileKind::Bax,
            "bas" => MovieFileKind::Bas,
            _ => MovieFileKind::Ccs,
        };
        let movie = captures["movie"].to_string();
        Ok(Self { path, movie, kind })
    }
}

// everything before the first `.` of the file name
pub fn movie_name_of(path: &str) -> String {
    let file_name = Utf8Path::new(path).file_name().unwrap_or(path);
    file_name
        .split_once('.')
        .map(|(movie, _)| movie)
        .unwrap_or(file_name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_bax_part() {
        let file: MovieFile = "/data/m140905_042212_s1_p0.1.bax.h5".parse().unwrap();
        assert_eq!(file.movie_name(), "m140905_042212_s1_p0");
        assert_eq!(file.kind(), MovieFileKind::Bax);
    }

    #[test]
    fn parse_rejects_bam() {
        let err = "movie.subreads.bam".parse::<MovieFile>().unwrap_err();
        assert_matches!(err, Bax2BamError::InvalidMovieFile(_));
    }

    #[test]
    fn mode_settings_aliases() {
        assert_eq!(serde_json::from_str::<Mode>(r#""subreads""#).unwrap(), Mode::Subread);
        assert_eq!(
            serde_json::from_str::<Mode>(r#""polymerase""#).unwrap(),
            Mode::PolymeraseRead
        );
        assert!(serde_json::from_str::<Mode>(r#""isoseq""#).is_err());
    }

    #[test]
    fn movie_name_without_dots() {
        assert_eq!(movie_name_of("dir/movieA"), "movieA");
        assert_eq!(movie_name_of("dir/movieA.1.bax.h5"), "movieA");
    }
}
