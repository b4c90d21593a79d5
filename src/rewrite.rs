use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::dataset::{
    DataSet, DataSetType, ExternalResource, FILE_SCHEME, FileIndex, to_dataset_format, to_iso8601,
};
use crate::error::Bax2BamError;
use crate::settings::Settings;

pub const SUBREAD_SET_META_TYPE: &str = "PacBio.DataSet.SubreadSet";
pub const SUBREAD_SET_NAME_PREFIX: &str = "pacbio_dataset_subreadset-";
pub const SUBREAD_BAM_META_TYPE: &str = "PacBio.SubreadFile.SubreadBamFile";
pub const SCRAPS_BAM_META_TYPE: &str = "PacBio.SubreadFile.ScrapsBamFile";
pub const PBI_META_TYPE: &str = "PacBio.Index.PacBioIndex";
pub const PBI_SUFFIX: &str = ".pbi";

pub const REWRITE_FAILED: &str = "could not create output XML";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// empty when the working directory cannot be read
pub fn current_working_dir() -> String {
    std::env::current_dir()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct RunContext {
    pub working_dir: String,
    pub now: DateTime<Utc>,
}

impl RunContext {
    pub fn new(working_dir: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            working_dir: working_dir.into(),
            now,
        }
    }

    // relative names are joined to the working directory
    pub fn resource_uri(&self, filename: &str) -> String {
        let mut path = String::new();
        if !filename.starts_with('/') {
            path.push_str(&self.working_dir);
            if !path.is_empty() && !path.ends_with('/') {
                path.push('/');
            }
        }
        path.push_str(filename);
        format!("{FILE_SCHEME}{path}")
    }
}

pub struct DescriptorRewriter<'a> {
    context: &'a RunContext,
}

impl<'a> DescriptorRewriter<'a> {
    pub fn new(context: &'a RunContext) -> Self {
        Self { context }
    }

    pub fn rewrite(&self, settings: &Settings) -> Result<Utf8PathBuf, Vec<String>> {
        self.try_rewrite(settings).map_err(|err| {
            debug!(error = %err, "dataset XML rewrite failed");
            vec![REWRITE_FAILED.to_string()]
        })
    }

    pub fn try_rewrite(&self, settings: &Settings) -> Result<Utf8PathBuf, Bax2BamError> {
        let input = settings
            .dataset_xml_filename
            .as_deref()
            .ok_or_else(|| Bax2BamError::DatasetParse("no input dataset XML".to_string()))?;
        let mut dataset = DataSet::from_file(Utf8Path::new(input))?;
        debug!(input, dataset_type = %dataset.dataset_type(), "loaded dataset XML");

        self.apply(&mut dataset, settings);

        let output = Utf8PathBuf::from(settings.output_xml_path());
        dataset.save(&output)?;
        info!(output = %output, "wrote dataset XML");
        Ok(output)
    }

    pub fn apply(&self, dataset: &mut DataSet, settings: &Settings) {
        dataset.set_dataset_type(DataSetType::Subread);
        dataset.set_meta_type(SUBREAD_SET_META_TYPE);

        dataset.set_created_at(&to_iso8601(&self.context.now));
        dataset.set_time_stamped_name(&format!(
            "{SUBREAD_SET_NAME_PREFIX}{}",
            to_dataset_format(&self.context.now)
        ));

        let resources = dataset.external_resources_mut();
        let stale = resources
            .iter()
            .enumerate()
            .filter(|(_, resource)| resource.is_legacy_movie_file())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        for index in stale.into_iter().rev() {
            resources.remove(index);
        }

        let mut main_bam =
            self.indexed_resource(SUBREAD_BAM_META_TYPE, &settings.output_bam_filename);
        if let Some(scraps) = settings
            .scraps_bam_filename
            .as_deref()
            .filter(|name| !name.is_empty())
        {
            let scraps_bam = self.indexed_resource(SCRAPS_BAM_META_TYPE, scraps);
            main_bam.external_resources_mut().add(scraps_bam);
        }
        resources.add(main_bam);
    }

    fn indexed_resource(&self, meta_type: &str, filename: &str) -> ExternalResource {
        let uri = self.context.resource_uri(filename);
        let mut resource = ExternalResource::new(meta_type, &uri);
        resource.add_file_index(FileIndex::new(PBI_META_TYPE, &format!("{uri}{PBI_SUFFIX}")));
        resource
    }
}
