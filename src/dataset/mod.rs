pub mod xml;

use std::fmt;
use std::fs;
use std::str::FromStr;

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Bax2BamError;
use xml::{Element, Node};

pub const FILE_SCHEME: &str = "file://";
pub const BASE_PREFIX: &str = "pbbase";
pub const BASE_NAMESPACE: &str = "http://pacificbiosciences.com/PacBioBaseDataModel.xsd";

const EXTERNAL_RESOURCES: &str = "ExternalResources";
const EXTERNAL_RESOURCE: &str = "ExternalResource";
const FILE_INDICES: &str = "FileIndices";
const FILE_INDEX: &str = "FileIndex";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSetType {
    Generic,
    Alignment,
    Barcode,
    ConsensusAlignment,
    ConsensusRead,
    Contig,
    HdfSubread,
    Reference,
    Subread,
}

impl DataSetType {
    pub fn element_name(self) -> &'static str {
        match self {
            DataSetType::Generic => "DataSet",
            DataSetType::Alignment => "AlignmentSet",
            DataSetType::Barcode => "BarcodeSet",
            DataSetType::ConsensusAlignment => "ConsensusAlignmentSet",
            DataSetType::ConsensusRead => "ConsensusReadSet",
            DataSetType::Contig => "ContigSet",
            DataSetType::HdfSubread => "HdfSubreadSet",
            DataSetType::Reference => "ReferenceSet",
            DataSetType::Subread => "SubreadSet",
        }
    }
}

impl fmt::Display for DataSetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.element_name())
    }
}

impl FromStr for DataSetType {
    type Err = Bax2BamError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "DataSet" => Ok(DataSetType::Generic),
            "AlignmentSet" => Ok(DataSetType::Alignment),
            "BarcodeSet" => Ok(DataSetType::Barcode),
            "ConsensusAlignmentSet" => Ok(DataSetType::ConsensusAlignment),
            "ConsensusReadSet" => Ok(DataSetType::ConsensusRead),
            "ContigSet" => Ok(DataSetType::Contig),
            "HdfSubreadSet" => Ok(DataSetType::HdfSubread),
            "ReferenceSet" => Ok(DataSetType::Reference),
            "SubreadSet" => Ok(DataSetType::Subread),
            other => Err(Bax2BamError::UnknownDataSetType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIndex {
    element: Element,
}

impl FileIndex {
    pub fn new(meta_type: &str, resource_id: &str) -> Self {
        let mut element = Element::new(xml::qualified(Some(BASE_PREFIX), FILE_INDEX));
        element.set_attribute("UniqueId", Uuid::new_v4().to_string());
        element.set_attribute("MetaType", meta_type);
        element.set_attribute("ResourceId", resource_id);
        Self { element }
    }

    pub fn meta_type(&self) -> &str {
        self.element.attribute("MetaType").unwrap_or_default()
    }

    pub fn resource_id(&self) -> &str {
        self.element.attribute("ResourceId").unwrap_or_default()
    }
}

trait BlockItem {
    const NAME: &'static str;

    fn from_element(element: Element) -> Self;
    fn to_element(&self) -> Element;
}

impl BlockItem for FileIndex {
    const NAME: &'static str = FILE_INDEX;

    fn from_element(element: Element) -> Self {
        Self { element }
    }

    fn to_element(&self) -> Element {
        self.element.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Item,
    Other(Node),
}

// A container element such as FileIndices. Items are typed; comments, text and
// unknown children stay in `slots` at their original positions.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Block<T> {
    // name and attributes of a parsed container; None for a new one
    element: Option<Element>,
    slots: Vec<Slot>,
    items: Vec<T>,
}

impl<T> Default for Block<T> {
    fn default() -> Self {
        Self {
            element: None,
            slots: Vec::new(),
            items: Vec::new(),
        }
    }
}

impl<T: BlockItem> Block<T> {
    fn parse(mut element: Element) -> Self {
        let mut slots = Vec::with_capacity(element.children.len());
        let mut items = Vec::new();
        for node in element.children.drain(..) {
            match node {
                Node::Element(child) if child.local_name() == T::NAME => {
                    items.push(T::from_element(child));
                    slots.push(Slot::Item);
                }
                other => slots.push(Slot::Other(other)),
            }
        }
        Self {
            element: Some(element),
            slots,
            items,
        }
    }

    fn is_present(&self) -> bool {
        self.element.is_some() || !self.items.is_empty()
    }

    fn push(&mut self, item: T) {
        self.items.push(item);
        self.slots.push(Slot::Item);
    }

    fn remove(&mut self, index: usize) -> Option<T> {
        let position = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Slot::Item))
            .nth(index)
            .map(|(position, _)| position)?;
        self.slots.remove(position);
        Some(self.items.remove(index))
    }

    fn to_element(&self, name: &str, prefix: Option<&str>) -> Element {
        let mut element = self
            .element
            .clone()
            .unwrap_or_else(|| Element::new(xml::qualified(prefix, name)));
        let mut items = self.items.iter();
        for slot in &self.slots {
            match slot {
                Slot::Item => {
                    if let Some(item) = items.next() {
                        element.push_element(item.to_element());
                    }
                }
                Slot::Other(node) => element.children.push(node.clone()),
            }
        }
        element
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    FileIndices,
    Resources,
    Other(Node),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalResource {
    // name and attributes only; children live in `parts`
    element: Element,
    parts: Vec<Part>,
    file_indices: Block<FileIndex>,
    resources: ExternalResources,
}

impl ExternalResource {
    pub fn new(meta_type: &str, resource_id: &str) -> Self {
        let mut element = Element::new(xml::qualified(Some(BASE_PREFIX), EXTERNAL_RESOURCE));
        element.set_attribute("UniqueId", Uuid::new_v4().to_string());
        element.set_attribute("MetaType", meta_type);
        element.set_attribute("ResourceId", resource_id);
        Self {
            element,
            parts: Vec::new(),
            file_indices: Block::default(),
            resources: ExternalResources::default(),
        }
    }

    pub fn meta_type(&self) -> &str {
        self.element.attribute("MetaType").unwrap_or_default()
    }

    pub fn resource_id(&self) -> &str {
        self.element.attribute("ResourceId").unwrap_or_default()
    }

    pub fn is_legacy_movie_file(&self) -> bool {
        self.meta_type().to_ascii_lowercase().contains("bax")
    }

    pub fn file_path(&self) -> &str {
        let id = self.resource_id();
        id.strip_prefix(FILE_SCHEME).unwrap_or(id)
    }

    pub fn file_indices(&self) -> &[FileIndex] {
        &self.file_indices.items
    }

    pub fn add_file_index(&mut self, index: FileIndex) {
        self.file_indices.push(index);
    }

    pub fn external_resources(&self) -> &ExternalResources {
        &self.resources
    }

    pub fn external_resources_mut(&mut self) -> &mut ExternalResources {
        &mut self.resources
    }
}

impl BlockItem for ExternalResource {
    const NAME: &'static str = EXTERNAL_RESOURCE;

    fn from_element(mut element: Element) -> Self {
        let mut parts = Vec::with_capacity(element.children.len());
        let mut file_indices = Block::default();
        let mut resources = ExternalResources::default();
        for node in element.children.drain(..) {
            match node {
                Node::Element(child) if child.local_name() == FILE_INDICES => {
                    file_indices = Block::parse(child);
                    parts.push(Part::FileIndices);
                }
                Node::Element(child) if child.local_name() == EXTERNAL_RESOURCES => {
                    resources = ExternalResources::parse(child);
                    parts.push(Part::Resources);
                }
                other => parts.push(Part::Other(other)),
            }
        }
        Self {
            element,
            parts,
            file_indices,
            resources,
        }
    }

    fn to_element(&self) -> Element {
        let mut element = self.element.clone();
        let prefix = self.element.prefix();
        let indices = || self.file_indices.to_element(FILE_INDICES, prefix);
        let resources = || self.resources.to_element(prefix);
        for part in &self.parts {
            match part {
                Part::FileIndices if self.file_indices.is_present() => {
                    element.push_element(indices());
                }
                Part::Resources if self.resources.block.is_present() => {
                    element.push_element(resources());
                }
                Part::Other(node) => element.children.push(node.clone()),
                _ => {}
            }
        }
        // blocks created in memory go last, indices before nested resources
        if !self.parts.contains(&Part::FileIndices) && self.file_indices.is_present() {
            element.push_element(indices());
        }
        if !self.parts.contains(&Part::Resources) && self.resources.block.is_present() {
            element.push_element(resources());
        }
        element
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalResources {
    block: Block<ExternalResource>,
}

impl ExternalResources {
    pub fn len(&self) -> usize {
        self.block.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExternalResource> {
        self.block.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&ExternalResource> {
        self.block.items.get(index)
    }

    pub fn add(&mut self, resource: ExternalResource) {
        self.block.push(resource);
    }

    pub fn remove(&mut self, index: usize) -> Option<ExternalResource> {
        self.block.remove(index)
    }

    fn parse(element: Element) -> Self {
        Self {
            block: Block::parse(element),
        }
    }

    fn to_element(&self, prefix: Option<&str>) -> Element {
        self.block.to_element(EXTERNAL_RESOURCES, prefix)
    }
}

impl<'a> IntoIterator for &'a ExternalResources {
    type Item = &'a ExternalResource;
    type IntoIter = std::slice::Iter<'a, ExternalResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.block.items.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSet {
    dataset_type: DataSetType,
    // root element minus its ExternalResources block
    root: Element,
    resources: ExternalResources,
    resources_slot: Option<usize>,
}

impl DataSet {
    pub fn from_file(path: &Utf8Path) -> Result<Self, Bax2BamError> {
        let content = fs::read_to_string(path.as_std_path()).map_err(|err| {
            Bax2BamError::DatasetRead {
                path: path.to_string(),
                message: err.to_string(),
            }
        })?;
        Self::from_xml_str(&content)
    }

    pub fn from_xml_str(content: &str) -> Result<Self, Bax2BamError> {
        let mut root = xml::parse_document(content)?;
        let dataset_type = root.local_name().parse::<DataSetType>()?;

        let mut resources = ExternalResources::default();
        let mut resources_slot = None;
        if let Some(position) = root.children.iter().position(
            |node| matches!(node, Node::Element(child) if child.local_name() == EXTERNAL_RESOURCES),
        ) {
            if let Node::Element(element) = root.children.remove(position) {
                resources = ExternalResources::parse(element);
            }
            resources_slot = Some(position);
        }

        Ok(Self {
            dataset_type,
            root,
            resources,
            resources_slot,
        })
    }

    pub fn dataset_type(&self) -> DataSetType {
        self.dataset_type
    }

    // keeps the root's namespace prefix
    pub fn set_dataset_type(&mut self, dataset_type: DataSetType) {
        self.root.name = xml::qualified(self.root.prefix(), dataset_type.element_name());
        self.dataset_type = dataset_type;
    }

    pub fn meta_type(&self) -> &str {
        self.root.attribute("MetaType").unwrap_or_default()
    }

    pub fn set_meta_type(&mut self, meta_type: &str) {
        self.root.set_attribute("MetaType", meta_type);
    }

    pub fn created_at(&self) -> &str {
        self.root.attribute("CreatedAt").unwrap_or_default()
    }

    pub fn set_created_at(&mut self, created_at: &str) {
        self.root.set_attribute("CreatedAt", created_at);
    }

    pub fn time_stamped_name(&self) -> &str {
        self.root.attribute("TimeStampedName").unwrap_or_default()
    }

    pub fn set_time_stamped_name(&mut self, name: &str) {
        self.root.set_attribute("TimeStampedName", name);
    }

    pub fn name(&self) -> &str {
        self.root.attribute("Name").unwrap_or_default()
    }

    pub fn unique_id(&self) -> &str {
        self.root.attribute("UniqueId").unwrap_or_default()
    }

    pub fn external_resources(&self) -> &ExternalResources {
        &self.resources
    }

    pub fn external_resources_mut(&mut self) -> &mut ExternalResources {
        &mut self.resources
    }

    pub fn to_xml_string(&self) -> Result<String, Bax2BamError> {
        let mut root = self.root.clone();
        if self.resources.block.is_present() {
            let slot = self
                .resources_slot
                .unwrap_or(0)
                .min(root.children.len());
            root.children
                .insert(slot, Node::Element(self.resources.to_element(Some(BASE_PREFIX))));
        }
        let declaration = format!("xmlns:{BASE_PREFIX}");
        if root.attribute(&declaration).is_none() && root.uses_prefix(BASE_PREFIX) {
            root.set_attribute(&declaration, BASE_NAMESPACE);
        }
        xml::write_document(&root)
    }

    pub fn save(&self, path: &Utf8Path) -> Result<(), Bax2BamError> {
        let xml = self.to_xml_string()?;
        fs::write(path.as_std_path(), xml).map_err(|err| Bax2BamError::DatasetWrite {
            path: path.to_string(),
            message: err.to_string(),
        })
    }
}

pub fn to_iso8601(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn to_dataset_format(time: &DateTime<Utc>) -> String {
    time.format("%y%m%d_%H%M%S%3f").to_string()
}
