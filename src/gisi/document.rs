use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::settings::MetadataSettings;

/// Currentness reference of the single calendar date.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Currentness {
    GroundCondition,
    PublicationDate,
}

impl Currentness {
    pub fn as_str(self) -> &'static str {
        match self {
            Currentness::GroundCondition => "ground condition",
            Currentness::PublicationDate => "publication date",
        }
    }
}

/// Completion state of the dataset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Progress {
    Complete,
    InWork,
    Planned,
}

impl Progress {
    pub fn as_str(self) -> &'static str {
        match self {
            Progress::Complete => "Complete",
            Progress::InWork => "In work",
            Progress::Planned => "Planned",
        }
    }
}

/// Maintenance and update frequency of the dataset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdateFrequency {
    Continually,
    Daily,
    Weekly,
    Monthly,
    Annually,
    AsNeeded,
    Irregular,
    NonePlanned,
}

impl UpdateFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateFrequency::Continually => "Continually",
            UpdateFrequency::Daily => "Daily",
            UpdateFrequency::Weekly => "Weekly",
            UpdateFrequency::Monthly => "Monthly",
            UpdateFrequency::Annually => "Annually",
            UpdateFrequency::AsNeeded => "As needed",
            UpdateFrequency::Irregular => "Irregular",
            UpdateFrequency::NonePlanned => "None planned",
        }
    }
}

/// Distribution format labels recognized by the catalog.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormName {
    DownloadableResource,
    DownloadableShapefile,
    DownloadableGdb,
    WebMapService,
    WebFeatureService,
    WebCoverageService,
    EsriRest,
    WebMapViewer,
}

impl FormName {
    pub fn label(self) -> &'static str {
        match self {
            FormName::DownloadableResource => "Downloadable Resource",
            FormName::DownloadableShapefile => "Downloadable Shapefile",
            FormName::DownloadableGdb => "Downloadable File Geodatabase",
            FormName::WebMapService => "Web Map Service (WMS)",
            FormName::WebFeatureService => "Web Feature Service (WFS)",
            FormName::WebCoverageService => "Web Coverage Service (WCS)",
            FormName::EsriRest => "ESRI REST",
            FormName::WebMapViewer => "Web Map Viewer",
        }
    }
}

/// One way of obtaining the dataset: a format label plus a network resource.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLocation {
    pub form_name: String,
    pub network_resource: String,
}

impl ResourceLocation {
    pub fn new(form_name: &str, network_resource: &str) -> Self {
        Self {
            form_name: form_name.into(),
            network_resource: network_resource.into(),
        }
    }

    /// A download entry whose link is not known yet.
    pub fn placeholder(form_name: FormName) -> Self {
        Self::new(form_name.label(), "empty")
    }
}

/// This struct stores the describable fields of one GISI metadata document.
///
/// It is a pure value object: construction fills the institutional defaults
/// from the settings, the extractor and the callers mutate fields in memory,
/// and the renderer consumes it. Field access by XML element name goes
/// through `field_value` and `set_field`.
#[derive(Debug)]
pub struct GisiDocument {
    name: String,
    source_path: PathBuf,
    // citation
    pub origin: String,
    pub pubdate: Option<String>,
    pub title: Option<String>,
    pub onlink: String,
    // descript
    pub abstract_text: Option<String>,
    pub purpose: Option<String>,
    // timeperd
    pub caldate: Option<String>,
    pub current: Option<Currentness>,
    // status
    pub progress: Progress,
    pub update: UpdateFrequency,
    // spdom
    pub westbc: Option<String>,
    pub eastbc: Option<String>,
    pub northbc: Option<String>,
    pub southbc: Option<String>,
    // keywords
    pub themekt: Option<String>,
    pub themekeys: Vec<String>,
    pub placekt: Option<String>,
    pub placekeys: Vec<String>,
    // constraints
    pub accconst: Option<String>,
    pub useconst: Option<String>,
    // ptcontact
    pub cntorg: String,
    pub cntper: Option<String>,
    pub addrtype: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal: String,
    pub cntvoice: String,
    // digform
    pub resource_locations: Vec<ResourceLocation>,
}

impl GisiDocument {
    /// Fields written verbatim into every element of the same name.
    pub const STRAIGHT_WRITES: &'static [&'static str] = &[
        "origin", "pubdate", "title", "onlink", "abstract", "purpose", "caldate", "current",
        "progress", "update", "westbc", "eastbc", "northbc", "southbc", "themekt", "placekt",
        "accconst", "useconst", "cntorg", "cntper", "addrtype", "address", "city", "state",
        "postal", "cntvoice",
    ];

    /// Fields copied verbatim, by element name, from source XML.
    pub const DIRECT_READS: &'static [&'static str] = &[
        "abstract", "purpose", "accconst", "useconst", "westbc", "eastbc", "northbc", "southbc",
        "caldate", "themekt",
    ];

    pub fn new(source_path: &Path, settings: &MetadataSettings) -> Self {
        Self {
            name: Self::derive_name(source_path),
            source_path: source_path.into(),
            origin: settings.origin.clone(),
            pubdate: None,
            title: None,
            onlink: settings.online_link.clone(),
            abstract_text: None,
            purpose: None,
            caldate: None,
            current: None,
            progress: Progress::Complete,
            update: UpdateFrequency::AsNeeded,
            westbc: None,
            eastbc: None,
            northbc: None,
            southbc: None,
            themekt: None,
            themekeys: Vec::new(),
            placekt: None,
            placekeys: settings.place_keywords.clone(),
            accconst: None,
            useconst: Some(settings.disclaimer.clone()),
            cntorg: settings.contact.organization.clone(),
            cntper: settings.contact.person.clone(),
            addrtype: settings.contact.address_type.clone(),
            address: settings.contact.address.clone(),
            city: settings.contact.city.clone(),
            state: settings.contact.state.clone(),
            postal: settings.contact.postal_code.clone(),
            cntvoice: settings.contact.voice.clone(),
            resource_locations: Vec::new(),
        }
    }

    /// The dataset name, derived once from the source file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn output_file_name(&self) -> String {
        format!("{}.xml", self.name)
    }

    fn derive_name(source_path: &Path) -> String {
        source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The value written for `element_name`, or `None` for unset fields.
    pub fn field_value(&self, element_name: &str) -> Option<Cow<'_, str>> {
        match element_name {
            "origin" => Some(self.origin.as_str().into()),
            "pubdate" => self.pubdate.as_deref().map(Cow::from),
            "title" => self.title.as_deref().map(Cow::from),
            "onlink" => Some(self.onlink.as_str().into()),
            "abstract" => self.abstract_text.as_deref().map(Cow::from),
            "purpose" => self.purpose.as_deref().map(Cow::from),
            "caldate" => self.caldate.as_deref().map(Cow::from),
            "current" => self.current.map(|current| current.as_str().into()),
            "progress" => Some(self.progress.as_str().into()),
            "update" => Some(self.update.as_str().into()),
            "westbc" => self.westbc.as_deref().map(Cow::from),
            "eastbc" => self.eastbc.as_deref().map(Cow::from),
            "northbc" => self.northbc.as_deref().map(Cow::from),
            "southbc" => self.southbc.as_deref().map(Cow::from),
            "themekt" => self.themekt.as_deref().map(Cow::from),
            "placekt" => self.placekt.as_deref().map(Cow::from),
            "accconst" => self.accconst.as_deref().map(Cow::from),
            "useconst" => self.useconst.as_deref().map(Cow::from),
            "cntorg" => Some(self.cntorg.as_str().into()),
            "cntper" => self.cntper.as_deref().map(Cow::from),
            "addrtype" => Some(self.addrtype.as_str().into()),
            "address" => Some(self.address.as_str().into()),
            "city" => Some(self.city.as_str().into()),
            "state" => Some(self.state.as_str().into()),
            "postal" => Some(self.postal.as_str().into()),
            "cntvoice" => Some(self.cntvoice.as_str().into()),
            _ => None,
        }
    }

    /// Set a direct-read field by element name.
    /// Returns `false` when the name is not a direct-read field.
    pub fn set_field(&mut self, element_name: &str, value: &str) -> bool {
        let value = value.to_string();
        match element_name {
            "abstract" => self.abstract_text = Some(value),
            "purpose" => self.purpose = Some(value),
            "accconst" => self.accconst = Some(value),
            "useconst" => self.useconst = Some(value),
            "westbc" => self.westbc = Some(value),
            "eastbc" => self.eastbc = Some(value),
            "northbc" => self.northbc = Some(value),
            "southbc" => self.southbc = Some(value),
            "caldate" => self.caldate = Some(value),
            "themekt" => self.themekt = Some(value),
            _ => return false,
        }
        true
    }
}
