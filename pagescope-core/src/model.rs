use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCount {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub h4: usize,
    pub h5: usize,
    pub h6: usize,
}

impl HeadingCount {
    pub fn from_levels(levels: [usize; 6]) -> Self {
        let [h1, h2, h3, h4, h5, h6] = levels;
        Self {
            h1,
            h2,
            h3,
            h4,
            h5,
            h6,
        }
    }

    pub fn total(&self) -> usize {
        self.h1 + self.h2 + self.h3 + self.h4 + self.h5 + self.h6
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDetails {
    pub urls: Vec<String>,
    pub count: usize,
}

impl From<Vec<String>> for LinkDetails {
    fn from(urls: Vec<String>) -> Self {
        let count = urls.len();
        Self { urls, count }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    pub internal: LinkDetails,
    pub external: LinkDetails,
    /// Subset of `external`, in probe completion order
    pub failed: LinkDetails,
}

/// Everything reported about one analyzed page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub url: String,
    pub html_version: String,
    pub page_title: String,
    pub heading_count: HeadingCount,
    pub links: Links,
    pub page_contains_login_form: bool,
    /// Hrefs that could not be classified. Not part of the JSON body.
    #[serde(skip)]
    pub dropped_links: usize,
}
