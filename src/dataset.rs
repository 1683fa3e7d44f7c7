//! Information about the sample records held by the implementation under test.

use roxmltree::Document;

use crate::envelope::Envelope;
use crate::error::{EtsError, EtsResult};
use crate::namespaces;
use crate::xml;

/// Summary of a sample of catalogue records (csw:Record, full element set).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetInfo {
    pub identifiers: Vec<String>,
    pub titles: Vec<String>,
    /// Union of all record envelopes
    pub extent: Option<Envelope>,
}

impl DatasetInfo {
    /// Build from a `csw:GetRecordsResponse` document.
    pub fn from_get_records_response(doc: &Document<'_>) -> EtsResult<Self> {
        let root = doc.root_element();
        if !xml::is_element(root, namespaces::CSW, "GetRecordsResponse") {
            return Err(EtsError::UnexpectedContent(format!(
                "Expected csw:GetRecordsResponse but found {}",
                xml::qualified_name(root)
            )));
        }

        let mut info = DatasetInfo::default();
        for record in xml::descendants(root, namespaces::CSW, "Record") {
            if let Some(id) = xml::child_text(record, namespaces::DC, "identifier") {
                info.identifiers.push(id);
            }
            if let Some(title) = xml::child_text(record, namespaces::DC, "title") {
                info.titles.push(title);
            }
            let envelopes = record
                .children()
                .filter(|n| n.is_element())
                .filter_map(Envelope::from_element);
            for envelope in envelopes {
                match envelope {
                    Ok(envelope) => {
                        info.extent = Some(match info.extent {
                            Some(extent) => extent.union(&envelope),
                            None => envelope,
                        });
                    }
                    Err(e) => tracing::warn!("Ignoring invalid record envelope: {}", e),
                }
            }
        }

        tracing::debug!(
            "Dataset: {} records, extent {:?}",
            info.identifiers.len(),
            info.extent
        );
        Ok(info)
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    /// A search term taken from the first record title: its longest word of three or more
    /// alphanumeric characters.
    pub fn keyword(&self) -> Option<String> {
        let title = self.titles.first()?;
        title
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 3)
            .fold(None, |best: Option<&str>, word| match best {
                Some(b) if b.chars().count() >= word.chars().count() => Some(b),
                _ => Some(word),
            })
            .map(str::to_string)
    }
}
