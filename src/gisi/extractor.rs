use std::path::Path;

use chrono::{Local, NaiveDate};
use failure::Error;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::gisi::document::GisiDocument;
use crate::gisi::tag_path::TagPath;

/// This extractor populates a `GisiDocument` from source metadata XML.
///
/// Direct-read fields take the text of every element of the same name in
/// document order, so the last occurrence wins. Theme keywords are appended
/// onto the document's existing sequence; extracting twice into the same
/// document therefore duplicates them, so callers construct a fresh document
/// per source file.
#[derive(Debug, Default)]
pub struct SourceExtractor {
    tag_path: TagPath,
    xml_buffer: Vec<u8>,
}

impl SourceExtractor {
    pub fn new() -> Self {
        Self {
            tag_path: TagPath::new(),
            xml_buffer: Vec::new(),
        }
    }

    /// Populate `document` from the given source XML bytes.
    pub fn extract(&mut self, document: &mut GisiDocument, xml_bytes: &[u8]) -> Result<(), Error> {
        self.extract_with_date(document, xml_bytes, Local::now().date_naive())
    }

    /// Like `extract`, with the stamping date supplied by the caller.
    pub fn extract_with_date(
        &mut self,
        document: &mut GisiDocument,
        xml_bytes: &[u8],
        today: NaiveDate,
    ) -> Result<(), Error> {
        let mut xml_reader = Reader::from_reader(xml_bytes);
        xml_reader.trim_text(true);

        let mut raw_title = None;

        loop {
            match xml_reader.read_event(&mut self.xml_buffer)? {
                Event::Start(ref e) => self.tag_path.push(e.name()),
                Event::End(ref e) => self.tag_path.pop(e.name()),
                Event::Text(ref e) => {
                    let text = e.unescape_and_decode(&xml_reader)?;

                    match self.tag_path.current() {
                        b"title" => raw_title = Some(text),
                        b"themekey" => document.themekeys.push(text),
                        current => {
                            let element_name = String::from_utf8_lossy(current);
                            if GisiDocument::DIRECT_READS.contains(&element_name.as_ref()) {
                                document.set_field(&element_name, &text);
                            }
                        }
                    }
                }
                Event::Eof => break,
                _ => (), // ignore all other events
            }

            self.xml_buffer.clear();
        }

        self.tag_path.clear();

        document.title = Some(Self::citation_title(
            raw_title.as_deref(),
            document.source_path(),
        ));
        // publication date is re-stamped on every run
        document.pubdate = Some(today.format("%Y%m%d").to_string());
        if document.caldate.is_none() {
            document.caldate = Some(today.format("%Y").to_string());
        }

        Ok(())
    }

    /// Third dot-segment of the raw title, e.g. `SGID10.BOUNDARIES.Counties`
    /// becomes `Counties`. Falls back to the source file name.
    fn citation_title(raw_title: Option<&str>, source_path: &Path) -> String {
        if let Some(title) = raw_title {
            if let Some(segment) = title.split('.').nth(2) {
                return segment.to_string();
            }
        }

        Self::fallback_title(source_path)
    }

    /// Second-to-last dot-segment of the source file name.
    fn fallback_title(source_path: &Path) -> String {
        let file_name = source_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let segments: Vec<&str> = file_name.split('.').collect();

        if segments.len() >= 2 {
            segments[segments.len() - 2].to_string()
        } else {
            file_name
        }
    }
}
