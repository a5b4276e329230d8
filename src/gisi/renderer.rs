use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use failure::Error;
use failure::Fail;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::gisi::document::{GisiDocument, ResourceLocation};
use crate::gisi::tag_path::{local_name, TagPath};

const THEME_CONTAINER: &[u8] = b"/metadata/idinfo/keywords/theme";
const PLACE_CONTAINER: &[u8] = b"/metadata/idinfo/keywords/place";
const STDORDER_CONTAINER: &[u8] = b"/metadata/distinfo/stdorder";

const INDENT_CHAR: u8 = b' ';
const INDENT_SIZE: usize = 4;

/// This error occurs when the template lacks a container the renderer fills.
#[derive(Debug, Fail)]
#[fail(display = "Template is missing the `{}` container.", container)]
pub struct TemplateMissingContainer {
    container: String,
}

/// Produces a complete output XML document from a `GisiDocument` and the
/// fixed template skeleton.
///
/// Theme and place keywords are appended inside their containers, one
/// digform block per resource location is inserted at the front of the
/// standard-order section, and every other declared field overwrites the
/// text of all template elements of the same name. Unset fields leave the
/// template untouched.
pub struct TemplateRenderer {
    template: Vec<u8>,
}

impl TemplateRenderer {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        Ok(Self {
            template: fs::read(path)?,
        })
    }

    pub fn from_bytes(template: Vec<u8>) -> Self {
        Self { template }
    }

    /// Render `document` into pretty-printed UTF-8 XML bytes.
    pub fn render(&self, document: &GisiDocument) -> Result<Vec<u8>, Error> {
        let straight_writes = Self::straight_write_values(document);

        let mut xml_reader = Reader::from_reader(self.template.as_slice());
        xml_reader.trim_text(true);

        let mut writer = Writer::new_with_indent(Vec::new(), INDENT_CHAR, INDENT_SIZE);

        let mut tag_path = TagPath::new();
        let mut xml_buffer = Vec::new();

        let mut replaced_path: Option<Vec<u8>> = None;
        let mut seen_theme = false;
        let mut seen_place = false;
        let mut seen_stdorder = false;

        loop {
            match xml_reader.read_event(&mut xml_buffer)? {
                Event::Start(e) => {
                    tag_path.push(e.name());
                    writer.write_event(Event::Start(e))?;

                    if tag_path.as_slice() == STDORDER_CONTAINER {
                        seen_stdorder = true;
                        for resource in &document.resource_locations {
                            Self::write_digform(&mut writer, resource)?;
                        }
                    }

                    if let Some(value) = straight_writes.get(tag_path.current()) {
                        writer.write_event(Event::Text(BytesText::from_plain_str(value)))?;
                        replaced_path = Some(tag_path.as_slice().to_vec());
                    }
                }
                Event::Empty(e) => {
                    let element_name = local_name(e.name()).to_vec();

                    if let Some(value) = straight_writes.get(element_name.as_slice()) {
                        writer.write_event(Event::Start(BytesStart::owned_name(
                            element_name.clone(),
                        )))?;
                        writer.write_event(Event::Text(BytesText::from_plain_str(value)))?;
                        writer.write_event(Event::End(BytesEnd::owned(element_name)))?;
                    } else {
                        writer.write_event(Event::Empty(e))?;
                    }
                }
                Event::End(e) => {
                    match tag_path.as_slice() {
                        path if path == THEME_CONTAINER => {
                            seen_theme = true;
                            Self::write_keywords(&mut writer, "themekey", &document.themekeys)?;
                        }
                        path if path == PLACE_CONTAINER => {
                            seen_place = true;
                            Self::write_keywords(&mut writer, "placekey", &document.placekeys)?;
                        }
                        _ => {}
                    }

                    if replaced_path.as_deref() == Some(tag_path.as_slice()) {
                        replaced_path = None;
                    }

                    tag_path.pop(e.name());
                    writer.write_event(Event::End(e))?;
                }
                Event::Text(e) => {
                    if replaced_path.as_deref() != Some(tag_path.as_slice()) {
                        writer.write_event(Event::Text(e))?;
                    }
                }
                Event::Decl(e) => {
                    writer.write_event(Event::Decl(e))?;
                }
                Event::Comment(e) => {
                    writer.write_event(Event::Comment(e))?;
                }
                Event::CData(e) => {
                    writer.write_event(Event::CData(e))?;
                }
                Event::Eof => break,
                _ => (), // ignore all other events
            }

            xml_buffer.clear();
        }

        for (seen, container) in [
            (seen_theme, "theme"),
            (seen_place, "place"),
            (seen_stdorder, "stdorder"),
        ] {
            if !seen {
                return Err(TemplateMissingContainer {
                    container: container.into(),
                }
                .into());
            }
        }

        Ok(writer.into_inner())
    }

    /// Render and write atomically: the output appears either complete or
    /// not at all.
    pub fn render_to_path(&self, document: &GisiDocument, output_path: &Path) -> Result<(), Error> {
        let rendered = self.render(document)?;

        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(&rendered)?;
        temp_file.persist(output_path)?;

        Ok(())
    }

    fn straight_write_values(document: &GisiDocument) -> HashMap<Vec<u8>, String> {
        let mut values = HashMap::new();
        for &element_name in GisiDocument::STRAIGHT_WRITES {
            if let Some(value) = document.field_value(element_name) {
                values.insert(element_name.as_bytes().to_vec(), value.into_owned());
            }
        }
        values
    }

    fn write_keywords(
        writer: &mut Writer<Vec<u8>>,
        element_name: &str,
        keywords: &[String],
    ) -> Result<(), Error> {
        for keyword in keywords {
            Self::write_text_element(writer, element_name, keyword)?;
        }
        Ok(())
    }

    fn write_digform(writer: &mut Writer<Vec<u8>>, resource: &ResourceLocation) -> Result<(), Error> {
        Self::write_open(writer, "digform")?;
        Self::write_open(writer, "digtinfo")?;
        Self::write_text_element(writer, "formname", &resource.form_name)?;
        Self::write_close(writer, "digtinfo")?;
        Self::write_open(writer, "digtopt")?;
        Self::write_open(writer, "onlinopt")?;
        Self::write_open(writer, "computer")?;
        Self::write_open(writer, "networka")?;
        Self::write_text_element(writer, "networkr", &resource.network_resource)?;
        Self::write_close(writer, "networka")?;
        Self::write_close(writer, "computer")?;
        Self::write_close(writer, "onlinopt")?;
        Self::write_close(writer, "digtopt")?;
        Self::write_close(writer, "digform")?;
        Ok(())
    }

    fn write_open(writer: &mut Writer<Vec<u8>>, element_name: &str) -> Result<(), Error> {
        writer.write_event(Event::Start(BytesStart::borrowed_name(
            element_name.as_bytes(),
        )))?;
        Ok(())
    }

    fn write_close(writer: &mut Writer<Vec<u8>>, element_name: &str) -> Result<(), Error> {
        writer.write_event(Event::End(BytesEnd::borrowed(element_name.as_bytes())))?;
        Ok(())
    }

    fn write_text_element(
        writer: &mut Writer<Vec<u8>>,
        element_name: &str,
        text: &str,
    ) -> Result<(), Error> {
        Self::write_open(writer, element_name)?;
        writer.write_event(Event::Text(BytesText::from_plain_str(text)))?;
        Self::write_close(writer, element_name)?;
        Ok(())
    }
}
