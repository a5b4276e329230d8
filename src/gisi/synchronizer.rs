use std::fs;
use std::io::Write;
use std::path::Path;

use failure::Error;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;

use crate::gisi::tag_path::{local_name, TagPath};

const INDENT_CHAR: u8 = b' ';
const INDENT_SIZE: usize = 4;

/// How `update_element` treats existing element text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdateMode {
    /// Overwrite matching elements unconditionally.
    Always,
    /// Only write when every matching element is empty or the literal `None`.
    OnlyEmpty,
}

/// Replace ampersands with the word `and` so narrative text stays
/// well-formed without entity escaping.
pub fn sanitize_narrative(text: &str) -> String {
    text.replace('&', "and")
}

/// Derive the target element name from a store document's display name:
/// the suffix after the last underscore, e.g. `Lakes_abstract` names the
/// `abstract` element.
pub fn element_name_from_document_name(document_name: &str) -> &str {
    match document_name.rsplit('_').next() {
        Some(segment) => segment,
        None => document_name,
    }
}

/// Overwrite the text of every element named `element_name` in the XML file
/// at `xml_path`. Returns `false` without touching the file when no element
/// matched, or when `OnlyEmpty` found existing text worth keeping.
pub fn update_element(
    xml_path: &Path,
    element_name: &str,
    new_text: &str,
    mode: UpdateMode,
) -> Result<bool, Error> {
    let xml_bytes = fs::read(xml_path)?;

    if mode == UpdateMode::OnlyEmpty && !all_occurrences_empty(&xml_bytes, element_name)? {
        return Ok(false);
    }

    let (rewritten, changed) = rewrite_element_text(&xml_bytes, element_name, new_text)?;
    if !changed {
        return Ok(false);
    }

    let parent = match xml_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
    temp_file.write_all(&rewritten)?;
    temp_file.persist(xml_path)?;

    Ok(true)
}

/// The text of the last element named `element_name`, if any has text.
pub fn element_text(xml_bytes: &[u8], element_name: &str) -> Result<Option<String>, Error> {
    Ok(element_texts(xml_bytes, element_name)?.pop())
}

/// The texts of all elements named `element_name`, in document order.
pub fn element_texts(xml_bytes: &[u8], element_name: &str) -> Result<Vec<String>, Error> {
    let target = element_name.as_bytes();

    let mut xml_reader = Reader::from_reader(xml_bytes);
    xml_reader.trim_text(true);

    let mut tag_path = TagPath::new();
    let mut xml_buffer = Vec::new();
    let mut texts = Vec::new();

    loop {
        match xml_reader.read_event(&mut xml_buffer)? {
            Event::Start(ref e) => tag_path.push(e.name()),
            Event::End(ref e) => tag_path.pop(e.name()),
            Event::Text(ref e) => {
                if tag_path.current() == target {
                    texts.push(e.unescape_and_decode(&xml_reader)?);
                }
            }
            Event::Eof => break,
            _ => (),
        }

        xml_buffer.clear();
    }

    Ok(texts)
}

fn all_occurrences_empty(xml_bytes: &[u8], element_name: &str) -> Result<bool, Error> {
    let empty = element_texts(xml_bytes, element_name)?
        .iter()
        .all(|text| text.trim().is_empty() || text.trim() == "None");

    Ok(empty)
}

fn rewrite_element_text(
    xml_bytes: &[u8],
    element_name: &str,
    new_text: &str,
) -> Result<(Vec<u8>, bool), Error> {
    let target = element_name.as_bytes();

    let mut xml_reader = Reader::from_reader(xml_bytes);
    xml_reader.trim_text(true);

    let mut writer = Writer::new_with_indent(Vec::new(), INDENT_CHAR, INDENT_SIZE);

    let mut tag_path = TagPath::new();
    let mut xml_buffer = Vec::new();

    let mut replaced_path: Option<Vec<u8>> = None;
    let mut changed = false;

    loop {
        match xml_reader.read_event(&mut xml_buffer)? {
            Event::Start(e) => {
                tag_path.push(e.name());
                writer.write_event(Event::Start(e))?;

                if tag_path.current() == target {
                    writer.write_event(Event::Text(BytesText::from_plain_str(new_text)))?;
                    replaced_path = Some(tag_path.as_slice().to_vec());
                    changed = true;
                }
            }
            Event::Empty(e) => {
                if local_name(e.name()) == target {
                    let owned_name = local_name(e.name()).to_vec();
                    writer.write_event(Event::Start(BytesStart::owned_name(owned_name.clone())))?;
                    writer.write_event(Event::Text(BytesText::from_plain_str(new_text)))?;
                    writer.write_event(Event::End(BytesEnd::owned(owned_name)))?;
                    changed = true;
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::End(e) => {
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
            _ => (),
        }

        xml_buffer.clear();
    }

    Ok((writer.into_inner(), changed))
}

/// Recognizes the sign-off convention in review comments.
pub struct CompletionMatcher {
    pattern: Regex,
}

impl CompletionMatcher {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"(?i)#(completed|done|complete|finished|lgtm)")
                .expect("cannot fail"),
        }
    }

    pub fn is_completed(&self, comment_content: &str) -> bool {
        self.pattern.is_match(comment_content)
    }
}

impl Default for CompletionMatcher {
    fn default() -> Self {
        Self::new()
    }
}
