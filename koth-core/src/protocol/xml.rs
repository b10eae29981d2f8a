//! Shared XML plumbing for the message codecs

use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::MessageError;

/// Attributes of one element, in document order
pub(crate) struct Attrs {
    kind: &'static str,
    values: Vec<(String, String)>,
}

impl Attrs {
    pub(crate) fn read(element: &BytesStart<'_>, kind: &'static str) -> Result<Self, MessageError> {
        let mut values = Vec::new();
        for attr in element.attributes() {
            let attr = attr.map_err(|e| malformed(kind, e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| malformed(kind, e.to_string()))?
                .into_owned();
            values.push((key, value));
        }
        Ok(Self { kind, values })
    }

    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Parse an optional attribute; present but unparseable is malformed
    pub(crate) fn parse<T: FromStr>(&self, name: &str) -> Result<Option<T>, MessageError> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| malformed(self.kind, format!("bad value for {}: {:?}", name, raw))),
        }
    }

    pub(crate) fn require<T: FromStr>(&self, name: &str) -> Result<T, MessageError> {
        self.parse(name)?
            .ok_or_else(|| malformed(self.kind, format!("missing attribute {}", name)))
    }
}

pub(crate) fn malformed(kind: &'static str, reason: impl Into<String>) -> MessageError {
    MessageError::Malformed {
        kind,
        reason: reason.into(),
    }
}

pub(crate) fn is_element(element: &BytesStart<'_>, name: &str) -> bool {
    element.name().as_ref().eq_ignore_ascii_case(name.as_bytes())
}

/// Advance to the root element and check its tag.
///
/// Anything that fails before a root element is found (plain text, broken
/// markup) is treated as "some other message", never as corruption.
pub(crate) fn open_root<'a>(
    reader: &mut Reader<&'a [u8]>,
    root_tag: &str,
    kind: &'static str,
) -> Result<BytesStart<'a>, MessageError> {
    let wrong = |found: Option<String>| MessageError::WrongMessageType {
        expected: kind,
        found,
    };
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                if element.name().as_ref() == root_tag.as_bytes() {
                    return Ok(element);
                }
                let found = String::from_utf8_lossy(element.name().as_ref()).into_owned();
                return Err(wrong(Some(found)));
            }
            Ok(Event::Eof) | Err(_) => return Err(wrong(None)),
            Ok(_) => continue,
        }
    }
}

pub(crate) fn reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader
}

/// Write a complete document with an XML declaration
pub(crate) fn write_document<F>(kind: &'static str, body: F) -> Result<String, MessageError>
where
    F: FnOnce(&mut Writer<Vec<u8>>) -> Result<(), quick_xml::Error>,
{
    let encode_err = |reason: String| MessageError::Encode { kind, reason };
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(|e| encode_err(e.to_string()))?;
    body(&mut writer).map_err(|e| encode_err(e.to_string()))?;
    String::from_utf8(writer.into_inner()).map_err(|e| encode_err(e.to_string()))
}
