// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast entity scanner using SIMD-accelerated byte searching
//!
//! Scans IFC files to discover entities without full parsing.

use memchr::memchr;
use rustc_hash::FxHashMap;

/// Entity index mapping ID to byte offsets
pub type EntityIndex = FxHashMap<u32, (usize, usize)>;

/// Fast entity scanner for IFC files
///
/// Uses memchr for SIMD-accelerated scanning to quickly find entity
/// boundaries without full parsing.
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a new scanner for the given content
    pub fn new(content: &'a str) -> Self {
        // Skip header section (find DATA; line)
        let pos = content.find("DATA;").map(|p| p + 5).unwrap_or(0);

        Self { content, pos }
    }

    /// Scan to find the next entity
    ///
    /// Returns (id, type_name, start_byte, end_byte)
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let bytes = self.content.as_bytes();

        while self.pos < bytes.len() {
            let hash_pos = memchr(b'#', &bytes[self.pos..])?;
            self.pos += hash_pos;

            // Entity definitions start a line; references sit inside attribute lists
            let is_entity_start = self.pos == 0
                || bytes[self.pos - 1] == b'\n'
                || bytes[self.pos - 1] == b'\r'
                || bytes[self.pos - 1] == b';';

            if !is_entity_start {
                self.pos += 1;
                continue;
            }

            let start = self.pos;

            self.pos += 1;
            let id_start = self.pos;

            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }

            if self.pos == id_start {
                continue;
            }

            let id: u32 = self.content[id_start..self.pos].parse().ok()?;

            while self.pos < bytes.len() && (bytes[self.pos] == b' ' || bytes[self.pos] == b'\t') {
                self.pos += 1;
            }

            if self.pos >= bytes.len() || bytes[self.pos] != b'=' {
                continue;
            }
            self.pos += 1;

            while self.pos < bytes.len() && (bytes[self.pos] == b' ' || bytes[self.pos] == b'\t') {
                self.pos += 1;
            }

            let type_start = self.pos;
            while self.pos < bytes.len()
                && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }

            if self.pos == type_start {
                continue;
            }

            let type_name = &self.content[type_start..self.pos];
            let end = self.find_entity_end()?;

            return Some((id, type_name, start, end));
        }

        None
    }

    /// Find the end of an entity (semicolon), handling quoted strings
    fn find_entity_end(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\'' => {
                    // Escaped quote ''
                    if in_string && self.pos + 1 < bytes.len() && bytes[self.pos + 1] == b'\'' {
                        self.pos += 2;
                        continue;
                    }
                    in_string = !in_string;
                }
                b';' if !in_string => {
                    self.pos += 1;
                    return Some(self.pos);
                }
                _ => {}
            }
            self.pos += 1;
        }

        None
    }

    /// Build an index of all entities (ID -> byte offsets)
    pub fn build_index(content: &'a str) -> EntityIndex {
        let mut scanner = Self::new(content);
        let mut index = FxHashMap::default();

        while let Some((id, _, start, end)) = scanner.next_entity() {
            index.insert(id, (start, end));
        }

        index
    }
}

/// Parse the header section to extract metadata
pub fn parse_header(content: &str) -> HeaderInfo {
    let mut info = HeaderInfo::default();

    let header_start = content.find("HEADER;").unwrap_or(0);
    let header_end = content.find("ENDSEC;").unwrap_or(content.len());
    let header = &content[header_start..header_end.max(header_start)];

    if let Some(schema_start) = header.find("FILE_SCHEMA") {
        if let Some((schemas, _)) = header_arguments(&header[schema_start..])
            .and_then(parse_header_list)
        {
            if let Some(first) = schemas.into_iter().next() {
                info.schema_version = first;
            }
        }
    }

    if let Some(desc_start) = header.find("FILE_DESCRIPTION") {
        if let Some((descriptions, _)) = header_arguments(&header[desc_start..])
            .and_then(parse_header_list)
        {
            if !descriptions.is_empty() {
                info.file_description = Some(descriptions.join(", "));
            }
        }
    }

    // FILE_NAME(name, time_stamp, (author), (organization), preprocessor, originating_system, authorization)
    if let Some(name_start) = header.find("FILE_NAME") {
        if let Some(args) = header_arguments(&header[name_start..]) {
            let _ = parse_file_name(args, &mut info);
        }
    }

    info
}

fn header_arguments(s: &str) -> Option<&str> {
    let paren = s.find('(')?;
    Some(&s[paren + 1..])
}

fn skip_comma(s: &str) -> Option<&str> {
    s.trim_start().strip_prefix(',')
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_file_name(args: &str, info: &mut HeaderInfo) -> Option<()> {
    let (file_name, rest) = parse_header_string(args)?;
    info.file_name = non_empty(file_name);

    let (timestamp, rest) = parse_header_string(skip_comma(rest)?)?;
    info.timestamp = non_empty(timestamp);

    let (authors, rest) = parse_header_list(skip_comma(rest)?)?;
    info.author = authors.into_iter().next();

    let (organizations, rest) = parse_header_list(skip_comma(rest)?)?;
    info.organization = organizations.into_iter().next();

    let (preprocessor, rest) = parse_header_string(skip_comma(rest)?)?;
    info.preprocessor_version = non_empty(preprocessor);

    let (originating_system, _) = parse_header_string(skip_comma(rest)?)?;
    info.originating_system = non_empty(originating_system);

    Some(())
}

/// Parse a string from header ('value')
fn parse_header_string(s: &str) -> Option<(String, &str)> {
    let s = s.trim_start();
    if !s.starts_with('\'') {
        return s.strip_prefix('$').map(|rest| (String::new(), rest));
    }

    let mut end = 1;
    let bytes = s.as_bytes();
    while end < bytes.len() {
        if bytes[end] == b'\'' {
            if end + 1 < bytes.len() && bytes[end + 1] == b'\'' {
                end += 2;
                continue;
            }
            break;
        }
        end += 1;
    }

    let value = crate::tokenizer::decode_step_string(&s[1..end.min(s.len())]);
    Some((value, s.get(end + 1..).unwrap_or("")))
}

/// Parse a list from header (('value1', 'value2'))
fn parse_header_list(s: &str) -> Option<(Vec<String>, &str)> {
    let s = s.trim_start();
    let Some(mut current) = s.strip_prefix('(') else {
        return parse_header_string(s).map(|(value, rest)| {
            (non_empty(value).into_iter().collect(), rest)
        });
    };

    let mut items = Vec::new();
    loop {
        current = current.trim_start();
        if let Some(rest) = current.strip_prefix(')') {
            return Some((items, rest));
        }

        let (item, rest) = parse_header_string(current)?;
        if !item.is_empty() {
            items.push(item);
        }
        current = rest.trim_start();
        if let Some(rest) = current.strip_prefix(',') {
            current = rest;
        }
    }
}

/// Header information extracted from IFC file
#[derive(Clone, Debug, Default)]
pub struct HeaderInfo {
    pub schema_version: String,
    pub file_description: Option<String>,
    pub file_name: Option<String>,
    pub timestamp: Option<String>,
    pub author: Option<String>,
    pub organization: Option<String>,
    pub preprocessor_version: Option<String>,
    pub originating_system: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('test.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCWALL('guid',$,'Wall; with ''semicolon''',$,$,#5,#6,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_scanner_finds_entities() {
        let mut scanner = EntityScanner::new(TEST_IFC);
        let mut entities = Vec::new();

        while let Some((id, type_name, _, _)) = scanner.next_entity() {
            entities.push((id, type_name.to_string()));
        }

        assert_eq!(entities.len(), 4);
        assert_eq!(entities[0], (1, "IFCPROJECT".to_string()));
        assert_eq!(entities[3], (4, "IFCWALL".to_string()));
    }

    #[test]
    fn test_entity_end_skips_semicolons_in_strings() {
        let index = EntityScanner::build_index(TEST_IFC);
        let (start, end) = index[&4];
        let text = &TEST_IFC[start..end];
        assert!(text.starts_with("#4=IFCWALL"));
        assert!(text.ends_with("$);"));
    }

    #[test]
    fn test_parse_header() {
        let info = parse_header(TEST_IFC);
        assert_eq!(info.schema_version, "IFC2X3");
        assert_eq!(info.file_name, Some("test.ifc".to_string()));
        assert_eq!(info.timestamp, Some("2024-01-01T00:00:00".to_string()));
        assert_eq!(info.author, Some("Author".to_string()));
        assert_eq!(info.organization, Some("Org".to_string()));
        assert_eq!(info.preprocessor_version, Some("Preprocessor".to_string()));
        assert_eq!(info.originating_system, Some("App".to_string()));
        assert_eq!(
            info.file_description,
            Some("ViewDefinition [CoordinationView]".to_string())
        );
    }
}
