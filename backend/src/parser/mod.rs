//! CSV parser with encoding, preamble and delimiter auto-detection.
//!
//! Analytics exports often start with a block of `#` comment lines
//! (property name, date range, ...) before the real header row. Those
//! lines are dropped before tokenising. No analytics-specific logic here:
//! the output is a header list plus one [`RawRow`] per data line.

use csv::{ReaderBuilder, Trim};
use serde_json::Value;
use std::path::Path;

use crate::error::{ParseError, ParseResult};
use crate::models::RawRow;

/// Delimiters considered by [`detect_delimiter`], in tie-break order.
const CANDIDATE_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// A fully materialised table with parsing metadata.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Column headers, trimmed, in file order
    pub headers: Vec<String>,
    /// Data rows keyed by header
    pub records: Vec<RawRow>,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
    /// Number of `#` lines removed before the header
    pub skipped_preamble: usize,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is always reported as `utf-8`; chardet is only consulted
/// for other byte sequences, since it mislabels short UTF-8 text.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string, dropping a leading byte order mark.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Remove leading `#` lines.
///
/// Returns the remaining content and how many lines were removed. Only the
/// preamble is affected: a `#` line after the header is kept as data.
pub fn strip_preamble(content: &str) -> (&str, usize) {
    let mut rest = content;
    let mut skipped = 0;

    while rest.starts_with('#') {
        match rest.find('\n') {
            Some(idx) => rest = &rest[idx + 1..],
            None => rest = "",
        }
        skipped += 1;
    }

    (rest, skipped)
}

/// Detect the delimiter by counting occurrences in the first non-blank line.
///
/// Falls back to `,` when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &CANDIDATE_DELIMITERS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Printable form of a delimiter.
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

/// Tokenise CSV content (preamble already removed) with an explicit delimiter.
///
/// Rows whose cells are all blank are skipped. Short rows are padded with
/// empty strings and surplus cells are ignored.
///
/// # Example
/// ```ignore
/// use landing_insights::parser::parse_str;
///
/// let (headers, rows) = parse_str("Landing page,Sessions\n/a,10", ',').unwrap();
/// assert_eq!(headers, vec!["Landing page", "Sessions"]);
/// assert_eq!(rows[0]["Sessions"], "10");
/// ```
pub fn parse_str(content: &str, delimiter: char) -> ParseResult<(Vec<String>, Vec<RawRow>)> {
    if content.trim().is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::NoHeaders);
    }

    let mut records = Vec::new();

    for result in reader.records() {
        let record = result?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row = RawRow::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = record.get(i).unwrap_or("");
            row.insert(header.clone(), Value::String(cell.to_string()));
        }

        records.push(row);
    }

    Ok((headers, records))
}

/// Parse CSV bytes with auto-detection of encoding, preamble and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> ParseResult<ParsedTable> {
    if bytes.is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);

    let (body, skipped_preamble) = strip_preamble(&content);
    if body.trim().is_empty() {
        return Err(if skipped_preamble > 0 {
            ParseError::OnlyPreamble(skipped_preamble)
        } else {
            ParseError::EmptyFile
        });
    }

    let delimiter = detect_delimiter(body);
    let (headers, records) = parse_str(body, delimiter)?;

    Ok(ParsedTable {
        headers,
        records,
        encoding,
        delimiter,
        skipped_preamble,
    })
}

/// Parse a CSV file with auto-detection.
///
/// # Example
/// ```ignore
/// let table = parse_file_auto("/path/to/export.csv")?;
/// println!("Delimiter: '{}', rows: {}", table.delimiter, table.records.len());
/// ```
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> ParseResult<ParsedTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_csv() {
        let (headers, rows) = parse_str("page,sessions\n/a,30\n/b,25", ',').unwrap();

        assert_eq!(headers, vec!["page", "sessions"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["page"], "/a");
        assert_eq!(rows[1]["sessions"], "25");
    }

    #[test]
    fn test_quoted_values_keep_commas() {
        let csv = "Landing page,Sessions\n\"/search?q=a,b\",120";
        let (_, rows) = parse_str(csv, ',').unwrap();

        assert_eq!(rows[0]["Landing page"], "/search?q=a,b");
        assert_eq!(rows[0]["Sessions"], "120");
    }

    #[test]
    fn test_headers_are_trimmed() {
        let (headers, _) = parse_str(" Landing page , Sessions \n/a,1", ',').unwrap();
        assert_eq!(headers, vec!["Landing page", "Sessions"]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let (_, rows) = parse_str("a,b\n1,2\n\n3,4\n,\n", ',').unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_short_and_long_rows() {
        let (_, rows) = parse_str("a,b,c\n1\n1,2,3,4", ',').unwrap();

        assert_eq!(rows[0]["a"], "1");
        assert_eq!(rows[0]["b"], "");
        assert_eq!(rows[0]["c"], "");
        assert_eq!(rows[1]["c"], "3");
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn test_row_keys_follow_header_order() {
        let (_, rows) = parse_str("z,a,m\n1,2,3", ',').unwrap();
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str("", ','), Err(ParseError::EmptyFile)));
        assert!(matches!(parse_bytes_auto(b""), Err(ParseError::EmptyFile)));
    }

    #[test]
    fn test_strip_preamble() {
        let content = "# Property: shop\n# 2024-01-01 - 2024-01-31\nLanding page,Sessions\n/a,1";
        let (body, skipped) = strip_preamble(content);

        assert_eq!(skipped, 2);
        assert!(body.starts_with("Landing page"));
    }

    #[test]
    fn test_strip_preamble_keeps_later_hash_lines() {
        let (body, skipped) = strip_preamble("a,b\n#x,1");
        assert_eq!(skipped, 0);
        assert_eq!(body, "a,b\n#x,1");
    }

    #[test]
    fn test_preamble_header_detection() {
        let csv = "# Export\n# Generated 2024\nLanding page,Sessions,Session default channel group,Key events\n/shoes,100,Organic,20\n";
        let table = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(table.skipped_preamble, 2);
        assert_eq!(
            table.headers,
            vec!["Landing page", "Sessions", "Session default channel group", "Key events"]
        );
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0]["Landing page"], "/shoes");
    }

    #[test]
    fn test_only_preamble_error() {
        let result = parse_bytes_auto(b"# one\n# two\n");
        assert!(matches!(result, Err(ParseError::OnlyPreamble(2))));
    }

    #[test]
    fn test_crlf_preamble() {
        let csv = "# meta\r\nLanding page,Sessions\r\n/a,60\r\n";
        let table = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(table.skipped_preamble, 1);
        assert_eq!(table.headers, vec!["Landing page", "Sessions"]);
        assert_eq!(table.records[0]["Sessions"], "60");
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
        assert_eq!(detect_delimiter("\n  \na;b\n1;2"), ';');
    }

    #[test]
    fn test_format_delimiter() {
        assert_eq!(format_delimiter('\t'), "TAB");
        assert_eq!(format_delimiter(';'), ";");
    }

    #[test]
    fn test_blank_line_after_preamble_tab_separated() {
        let csv = "# GA4\n# range\n\nLanding page\tSessions\tSession default channel group\tKey events\n/shoes\t100\tOrganic\t20\n";
        let table = parse_bytes_auto(csv.as_bytes()).unwrap();

        assert_eq!(table.delimiter, '\t');
        assert_eq!(table.skipped_preamble, 2);
        assert_eq!(
            table.headers,
            vec!["Landing page", "Sessions", "Session default channel group", "Key events"]
        );
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0]["Session default channel group"], "Organic");
    }

    #[test]
    fn test_short_utf8_is_not_mangled() {
        for page in ["/über", "/é"] {
            let csv = format!("Landing page,Sessions\n{},100\n", page);
            let table = parse_bytes_auto(csv.as_bytes()).unwrap();

            assert_eq!(table.encoding, "utf-8");
            assert_eq!(table.records[0]["Landing page"], page);
        }
    }

    #[test]
    fn test_auto_parse_semicolon() {
        let table = parse_bytes_auto("page;sessions\n/a;30".as_bytes()).unwrap();

        assert_eq!(table.delimiter, ';');
        assert_eq!(table.records[0]["sessions"], "30");
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Landing page,Sessions\n/a,1");
        let table = parse_bytes_auto(&bytes).unwrap();

        assert_eq!(table.headers[0], "Landing page");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_parse_file_auto() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Landing page,Sessions\n/a,75\n").unwrap();

        let table = parse_file_auto(file.path()).unwrap();
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0]["Sessions"], "75");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = parse_file_auto("/definitely/not/here.csv");
        assert!(matches!(result, Err(ParseError::Io(_))));
    }
}
