//! `.dirindex` decoding.
//!
//! The format is line oriented with `:` separated fields:
//!
//! ```text
//! version:1
//! path:Terrain/e000n40:
//! d:e001n40
//! f:e000n40.btg.gz:<checksum>:40313
//! ```
//!
//! Unknown record types are skipped so newer servers can add records.

use crate::error::ListingError;
use crate::listing::{Entry, Listing};

/// Decode a listing from `.dirindex` text.
///
/// # Arguments
/// * `text` - Content of the `.dirindex` resource
///
/// # Returns
/// The parsed listing, or the first malformed record found.
pub fn decode_listing(text: &str) -> Result<Listing, ListingError> {
    let mut listing: Listing = Listing::default();

    for (idx, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let line_no: usize = idx + 1;
        let tokens: Vec<&str> = line.split(':').collect();

        match tokens[0] {
            "version" => {
                let value: &str = field(&tokens, 1, line_no, "version", "number")?;
                let version: u32 = value
                    .trim()
                    .parse()
                    .map_err(|_| ListingError::InvalidVersion {
                        line: line_no,
                        value: value.to_string(),
                    })?;
                listing.version = Some(version);
            }
            "path" => {
                listing.declared_path = if tokens.len() > 2 {
                    Some(tokens[1].to_string())
                } else {
                    None
                };
            }
            "d" => {
                let name: &str = name_field(&tokens, line_no, "d")?;
                listing.entries.push(Entry::directory(name));
            }
            "f" => {
                let name: &str = name_field(&tokens, line_no, "f")?;
                let value: &str = field(&tokens, 3, line_no, "f", "size")?;
                let size: u64 = value
                    .trim()
                    .parse()
                    .map_err(|_| ListingError::InvalidSize {
                        line: line_no,
                        name: name.to_string(),
                        value: value.to_string(),
                    })?;
                listing.entries.push(Entry::file(name, size));
            }
            _ => {}
        }
    }

    Ok(listing)
}

/// Decode a listing from the raw bytes of a `.dirindex` resource.
///
/// # Arguments
/// * `bytes` - Response body, expected to be UTF-8
///
/// # Returns
/// The parsed listing, `InvalidUtf8` pointing at the first bad line, or the
/// first malformed record found.
pub fn decode_listing_bytes(bytes: &[u8]) -> Result<Listing, ListingError> {
    let text: &str = std::str::from_utf8(bytes).map_err(|e| {
        let valid: &[u8] = &bytes[..e.valid_up_to()];
        ListingError::InvalidUtf8 {
            line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
        }
    })?;
    decode_listing(text)
}

/// Get a required field by index.
fn field<'a>(
    tokens: &[&'a str],
    index: usize,
    line: usize,
    record: &'static str,
    field: &'static str,
) -> Result<&'a str, ListingError> {
    tokens
        .get(index)
        .copied()
        .ok_or(ListingError::MissingField {
            line,
            record,
            field,
        })
}

/// Get the name field of an entry record. Empty names are rejected.
fn name_field<'a>(
    tokens: &[&'a str],
    line: usize,
    record: &'static str,
) -> Result<&'a str, ListingError> {
    match tokens.get(1) {
        Some(name) if !name.is_empty() => Ok(*name),
        _ => Err(ListingError::MissingField {
            line,
            record,
            field: "name",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::EntryKind;

    #[test]
    fn test_decode_basic() {
        let text: &str = "version:1\nd:Sub\nf:a.txt:x:42\n";
        let listing: Listing = decode_listing(text).unwrap();

        assert_eq!(listing.version, Some(1));
        assert_eq!(listing.entries.len(), 2);
        assert_eq!(listing.entries[0], Entry::directory("Sub"));
        assert_eq!(listing.entries[1].name, "a.txt");
        assert_eq!(listing.entries[1].kind, EntryKind::File { size: 42 });
    }

    #[test]
    fn test_decode_is_deterministic() {
        let text: &str = "version:1\npath:Terrain:\nd:Sub\nf:a.txt:x:42\n";
        assert_eq!(decode_listing(text).unwrap(), decode_listing(text).unwrap());
    }

    #[test]
    fn test_decode_declared_path() {
        let with_path: Listing = decode_listing("path:Terrain/w010n40:\n").unwrap();
        assert_eq!(with_path.declared_path.as_deref(), Some("Terrain/w010n40"));

        // Two fields only is treated as no declared path
        let short: Listing = decode_listing("path:Terrain\n").unwrap();
        assert_eq!(short.declared_path, None);
    }

    #[test]
    fn test_decode_skips_unknown_and_empty_lines() {
        let text: &str = "version:1\n\nz:future:record\nt:tarball:abc:1\nd:Objects\n";
        let listing: Listing = decode_listing(text).unwrap();
        assert_eq!(listing.entries, vec![Entry::directory("Objects")]);
    }

    #[test]
    fn test_decode_without_version() {
        let listing: Listing = decode_listing("d:Models\n").unwrap();
        assert_eq!(listing.version, None);
        assert_eq!(listing.len(), 1);
    }

    #[test]
    fn test_decode_crlf_lines() {
        let listing: Listing = decode_listing("version:1\r\nf:a.stg:abc:12\r\n").unwrap();
        assert_eq!(listing.entries, vec![Entry::file("a.stg", 12)]);
    }

    #[test]
    fn test_decode_keeps_duplicates_in_order() {
        let listing: Listing = decode_listing("f:a:x:1\nf:a:x:2\n").unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing.find("a").unwrap().size(), 1);
    }

    #[test]
    fn test_decode_invalid_version() {
        let result: Result<Listing, ListingError> = decode_listing("version:one\n");
        assert_eq!(
            result,
            Err(ListingError::InvalidVersion {
                line: 1,
                value: "one".to_string()
            })
        );
    }

    #[test]
    fn test_decode_invalid_size() {
        let result: Result<Listing, ListingError> = decode_listing("version:1\nf:a.txt:x:big\n");
        let err: ListingError = result.unwrap_err();
        assert!(matches!(err, ListingError::InvalidSize { ref name, .. } if name == "a.txt"));
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_decode_negative_size_rejected() {
        let result: Result<Listing, ListingError> = decode_listing("f:a.txt:x:-5\n");
        assert!(matches!(result, Err(ListingError::InvalidSize { .. })));
    }

    #[test]
    fn test_decode_missing_size() {
        let result: Result<Listing, ListingError> = decode_listing("f:a.txt:x\n");
        assert_eq!(
            result,
            Err(ListingError::MissingField {
                line: 1,
                record: "f",
                field: "size"
            })
        );
    }

    #[test]
    fn test_decode_bytes() {
        let listing: Listing = decode_listing_bytes(b"version:1\nf:a.txt:x:3\n").unwrap();
        assert_eq!(listing.entries, vec![Entry::file("a.txt", 3)]);
    }

    #[test]
    fn test_decode_bytes_invalid_utf8() {
        let result: Result<Listing, ListingError> =
            decode_listing_bytes(b"version:1\nf:caf\xE9.txt:x:3\n");
        assert_eq!(result, Err(ListingError::InvalidUtf8 { line: 2 }));
        assert_eq!(result.unwrap_err().line(), 2);
    }

    #[test]
    fn test_decode_missing_name() {
        assert!(matches!(
            decode_listing("d\n"),
            Err(ListingError::MissingField { field: "name", .. })
        ));
        assert!(matches!(
            decode_listing("d:\n"),
            Err(ListingError::MissingField { field: "name", .. })
        ));
    }
}
