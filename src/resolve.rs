//! Identifier normalization and allele-frequency decoding.
//!
//! Some upstream exports encode a single gene name as a one-element list
//! literal, such as `["TCF7L2"]`. [`normalize_gene_name`] is the only place
//! in the crate where this quirk is handled; everything that stores or looks
//! up a gene name goes through it. Population codes are already canonical and
//! pass through [`normalize_population_code`] unchanged apart from
//! surrounding whitespace.
//!
//! The association summary file embeds a per-population allele-frequency map
//! in a text cell. The upstream producer writes it in a dict-like form that
//! may use single quotes instead of strict JSON. [`decode_allele_frequencies`]
//! tries a strict parse first and falls back to a quote-substituted retry.

use crate::error::Error;

use std::collections::BTreeMap;

//-----------------------------------------------------------------------------

/// Normalizes a gene name to its canonical form.
///
/// Strips surrounding list-literal brackets and quote characters, as well as
/// surrounding whitespace. Plain names pass through unchanged. The function
/// is idempotent: it iterates until a fixed point, so applying it to its own
/// output is a no-op.
///
/// # Examples
///
/// ```
/// use snp_base::resolve::normalize_gene_name;
///
/// assert_eq!(normalize_gene_name("[\"BRCA1\"]"), "BRCA1");
/// assert_eq!(normalize_gene_name("BRCA1"), "BRCA1");
/// ```
pub fn normalize_gene_name(raw: &str) -> &str {
    let mut name = raw.trim();
    loop {
        let stripped = name
            .trim_matches(|c| c == '[' || c == ']')
            .trim_matches(|c| c == '"' || c == '\'')
            .trim();
        if stripped == name {
            return name;
        }
        name = stripped;
    }
}

/// Normalizes a population / ancestry code.
///
/// The codes are used as canonical keys as they appear upstream; only
/// surrounding whitespace is removed.
pub fn normalize_population_code(raw: &str) -> &str {
    raw.trim()
}

//-----------------------------------------------------------------------------

/// Decodes a per-population allele-frequency map from a text cell.
///
/// Attempts a strict JSON parse first. On failure, substitutes single quotes
/// with double quotes and retries; if that also fails, returns
/// [`Error::Decode`] and the caller is expected to skip the row.
///
/// The values are not range-validated.
///
/// # Examples
///
/// ```
/// use snp_base::resolve::decode_allele_frequencies;
///
/// let map = decode_allele_frequencies("{'GBR': 0.23, 'GIH': 0.41}").unwrap();
/// assert_eq!(map.get("GBR"), Some(&0.23));
/// assert_eq!(map.get("GIH"), Some(&0.41));
/// assert!(decode_allele_frequencies("not-json").is_err());
/// ```
pub fn decode_allele_frequencies(raw: &str) -> Result<BTreeMap<String, f64>, Error> {
    let trimmed = raw.trim();
    if let Ok(frequencies) = parse_strict(trimmed) {
        return Ok(frequencies);
    }
    let relaxed = trimmed.replace('\'', "\"");
    parse_strict(&relaxed).map_err(|x| Error::Decode(x.to_string()))
}

fn parse_strict(text: &str) -> serde_json::Result<BTreeMap<String, f64>> {
    serde_json::from_str(text)
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
