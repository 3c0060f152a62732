//! Cytoband label helpers.

use std::cmp::Ordering;

/// Chromosome part of a band label: everything before the arm letter.
///
/// "12p13.1" -> "12", "Xq28" -> "X", "q21" -> "".
pub fn chromosome_prefix(band: &str) -> &str {
    match band.find(['p', 'q']) {
        Some(idx) => &band[..idx],
        None => band,
    }
}

/// Order band or arm labels by chromosome (1-22, X, Y, then others), then by
/// the remainder of the label. Ties fall back to plain string order.
pub fn karyotype_cmp(a: &str, b: &str) -> Ordering {
    let key = |s: &str| -> (u32, String) {
        let chrom = chromosome_prefix(s);
        let rank = match chrom {
            "X" => 23,
            "Y" => 24,
            "M" | "MT" => 25,
            n => n.parse::<u32>().unwrap_or(99),
        };
        (rank, s[chrom.len()..].to_string())
    };
    key(a).cmp(&key(b)).then_with(|| a.cmp(b))
}

/// Split a possibly multi-band label into atomic band labels.
///
/// Pieces are trimmed and empty pieces dropped. A piece written without its
/// chromosome ("1q12-q21") takes the chromosome of the first band. The
/// result can hold repeats ("1q21.1-q21.1"); callers deduplicate after
/// joining.
pub fn split_band_label(label: &str, delimiter: &str) -> Vec<String> {
    let pieces: Vec<&str> = label
        .split(delimiter)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let chrom = pieces.first().copied().map(chromosome_prefix).unwrap_or("");

    pieces
        .iter()
        .map(|p| {
            if !chrom.is_empty() && p.starts_with(['p', 'q']) {
                format!("{}{}", chrom, p)
            } else {
                p.to_string()
            }
        })
        .collect()
}
