//! Extraction of the structured metadata block from a source unit.
//!
//! Every content file is expected to open with a triple-quoted block whose
//! lines follow a fixed label grammar:
//!
//! ```text
//! """
//! Author: PyCPBook Community
//! Source: Introduction to Algorithms (CLRS)
//! Description: What the snippet does. May continue over
//! several lines, including blank ones, until the next label.
//! Time: $O(\log N)$
//! Space: $O(1)$
//! Status: Stress-tested
//! """
//! ```
//!
//! Parsing is purely textual. The unit's code is never evaluated, so a file
//! that would not even lex in its own language still gets a fragment.

use crate::error::MetadataWarning;

const DELIM: &str = "\"\"\"";

/// Recognized labels in their required order. Case-sensitive, flush-left.
const LABELS: [&str; 6] = [
    "Author:",
    "Source:",
    "Description:",
    "Time:",
    "Space:",
    "Status:",
];

/// Position of `Description:`, the only label whose value may span lines.
const DESCRIPTION: usize = 2;

/// Parsed metadata fields of one source unit. Empty string means the field
/// was absent or unparsed; absence is never fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub author: String,
    pub origin: String,
    pub description: String,
    pub time_complexity: String,
    pub space_complexity: String,
    pub status: String,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.author.is_empty()
            && self.origin.is_empty()
            && self.description.is_empty()
            && self.time_complexity.is_empty()
            && self.space_complexity.is_empty()
            && self.status.is_empty()
    }

    fn set(&mut self, label: usize, value: String) {
        match label {
            0 => self.author = value,
            1 => self.origin = value,
            2 => self.description = value,
            3 => self.time_complexity = value,
            4 => self.space_complexity = value,
            _ => self.status = value,
        }
    }
}

/// Result of splitting a source unit into metadata and code.
#[derive(Debug)]
pub struct Extraction {
    pub metadata: Metadata,
    /// Everything after the block, verbatim except for blank edges.
    pub code: String,
    /// At most one problem is reported per unit; the first one found wins.
    pub warning: Option<MetadataWarning>,
}

/// Splits a source unit into its metadata block and code body.
///
/// The block must be the first non-blank thing in the file; a shebang or a
/// comment ahead of it means the unit has no block. A block that exists but
/// breaks the label grammar keeps whatever fields parsed before the problem.
pub fn extract(source: &str) -> Extraction {
    let lines: Vec<&str> = source.split('\n').collect();

    // The opener must be the first non-blank line
    let mut opener = None;
    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        opener = line.trim_start().strip_prefix(DELIM).map(|rest| (i, rest));
        break;
    }

    let Some((opener_idx, opener_rest)) = opener else {
        return Extraction {
            metadata: Metadata::default(),
            code: trim_blank_edges(source),
            warning: Some(MetadataWarning::MissingBlock),
        };
    };

    let mut block: Vec<&str> = Vec::new();
    let mut closer_idx = None;

    if let Some(pos) = opener_rest.find(DELIM) {
        // opener and closer share a line
        block.push(&opener_rest[..pos]);
        closer_idx = Some(opener_idx);
    } else {
        if !opener_rest.is_empty() {
            block.push(opener_rest);
        }
        for (i, line) in lines.iter().enumerate().skip(opener_idx + 1) {
            if let Some(pos) = line.find(DELIM) {
                if !line[..pos].is_empty() {
                    block.push(&line[..pos]);
                }
                closer_idx = Some(i);
                break;
            }
            block.push(line);
        }
    }

    let Some(closer_idx) = closer_idx else {
        return Extraction {
            metadata: Metadata::default(),
            code: trim_blank_edges(source),
            warning: Some(MetadataWarning::Malformed {
                reason: "unterminated block".to_string(),
            }),
        };
    };

    let (metadata, warning) = parse_block(&block);
    let code = trim_blank_edges(&lines[closer_idx + 1..].join("\n"));

    Extraction {
        metadata,
        code,
        warning,
    }
}

/// Parses the lines between the delimiters against the label grammar.
fn parse_block(lines: &[&str]) -> (Metadata, Option<MetadataWarning>) {
    let mut metadata = Metadata::default();
    let mut warning = None;
    let mut expected = 0;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        let Some(label) = label_of(line) else {
            note(&mut warning, format!("unexpected line '{}'", line.trim()));
            break;
        };

        if label < expected {
            note(&mut warning, format!("'{}' out of order", LABELS[label]));
            break;
        }
        if label > expected {
            // later label than expected: the skipped ones are missing
            note(&mut warning, missing_reason(expected, label));
        }

        if label == DESCRIPTION {
            let mut parts = vec![line[LABELS[label].len()..].trim_start()];
            i += 1;
            while i < lines.len() && label_of(lines[i]).is_none() {
                parts.push(lines[i]);
                i += 1;
            }
            metadata.description = parts.join("\n").trim_end().to_string();
        } else {
            let value = line[LABELS[label].len()..].trim();
            metadata.set(label, value.to_string());
            i += 1;
        }
        expected = label + 1;
    }

    if expected < LABELS.len() {
        note(&mut warning, missing_reason(expected, LABELS.len()));
    }

    (metadata, warning)
}

fn label_of(line: &str) -> Option<usize> {
    LABELS.iter().position(|label| line.starts_with(label))
}

fn note(warning: &mut Option<MetadataWarning>, reason: String) {
    if warning.is_none() {
        *warning = Some(MetadataWarning::Malformed { reason });
    }
}

fn missing_reason(from: usize, to: usize) -> String {
    let names: Vec<&str> = LABELS[from..to]
        .iter()
        .map(|label| label.trim_end_matches(':'))
        .collect();
    if names.len() == 1 {
        format!("missing '{}' field", names[0])
    } else {
        format!("missing fields: {}", names.join(", "))
    }
}

/// Drops blank lines at both edges, leaving the interior untouched.
fn trim_blank_edges(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let Some(start) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let end = lines.iter().rposition(|l| !l.trim().is_empty()).unwrap();
    lines[start..=end].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#""""
Author: PyCPBook Community
Source: Introduction to Algorithms (CLRS)
Description: Implements the classic binary search algorithm to find the index
of a target value within a sorted array.

The search space is the inclusive range `[low, high]`:
- If `arr[mid]` is less than the target, search the right half.
- Otherwise search the left half.
Time: $O(\log N)$, where $N$ is the number of elements.
Space: $O(1)$
Status: Stress-tested
"""


def binary_search(arr, target):
    low, high = 0, len(arr) - 1

    while low <= high:
        mid = low + (high - low) // 2
    return -1
"#;

    #[test]
    fn test_extract_complete_block() {
        let extraction = extract(WELL_FORMED);

        assert!(extraction.warning.is_none(), "{:?}", extraction.warning);
        let m = &extraction.metadata;
        assert_eq!(m.author, "PyCPBook Community");
        assert_eq!(m.origin, "Introduction to Algorithms (CLRS)");
        assert_eq!(m.time_complexity, "$O(\\log N)$, where $N$ is the number of elements.");
        assert_eq!(m.space_complexity, "$O(1)$");
        assert_eq!(m.status, "Stress-tested");
    }

    #[test]
    fn test_extract_description_spans_lines_until_next_label() {
        let extraction = extract(WELL_FORMED);
        let desc = &extraction.metadata.description;

        assert!(desc.starts_with("Implements the classic binary search"));
        // blank lines and bullet lines are content, not terminators
        assert!(desc.contains("\n\nThe search space"));
        assert!(desc.contains("- If `arr[mid]`"));
        // the Time: label ended the field
        assert!(!desc.contains("Time:"));
    }

    #[test]
    fn test_extract_code_body_verbatim_with_edges_trimmed() {
        let extraction = extract(WELL_FORMED);

        assert!(extraction.code.starts_with("def binary_search"));
        assert!(extraction.code.ends_with("return -1"));
        // interior blank line preserved
        assert!(extraction.code.contains("\n\n    while low <= high:"));
    }

    #[test]
    fn test_extract_no_block() {
        let source = "def f(x):\n    return x + 1\n";
        let extraction = extract(source);

        assert_eq!(
            extraction.warning,
            Some(MetadataWarning::MissingBlock)
        );
        assert!(extraction.metadata.is_empty());
        assert_eq!(extraction.code, "def f(x):\n    return x + 1");
    }

    #[test]
    fn test_extract_comment_before_block_counts_as_missing() {
        let source = "#!/usr/bin/env python3\n\"\"\"\nAuthor: X\n\"\"\"\ncode\n";
        let extraction = extract(source);

        assert_eq!(extraction.warning, Some(MetadataWarning::MissingBlock));
        assert!(extraction.code.starts_with("#!/usr/bin/env python3"));
    }

    #[test]
    fn test_extract_prose_block_is_malformed() {
        let source = "\"\"\"\nThis module implements the KMP algorithm.\n\"\"\"\ncode = 1\n";
        let extraction = extract(source);

        match extraction.warning {
            Some(MetadataWarning::Malformed { ref reason }) => {
                assert!(reason.contains("unexpected line"), "{}", reason);
            }
            ref other => panic!("expected malformed warning, got {:?}", other),
        }
        assert!(extraction.metadata.is_empty());
        assert_eq!(extraction.code, "code = 1");
    }

    #[test]
    fn test_extract_unterminated_block() {
        let source = "\"\"\"\nAuthor: X\nnever closed\n";
        let extraction = extract(source);

        match extraction.warning {
            Some(MetadataWarning::Malformed { ref reason }) => {
                assert!(reason.contains("unterminated"), "{}", reason);
            }
            ref other => panic!("expected malformed warning, got {:?}", other),
        }
        assert!(extraction.metadata.is_empty());
        // the whole file is treated as code
        assert!(extraction.code.starts_with("\"\"\""));
    }

    #[test]
    fn test_extract_skipped_labels_warn_but_parsing_continues() {
        let source = "\"\"\"\nAuthor: X\nTime: $O(N)$\nSpace: $O(1)$\nStatus: Tested\n\"\"\"\ncode\n";
        let extraction = extract(source);

        match extraction.warning {
            Some(MetadataWarning::Malformed { ref reason }) => {
                assert!(reason.contains("Source"), "{}", reason);
                assert!(reason.contains("Description"), "{}", reason);
            }
            ref other => panic!("expected malformed warning, got {:?}", other),
        }
        // the later fields were still recovered
        assert_eq!(extraction.metadata.author, "X");
        assert_eq!(extraction.metadata.time_complexity, "$O(N)$");
        assert_eq!(extraction.metadata.status, "Tested");
    }

    #[test]
    fn test_extract_out_of_order_label_stops_parsing() {
        let source = "\"\"\"\nAuthor: X\nSource: Y\nAuthor: Z\n\"\"\"\ncode\n";
        let extraction = extract(source);

        match extraction.warning {
            Some(MetadataWarning::Malformed { ref reason }) => {
                assert!(reason.contains("out of order"), "{}", reason);
            }
            ref other => panic!("expected malformed warning, got {:?}", other),
        }
        // fields before the duplicate are kept, the duplicate is not applied
        assert_eq!(extraction.metadata.author, "X");
        assert_eq!(extraction.metadata.origin, "Y");
    }

    #[test]
    fn test_extract_one_line_block() {
        let extraction = extract("\"\"\"Author: X\"\"\"\ncode\n");

        assert_eq!(extraction.metadata.author, "X");
        assert_eq!(extraction.code, "code");
        // the remaining five labels are missing
        assert!(matches!(
            extraction.warning,
            Some(MetadataWarning::Malformed { .. })
        ));
    }

    #[test]
    fn test_extract_blank_lines_between_fields() {
        let source = "\"\"\"\nAuthor: X\n\nSource: Y\nDescription: d\nTime: t\nSpace: s\nStatus: ok\n\"\"\"\n";
        let extraction = extract(source);

        assert!(extraction.warning.is_none(), "{:?}", extraction.warning);
        assert_eq!(extraction.metadata.origin, "Y");
        assert_eq!(extraction.code, "");
    }

    #[test]
    fn test_extract_empty_field_value() {
        let source = "\"\"\"\nAuthor:\nSource: Y\nDescription: d\nTime: t\nSpace: s\nStatus: ok\n\"\"\"\n";
        let extraction = extract(source);

        assert!(extraction.warning.is_none(), "{:?}", extraction.warning);
        assert_eq!(extraction.metadata.author, "");
        assert!(!extraction.metadata.is_empty());
    }

    #[test]
    fn test_indented_label_is_description_content() {
        let source = "\"\"\"\nAuthor: X\nSource: Y\nDescription: uses a table\n  Time: not a label here\nTime: $O(N)$\nSpace: s\nStatus: ok\n\"\"\"\n";
        let extraction = extract(source);

        assert!(extraction.warning.is_none(), "{:?}", extraction.warning);
        assert!(extraction
            .metadata
            .description
            .contains("  Time: not a label here"));
        assert_eq!(extraction.metadata.time_complexity, "$O(N)$");
    }
}
