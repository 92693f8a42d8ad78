//! Escaping of metadata text for the generated LaTeX fragments.
//!
//! Code bodies are emitted inside verbatim environments and are never escaped;
//! these functions only ever see metadata field text.

/// Escapes characters with syntactic meaning in LaTeX.
///
/// Plain text only: inline code and math spans must be split out first (see
/// [`escape`]). Each character is rewritten at most once, so the output is
/// never double-escaped.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash "),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '#' => out.push_str("\\#"),
            '$' => out.push_str("\\$"),
            '%' => out.push_str("\\%"),
            '&' => out.push_str("\\&"),
            '_' => out.push_str("\\_"),
            '^' => out.push_str("\\textasciicircum{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes description text while preserving `$...$` math spans verbatim and
/// rewriting `` `...` `` spans to `\texttt{...}` with their content escaped.
///
/// An unpaired delimiter is ordinary text and gets escaped like everything
/// else. Math spans are recognized first, so a backtick inside math stays
/// untouched and a paired `$` inside backticks still starts a math span.
pub fn escape(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;

    while let Some((before, span, after)) = split_span(rest, b'$') {
        out.push_str(&escape_with_code_spans(before));
        out.push_str(span);
        rest = after;
    }
    out.push_str(&escape_with_code_spans(rest));

    out
}

/// Escapes text that contains no math spans, rewriting backtick spans.
fn escape_with_code_spans(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;

    while let Some((before, span, after)) = split_span(rest, b'`') {
        out.push_str(&escape_text(before));
        // span includes its delimiters
        out.push_str("\\texttt{");
        out.push_str(&escape_text(&span[1..span.len() - 1]));
        out.push('}');
        rest = after;
    }
    out.push_str(&escape_text(rest));

    out
}

/// Splits off the first delimited span, returning (before, span, after).
/// The span includes both delimiter bytes. Spans never cross a line break;
/// a delimiter whose pair sits on a later line is plain text. Returns None
/// when no complete span exists.
fn split_span(text: &str, delim: u8) -> Option<(&str, &str, &str)> {
    let bytes = text.as_bytes();
    let mut from = 0;
    loop {
        let start = from + bytes[from..].iter().position(|&b| b == delim)?;
        let stop = bytes[start + 1..]
            .iter()
            .position(|&b| b == delim || b == b'\n')?;
        if bytes[start + 1 + stop] == delim {
            let end = start + stop + 2;
            return Some((&text[..start], &text[start..end], &text[end..]));
        }
        // line break before the closing delimiter
        from = start + 1 + stop;
    }
}
