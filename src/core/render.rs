/// Scene text rendering — placeholder substitution and minimal markup.
///
/// The renderer produces structured paragraph/span blocks, never a markup
/// string; styling belongs to the presentation layer.

use serde::Serialize;

use crate::schema::case::CaseProfile;

/// Substituted when an identity or description field has no active case
/// behind it.
pub const FALLBACK_IDENTITY: &str = "Unknown";
/// Substituted for the criminal-history field.
pub const FALLBACK_HISTORY: &str = "None";

/// A run of text with a single style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

/// One displayable paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub spans: Vec<Span>,
}

/// Renders a scene's template text against the active case profile.
///
/// Recognized placeholders: `{defendant}`, `{charge}`, `{history}`,
/// `{victim}`, `{incident}`. Markup: `**bold**` spans and
/// newline-separated paragraphs. Unrecognized placeholders and unmatched
/// markers pass through literally — rendering never fails.
pub fn render(text: &str, case: Option<&CaseProfile>) -> Vec<Paragraph> {
    let substituted = substitute(text, case);
    substituted
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(parse_paragraph)
        .collect()
}

// An empty field counts as absent and falls back too.
fn field_or<'a>(value: Option<&'a str>, fallback: &'static str) -> &'a str {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => fallback,
    }
}

fn placeholder_value<'a>(token: &str, case: Option<&'a CaseProfile>) -> Option<&'a str> {
    match token {
        "defendant" => Some(field_or(case.map(|c| c.defendant.as_str()), FALLBACK_IDENTITY)),
        "charge" => Some(field_or(case.map(|c| c.charge.as_str()), FALLBACK_IDENTITY)),
        "history" => Some(field_or(case.map(|c| c.history.as_str()), FALLBACK_HISTORY)),
        "victim" => Some(field_or(case.map(|c| c.victim.as_str()), FALLBACK_IDENTITY)),
        "incident" => Some(field_or(case.map(|c| c.incident.as_str()), FALLBACK_IDENTITY)),
        _ => None,
    }
}

fn substitute(text: &str, case: Option<&CaseProfile>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let token = &after[..close];
                match placeholder_value(token, case) {
                    Some(value) => out.push_str(value),
                    // Unknown token: keep the braces as written.
                    None => {
                        out.push('{');
                        out.push_str(token);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            // Unclosed brace: the remainder is literal.
            None => {
                out.push('{');
                out.push_str(after);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

fn parse_paragraph(line: &str) -> Paragraph {
    let parts: Vec<&str> = line.split("**").collect();
    let unmatched = parts.len() % 2 == 0;
    let mut spans = Vec::new();

    for (i, part) in parts.iter().enumerate() {
        let dangling = unmatched && i == parts.len() - 1;
        if dangling && i % 2 == 1 {
            // Odd count of markers: the last opener stays literal.
            spans.push(Span {
                text: format!("**{}", part),
                bold: false,
            });
            continue;
        }
        if part.is_empty() {
            continue;
        }
        spans.push(Span {
            text: (*part).to_string(),
            bold: i % 2 == 1,
        });
    }

    Paragraph { spans }
}
