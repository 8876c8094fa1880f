//! Coach reply parsing
//!
//! The model is instructed to answer with bold section headers followed by a
//! closing call to action:
//!
//! ```text
//! **TL;DR:** Recovery is low today.
//! **Why it matters:** ...
//! **Next best action:** ...
//! **Optional deeper dive:** ...
//! *Ready for more?* Ask me about tonight's sleep.
//! ```
//!
//! [`parse`] splits such a reply into a [`ParsedResponse`] with a small state
//! machine. Parsing never fails; text that matches no header stays in `raw`.

use serde::{Deserialize, Serialize};

/// `tldr` used when the model returned nothing
pub const EMPTY_REPLY_TLDR: &str =
    "I'm sorry, I didn't receive a clear response from the AI. Could you please try asking again?";

/// `closing_cta` used when the model returned nothing
pub const EMPTY_REPLY_CTA: &str = "If the problem persists, there might be a temporary issue.";

const CTA_PREFIXES: [&str; 2] = ["*Ready for more?*", "Ready for more?"];

/// A named body section of a coach reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Tldr,
    WhyItMatters,
    NextBestAction,
    DeeperDive,
}

impl SectionKind {
    /// All sections in display order
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Tldr,
        SectionKind::WhyItMatters,
        SectionKind::NextBestAction,
        SectionKind::DeeperDive,
    ];

    /// The header that opens this section
    pub fn header(&self) -> &'static str {
        match self {
            Self::Tldr => "**TL;DR:**",
            Self::WhyItMatters => "**Why it matters:**",
            Self::NextBestAction => "**Next best action:**",
            Self::DeeperDive => "**Optional deeper dive:**",
        }
    }

    /// Plain heading for rendering
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tldr => "TL;DR",
            Self::WhyItMatters => "Why it matters",
            Self::NextBestAction => "Next best action",
            Self::DeeperDive => "Optional deeper dive",
        }
    }

    /// Matches a trimmed line against the headers, returning the trailing text
    fn match_header(line: &str) -> Option<(SectionKind, &str)> {
        Self::ALL.iter().find_map(|kind| {
            line.strip_prefix(kind.header())
                .map(|rest| (*kind, rest.trim()))
        })
    }
}

/// A coach reply split into its sections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResponse {
    pub tldr: Option<String>,
    pub why_it_matters: Option<String>,
    pub next_best_action: Option<String>,
    pub deeper_dive: Option<String>,
    pub closing_cta: Option<String>,
    /// The reply exactly as received
    pub raw: String,
}

impl ParsedResponse {
    /// The canned reply for an empty model answer
    pub fn empty_reply() -> Self {
        Self {
            tldr: Some(EMPTY_REPLY_TLDR.to_string()),
            closing_cta: Some(EMPTY_REPLY_CTA.to_string()),
            ..Default::default()
        }
    }

    /// Body of a section, if it was present
    pub fn section(&self, kind: SectionKind) -> Option<&str> {
        match kind {
            SectionKind::Tldr => self.tldr.as_deref(),
            SectionKind::WhyItMatters => self.why_it_matters.as_deref(),
            SectionKind::NextBestAction => self.next_best_action.as_deref(),
            SectionKind::DeeperDive => self.deeper_dive.as_deref(),
        }
    }

    fn section_mut(&mut self, kind: SectionKind) -> &mut Option<String> {
        match kind {
            SectionKind::Tldr => &mut self.tldr,
            SectionKind::WhyItMatters => &mut self.why_it_matters,
            SectionKind::NextBestAction => &mut self.next_best_action,
            SectionKind::DeeperDive => &mut self.deeper_dive,
        }
    }

    /// Present sections in display order, empty bodies skipped
    pub fn sections(&self) -> Vec<(SectionKind, &str)> {
        SectionKind::ALL
            .iter()
            .filter_map(|kind| {
                self.section(*kind)
                    .filter(|body| !body.is_empty())
                    .map(|body| (*kind, body))
            })
            .collect()
    }

    /// Plain text of the reply
    ///
    /// The raw model text, or the fallback TL;DR and call to action when the
    /// model returned nothing.
    pub fn text(&self) -> String {
        if !self.raw.trim().is_empty() {
            return self.raw.clone();
        }
        [self.tldr.as_deref(), self.closing_cta.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Returns true when any header or the call to action was recognized
    pub fn is_structured(&self) -> bool {
        SectionKind::ALL
            .iter()
            .any(|kind| self.section(*kind).is_some())
            || self.closing_cta.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// Before the first header
    NoSection,
    /// Collecting body lines for a section
    InSection(SectionKind),
    /// After the call to action; plain lines are ignored
    Closed,
}

struct SectionParser {
    state: ParserState,
    buffer: Vec<String>,
    parsed: ParsedResponse,
}

impl SectionParser {
    fn new(raw: &str) -> Self {
        Self {
            state: ParserState::NoSection,
            buffer: Vec::new(),
            parsed: ParsedResponse {
                raw: raw.to_string(),
                ..Default::default()
            },
        }
    }

    fn feed(&mut self, line: &str) {
        let line = line.trim();

        if let Some((kind, rest)) = SectionKind::match_header(line) {
            self.flush();
            self.state = ParserState::InSection(kind);
            self.buffer.push(rest.to_string());
            return;
        }

        if CTA_PREFIXES.iter().any(|prefix| line.starts_with(prefix)) {
            self.flush();
            self.parsed.closing_cta = Some(line.to_string());
            self.state = ParserState::Closed;
            return;
        }

        if line.is_empty() {
            return;
        }

        if let ParserState::InSection(_) = self.state {
            self.buffer.push(line.to_string());
        }
    }

    fn flush(&mut self) {
        if let ParserState::InSection(kind) = self.state {
            let body = self.buffer.join("\n").trim().to_string();
            *self.parsed.section_mut(kind) = Some(body);
        }
        self.buffer.clear();
    }

    fn finish(mut self) -> ParsedResponse {
        self.flush();
        self.parsed
    }
}

/// Split a model reply into sections
///
/// # Examples
///
/// ```
/// use recovery_coach::response::parse;
///
/// let parsed = parse("**TL;DR:** Take it easy.\n**Next best action:** Walk 20 minutes.");
/// assert_eq!(parsed.tldr.as_deref(), Some("Take it easy."));
/// assert_eq!(parsed.next_best_action.as_deref(), Some("Walk 20 minutes."));
/// assert!(parsed.why_it_matters.is_none());
/// ```
pub fn parse(raw: &str) -> ParsedResponse {
    if raw.trim().is_empty() {
        tracing::warn!("Coach reply is empty; using fallback response");
        return ParsedResponse::empty_reply();
    }

    let normalized = raw.replace("\r\n", "\n");
    let mut parser = SectionParser::new(raw);
    for line in normalized.split('\n') {
        parser.feed(line);
    }

    let parsed = parser.finish();
    if !parsed.is_structured() {
        tracing::warn!("No sections recognized in coach reply; text kept in raw");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_REPLY: &str = "\
**TL;DR:** Your recovery is low today due to poor sleep.

**Why it matters:** Low recovery means your body isn't primed for high strain.
Pushing too hard could hinder progress.

**Next best action:** Focus on a lighter activity day.

**Optional deeper dive:** Sleep consistency is key.

*Ready for more?* Ask me how to wind down tonight.
";

    #[test]
    fn test_parse_full_reply() {
        let parsed = parse(FULL_REPLY);
        assert_eq!(
            parsed.tldr.as_deref(),
            Some("Your recovery is low today due to poor sleep.")
        );
        assert_eq!(
            parsed.why_it_matters.as_deref(),
            Some("Low recovery means your body isn't primed for high strain.\nPushing too hard could hinder progress.")
        );
        assert_eq!(
            parsed.next_best_action.as_deref(),
            Some("Focus on a lighter activity day.")
        );
        assert_eq!(
            parsed.deeper_dive.as_deref(),
            Some("Sleep consistency is key.")
        );
        assert_eq!(
            parsed.closing_cta.as_deref(),
            Some("*Ready for more?* Ask me how to wind down tonight.")
        );
        assert_eq!(parsed.raw, FULL_REPLY);
    }

    #[test]
    fn test_parse_empty_input() {
        for input in ["", "   ", "\n\r\n\t"] {
            let parsed = parse(input);
            assert_eq!(parsed.tldr.as_deref(), Some(EMPTY_REPLY_TLDR));
            assert_eq!(parsed.closing_cta.as_deref(), Some(EMPTY_REPLY_CTA));
            assert!(parsed.why_it_matters.is_none());
            assert_eq!(parsed.raw, "");
        }
    }

    #[test]
    fn test_text_of_empty_reply_is_fallback() {
        let text = parse("").text();
        assert_eq!(text, format!("{}\n\n{}", EMPTY_REPLY_TLDR, EMPTY_REPLY_CTA));
        assert_eq!(parse(FULL_REPLY).text(), FULL_REPLY);
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse(FULL_REPLY), parse(FULL_REPLY));
    }

    #[test]
    fn test_parse_crlf_line_endings() {
        let raw = "**TL;DR:** Rest.\r\nMore rest.\r\n*Ready for more?*\r\n";
        let parsed = parse(raw);
        assert_eq!(parsed.tldr.as_deref(), Some("Rest.\nMore rest."));
        assert_eq!(parsed.closing_cta.as_deref(), Some("*Ready for more?*"));
        assert_eq!(parsed.raw, raw);
    }

    #[test]
    fn test_parse_unstructured_text() {
        let raw = "I can only talk about recovery and sleep.";
        let parsed = parse(raw);
        assert!(!parsed.is_structured());
        assert!(parsed.tldr.is_none());
        assert!(parsed.closing_cta.is_none());
        assert_eq!(parsed.raw, raw);
    }

    #[test]
    fn test_header_body_on_following_lines() {
        let parsed = parse("**TL;DR:**\n  First line  \n\n  Second line\n");
        assert_eq!(parsed.tldr.as_deref(), Some("First line\nSecond line"));
    }

    #[test]
    fn test_header_without_body() {
        let parsed = parse("**TL;DR:**\n**Why it matters:** Because.");
        assert_eq!(parsed.tldr.as_deref(), Some(""));
        assert_eq!(parsed.why_it_matters.as_deref(), Some("Because."));
        assert_eq!(parsed.sections().len(), 1);
    }

    #[test]
    fn test_repeated_header_replaces_body() {
        let parsed = parse("**TL;DR:** first\n**TL;DR:** second");
        assert_eq!(parsed.tldr.as_deref(), Some("second"));
    }

    #[test]
    fn test_text_before_first_header_ignored() {
        let parsed = parse("Hi Alex!\n**TL;DR:** Sleep more.");
        assert_eq!(parsed.tldr.as_deref(), Some("Sleep more."));
    }

    #[test]
    fn test_text_after_cta_ignored() {
        let parsed = parse("**TL;DR:** Sleep more.\nReady for more? Just ask.\nTrailing note");
        assert_eq!(parsed.tldr.as_deref(), Some("Sleep more."));
        assert_eq!(
            parsed.closing_cta.as_deref(),
            Some("Ready for more? Just ask.")
        );
    }

    #[test]
    fn test_header_after_cta_reopens_section() {
        let parsed = parse("*Ready for more?*\n**Optional deeper dive:** Extra.");
        assert_eq!(parsed.closing_cta.as_deref(), Some("*Ready for more?*"));
        assert_eq!(parsed.deeper_dive.as_deref(), Some("Extra."));
    }

    #[test]
    fn test_cta_only() {
        let parsed = parse("  *Ready for more?*  ");
        assert!(parsed.is_structured());
        assert!(parsed.sections().is_empty());
        assert_eq!(parsed.closing_cta.as_deref(), Some("*Ready for more?*"));
    }

    #[test]
    fn test_indented_headers_recognized() {
        let parsed = parse("   **Next best action:**   Hydrate.   ");
        assert_eq!(parsed.next_best_action.as_deref(), Some("Hydrate."));
    }

    #[test]
    fn test_sections_in_display_order() {
        let parsed = parse("**Next best action:** B\n**TL;DR:** A");
        let kinds: Vec<SectionKind> = parsed.sections().into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![SectionKind::Tldr, SectionKind::NextBestAction]);
    }

    #[test]
    fn test_parsed_response_serializes() {
        let json = serde_json::to_value(parse("**TL;DR:** ok")).unwrap();
        assert_eq!(json["tldr"], "ok");
        assert!(json["why_it_matters"].is_null());
        assert_eq!(json["raw"], "**TL;DR:** ok");
    }
}
