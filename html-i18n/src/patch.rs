//! The document transform. Pure: string in, string plus counts out.

use tracing::trace;

use crate::config::PatchConfig;
use crate::entities::{decode, escape_attr};
use crate::tokenizer::{StartTag, Token, tokenize};

const TARGET_ELEMENTS: [&str; 8] = ["label", "span", "h1", "h2", "h3", "h4", "h5", "h6"];
const BUTTON: &str = "button";
const HINT_CLASS: &str = "form-hint";

/// Result of [`patch_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// The full document with attribute insertions applied.
    pub output: String,
    /// Elements that received the attribute.
    pub annotated: usize,
    /// Candidate elements that already carried the attribute.
    pub already_annotated: usize,
    /// Trimmed texts of candidate elements with no dictionary entry, in
    /// document order.
    pub unmatched: Vec<String>,
}

impl PatchOutcome {
    pub fn changed(&self) -> bool {
        self.annotated > 0
    }
}

fn is_target(tag: &StartTag) -> bool {
    TARGET_ELEMENTS.contains(&tag.name.as_str()) || tag.name == BUTTON || tag.has_class(HINT_CLASS)
}

/// Annotates every target element whose only child is text matching the
/// dictionary. Bytes outside the inserted attributes are left untouched.
pub fn patch_document(html: &str, cfg: &PatchConfig) -> PatchOutcome {
    let tokens = tokenize(html);
    let attr = cfg.attribute();

    let mut inserts: Vec<(usize, String)> = Vec::new();
    let mut already_annotated = 0;
    let mut unmatched = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let Token::Start(tag) = token else { continue };
        if tag.self_closing || !is_target(tag) {
            continue;
        }
        // Only `<tag>text</tag>`: nested markup, comments and empty bodies
        // are left alone.
        let (Some(Token::Text(text)), Some(Token::End { name, .. })) =
            (tokens.get(i + 1), tokens.get(i + 2))
        else {
            continue;
        };
        if *name != tag.name {
            continue;
        }

        let decoded = decode(&html[text.clone()]);
        let label = decoded.trim();
        if label.is_empty() {
            continue;
        }

        if tag.attr(attr).is_some() {
            already_annotated += 1;
            continue;
        }

        match cfg.key_for(label) {
            Some(key) => {
                trace!(element = %tag.name, text = %label, key, "annotate");
                inserts.push((tag.insert_at, format!(" {attr}=\"{}\"", escape_attr(key))));
            }
            None => unmatched.push(label.to_string()),
        }
    }

    let mut output = String::with_capacity(html.len() + inserts.iter().map(|(_, s)| s.len()).sum::<usize>());
    let mut copied = 0;
    for (at, snippet) in &inserts {
        output.push_str(&html[copied..*at]);
        output.push_str(snippet);
        copied = *at;
    }
    output.push_str(&html[copied..]);

    PatchOutcome {
        output,
        annotated: inserts.len(),
        already_annotated,
        unmatched,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn cfg(pairs: &[(&str, &str)]) -> PatchConfig {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(t, k)| (t.to_string(), k.to_string()))
            .collect();
        PatchConfig::new(map, "data-i18n").unwrap()
    }

    #[test]
    fn annotates_targets_with_exact_text() {
        let c = cfg(&[
            ("Sprache", "settings.general.language"),
            ("Änderungen speichern", "settings.branding.saveChanges"),
            ("Titel im Browser-Tab", "settings.branding.pageTitleHint"),
        ]);
        let html = concat!(
            "<label for=\"lang\">\n  Sprache\n</label>",
            "<button class=\"btn\">Änderungen speichern</button>",
            "<small class=\"form-hint\">Titel im Browser-Tab</small>",
            "<p>Sprache</p>",
        );
        let out = patch_document(html, &c);
        assert_eq!(
            out.output,
            concat!(
                "<label for=\"lang\" data-i18n=\"settings.general.language\">\n  Sprache\n</label>",
                "<button class=\"btn\" data-i18n=\"settings.branding.saveChanges\">Änderungen speichern</button>",
                "<small class=\"form-hint\" data-i18n=\"settings.branding.pageTitleHint\">Titel im Browser-Tab</small>",
                "<p>Sprache</p>",
            )
        );
        assert_eq!(out.annotated, 3);
        assert!(out.unmatched.is_empty());
    }

    #[test]
    fn already_annotated_is_untouched() {
        let c = cfg(&[("Sprache", "settings.general.language")]);
        let html = "<span DATA-I18N=\"custom.key\">Sprache</span>";
        let out = patch_document(html, &c);
        assert_eq!(out.output, html);
        assert_eq!(out.already_annotated, 1);
        assert_eq!(out.annotated, 0);
    }

    #[test]
    fn unmatched_and_nested_are_byte_identical() {
        let c = cfg(&[("Sprache", "settings.general.language")]);
        let html = "<h2 class='x'>Unbekannt</h2><label><b>Sprache</b></label><span></span>";
        let out = patch_document(html, &c);
        assert_eq!(out.output, html);
        assert_eq!(out.unmatched, vec!["Unbekannt".to_string()]);
        assert!(!out.changed());
    }

    #[test]
    fn entities_decoded_before_lookup_and_key_escaped() {
        let c = cfg(&[("Öl & Filter", "service.oil&filter")]);
        let out = patch_document("<span>Öl &amp; Filter</span>", &c);
        assert_eq!(
            out.output,
            "<span data-i18n=\"service.oil&amp;filter\">Öl &amp; Filter</span>"
        );
    }

    #[test]
    fn gt_inside_attribute_value() {
        let c = cfg(&[("Max Tokens", "settings.general.maxTokens")]);
        let html = r#"<label title="a > b">Max Tokens</label>"#;
        let out = patch_document(html, &c);
        assert_eq!(
            out.output,
            r#"<label title="a > b" data-i18n="settings.general.maxTokens">Max Tokens</label>"#
        );
    }

    #[test]
    fn script_and_comment_contents_are_ignored() {
        let c = cfg(&[("Sprache", "settings.general.language")]);
        let html = "<!-- <span>Sprache</span> --><script>let s = '<span>Sprache</span>';</script>";
        let out = patch_document(html, &c);
        assert_eq!(out.output, html);
        assert_eq!(out.annotated, 0);
    }

    #[test]
    fn textarea_content_is_not_markup() {
        let c = cfg(&[("Sprache", "settings.general.language")]);
        let html = "<textarea><label>Sprache</label></textarea><title>Sprache</title><label>Sprache</label>";
        let out = patch_document(html, &c);
        assert_eq!(
            out.output,
            "<textarea><label>Sprache</label></textarea><title>Sprache</title><label data-i18n=\"settings.general.language\">Sprache</label>"
        );
        assert_eq!(out.annotated, 1);
    }

    #[test]
    fn irregular_tag_syntax() {
        let c = cfg(&[("Sprache", "settings.general.language")]);
        let cases = [
            (
                "<label for=a/b>Sprache</label>",
                "<label for=a/b data-i18n=\"settings.general.language\">Sprache</label>",
            ),
            (
                "<span\n>Sprache</span>",
                "<span\n data-i18n=\"settings.general.language\">Sprache</span>",
            ),
            (
                "<label class=\"a\"title='b'>Sprache</label>",
                "<label class=\"a\"title='b' data-i18n=\"settings.general.language\">Sprache</label>",
            ),
            (
                "<span data-i18n-x=\"y\">Sprache</span>",
                "<span data-i18n-x=\"y\" data-i18n=\"settings.general.language\">Sprache</span>",
            ),
            (
                "<h1>Sprache</h1><span class=\"open",
                "<h1 data-i18n=\"settings.general.language\">Sprache</h1><span class=\"open",
            ),
        ];
        for (html, want) in cases {
            let once = patch_document(html, &c);
            assert_eq!(once.output, want, "input: {html}");
            let twice = patch_document(&once.output, &c);
            assert_eq!(twice.output, once.output);
            assert_eq!(twice.annotated, 0);
        }
    }

    #[test]
    fn custom_attribute_and_second_pass_is_noop() {
        let map = BTreeMap::from([("Zeitzone".to_string(), "settings.general.timezone".to_string())]);
        let c = PatchConfig::new(map, "data-l10n").unwrap();
        let first = patch_document("<h3>Zeitzone</h3>", &c);
        assert_eq!(
            first.output,
            "<h3 data-l10n=\"settings.general.timezone\">Zeitzone</h3>"
        );
        let second = patch_document(&first.output, &c);
        assert_eq!(second.output, first.output);
        assert_eq!(second.already_annotated, 1);
    }
}
