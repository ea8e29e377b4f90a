//! Reference normalization.
//!
//! References show up in several surface forms: absolute gateway URLs
//! (`https://ipfs.io/ipfs/<cid>`), bare root-relative paths
//! (`/ipfs/<cid>`) and canonical scheme URLs (`ipfs://<cid>`). All of them
//! normalize to the canonical scheme form. Text pulled out of prose often
//! drags sentence punctuation along, so trailing `,.:;'"` are dropped.

use dweb_types::reference::Scheme;

/// Punctuation that commonly ends the sentence a reference sits in.
pub const TRAILING_PUNCTUATION: &[char] = &[',', '.', ':', ';', '\'', '"'];

const SCHEMES: [Scheme; 2] = [Scheme::Content, Scheme::Name];

/// Strip leading whitespace and any run of trailing whitespace or
/// punctuation.
pub fn trim_reference(text: &str) -> &str {
    text.trim_start()
        .trim_end_matches(|c: char| c.is_whitespace() || TRAILING_PUNCTUATION.contains(&c))
}

/// Normalize `text` into canonical `scheme://identifier` form.
///
/// Never fails: input that carries no recognizable reference comes back
/// trimmed but otherwise unchanged, and callers must validate it (see
/// `ContentReference::parse`) before treating it as a reference.
pub fn normalize(text: &str) -> String {
    let trimmed = trim_reference(text);

    if SCHEMES.iter().any(|s| trimmed.starts_with(s.prefix())) {
        return trimmed.to_string();
    }

    for scheme in SCHEMES {
        if let Some(rest) = trimmed.strip_prefix(scheme.path_prefix()) {
            return format!("{}{rest}", scheme.prefix());
        }
    }

    // Gateway URL or other text with the path pattern somewhere inside.
    let first = SCHEMES
        .iter()
        .filter_map(|&s| trimmed.find(s.path_prefix()).map(|pos| (pos, s)))
        .min_by_key(|&(pos, _)| pos);
    if let Some((pos, scheme)) = first {
        let after = &trimmed[pos + scheme.path_prefix().len()..];
        let end = after
            .find(|c: char| c == '/' || c.is_whitespace() || c == '"' || c == '\'')
            .unwrap_or(after.len());
        let id = after[..end].trim_end_matches(TRAILING_PUNCTUATION);
        return format!("{}{id}", scheme.prefix());
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_is_unchanged() {
        assert_eq!(normalize("ipfs://QmABC123"), "ipfs://QmABC123");
        assert_eq!(normalize("ipns://docs.ipfs.tech"), "ipns://docs.ipfs.tech");
    }

    #[test]
    fn canonical_form_keeps_subpath() {
        assert_eq!(normalize("ipfs://QmABC/readme.md"), "ipfs://QmABC/readme.md");
    }

    #[test]
    fn bare_path_is_rewritten() {
        assert_eq!(normalize("/ipfs/QmABC123"), "ipfs://QmABC123");
        assert_eq!(normalize("/ipfs/QmABC/a/b"), "ipfs://QmABC/a/b");
        assert_eq!(normalize("/ipns/example.org"), "ipns://example.org");
    }

    #[test]
    fn gateway_url_extracts_identifier() {
        assert_eq!(
            normalize("https://ipfs.io/ipfs/QmABC123/wiki/index.html"),
            "ipfs://QmABC123"
        );
        assert_eq!(
            normalize("http://127.0.0.1:8080/ipns/docs.ipfs.tech/"),
            "ipns://docs.ipfs.tech"
        );
    }

    #[test]
    fn trailing_punctuation_and_whitespace_trimmed() {
        assert_eq!(normalize("  /ipfs/QmABC123.  "), "ipfs://QmABC123");
        assert_eq!(normalize("ipfs://QmABC123\","), "ipfs://QmABC123");
        assert_eq!(normalize("see https://gw.io/ipfs/QmX;"), "ipfs://QmX");
    }

    #[test]
    fn identifier_stops_at_quote() {
        assert_eq!(normalize("href='https://gw.io/ipfs/QmQ'"), "ipfs://QmQ");
    }

    #[test]
    fn earliest_path_pattern_wins() {
        assert_eq!(normalize("x /ipns/name then /ipfs/QmY"), "ipns://name");
    }

    #[test]
    fn unrecognized_text_is_trimmed_only() {
        assert_eq!(normalize("not-a-valid-ref"), "not-a-valid-ref");
        assert_eq!(normalize(" hello world. "), "hello world");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn all_surface_forms_agree() {
        let forms = [
            "https://ipfs.io/ipfs/QmSame",
            "ipfs://QmSame",
            "/ipfs/QmSame",
        ];
        for form in forms {
            assert_eq!(normalize(form), "ipfs://QmSame", "form {form}");
        }
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn arb_surface() -> impl Strategy<Value = String> {
            let id = "[A-Za-z0-9]{1,20}";
            let punct = "[,.:;'\" ]{0,3}";
            (id, punct, 0usize..4).prop_map(|(id, p, form)| match form {
                0 => format!("https://gw.example/ipfs/{id}{p}"),
                1 => format!("ipfs://{id}{p}"),
                2 => format!("/ipfs/{id}{p}"),
                _ => format!("  /ipns/{id}/sub{p}"),
            })
        }

        proptest! {
            #[test]
            fn idempotent_on_arbitrary_text(s in "\\PC{0,40}") {
                let once = normalize(&s);
                prop_assert_eq!(normalize(&once), once);
            }

            #[test]
            fn idempotent_on_reference_forms(s in arb_surface()) {
                let once = normalize(&s);
                prop_assert_eq!(normalize(&once), once);
            }

            #[test]
            fn three_forms_share_a_canonical_reference(id in "[A-Za-z0-9]{1,46}", p in "[,.:;]{0,2}") {
                let gateway = normalize(&format!("http://127.0.0.1:8080/ipfs/{id}{p}"));
                let canonical = normalize(&format!("ipfs://{id}{p}"));
                let bare = normalize(&format!("/ipfs/{id}{p}"));
                prop_assert_eq!(&gateway, &canonical);
                prop_assert_eq!(&canonical, &bare);
                prop_assert_eq!(gateway, format!("ipfs://{id}"));
            }
        }
    }
}
