// Character reference decoding for markup text and attribute values.
//
// Covers the named references that show up in practice plus decimal and
// hexadecimal numeric references. Unknown references are left as written.

/// Look up a named character reference (without `&` and `;`).
pub fn lookup_entity(name: &str) -> Option<&'static str> {
    let s: &'static str = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{00A0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "hellip" => "\u{2026}",
        "bull" => "\u{2022}",
        "middot" => "\u{00B7}",
        "laquo" => "\u{00AB}",
        "raquo" => "\u{00BB}",
        "copy" => "\u{00A9}",
        "reg" => "\u{00AE}",
        "trade" => "\u{2122}",
        "times" => "\u{00D7}",
        "deg" => "\u{00B0}",
        "euro" => "\u{20AC}",
        "larr" => "\u{2190}",
        "rarr" => "\u{2192}",
        _ => return None,
    };
    Some(s)
}

/// Decode every character reference in `input`.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match decode_one(tail) {
            Some((decoded, consumed)) => {
                out.push_str(&decoded);
                rest = &tail[consumed..];
            },
            None => {
                out.push('&');
                rest = tail;
            },
        }
    }
    out.push_str(rest);
    out
}

/// Decode one reference at the start of `tail` (text after `&`). Returns
/// the replacement and the number of bytes consumed including `;`.
fn decode_one(tail: &str) -> Option<(String, usize)> {
    let semi = tail.find(';').filter(|&i| i > 0 && i <= 32)?;
    let name = &tail[..semi];

    let decoded = if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        char::from_u32(code)?.to_string()
    } else {
        lookup_entity(name)?.to_string()
    };
    Some((decoded, semi + 1))
}

/// Escape text content (`&`, `<`, `>`).
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value (text escapes plus `"`).
pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_numeric_references() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#65;&#x42;&#X43;"), "ABC");
        assert_eq!(decode_entities("caf&eacute;"), "caf&eacute;");
    }

    #[test]
    fn bare_ampersands_survive() {
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
        assert_eq!(decode_entities("a&b"), "a&b");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }

    #[test]
    fn invalid_code_points_left_alone() {
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
        assert_eq!(decode_entities("&#;"), "&#;");
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_text("<a & \"b\">"), "&lt;a &amp; \"b\"&gt;");
        assert_eq!(escape_attr("say \"hi\" & <go>"), "say &quot;hi&quot; &amp; &lt;go&gt;");
    }
}
