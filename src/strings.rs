use std::str;

/// Selects how byte-strings are decoded into code points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StringOpts {
    /// Decode bytes as UTF-8 and case-fold with the Unicode simple mapping.
    /// When unset, every byte is its own code point and only ASCII letters
    /// fold.
    pub unicode: bool,
}

/// Decodes candidate and query bytes into code points and case-folds them.
///
/// Decoding writes into caller-supplied buffers so the per-candidate hot path
/// allocates nothing beyond amortised buffer growth.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringHandler {
    unicode: bool,
}

impl StringHandler {
    #[must_use]
    pub fn new(opts: StringOpts) -> Self {
        Self {
            unicode: opts.unicode,
        }
    }

    /// Decode `bytes` into `out`, replacing its previous contents.
    ///
    /// In Unicode mode invalid UTF-8 degrades gracefully: the offending byte
    /// becomes a code point of its raw value and decoding continues.
    pub fn decode(&self, bytes: &[u8], out: &mut Vec<char>) {
        out.clear();
        if !self.unicode {
            out.extend(bytes.iter().map(|&b| b as char));
            return;
        }
        let mut rest = bytes;
        while !rest.is_empty() {
            match str::from_utf8(rest) {
                Ok(s) => {
                    out.extend(s.chars());
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(s) = str::from_utf8(&rest[..valid]) {
                        out.extend(s.chars());
                    }
                    out.push(rest[valid] as char);
                    rest = &rest[valid + 1..];
                }
            }
        }
    }

    /// Record the byte offset of each code point of `bytes` into `out`,
    /// followed by a sentinel equal to `bytes.len()`.
    ///
    /// `out[i]..out[i + 1]` is the byte range of code point `i` as produced
    /// by [`decode`](Self::decode), including the raw bytes substituted for
    /// invalid UTF-8.
    pub fn byte_offsets(&self, bytes: &[u8], out: &mut Vec<usize>) {
        out.clear();
        if !self.unicode {
            out.extend(0..=bytes.len());
            return;
        }
        let mut base = 0;
        let mut rest = bytes;
        while !rest.is_empty() {
            match str::from_utf8(rest) {
                Ok(s) => {
                    out.extend(s.char_indices().map(|(i, _)| base + i));
                    base += s.len();
                    rest = &[];
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    if let Ok(s) = str::from_utf8(&rest[..valid]) {
                        out.extend(s.char_indices().map(|(i, _)| base + i));
                    }
                    out.push(base + valid);
                    base += valid + 1;
                    rest = &rest[valid + 1..];
                }
            }
        }
        out.push(bytes.len());
    }

    /// Case-fold a single code point.
    #[must_use]
    pub fn fold(&self, c: char) -> char {
        if c.is_ascii() {
            c.to_ascii_lowercase()
        } else if self.unicode {
            // Simple (single code point) lowercase mapping.
            c.to_lowercase().next().unwrap_or(c)
        } else {
            c
        }
    }

    /// Case-fold `chars` into `out`, replacing its previous contents.
    pub fn fold_into(&self, chars: &[char], out: &mut Vec<char>) {
        out.clear();
        out.extend(chars.iter().map(|&c| self.fold(c)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(handler: StringHandler, bytes: &[u8]) -> Vec<char> {
        let mut out = Vec::new();
        handler.decode(bytes, &mut out);
        out
    }

    #[test]
    fn ascii_mode_maps_each_byte() {
        let handler = StringHandler::new(StringOpts { unicode: false });
        assert_eq!(decode(handler, b"a/B"), vec!['a', '/', 'B']);
        // High bytes pass through as their raw values.
        assert_eq!(decode(handler, &[0xC3, 0xA9]), vec!['\u{C3}', '\u{A9}']);
    }

    #[test]
    fn unicode_mode_decodes_utf8() {
        let handler = StringHandler::new(StringOpts { unicode: true });
        assert_eq!(decode(handler, "né.txt".as_bytes()), vec!['n', 'é', '.', 't', 'x', 't']);
    }

    #[test]
    fn invalid_utf8_degrades_to_raw_bytes() {
        let handler = StringHandler::new(StringOpts { unicode: true });
        // A lone continuation byte between valid runs.
        assert_eq!(decode(handler, b"a\x80b"), vec!['a', '\u{80}', 'b']);
        // A truncated multi-byte sequence at the end of input.
        assert_eq!(decode(handler, b"ok\xC3"), vec!['o', 'k', '\u{C3}']);
    }

    #[test]
    fn byte_offsets_cover_multibyte_code_points() {
        let handler = StringHandler::new(StringOpts { unicode: true });
        let mut offsets = Vec::new();
        handler.byte_offsets("né!".as_bytes(), &mut offsets);
        assert_eq!(offsets, vec![0, 1, 3, 4]);

        handler.byte_offsets(b"a\x80b", &mut offsets);
        assert_eq!(offsets, vec![0, 1, 2, 3]);
    }

    #[test]
    fn folding_respects_encoding() {
        let ascii = StringHandler::new(StringOpts { unicode: false });
        let unicode = StringHandler::new(StringOpts { unicode: true });
        assert_eq!(ascii.fold('A'), 'a');
        assert_eq!(ascii.fold('É'), 'É');
        assert_eq!(unicode.fold('É'), 'é');
    }
}
