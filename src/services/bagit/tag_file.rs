//! Typed tag-file writer
//!
//! BagIt tag files are ordered `Key: value` lines. Building them through a
//! writer with required keys first and optional blocks appended keeps the
//! line order stable as metadata grows, which keeps the tag manifest
//! stable too.

/// Longest allowed Internal-Sender-Description
const DESCRIPTION_MAX: usize = 1_000;

#[derive(Debug, Default)]
pub struct TagFile {
    lines: Vec<(String, String)>,
}

impl TagFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a required key. Newlines in values would corrupt the format
    /// and are replaced with spaces.
    pub fn push(&mut self, key: &str, value: impl AsRef<str>) -> &mut Self {
        let value = value.as_ref().replace(['\r', '\n'], " ");
        self.lines.push((key.to_string(), value));
        self
    }

    /// Append an optional key only when a value is present
    pub fn push_opt(&mut self, key: &str, value: Option<impl AsRef<str>>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Append a free-text description, truncated at 1 000 characters
    pub fn push_description(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            let mut value = value.replace(['\r', '\n'], " ");
            if value.len() > DESCRIPTION_MAX {
                let mut cut = DESCRIPTION_MAX;
                while !value.is_char_boundary(cut) {
                    cut -= 1;
                }
                value.truncate(cut);
            }
            self.push(key, value);
        }
        self
    }

    /// Render LF-terminated UTF-8 text
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.lines {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_ordered_lf_lines() {
        let mut tag = TagFile::new();
        tag.push("Source-Organization", "Curator Archive")
            .push("Bagging-Date", "2026-08-01")
            .push_opt("Location-State", Some("NY"))
            .push_opt("GPS-Latitude", None::<&str>);
        assert_eq!(
            tag.render(),
            "Source-Organization: Curator Archive\nBagging-Date: 2026-08-01\nLocation-State: NY\n"
        );
    }

    #[test]
    fn newlines_become_spaces_and_long_descriptions_truncate() {
        let mut tag = TagFile::new();
        let long = format!("line one\nline two {}", "x".repeat(2_000));
        tag.push_description("Internal-Sender-Description", Some(&long));
        let rendered = tag.render();
        let value = rendered
            .strip_prefix("Internal-Sender-Description: ")
            .unwrap()
            .trim_end();
        assert!(!value.contains('\n'));
        assert_eq!(value.len(), 1_000);
        assert!(value.starts_with("line one line two"));
    }
}
