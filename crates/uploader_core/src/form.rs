use std::path::PathBuf;

/// A file picked in a form's file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size_bytes,
        }
    }
}

/// The mutually exclusive ways a form can carry a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    File,
    Url,
    Summary,
}

/// Current field values of an upload form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormFields {
    pub files: Vec<SelectedFile>,
    pub url: String,
    pub summary: String,
    pub comment: String,
    pub is_public: bool,
    /// Destination selector (event block, result type, ...).
    pub category: Option<String>,
    /// Static hidden fields copied into every request of this form.
    pub extra: Vec<(String, String)>,
}

impl FormFields {
    pub fn with_extra(extra: Vec<(String, String)>) -> Self {
        Self {
            extra,
            ..Self::default()
        }
    }

    /// Input modes that currently hold a non-blank value.
    pub fn filled_modes(&self) -> Vec<InputMode> {
        let mut modes = Vec::with_capacity(3);
        if !self.files.is_empty() {
            modes.push(InputMode::File);
        }
        if !self.url.trim().is_empty() {
            modes.push(InputMode::Url);
        }
        if !is_blank_rich_text(&self.summary) {
            modes.push(InputMode::Summary);
        }
        modes
    }

    /// The single filled mode, or `None` when zero or several are filled.
    pub fn active_mode(&self) -> Option<InputMode> {
        match self.filled_modes().as_slice() {
            [mode] => Some(*mode),
            _ => None,
        }
    }

    pub fn has_category(&self) -> bool {
        self.category
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
    }

    /// Reset everything the user typed or picked; hidden fields survive.
    pub(crate) fn clear_transient(&mut self) {
        self.files.clear();
        self.url.clear();
        self.summary.clear();
        self.comment.clear();
        self.is_public = false;
        self.category = None;
    }
}

/// Rich-text editors emit markup such as `<p><br></p>` for an empty document.
pub fn is_blank_rich_text(text: &str) -> bool {
    let mut in_tag = false;
    let mut visible = String::new();
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => visible.push(ch),
            _ => {}
        }
    }
    visible.replace("&nbsp;", " ").trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_placeholder_markup_is_blank() {
        assert!(is_blank_rich_text(""));
        assert!(is_blank_rich_text("<p><br></p>"));
        assert!(is_blank_rich_text("<p>&nbsp; </p>"));
        assert!(!is_blank_rich_text("<p>notes</p>"));
    }

    #[test]
    fn active_mode_requires_exactly_one_input() {
        let mut fields = FormFields::default();
        assert_eq!(fields.active_mode(), None);

        fields.url = "https://example.com".into();
        assert_eq!(fields.active_mode(), Some(InputMode::Url));

        fields.files.push(SelectedFile::new("a.pdf", "/tmp/a.pdf", 10));
        assert_eq!(fields.active_mode(), None);
    }

    #[test]
    fn clear_transient_keeps_hidden_fields() {
        let mut fields = FormFields::with_extra(vec![("trace_name".into(), "intro".into())]);
        fields.url = "x".into();
        fields.comment = "c".into();
        fields.is_public = true;
        fields.category = Some("3".into());
        fields.clear_transient();

        assert_eq!(
            fields,
            FormFields::with_extra(vec![("trace_name".into(), "intro".into())])
        );
    }
}
