//! Markup for material list items and upload progress rows.
//!
//! Every server-provided string goes through [`escape_html`].
use std::fmt::Write;

use crate::MaterialEntry;

const DELETE_LABEL: &str = "Delete";
const CONFIRM_LABEL: &str = "Confirm";
const EDIT_LABEL: &str = "Edit";
const PUBLIC_LABEL: &str = "Public";

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Which optional controls a list item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStyle {
    /// Trace materials: public checkbox when allowed, uploader name otherwise.
    Trace,
    /// Assistant event-block materials: edit button and info string.
    EventBlock,
    /// Summary notes and links: no public checkbox.
    Summary,
}

pub fn render_entry(entry: &MaterialEntry, style: EntryStyle) -> String {
    let material = &entry.material;
    let id = material.material_id;
    let mut html = String::new();

    let team_upload = style == EntryStyle::EventBlock && material.uploader_name.is_some();
    let mut class = String::from("list-group-item");
    if team_upload {
        class.push_str(" assistant-team-link");
    }
    if entry.team_confirmed {
        class.push_str(" confirmed-team-link");
    }
    let _ = write!(
        html,
        r#"<li class="{class}" data-material-id="{id}"><a href="{}">{}</a>"#,
        escape_html(&material.url),
        escape_html(&material.name)
    );

    if style == EntryStyle::Trace && material.can_set_public {
        let checked = if material.is_public { " checked" } else { "" };
        let _ = write!(
            html,
            r#"<label>{PUBLIC_LABEL}<input type="checkbox" data-link-id="{id}" class="upload_is_public"{checked}></label>"#
        );
    }

    let _ = write!(
        html,
        r#"<button name="material_id" value="{id}" class="btn btn-warning btn-sm pull-right delete-material-btn">{DELETE_LABEL}</button>"#
    );

    if team_upload && !entry.team_confirmed {
        let _ = write!(
            html,
            r#"<button value="{id}" class="btn btn-primary btn-sm pull-right confirm-material-btn">{CONFIRM_LABEL}</button>"#
        );
    }

    if style == EntryStyle::EventBlock {
        let _ = write!(
            html,
            r#"<button value="{id}" class="btn btn-success btn-sm pull-right edit-event-block-material">{EDIT_LABEL}</button>"#
        );
    }

    let show_uploader = !(style == EntryStyle::Trace && material.can_set_public);
    if show_uploader {
        if let Some(uploader) = material.uploader_name.as_deref() {
            let _ = write!(html, "<div>({})</div>", escape_html(uploader));
        }
    }

    if let Some(owners) = entry.owners.as_deref() {
        let _ = write!(
            html,
            r#"<div class="material-owners">{}</div>"#,
            escape_html(owners)
        );
    }

    match style {
        EntryStyle::EventBlock => {
            let info = material.info_string.as_deref().unwrap_or_default();
            let _ = write!(
                html,
                r#"<div><span class="text-muted assistant-info-string">{}</span></div><div class="info-string-edit"></div>"#,
                escape_html(info)
            );
        }
        EntryStyle::Trace | EntryStyle::Summary => {
            let _ = write!(
                html,
                "<div><span>{}</span></div>",
                escape_html(&material.comment)
            );
        }
    }

    html.push_str("</li>");
    html
}

pub fn render_progress_row(row_number: u64, display_name: &str, percent: u8) -> String {
    format!(
        concat!(
            r#"<div class="row upload-row" data-row-number="{}">"#,
            r#"<div class="col-lg-3 uploads-name"><span class="uploaded-file-name">{}</span></div>"#,
            r#"<div class="col-lg-9 uploads-progress pt-5"><div class="progress">"#,
            r#"<div class="progress-bar" role="progressbar" aria-valuemin="0" aria-valuemax="100" style="width: {}%"></div>"#,
            "</div></div></div>"
        ),
        row_number,
        escape_html(display_name),
        percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Material;

    fn entry(can_set_public: bool) -> MaterialEntry {
        MaterialEntry::new(Material {
            material_id: 42,
            url: "/m/42".into(),
            name: "slides <v2>.pdf".into(),
            comment: "day 1".into(),
            is_public: true,
            uploader_name: Some("Ann".into()),
            info_string: Some("block A".into()),
            can_set_public,
        })
    }

    #[test]
    fn escapes_server_strings() {
        let html = render_entry(&entry(false), EntryStyle::Trace);
        assert!(html.contains("slides &lt;v2&gt;.pdf"));
        assert!(!html.contains("<v2>"));
    }

    #[test]
    fn public_checkbox_only_when_allowed() {
        let with = render_entry(&entry(true), EntryStyle::Trace);
        assert!(with.contains(r#"class="upload_is_public" checked"#));
        assert!(!with.contains("(Ann)"));

        let without = render_entry(&entry(false), EntryStyle::Trace);
        assert!(!without.contains("upload_is_public"));
        assert!(without.contains("<div>(Ann)</div>"));
    }

    #[test]
    fn event_block_entry_carries_info_string() {
        let html = render_entry(&entry(true), EntryStyle::EventBlock);
        assert!(html.contains("assistant-team-link"));
        assert!(html.contains("edit-event-block-material"));
        assert!(html.contains("block A"));
    }

    #[test]
    fn confirmed_team_upload_loses_its_button() {
        let mut team = entry(true);
        assert!(render_entry(&team, EntryStyle::EventBlock).contains("confirm-material-btn"));

        team.team_confirmed = true;
        let html = render_entry(&team, EntryStyle::EventBlock);
        assert!(html.contains(r#"class="list-group-item assistant-team-link confirmed-team-link""#));
        assert!(!html.contains("confirm-material-btn"));
    }

    #[test]
    fn progress_row_sets_width() {
        let html = render_progress_row(3, "a.pdf", 57);
        assert!(html.contains(r#"data-row-number="3""#));
        assert!(html.contains("width: 57%"));
    }
}
