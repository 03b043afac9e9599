//! BBCode sections for Bangumi records.

use super::Description;
use crate::models::{Record, Role};

pub(super) fn render(record: &Record) -> String {
    let mut d = Description::new();
    d.image(record.poster.as_deref());

    if let Some(synopsis) = record.synopsis.as_deref().filter(|s| !s.is_empty()) {
        d.raw(&format!("[b]Story: [/b]\n\n{synopsis}\n\n"));
    }

    let staff: Vec<String> = record
        .staff()
        .map(|credit| match &credit.label {
            Some(label) => format!("{label}: {}", credit.names.join("、")),
            None => credit.names.join("、"),
        })
        .collect();
    if !staff.is_empty() {
        d.raw(&format!("[b]Staff: [/b]\n\n{}\n\n", staff.join("\n")));
    }

    let cast = record.credited(Role::Cast);
    if !cast.is_empty() {
        d.raw(&format!("[b]Cast: [/b]\n\n{}\n\n", cast.join("\n")));
    }

    if let Some(link) = record.link.as_deref() {
        d.raw(&format!("(来源于 {link} )\n"));
    }
    d.finish()
}
