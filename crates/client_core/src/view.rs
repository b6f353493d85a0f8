//! Pure mapping from grant records to display cards.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use shared::{domain::GrantId, protocol::GrantRecord};

pub const DESCRIPTION_MAX_CHARS: usize = 200;
pub const ELLIPSIS: &str = "...";
const UNTITLED: &str = "Sin título";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLink {
    pub label: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub label: &'static str,
    pub value: String,
}

/// Display projection of a [`GrantRecord`]. Only fields present on the record
/// are carried, so a rendering never shows placeholders for missing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantCard {
    pub id: Option<GrantId>,
    pub title: String,
    pub reference: Option<String>,
    pub fields: Vec<CardField>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub links: Vec<CardLink>,
}

impl GrantCard {
    pub fn from_record(record: &GrantRecord) -> Self {
        Self::build(record, Some(DESCRIPTION_MAX_CHARS))
    }

    /// Like [`GrantCard::from_record`] but keeps the full description.
    pub fn detailed(record: &GrantRecord) -> Self {
        Self::build(record, None)
    }

    fn build(record: &GrantRecord, max_description: Option<usize>) -> Self {
        let mut fields = Vec::new();
        let mut push = |label: &'static str, value: Option<String>| {
            if let Some(value) = value {
                fields.push(CardField { label, value });
            }
        };

        push("Organismo", present(&record.organo_convocante).map(str::to_string));
        push("Región", present(&record.region_nombre).map(str::to_string));
        push(
            "Publicación",
            present(&record.fecha_publicacion).map(format_date),
        );
        push(
            "Inicio de solicitud",
            present(&record.fecha_inicio_solicitud).map(format_date),
        );
        push(
            "Fin de solicitud",
            present(&record.fecha_fin_solicitud).map(format_date),
        );
        push(
            "Presupuesto",
            record
                .presupuesto_total
                .filter(|amount| amount.is_finite())
                .map(format_currency),
        );

        let description = present(&record.descripcion).map(|text| match max_description {
            Some(max) => truncate_description(text, max),
            None => text.trim().to_string(),
        });

        let tags = [
            &record.tipo_convocatoria,
            &record.instrumento,
            &record.sector,
            &record.finalidad_nombre,
        ]
        .into_iter()
        .filter_map(|tag| present(tag).map(str::to_string))
        .collect();

        let links = [
            ("Ver en BDNS", &record.url_bdns),
            ("Convocatoria", &record.url_convocatoria),
        ]
        .into_iter()
        .filter_map(|(label, url)| {
            present(url).map(|url| CardLink {
                label,
                url: url.to_string(),
            })
        })
        .collect();

        Self {
            id: record.id,
            title: present(&record.titulo).unwrap_or(UNTITLED).to_string(),
            reference: present(&record.id_bdns).map(|id| format!("BDNS {id}")),
            fields,
            description,
            tags,
            links,
        }
    }

    /// Plain-text rendering, one entry per line.
    pub fn render(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match &self.reference {
            Some(reference) => lines.push(format!("{} [{reference}]", self.title)),
            None => lines.push(self.title.clone()),
        }
        for field in &self.fields {
            lines.push(format!("  {}: {}", field.label, field.value));
        }
        if let Some(description) = &self.description {
            lines.push(format!("  {description}"));
        }
        if !self.tags.is_empty() {
            lines.push(format!("  Etiquetas: {}", self.tags.join(" · ")));
        }
        for link in &self.links {
            lines.push(format!("  {}: {}", link.label, link.url));
        }
        lines
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `"1 resultado"`, otherwise `"N resultados"`.
pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 resultado".to_string()
    } else {
        format!("{count} resultados")
    }
}

/// Spanish currency style with no decimals: `1234.4` → `"1.234 €"`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped} €")
    } else {
        format!("{grouped} €")
    }
}

/// `dd/mm/yyyy` for ISO dates and datetimes; anything else is returned as given.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|dt| dt.date())
                .ok()
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .map(|dt| dt.date())
                .ok()
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());

    match date {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => raw.to_string(),
    }
}

/// Cuts at `max_chars` characters and appends [`ELLIPSIS`].
pub fn truncate_description(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
