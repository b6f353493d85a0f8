use std::{collections::BTreeMap, fmt};

use serde::{
    ser::{SerializeMap, Serializer},
    Deserialize, Serialize,
};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(GrantId);
id_newtype!(SubscriptionId);
id_newtype!(UserId);
id_newtype!(RegionId);
id_newtype!(AreaId);

/// Canonical filter schema shared by search and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Organo,
    TipoConvocatoria,
    Instrumento,
    Sector,
    Finalidad,
}

impl FilterField {
    pub const ALL: [FilterField; 5] = [
        FilterField::Organo,
        FilterField::TipoConvocatoria,
        FilterField::Instrumento,
        FilterField::Sector,
        FilterField::Finalidad,
    ];

    /// Query parameter and `filtros_json` key.
    pub fn param_name(self) -> &'static str {
        match self {
            FilterField::Organo => "organo",
            FilterField::TipoConvocatoria => "tipo_convocatoria",
            FilterField::Instrumento => "instrumento",
            FilterField::Sector => "sector",
            FilterField::Finalidad => "finalidad",
        }
    }

    /// Path segment under `/api/subvenciones/valores/`.
    pub fn catalog_segment(self) -> &'static str {
        match self {
            FilterField::Organo => "organos",
            FilterField::TipoConvocatoria => "tipos-convocatoria",
            FilterField::Instrumento => "instrumentos",
            FilterField::Sector => "sectores",
            FilterField::Finalidad => "finalidades",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterField::Organo => "Órgano convocante",
            FilterField::TipoConvocatoria => "Tipo de convocatoria",
            FilterField::Instrumento => "Instrumento",
            FilterField::Sector => "Sector",
            FilterField::Finalidad => "Finalidad",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.param_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionId {
    /// The "any value" entry every control starts with.
    Any,
    Number(i64),
    Text(String),
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionId::Any => Ok(()),
            OptionId::Number(n) => write!(f, "{n}"),
            OptionId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub id: OptionId,
    pub label: String,
}

impl FilterOption {
    pub const ANY_LABEL: &'static str = "Todos";

    pub fn any() -> Self {
        Self {
            id: OptionId::Any,
            label: Self::ANY_LABEL.to_string(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            id: OptionId::Text(value),
        }
    }

    pub fn numbered(id: i64, label: impl Into<String>) -> Self {
        Self {
            id: OptionId::Number(id),
            label: label.into(),
        }
    }

    pub fn is_any(&self) -> bool {
        self.id == OptionId::Any
    }
}

/// Selected values per filter field. Blank values are never stored and fields
/// without values are dropped, so an empty map means "no filters".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    values: BTreeMap<FilterField, Vec<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let values = self.values.entry(field).or_default();
        if !values.iter().any(|existing| existing == value) {
            values.push(value.to_string());
        }
    }

    pub fn set(&mut self, field: FilterField, values: impl IntoIterator<Item = String>) {
        self.values.remove(&field);
        for value in values {
            self.insert(field, value);
        }
    }

    pub fn remove(&mut self, field: FilterField) {
        self.values.remove(&field);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn get(&self, field: FilterField) -> &[String] {
        self.values.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterField, &[String])> {
        self.values
            .iter()
            .map(|(field, values)| (*field, values.as_slice()))
    }

    /// Flattened `(param, value)` pairs; multi-valued fields repeat the param.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.values
            .iter()
            .flat_map(|(field, values)| {
                values
                    .iter()
                    .map(move |value| (field.param_name(), value.clone()))
            })
            .collect()
    }
}

impl Serialize for FilterSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, values) in &self.values {
            match values.as_slice() {
                [single] => map.serialize_entry(field.param_name(), single)?,
                many => map.serialize_entry(field.param_name(), many)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterSelection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        let raw = BTreeMap::<FilterField, OneOrMany>::deserialize(deserializer)?;
        let mut selection = FilterSelection::new();
        for (field, values) in raw {
            match values {
                OneOrMany::One(value) => selection.insert(field, value),
                OneOrMany::Many(values) => selection.set(field, values),
            }
        }
        Ok(selection)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailFrequency {
    #[default]
    Inmediata,
    Diaria,
    Semanal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_value_serializes_as_plain_string() {
        let selection = FilterSelection::new().with(FilterField::Sector, "Sociedad");
        assert_eq!(
            serde_json::to_value(&selection).expect("serialize"),
            serde_json::json!({ "sector": "Sociedad" })
        );
    }

    #[test]
    fn multiple_values_serialize_as_array() {
        let selection = FilterSelection::new()
            .with(FilterField::Organo, "Ministerio A")
            .with(FilterField::Organo, "Ministerio B");
        assert_eq!(
            serde_json::to_value(&selection).expect("serialize"),
            serde_json::json!({ "organo": ["Ministerio A", "Ministerio B"] })
        );
    }

    #[test]
    fn blank_and_duplicate_values_are_ignored() {
        let mut selection = FilterSelection::new();
        selection.insert(FilterField::Finalidad, "   ");
        assert!(selection.is_empty());

        selection.insert(FilterField::Finalidad, "Cultura");
        selection.insert(FilterField::Finalidad, " Cultura ");
        assert_eq!(selection.get(FilterField::Finalidad), ["Cultura".to_string()]);
    }

    #[test]
    fn query_pairs_repeat_multi_valued_fields() {
        let selection = FilterSelection::new()
            .with(FilterField::Sector, "Agricultura")
            .with(FilterField::Sector, "Pesca")
            .with(FilterField::Instrumento, "Subvención");
        assert_eq!(
            selection.query_pairs(),
            vec![
                ("instrumento", "Subvención".to_string()),
                ("sector", "Agricultura".to_string()),
                ("sector", "Pesca".to_string()),
            ]
        );
    }

    #[test]
    fn deserializes_mixed_shapes() {
        let selection: FilterSelection = serde_json::from_value(serde_json::json!({
            "tipo_convocatoria": "Concurrencia competitiva",
            "finalidad": ["Empleo", "Vivienda"],
        }))
        .expect("deserialize");
        assert_eq!(
            selection.get(FilterField::TipoConvocatoria),
            ["Concurrencia competitiva".to_string()]
        );
        assert_eq!(selection.get(FilterField::Finalidad).len(), 2);
    }
}
