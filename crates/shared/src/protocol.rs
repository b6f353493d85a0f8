use serde::{Deserialize, Serialize};

use crate::domain::{
    AreaId, EmailFrequency, FilterSelection, GrantId, RegionId, SubscriptionId, UserId,
};

/// Grant as returned by `/api/subvenciones`. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrantRecord {
    #[serde(default)]
    pub id: Option<GrantId>,
    #[serde(default)]
    pub id_bdns: Option<String>,
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub fecha_publicacion: Option<String>,
    #[serde(default)]
    pub fecha_inicio_solicitud: Option<String>,
    #[serde(default)]
    pub fecha_fin_solicitud: Option<String>,
    #[serde(default)]
    pub organo_convocante: Option<String>,
    #[serde(default)]
    pub region_nombre: Option<String>,
    #[serde(default)]
    pub presupuesto_total: Option<f64>,
    #[serde(default)]
    pub tipo_convocatoria: Option<String>,
    #[serde(default)]
    pub instrumento: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub finalidad_nombre: Option<String>,
    #[serde(default)]
    pub url_bdns: Option<String>,
    #[serde(default)]
    pub url_convocatoria: Option<String>,
    #[serde(default)]
    pub activa: Option<bool>,
}

/// Row of the region and thematic-area catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub nombre: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regiones: Option<Vec<RegionId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub areas_tematicas: Option<Vec<AreaId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presupuesto_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presupuesto_max: Option<f64>,
    pub notificar_email: bool,
    pub frecuencia_email: EmailFrequency,
    pub activa: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtros_json: Option<FilterSelection>,
}

/// Partial update of an existing subscription; unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regiones: Option<Vec<RegionId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub areas_tematicas: Option<Vec<AreaId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presupuesto_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presupuesto_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notificar_email: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frecuencia_email: Option<EmailFrequency>,
}

impl SubscriptionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub suscripcion_id: Option<SubscriptionId>,
    #[serde(default)]
    pub calendar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    pub id: SubscriptionId,
    pub usuario_id: UserId,
    pub activa: bool,
    #[serde(default)]
    pub regiones: Option<Vec<RegionId>>,
    #[serde(default)]
    pub areas_tematicas: Option<Vec<AreaId>>,
    #[serde(default)]
    pub presupuesto_min: Option<f64>,
    #[serde(default)]
    pub presupuesto_max: Option<f64>,
    #[serde(default)]
    pub notificar_email: Option<bool>,
    #[serde(default)]
    pub frecuencia_email: Option<EmailFrequency>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarUrlResponse {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ical_url: Option<String>,
    /// Set by the backend when the calendar could not be resolved; `url` is then `#`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalendarUrlResponse {
    pub fn is_available(&self) -> bool {
        self.error.is_none() && self.url.trim() != "#" && !self.url.trim().is_empty()
    }
}

/// Body of a non-2xx response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}
