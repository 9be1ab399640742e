//! Licensable feature modules.

use serde::{Deserialize, Serialize};

/// One entry of the module catalog. License features are keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDefinition {
    pub id: String,
    pub label: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub description: String,
    /// Name of the icon the dashboard renders for this module.
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub icon_name: String,
}

impl ModuleDefinition {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        icon_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            icon_name: icon_name.into(),
        }
    }
}

/// The catalog seeded into an empty store.
#[must_use]
pub fn default_catalog() -> Vec<ModuleDefinition> {
    vec![
        ModuleDefinition::new(
            "inventory",
            "Grundinventar",
            "Verwaltung von Geräten und Lagerorten",
            "Server",
        ),
        ModuleDefinition::new(
            "respiratory",
            "Atemschutz",
            "Atemschutzwerkstatt & Prüfungen",
            "Wind",
        ),
        ModuleDefinition::new("hoses", "Schlauchpflege", "Schlauchwäsche & Prüfung", "Droplet"),
        ModuleDefinition::new(
            "vehicles",
            "Fahrtenbuch",
            "Digitales Fahrtenbuch & Tanken",
            "Truck",
        ),
        ModuleDefinition::new("apiAccess", "API Zugriff", "Zugriff für externe Systeme", "Database"),
        ModuleDefinition::new(
            "personnel",
            "Personal",
            "Mannschaftsverwaltung & Lehrgänge",
            "Users",
        ),
    ]
}
