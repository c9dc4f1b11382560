use serde::{Deserialize, Serialize};

/// Top-level recipe as returned by the backend. The slug is URL-stable and
/// is what every nested endpoint is keyed on; `latest_version` is a cached
/// copy of the newest version document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub latest_version: Option<RecipeVersion>,
}

/// An immutable snapshot of a recipe's content. Versions are never edited in
/// place; changes create a new version and bump `version_number`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeVersion {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub version_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub nutrition: Option<Nutrition>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RecipeVersion {
    /// Steps in presentation order: ascending `order`, stable so ties keep
    /// their original array position.
    pub fn sorted_steps(&self) -> Vec<Step> {
        let mut steps = self.steps.clone();
        steps.sort_by_key(|s| s.order);
        steps
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub id: String,
    /// Positive, defines presentation sequence.
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Tip,
    Substitution,
    Storage,
    Variation,
    Warning,
}

impl Default for NoteKind {
    fn default() -> Self {
        NoteKind::Tip
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "type", default)]
    pub kind: NoteKind,
    #[serde(default)]
    pub content: String,
}

/// Per-serving nutrition. Submitted as JSON `null` when every field is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_mg: Option<f64>,
}

impl Nutrition {
    pub fn is_empty(&self) -> bool {
        self.calories.is_none()
            && self.protein_g.is_none()
            && self.carbs_g.is_none()
            && self.fat_g.is_none()
            && self.fiber_g.is_none()
            && self.sodium_mg.is_none()
    }
}

/// Body for `POST /recipes/` and `POST /recipes/{slug}/versions/`. Same shape
/// as a version document minus the server-assigned fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeVersionPayload {
    pub name: String,
    pub title: String,
    pub metadata: Metadata,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    pub equipment: Vec<String>,
    pub notes: Vec<Note>,
    pub nutrition: Option<Nutrition>,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(order: u32, id: &str) -> Step {
        Step {
            id: id.into(),
            order,
            instruction: format!("step {id}"),
            ..Step::default()
        }
    }

    #[test]
    fn sorted_steps_orders_ascending() {
        let version = RecipeVersion {
            steps: vec![step(3, "c"), step(1, "a"), step(2, "b")],
            ..RecipeVersion::default()
        };
        let sorted: Vec<u32> = version.sorted_steps().iter().map(|s| s.order).collect();
        assert_eq!(sorted, vec![1, 2, 3]);
    }

    #[test]
    fn sorted_steps_is_stable_on_ties() {
        let version = RecipeVersion {
            steps: vec![step(1, "first"), step(1, "second")],
            ..RecipeVersion::default()
        };
        let ids: Vec<String> = version.sorted_steps().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn note_kind_uses_lowercase_wire_names() {
        let note = Note {
            kind: NoteKind::Substitution,
            content: "use oat milk".into(),
        };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["type"], "substitution");
    }
}
