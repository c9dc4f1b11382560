//! Recipe editor state: the bidirectional mapping between a nested recipe
//! document and the flat, independently editable field set the form binds
//! to. Numeric inputs are held as raw strings until submit; `normalize`
//! produces the canonical payload plus any field problems found on the way.

pub mod commands;

use serde::{Deserialize, Serialize};

use crate::models::{
    Ingredient, Metadata, Note, NoteKind, Nutrition, RecipeVersion, RecipeVersionPayload, Step,
};

pub const UNTITLED_RECIPE: &str = "Untitled Recipe";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientField {
    pub id: String,
    pub name: String,
    pub quantity: String,
    pub unit: String,
    pub preparation: String,
    pub notes: String,
    pub group: String,
    pub optional: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepField {
    pub id: String,
    pub order: String,
    pub instruction: String,
    pub duration_minutes: String,
    pub notes: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteField {
    pub kind: NoteKind,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFields {
    pub calories: String,
    pub protein_g: String,
    pub carbs_g: String,
    pub fat_g: String,
    pub fiber_g: String,
    pub sodium_mg: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub name: String,
    pub title: String,
    pub description: String,
    pub servings: String,
    pub difficulty: String,
    pub prep_time_minutes: String,
    pub cook_time_minutes: String,
    pub ingredients: Vec<IngredientField>,
    pub steps: Vec<StepField>,
    /// Comma-separated in the form, array on the wire.
    pub equipment_text: String,
    pub notes: Vec<NoteField>,
    pub tags_text: String,
    pub nutrition: NutritionFields,
    /// Metadata fields the form does not edit (course, cuisine, total time)
    /// ride along untouched.
    #[serde(default)]
    pub base_metadata: Metadata,
}

/// Result of submit-time normalization. `problems` carries one message per
/// malformed numeric field; the offending values are omitted from the
/// payload rather than passed through.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecipe {
    pub payload: RecipeVersionPayload,
    pub problems: Vec<String>,
}

fn first_non_blank<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
}

fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Stable identifier for list items that lack one: `<prefix>_<001-based
/// index, zero-padded to 3 digits>`. Existing ids are never replaced.
fn ensure_id(existing: &str, prefix: &str, index: usize) -> String {
    if existing.is_empty() {
        format!("{prefix}_{:03}", index + 1)
    } else {
        existing.to_owned()
    }
}

fn parse_f64(value: &str, what: &str, problems: &mut Vec<String>) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(n) => Some(n),
        Err(_) => {
            problems.push(format!("{what}: '{trimmed}' is not a number"));
            None
        }
    }
}

fn parse_u32(value: &str, what: &str, problems: &mut Vec<String>) -> Option<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            problems.push(format!("{what}: '{trimmed}' is not a whole number"));
            None
        }
    }
}

fn number_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl EditorState {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Seed the form from a parsed document (pending import or an existing
    /// version being revised).
    pub fn from_payload(payload: &RecipeVersionPayload) -> Self {
        let meta = &payload.metadata;
        Self {
            name: payload.name.clone(),
            title: if payload.title.is_empty() {
                meta.title.clone().unwrap_or_default()
            } else {
                payload.title.clone()
            },
            description: meta.description.clone().unwrap_or_default(),
            servings: number_to_string(meta.servings),
            difficulty: meta.difficulty.clone().unwrap_or_default(),
            prep_time_minutes: number_to_string(meta.prep_time_minutes),
            cook_time_minutes: number_to_string(meta.cook_time_minutes),
            ingredients: payload
                .ingredients
                .iter()
                .map(|ing| IngredientField {
                    id: ing.id.clone(),
                    name: ing.name.clone(),
                    quantity: ing.quantity.map(|q| q.to_string()).unwrap_or_default(),
                    unit: ing.unit.clone().unwrap_or_default(),
                    preparation: ing.preparation.clone().unwrap_or_default(),
                    notes: ing.notes.clone().unwrap_or_default(),
                    group: ing.group.clone().unwrap_or_default(),
                    optional: ing.optional,
                })
                .collect(),
            steps: payload
                .steps
                .iter()
                .map(|step| StepField {
                    id: step.id.clone(),
                    order: if step.order == 0 {
                        String::new()
                    } else {
                        step.order.to_string()
                    },
                    instruction: step.instruction.clone(),
                    duration_minutes: number_to_string(step.duration_minutes),
                    notes: step.notes.clone().unwrap_or_default(),
                })
                .collect(),
            equipment_text: payload.equipment.join(", "),
            notes: payload
                .notes
                .iter()
                .map(|n| NoteField {
                    kind: n.kind,
                    content: n.content.clone(),
                })
                .collect(),
            tags_text: payload.tags.join(", "),
            nutrition: payload
                .nutrition
                .as_ref()
                .map(|n| NutritionFields {
                    calories: number_to_string(n.calories),
                    protein_g: number_to_string(n.protein_g),
                    carbs_g: number_to_string(n.carbs_g),
                    fat_g: number_to_string(n.fat_g),
                    fiber_g: number_to_string(n.fiber_g),
                    sodium_mg: number_to_string(n.sodium_mg),
                })
                .unwrap_or_default(),
            base_metadata: meta.clone(),
        }
    }

    pub fn from_version(version: &RecipeVersion) -> Self {
        Self::from_payload(&RecipeVersionPayload {
            name: String::new(),
            title: version.title.clone(),
            metadata: version.metadata.clone(),
            ingredients: version.ingredients.clone(),
            steps: version.steps.clone(),
            equipment: version.equipment.clone(),
            notes: version.notes.clone(),
            nutrition: version.nutrition.clone(),
            tags: version.tags.clone(),
        })
    }

    pub fn add_ingredient(&mut self) {
        let index = self.ingredients.len();
        self.ingredients.push(IngredientField {
            id: ensure_id("", "ing", index),
            ..IngredientField::default()
        });
    }

    pub fn remove_ingredient(&mut self, index: usize) {
        if index < self.ingredients.len() {
            self.ingredients.remove(index);
        }
    }

    pub fn add_step(&mut self) {
        let index = self.steps.len();
        self.steps.push(StepField {
            id: ensure_id("", "step", index),
            order: (index + 1).to_string(),
            ..StepField::default()
        });
    }

    pub fn remove_step(&mut self, index: usize) {
        if index < self.steps.len() {
            self.steps.remove(index);
        }
    }

    /// Blank order input resets the step to its positional order.
    pub fn set_step_order(&mut self, index: usize, value: &str) {
        if let Some(step) = self.steps.get_mut(index) {
            step.order = if value.trim().is_empty() {
                (index + 1).to_string()
            } else {
                value.trim().to_owned()
            };
        }
    }

    /// Submit-time normalization into the canonical payload. Never fails:
    /// malformed numeric fields are dropped and reported in `problems`.
    pub fn normalize(&self) -> NormalizedRecipe {
        let mut problems = Vec::new();

        let meta_title = self.base_metadata.title.as_deref().unwrap_or("");
        let name = first_non_blank(&[&self.name, meta_title, &self.title])
            .unwrap_or(UNTITLED_RECIPE)
            .to_owned();
        let title = first_non_blank(&[&self.title, meta_title, &self.name])
            .unwrap_or(UNTITLED_RECIPE)
            .to_owned();
        let metadata_title = first_non_blank(&[meta_title, &self.title, &self.name])
            .unwrap_or(UNTITLED_RECIPE)
            .to_owned();

        let metadata = Metadata {
            title: Some(metadata_title),
            description: blank_to_none(&self.description),
            servings: parse_u32(&self.servings, "servings", &mut problems),
            difficulty: blank_to_none(&self.difficulty),
            prep_time_minutes: parse_u32(&self.prep_time_minutes, "prep time", &mut problems),
            cook_time_minutes: parse_u32(&self.cook_time_minutes, "cook time", &mut problems),
            total_time_minutes: self.base_metadata.total_time_minutes,
            course: self.base_metadata.course.clone(),
            cuisine: self.base_metadata.cuisine.clone(),
        };

        let ingredients = self
            .ingredients
            .iter()
            .enumerate()
            .map(|(i, ing)| Ingredient {
                id: ensure_id(&ing.id, "ing", i),
                name: ing.name.trim().to_owned(),
                quantity: parse_f64(
                    &ing.quantity,
                    &format!("ingredient {} quantity", i + 1),
                    &mut problems,
                ),
                unit: blank_to_none(&ing.unit),
                preparation: blank_to_none(&ing.preparation),
                notes: blank_to_none(&ing.notes),
                group: blank_to_none(&ing.group),
                optional: ing.optional,
            })
            .collect();

        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| Step {
                id: ensure_id(&step.id, "step", i),
                order: parse_u32(&step.order, &format!("step {} order", i + 1), &mut problems)
                    .unwrap_or(i as u32 + 1),
                instruction: step.instruction.clone(),
                duration_minutes: parse_u32(
                    &step.duration_minutes,
                    &format!("step {} duration", i + 1),
                    &mut problems,
                ),
                notes: blank_to_none(&step.notes),
            })
            .collect();

        let notes = self
            .notes
            .iter()
            .filter(|n| !n.content.trim().is_empty())
            .map(|n| Note {
                kind: n.kind,
                content: n.content.clone(),
            })
            .collect();

        let nutrition = Nutrition {
            calories: parse_f64(&self.nutrition.calories, "calories", &mut problems),
            protein_g: parse_f64(&self.nutrition.protein_g, "protein", &mut problems),
            carbs_g: parse_f64(&self.nutrition.carbs_g, "carbs", &mut problems),
            fat_g: parse_f64(&self.nutrition.fat_g, "fat", &mut problems),
            fiber_g: parse_f64(&self.nutrition.fiber_g, "fiber", &mut problems),
            sodium_mg: parse_f64(&self.nutrition.sodium_mg, "sodium", &mut problems),
        };

        NormalizedRecipe {
            payload: RecipeVersionPayload {
                name,
                title,
                metadata,
                ingredients,
                steps,
                equipment: split_list(&self.equipment_text),
                notes,
                nutrition: if nutrition.is_empty() {
                    None
                } else {
                    Some(nutrition)
                },
                tags: split_list(&self.tags_text),
            },
            problems,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_everything_to_untitled_when_blank() {
        let normalized = EditorState::empty().normalize();
        assert_eq!(normalized.payload.name, UNTITLED_RECIPE);
        assert_eq!(normalized.payload.title, UNTITLED_RECIPE);
        assert_eq!(
            normalized.payload.metadata.title.as_deref(),
            Some(UNTITLED_RECIPE)
        );
        assert!(normalized.problems.is_empty());
    }

    #[test]
    fn metadata_title_fills_blank_name_and_title() {
        let mut state = EditorState::empty();
        state.base_metadata.title = Some("Soup".into());
        let normalized = state.normalize();
        assert_eq!(normalized.payload.name, "Soup");
        assert_eq!(normalized.payload.title, "Soup");
    }

    #[test]
    fn missing_ids_are_generated_and_existing_ones_preserved() {
        let mut state = EditorState::empty();
        state.ingredients = vec![
            IngredientField {
                name: "flour".into(),
                quantity: "2".into(),
                ..IngredientField::default()
            },
            IngredientField {
                id: "ing_custom".into(),
                name: "salt".into(),
                ..IngredientField::default()
            },
            IngredientField {
                name: "butter".into(),
                ..IngredientField::default()
            },
        ];
        let payload = state.normalize().payload;
        let ids: Vec<&str> = payload.ingredients.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["ing_001", "ing_custom", "ing_003"]);
    }

    #[test]
    fn roundtrip_preserves_ids() {
        let mut state = EditorState::empty();
        state.steps = vec![StepField {
            instruction: "mix".into(),
            order: "1".into(),
            ..StepField::default()
        }];
        let payload = state.normalize().payload;
        assert_eq!(payload.steps[0].id, "step_001");

        let reseeded = EditorState::from_payload(&payload);
        let again = reseeded.normalize().payload;
        assert_eq!(again.steps[0].id, "step_001");
    }

    #[test]
    fn quantity_parses_to_float_or_is_omitted() {
        let mut state = EditorState::empty();
        state.ingredients = vec![
            IngredientField {
                name: "flour".into(),
                quantity: "2.5".into(),
                ..IngredientField::default()
            },
            IngredientField {
                name: "salt".into(),
                quantity: "".into(),
                ..IngredientField::default()
            },
            IngredientField {
                name: "sugar".into(),
                quantity: "a pinch".into(),
                ..IngredientField::default()
            },
        ];
        let normalized = state.normalize();
        assert_eq!(normalized.payload.ingredients[0].quantity, Some(2.5));
        assert_eq!(normalized.payload.ingredients[1].quantity, None);
        assert_eq!(normalized.payload.ingredients[2].quantity, None);
        assert_eq!(normalized.problems.len(), 1);
        assert!(normalized.problems[0].contains("a pinch"));
    }

    #[test]
    fn blank_step_order_resets_to_position() {
        let mut state = EditorState::empty();
        state.steps = vec![
            StepField {
                instruction: "a".into(),
                order: "5".into(),
                ..StepField::default()
            },
            StepField {
                instruction: "b".into(),
                order: "".into(),
                ..StepField::default()
            },
        ];
        state.set_step_order(1, "  ");
        assert_eq!(state.steps[1].order, "2");

        let payload = state.normalize().payload;
        assert_eq!(payload.steps[0].order, 5);
        assert_eq!(payload.steps[1].order, 2);
    }

    #[test]
    fn empty_notes_are_dropped() {
        let mut state = EditorState::empty();
        state.notes = vec![
            NoteField {
                kind: NoteKind::Tip,
                content: "  ".into(),
            },
            NoteField {
                kind: NoteKind::Warning,
                content: "hot pan".into(),
            },
        ];
        let payload = state.normalize().payload;
        assert_eq!(payload.notes.len(), 1);
        assert_eq!(payload.notes[0].content, "hot pan");
    }

    #[test]
    fn empty_nutrition_submits_as_null() {
        let payload = EditorState::empty().normalize().payload;
        assert!(payload.nutrition.is_none());

        let mut state = EditorState::empty();
        state.nutrition.calories = "250".into();
        let payload = state.normalize().payload;
        assert_eq!(payload.nutrition.unwrap().calories, Some(250.0));
    }

    #[test]
    fn equipment_and_tags_split_on_commas() {
        let mut state = EditorState::empty();
        state.equipment_text = "stand mixer, 9x13 pan , ,parchment paper".into();
        state.tags_text = "quick, family-favorite".into();
        let payload = state.normalize().payload;
        assert_eq!(
            payload.equipment,
            vec!["stand mixer", "9x13 pan", "parchment paper"]
        );
        assert_eq!(payload.tags, vec!["quick", "family-favorite"]);
    }

    #[test]
    fn add_step_assigns_positional_id_and_order() {
        let mut state = EditorState::empty();
        state.add_step();
        state.add_step();
        assert_eq!(state.steps[1].id, "step_002");
        assert_eq!(state.steps[1].order, "2");
    }
}
