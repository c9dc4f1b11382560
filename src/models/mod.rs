mod recipe;
mod session;

pub use recipe::{
    Ingredient, Metadata, Note, NoteKind, Nutrition, Recipe, RecipeVersion, RecipeVersionPayload,
    Step,
};
pub use session::{CookingSession, LogEntry, LogRole, User};
