use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    errors::CatalogError,
    models::Exercise,
    types::{
        ALLOWED_EQUIPMENT, ALLOWED_MUSCLES, Difficulty, MuscleGroup, best_suggestion,
        canonical_equipment, canonical_muscle, normalize,
    },
};

const BUNDLED: &str = include_str!("../data/exercises.toml");

#[derive(Deserialize)]
struct ExerciseDef {
    name: String,
    muscles: Vec<String>,
    #[serde(default)]
    equipment: Vec<String>,
    #[serde(default)]
    high_impact: bool,
    difficulty: Difficulty,
    #[serde(default)]
    avoid_for: Vec<String>,
}

#[derive(Deserialize)]
struct ExerciseImport {
    #[serde(default)]
    exercise: Vec<ExerciseDef>,
}

/// Read-only reference data loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    exercises: Vec<Exercise>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::parse(BUNDLED)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let toml_str = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse(&toml_str)?;
        info!(path = %path.display(), exercises = catalog.len(), "loaded exercise catalog");
        Ok(catalog)
    }

    pub fn parse(toml_str: &str) -> Result<Self, CatalogError> {
        let import: ExerciseImport = toml::from_str(toml_str)?;

        let exercises: Vec<Exercise> = import
            .exercise
            .into_iter()
            .filter_map(validate)
            .collect();

        if exercises.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { exercises })
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn by_muscle(&self, muscle: MuscleGroup) -> impl Iterator<Item = &Exercise> {
        self.exercises.iter().filter(move |e| e.targets(muscle))
    }
}

/// Turn a raw definition into an `Exercise`, or skip it with a warning.
fn validate(def: ExerciseDef) -> Option<Exercise> {
    if def.name.trim().is_empty() {
        warn!("skipping catalog entry with an empty name");
        return None;
    }

    let mut muscles = Vec::with_capacity(def.muscles.len());
    for raw in &def.muscles {
        match canonical_muscle(raw) {
            Some(m) => muscles.push(m),
            None => {
                let suggestion = best_suggestion(raw, ALLOWED_MUSCLES.keys());
                warn!(
                    exercise = %def.name,
                    muscle = %raw,
                    did_you_mean = suggestion.as_deref().unwrap_or("-"),
                    "skipping exercise with unknown muscle group"
                );
                return None;
            }
        }
    }
    if muscles.is_empty() {
        warn!(exercise = %def.name, "skipping exercise without muscle groups");
        return None;
    }

    let mut equipment = Vec::with_capacity(def.equipment.len());
    for raw in &def.equipment {
        match canonical_equipment(raw) {
            Some(e) => equipment.push(e),
            None => {
                let suggestion = best_suggestion(raw, ALLOWED_EQUIPMENT.keys());
                warn!(
                    exercise = %def.name,
                    equipment = %raw,
                    did_you_mean = suggestion.as_deref().unwrap_or("-"),
                    "skipping exercise with unknown equipment"
                );
                return None;
            }
        }
    }

    Some(Exercise {
        name: def.name.trim().to_string(),
        muscles,
        equipment,
        high_impact: def.high_impact,
        difficulty: def.difficulty,
        avoid_for: def.avoid_for.iter().map(|c| normalize(c)).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Equipment;

    #[test]
    fn bundled_catalog_parses() {
        let catalog = Catalog::bundled().unwrap();
        assert!(catalog.len() > 20);
        assert!(catalog.by_muscle(MuscleGroup::Cardio).count() >= 3);
    }

    #[test]
    fn unknown_muscle_skips_only_that_entry() {
        let src = r#"
            [[exercise]]
            name = "Curl"
            muscles = ["bicepz"]
            difficulty = "beginner"

            [[exercise]]
            name = "Squat"
            muscles = ["Legs"]
            equipment = ["None"]
            difficulty = "beginner"
            avoid_for = ["Knee Injury"]
        "#;
        let catalog = Catalog::parse(src).unwrap();
        assert_eq!(catalog.len(), 1);

        let squat = &catalog.exercises()[0];
        assert_eq!(squat.muscles, vec![MuscleGroup::Legs]);
        assert_eq!(squat.equipment, vec![Equipment::None]);
        assert_eq!(squat.avoid_for, vec!["knee-injury".to_string()]);
        assert!(squat.needs_no_equipment());
    }

    #[test]
    fn malformed_and_empty_catalogs_are_fatal() {
        assert!(matches!(
            Catalog::parse("[[exercise]]\nname = 3"),
            Err(CatalogError::Parse(_))
        ));
        assert!(matches!(Catalog::parse(""), Err(CatalogError::Empty)));
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
