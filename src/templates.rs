use crate::error::ApiError;

/// Splits the comma separated exercise field of the template forms.
pub fn parse_exercise_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn format_exercise_list(exercises: &[String]) -> String {
    exercises.join(", ")
}

/// The "create template" form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateDraft {
    pub name: String,
    pub exercises: String,
}

impl TemplateDraft {
    pub fn validate(&self) -> Result<(String, Vec<String>), ApiError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ApiError::validation("Please enter a template name"));
        }
        Ok((name.to_string(), parse_exercise_list(&self.exercises)))
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.exercises.clear();
    }
}
