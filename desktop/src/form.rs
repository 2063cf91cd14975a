use shared::{Gender, PatientInfo};
use std::path::PathBuf;

pub const MISSING_INFO_WARNING: &str = "Please fill all fields and upload an image.";

/// Raw state of the patient entry tab.
#[derive(Debug, Clone, Default)]
pub struct PatientForm {
    pub name: String,
    pub age: String,
    pub gender: Option<Gender>,
    pub id: String,
    pub image_path: String,
}

impl PatientForm {
    pub fn patient(&self) -> PatientInfo {
        PatientInfo::new(&self.name, &self.age, self.gender, &self.id)
    }

    pub fn image_path(&self) -> Option<PathBuf> {
        let trimmed = self.image_path.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// Mirrors the check the pipeline performs, so the user gets a warning
    /// instead of an error dialog for an incomplete form.
    pub fn is_complete(&self) -> bool {
        self.patient().missing_fields().is_empty() && self.image_path().is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> PatientForm {
        PatientForm {
            name: " Alice ".into(),
            age: "34".into(),
            gender: Some(Gender::Female),
            id: "P001".into(),
            image_path: "/scans/mri.png ".into(),
        }
    }

    #[test]
    fn complete_form_converts_to_patient() {
        let form = filled();
        assert!(form.is_complete());
        let patient = form.patient();
        assert_eq!(patient.name, "Alice");
        assert_eq!(patient.gender, Some(Gender::Female));
        assert_eq!(form.image_path(), Some(PathBuf::from("/scans/mri.png")));
    }

    #[test]
    fn any_blank_field_makes_form_incomplete() {
        let mut form = filled();
        form.gender = None;
        assert!(!form.is_complete());

        let mut form = filled();
        form.image_path = "   ".into();
        assert!(!form.is_complete());
        assert_eq!(form.image_path(), None);
    }

    #[test]
    fn clear_resets_everything() {
        let mut form = filled();
        form.clear();
        assert!(form.name.is_empty());
        assert!(form.gender.is_none());
        assert!(form.image_path.is_empty());
    }
}
