//! Body profile used to personalize styling advice.

use serde::{Deserialize, Serialize};

/// The parts of a user's profile that shape outfit suggestions.
///
/// Free-text fields (skin tone, body shape, gender) are stored as the user
/// typed them; no vocabulary is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyProfile {
    /// Display name.
    pub name: String,
    /// Gender as entered at registration.
    pub gender: String,
    /// Age in years.
    pub age: u16,
    /// Height in centimeters.
    pub height_cm: u16,
    /// Weight in kilograms.
    pub weight_kg: u16,
    /// Skin tone description (e.g. "wheatish", "fair").
    pub skin_tone: String,
    /// Body shape description (e.g. "pear", "athletic").
    pub body_shape: String,
}

impl BodyProfile {
    /// Body mass index rounded to one decimal, or `None` when height is zero.
    #[must_use]
    pub fn bmi(&self) -> Option<f32> {
        if self.height_cm == 0 {
            return None;
        }
        let meters = f32::from(self.height_cm) / 100.0;
        let bmi = f32::from(self.weight_kg) / (meters * meters);
        Some((bmi * 10.0).round() / 10.0)
    }
}
