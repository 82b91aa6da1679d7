use serde::Serialize;

use crate::{
    config::FlagThresholds,
    external::{Grade, NormalizedProduct},
};

const PALM_OIL: &str = "palm oil";
const VEGAN_TAG: &str = "en:vegan";
const VEGETARIAN_TAG: &str = "en:vegetarian";

/// Health and dietary labels derived from a product. Unknown inputs never
/// raise a flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFlags {
    pub high_sugar: bool,
    pub high_salt: bool,
    pub contains_palm_oil: bool,
    pub vegan: bool,
    pub vegetarian: bool,
}

impl DerivedFlags {
    pub fn compute(product: &NormalizedProduct, thresholds: &FlagThresholds) -> Self {
        let n = &product.nutriments;
        let tags = &product.ingredients_analysis_tags;
        Self {
            high_sugar: n.sugars_100g.is_some_and(|v| v > thresholds.high_sugar),
            high_salt: n.salt_100g.is_some_and(|v| v > thresholds.high_salt),
            contains_palm_oil: product.ingredients_text.to_lowercase().contains(PALM_OIL),
            vegan: tags.contains(VEGAN_TAG),
            vegetarian: tags.contains(VEGETARIAN_TAG),
        }
    }
}

pub fn eco_impact_label(grade: Option<Grade>) -> Option<&'static str> {
    grade.map(|g| match g {
        Grade::A => "Very low impact",
        Grade::B => "Low impact",
        Grade::C => "Medium impact",
        Grade::D => "High impact",
        Grade::E => "Very high impact",
    })
}
