use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::catalog::{
    body_shapes_for, BodyConcern, BodyShape, BodyType, Gender, Occasion, Place, ShoulderWidth,
    SkinTone, StyleOption, TimeOfDay, MAX_STYLE_OPTIONS,
};

pub const HEIGHT_RANGE_CM: (f64, f64) = (100.0, 250.0);
pub const WEIGHT_RANGE_KG: (f64, f64) = (30.0, 200.0);

pub const MAX_STYLING_TIPS: usize = 5;
pub const MAX_ACCESSORIES: usize = 3;
pub const MAX_PALETTE_COLORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("height {0} is outside 100-250 cm")]
    Height(String),
    #[error("weight {0} is outside 30-200 kg")]
    Weight(String),
    #[error("body shape {shape} requires a gender")]
    ShapeWithoutGender { shape: BodyShape },
    #[error("body shape {shape} is not offered for {gender}")]
    ShapeNotForGender { shape: BodyShape, gender: Gender },
    #[error("between 1 and 3 style options are required, got {0}")]
    StyleCount(usize),
    #[error("style option {0} is selected twice")]
    DuplicateStyle(StyleOption),
    #[error("body concern {0} is selected twice")]
    DuplicateConcern(BodyConcern),
    #[error("'없음' cannot be combined with other body concerns")]
    NoneConcernCombined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    pub height: f64,
    pub weight: f64,
    pub body_type: BodyType,
    pub skin_tone: SkinTone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoulder_width: Option<ShoulderWidth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_shape: Option<BodyShape>,
}

impl BodyInfo {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(HEIGHT_RANGE_CM.0..=HEIGHT_RANGE_CM.1).contains(&self.height) {
            return Err(ValidationError::Height(self.height.to_string()));
        }
        if !(WEIGHT_RANGE_KG.0..=WEIGHT_RANGE_KG.1).contains(&self.weight) {
            return Err(ValidationError::Weight(self.weight.to_string()));
        }
        if let Some(shape) = self.body_shape {
            let Some(gender) = self.gender else {
                return Err(ValidationError::ShapeWithoutGender { shape });
            };
            if !body_shapes_for(gender).contains(&shape) {
                return Err(ValidationError::ShapeNotForGender { shape, gender });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tpo {
    pub time: TimeOfDay,
    pub place: Place,
    pub occasion: Occasion,
}

/// Input of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateRequest {
    pub body_info: BodyInfo,
    pub style_options: Vec<StyleOption>,
    pub tpo: Tpo,
    #[serde(default)]
    pub body_concerns: Vec<BodyConcern>,
}

pub fn validate_style_options(options: &[StyleOption]) -> Result<(), ValidationError> {
    if options.is_empty() || options.len() > MAX_STYLE_OPTIONS {
        return Err(ValidationError::StyleCount(options.len()));
    }
    for (index, option) in options.iter().enumerate() {
        if options[..index].contains(option) {
            return Err(ValidationError::DuplicateStyle(*option));
        }
    }
    Ok(())
}

pub fn validate_body_concerns(concerns: &[BodyConcern]) -> Result<(), ValidationError> {
    if concerns.contains(&BodyConcern::None) && concerns.len() > 1 {
        return Err(ValidationError::NoneConcernCombined);
    }
    for (index, concern) in concerns.iter().enumerate() {
        if concerns[..index].contains(concern) {
            return Err(ValidationError::DuplicateConcern(*concern));
        }
    }
    Ok(())
}

impl CoordinateRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.body_info.validate()?;
        validate_style_options(&self.style_options)?;
        validate_body_concerns(&self.body_concerns)
    }

    /// Concerns worth mentioning to the model; a lone 없음 means there are none.
    pub fn effective_concerns(&self) -> Vec<BodyConcern> {
        self.body_concerns
            .iter()
            .copied()
            .filter(|concern| *concern != BodyConcern::None)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Accessory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reason: String,
}

/// A palette entry: the photo variant returns bare hex codes, the text variant named colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaletteColor {
    Hex(String),
    Named {
        #[serde(default)]
        name: String,
        hex: String,
        #[serde(default)]
        usage: String,
    },
}

impl PaletteColor {
    pub fn hex(&self) -> &str {
        match self {
            PaletteColor::Hex(hex) => hex,
            PaletteColor::Named { hex, .. } => hex,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PaletteColor::Hex(hex) => hex.clone(),
            PaletteColor::Named { name, hex, .. } if !name.trim().is_empty() => {
                format!("{name}({hex})")
            }
            PaletteColor::Named { hex, .. } => hex.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(default)]
    pub styling_tips: Vec<String>,
    #[serde(default)]
    pub accessories: Vec<Accessory>,
    #[serde(default)]
    pub color_palette: Vec<PaletteColor>,
    #[serde(default)]
    pub overall_comment: String,
}

/// Input of the composite outfit image call: the analysis context plus its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGenerationRequest {
    pub body_info: BodyInfo,
    pub style_options: Vec<StyleOption>,
    pub tpo: Tpo,
    #[serde(default)]
    pub body_concerns: Vec<BodyConcern>,
    pub styling_tips: Vec<String>,
    #[serde(default)]
    pub accessories: Vec<Accessory>,
    pub color_palette: Vec<PaletteColor>,
    #[serde(default)]
    pub include_face: bool,
}

impl ImageGenerationRequest {
    pub fn from_analysis(
        request: &CoordinateRequest,
        result: &CoordinateResult,
        include_face: bool,
    ) -> Self {
        ImageGenerationRequest {
            body_info: request.body_info.clone(),
            style_options: request.style_options.clone(),
            tpo: request.tpo,
            body_concerns: request.body_concerns.clone(),
            styling_tips: result.styling_tips.clone(),
            accessories: result.accessories.clone(),
            color_palette: result.color_palette.clone(),
            include_face,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.body_info.validate()?;
        validate_style_options(&self.style_options)?;
        validate_body_concerns(&self.body_concerns)
    }

    pub fn effective_concerns(&self) -> Vec<BodyConcern> {
        self.body_concerns
            .iter()
            .copied()
            .filter(|concern| *concern != BodyConcern::None)
            .collect()
    }
}

/// Letter grade shown next to a score.
pub fn score_grade(score: u8) -> char {
    match score {
        90..=u8::MAX => 'S',
        80..=89 => 'A',
        70..=79 => 'B',
        60..=69 => 'C',
        _ => 'D',
    }
}
