pub mod catalog;
pub mod coordinate;

pub use catalog::{
    body_shapes_for, BodyConcern, BodyShape, BodyType, Gender, Occasion, Place, ShoulderWidth,
    SkinTone, StyleOption, TimeOfDay, MAX_STYLE_OPTIONS,
};
pub use coordinate::{
    score_grade, validate_body_concerns, validate_style_options, Accessory, BodyInfo,
    CoordinateRequest, CoordinateResult, ImageGenerationRequest, PaletteColor, Tpo,
    ValidationError, MAX_ACCESSORIES, MAX_PALETTE_COLORS, MAX_STYLING_TIPS,
};
